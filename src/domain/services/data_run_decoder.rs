//! Decodes a non-resident attribute's packed data-run byte sequence into a
//! [`RunList`].

use crate::domain::entities::{DataRun, Lcn, RunList};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunWatermarks {
    pub min_lcn: Lcn,
    pub max_lcn: Lcn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// `L` or `O` exceeded 4 bytes. Carries the number of runs already
    /// decoded before the error was hit.
    FieldTooWide { runs_decoded: usize },
}

/// Decodes a run list starting at `data[0]`, terminated by a zero header
/// byte. `min_lcn`/`max_lcn` are updated for diagnostics only (spec Open
/// Question (a): not consumed for control flow).
pub fn decode(data: &[u8], watermarks: &mut RunWatermarks) -> Result<RunList, (RunList, DecodeError)> {
    let mut runs = RunList::new();
    let mut running_lcn: i64 = 0;
    let mut pos = 0usize;

    loop {
        if pos >= data.len() {
            break;
        }
        let header = data[pos];
        if header == 0 {
            break;
        }
        let len_size = (header & 0x0F) as usize;
        let off_size = (header >> 4) as usize;
        pos += 1;

        if len_size > 4 || off_size > 4 {
            return Err((runs, DecodeError::FieldTooWide { runs_decoded: runs.len() }));
        }

        if pos + len_size > data.len() {
            return Err((runs, DecodeError::FieldTooWide { runs_decoded: runs.len() }));
        }
        let length = read_unsigned(&data[pos..pos + len_size]);
        pos += len_size;

        if off_size == 0 {
            runs.push(DataRun::Sparse {
                cluster_count: length,
            });
            continue;
        }

        if pos + off_size > data.len() {
            return Err((runs, DecodeError::FieldTooWide { runs_decoded: runs.len() }));
        }
        let delta = read_signed(&data[pos..pos + off_size]);
        pos += off_size;

        running_lcn += delta;
        if running_lcn < 0 {
            return Err((runs, DecodeError::FieldTooWide { runs_decoded: runs.len() }));
        }
        let first_lcn = running_lcn as u64;
        let last_lcn = first_lcn + length;

        watermarks.min_lcn = watermarks.min_lcn.min(first_lcn);
        watermarks.max_lcn = watermarks.max_lcn.max(last_lcn);

        runs.push(DataRun::Allocated {
            first_lcn,
            last_lcn,
        });
    }

    Ok(runs)
}

fn read_unsigned(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn read_signed(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    let sign_bit_set = bytes.last().map(|b| b & 0x80 != 0).unwrap_or(false);
    if sign_bit_set {
        for b in buf.iter_mut().skip(bytes.len()) {
            *b = 0xFF;
        }
    }
    i64::from_le_bytes(buf)
}

/// Encodes a sequence of `(first_lcn, cluster_count)` pairs with minimal
/// field widths, used by the round-trip property tests.
pub fn encode(runs: &[(u64, u64)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut running_lcn: i64 = 0;
    for &(first_lcn, cluster_count) in runs {
        let delta = first_lcn as i64 - running_lcn;
        running_lcn = first_lcn as i64;

        let len_bytes = minimal_unsigned_bytes(cluster_count);
        let off_bytes = minimal_signed_bytes(delta);
        let header = (len_bytes as u8) | ((off_bytes as u8) << 4);
        out.push(header);
        out.extend_from_slice(&cluster_count.to_le_bytes()[..len_bytes]);
        out.extend_from_slice(&delta.to_le_bytes()[..off_bytes]);
    }
    out.push(0);
    out
}

fn minimal_unsigned_bytes(value: u64) -> usize {
    let bytes = value.to_le_bytes();
    for i in (0..8).rev() {
        if bytes[i] != 0 {
            return i + 1;
        }
    }
    1
}

fn minimal_signed_bytes(value: i64) -> usize {
    let bytes = value.to_le_bytes();
    for n in 1..=8 {
        let candidate = &bytes[..n];
        let mut buf = [0u8; 8];
        buf[..n].copy_from_slice(candidate);
        if candidate[n - 1] & 0x80 != 0 {
            for b in buf.iter_mut().skip(n) {
                *b = 0xFF;
            }
        }
        if i64::from_le_bytes(buf) == value {
            return n;
        }
    }
    8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_spec_example_scenario_three() {
        let bytes = [0x31, 0x10, 0x00, 0x20, 0x00, 0x00];
        let mut watermarks = RunWatermarks::default();
        let runs = decode(&bytes, &mut watermarks).unwrap();
        assert_eq!(
            runs,
            vec![DataRun::Allocated {
                first_lcn: 0x002000,
                last_lcn: 0x002010,
            }]
        );
    }

    #[test]
    fn rejects_field_width_above_four() {
        let bytes = [0x05, 1, 2, 3, 4, 5];
        let mut watermarks = RunWatermarks::default();
        let (partial, err) = decode(&bytes, &mut watermarks).unwrap_err();
        assert!(partial.is_empty());
        assert_eq!(err, DecodeError::FieldTooWide { runs_decoded: 0 });
    }

    #[test]
    fn sparse_run_has_no_lcn() {
        let bytes = [0x10, 5, 0x00];
        let mut watermarks = RunWatermarks::default();
        let runs = decode(&bytes, &mut watermarks).unwrap();
        assert_eq!(runs, vec![DataRun::Sparse { cluster_count: 5 }]);
    }

    proptest! {
        #[test]
        fn round_trip_is_idempotent(
            pairs in proptest::collection::vec((0u32..1_000_000u32, 1u32..10_000u32), 0..8)
        ) {
            let mut first = 0u64;
            let runs: Vec<(u64, u64)> = pairs
                .into_iter()
                .map(|(delta, len)| {
                    first += delta as u64;
                    let pair = (first, len as u64);
                    first += len as u64;
                    pair
                })
                .collect();

            let encoded = encode(&runs);
            let mut watermarks = RunWatermarks::default();
            let decoded = decode(&encoded, &mut watermarks).unwrap();
            let decoded_pairs: Vec<(u64, u64)> = decoded
                .iter()
                .map(|r| match r {
                    DataRun::Allocated { first_lcn, last_lcn } => (*first_lcn, last_lcn - first_lcn),
                    DataRun::Sparse { cluster_count } => (0, *cluster_count),
                })
                .collect();
            prop_assert_eq!(&decoded_pairs, &runs);

            let re_encoded = encode(&runs);
            let mut watermarks2 = RunWatermarks::default();
            let re_decoded = decode(&re_encoded, &mut watermarks2).unwrap();
            prop_assert_eq!(decoded, re_decoded);
        }
    }
}
