//! Reference `/etc/mime.types` loader (spec §6a, §4.6).
//!
//! Grouped by MIME *super-type* (the token before the first `/`, e.g.
//! `image`), not the full `type/subtype` string — this is what lets a filter
//! token like `-i image` match every `image/*` extension in one shot, per
//! the original's CLI help text ("mime types are OK, example: image, video")
//! and its `Context::Context` mime-table load (`getline(entry, type, '/')`,
//! grouping by `type` into `mime[type]`). Each line's subtype token itself
//! (the first token after the slash) is not inserted as an extension, only
//! the tokens that follow it. Blank lines and `#` comments are skipped.

use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead};
use std::path::Path;

pub fn load_mime_types(path: &Path) -> io::Result<HashMap<String, HashSet<String>>> {
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut map: HashMap<String, HashSet<String>> = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((super_type, rest)) = trimmed.split_once('/') else {
            continue;
        };
        // `rest` is "<subtype> <ext1> <ext2> ..."; the subtype token itself
        // is discarded, only the trailing extensions are real aliases.
        let mut tokens = rest.split_whitespace();
        tokens.next();
        let extensions: HashSet<String> = tokens.map(str::to_string).collect();
        if extensions.is_empty() {
            continue;
        }
        map.entry(super_type.to_string()).or_default().extend(extensions);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn groups_subtypes_under_one_super_type() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "image/jpeg jpeg jpg jpe").unwrap();
        writeln!(file, "image/png png").unwrap();
        writeln!(file, "video/mp4 mp4").unwrap();
        let map = load_mime_types(file.path()).unwrap();
        assert_eq!(
            map.get("image").unwrap(),
            &HashSet::from(["jpeg".to_string(), "jpg".to_string(), "jpe".to_string(), "png".to_string()])
        );
        assert_eq!(map.get("video").unwrap(), &HashSet::from(["mp4".to_string()]));
    }

    #[test]
    fn skips_type_with_no_extensions() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "application/octet-stream").unwrap();
        let map = load_mime_types(file.path()).unwrap();
        assert!(map.is_empty());
    }
}
