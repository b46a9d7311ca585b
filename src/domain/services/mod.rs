//! Domain services: the parsing and decision logic that sits between the
//! raw on-disk views in `entities` and the I/O ports in `repositories`.

pub mod chunk_classifier;
pub mod content_signature;
pub mod data_run_decoder;
pub mod directory_resolver;
pub mod filter_engine;
pub mod integrity;
pub mod record_parser;
pub mod recovery_dispatcher;

pub use chunk_classifier::ChunkKind;
pub use content_signature::ContentSignature;
pub use data_run_decoder::{decode as decode_run_list, DecodeError, RunWatermarks};
pub use directory_resolver::{resolve_path, synthetic_path, FetchedRecord, ResolvedPath};
pub use filter_engine::FilterEngine;
pub use integrity::content_digest;
pub use record_parser::RecordParser;
pub use recovery_dispatcher::{already_satisfied, decide, mangled_prefix, Decision, RecoveryPolicy};
