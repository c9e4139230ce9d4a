// crates/dcp-core/src/lib.rs
//
// dcp-core: Core types, identifiers, and capability traits for the DCP
// submission tools.
//
// This is the leaf crate that every other crate in the workspace depends on.
// It defines the error taxonomy, deterministic identifier helpers, timestamp
// normalization, file format tables, the parsed workflow-run record, and the
// capability traits (token source, object store, output sink) that the
// builder and orchestrator are written against.

pub mod error;
pub mod format;
pub mod ids;
pub mod run_record;
pub mod sink;
pub mod timestamp;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use dcp_core::{uuid5, DcpError};`

pub use error::DcpError;
pub use format::{content_type_for, extension_of, file_name_of, format_from_name};
pub use ids::{base64_to_hex, canonical_json, sha256_hex, uuid5, DCP_NAMESPACE};
pub use run_record::{CallRecord, InputParameter, RunRecord, RuntimeAttributes};
pub use sink::DirectorySink;
pub use timestamp::normalize_timestamp;
pub use traits::{ObjectStat, ObjectStore, OutputSink, TokenSource};
