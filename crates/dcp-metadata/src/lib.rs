// crates/dcp-metadata/src/lib.rs
//
// dcp-metadata: deterministic metadata documents for one analysis run.
//
// Every identifier is derived from document content (UUID v5 over canonical
// JSON), so rebuilding from the same run record and configuration yields
// byte-identical documents. The submission orchestrator relies on that to
// make re-submission idempotent.

pub mod builder;
pub mod config;
pub mod documents;
pub mod files;
pub mod inputs;
pub mod links;
pub mod md5;
pub mod pipeline;
pub mod process;
pub mod protocol;
pub mod reference;
pub mod schema;

pub use builder::{build_metadata, MetadataBundle};
pub use config::BuilderConfig;
pub use documents::{
    AnalysisFile, AnalysisProcess, AnalysisProtocol, FileDescriptor, Links, ReferenceFile, Task,
};
pub use files::OutputFile;
pub use inputs::parse_inputs_tsv;
pub use md5::add_md5s;
pub use pipeline::PipelineKind;
pub use reference::{build_reference_file, AssemblyType, ReferenceBundle, ReferenceInput, ReferenceType};
pub use schema::{SchemaUrls, SchemaVersions};
