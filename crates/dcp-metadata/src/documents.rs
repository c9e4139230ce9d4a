// crates/dcp-metadata/src/documents.rs
//
// Typed metadata documents. Field names match the JSON the submission
// service and downstream indexers expect, so these serialize directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dcp_core::{canonical_json, uuid5, DcpError, InputParameter};

/// Identity and dating of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub document_id: String,
    pub submission_date: String,
    pub update_date: String,
}

impl Provenance {
    pub fn new(document_id: impl Into<String>, version: &str) -> Self {
        Self {
            document_id: document_id.into(),
            submission_date: version.to_string(),
            update_date: version.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLabel {
    pub text: String,
}

impl TextLabel {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolCore {
    pub protocol_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisProtocol {
    #[serde(rename = "describedBy")]
    pub described_by: String,
    pub schema_type: String,
    pub protocol_core: ProtocolCore,
    pub computational_method: String,
    #[serde(rename = "type")]
    pub protocol_type: TextLabel,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCore {
    pub process_id: String,
}

/// One task execution within a process, flattened from sub-workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_name: String,
    pub cpus: u32,
    pub memory: String,
    pub disk_size: String,
    pub docker_image: String,
    pub zone: String,
    pub start_time: String,
    pub stop_time: String,
    pub log_out: String,
    pub log_err: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisProcess {
    #[serde(rename = "describedBy")]
    pub described_by: String,
    pub schema_type: String,
    pub process_core: ProcessCore,
    #[serde(rename = "type")]
    pub process_type: TextLabel,
    pub analysis_run_type: String,
    pub inputs: Vec<InputParameter>,
    pub tasks: Vec<Task>,
    pub timestamp_start_utc: String,
    pub timestamp_stop_utc: String,
    pub reference_files: Vec<String>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDescription {
    pub text: String,
    pub ontology: String,
    pub ontology_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCore {
    pub file_name: String,
    pub format: String,
    pub file_source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_description: Vec<ContentDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFile {
    #[serde(rename = "describedBy")]
    pub described_by: String,
    pub schema_type: String,
    pub file_core: FileCore,
    pub provenance: Provenance,
}

/// Content-addressable description of the bytes behind a file document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    #[serde(rename = "describedBy")]
    pub described_by: String,
    pub schema_type: String,
    pub schema_version: String,
    pub content_type: String,
    pub size: u64,
    pub sha256: String,
    pub crc32c: String,
    pub file_id: String,
    pub file_version: String,
    pub file_name: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFile {
    #[serde(rename = "describedBy")]
    pub described_by: String,
    pub schema_type: String,
    pub file_core: FileCore,
    pub reference_type: String,
    pub assembly_type: String,
    pub genus_species: Vec<TextLabel>,
    pub ncbi_taxon_id: Vec<u32>,
    pub reference_version: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutput {
    pub output_type: String,
    pub output_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkProtocol {
    pub protocol_type: String,
    pub protocol_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLink {
    pub link_type: String,
    pub process_id: String,
    pub process_type: String,
    pub inputs: Vec<InputParameter>,
    pub outputs: Vec<LinkOutput>,
    pub protocols: Vec<LinkProtocol>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "describedBy")]
    pub described_by: String,
    pub schema_type: String,
    pub schema_version: String,
    pub links: Vec<ProcessLink>,
}

/// Serialize any document to a JSON value.
pub fn to_value<T: Serialize>(document: &T) -> Result<Value, DcpError> {
    Ok(serde_json::to_value(document)?)
}

/// UUID v5 of the canonical JSON of `document` with its `provenance` removed.
pub fn content_id<T: Serialize>(document: &T) -> Result<String, DcpError> {
    let mut value = to_value(document)?;
    if let Value::Object(map) = &mut value {
        map.remove("provenance");
    }
    Ok(uuid5(&canonical_json(&value)))
}
