// crates/dcp-metadata/src/schema.rs
//
// Schema descriptors: every document carries a `describedBy` URL built from
// the schema base URL, the document kind, and a pinned schema version.

use serde::{Deserialize, Serialize};

/// Pinned schema versions for each document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersions {
    #[serde(default = "default_analysis_protocol")]
    pub analysis_protocol: String,
    #[serde(default = "default_analysis_process")]
    pub analysis_process: String,
    #[serde(default = "default_analysis_file")]
    pub analysis_file: String,
    #[serde(default = "default_reference_file")]
    pub reference_file: String,
    #[serde(default = "default_file_descriptor")]
    pub file_descriptor: String,
    #[serde(default = "default_links")]
    pub links: String,
}

fn default_analysis_protocol() -> String {
    "9.1.0".to_string()
}

fn default_analysis_process() -> String {
    "12.0.0".to_string()
}

fn default_analysis_file() -> String {
    "6.2.0".to_string()
}

fn default_reference_file() -> String {
    "3.2.0".to_string()
}

fn default_file_descriptor() -> String {
    "2.0.0".to_string()
}

fn default_links() -> String {
    "2.1.1".to_string()
}

impl Default for SchemaVersions {
    fn default() -> Self {
        Self {
            analysis_protocol: default_analysis_protocol(),
            analysis_process: default_analysis_process(),
            analysis_file: default_analysis_file(),
            reference_file: default_reference_file(),
            file_descriptor: default_file_descriptor(),
            links: default_links(),
        }
    }
}

/// Builds `describedBy` URLs against one schema base URL.
#[derive(Debug, Clone)]
pub struct SchemaUrls<'a> {
    base: &'a str,
    versions: &'a SchemaVersions,
}

impl<'a> SchemaUrls<'a> {
    pub fn new(base: &'a str, versions: &'a SchemaVersions) -> Self {
        Self {
            base: base.trim_end_matches('/'),
            versions,
        }
    }

    pub fn versions(&self) -> &SchemaVersions {
        self.versions
    }

    pub fn analysis_protocol(&self) -> String {
        format!(
            "{}/type/protocol/analysis/{}/analysis_protocol",
            self.base, self.versions.analysis_protocol
        )
    }

    pub fn analysis_process(&self) -> String {
        format!(
            "{}/type/process/analysis/{}/analysis_process",
            self.base, self.versions.analysis_process
        )
    }

    pub fn analysis_file(&self) -> String {
        format!("{}/type/file/{}/analysis_file", self.base, self.versions.analysis_file)
    }

    pub fn reference_file(&self) -> String {
        format!("{}/type/file/{}/reference_file", self.base, self.versions.reference_file)
    }

    pub fn file_descriptor(&self) -> String {
        format!("{}/system/{}/file_descriptor", self.base, self.versions.file_descriptor)
    }

    pub fn links(&self) -> String {
        format!("{}/system/{}/links", self.base, self.versions.links)
    }
}

/// Last path segment of a schema URL (`.../analysis_process` -> `analysis_process`).
pub fn schema_name(described_by: &str) -> &str {
    described_by
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(described_by)
}
