// crates/dcp-metadata/src/config.rs
//
// Builder configuration: everything besides the run record that feeds the
// emitted documents.

use serde::{Deserialize, Serialize};

use dcp_core::DcpError;

use crate::pipeline::PipelineKind;
use crate::schema::{SchemaUrls, SchemaVersions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub pipeline: PipelineKind,
    /// Pipeline version string used as the protocol id (e.g. "optimus_v4.2.3").
    pub pipeline_version: String,
    /// Workspace version; becomes every document's submission/update date.
    pub workspace_version: String,
    /// Base URL the `describedBy` schema URLs are built from.
    pub schema_url: String,
    /// URL of the workflow definition.
    pub computational_method: String,
    /// Default input id for outputs that don't carry their own.
    pub input_uuid: String,
    #[serde(default)]
    pub reference_ids: Vec<String>,
    #[serde(default)]
    pub schema_versions: SchemaVersions,
}

impl BuilderConfig {
    pub fn schema_urls(&self) -> SchemaUrls<'_> {
        SchemaUrls::new(&self.schema_url, &self.schema_versions)
    }

    /// Reject configurations that would produce unusable documents.
    pub fn validate(&self) -> Result<(), DcpError> {
        let required = [
            ("pipeline_version", &self.pipeline_version),
            ("workspace_version", &self.workspace_version),
            ("schema_url", &self.schema_url),
            ("input_uuid", &self.input_uuid),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DcpError::Validation(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> BuilderConfig {
    BuilderConfig {
        pipeline: PipelineKind::Optimus,
        pipeline_version: "optimus_v4.2.3".to_string(),
        workspace_version: "2021-07-26T14:48:29.000000Z".to_string(),
        schema_url: "https://schema.example.org".to_string(),
        computational_method: "https://github.com/pipelines/optimus/optimus.wdl".to_string(),
        input_uuid: "0244354d-cf37-4483-8db3-425b7e504ca6".to_string(),
        reference_ids: vec!["ref-genome-id".to_string()],
        schema_versions: SchemaVersions::default(),
    }
}
