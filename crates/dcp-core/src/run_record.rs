// crates/dcp-core/src/run_record.rs
//
// Parsed workflow-run record consumed by the metadata builder.
//
// The field names follow the workflow engine's metadata JSON, so a run's
// metadata file deserializes directly into a `RunRecord`. Sub-workflow calls
// carry a nested record under `subWorkflowMetadata`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DcpError;

/// One completed workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    /// Workflow run UUID.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    /// Ordered process inputs. Usually filled from a separate inputs file.
    #[serde(default, skip_deserializing)]
    pub inputs: Vec<InputParameter>,
    /// Fully-qualified task name -> one record per attempt or scatter shard.
    #[serde(default)]
    pub calls: BTreeMap<String, Vec<CallRecord>>,
}

impl RunRecord {
    /// Parse a run record from the engine's metadata JSON.
    pub fn from_json(json: &str) -> Result<Self, DcpError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Attach process inputs, replacing any already present.
    pub fn with_inputs(mut self, inputs: Vec<InputParameter>) -> Self {
        self.inputs = inputs;
        self
    }
}

/// A single task invocation, or a nested sub-workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(rename = "subWorkflowMetadata", default)]
    pub sub_workflow_metadata: Option<Box<RunRecord>>,
    #[serde(rename = "runtimeAttributes", default)]
    pub runtime_attributes: Option<RuntimeAttributes>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeAttributes {
    #[serde(default, deserialize_with = "string_or_number")]
    pub cpu: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub disks: Option<String>,
    #[serde(default)]
    pub docker: Option<String>,
    #[serde(default)]
    pub zones: Option<String>,
}

/// A named process input, in the order the workflow declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputParameter {
    pub parameter_name: String,
    pub parameter_value: String,
    /// Lowercase hex md5 of the referenced object, when enriched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl InputParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter_name: name.into(),
            parameter_value: value.into(),
            checksum: None,
        }
    }
}

// The engine reports `cpu` as either "2" or 2 depending on the backend.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
