// crates/dcp-metadata/src/pipeline.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dcp_core::DcpError;

/// Analysis pipelines the builder knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Optimus,
    #[serde(rename = "smartseq2")]
    SmartSeq2,
    #[serde(rename = "smartseq2_multisample")]
    SmartSeq2Multisample,
    #[serde(rename = "cellranger")]
    CellRanger,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Optimus => "optimus",
            PipelineKind::SmartSeq2 => "smartseq2",
            PipelineKind::SmartSeq2Multisample => "smartseq2_multisample",
            PipelineKind::CellRanger => "cellranger",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = DcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | ' '))
            .collect();
        match normalized.as_str() {
            "optimus" => Ok(PipelineKind::Optimus),
            "smartseq2" | "ss2" => Ok(PipelineKind::SmartSeq2),
            "smartseq2_multisample" | "smartseq2multisample" | "multisamplesmartseq2" => {
                Ok(PipelineKind::SmartSeq2Multisample)
            }
            "cellranger" => Ok(PipelineKind::CellRanger),
            _ => Err(DcpError::UnsupportedPipelineType(s.to_string())),
        }
    }
}
