// crates/dcp-metadata/src/protocol.rs

use dcp_core::DcpError;

use crate::config::BuilderConfig;
use crate::documents::{content_id, AnalysisProtocol, Provenance, ProtocolCore, TextLabel};

/// Build the analysis protocol for the configured pipeline version.
///
/// The document id is derived from the protocol content, so two runs of the
/// same pipeline version share one protocol.
pub fn build_protocol(config: &BuilderConfig) -> Result<AnalysisProtocol, DcpError> {
    let mut protocol = AnalysisProtocol {
        described_by: config.schema_urls().analysis_protocol(),
        schema_type: "protocol".to_string(),
        protocol_core: ProtocolCore {
            protocol_id: config.pipeline_version.clone(),
        },
        computational_method: config.computational_method.clone(),
        protocol_type: TextLabel::new("analysis_protocol"),
        provenance: Provenance::new(String::new(), &config.workspace_version),
    };
    protocol.provenance.document_id = content_id(&protocol)?;
    Ok(protocol)
}
