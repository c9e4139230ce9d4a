// crates/dcp-metadata/src/links.rs

use dcp_core::{canonical_json, uuid5, DcpError};

use crate::config::BuilderConfig;
use crate::documents::{
    to_value, AnalysisFile, AnalysisProcess, AnalysisProtocol, LinkOutput, LinkProtocol, Links,
    ProcessLink,
};
use crate::schema::schema_name;

/// Build the links document tying the process to its inputs, outputs and
/// protocol.
pub fn build_links(
    process: &AnalysisProcess,
    protocol: &AnalysisProtocol,
    files: &[AnalysisFile],
    config: &BuilderConfig,
) -> Result<Links, DcpError> {
    let outputs = files
        .iter()
        .map(|file| {
            Ok(LinkOutput {
                output_type: schema_name(&file.described_by).to_string(),
                output_id: uuid5(&canonical_json(&to_value(file)?)),
            })
        })
        .collect::<Result<Vec<_>, DcpError>>()?;

    let link = ProcessLink {
        link_type: "process_link".to_string(),
        process_id: process.process_core.process_id.clone(),
        process_type: schema_name(&process.described_by).to_string(),
        inputs: process.inputs.clone(),
        outputs,
        protocols: vec![LinkProtocol {
            protocol_type: schema_name(&protocol.described_by).to_string(),
            protocol_id: protocol.provenance.document_id.clone(),
        }],
    };

    Ok(Links {
        described_by: config.schema_urls().links(),
        schema_type: "links".to_string(),
        schema_version: config.schema_versions.links.clone(),
        links: vec![link],
    })
}
