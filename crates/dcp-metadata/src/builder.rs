// crates/dcp-metadata/src/builder.rs
//
// The metadata builder: a pure function from a run record, its outputs, and
// a configuration to the full set of documents for one analysis.

use std::collections::HashSet;

use serde_json::Value;

use dcp_core::{DcpError, OutputSink, RunRecord};

use crate::config::BuilderConfig;
use crate::documents::{
    to_value, AnalysisFile, AnalysisProcess, AnalysisProtocol, FileDescriptor, Links,
};
use crate::files::{build_analysis_file, build_output_descriptor, OutputFile};
use crate::links::build_links;
use crate::process::build_process;
use crate::protocol::build_protocol;

pub const ANALYSIS_PROCESS_FILE: &str = "analysis_process.json";
pub const ANALYSIS_PROTOCOL_FILE: &str = "analysis_protocol.json";
pub const OUTPUTS_FILE: &str = "outputs.json";
pub const WORKFLOW_ID_FILE: &str = "workflow_id.txt";

/// Every document produced for one workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBundle {
    pub workspace_version: String,
    pub protocol: AnalysisProtocol,
    pub process: AnalysisProcess,
    pub files: Vec<AnalysisFile>,
    pub descriptors: Vec<FileDescriptor>,
    pub links: Links,
}

/// Build all documents for `record`. Identical inputs give identical output.
pub fn build_metadata(
    record: &RunRecord,
    outputs: &[OutputFile],
    config: &BuilderConfig,
) -> Result<MetadataBundle, DcpError> {
    config.validate()?;

    let protocol = build_protocol(config)?;
    let process = build_process(record, config)?;

    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(outputs.len());
    let mut descriptors = Vec::with_capacity(outputs.len());
    for output in outputs {
        let file = build_analysis_file(output, config)?;
        if !seen.insert(file.provenance.document_id.clone()) {
            return Err(DcpError::Validation(format!(
                "Output {} has the same document id ({}) as an earlier output",
                output.path, file.provenance.document_id
            )));
        }
        descriptors.push(build_output_descriptor(output, &file, config)?);
        files.push(file);
    }

    let links = build_links(&process, &protocol, &files, config)?;

    tracing::info!(
        "Built metadata for run {}: protocol {}, {} output(s)",
        process.process_core.process_id,
        protocol.provenance.document_id,
        files.len()
    );

    Ok(MetadataBundle {
        workspace_version: config.workspace_version.clone(),
        protocol,
        process,
        files,
        descriptors,
        links,
    })
}

impl MetadataBundle {
    /// The outputs list consumed by the submit driver: the analysis files.
    pub fn outputs_json(&self) -> Result<Value, DcpError> {
        to_value(&self.files)
    }

    /// Write the top-level artifacts plus one file per document.
    pub fn write_to(&self, sink: &dyn OutputSink) -> Result<(), DcpError> {
        let version = &self.workspace_version;
        let process_id = &self.process.process_core.process_id;

        sink.write_json(ANALYSIS_PROCESS_FILE, &to_value(&self.process)?)?;
        sink.write_json(ANALYSIS_PROTOCOL_FILE, &to_value(&self.protocol)?)?;
        sink.write_json(OUTPUTS_FILE, &self.outputs_json()?)?;
        sink.write_text(WORKFLOW_ID_FILE, process_id)?;

        sink.write_document(
            "analysis_protocol",
            &self.protocol.provenance.document_id,
            version,
            &to_value(&self.protocol)?,
        )?;
        sink.write_document(
            "analysis_process",
            &self.process.provenance.document_id,
            version,
            &to_value(&self.process)?,
        )?;
        for file in &self.files {
            sink.write_document(
                "analysis_file",
                &file.provenance.document_id,
                version,
                &to_value(file)?,
            )?;
        }
        for descriptor in &self.descriptors {
            sink.write_document(
                "file_descriptor",
                &descriptor.provenance.document_id,
                version,
                &to_value(descriptor)?,
            )?;
        }
        sink.write_document("links", process_id, version, &to_value(&self.links)?)?;

        tracing::debug!("Wrote {} documents", 3 + self.files.len() + self.descriptors.len());
        Ok(())
    }
}
