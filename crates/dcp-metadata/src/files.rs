// crates/dcp-metadata/src/files.rs
//
// Analysis files and their file descriptors, one pair per workflow output.
//
// An output's document id is uuid5(uuid5(input_id + extension)). The double
// hash is historical and kept so ids match those already indexed downstream.

use serde::{Deserialize, Serialize};

use dcp_core::{
    content_type_for, extension_of, file_name_of, format_from_name, normalize_timestamp, uuid5,
    DcpError,
};

use crate::config::BuilderConfig;
use crate::documents::{
    content_id, AnalysisFile, ContentDescription, FileCore, FileDescriptor, Provenance,
};
use crate::pipeline::PipelineKind;
use crate::schema::SchemaUrls;

pub const FILE_SOURCE: &str = "DCP/2 Analysis";

/// Metadata for one workflow output, as listed in the outputs file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: String,
    pub size: u64,
    pub sha256: String,
    pub crc32c: String,
    pub creation_time: String,
    /// Input the output derives from; falls back to the configured input id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_id: Option<String>,
}

impl OutputFile {
    /// Parse the JSON array written by the workflow's output manifest.
    pub fn list_from_json(json: &str) -> Result<Vec<OutputFile>, DcpError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }

    pub fn content(&self) -> FileContent<'_> {
        FileContent {
            path: &self.path,
            size: self.size,
            sha256: &self.sha256,
            crc32c: &self.crc32c,
            creation_time: &self.creation_time,
        }
    }
}

/// The facts about a file's bytes that go into its descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FileContent<'a> {
    pub path: &'a str,
    pub size: u64,
    pub sha256: &'a str,
    pub crc32c: &'a str,
    pub creation_time: &'a str,
}

/// Document id shared by an output's analysis file and its descriptor's `file_id`.
pub fn output_document_id(input_id: &str, path: &str) -> String {
    let name = format!("{}{}", input_id, extension_of(path));
    uuid5(&uuid5(&name))
}

fn content_description(path: &str, pipeline: PipelineKind) -> ContentDescription {
    let (text, ontology, label) = match format_from_name(path) {
        "bam" => ("DNA sequence alignment", "data:0863", "Sequence alignment"),
        "bai" => ("BAM index", "format:3327", "BAI"),
        "loom" => ("Count Matrix", "data:3917", "Count matrix"),
        _ => match pipeline {
            PipelineKind::SmartSeq2 => (
                "Gene expression quantification",
                "data:3112",
                "Gene expression matrix",
            ),
            PipelineKind::Optimus
            | PipelineKind::SmartSeq2Multisample
            | PipelineKind::CellRanger => ("Count Matrix", "data:3917", "Count matrix"),
        },
    };
    ContentDescription {
        text: text.to_string(),
        ontology: ontology.to_string(),
        ontology_label: label.to_string(),
    }
}

pub fn build_analysis_file(
    output: &OutputFile,
    config: &BuilderConfig,
) -> Result<AnalysisFile, DcpError> {
    let input_id = output.input_id.as_deref().unwrap_or(&config.input_uuid);
    if input_id.trim().is_empty() {
        return Err(DcpError::Validation(format!(
            "Output {} has no input id",
            output.path
        )));
    }

    Ok(AnalysisFile {
        described_by: config.schema_urls().analysis_file(),
        schema_type: "file".to_string(),
        file_core: FileCore {
            file_name: output.file_name().to_string(),
            format: format_from_name(&output.path).to_string(),
            file_source: FILE_SOURCE.to_string(),
            content_description: vec![content_description(&output.path, config.pipeline)],
        },
        provenance: Provenance::new(
            output_document_id(input_id, &output.path),
            &config.workspace_version,
        ),
    })
}

/// Descriptor for the bytes behind `file_id`.
pub fn build_file_descriptor(
    urls: &SchemaUrls<'_>,
    workspace_version: &str,
    content: &FileContent<'_>,
    file_id: &str,
) -> Result<FileDescriptor, DcpError> {
    let mut descriptor = FileDescriptor {
        described_by: urls.file_descriptor(),
        schema_type: "file_descriptor".to_string(),
        schema_version: urls.versions().file_descriptor.clone(),
        content_type: content_type_for(content.path).to_string(),
        size: content.size,
        sha256: content.sha256.to_string(),
        crc32c: content.crc32c.to_string(),
        file_id: file_id.to_string(),
        file_version: normalize_timestamp(content.creation_time)?,
        file_name: file_name_of(content.path).to_string(),
        provenance: Provenance::new(String::new(), workspace_version),
    };
    descriptor.provenance.document_id = content_id(&descriptor)?;
    Ok(descriptor)
}

pub fn build_output_descriptor(
    output: &OutputFile,
    file: &AnalysisFile,
    config: &BuilderConfig,
) -> Result<FileDescriptor, DcpError> {
    build_file_descriptor(
        &config.schema_urls(),
        &config.workspace_version,
        &output.content(),
        &file.provenance.document_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn bam_output() -> OutputFile {
        OutputFile {
            path: "gs://bucket/run/outputs/heart_1k.bam".to_string(),
            size: 1024,
            sha256: "ab".repeat(32),
            crc32c: "0a1b2c3d".to_string(),
            creation_time: "2021-07-26T17:31:00Z".to_string(),
            input_id: None,
        }
    }

    #[test]
    fn document_id_is_double_hash_of_input_and_extension() {
        let config = test_config();
        let file = build_analysis_file(&bam_output(), &config).unwrap();
        let expected = uuid5(&uuid5("0244354d-cf37-4483-8db3-425b7e504ca6.bam"));
        assert_eq!(file.provenance.document_id, expected);
        assert_eq!(file.file_core.file_name, "heart_1k.bam");
        assert_eq!(file.file_core.format, "bam");
        assert_eq!(file.file_core.content_description[0].ontology, "data:0863");
    }

    #[test]
    fn explicit_input_id_overrides_config() {
        let mut output = bam_output();
        output.input_id = Some("other-input".to_string());
        let file = build_analysis_file(&output, &test_config()).unwrap();
        assert_eq!(
            file.provenance.document_id,
            output_document_id("other-input", &output.path)
        );
    }

    #[test]
    fn content_description_by_extension_and_pipeline() {
        assert_eq!(
            content_description("x.loom", PipelineKind::SmartSeq2).ontology,
            "data:3917"
        );
        assert_eq!(
            content_description("x.bai", PipelineKind::Optimus).ontology,
            "format:3327"
        );
        assert_eq!(
            content_description("x.csv", PipelineKind::SmartSeq2).ontology,
            "data:3112"
        );
        assert_eq!(
            content_description("x.h5ad", PipelineKind::CellRanger).ontology,
            "data:3917"
        );
    }

    #[test]
    fn descriptor_points_at_analysis_file() {
        let config = test_config();
        let output = bam_output();
        let file = build_analysis_file(&output, &config).unwrap();
        let descriptor = build_output_descriptor(&output, &file, &config).unwrap();

        assert_eq!(descriptor.file_id, file.provenance.document_id);
        assert_eq!(descriptor.file_version, "2021-07-26T17:31:00.000000Z");
        assert_eq!(descriptor.content_type, "application/octet-stream");
        assert_eq!(descriptor.file_name, "heart_1k.bam");
        assert_eq!(descriptor.schema_version, "2.0.0");
        assert_ne!(descriptor.provenance.document_id, descriptor.file_id);
    }

    #[test]
    fn parses_outputs_manifest() {
        let outputs = OutputFile::list_from_json(
            r#"[{"path": "gs://b/a.loom", "size": 10, "sha256": "aa", "crc32c": "bb",
                 "creation_time": "2021-07-26T17:31:00Z", "input_id": "in-1"}]"#,
        )
        .unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].input_id.as_deref(), Some("in-1"));
        assert_eq!(outputs[0].file_name(), "a.loom");
    }
}
