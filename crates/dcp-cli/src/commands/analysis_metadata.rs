// crates/dcp-cli/src/commands/analysis_metadata.rs
//
// `dcp create-analysis-metadata`: build the protocol, process, file, and
// links documents for one completed workflow run.

use std::sync::Arc;

use clap::Args;

use dcp_auth::StaticToken;
use dcp_core::{DcpError, RunRecord};
use dcp_metadata::{
    add_md5s, build_metadata, parse_inputs_tsv, BuilderConfig, OutputFile, PipelineKind,
    SchemaVersions,
};
use dcp_submit::GcsObjectStore;

use super::{parse_bool, read_text, Context};

#[derive(Debug, Args)]
pub struct AnalysisMetadataCmd {
    /// Workflow engine metadata JSON for the run.
    #[arg(long = "metadata_json")]
    pub metadata_json: String,

    /// Two-row TSV of process input names and values.
    #[arg(long = "inputs_file")]
    pub inputs_file: String,

    /// JSON array describing the run's output files.
    #[arg(long = "outputs_file")]
    pub outputs_file: String,

    #[arg(long = "schema_url")]
    pub schema_url: String,

    /// One of optimus, smartseq2, smartseq2_multisample, cellranger.
    #[arg(long)]
    pub pipeline: String,

    #[arg(long = "pipeline_version")]
    pub pipeline_version: String,

    #[arg(long = "workspace_version")]
    pub workspace_version: String,

    /// URL of the workflow definition.
    #[arg(long)]
    pub method: String,

    #[arg(long = "input_uuid")]
    pub input_uuid: String,

    /// Reference file document ids used by the run. Repeatable.
    #[arg(long = "reference_id")]
    pub reference_ids: Vec<String>,

    /// Record the md5 of every gs:// input.
    #[arg(
        long = "add_md5s",
        default_value = "false",
        action = clap::ArgAction::Set,
        value_parser = parse_bool
    )]
    pub add_md5s: bool,

    /// Bearer token for reading object metadata from private buckets.
    #[arg(long = "gcs_access_token")]
    pub gcs_access_token: Option<String>,
}

impl AnalysisMetadataCmd {
    fn builder_config(&self) -> Result<BuilderConfig, DcpError> {
        Ok(BuilderConfig {
            pipeline: self.pipeline.parse::<PipelineKind>()?,
            pipeline_version: self.pipeline_version.clone(),
            workspace_version: self.workspace_version.clone(),
            schema_url: self.schema_url.clone(),
            computational_method: self.method.clone(),
            input_uuid: self.input_uuid.clone(),
            reference_ids: self.reference_ids.clone(),
            schema_versions: SchemaVersions::default(),
        })
    }
}

/// Run the create-analysis-metadata command.
pub async fn run(ctx: &Context, cmd: &AnalysisMetadataCmd) -> Result<(), DcpError> {
    let config = cmd.builder_config()?;

    let inputs = parse_inputs_tsv(&read_text(&cmd.inputs_file)?)?;
    let mut record = RunRecord::from_json(&read_text(&cmd.metadata_json)?)?.with_inputs(inputs);
    let outputs = OutputFile::list_from_json(&read_text(&cmd.outputs_file)?)?;

    if cmd.add_md5s {
        let mut store = GcsObjectStore::new(ctx.http.clone());
        if let Some(token) = &cmd.gcs_access_token {
            store = store.with_token_source(Arc::new(StaticToken::new(token.clone())));
        }
        add_md5s(&mut record.inputs, &store).await?;
    }

    let bundle = build_metadata(&record, &outputs, &config)?;
    bundle.write_to(&ctx.sink())?;

    tracing::info!(
        "Wrote metadata for workflow {} to {}",
        bundle.process.process_core.process_id,
        ctx.config.output_dir
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use std::fs;
    use std::path::PathBuf;

    const RUN: &str = r#"{
        "id": "ad07d2f1-7dc4-4d64-ae5c-1a8f1c1ee0d9",
        "start": "2021-07-26T14:00:00.000Z",
        "end": "2021-07-26T15:00:00.000Z",
        "calls": {
            "Optimus.CountAlignments": [{
                "start": "2021-07-26T14:10:00.000Z",
                "end": "2021-07-26T14:20:00.000Z",
                "stdout": "gs://logs/count/stdout",
                "stderr": "gs://logs/count/stderr",
                "runtimeAttributes": {"cpu": "2", "memory": "8 GB", "disks": "local-disk 100 HDD", "docker": "count:1.0", "zones": "us-central1-b"}
            }]
        }
    }"#;

    const OUTPUTS: &str = r#"[{
        "path": "gs://bucket/out/matrix.loom",
        "size": 1024,
        "sha256": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
        "crc32c": "0b1c0d3e",
        "creation_time": "2021-07-26T15:01:00.000Z"
    }]"#;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dcp_cli_{}_{}", label, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn command(dir: &PathBuf) -> AnalysisMetadataCmd {
        fs::write(dir.join("metadata.json"), RUN).unwrap();
        fs::write(dir.join("inputs.tsv"), "fastq1\tchemistry\ngs://bucket/r1.fastq.gz\ttenX_v3\n").unwrap();
        fs::write(dir.join("outputs.json"), OUTPUTS).unwrap();
        AnalysisMetadataCmd {
            metadata_json: dir.join("metadata.json").to_string_lossy().into_owned(),
            inputs_file: dir.join("inputs.tsv").to_string_lossy().into_owned(),
            outputs_file: dir.join("outputs.json").to_string_lossy().into_owned(),
            schema_url: "https://schema.example.org".to_string(),
            pipeline: "optimus".to_string(),
            pipeline_version: "optimus_v4.2.3".to_string(),
            workspace_version: "2021-07-26T14:48:29.000000Z".to_string(),
            method: "https://github.com/pipelines/optimus/optimus.wdl".to_string(),
            input_uuid: "0244354d-cf37-4483-8db3-425b7e504ca6".to_string(),
            reference_ids: vec!["ref-genome-id".to_string()],
            add_md5s: false,
            gcs_access_token: None,
        }
    }

    fn context(out: &PathBuf) -> Context {
        Context::new(ToolsConfig {
            output_dir: out.to_string_lossy().into_owned(),
            ..ToolsConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn writes_top_level_artifacts() {
        let dir = temp_dir("analysis");
        let out = dir.join("out");
        run(&context(&out), &command(&dir)).await.unwrap();

        assert_eq!(
            fs::read_to_string(out.join("workflow_id.txt")).unwrap(),
            "ad07d2f1-7dc4-4d64-ae5c-1a8f1c1ee0d9"
        );
        let outputs: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("outputs.json")).unwrap()).unwrap();
        assert_eq!(outputs.as_array().map(Vec::len), Some(1));
        assert!(out.join("analysis_process.json").exists());
        assert!(out.join("analysis_protocol.json").exists());
        assert!(out.join("links").is_dir());
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unknown_pipeline_fails_before_reading_files() {
        let dir = temp_dir("pipeline");
        let mut cmd = command(&dir);
        cmd.pipeline = "bulk_rna".to_string();
        match run(&context(&dir.join("out")), &cmd).await {
            Err(DcpError::UnsupportedPipelineType(name)) => assert_eq!(name, "bulk_rna"),
            other => panic!("Expected UnsupportedPipelineType, got: {:?}", other),
        }
        assert!(!dir.join("out").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
