// crates/dcp-cli/src/commands/submit.rs
//
// `dcp submit`: create an envelope and push the analysis protocol, process,
// and file references into it, then wait for validation and confirm.

use clap::Args;
use serde_json::Value;

use dcp_core::DcpError;
use dcp_metadata::{SchemaUrls, SchemaVersions};
use dcp_submit::SubmissionRequest;

use super::{read_json, Context};

#[derive(Debug, Args)]
pub struct SubmitCmd {
    /// Root URL of the ingest API.
    #[arg(long = "submit_url")]
    pub submit_url: String,

    #[arg(long = "analysis_process_path")]
    pub analysis_process_path: String,

    #[arg(long = "analysis_protocol_path")]
    pub analysis_protocol_path: String,

    /// JSON array of analysis file documents.
    #[arg(long = "outputs_file_path")]
    pub outputs_file_path: String,

    #[arg(long = "schema_url")]
    pub schema_url: String,

    /// Schema version every analysis file document must be described by.
    #[arg(long = "analysis_file_version")]
    pub analysis_file_version: String,

    /// Deployment name; selects the token audience.
    #[arg(long = "runtime_environment")]
    pub runtime_environment: String,

    #[arg(long = "service_account_key_path")]
    pub service_account_key_path: String,

    /// Bundle the analysed data came from.
    #[arg(long = "input_bundle_uuid")]
    pub input_bundle_uuid: Option<String>,

    /// Stop after attaching file references; confirm later with `dcp confirm`.
    #[arg(long = "no_confirm")]
    pub no_confirm: bool,
}

/// Check every output is an analysis file of the expected schema version.
pub fn check_outputs(
    outputs: Value,
    schema_url: &str,
    analysis_file_version: &str,
) -> Result<Vec<Value>, DcpError> {
    let versions = SchemaVersions {
        analysis_file: analysis_file_version.to_string(),
        ..SchemaVersions::default()
    };
    let expected = SchemaUrls::new(schema_url, &versions).analysis_file();

    let outputs = match outputs {
        Value::Array(items) => items,
        _ => {
            return Err(DcpError::Validation(
                "Outputs file must contain a JSON array".to_string(),
            ))
        }
    };
    for output in &outputs {
        let described_by = output.get("describedBy").and_then(Value::as_str);
        if described_by != Some(expected.as_str()) {
            return Err(DcpError::Validation(format!(
                "Output described by {:?}, expected {}",
                described_by.unwrap_or(""),
                expected
            )));
        }
    }
    Ok(outputs)
}

/// Run the submit command.
pub async fn run(ctx: &Context, cmd: &SubmitCmd) -> Result<(), DcpError> {
    let outputs = check_outputs(
        read_json(&cmd.outputs_file_path)?,
        &cmd.schema_url,
        &cmd.analysis_file_version,
    )?;
    let request = SubmissionRequest {
        submit_url: cmd.submit_url.clone(),
        protocol: read_json(&cmd.analysis_protocol_path)?,
        process: read_json(&cmd.analysis_process_path)?,
        outputs,
        input_bundle_uuid: cmd.input_bundle_uuid.clone(),
        confirm: !cmd.no_confirm,
        file_ref_concurrency: ctx.config.file_ref_concurrency,
    };

    let orchestrator =
        ctx.orchestrator(&cmd.service_account_key_path, &cmd.runtime_environment)?;
    let outcome = orchestrator.submit(&request, &ctx.sink()).await?;

    match &outcome.state {
        Some(state) => tracing::info!(
            "Envelope {} finished in state {} (confirmed: {})",
            outcome.envelope_url,
            state,
            outcome.confirmed
        ),
        None => tracing::info!("Envelope {} left unconfirmed", outcome.envelope_url),
    }
    println!("{}", outcome.envelope_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &str = "https://schema.example.org";

    #[test]
    fn accepts_matching_analysis_files() {
        let outputs = json!([
            {"describedBy": "https://schema.example.org/type/file/6.2.0/analysis_file",
             "file_core": {"file_name": "a.bam"}}
        ]);
        assert_eq!(check_outputs(outputs, SCHEMA, "6.2.0").unwrap().len(), 1);
    }

    #[test]
    fn rejects_other_schema_versions() {
        let outputs = json!([
            {"describedBy": "https://schema.example.org/type/file/5.0.0/analysis_file"}
        ]);
        match check_outputs(outputs, SCHEMA, "6.2.0") {
            Err(DcpError::Validation(msg)) => assert!(msg.contains("5.0.0")),
            other => panic!("Expected Validation, got: {:?}", other),
        }
    }

    #[test]
    fn rejects_non_array_outputs() {
        assert!(matches!(
            check_outputs(json!({"describedBy": "x"}), SCHEMA, "6.2.0"),
            Err(DcpError::Validation(_))
        ));
    }
}
