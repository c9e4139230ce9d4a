// crates/dcp-cli/src/commands/mod.rs
//
// Subcommand implementations plus the context they share: the resolved
// configuration, one HTTP client, and the output directory.

pub mod analysis_metadata;
pub mod confirm;
pub mod reference_file;
pub mod submit;
pub mod upload_urn;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use dcp_auth::{ServiceAccountKey, ServiceAccountTokenSource};
use dcp_core::{DcpError, DirectorySink, TokenSource};
use dcp_http::HttpClient;
use dcp_submit::{Orchestrator, SubmissionClient};

use crate::config::ToolsConfig;

pub struct Context {
    pub config: ToolsConfig,
    pub http: Arc<HttpClient>,
}

impl Context {
    pub fn new(config: ToolsConfig) -> Result<Self, DcpError> {
        let http = Arc::new(HttpClient::new(config.http.clone())?);
        Ok(Self { config, http })
    }

    pub fn sink(&self) -> DirectorySink {
        DirectorySink::new(&self.config.output_dir)
    }

    /// Orchestrator authenticated with the service account at `key_path`.
    pub fn orchestrator(
        &self,
        key_path: &str,
        runtime_environment: &str,
    ) -> Result<Orchestrator, DcpError> {
        let tokens = ingest_tokens(key_path, runtime_environment)?;
        Ok(Orchestrator::new(SubmissionClient::new(self.http.clone(), tokens)))
    }
}

fn ingest_tokens(
    key_path: &str,
    runtime_environment: &str,
) -> Result<Arc<dyn TokenSource>, DcpError> {
    let key = ServiceAccountKey::load(key_path)?;
    let source = ServiceAccountTokenSource::new(key, runtime_environment)?;
    tracing::debug!("Ingest audience {}", source.audience());
    Ok(Arc::new(source))
}

pub fn read_text(path: impl AsRef<Path>) -> Result<String, DcpError> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|e| DcpError::Io(format!("Failed to read {}: {}", path.display(), e)))
}

pub fn read_json(path: impl AsRef<Path>) -> Result<Value, DcpError> {
    let path = path.as_ref();
    serde_json::from_str(&read_text(path)?)
        .map_err(|e| DcpError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Parse a `true`/`false` flag value.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected true or false, got {:?}", other)),
    }
}
