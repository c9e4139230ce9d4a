// crates/dcp-core/src/traits.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DcpError;

/// Produces a short-lived bearer token for the submission service.
///
/// Implemented by dcp-auth. Implementations are stateless; callers may cache.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Result<String, DcpError>;
}

/// Checksums and metadata for one object in a cloud bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStat {
    pub size: u64,
    /// Lowercase hex md5.
    pub md5: Option<String>,
    pub sha256: Option<String>,
    /// Lowercase hex crc32c.
    pub crc32c: Option<String>,
    pub creation_time: Option<String>,
}

/// Read-only access to object metadata in a cloud store.
///
/// Implemented by dcp-submit (GCS JSON API adapter).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn stat(&self, url: &str) -> Result<ObjectStat, DcpError>;
}

/// Destination for the artifacts the tools emit.
pub trait OutputSink: Send + Sync {
    /// Write a top-level text artifact such as `submission_url.txt`.
    fn write_text(&self, name: &str, contents: &str) -> Result<(), DcpError>;

    /// Write a top-level JSON artifact such as `analysis_process.json`.
    fn write_json(&self, name: &str, value: &Value) -> Result<(), DcpError> {
        let text = serde_json::to_string_pretty(value)?;
        self.write_text(name, &text)
    }

    /// Write one metadata document as `<kind>/<document_id>_<version>.json`.
    fn write_document(
        &self,
        kind: &str,
        document_id: &str,
        version: &str,
        document: &Value,
    ) -> Result<(), DcpError> {
        let name = format!("{}/{}_{}.json", kind, document_id, version);
        self.write_json(&name, document)
    }
}
