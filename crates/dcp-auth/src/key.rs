// crates/dcp-auth/src/key.rs

use std::fs;
use std::path::Path;

use serde::Deserialize;

use dcp_core::DcpError;

/// The fields of a service-account JSON key the token source needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key_id: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, DcpError> {
        serde_json::from_str(json)
            .map_err(|e| DcpError::Auth(format!("Invalid service account key: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DcpError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DcpError::Auth(format!("Cannot read service account key {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }
}
