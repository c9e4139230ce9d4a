// crates/dcp-auth/src/token.rs
//
// RS256 JWT minted from a service-account key, scoped to the audience of the
// deployment being submitted to.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use dcp_core::{DcpError, TokenSource};

use crate::key::ServiceAccountKey;

pub const DEV_AUDIENCE: &str = "https://dev.data.humancellatlas.org/";
pub const PROD_AUDIENCE: &str = "https://data.humancellatlas.org/";

/// Lifetime of a minted token, in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

const GROUP: &str = "hca";
const SCOPES: &[&str] = &["email", "openid", "offline_access"];

/// Audience for a deployment name: non-production deployments share the
/// dev audience, everything else gets production.
pub fn audience_for(deployment: &str) -> &'static str {
    match deployment.trim().to_ascii_lowercase().as_str() {
        "dev" | "integration" | "test" | "staging" => DEV_AUDIENCE,
        _ => PROD_AUDIENCE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub email: String,
    pub scope: Vec<String>,
    #[serde(rename = "https://auth.data.humancellatlas.org/group")]
    pub group: String,
}

/// Stateless token source backed by a service-account key.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    audience: String,
}

impl ServiceAccountTokenSource {
    /// Build a token source for `deployment` (e.g. "staging", "prod").
    pub fn new(key: ServiceAccountKey, deployment: &str) -> Result<Self, DcpError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| DcpError::Auth(format!("Invalid RSA private key: {}", e)))?;
        let audience = audience_for(deployment).to_string();
        tracing::debug!(
            "Token source for {} with audience {}",
            key.client_email,
            audience
        );
        Ok(Self {
            key,
            encoding_key,
            audience,
        })
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn claims_at(&self, now: i64) -> Claims {
        Claims {
            iss: self.key.client_email.clone(),
            sub: self.key.client_email.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            email: self.key.client_email.clone(),
            scope: SCOPES.iter().map(|s| s.to_string()).collect(),
            group: GROUP.to_string(),
        }
    }

    /// Token issued at `now` (seconds since the epoch).
    pub fn token_at(&self, now: i64) -> Result<String, DcpError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key.private_key_id.clone());
        encode(&header, &self.claims_at(now), &self.encoding_key)
            .map_err(|e| DcpError::Auth(format!("Failed to sign token: {}", e)))
    }
}

impl TokenSource for ServiceAccountTokenSource {
    fn token(&self) -> Result<String, DcpError> {
        self.token_at(Utc::now().timestamp())
    }
}

/// A fixed, externally obtained bearer token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Result<String, DcpError> {
        Ok(self.0.clone())
    }
}
