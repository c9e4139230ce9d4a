// crates/dcp-submit/src/gcs.rs
//
// ObjectStore over the Cloud Storage JSON API. Only object metadata is read;
// object contents are never downloaded.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use dcp_core::{base64_to_hex, DcpError, ObjectStat, ObjectStore, TokenSource};
use dcp_http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use dcp_http::HttpClient;

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcsObject {
    /// The JSON API reports sizes as decimal strings.
    size: String,
    md5_hash: Option<String>,
    crc32c: Option<String>,
    time_created: Option<String>,
}

pub struct GcsObjectStore {
    http: Arc<HttpClient>,
    endpoint: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl GcsObjectStore {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            endpoint: DEFAULT_GCS_ENDPOINT.to_string(),
            tokens: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send a bearer token with every request. Without one, requests are
    /// anonymous and only public buckets are readable.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// JSON API metadata URL for a `gs://bucket/object` URL.
    pub fn metadata_url(&self, url: &str) -> Result<String, DcpError> {
        let (bucket, object) = split_gs_url(url)?;
        let mut api = Url::parse(&self.endpoint).map_err(|e| {
            DcpError::Validation(format!("Invalid storage endpoint {}: {}", self.endpoint, e))
        })?;
        api.path_segments_mut()
            .map_err(|_| {
                DcpError::Validation(format!("Storage endpoint {} cannot be a base", self.endpoint))
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", object]);
        Ok(api.to_string())
    }

    fn headers(&self) -> Result<HeaderMap, DcpError> {
        let mut headers = HeaderMap::new();
        if let Some(tokens) = &self.tokens {
            let value = HeaderValue::from_str(&format!("Bearer {}", tokens.token()?))
                .map_err(|e| DcpError::Auth(format!("Token is not a valid header value: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn stat(&self, url: &str) -> Result<ObjectStat, DcpError> {
        let resp = self.http.get(&self.metadata_url(url)?, &self.headers()?).await?;
        let object: GcsObject = resp.json()?;

        let size = object.size.parse::<u64>().map_err(|e| {
            DcpError::Serialization(format!("Invalid size {:?} for {}: {}", object.size, url, e))
        })?;
        Ok(ObjectStat {
            size,
            md5: object.md5_hash.as_deref().map(base64_to_hex).transpose()?,
            sha256: None,
            crc32c: object.crc32c.as_deref().map(base64_to_hex).transpose()?,
            creation_time: object.time_created,
        })
    }
}

/// Split `gs://bucket/path/to/object` into bucket and object name.
pub fn split_gs_url(url: &str) -> Result<(&str, &str), DcpError> {
    url.strip_prefix("gs://")
        .and_then(|rest| rest.split_once('/'))
        .filter(|(bucket, object)| !bucket.is_empty() && !object.is_empty())
        .ok_or_else(|| DcpError::Validation(format!("Not a gs:// object URL: {}", url)))
}
