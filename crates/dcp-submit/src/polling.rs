// crates/dcp-submit/src/polling.rs
//
// Envelope polling. Both contracts are a single GET with a `retry_while`
// predicate, so they share the HTTP client's backoff and retry budget.
// Headers are rebuilt per attempt; a poll can outlive a bearer token.

use std::fmt;

use serde_json::Value;

use dcp_core::DcpError;
use dcp_http::header::HeaderMap;
use dcp_http::{HeaderSource, HttpClient, HttpResponse};

/// `submissionState` of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeState {
    Pending,
    Draft,
    Validating,
    Valid,
    Invalid,
    Submitted,
    Processing,
    Cleanup,
    Complete,
    Other(String),
}

impl EnvelopeState {
    pub fn parse(state: &str) -> Self {
        match state {
            "Pending" => EnvelopeState::Pending,
            "Draft" => EnvelopeState::Draft,
            "Validating" => EnvelopeState::Validating,
            "Valid" => EnvelopeState::Valid,
            "Invalid" => EnvelopeState::Invalid,
            "Submitted" => EnvelopeState::Submitted,
            "Processing" => EnvelopeState::Processing,
            "Cleanup" => EnvelopeState::Cleanup,
            "Complete" => EnvelopeState::Complete,
            other => EnvelopeState::Other(other.to_string()),
        }
    }

    /// State of an envelope body; missing states read as `Other("")`.
    pub fn of(envelope: &Value) -> Self {
        Self::parse(
            envelope
                .get("submissionState")
                .and_then(Value::as_str)
                .unwrap_or(""),
        )
    }

    /// Valid, Complete and Invalid end validation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnvelopeState::Valid | EnvelopeState::Complete | EnvelopeState::Invalid
        )
    }
}

impl fmt::Display for EnvelopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeState::Pending => write!(f, "Pending"),
            EnvelopeState::Draft => write!(f, "Draft"),
            EnvelopeState::Validating => write!(f, "Validating"),
            EnvelopeState::Valid => write!(f, "Valid"),
            EnvelopeState::Invalid => write!(f, "Invalid"),
            EnvelopeState::Submitted => write!(f, "Submitted"),
            EnvelopeState::Processing => write!(f, "Processing"),
            EnvelopeState::Cleanup => write!(f, "Cleanup"),
            EnvelopeState::Complete => write!(f, "Complete"),
            EnvelopeState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Header source for envelopes readable without credentials.
pub fn no_headers() -> Result<HeaderMap, DcpError> {
    Ok(HeaderMap::new())
}

fn body_json(resp: &HttpResponse) -> Option<Value> {
    serde_json::from_str(&resp.body).ok()
}

/// Poll `envelope_url` until its state is terminal and return the envelope.
pub async fn wait_for_valid_status(
    http: &HttpClient,
    envelope_url: &str,
    headers: HeaderSource<'_>,
) -> Result<Value, DcpError> {
    let resp = http
        .poll_while(envelope_url, headers, |resp| {
            let state = body_json(resp)
                .map(|body| EnvelopeState::of(&body))
                .unwrap_or_else(|| EnvelopeState::Other(String::new()));
            if !state.is_terminal() {
                tracing::debug!("Envelope {} is {}", envelope_url, state);
            }
            !state.is_terminal()
        })
        .await?;
    let envelope = resp.json_value()?;
    tracing::info!("Envelope {} reached {}", envelope_url, EnvelopeState::of(&envelope));
    Ok(envelope)
}

fn upload_urn(envelope: &Value) -> Option<&str> {
    envelope
        .pointer("/stagingDetails/stagingAreaLocation/value")
        .and_then(Value::as_str)
}

/// Poll `envelope_url` until the staging area location is set and return it.
/// The value is opaque; its shape differs between deployments.
pub async fn wait_for_upload_urn(
    http: &HttpClient,
    envelope_url: &str,
    headers: HeaderSource<'_>,
) -> Result<String, DcpError> {
    let resp = http
        .poll_while(envelope_url, headers, |resp| {
            body_json(resp)
                .as_ref()
                .and_then(upload_urn)
                .is_none()
        })
        .await?;
    let envelope = resp.json_value()?;
    upload_urn(&envelope)
        .map(str::to_string)
        .ok_or_else(|| DcpError::MissingLink(format!("stagingAreaLocation on {}", envelope_url)))
}
