use thiserror::Error;

/// Error types shared by every DCP submission tool.
#[derive(Debug, Error)]
pub enum DcpError {
    /// Terminal HTTP failure, or a final response outside 200-299.
    #[error("HTTP error {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// Connection or read failure that outlived the retry budget.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The retry budget ran out while the polling predicate still held.
    #[error(
        "Retry budget exhausted for {url} after {attempts} attempts in {elapsed_secs}s (timeout {timeout_secs}s)"
    )]
    RetryExhausted {
        url: String,
        attempts: u32,
        elapsed_secs: u64,
        timeout_secs: u64,
    },

    /// Bad input to the metadata builder or a driver.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested pipeline kind is not one the builder understands.
    #[error("Unsupported pipeline type: {0}")]
    UnsupportedPipelineType(String),

    /// The submission envelope reached the `Invalid` state.
    #[error("Submission {envelope_url} ended in state {state}")]
    Submission { envelope_url: String, state: String },

    /// A HATEOAS response did not expose a required link.
    #[error("Missing link: {0}")]
    MissingLink(String),

    /// Token minting or key loading failed.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Local filesystem error.
    #[error("IO error: {0}")]
    Io(String),
}

impl DcpError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DcpError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DcpError {
    fn from(e: serde_json::Error) -> Self {
        DcpError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for DcpError {
    fn from(e: std::io::Error) -> Self {
        DcpError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_is_single_line_with_url_and_status() {
        let err = DcpError::Http {
            status: 400,
            url: "https://api.ingest.example/submissionEnvelopes".to_string(),
            body: "bad request".to_string(),
        };
        let msg = err.to_string();
        assert!(!msg.contains('\n'));
        assert!(msg.contains("400"));
        assert!(msg.contains("https://api.ingest.example/submissionEnvelopes"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn retry_exhausted_quotes_timeout() {
        let err = DcpError::RetryExhausted {
            url: "http://envelope".to_string(),
            attempts: 3,
            elapsed_secs: 0,
            timeout_secs: 7200,
        };
        assert!(err.to_string().contains("timeout 7200s"));
        assert_eq!(err.status(), None);
    }
}
