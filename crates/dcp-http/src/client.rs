// crates/dcp-http/src/client.rs
//
// HttpClient: the single point of network I/O for the submission tools.
//
// Every call runs under the retry budget from `HttpConfig`:
//   - connection errors, read timeouts, 5xx and 409 are retried
//   - any other 4xx fails immediately
//   - a 2xx response is retried while the caller's `retry_while` predicate holds
// Backoff is min(multiplier * 2^retry, max_interval); the loop stops at the
// first of wall-clock budget exhausted or max attempts reached.

use std::time::Instant;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use dcp_core::DcpError;

use crate::config::HttpConfig;
use crate::recorder::Recorder;

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DcpError> {
        serde_json::from_str(&self.body).map_err(|e| {
            DcpError::Serialization(format!("Invalid JSON from {}: {}", self.url, e))
        })
    }

    pub fn json_value(&self) -> Result<Value, DcpError> {
        self.json()
    }

    fn into_error(self) -> DcpError {
        DcpError::Http {
            status: self.status,
            url: self.url,
            body: single_line(&self.body),
        }
    }
}

/// Request payload. Everything is JSON except the link step's URI list.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    UriList(String),
}

impl RequestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Json(_) => "application/json",
            RequestBody::UriList(_) => "text/uri-list",
        }
    }

    fn to_text(&self) -> String {
        match self {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::UriList(uri) => uri.clone(),
        }
    }
}

/// Keeps polling while it returns true for a successful response.
pub type RetryPredicate<'a> = &'a (dyn Fn(&HttpResponse) -> bool + Send + Sync);

/// Invoked before every attempt with the 1-based attempt number.
pub type BeforeHook<'a> = &'a (dyn Fn(u32) + Send + Sync);

/// Builds the request headers for one attempt. Long polls use this so a
/// bearer token is minted per attempt instead of outliving its lifetime.
pub type HeaderSource<'a> = &'a (dyn Fn() -> Result<HeaderMap, DcpError> + Send + Sync);

/// Per-call overrides for GET.
#[derive(Default, Clone, Copy)]
pub struct GetOptions<'a> {
    pub retry_while: Option<RetryPredicate<'a>>,
    pub before: Option<BeforeHook<'a>>,
    /// Replaces the call's fixed headers on every attempt.
    pub headers: Option<HeaderSource<'a>>,
}

/// Why an attempt is being retried.
enum Retryable {
    Status(HttpResponse),
    Transport(String),
    Predicate,
}

/// Retrying, optionally recording HTTP client.
#[derive(Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
    recorder: Option<Recorder>,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, DcpError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DcpError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let recorder = if config.record {
            Some(Recorder::new(&config.record_directory)?)
        } else {
            None
        };

        Ok(Self {
            inner,
            config,
            recorder,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse, DcpError> {
        self.get_with(url, headers, GetOptions::default()).await
    }

    pub async fn get_with(
        &self,
        url: &str,
        headers: &HeaderMap,
        options: GetOptions<'_>,
    ) -> Result<HttpResponse, DcpError> {
        self.execute(Method::GET, url, headers, None, options).await
    }

    /// GET `url` until `predicate` returns false, sharing the client's
    /// backoff and budget.
    pub async fn retry_while<P>(
        &self,
        url: &str,
        headers: &HeaderMap,
        predicate: P,
    ) -> Result<HttpResponse, DcpError>
    where
        P: Fn(&HttpResponse) -> bool + Send + Sync,
    {
        let options = GetOptions {
            retry_while: Some(&predicate),
            ..GetOptions::default()
        };
        self.get_with(url, headers, options).await
    }

    /// Like `retry_while`, but headers come from `headers` on each attempt.
    pub async fn poll_while<P>(
        &self,
        url: &str,
        headers: HeaderSource<'_>,
        predicate: P,
    ) -> Result<HttpResponse, DcpError>
    where
        P: Fn(&HttpResponse) -> bool + Send + Sync,
    {
        let options = GetOptions {
            retry_while: Some(&predicate),
            headers: Some(headers),
            ..GetOptions::default()
        };
        self.get_with(url, &HeaderMap::new(), options).await
    }

    pub async fn put(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: Option<RequestBody>,
    ) -> Result<HttpResponse, DcpError> {
        self.execute(Method::PUT, url, headers, body.as_ref(), GetOptions::default())
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: Option<RequestBody>,
    ) -> Result<HttpResponse, DcpError> {
        self.execute(Method::POST, url, headers, body.as_ref(), GetOptions::default())
            .await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&RequestBody>,
        options: GetOptions<'_>,
    ) -> Result<HttpResponse, DcpError> {
        let started = Instant::now();
        let budget = self.config.retry_budget();
        let max_attempts = self.config.retry_max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if let Some(before) = options.before {
                before(attempt);
            }
            let minted;
            let attempt_headers = match options.headers {
                Some(source) => {
                    minted = source()?;
                    &minted
                }
                None => headers,
            };

            let pending = match self.send_once(&method, url, attempt_headers, body).await {
                Ok(resp) if resp.is_success() => match options.retry_while {
                    Some(predicate) if predicate(&resp) => Retryable::Predicate,
                    _ => return Ok(resp),
                },
                Ok(resp) if is_retryable_status(resp.status) => Retryable::Status(resp),
                Ok(resp) => return Err(resp.into_error()),
                Err(e) if is_retryable_transport(&e) => {
                    Retryable::Transport(format!("{} {}: {}", method, url, e))
                }
                Err(e) => return Err(DcpError::Transport(format!("{} {}: {}", method, url, e))),
            };

            let elapsed = started.elapsed();
            if attempt >= max_attempts || elapsed >= budget {
                tracing::warn!(
                    "Giving up on {} {} after {} attempts ({:.1}s)",
                    method,
                    url,
                    attempt,
                    elapsed.as_secs_f64()
                );
                return Err(match pending {
                    Retryable::Status(resp) => resp.into_error(),
                    Retryable::Transport(msg) => DcpError::Transport(msg),
                    Retryable::Predicate => DcpError::RetryExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        elapsed_secs: elapsed.as_secs(),
                        timeout_secs: self.config.retry_timeout_seconds,
                    },
                });
            }

            let wait = self.config.backoff(attempt - 1).min(budget - elapsed);
            match &pending {
                Retryable::Status(resp) => tracing::warn!(
                    "{} {} returned {}; retrying in {:.1}s (attempt {})",
                    method,
                    url,
                    resp.status,
                    wait.as_secs_f64(),
                    attempt
                ),
                Retryable::Transport(msg) => tracing::warn!(
                    "{}; retrying in {:.1}s (attempt {})",
                    msg,
                    wait.as_secs_f64(),
                    attempt
                ),
                Retryable::Predicate => tracing::debug!(
                    "Polling {} again in {:.1}s (attempt {})",
                    url,
                    wait.as_secs_f64(),
                    attempt
                ),
            }
            tokio::time::sleep(wait).await;
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&RequestBody>,
    ) -> Result<HttpResponse, reqwest::Error> {
        let body_text = body.map(RequestBody::to_text);
        let number = self.recorder.as_ref().map(|r| (r, r.next_number()));

        if let Some((recorder, n)) = number {
            if let Err(e) = recorder.record_request(n, method.as_str(), url, body_text.as_deref()) {
                tracing::warn!("Failed to record request {:03}: {}", n, e);
            }
        }

        tracing::debug!("{} {}", method, url);
        let mut builder = self.inner.request(method.clone(), url).headers(headers.clone());
        if let (Some(body), Some(text)) = (body, body_text) {
            builder = builder.header(CONTENT_TYPE, body.content_type()).body(text);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        if let Some((recorder, n)) = number {
            if let Err(e) = recorder.record_response(n, status, &text) {
                tracing::warn!("Failed to record response {:03}: {}", n, e);
            }
        }

        Ok(HttpResponse {
            status,
            url: url.to_string(),
            body: text,
        })
    }
}

/// 5xx and 409 Conflict are transient; other statuses are not.
pub fn is_retryable_status(status: u16) -> bool {
    status == 409 || (500..600).contains(&status)
}

fn is_retryable_transport(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_body()
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockResponse, MockServer};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn fast_config(max_attempts: u32) -> HttpConfig {
        HttpConfig {
            retry_max_attempts: max_attempts,
            retry_multiplier: 0.0,
            ..HttpConfig::default()
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(409));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[tokio::test]
    async fn get_returns_body() {
        let server = MockServer::start(|_| MockResponse::json(200, json!({"hello": "world"}))).await;
        let client = HttpClient::new(fast_config(5)).unwrap();

        let resp = client.get(&server.url("/"), &HeaderMap::new()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.json_value().unwrap(), json!({"hello": "world"}));
        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn conflict_is_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let server = MockServer::start(move |_| {
            if c.fetch_add(1, Ordering::SeqCst) < 2 {
                MockResponse::status(409)
            } else {
                MockResponse::json(200, json!({"ok": true}))
            }
        })
        .await;
        let client = HttpClient::new(fast_config(5)).unwrap();

        let resp = client
            .put(&server.url("/thing"), &HeaderMap::new(), None)
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(server.request_count(), 3);
    }

    #[tokio::test]
    async fn server_error_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let server = MockServer::start(move |_| {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                MockResponse::status(503)
            } else {
                MockResponse::json(201, json!({}))
            }
        })
        .await;
        let client = HttpClient::new(fast_config(5)).unwrap();

        let resp = client
            .post(&server.url("/"), &HeaderMap::new(), Some(RequestBody::Json(json!({}))))
            .await
            .unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(server.request_count(), 2);
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let server = MockServer::start(|_| MockResponse::json(400, json!({"error": "bad"}))).await;
        let client = HttpClient::new(fast_config(5)).unwrap();

        let err = client.get(&server.url("/x"), &HeaderMap::new()).await.unwrap_err();
        match err {
            DcpError::Http { status, url, .. } => {
                assert_eq!(status, 400);
                assert!(url.ends_with("/x"));
            }
            other => panic!("Expected Http error, got: {:?}", other),
        }
        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn persistent_conflict_fails_final_status_check() {
        let server = MockServer::start(|_| MockResponse::status(409)).await;
        let client = HttpClient::new(fast_config(3)).unwrap();

        let err = client.get(&server.url("/"), &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(server.request_count(), 3);
    }

    #[tokio::test]
    async fn retry_while_polls_until_predicate_clears() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let server = MockServer::start(move |_| {
            let n = c.fetch_add(1, Ordering::SeqCst);
            let state = if n < 2 { "Validating" } else { "Valid" };
            MockResponse::json(200, json!({"submissionState": state}))
        })
        .await;
        let client = HttpClient::new(fast_config(10)).unwrap();

        let resp = client
            .retry_while(&server.url("/env"), &HeaderMap::new(), |r| {
                r.json_value()
                    .map(|v| v["submissionState"] != "Valid")
                    .unwrap_or(true)
            })
            .await
            .unwrap();
        assert_eq!(resp.json_value().unwrap()["submissionState"], "Valid");
        assert_eq!(server.request_count(), 3);
    }

    #[tokio::test]
    async fn predicate_exhaustion_is_retry_exhausted() {
        let server = MockServer::start(|_| MockResponse::json(200, json!({"submissionState": "Draft"}))).await;
        let client = HttpClient::new(fast_config(3)).unwrap();

        let err = client
            .retry_while(&server.url("/env"), &HeaderMap::new(), |_| true)
            .await
            .unwrap_err();
        match err {
            DcpError::RetryExhausted {
                attempts,
                timeout_secs,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(timeout_secs, 7200);
            }
            other => panic!("Expected RetryExhausted, got: {:?}", other),
        }
        assert_eq!(server.request_count(), 3);
    }

    #[tokio::test]
    async fn zero_time_budget_allows_one_attempt() {
        let server = MockServer::start(|_| MockResponse::status(500)).await;
        let config = HttpConfig {
            retry_timeout_seconds: 0,
            ..fast_config(100)
        };
        let client = HttpClient::new(config).unwrap();

        let err = client.get(&server.url("/"), &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let client = HttpClient::new(fast_config(2)).unwrap();
        let err = client
            .get("http://127.0.0.1:1/", &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DcpError::Transport(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn before_hook_sees_each_attempt() {
        let server = MockServer::start(|_| MockResponse::json(200, json!({"n": 0}))).await;
        let client = HttpClient::new(fast_config(4)).unwrap();
        let seen = Mutex::new(Vec::new());
        let before = |attempt: u32| seen.lock().unwrap().push(attempt);
        let predicate = |_: &HttpResponse| true;

        let options = GetOptions {
            retry_while: Some(&predicate),
            before: Some(&before),
            ..GetOptions::default()
        };
        let _ = client.get_with(&server.url("/"), &HeaderMap::new(), options).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn poll_while_builds_headers_for_every_attempt() {
        let server = MockServer::start(|req| {
            let done = req.header("authorization") == Some("Bearer tok-2");
            MockResponse::json(200, json!({ "done": done }))
        })
        .await;
        let client = HttpClient::new(fast_config(5)).unwrap();
        let minted = AtomicU32::new(0);
        let headers = || {
            let n = minted.fetch_add(1, Ordering::SeqCst);
            let mut map = HeaderMap::new();
            map.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer tok-{}", n).parse().unwrap(),
            );
            Ok(map)
        };

        let resp = client
            .poll_while(&server.url("/env"), &headers, |r| {
                r.json_value().map(|v| v["done"] != true).unwrap_or(true)
            })
            .await
            .unwrap();
        assert_eq!(resp.json_value().unwrap()["done"], true);

        let seen: Vec<String> = server
            .requests()
            .iter()
            .filter_map(|r| r.header("authorization").map(str::to_string))
            .collect();
        assert_eq!(seen, vec!["Bearer tok-0", "Bearer tok-1", "Bearer tok-2"]);
    }

    #[tokio::test]
    async fn header_source_failure_stops_before_sending() {
        let server = MockServer::start(|_| MockResponse::json(200, json!({}))).await;
        let client = HttpClient::new(fast_config(3)).unwrap();
        let headers =
            || -> Result<HeaderMap, DcpError> { Err(DcpError::Auth("key revoked".to_string())) };

        let err = client
            .poll_while(&server.url("/env"), &headers, |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, DcpError::Auth(_)), "got {:?}", err);
        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn uri_list_body_sets_content_type() {
        let server = MockServer::start(|_| MockResponse::json(200, json!({}))).await;
        let client = HttpClient::new(fast_config(1)).unwrap();

        client
            .put(
                &server.url("/processes/1/protocols"),
                &HeaderMap::new(),
                Some(RequestBody::UriList("http://ingest/protocols/9".to_string())),
            )
            .await
            .unwrap();

        let req = &server.requests()[0];
        assert_eq!(req.method, "PUT");
        assert_eq!(req.header("content-type"), Some("text/uri-list"));
        assert_eq!(req.body, "http://ingest/protocols/9");
    }

    #[tokio::test]
    async fn recording_numbers_every_attempt() {
        let dir = std::env::temp_dir().join(format!("dcp_client_rec_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("request_010.txt"), "old").unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let server = MockServer::start(move |_| {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                MockResponse::status(500)
            } else {
                MockResponse::json(200, json!({"done": true}))
            }
        })
        .await;

        let config = HttpConfig {
            record: true,
            record_directory: dir.to_string_lossy().to_string(),
            ..fast_config(5)
        };
        let client = HttpClient::new(config).unwrap();
        client
            .post(&server.url("/e"), &HeaderMap::new(), Some(RequestBody::Json(json!({"a": 1}))))
            .await
            .unwrap();

        let first = std::fs::read_to_string(dir.join("request_011.txt")).unwrap();
        assert!(first.starts_with("POST\n"));
        assert!(first.ends_with(r#"{"a":1}"#));
        assert!(std::fs::read_to_string(dir.join("response_011.txt"))
            .unwrap()
            .starts_with("500\n"));
        assert!(std::fs::read_to_string(dir.join("response_012.txt"))
            .unwrap()
            .starts_with("200\n"));
        assert!(dir.join("request_000.txt").exists());

        std::fs::remove_dir_all(dir).ok();
    }
}
