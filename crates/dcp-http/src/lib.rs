// crates/dcp-http/src/lib.rs
//
// dcp-http: the HTTP client shared by every remote call the tools make.
//
// Centralizes retries, timeouts, failure classification, and optional
// on-disk recording of request/response pairs. Polling is expressed as a
// GET with a `retry_while` predicate rather than a hand-written loop.

pub mod client;
pub mod config;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod recorder;

pub use client::{
    is_retryable_status, BeforeHook, GetOptions, HeaderSource, HttpClient, HttpResponse,
    RequestBody, RetryPredicate,
};
pub use config::HttpConfig;
pub use recorder::Recorder;

// Callers build header maps without depending on reqwest directly.
pub use reqwest::header;
