// crates/dcp-submit/src/client.rs
//
// SubmissionClient: one method per remote operation of the submission
// lifecycle. Ordering between operations is the caller's concern (see
// lifecycle.rs); every method here is a single logical step.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use dcp_core::{DcpError, OutputSink, TokenSource};
use dcp_http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use dcp_http::{HttpClient, HttpResponse, RequestBody};

use crate::links::LinkMap;

pub const SUBMISSION_URL_FILE: &str = "submission_url.txt";

/// A remote resource: its JSON body and its parsed links.
#[derive(Debug, Clone)]
pub struct Resource {
    pub body: Value,
    pub links: LinkMap,
}

impl Resource {
    pub fn from_body(body: Value) -> Self {
        let links = LinkMap::from_body(&body);
        Self { body, links }
    }

    fn from_response(resp: &HttpResponse) -> Result<Self, DcpError> {
        Ok(Self::from_body(resp.json_value()?))
    }

    pub fn self_url(&self) -> Result<&str, DcpError> {
        self.links.self_url()
    }
}

/// Which collection an upsert targets and how its entries are keyed.
struct UpsertKind {
    label: &'static str,
    embedded_key: &'static str,
    id_pointer: &'static str,
}

const PROTOCOL: UpsertKind = UpsertKind {
    label: "protocol",
    embedded_key: "protocols",
    id_pointer: "/protocol_core/protocol_id",
};

const PROCESS: UpsertKind = UpsertKind {
    label: "process",
    embedded_key: "processes",
    id_pointer: "/process_core/process_id",
};

pub struct SubmissionClient {
    http: Arc<HttpClient>,
    tokens: Arc<dyn TokenSource>,
}

impl SubmissionClient {
    pub fn new(http: Arc<HttpClient>, tokens: Arc<dyn TokenSource>) -> Self {
        Self { http, tokens }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Bearer token plus JSON accept header. Minted per call; tokens are
    /// short-lived and the lifecycle can outlast one. Envelope polling
    /// calls this once per attempt.
    pub fn auth_headers(&self) -> Result<HeaderMap, DcpError> {
        let token = self.tokens.token()?;
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| DcpError::Auth(format!("Token is not a valid header value: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// GET the service root and return its link map.
    pub async fn discover_root(&self, submit_url: &str) -> Result<LinkMap, DcpError> {
        let resp = self.http.get(submit_url, &HeaderMap::new()).await?;
        let links = LinkMap::from_body(&resp.json_value()?);
        tracing::debug!("Discovered {} root links at {}", links.len(), submit_url);
        Ok(links)
    }

    /// Create an empty envelope and persist its URL to `submission_url.txt`.
    pub async fn create_envelope(
        &self,
        envelope_creation_url: &str,
        sink: &dyn OutputSink,
    ) -> Result<Resource, DcpError> {
        let headers = self.auth_headers()?;
        let resp = self
            .http
            .post(envelope_creation_url, &headers, Some(RequestBody::Json(json!({}))))
            .await?;
        let envelope = Resource::from_response(&resp)?;

        let envelope_url = envelope
            .links
            .submission_envelope()
            .or_else(|_| envelope.links.self_url())?;
        sink.write_text(SUBMISSION_URL_FILE, envelope_url)?;
        tracing::info!("Created envelope {}", envelope_url);
        Ok(envelope)
    }

    /// Find the protocol with the same `protocol_core.protocol_id`, or create it.
    pub async fn upsert_protocol(
        &self,
        protocols_url: &str,
        protocol: &Value,
    ) -> Result<Resource, DcpError> {
        self.upsert(&PROTOCOL, protocols_url, protocol).await
    }

    /// Find the process with the same `process_core.process_id`, or create it.
    pub async fn upsert_process(
        &self,
        processes_url: &str,
        process: &Value,
    ) -> Result<Resource, DcpError> {
        self.upsert(&PROCESS, processes_url, process).await
    }

    async fn upsert(
        &self,
        kind: &UpsertKind,
        collection_url: &str,
        document: &Value,
    ) -> Result<Resource, DcpError> {
        let id = document
            .pointer(kind.id_pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DcpError::Validation(format!("{} document has no {}", kind.label, kind.id_pointer))
            })?;
        let headers = self.auth_headers()?;
        let content_pointer = format!("/content{}", kind.id_pointer);

        let mut page_url = collection_url.to_string();
        let mut visited = HashSet::new();
        while visited.insert(page_url.clone()) {
            let resp = self.http.get(&page_url, &headers).await?;
            let page = resp.json_value()?;

            let entries = page
                .pointer(&format!("/_embedded/{}", kind.embedded_key))
                .and_then(Value::as_array);
            if let Some(found) = entries.and_then(|entries| {
                entries.iter().find(|entry| {
                    entry.pointer(&content_pointer).and_then(Value::as_str) == Some(id)
                })
            }) {
                tracing::info!("Found existing {} {}", kind.label, id);
                return Ok(Resource::from_body(found.clone()));
            }

            match LinkMap::from_body(&page).next() {
                Some(next) => page_url = next.to_string(),
                None => break,
            }
        }

        let resp = self
            .http
            .post(collection_url, &headers, Some(RequestBody::Json(document.clone())))
            .await?;
        tracing::info!("Created {} {}", kind.label, id);
        Resource::from_response(&resp)
    }

    /// Point the process's protocols relation at the protocol.
    pub async fn link_protocol_to_process(
        &self,
        link_url: &str,
        protocol_self_url: &str,
    ) -> Result<(), DcpError> {
        let headers = self.auth_headers()?;
        self.http
            .put(
                link_url,
                &headers,
                Some(RequestBody::UriList(protocol_self_url.to_string())),
            )
            .await?;
        tracing::debug!("Linked {} -> {}", link_url, protocol_self_url);
        Ok(())
    }

    pub async fn attach_input_bundles(
        &self,
        bundles_url: &str,
        input_bundle_uuid: &str,
    ) -> Result<(), DcpError> {
        let headers = self.auth_headers()?;
        let body = json!({ "bundleUuids": [input_bundle_uuid] });
        self.http
            .put(bundles_url, &headers, Some(RequestBody::Json(body)))
            .await?;
        tracing::info!("Attached input bundle {}", input_bundle_uuid);
        Ok(())
    }

    /// PUT one `{"fileName", "content"}` reference per output document, at
    /// most `concurrency` at a time. Every document is checked before the
    /// first PUT. Every call is allowed to finish before the first failure,
    /// if any, is returned.
    pub async fn attach_file_references(
        &self,
        refs_url: &str,
        documents: &[Value],
        concurrency: usize,
    ) -> Result<usize, DcpError> {
        let bodies = documents
            .iter()
            .map(file_reference_body)
            .collect::<Result<Vec<_>, _>>()?;

        let headers = self.auth_headers()?;
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for body in bodies {
            let http = self.http.clone();
            let headers = headers.clone();
            let url = refs_url.to_string();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| DcpError::Transport(format!("Worker pool closed: {}", e)))?;
                http.put(&url, &headers, Some(RequestBody::Json(body))).await?;
                Ok::<(), DcpError>(())
            });
        }

        let mut attached = 0;
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| DcpError::Transport(format!("File reference task failed: {}", e)))
                .and_then(|r| r);
            match result {
                Ok(()) => attached += 1,
                Err(e) => {
                    tracing::error!("File reference failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!("Attached {} file reference(s)", attached);
                Ok(attached)
            }
        }
    }

    /// Ask the service to submit a valid envelope.
    pub async fn confirm(&self, envelope_url: &str) -> Result<(), DcpError> {
        let headers = self.auth_headers()?;
        let url = format!("{}/submissionEvent", envelope_url.trim_end_matches('/'));
        self.http.put(&url, &headers, None).await?;
        tracing::info!("Confirmed envelope {}", envelope_url);
        Ok(())
    }
}

fn file_reference_body(document: &Value) -> Result<Value, DcpError> {
    let file_name = document
        .pointer("/file_core/file_name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            DcpError::Validation("Output document has no file_core.file_name".to_string())
        })?;
    Ok(json!({ "fileName": file_name, "content": document }))
}
