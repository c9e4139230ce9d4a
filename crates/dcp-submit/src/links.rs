// crates/dcp-submit/src/links.rs
//
// Typed view of a HATEOAS `_links` object.
//
// Link hrefs may be URL templates (`.../protocols{?page,size,sort}`); the
// template suffix is cut at the first `{` so every stored URL is directly
// usable.

use std::collections::BTreeMap;

use serde_json::Value;

use dcp_core::DcpError;

pub const SELF: &str = "self";
pub const SUBMISSION_ENVELOPES: &str = "submissionEnvelopes";
pub const SUBMISSION_ENVELOPE: &str = "submissionEnvelope";
pub const PROTOCOLS: &str = "protocols";
pub const PROCESSES: &str = "processes";
pub const ADD_INPUT_BUNDLES: &str = "add-input-bundles";
pub const ADD_FILE_REFERENCE: &str = "add-file-reference";
pub const NEXT: &str = "next";

/// Link name -> URL with any template stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap {
    links: BTreeMap<String, String>,
}

impl LinkMap {
    /// Extract the `_links` object of a response body. A body without
    /// `_links` yields an empty map.
    pub fn from_body(body: &Value) -> Self {
        let mut links = BTreeMap::new();
        if let Some(map) = body.get("_links").and_then(Value::as_object) {
            for (name, link) in map {
                // A relation may hold one link or an array of them; take the first.
                let href = match link {
                    Value::Array(items) => items.first().and_then(|l| l.get("href")),
                    other => other.get("href"),
                };
                if let Some(href) = href.and_then(Value::as_str) {
                    links.insert(name.clone(), strip_template(href).to_string());
                }
            }
        }
        Self { links }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.links.get(name).map(String::as_str)
    }

    /// The named link, or `MissingLink`.
    pub fn require(&self, name: &str) -> Result<&str, DcpError> {
        self.get(name).ok_or_else(|| {
            DcpError::MissingLink(format!(
                "{} (available: {})",
                name,
                self.links.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn self_url(&self) -> Result<&str, DcpError> {
        self.require(SELF)
    }

    pub fn submission_envelopes(&self) -> Result<&str, DcpError> {
        self.require(SUBMISSION_ENVELOPES)
    }

    pub fn submission_envelope(&self) -> Result<&str, DcpError> {
        self.require(SUBMISSION_ENVELOPE)
    }

    pub fn protocols(&self) -> Result<&str, DcpError> {
        self.require(PROTOCOLS)
    }

    pub fn processes(&self) -> Result<&str, DcpError> {
        self.require(PROCESSES)
    }

    pub fn add_input_bundles(&self) -> Result<&str, DcpError> {
        self.require(ADD_INPUT_BUNDLES)
    }

    pub fn add_file_reference(&self) -> Result<&str, DcpError> {
        self.require(ADD_FILE_REFERENCE)
    }

    /// Next page of a paged collection, if any.
    pub fn next(&self) -> Option<&str> {
        self.get(NEXT)
    }
}

/// Cut a URL template at its first `{`.
pub fn strip_template(href: &str) -> &str {
    match href.find('{') {
        Some(idx) => &href[..idx],
        None => href,
    }
}
