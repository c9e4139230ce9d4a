// crates/dcp-submit/src/lib.rs
//
// dcp-submit: drives a submission envelope through the ingest service.
//
// The orchestrator discovers the service root, creates an envelope, upserts
// the protocol and process, links them, attaches input bundles and file
// references, then polls until validation ends and confirms. Every remote
// call goes through the shared dcp-http client.

pub mod client;
pub mod gcs;
pub mod lifecycle;
pub mod links;
pub mod polling;

pub use client::{Resource, SubmissionClient, SUBMISSION_URL_FILE};
pub use gcs::GcsObjectStore;
pub use lifecycle::{Orchestrator, Stage, StageMachine, SubmissionOutcome, SubmissionRequest};
pub use links::LinkMap;
pub use polling::{no_headers, wait_for_upload_urn, wait_for_valid_status, EnvelopeState};
