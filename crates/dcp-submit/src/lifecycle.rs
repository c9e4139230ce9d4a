// crates/dcp-submit/src/lifecycle.rs
//
// Submission lifecycle state machine and the orchestrator that walks it.
//
// Valid transitions:
//   Start -> DiscoverRoot -> CreateEnvelope -> UpsertProtocol -> UpsertProcess
//     -> LinkProtocolToProcess -> AttachInputBundles -> AttachFileRefs
//     -> PollUntilTerminal -> Confirm -> Done
//   Start -> PollUntilTerminal              (resuming an existing envelope)
//   AttachFileRefs -> Done                  (submit without confirmation)
//   PollUntilTerminal -> Done               (envelope already Complete)
//   Any state -> Failed

use std::fmt;

use serde_json::Value;

use dcp_core::{DcpError, OutputSink};

use crate::client::SubmissionClient;
use crate::polling::{wait_for_valid_status, EnvelopeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    DiscoverRoot,
    CreateEnvelope,
    UpsertProtocol,
    UpsertProcess,
    LinkProtocolToProcess,
    AttachInputBundles,
    AttachFileRefs,
    PollUntilTerminal,
    Confirm,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "START",
            Stage::DiscoverRoot => "DISCOVER_ROOT",
            Stage::CreateEnvelope => "CREATE_ENVELOPE",
            Stage::UpsertProtocol => "UPSERT_PROTOCOL",
            Stage::UpsertProcess => "UPSERT_PROCESS",
            Stage::LinkProtocolToProcess => "LINK_PROTOCOL_TO_PROCESS",
            Stage::AttachInputBundles => "ATTACH_INPUT_BUNDLES",
            Stage::AttachFileRefs => "ATTACH_FILE_REFS",
            Stage::PollUntilTerminal => "POLL_UNTIL_TERMINAL",
            Stage::Confirm => "CONFIRM",
            Stage::Done => "DONE",
            Stage::Failed => "FAIL",
        };
        f.write_str(name)
    }
}

/// Tracks the current stage and rejects out-of-order steps.
#[derive(Debug)]
pub struct StageMachine {
    current: Stage,
}

impl StageMachine {
    pub fn new() -> Self {
        Self {
            current: Stage::Start,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn transition(&mut self, next: Stage) -> Result<(), DcpError> {
        use Stage::*;

        let valid = next == Failed
            || matches!(
                (self.current, next),
                (Start, DiscoverRoot)
                    | (DiscoverRoot, CreateEnvelope)
                    | (CreateEnvelope, UpsertProtocol)
                    | (UpsertProtocol, UpsertProcess)
                    | (UpsertProcess, LinkProtocolToProcess)
                    | (LinkProtocolToProcess, AttachInputBundles)
                    | (AttachInputBundles, AttachFileRefs)
                    | (AttachFileRefs, PollUntilTerminal)
                    | (AttachFileRefs, Done)
                    | (Start, PollUntilTerminal)
                    | (PollUntilTerminal, Confirm)
                    | (PollUntilTerminal, Done)
                    | (Confirm, Done)
            );

        if !valid {
            return Err(DcpError::Validation(format!(
                "Invalid state transition: {} -> {}",
                self.current, next
            )));
        }
        tracing::info!("State transition: {} -> {}", self.current, next);
        self.current = next;
        Ok(())
    }
}

impl Default for StageMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Documents and options for one submission.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub submit_url: String,
    pub protocol: Value,
    pub process: Value,
    /// Analysis file documents, one file reference each.
    pub outputs: Vec<Value>,
    pub input_bundle_uuid: Option<String>,
    /// Poll and confirm after attaching files; otherwise stop there.
    pub confirm: bool,
    pub file_ref_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub envelope_url: String,
    /// Last observed envelope state, if the lifecycle polled.
    pub state: Option<EnvelopeState>,
    pub confirmed: bool,
}

/// Drives submissions through the lifecycle, one step at a time.
pub struct Orchestrator {
    client: SubmissionClient,
}

impl Orchestrator {
    pub fn new(client: SubmissionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SubmissionClient {
        &self.client
    }

    /// Run the full lifecycle for `request`.
    pub async fn submit(
        &self,
        request: &SubmissionRequest,
        sink: &dyn OutputSink,
    ) -> Result<SubmissionOutcome, DcpError> {
        let mut machine = StageMachine::new();
        let result = self.run_submit(&mut machine, request, sink).await;
        if result.is_err() {
            machine.transition(Stage::Failed)?;
        }
        result
    }

    /// Poll an existing envelope to a terminal state and confirm it.
    pub async fn confirm_existing(&self, envelope_url: &str) -> Result<SubmissionOutcome, DcpError> {
        let mut machine = StageMachine::new();
        let result = self.finish(&mut machine, envelope_url).await;
        if result.is_err() {
            machine.transition(Stage::Failed)?;
        }
        result
    }

    async fn run_submit(
        &self,
        machine: &mut StageMachine,
        request: &SubmissionRequest,
        sink: &dyn OutputSink,
    ) -> Result<SubmissionOutcome, DcpError> {
        let client = &self.client;

        machine.transition(Stage::DiscoverRoot)?;
        let root = client.discover_root(&request.submit_url).await?;

        machine.transition(Stage::CreateEnvelope)?;
        let envelope = client
            .create_envelope(root.submission_envelopes()?, sink)
            .await?;
        let envelope_url = envelope
            .links
            .submission_envelope()
            .or_else(|_| envelope.links.self_url())?
            .to_string();

        machine.transition(Stage::UpsertProtocol)?;
        let protocol = client
            .upsert_protocol(envelope.links.protocols()?, &request.protocol)
            .await?;

        machine.transition(Stage::UpsertProcess)?;
        let process = client
            .upsert_process(envelope.links.processes()?, &request.process)
            .await?;

        machine.transition(Stage::LinkProtocolToProcess)?;
        client
            .link_protocol_to_process(process.links.protocols()?, protocol.self_url()?)
            .await?;

        machine.transition(Stage::AttachInputBundles)?;
        match &request.input_bundle_uuid {
            Some(uuid) => {
                client
                    .attach_input_bundles(process.links.add_input_bundles()?, uuid)
                    .await?
            }
            None => tracing::debug!("No input bundle to attach"),
        }

        machine.transition(Stage::AttachFileRefs)?;
        client
            .attach_file_references(
                process.links.add_file_reference()?,
                &request.outputs,
                request.file_ref_concurrency,
            )
            .await?;

        if !request.confirm {
            machine.transition(Stage::Done)?;
            return Ok(SubmissionOutcome {
                envelope_url,
                state: None,
                confirmed: false,
            });
        }
        self.finish(machine, &envelope_url).await
    }

    async fn finish(
        &self,
        machine: &mut StageMachine,
        envelope_url: &str,
    ) -> Result<SubmissionOutcome, DcpError> {
        machine.transition(Stage::PollUntilTerminal)?;
        let client = &self.client;
        let headers = || client.auth_headers();
        let envelope = wait_for_valid_status(client.http(), envelope_url, &headers).await?;

        let state = EnvelopeState::of(&envelope);
        let confirmed = match state {
            EnvelopeState::Invalid => {
                return Err(DcpError::Submission {
                    envelope_url: envelope_url.to_string(),
                    state: state.to_string(),
                })
            }
            EnvelopeState::Complete => {
                tracing::info!("Envelope {} is already complete", envelope_url);
                false
            }
            _ => {
                machine.transition(Stage::Confirm)?;
                self.client.confirm(envelope_url).await?;
                true
            }
        };

        machine.transition(Stage::Done)?;
        Ok(SubmissionOutcome {
            envelope_url: envelope_url.to_string(),
            state: Some(state),
            confirmed,
        })
    }
}
