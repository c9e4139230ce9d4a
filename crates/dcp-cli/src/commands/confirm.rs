// crates/dcp-cli/src/commands/confirm.rs
//
// `dcp confirm`: resume an envelope left by `dcp submit --no_confirm`.

use clap::Args;

use dcp_core::DcpError;

use super::Context;

#[derive(Debug, Args)]
pub struct ConfirmCmd {
    #[arg(long = "envelope_url")]
    pub envelope_url: String,

    #[arg(long = "runtime_environment")]
    pub runtime_environment: String,

    #[arg(long = "service_account_key_path")]
    pub service_account_key_path: String,
}

/// Run the confirm command.
pub async fn run(ctx: &Context, cmd: &ConfirmCmd) -> Result<(), DcpError> {
    let orchestrator =
        ctx.orchestrator(&cmd.service_account_key_path, &cmd.runtime_environment)?;
    let outcome = orchestrator.confirm_existing(&cmd.envelope_url).await?;
    if outcome.confirmed {
        tracing::info!("Confirmed envelope {}", outcome.envelope_url);
    }
    Ok(())
}
