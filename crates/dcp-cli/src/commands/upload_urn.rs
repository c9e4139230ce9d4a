// crates/dcp-cli/src/commands/upload_urn.rs
//
// `dcp get-upload-urn`: wait for an envelope's staging area and print it.

use clap::Args;

use dcp_core::{DcpError, OutputSink};
use dcp_submit::{no_headers, wait_for_upload_urn};

use super::Context;

pub const UPLOAD_URN_FILE: &str = "upload_urn.txt";

#[derive(Debug, Args)]
pub struct UploadUrnCmd {
    #[arg(long = "envelope_url")]
    pub envelope_url: String,
}

/// Run the get-upload-urn command.
pub async fn run(ctx: &Context, cmd: &UploadUrnCmd) -> Result<(), DcpError> {
    let urn = wait_for_upload_urn(&ctx.http, &cmd.envelope_url, &no_headers).await?;
    ctx.sink().write_text(UPLOAD_URN_FILE, &urn)?;
    tracing::info!("Upload area for {} is {}", cmd.envelope_url, urn);
    println!("{}", urn);
    Ok(())
}
