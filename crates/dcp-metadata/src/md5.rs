// crates/dcp-metadata/src/md5.rs
//
// Optional md5 enrichment of process inputs that point at cloud objects.

use dcp_core::{DcpError, InputParameter, ObjectStore};

const CLOUD_SCHEME: &str = "gs://";

/// Stat every `gs://` input through `store` and record its md5 as `checksum`.
/// Other inputs are left untouched.
pub async fn add_md5s(
    inputs: &mut [InputParameter],
    store: &dyn ObjectStore,
) -> Result<(), DcpError> {
    for input in inputs.iter_mut() {
        if !input.parameter_value.starts_with(CLOUD_SCHEME) {
            continue;
        }
        let stat = store.stat(&input.parameter_value).await?;
        let md5 = stat.md5.ok_or_else(|| {
            DcpError::Validation(format!("No md5 reported for {}", input.parameter_value))
        })?;
        tracing::debug!("md5 {} for {}", md5, input.parameter_value);
        input.checksum = Some(md5);
    }
    Ok(())
}
