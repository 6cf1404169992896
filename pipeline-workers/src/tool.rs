use std::ffi::OsStr;

use anyhow::{bail, Context, Result};
use tokio::process::Command;

/// Run an external collaborator to completion and return its stdout, or an
/// error carrying its stderr on non-zero exit.
pub async fn run<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("failed to launch {program}; is it installed and on PATH?"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{program} exited with {}: {}", output.status, stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
