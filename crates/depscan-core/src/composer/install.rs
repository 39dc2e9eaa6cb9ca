//! One-shot lockfile materialization via `composer install`.

use crate::error::Error;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Executable invoked to generate the lockfile.
pub const COMPOSER_PROGRAM: &str = "composer";

/// Flags that keep the install side-effect free apart from the lockfile and
/// `vendor/`.
pub const INSTALL_ARGS: &[&str] = &[
    "install",
    "--no-scripts",
    "--no-plugins",
    "--no-autoloader",
    "--ignore-platform-reqs",
    "--no-interaction",
];

/// Longest stderr excerpt kept in an error message.
const STDERR_EXCERPT: usize = 512;

/// Run `program install ...` in `dir`, bounded by `timeout`.
///
/// The child is killed when the timeout fires or `cancel` is triggered.
///
/// # Errors
/// Returns `Materialize` if the program cannot be started, exits with a
/// failure status, or times out, and `Cancelled` if `cancel` fires first.
pub async fn materialize_lockfile(
    program: &str,
    dir: &Path,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let materialize_error = |message: String| Error::Materialize {
        dir: dir.to_path_buf(),
        message,
    };

    let child = Command::new(program)
        .args(INSTALL_ARGS)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| materialize_error(format!("Failed to start {program}: {e}")))?;

    let output = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
            Ok(output) => output.map_err(|e| materialize_error(format!("{program} failed: {e}")))?,
            Err(_) => {
                return Err(materialize_error(format!(
                    "{program} timed out after {}s",
                    timeout.as_secs()
                )))
            }
        },
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
        return Err(materialize_error(format!(
            "{program} exited with {}: {excerpt}",
            output.status
        )));
    }

    Ok(())
}
