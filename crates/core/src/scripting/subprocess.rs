//! Shared subprocess management.
//!
//! [`run_command`] spawns a prepared [`tokio::process::Command`], captures
//! stdout/stderr and enforces the configured timeout.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::executor::{ScriptError, ScriptInput, ScriptOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Spawn `cmd`, capture its output and wait for it within `input.timeout`.
///
/// The caller sets the program and arguments; environment variables and the
/// working directory from [`ScriptInput`] are applied here.
pub async fn run_command(
    cmd: &mut Command,
    input: ScriptInput,
) -> Result<ScriptOutput, ScriptError> {
    // `kill_on_drop(true)` kills the child when it is dropped on timeout.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &input.env_vars {
        cmd.env(key, value);
    }

    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScriptError::NotFound(program.clone()),
        ErrorKind::PermissionDenied => ScriptError::PermissionDenied(program.clone()),
        _ => ScriptError::IoError(e),
    })?;

    // Read the streams in spawned tasks so `child.wait()` can borrow the child.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    match tokio::time::timeout(input.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();

            Ok(ScriptOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code: status.code().unwrap_or(-1),
                duration_ms,
            })
        }
        Ok(Err(e)) => Err(ScriptError::IoError(e)),
        Err(_elapsed) => {
            // `child` is dropped here, which kills the process.
            Err(ScriptError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::scripting::test_helpers::default_input;

    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_command(&mut cmd, default_input()).await.unwrap();
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert_eq!(output.exit_code, 3);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn applies_env_and_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = default_input();
        input.env_vars = vec![("SCENE_NAME".into(), "Intro".into())];
        input.working_directory = Some(dir.path().to_path_buf());

        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo $SCENE_NAME; pwd"]);
        let output = run_command(&mut cmd, input).await.unwrap();

        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("Intro"));
        let cwd = std::path::PathBuf::from(lines.next().unwrap());
        assert_eq!(
            cwd.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let mut cmd = Command::new("definitely-not-a-renderer-binary");
        let err = run_command(&mut cmd, default_input()).await.unwrap_err();
        assert_matches!(err, ScriptError::NotFound(name) if name == "definitely-not-a-renderer-binary");
    }

    #[tokio::test]
    async fn slow_process_times_out() {
        let mut input = default_input();
        input.timeout = Duration::from_millis(200);
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run_command(&mut cmd, input).await.unwrap_err();
        assert_matches!(err, ScriptError::Timeout { elapsed_ms } if elapsed_ms < 5000);
    }
}
