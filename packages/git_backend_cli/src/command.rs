//! Bounded subprocess execution.

use std::path::Path;
use std::process::Stdio;

use changes_git_backend_models::GitBackendError;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

const READ_CHUNK: usize = 64 * 1024;

/// Run `program` with `args` and return its standard output.
///
/// Standard output is read incrementally; once more than `max_output` bytes
/// have been produced the child is killed and the call fails.
///
/// # Errors
///
/// * `GitBackendError::Spawn` - the process could not be started
/// * `GitBackendError::OutputLimitExceeded` - output exceeded `max_output`
/// * `GitBackendError::CommandFailed` - the process exited unsuccessfully
/// * `GitBackendError::InvalidOutput` - the output is not valid UTF-8
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    max_output: usize,
) -> Result<String, GitBackendError> {
    let command_line = format!("{program} {}", args.join(" "));
    log::debug!("Running {command_line}");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    let mut child = cmd.spawn().map_err(|e| GitBackendError::Spawn {
        command: command_line.clone(),
        message: e.to_string(),
    })?;

    let mut stdout = child.stdout.take().ok_or_else(|| GitBackendError::Io {
        message: "Failed to capture stdout".to_string(),
    })?;
    let mut stderr = child.stderr.take().ok_or_else(|| GitBackendError::Io {
        message: "Failed to capture stderr".to_string(),
    })?;

    let stderr_handle = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stderr.read_to_end(&mut buf).await {
            log::warn!("Failed to read stderr: {e}");
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    let mut output = Vec::new();
    let mut chunk = vec![0_u8; READ_CHUNK];
    loop {
        let read = stdout.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        if output.len() + read > max_output {
            log::error!("{command_line}: output exceeded {max_output} bytes");
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill {program}: {e}");
            }
            stderr_handle.abort();
            return Err(GitBackendError::OutputLimitExceeded {
                command: command_line,
                limit: max_output,
            });
        }
        output.extend_from_slice(&chunk[..read]);
    }

    let status = child.wait().await?;
    let stderr = stderr_handle.await.unwrap_or_default();

    if !status.success() {
        return Err(GitBackendError::CommandFailed {
            command: command_line,
            status: status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    String::from_utf8(output).map_err(|_| GitBackendError::InvalidOutput {
        command: command_line,
    })
}
