use crate::prelude::*;
use crate::{ErrorKind, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

/// How much of the tail of a tool's stderr is kept for error reports.
/// The media tool in particular is extremely chatty, and only the last
/// lines carry the reason for a failure.
const STDERR_TAIL_LEN: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProcessError {
    #[error("Failed to spawn `{program}`")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to wait for `{program}`")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}. Stderr tail:\n{stderr_tail}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr_tail: String,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("`{program}` produced output that is not valid JSON")]
    Json {
        program: String,
        source: serde_json::Error,
    },

    #[error("`{program}` produced output that is not valid UTF-8")]
    Utf8 {
        program: String,
        source: std::str::Utf8Error,
    },
}

/// Result of a tool invocation that is allowed to fail without failing
/// the caller. A non-zero exit is reported here, not as an [`Error`],
/// because a failed post-processing stage degrades to a no-op.
pub(crate) struct ToolRun {
    pub(crate) success: bool,
    pub(crate) stderr_tail: String,
}

pub(crate) async fn run(program: &str, args: &[&str]) -> Result<Vec<u8>> {
    let display_cmd = display_cmd(program, args)?;
    debug!(cmd = %display_cmd, "Running program");

    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(err_ctx!(ProcessError::Spawn {
            program: program.to_owned()
        }))?;

    if !output.status.success() {
        return Err(ProcessError::Failed {
            program: program.to_owned(),
            status: output.status,
            stderr_tail: tail_of(&output.stderr),
        }
        .into());
    }

    Ok(output.stdout)
}

pub(crate) async fn run_json<T: serde::de::DeserializeOwned>(
    program: &str,
    args: &[&str],
) -> Result<T> {
    let bytes = run(program, args).await?;

    let output = std::str::from_utf8(&bytes).map_err(err_ctx!(ProcessError::Utf8 {
        program: program.to_owned()
    }))?;

    serde_json::from_str(output).map_err(err_ctx!(ProcessError::Json {
        program: program.to_owned()
    }))
}

/// Runs a long-lived tool invocation with prompt cancellation and an
/// optional timeout. Dropping the in-flight child kills it, so a tripped
/// cancellation token never leaves an orphan transcoding process behind.
pub(crate) async fn run_tool(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<ToolRun> {
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let display_cmd = display_cmd(program, &arg_refs)?;
    debug!(cmd = %display_cmd, "Running tool");

    let mut command = tokio::process::Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let mut child = command.spawn().map_err(err_ctx!(ProcessError::Spawn {
        program: program.to_owned()
    }))?;

    let mut stderr = child
        .stderr
        .take()
        .fatal_ctx(|| "BUG: stderr pipe is missing on a spawned child")?;

    let work = async move {
        let mut buf = Vec::new();
        // Drain stderr while waiting, otherwise the tool blocks on a full pipe.
        let (_, status) = tokio::join!(stderr.read_to_end(&mut buf), child.wait());
        (status, buf)
    };
    tokio::pin!(work);

    let timeout_fut = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };

    let (status, stderr_buf) = tokio::select! {
        output = &mut work => output,
        () = cancel.cancelled() => {
            info!(cmd = %display_cmd, "Killing tool invocation: task was cancelled");
            return Err(ErrorKind::Cancelled.into());
        }
        () = timeout_fut => {
            // `timeout` is `Some` if this branch was taken
            let timeout = timeout.unwrap_or_default();
            warn!(cmd = %display_cmd, ?timeout, "Killing tool invocation: timed out");
            return Err(ProcessError::Timeout { program: program.to_owned(), timeout }.into());
        }
    };

    let status = status.map_err(err_ctx!(ProcessError::Wait {
        program: program.to_owned()
    }))?;

    Ok(ToolRun {
        success: status.success(),
        stderr_tail: tail_of(&stderr_buf),
    })
}

fn display_cmd(program: &str, args: &[&str]) -> Result<String> {
    let display_args = shlex::try_join(args.iter().copied()).fatal_ctx(|| {
        format!("Couldn't run program that contains a nul byte: {program:?} {args:?}")
    })?;

    Ok(format!("{program} {display_args}"))
}

fn tail_of(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let start = text
        .len()
        .saturating_sub(STDERR_TAIL_LEN)
        .min(text.len());

    // Don't split a multi-byte char in the middle
    let start = (start..text.len())
        .find(|index| text.is_char_boundary(*index))
        .unwrap_or(text.len());

    text[start..].to_owned()
}
