//! # Trigger Executor
//!
//! Runs the configured command line through a shell with the trigger-derived
//! environment injected, a bounded wait, and full output capture. The caller
//! supplies an `on_started` hook that fires once the process is spawned,
//! before the executor starts waiting on completion.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;

use crate::domain::types::{ExecutionResult, TriggerContext};

/// Grace period between SIGTERM and SIGKILL when a run times out.
#[cfg(unix)]
const KILL_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("script timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("failed to launch script: {0}")]
    Launch(#[from] std::io::Error),
}

pub struct TriggerExecutor {
    command_line: String,
    timeout: Duration,
}

impl TriggerExecutor {
    pub fn new(command_line: String, timeout: Duration) -> Self {
        Self {
            command_line,
            timeout,
        }
    }

    /// Run the configured command for one matched message.
    ///
    /// `on_started` is invoked exactly once, after the process has been
    /// spawned and before the bounded wait begins. A spawn failure returns
    /// `ExecError::Launch` without invoking the hook. On timeout the process
    /// group is terminated and `ExecError::Timeout` is returned; remaining
    /// output is discarded.
    pub async fn execute<F, Fut>(
        &self,
        ctx: &TriggerContext,
        on_started: F,
    ) -> Result<ExecutionResult, ExecError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", &self.command_line]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", &self.command_line]);
            c
        };

        // The child inherits the full process environment; the five trigger
        // keys are always set on top of it, empty string when the context
        // field is empty, never omitted.
        cmd.env("TRIGGER_TEXT", &ctx.text)
            .env("TRIGGER_CHAT_ID", &ctx.chat_id)
            .env("TRIGGER_SENDER_ID", &ctx.sender_id)
            .env("TRIGGER_MESSAGE_ID", &ctx.message_id)
            .env("TRIGGER_MATCHED_TEXT", &ctx.matched_text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        let child = cmd.spawn()?;
        #[cfg(unix)]
        let process_group_id = child.id().map(|pid| pid as i32);

        tracing::debug!(
            "Spawned script pid={:?} for message_id={}",
            child.id(),
            ctx.message_id
        );
        on_started().await;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                // The shell runs in its own process group, so escalate
                // TERM -> KILL against the whole group. The direct child is
                // also killed on drop of the wait future.
                #[cfg(unix)]
                if let Some(process_group_id) = process_group_id {
                    let pgid = Pid::from_raw(process_group_id);
                    let _ = killpg(pgid, Signal::SIGTERM);
                    tokio::time::sleep(KILL_GRACE).await;
                    let _ = killpg(pgid, Signal::SIGKILL);
                }
                return Err(ExecError::Timeout(self.timeout));
            }
        };

        Ok(ExecutionResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
