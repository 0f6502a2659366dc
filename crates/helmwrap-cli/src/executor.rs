//! Child process execution
//!
//! Streams are inherited rather than piped, so Helm writes straight to the
//! terminal and its exit status comes back untouched.

use std::fmt;
use std::process::{Command, ExitStatus, Stdio};

use helmwrap_core::CommandInvocation;
use thiserror::Error;

use crate::exit_codes;

/// Which standard streams the child shares with this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Streams {
    /// stdin, stdout and stderr
    All,
    /// stdout and stderr; stdin is closed
    Output,
    /// stderr only
    ErrorsOnly,
}

/// How a child process finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ExitOutcome {
    pub fn is_success(self) -> bool {
        self == ExitOutcome::Exited(0)
    }

    /// Code this process should exit with to mirror the child
    pub fn exit_code(self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(signal) => exit_codes::SIGNAL_BASE + signal,
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }
        ExitOutcome::Exited(1)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit status {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}

/// The child could not be started at all
#[derive(Debug, Error)]
#[error("failed to start {program}: {source}")]
pub struct SpawnError {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

/// Runs invocations to completion
pub trait Executor {
    fn execute(
        &mut self,
        invocation: &CommandInvocation,
        streams: Streams,
    ) -> Result<ExitOutcome, SpawnError>;
}

/// Runs invocations as real child processes, resolving the program on PATH
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(
        &mut self,
        invocation: &CommandInvocation,
        streams: Streams,
    ) -> Result<ExitOutcome, SpawnError> {
        let (stdin, stdout) = match streams {
            Streams::All => (Stdio::inherit(), Stdio::inherit()),
            Streams::Output => (Stdio::null(), Stdio::inherit()),
            Streams::ErrorsOnly => (Stdio::null(), Stdio::null()),
        };

        let status = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| SpawnError {
                program: invocation.program().to_string(),
                source,
            })?;

        Ok(status.into())
    }
}
