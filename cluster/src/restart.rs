//! Restart triggers.

use async_trait::async_trait;

use crate::{RestartTrigger, SurfaceError};

/// Runs an external command (e.g. `systemctl restart ipfs-cluster`) and
/// treats a non-zero exit as failure.
#[derive(Clone, Debug)]
pub struct CommandRestart {
    program: String,
    args: Vec<String>,
}

impl CommandRestart {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line. Returns `None` for an
    /// empty line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl RestartTrigger for CommandRestart {
    async fn restart(&self) -> Result<(), SurfaceError> {
        tracing::info!(program = %self.program, args = ?self.args, "restarting cluster");
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| SurfaceError::RestartFailed(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SurfaceError::RestartFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Restart that does nothing, for surfaces that restart the cluster
/// themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRestart;

#[async_trait]
impl RestartTrigger for NoopRestart {
    async fn restart(&self) -> Result<(), SurfaceError> {
        tracing::debug!("restart delegated to the cluster manager");
        Ok(())
    }
}
