//! Production command runner backed by the `kubectl` binary

use crate::command::{ClusterCommand, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Exit status reported when the CLI binary cannot be located
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status reported when a command exceeds its timeout
pub const EXIT_TIMEOUT: i32 = 124;
/// Exit status reported for other spawn failures and signal termination
pub const EXIT_ABNORMAL: i32 = -1;

/// Runs cluster commands through the `kubectl` CLI
///
/// Arguments are passed as a vector, never through a shell.
#[derive(Debug, Clone)]
pub struct KubectlRunner {
    binary: PathBuf,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    timeout: Duration,
}

impl KubectlRunner {
    /// Default per-command timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig: None,
            context: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_kubeconfig(mut self, kubeconfig: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(kubeconfig.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build(&self, command: &ClusterCommand) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for KubectlRunner {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

#[async_trait]
impl CommandRunner for KubectlRunner {
    async fn execute(&self, command: &ClusterCommand) -> CommandOutput {
        let child = self.build(command).output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => CommandOutput {
                status: output.status.code().unwrap_or(EXIT_ABNORMAL),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Ok(Err(e)) => {
                warn!(
                    binary = %self.binary.display(),
                    error = %e,
                    "Failed to spawn cluster command"
                );
                let status = if e.kind() == io::ErrorKind::NotFound {
                    EXIT_NOT_FOUND
                } else {
                    EXIT_ABNORMAL
                };
                CommandOutput::new(
                    status,
                    "",
                    format!("failed to run {}: {}", self.binary.display(), e),
                )
            }
            Err(_) => {
                warn!(
                    command = %command,
                    timeout_secs = self.timeout.as_secs(),
                    "Cluster command timed out"
                );
                CommandOutput::new(
                    EXIT_TIMEOUT,
                    "",
                    format!("command timed out after {:?}: {}", self.timeout, command),
                )
            }
        }
    }
}
