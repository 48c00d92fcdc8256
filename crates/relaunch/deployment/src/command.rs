//! Cluster commands, captured output and stderr classification

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

/// Stderr fragments that describe an expected end state rather than a failure.
/// Matched case-insensitively.
const BENIGN_STDERR_PATTERNS: &[&str] = &["not found", "no resources found"];

/// A named, namespaced Deployment in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub name: String,
    pub namespace: String,
}

impl DeploymentTarget {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl Default for DeploymentTarget {
    fn default() -> Self {
        Self::new("cicd-demo-deployment", "self-hosted")
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The four command shapes the redeploy cycle issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCommand {
    /// Delete every resource described by a manifest
    DeleteManifest(PathBuf),
    /// Delete one named deployment
    DeleteDeployment(DeploymentTarget),
    /// Query a named deployment; exit status 0 means it exists
    GetDeployment(DeploymentTarget),
    /// Create or update every resource described by a manifest
    ApplyManifest(PathBuf),
}

impl ClusterCommand {
    /// Argument vector passed to the cluster CLI
    pub fn args(&self) -> Vec<String> {
        match self {
            ClusterCommand::DeleteManifest(path) => {
                vec!["delete".into(), "-f".into(), path.display().to_string()]
            }
            ClusterCommand::DeleteDeployment(target) => vec![
                "delete".into(),
                "deployment".into(),
                target.name.clone(),
                "-n".into(),
                target.namespace.clone(),
            ],
            ClusterCommand::GetDeployment(target) => vec![
                "get".into(),
                "deployment".into(),
                target.name.clone(),
                "-n".into(),
                target.namespace.clone(),
            ],
            ClusterCommand::ApplyManifest(path) => {
                vec!["apply".into(), "-f".into(), path.display().to_string()]
            }
        }
    }
}

impl fmt::Display for ClusterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// Log severity assigned to a captured output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSeverity {
    Info,
    Error,
}

/// Stream a captured line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn label(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// One classified line of command output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLine<'a> {
    pub stream: OutputStream,
    pub severity: OutputSeverity,
    pub text: &'a str,
}

/// Classify a stderr line as benign noise or a real error
pub fn classify_stderr_line(line: &str) -> OutputSeverity {
    let lower = line.to_lowercase();
    if BENIGN_STDERR_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
    {
        OutputSeverity::Info
    } else {
        OutputSeverity::Error
    }
}

/// Captured result of one command invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit status; non-zero covers spawn failures and timeouts too
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.trim().lines()
    }

    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.trim().lines()
    }

    /// Whether stderr says the object is already gone
    pub fn reports_not_found(&self) -> bool {
        self.stderr.to_lowercase().contains("not found")
    }

    /// Every captured line with the severity it is logged at
    pub fn classified_lines(&self) -> impl Iterator<Item = OutputLine<'_>> {
        let stdout = self.stdout_lines().map(|text| OutputLine {
            stream: OutputStream::Stdout,
            severity: OutputSeverity::Info,
            text,
        });
        let stderr = self.stderr_lines().map(|text| OutputLine {
            stream: OutputStream::Stderr,
            severity: classify_stderr_line(text),
            text,
        });
        stdout.chain(stderr)
    }

    /// Emit every captured line to the tracing sink
    pub fn log(&self) {
        for line in self.classified_lines() {
            match line.severity {
                OutputSeverity::Info => info!("{} | {}", line.stream.label(), line.text),
                OutputSeverity::Error => error!("{} | {}", line.stream.label(), line.text),
            }
        }
    }
}

/// Executes cluster commands
///
/// Implementations perform exactly one invocation per call and never fail:
/// problems surface as a non-zero [`CommandOutput::status`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute the command and capture its output
    async fn execute(&self, command: &ClusterCommand) -> CommandOutput;

    /// Execute the command, optionally logging its classified output
    async fn run(&self, command: &ClusterCommand, log_output: bool) -> CommandOutput {
        info!(command = %command, "Running command");
        let output = self.execute(command).await;
        if log_output {
            output.log();
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let target = DeploymentTarget::default();
        assert_eq!(
            ClusterCommand::DeleteManifest(PathBuf::from("/srv/cicd-demo.yaml")).to_string(),
            "delete -f /srv/cicd-demo.yaml"
        );
        assert_eq!(
            ClusterCommand::DeleteDeployment(target.clone()).args(),
            vec!["delete", "deployment", "cicd-demo-deployment", "-n", "self-hosted"]
        );
        assert_eq!(
            ClusterCommand::GetDeployment(target).to_string(),
            "get deployment cicd-demo-deployment -n self-hosted"
        );
        assert_eq!(
            ClusterCommand::ApplyManifest(PathBuf::from("app.yaml")).args(),
            vec!["apply", "-f", "app.yaml"]
        );
    }

    #[test]
    fn test_benign_stderr_is_info() {
        assert_eq!(
            classify_stderr_line(r#"Error from server (NotFound): deployments.apps "x" not found"#),
            OutputSeverity::Info
        );
        assert_eq!(
            classify_stderr_line("No resources found in self-hosted namespace."),
            OutputSeverity::Info
        );
        assert_eq!(classify_stderr_line("NOT FOUND"), OutputSeverity::Info);
    }

    #[test]
    fn test_other_stderr_is_error() {
        assert_eq!(
            classify_stderr_line("error: the server doesn't have a resource type \"deploy\""),
            OutputSeverity::Error
        );
        assert_eq!(
            classify_stderr_line("Unable to connect to the server"),
            OutputSeverity::Error
        );
    }

    #[test]
    fn test_not_found_detection_ignores_case() {
        let output = CommandOutput::new(
            1,
            "",
            r#"Error: deployments.apps "cicd-demo-deployment" NOT FOUND"#,
        );
        assert!(!output.success());
        assert!(output.reports_not_found());
        assert!(!CommandOutput::new(1, "", "connection refused").reports_not_found());
    }

    #[test]
    fn test_classified_lines() {
        let output = CommandOutput::new(
            1,
            "deployment.apps \"web\" deleted\nservice \"web\" deleted\n",
            "Error from server (NotFound): services \"db\" not found\nerror: timed out\n",
        );
        let lines: Vec<_> = output.classified_lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[..2]
            .iter()
            .all(|l| l.stream == OutputStream::Stdout && l.severity == OutputSeverity::Info));
        assert_eq!(lines[2].severity, OutputSeverity::Info);
        assert_eq!(lines[3].severity, OutputSeverity::Error);
        assert_eq!(lines[3].text, "error: timed out");
    }

    #[test]
    fn test_empty_output_has_no_lines() {
        let output = CommandOutput::new(0, "  \n", "");
        assert_eq!(output.classified_lines().count(), 0);
    }
}
