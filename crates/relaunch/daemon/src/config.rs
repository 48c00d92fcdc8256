//! Configuration for relaunch-daemon

use relaunch_deployment::{DeploymentTarget, KubectlRunner, RedeployPolicy};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Cluster CLI configuration
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Redeploy cycle configuration
    #[serde(default)]
    pub redeploy: RedeployConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Cluster CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Path or name of the kubectl binary
    #[serde(default = "default_kubectl")]
    pub kubectl: PathBuf,

    /// Explicit kubeconfig file
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Explicit kubeconfig context
    #[serde(default)]
    pub context: Option<String>,

    /// Deployment recreated on every push
    #[serde(default = "default_deployment")]
    pub deployment: String,

    /// Namespace of the deployment
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Per-command timeout in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl(),
            kubeconfig: None,
            context: None,
            deployment: default_deployment(),
            namespace: default_namespace(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl ClusterConfig {
    /// Deployment addressed by the targeted delete and existence checks
    pub fn target(&self) -> DeploymentTarget {
        DeploymentTarget::new(&self.deployment, &self.namespace)
    }

    /// Build the production command runner
    pub fn runner(&self) -> KubectlRunner {
        let mut runner = KubectlRunner::new(&self.kubectl)
            .with_timeout(Duration::from_secs(self.command_timeout_secs));
        if let Some(kubeconfig) = &self.kubeconfig {
            runner = runner.with_kubeconfig(kubeconfig);
        }
        if let Some(context) = &self.context {
            runner = runner.with_context(context);
        }
        runner
    }
}

/// Redeploy cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeployConfig {
    /// Manifest deleted and re-applied on every push
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Pause after the bulk delete, in seconds
    #[serde(default = "default_delay")]
    pub propagation_delay_secs: u64,

    /// Pause between existence checks, in seconds
    #[serde(default = "default_delay")]
    pub poll_interval_secs: u64,

    /// Existence checks tolerated before the cycle times out
    #[serde(default = "default_max_delete_attempts")]
    pub max_delete_attempts: u32,
}

impl Default for RedeployConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            propagation_delay_secs: default_delay(),
            poll_interval_secs: default_delay(),
            max_delete_attempts: default_max_delete_attempts(),
        }
    }
}

impl RedeployConfig {
    pub fn policy(&self) -> RedeployPolicy {
        RedeployPolicy {
            propagation_delay: Duration::from_secs(self.propagation_delay_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_delete_attempts: self.max_delete_attempts,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8642))
}

fn default_kubectl() -> PathBuf {
    PathBuf::from("kubectl")
}

fn default_deployment() -> String {
    "cicd-demo-deployment".to_string()
}

fn default_namespace() -> String {
    "self-hosted".to_string()
}

fn default_command_timeout() -> u64 {
    120
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("cicd-demo.yaml")
}

fn default_delay() -> u64 {
    3
}

fn default_max_delete_attempts() -> u32 {
    40
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load `KEY=value` pairs from a `.env` file into the process environment
///
/// Variables already set in the environment win. With no explicit path the
/// file is looked up from the working directory upwards.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and `RELAUNCH_*` env vars
    ///
    /// Nested keys use a double underscore, e.g. `RELAUNCH_CLUSTER__NAMESPACE`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RELAUNCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8642);
        assert!(config.server.enable_cors);
        assert_eq!(config.redeploy.manifest_path, PathBuf::from("cicd-demo.yaml"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_cluster_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(
            config.target(),
            DeploymentTarget::new("cicd-demo-deployment", "self-hosted")
        );
        assert_eq!(config.command_timeout_secs, 120);
        assert!(config.kubeconfig.is_none());
    }

    #[test]
    fn test_redeploy_policy_conversion() {
        let config = RedeployConfig {
            propagation_delay_secs: 5,
            poll_interval_secs: 2,
            max_delete_attempts: 7,
            ..Default::default()
        };
        let policy = config.policy();
        assert_eq!(policy.propagation_delay, Duration::from_secs(5));
        assert_eq!(policy.poll_interval, Duration::from_secs(2));
        assert_eq!(policy.max_delete_attempts, 7);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("relaunch-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
listen_addr = "127.0.0.1:9000"

[cluster]
namespace = "staging"
context = "kind-dev"

[redeploy]
manifest_path = "/srv/app.yaml"
max_delete_attempts = 3
"#,
        )
        .unwrap();

        let config = DaemonConfig::load(path.to_str()).unwrap();

        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.cluster.namespace, "staging");
        assert_eq!(config.cluster.deployment, "cicd-demo-deployment");
        assert_eq!(config.cluster.context.as_deref(), Some("kind-dev"));
        assert_eq!(config.redeploy.manifest_path, PathBuf::from("/srv/app.yaml"));
        assert_eq!(config.redeploy.max_delete_attempts, 3);
        assert_eq!(config.redeploy.poll_interval_secs, 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_env_overrides_use_single_underscore_prefix() {
        std::env::set_var("RELAUNCH_REDEPLOY__PROPAGATION_DELAY_SECS", "9");

        let config = DaemonConfig::load(None).unwrap();
        std::env::remove_var("RELAUNCH_REDEPLOY__PROPAGATION_DELAY_SECS");

        assert_eq!(config.redeploy.propagation_delay_secs, 9);
    }

    #[test]
    fn test_env_file_fills_unset_variables_only() {
        let path = std::env::temp_dir().join(format!("relaunch-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "RELAUNCH_TEST_ENV_FILE_SECRET=from-file\nRELAUNCH_TEST_ENV_FILE_KEPT=from-file\n",
        )
        .unwrap();
        std::env::set_var("RELAUNCH_TEST_ENV_FILE_KEPT", "from-env");

        let loaded = load_env_file(Some(&path));

        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(
            std::env::var("RELAUNCH_TEST_ENV_FILE_SECRET").as_deref(),
            Ok("from-file")
        );
        assert_eq!(
            std::env::var("RELAUNCH_TEST_ENV_FILE_KEPT").as_deref(),
            Ok("from-env")
        );
        std::env::remove_var("RELAUNCH_TEST_ENV_FILE_SECRET");
        std::env::remove_var("RELAUNCH_TEST_ENV_FILE_KEPT");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let path = std::env::temp_dir().join(format!("relaunch-{}.env", uuid::Uuid::new_v4()));

        assert!(load_env_file(Some(&path)).is_none());
    }
}
