//! Relaunch Daemon - redeploy on image push
//!
//! The relaunch daemon provides:
//! - `POST /webhook/docker-push` guarded by a shared secret
//! - Delete-then-reapply of a static Kubernetes manifest per push
//! - A one-shot mode for running a single cycle from the shell

use clap::Parser;
use relaunch_daemon::config::load_env_file;
use relaunch_daemon::error::{DaemonError, DaemonResult};
use relaunch_daemon::{run_once, DaemonConfig, Server, WebhookAuth};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Relaunch Daemon CLI
#[derive(Parser)]
#[command(name = "relaunchd")]
#[command(about = "Relaunch Daemon - redeploy a Kubernetes manifest on image push", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RELAUNCH_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "RELAUNCH_LISTEN_ADDR")]
    listen: Option<String>,

    /// Manifest deleted and re-applied on every push
    #[arg(short, long, env = "RELAUNCH_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Shared secret expected in the X-Token header
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Log level
    #[arg(long, env = "RELAUNCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "RELAUNCH_LOG_JSON")]
    json: bool,

    /// Run one redeploy cycle and exit instead of serving
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    // `.env` next to the service supplies WEBHOOK_SECRET when it is not exported
    let env_file = load_env_file(None);
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(manifest) = cli.manifest {
        config.redeploy.manifest_path = manifest;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    if cli.once {
        let report = run_once(&config).await?;
        for line in &report.applied {
            println!("{}", line);
        }
        return Ok(());
    }

    let auth = WebhookAuth::from_secret(cli.webhook_secret)?;

    println!(
        r#"
  relaunch - redeploy on image push
  Version: {}
  Target: {}
  Manifest: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.cluster.target(),
        config.redeploy.manifest_path.display(),
        config.server.listen_addr
    );

    Server::new(config, auth).run().await
}
