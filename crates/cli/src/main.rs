use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use connection::{ApiClient, Connection, RetryPolicy};
use runner::MessageRouter;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod builtin;
mod config;

use config::RunnerConfig;

#[derive(Parser)]
#[command(name = "stepwire")]
#[command(about = "Step runner for the test orchestration core", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    /// Execution channel port (overrides GAUGE_INTERNAL_PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// API channel port (overrides GAUGE_API_PORT).
    #[arg(long)]
    api_port: Option<u16>,

    /// Bind and wait for the core to connect instead of connecting to it.
    #[arg(long)]
    listen: bool,

    #[arg(long)]
    connect_attempts: Option<u32>,

    #[arg(long)]
    retry_interval_ms: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut RunnerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.internal_port = Some(port);
        }
        if let Some(port) = self.api_port {
            config.api_port = Some(port);
        }
        if self.listen {
            config.listen = true;
        }
        if let Some(attempts) = self.connect_attempts {
            config.connect_attempts = attempts;
        }
        if let Some(interval) = self.retry_interval_ms {
            config.retry_interval_ms = interval;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = RunnerConfig::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    cli.apply(&mut config);

    run(config).await
}

async fn run(config: RunnerConfig) -> Result<()> {
    let policy = config.retry_policy();

    let mut connection = if config.listen {
        let listener = TcpListener::bind((config.host.as_str(), config.internal_port.unwrap_or(0)))
            .await
            .with_context(|| format!("Failed to bind {}", config.host))?;
        let port = listener.local_addr()?.port();
        // The core reads the port from this line.
        println!("Listening on port:{}", port);
        Connection::accept(&listener).await?
    } else {
        let port = config
            .internal_port
            .with_context(|| format!("{} is not set", config::INTERNAL_PORT_ENV))?;
        Connection::connect(&config.host, port, &policy)
            .await
            .context("Failed to connect to the core")?
    };

    let _api = match config.api_port {
        Some(port) => Some(start_api_client(&config.host, port, &policy).await?),
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
            let _ = shutdown_tx.send(true);
        }
    });

    let router = MessageRouter::new(Arc::new(builtin::registry()));
    router.serve(&mut connection, shutdown_rx).await?;

    info!("Runner stopped");
    Ok(())
}

async fn start_api_client(host: &str, port: u16, policy: &RetryPolicy) -> Result<ApiClient> {
    let connection = Connection::connect(host, port, policy)
        .await
        .context("Failed to connect to the core API")?;
    let client = ApiClient::spawn(connection);

    match client.installation_root().await {
        Ok(root) => info!(root = %root.display(), "Core installation root"),
        Err(e) => warn!(error = %e, "Could not resolve core installation root"),
    }
    Ok(client)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepwire=info,runner=info,connection=info".into()),
        )
        .init();
}
