//! CRM server. Loads configuration, seeds demo data and serves the API.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crm_api::ApiServer;
use crm_core::AppConfig;
use crm_management::{seed_demo_data, ManagementState};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "crm-server")]
#[command(about = "Customer relationship and campaign management backend")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "CRM__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CRM__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Prometheus exporter port (overrides config)
    #[arg(long, env = "CRM__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Delay before a started campaign is marked completed
    #[arg(long, env = "CRM__CAMPAIGNS__COMPLETION_DELAY_MS")]
    completion_delay_ms: Option<u64>,

    /// Start with an empty store
    #[arg(long, default_value_t = false)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crm_server=info,crm_management=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("CRM server starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(delay) = cli.completion_delay_ms {
        config.campaigns.completion_delay_ms = delay;
    }
    if cli.no_seed {
        config.seed.enabled = false;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        completion_delay_ms = config.campaigns.completion_delay_ms,
        "Configuration loaded"
    );

    let state = ManagementState::from_config(&config);
    let api_server = ApiServer::new(config.clone(), state.clone());

    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    if config.seed.enabled {
        match state.auth.admin() {
            Some(admin) => {
                seed_demo_data(&state.campaigns, admin);
            }
            None => warn!("No admin account configured, skipping demo data"),
        }
    }

    // Drop expired sessions periodically.
    let auth = Arc::clone(&state.auth);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = auth.purge_expired();
            if purged > 0 {
                info!(purged, "Purged expired sessions");
            }
        }
    });

    api_server.mark_ready();
    info!("CRM server is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
