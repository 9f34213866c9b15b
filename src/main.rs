use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use nexus_engine::FeedbackDesk;
use nexus_server::ServerConfig;
use nexus_settings::DeskSettings;
use nexus_store::SqliteStore;
use nexus_telemetry::{init_telemetry, parse_level, TelemetryConfig};

/// Campus feedback desk: ticket intake, triage, and resolution over HTTP.
#[derive(Debug, Parser)]
#[command(name = "nexus", version)]
struct Cli {
    /// Settings file (defaults to ~/.nexus/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Bind address.
    #[arg(long)]
    host: Option<String>,
    /// Listen port.
    #[arg(long)]
    port: Option<u16>,
    /// SQLite database file, or `:memory:`.
    #[arg(long)]
    db_path: Option<String>,
    /// Skip seeding demo data into an empty database.
    #[arg(long)]
    no_seed: bool,
    /// Human-readable logs instead of JSON lines.
    #[arg(long)]
    pretty_logs: bool,
}

impl Cli {
    fn apply(&self, settings: &mut DeskSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(path) = &self.db_path {
            settings.database.path.clone_from(path);
        }
        if self.no_seed {
            settings.seed.demo_data = false;
        }
        if self.pretty_logs {
            settings.logging.json = false;
        }
    }
}

fn telemetry_config(settings: &DeskSettings) -> TelemetryConfig {
    TelemetryConfig {
        log_level: parse_level(&settings.logging.level).unwrap_or(Level::INFO),
        module_levels: settings
            .logging
            .modules
            .iter()
            .filter_map(|(module, level)| Some((module.clone(), parse_level(level)?)))
            .collect(),
        json: settings.logging.json,
    }
}

fn open_store(settings: &DeskSettings) -> Result<SqliteStore> {
    if settings.database.path == ":memory:" {
        tracing::warn!("using in-memory database; data is lost on exit");
        return SqliteStore::in_memory().context("failed to open in-memory database");
    }
    let path = settings.database_path(&nexus_settings::nexus_home());
    SqliteStore::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => nexus_settings::load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => nexus_settings::load_settings().context("failed to load settings")?,
    };
    cli.apply(&mut settings);
    settings.validate().context("invalid settings")?;

    init_telemetry(&telemetry_config(&settings)).context("failed to initialize logging")?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting feedback desk");

    let desk = FeedbackDesk::new(open_store(&settings)?);
    if settings.seed.demo_data {
        if let Some(report) = desk.seed_demo_data().context("failed to seed demo data")? {
            tracing::info!(users = report.users, tickets = report.tickets, "demo data ready");
        }
    }

    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        request_timeout_secs: settings.server.request_timeout_secs,
        session_ttl_secs: settings.session.ttl_secs,
    };
    let handle = nexus_server::start(config, desk)
        .await
        .context("failed to start server")?;
    tracing::info!(port = handle.port, "feedback desk ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
