//! Balangay registry server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API over HTTP. Two background tasks run
//! alongside the server: the staged-request expiry sweep and, when a sibling
//! system is configured, the outbox delivery worker.

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use balangay_server::{
  ServerConfig, app, notify::PushGateway, outbox, storage::DiskStorage, sweep,
};
use balangay_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Balangay civil-registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BALANGAY"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the store and collaborators.
  let store = Arc::new(
    SqliteStore::open(&server_cfg.store_path)
      .await
      .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?,
  );
  let notifier = Arc::new(PushGateway::new(server_cfg.notify_url.clone()));
  let files = Arc::new(DiskStorage::new(server_cfg.files_dir.clone()));

  // Background workers.
  tokio::spawn(sweep::run_expiry_sweep(
    Arc::clone(&store),
    Duration::from_secs(server_cfg.sweep_interval_minutes * 60),
    chrono::Duration::days(server_cfg.request_ttl_days),
  ));
  match server_cfg.sync_base_url.clone() {
    Some(base_url) => {
      tokio::spawn(outbox::run_sync_worker(
        Arc::clone(&store),
        base_url,
        Duration::from_secs(server_cfg.sync_interval_seconds),
      ));
    }
    None => tracing::warn!("no sync_base_url configured; outbox delivery disabled"),
  }

  let router = app(store, notifier, files);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, router).await.context("server error")?;

  Ok(())
}
