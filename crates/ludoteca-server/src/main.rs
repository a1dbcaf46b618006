//! ludoteca server binary.
//!
//! Reads `ludoteca.toml` (or the path given with `--config`), opens the
//! SQLite store holding the catalogue and audit sheets, runs the
//! reconciliation driver in the background, and serves the JSON API over
//! HTTP until Ctrl-C.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use ludoteca_api::{ApiState, api_router};
use ludoteca_core::sheet::{SheetAuditLog, SheetCatalogue};
use ludoteca_store_sqlite::SqliteStore;
use ludoteca_sync::{Reconciler, ShutdownHandle, driver};
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Ludoteca loan registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ludoteca.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;
  info!(credentials = ?cfg.credentials, "configuration loaded");

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let catalogue = SheetCatalogue::new(store.sheet(&cfg.catalogue_sheet))
    .with_required_columns(cfg.required_columns);
  let log = SheetAuditLog::new(store.sheet(&cfg.audit_sheet));

  // The driver owns the reconciler; the API reads the sheets directly.
  let shutdown = Arc::new(ShutdownHandle::new());
  let reconciler = Reconciler::new(catalogue.clone(), log.clone());
  let driver = tokio::spawn(driver::run(
    reconciler,
    cfg.schedule(),
    shutdown.subscribe(),
  ));

  let state = ApiState::new(catalogue, log, &cfg.bot_token, shutdown.subscribe());
  let app = api_router(state);

  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  info!("Listening on http://{address}");

  let signal = shutdown.clone();
  let served = axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
      }
      info!("shutting down");
      signal.trigger();
    })
    .await;

  // Stop the driver even when the server failed on its own.
  shutdown.trigger();
  driver.await.context("reconciliation driver panicked")?;
  served.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
