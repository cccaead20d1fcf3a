//! `vista` server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and either serves the dashboard API or refreshes the store
//! from a JSON dump.
//!
//! ```
//! vista serve
//! vista ingest --data data/jsondata.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vista_server::ServerConfig;
use vista_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vista insight dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,
  /// Replace the store contents with the records in a JSON dump.
  Ingest {
    /// Path to the JSON array of source records.
    #[arg(long, default_value = "data/jsondata.json")]
    data: PathBuf,
  },
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

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // A store we cannot open is fatal: never serve with a broken backend.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!("Store opened at {}", store_path.display());

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::Ingest { data } => {
      let json = tokio::fs::read_to_string(&data)
        .await
        .with_context(|| format!("failed to read {}", data.display()))?;
      vista_server::ingest::ingest(&store, &json)
        .await
        .context("ingestion failed")?;
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = vista_server::router(Arc::new(store), server_cfg);
  let listener = vista_server::bind(server_cfg)
    .await
    .with_context(|| format!("failed to bind {}:{}", server_cfg.host, server_cfg.port))?;

  axum::serve(listener, app).await.context("server error")?;

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
