//! # Ventas MCP Server
//!
//! stdout carries the protocol, so every log line goes to stderr.

use anyhow::Context;
use tokio::io::{stdin, stdout, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ventas_db::Database;
use ventas_mcp::config::McpConfig;
use ventas_mcp::{Server, ToolBox};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Ventas MCP server...");

    let config = McpConfig::load().context("Failed to load configuration")?;
    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;
    info!(db_path = %config.database.path.display(), "Ready, waiting for requests on stdin");

    let server = Server::new(ToolBox::new(db.clone()));

    tokio::select! {
        result = server.serve(BufReader::new(stdin()), stdout()) => {
            result.context("stdio transport failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    db.close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ventas=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
