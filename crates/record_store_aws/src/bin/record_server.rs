use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use record_store_aws::adapters::dynamodb::DynamoDbTable;
use record_store_aws::handlers::http::{router, AppState};
use record_store_aws::logging::init_server_logging;
use record_store_core::settings::{StoreSettings, TABLE_NAME_VAR};
use record_store_core::RecordStoreClient;

#[derive(Parser)]
#[command(
    name = "record_server",
    about = "HTTP front end for the DynamoDB-backed record store"
)]
struct Args {
    /// Port to listen on (falls back to NODE_PORT, then 3000)
    #[arg(long, env = "PORT")]
    port: Option<u16>,
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Table holding the records (overrides DYNAMODB_TABLE)
    #[arg(long)]
    table: Option<String>,
}

const DEFAULT_PORT: u16 = 3000;
const LEGACY_PORT_VAR: &str = "NODE_PORT";

fn resolve_port(flag: Option<u16>, legacy: Option<String>) -> anyhow::Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match legacy.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{LEGACY_PORT_VAR}={value} is not a valid port")),
        None => Ok(DEFAULT_PORT),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(component = "record_server", event = "signal_error", error = %error);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_server_logging();

    let settings = StoreSettings::from_lookup(|name| {
        if name == TABLE_NAME_VAR {
            if let Some(table) = &args.table {
                return Some(table.clone());
            }
        }
        std::env::var(name).ok()
    })
    .context("refusing to start without a usable store configuration")?;

    let table = DynamoDbTable::connect(&settings).await;
    let client = Arc::new(RecordStoreClient::new(
        settings.table_name.clone(),
        Arc::new(table),
    ));
    let app = router(AppState::new(client, settings.disclosure));

    let port = resolve_port(args.port, std::env::var(LEGACY_PORT_VAR).ok())?;
    let address: SocketAddr = format!("{}:{port}", args.host)
        .parse()
        .with_context(|| format!("invalid listen address {}:{port}", args.host))?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        component = "record_server",
        event = "listening",
        address = %address,
        table = %settings.table_name
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}
