//! Stockroom live-update client - command line entry point
//!
//! Connects to the configured live-update endpoint, prints every inbound
//! message as a JSON line, and sends every JSON line read from stdin.

use anyhow::Context;
use stockroom_client::stores::{fetch_all_products, Action, RealtimeAction};
use stockroom_client::{log_error, log_info, log_warn, ClientConfig, LiveClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout carries the messages themselves.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let client = LiveClient::start(config);

    // The catalog is nice to have; live updates work without it.
    if fetch_all_products(&client.api, &client.store).await.is_ok() {
        let count = client.store.select(|s| s.products.items.len());
        log_info!("Loaded {} products", count);
    }

    let printer = tokio::spawn(print_live_updates(client.clone()));

    client.connect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str(line) {
                    Ok(payload) => client.send(payload),
                    Err(e) => log_warn!("Ignoring input that is not JSON: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown();
    printer.abort();
    Ok(())
}

/// Print inbound messages to stdout and report status changes.
async fn print_live_updates(client: LiveClient) {
    let mut actions = client.store.actions();
    loop {
        match actions.recv().await {
            Ok(Action::Realtime(RealtimeAction::MessageReceived { value })) => {
                println!("{value}");
            }
            Ok(Action::Realtime(RealtimeAction::GaveUp)) => {
                log_error!(
                    "Live updates are unavailable; giving up on {}",
                    client.config.ws_url
                );
            }
            Ok(Action::Realtime(RealtimeAction::ConnectSucceeded)) => {
                log_info!("Live updates connected");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                log_warn!("Skipped {} store actions", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
