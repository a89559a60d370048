//! watchpost console
//!
//! - Connects to the control server over line-delimited JSON/TCP
//! - Routes inbound traffic into the alert log
//! - Runs until Ctrl-C, then logs a metrics snapshot

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use watchpost_client::{config, obs::ConsoleMetrics, sink::AlertLog, transport, Console};
use watchpost_core::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load()?;

    let metrics = Arc::new(ConsoleMetrics::default());
    let opts = transport::ClientOptions {
        role: cfg.server.role.clone(),
        max_line_bytes: cfg.transport.max_line_bytes,
    };
    let (client, events) = transport::NetworkClient::spawn(opts, Arc::clone(&metrics));

    tracing::info!(host = %cfg.server.host, port = cfg.server.port, role = %cfg.server.role, "watchpost starting");
    client.connect(cfg.server.host.clone(), cfg.server.port)?;

    let mut console = Console::new(&cfg, AlertLog::new(), Arc::clone(&metrics));
    console
        .run(events, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler failed");
            }
        })
        .await;

    if let Err(e) = client.disconnect() {
        tracing::debug!(error = %e, "disconnect skipped");
    }
    tracing::info!(rows = console.surface().len(), "watchpost stopped");
    tracing::info!(metrics = %metrics.render(), "final metrics");
    Ok(())
}
