//! DriverGuard - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, settings::Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_logging(&settings.logging)?;

    info!("=== DriverGuard v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Monitor: threshold {:.2}, delay {:.1}s, alarm {}, detection {}",
        settings.monitor.ear_threshold,
        settings.monitor.closure_delay_secs,
        if settings.monitor.alarm_enabled { "on" } else { "off" },
        if settings.monitor.detection_enabled { "on" } else { "off" },
    );

    run_server(settings).await
}
