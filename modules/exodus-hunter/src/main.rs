use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use exodus_common::AppConfig;
use exodus_hunter::{
    app::build_worker,
    liveness,
    notify::TelegramSender,
    scheduler::{run_schedule, spawn_ledger_reset, Schedule},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("exodus=info".parse()?))
        .init();

    info!("Exodus hunter starting...");

    let config = AppConfig::from_env()?;
    config.log_redacted();

    // Uptime page runs for the life of the process
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = liveness::serve(port).await {
            error!(error = %e, "Liveness server exited");
        }
    });

    // Surface a bad lead token before the first cycle
    match TelegramSender::new(config.lead_bot_token.as_str()).verify().await {
        Ok(username) => info!(bot = username.as_str(), "Lead bot authenticated"),
        Err(e) => warn!(error = %e, "Lead bot token check failed; deliveries will likely fail"),
    }

    let worker = Arc::new(build_worker(&config)?);
    let reset = spawn_ledger_reset(worker.ledger().clone(), config.ledger_reset);

    worker
        .admin()
        .event(&format!(
            "🚀 Exodus Engine deployed: {:?} mode, {} work unit(s).",
            config.mode,
            worker.units().len()
        ))
        .await;

    let schedule = Schedule::from_config(&config);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let cycles = run_schedule(worker.clone(), schedule, shutdown).await;
    reset.abort();

    worker
        .admin()
        .event(&format!("🛑 Exodus Engine stopping after {cycles} cycle(s)."))
        .await;
    Ok(())
}
