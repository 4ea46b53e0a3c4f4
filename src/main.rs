use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use sysmetrics_agent::config;
use sysmetrics_agent::measurement::{CpuMeasurement, MemoryMeasurement};
use sysmetrics_agent::scheduler::PeriodicMeasurementScheduler;
use sysmetrics_agent::sink::{LogSink, PublishSink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 1. Load configuration ────────────────────────────────────
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "cannot load configuration");
            eprintln!("sysmetrics-agent: {e}");
            return ExitCode::FAILURE;
        }
    };
    let options = config.scheduler_options();
    let sink: Arc<dyn PublishSink> = Arc::new(LogSink);

    // ── 2. Build one scheduler per enabled source ────────────────
    let memory = config.memory.enabled.then(|| {
        PeriodicMeasurementScheduler::new(
            config.memory_name().to_owned(),
            MemoryMeasurement::with_path(&config.meminfo_path),
            options,
            sink.clone(),
        )
    });
    let cpu = config.cpu.enabled.then(|| {
        PeriodicMeasurementScheduler::new(
            config.cpu_name().to_owned(),
            CpuMeasurement::new(),
            options,
            sink.clone(),
        )
    });

    if memory.is_none() && cpu.is_none() {
        error!("every measurement source is disabled, nothing to do");
        return ExitCode::FAILURE;
    }

    // ── 3. Start sampling ────────────────────────────────────────
    if let Some(s) = &memory {
        s.start();
    }
    if let Some(s) = &cpu {
        s.start();
    }
    info!(
        interval_ms = config.measurement_interval_ms,
        publish_window = config.publish_window,
        "sysmetrics agent running, ctrl-c to exit"
    );

    // ── 4. Run until interrupted ─────────────────────────────────
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for shutdown signal");
    }

    if let Some(s) = &memory {
        s.stop().await;
    }
    if let Some(s) = &cpu {
        s.stop().await;
    }
    info!("sysmetrics agent stopped");
    ExitCode::SUCCESS
}
