//! labrat - Binary entry point.
//!
//! Starts the recursion driver with a fresh counter and a cancellation flag that
//! nothing inside the program ever sets. The attached harness normally ends the
//! process with SIGKILL; SIGINT/SIGTERM stop the loop at the next iteration
//! boundary instead.
//!
//! ```text
//! main() -> init_tracing() -> LabratConfig::load() -> tokio runtime -> Driver::run()
//!                                                                          |
//!                                                   stdout: one marker line, nothing else
//! ```
//!
//! Logs go to stderr so stdout stays reserved for the marker the harness waits on.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use labrat_config::LabratConfig;
use labrat_core::{Driver, ExpDepthSampler};
use labrat_types::CancelFlag;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}

fn load_config() -> LabratConfig {
    match LabratConfig::load() {
        Ok(Some(config)) => {
            if let Some(path) = LabratConfig::path() {
                tracing::info!(path = %path.display(), "Loaded config");
            }
            config
        }
        Ok(None) => LabratConfig::default(),
        Err(err) => {
            // Keep running with defaults; the fixture must stay probe-able.
            tracing::warn!(path = %err.path().display(), "Ignoring config: {err}");
            LabratConfig::default()
        }
    }
}

fn build_runtime(config: &LabratConfig) -> std::io::Result<Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("labrat-worker");
    if let Some(workers) = config.worker_threads() {
        builder.worker_threads(workers);
    }
    if let Some(stack_size) = config.thread_stack_size() {
        builder.thread_stack_size(stack_size);
    }
    builder.build()
}

#[cfg(unix)]
fn watch_shutdown_signals(cancel: CancelFlag) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    // Registered before the marker is written, so a signal sent right after the
    // harness sees the marker is never handled by the default disposition.
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        tracing::info!(signal = name, "Shutdown requested; stopping after current iteration");
        cancel.cancel();
    });
    Ok(())
}

#[cfg(not(unix))]
fn watch_shutdown_signals(cancel: CancelFlag) -> std::io::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested; stopping after current iteration");
            cancel.cancel();
        }
    });
    Ok(())
}

async fn drive(config: &LabratConfig) -> Result<i64> {
    let cancel = CancelFlag::new();
    watch_shutdown_signals(cancel.clone()).context("failed to install signal handlers")?;

    let sampler = ExpDepthSampler::new(config.depth_offset(), config.depth_exponent())
        .with_max_depth(config.max_depth());
    let driver = Driver::new(sampler).with_marker(config.marker());
    tracing::debug!(
        offset = config.depth_offset(),
        exponent = config.depth_exponent(),
        max_depth = ?config.max_depth(),
        "Depth distribution"
    );

    let mut counter = 0;
    let mut stdout = std::io::stdout();
    driver
        .run(&cancel, &mut counter, &mut stdout)
        .await
        .context("busy loop failed")
}

fn run() -> Result<i64> {
    let config = load_config();
    let runtime = build_runtime(&config).context("failed to build tokio runtime")?;
    runtime.block_on(drive(&config))
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(counter) => {
            tracing::info!(counter, "Exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
