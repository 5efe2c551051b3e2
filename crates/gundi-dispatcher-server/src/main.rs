// crates/gundi-dispatcher-server/src/main.rs
// ============================================================================
// Module: Gundi Dispatcher Entry Point
// Description: Command-line entry point for the push endpoint.
// Purpose: Load configuration, assemble the dispatcher and serve until shutdown.
// Dependencies: clap, gundi-dispatcher-config, gundi-dispatcher-server, tokio
// ============================================================================

//! ## Overview
//! `gundi-dispatcher --config <path>` loads the TOML configuration (falling
//! back to `GUNDI_DISPATCHER_CONFIG`, then `gundi-dispatcher.toml`), installs
//! logging and serves the push endpoint until Ctrl-C or `SIGTERM`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gundi_dispatcher_config::GundiDispatcherConfig;
use gundi_dispatcher_config::config_toml_example;
use gundi_dispatcher_server::AppState;
use gundi_dispatcher_server::ServerError;
use gundi_dispatcher_server::build_processor;
use gundi_dispatcher_server::init_logging;
use gundi_dispatcher_server::router;
use gundi_dispatcher_server::serve;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "gundi-dispatcher", version, about = "Delivers Gundi observations to destination platforms")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Print an example configuration and exit.
    #[arg(long)]
    print_example_config: bool,
    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Process entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "dispatcher stopped");
            write_stderr_line(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command.
async fn run() -> Result<(), ServerError> {
    let cli = Cli::parse();
    if cli.print_example_config {
        write_stdout_line(&config_toml_example());
        return Ok(());
    }
    let config = GundiDispatcherConfig::load(cli.config.as_deref())?;
    if cli.check {
        write_stdout_line("configuration is valid");
        return Ok(());
    }
    init_logging(&config.logging)?;

    let processor = build_processor(&config)?;
    let addr = config.server.bind_addr()?;
    let listener =
        TcpListener::bind(addr).await.map_err(|err| ServerError::Io(format!("failed to bind {addr}: {err}")))?;
    tracing::info!(bind = %addr, "push endpoint listening");
    serve(listener, router(AppState::new(processor), config.server.max_body_bytes), shutdown_signal()).await?;
    tracing::info!("push endpoint stopped");
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves on Ctrl-C or, on Unix, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "sigterm handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

/// Writes a line to stdout, ignoring closed pipes.
fn write_stdout_line(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
}

/// Writes a line to stderr, ignoring closed pipes.
fn write_stderr_line(line: &str) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{line}");
}
