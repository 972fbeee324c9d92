//! # floatd - floating window service
//!
//! Runs the window bookkeeping service behind a Unix socket, or talks to a
//! running instance with `floatd send '<request json>'`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use floatd::config::ServiceSettings;
use floatd::ipc::{self, FloatIpcServer, Request};
use floatd::{FloatService, LoggingHost};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser)]
#[command(name = "floatd")]
#[command(about = "Floating window session service")]
#[command(version)]
struct Cli {
    /// Path to the service settings file
    #[arg(short, long, default_value = "~/.config/floatd/settings.toml")]
    settings: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Override the IPC socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Send one JSON request to a running service and print the reply
    Send {
        /// Request object, e.g. '{"type":"GetConfigJson"}'
        request: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    // Load settings
    let mut settings = match ServiceSettings::load(&cli.settings) {
        Ok(settings) => {
            info!("✅ Settings loaded from: {}", cli.settings);
            settings
        }
        Err(e) => {
            info!("📝 Using default settings ({:#})", e);
            ServiceSettings::default()
        }
    };
    if let Some(socket) = cli.socket {
        settings.socket_path = socket;
    }

    match cli.command {
        Some(CliCommand::Send { request }) => send(&settings, &request).await,
        None => run(settings).await,
    }
}

async fn send(settings: &ServiceSettings, request: &str) -> Result<()> {
    let request: Request = serde_json::from_str(request).context("Invalid request JSON")?;
    let reply = ipc::request_once(&settings.socket_path, &request).await?;
    println!("{}", serde_json::to_string(&reply)?);
    Ok(())
}

async fn run(settings: ServiceSettings) -> Result<()> {
    info!("🚀 Starting floatd");
    info!(
        "📄 Version: {} ({}, built {})",
        floatd::VERSION_NAME,
        floatd::GIT_COMMIT.unwrap_or("unknown"),
        floatd::BUILD_DATE
    );

    let host = Arc::new(LoggingHost::new());
    let service = FloatService::start(&settings, host.clone(), host)?;

    let server = FloatIpcServer::new(settings.socket_path.clone(), service.handle());
    if let Err(e) = server.start().await {
        error!("❌ Failed to start IPC server: {:#}", e);
        tokio::task::spawn_blocking(move || service.shutdown()).await?;
        return Err(e);
    }

    info!("✨ floatd is ready");

    // Set up signal handling
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("📨 Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => info!("📨 Received SIGINT (Ctrl+C), shutting down gracefully"),
    }

    drop(server);
    tokio::task::spawn_blocking(move || service.shutdown()).await?;

    info!("👋 floatd shutting down");
    Ok(())
}
