//! Socksgate - SOCKS5 Proxy Endpoint
//!
//! This is the main entry point for the Socksgate application.

use anyhow::{Context, Result};
use clap::Parser;
use socksgate::config::{load_config, Config, LogConfig, Overrides};
use socksgate::server::run_server;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Socksgate - SOCKS5 proxy with username/password authentication
#[derive(Parser, Debug)]
#[command(name = "socksgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PROXY_PORT")]
    port: Option<u16>,

    /// Address to listen on
    #[arg(short, long, env = "PROXY_BIND")]
    bind: Option<IpAddr>,

    /// Username clients must present
    #[arg(short, long, env = "PROXY_USER")]
    username: Option<String>,

    /// Password clients must present
    #[arg(long, env = "PROXY_PASS", hide_env_values = true)]
    password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind,
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            log_level: self.log_level.clone(),
            json_log: self.json_log.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    config.apply_overrides(args.overrides());

    // Setup logging
    setup_logging(&config.log)?;

    config.validate().context("Invalid configuration")?;

    info!("Socksgate v{}", socksgate::VERSION);
    if let Some(path) = &args.config {
        info!("Configuration loaded from: {:?}", path);
    }

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("Received Ctrl+C, shutting down...");
                        }
                        _ = sigterm.recv() => {
                            info!("Received SIGTERM, shutting down...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received Ctrl+C, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            // On Windows, only handle Ctrl+C
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        }

        let _ = shutdown_tx_clone.send(true);
    });

    // Run the proxy
    run_server(config, shutdown_rx).await
}

/// Setup logging based on configuration
fn setup_logging(log: &LogConfig) -> Result<()> {
    let level = log.max_level();

    if log.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
