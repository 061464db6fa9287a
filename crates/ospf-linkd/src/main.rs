//! OSPF Link Discovery Daemon
//!
//! Main entry point for the ospf-linkd daemon.
//! Polls the local router's OSPF neighbor table and logs the derived links.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - AU-12: Audit Record Generation - Log daemon lifecycle
//! - CM-6: Configuration Settings - TOML configuration file
//! - SI-4: System Monitoring - Periodic polling

use anyhow::Context;
use clap::Parser;
use ospf_linkd::config_file::{LinkdConfig, DEFAULT_CONFIG_PATH};
use ospf_linkd::LinkDaemon;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// OSPF neighbor-table link discovery
#[derive(Parser, Debug)]
#[command(name = "ospf-linkd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Poll once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // NIST: AU-3, AU-12 - Audit logging setup
    init_logging(&args.log_level, args.json_logs);

    info!("ospf-linkd: Starting OSPF link discovery daemon");

    match run_daemon(&args).await {
        Ok(()) => {
            info!("ospf-linkd: Daemon exiting normally");
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "ospf-linkd: Daemon exiting with error");
            Err(e)
        }
    }
}

/// Initialize structured logging
///
/// RUST_LOG takes precedence over `log_level`.
fn init_logging(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init();
    }
}

/// Main daemon loop
///
/// # NIST Controls
/// - SI-4: System Monitoring - Poll loop
async fn run_daemon(args: &Args) -> anyhow::Result<()> {
    let config = LinkdConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let mut daemon = LinkDaemon::from_config(&config).context("invalid configuration")?;
    info!(
        local_device = %daemon.local_device(),
        interval_secs = config.session.poll_interval_secs,
        "ospf-linkd: Initialized"
    );

    if config.session.scrape_local_ports {
        match daemon.refresh_local_ports().await {
            Ok(count) => info!(count, "ospf-linkd: Scraped local ports"),
            Err(e) => warn!(error = %e, "ospf-linkd: Local port scrape failed"),
        }
    }

    if args.once {
        daemon.poll_once().await.context("link discovery poll failed")?;
        return Ok(());
    }

    // NIST: AU-12 - Log shutdown events
    let shutdown = setup_signal_handlers();
    let mut interval = tokio::time::interval(config.poll_interval());

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("ospf-linkd: Received shutdown signal");
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = daemon.poll_once().await {
                    warn!(error = %e, "ospf-linkd: Poll failed");
                }
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {}
        }
    }

    info!("ospf-linkd: Graceful shutdown complete");
    Ok(())
}

/// Setup signal handlers for graceful shutdown
fn setup_signal_handlers() -> Arc<AtomicBool> {
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("ospf-linkd: Received SIGINT/SIGTERM");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }
    });

    shutdown_flag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!flag.load(Ordering::Relaxed));
        flag.store(true, Ordering::Relaxed);
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["ospf-linkd"]);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(args.log_level, "info");
        assert!(!args.json_logs);
        assert!(!args.once);

        let args = Args::parse_from(["ospf-linkd", "-c", "/tmp/x.conf", "--once", "--json-logs"]);
        assert_eq!(args.config, PathBuf::from("/tmp/x.conf"));
        assert!(args.once);
        assert!(args.json_logs);
    }
}
