//! Armlink Daemon - Main entry point
//!
//! Runs the simulated arm, the control tick loop, and the web server that
//! carries the browser control surface and the broker bridge.

mod api;
mod config;
mod server;
mod state;
mod ws;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "armlink")]
#[command(about = "Control surface and broker bridge for a simulated 6-axis arm")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "armlink.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the joint table and exit
    #[arg(long)]
    list_joints: bool,

    /// Open the control surface in a browser after startup
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Armlink v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    // Override bind address if specified
    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }

    if args.list_joints {
        // One-shot mode: show the effective joint table
        println!("Joints:");
        for profile in config.joint_profiles() {
            println!(
                "  - {} range [{}, {}] deg, home offset {} deg",
                profile.name,
                profile.min_display_deg,
                profile.max_display_deg,
                profile.home_offset_deg
            );
        }
        return Ok(());
    }

    info!(
        bind = %config.daemon.bind,
        tick_rate_hz = config.daemon.tick_rate_hz,
        "Configuration loaded"
    );

    // Create application state
    let state = state::AppState::new(config.clone()).await?;

    if args.open {
        let url = browser_url(&config.daemon.bind, config.daemon.tls.is_some());
        if let Err(e) = open::that(&url) {
            tracing::warn!(url = %url, error = %e, "Failed to open browser");
        }
    }

    server::run(state, &config.daemon.bind, config.daemon.tls.as_ref()).await?;

    Ok(())
}

/// URL a local browser can reach the daemon on
fn browser_url(bind: &str, tls: bool) -> String {
    let scheme = if tls { "https" } else { "http" };
    let host = match bind.strip_prefix("0.0.0.0") {
        Some(rest) => format!("127.0.0.1{rest}"),
        None => bind.to_string(),
    };
    format!("{scheme}://{host}")
}
