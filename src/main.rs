//! Binary entrypoint for the studio site.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use dada_studio::content::store::ContentStore;
use dada_studio::web::AppState;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "dada-studio", about = "Studio site server and showcase viewer")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Serve the site without opening the showcase window
    #[arg(long)]
    headless: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("dada_studio={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    // Use the library crate only.
    let cfg = dada_studio::config::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    cfg.validate().context("validating configuration")?;

    let store = ContentStore::new(
        &cfg.content_api.rest_url,
        &cfg.content_api.auth_url,
        &cfg.content_api.api_key,
    );
    let state = AppState::new(store, &cfg.site);

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let cancel = CancellationToken::new();

    let server = runtime.block_on(async {
        let handle = dada_studio::web::spawn(state, cancel.clone(), cfg.site.bind_addr);
        // Ctrl-C cancels the server whether or not a window is open.
        let ctrlc_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                ctrlc_cancel.cancel();
            }
        });
        handle
    });

    if cli.headless {
        info!("running headless, press ctrl-c to stop");
        runtime.block_on(cancel.cancelled());
    } else {
        // The event loop owns the main thread until the window closes.
        dada_studio::render::viewer::run_showcase(&cfg.showcase)?;
        cancel.cancel();
    }

    runtime.block_on(async {
        if let Err(err) = server.await {
            tracing::warn!(%err, "web server task failed");
        }
    });
    Ok(())
}
