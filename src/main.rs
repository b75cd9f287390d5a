//! threadscrape binary.
//!
//! Modes:
//! - `discover`: scroll the feed and persist discovered links
//! - `extract`:  run extraction workers over the persisted link log
//! - `both`:     run discovery and extraction concurrently (default)
//!
//! Usage: `threadscrape [discover|extract|both] [--dir PATH] [--feed URL]
//! [--workers N] [--headed]`

use anyhow::{Result, bail};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use threadscrape::renderer::ChromiumRenderer;
use threadscrape::{ScrapeConfig, logging};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Discover,
    Extract,
    Both,
}

struct CliArgs {
    mode: Mode,
    storage_dir: PathBuf,
    feed_url: String,
    workers: Option<usize>,
    headed: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut mode = Mode::Both;
    let mut storage_dir = PathBuf::from("./threadscrape-data");
    let mut feed_url = threadscrape::utils::DEFAULT_FEED_URL.to_string();
    let mut workers = None;
    let mut headed = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "discover" => mode = Mode::Discover,
            "extract" => mode = Mode::Extract,
            "both" => mode = Mode::Both,
            "--dir" => {
                let Some(value) = args.next() else {
                    bail!("--dir requires a path");
                };
                storage_dir = PathBuf::from(value);
            }
            "--feed" => {
                let Some(value) = args.next() else {
                    bail!("--feed requires a URL");
                };
                feed_url = value;
            }
            "--workers" => {
                let Some(value) = args.next() else {
                    bail!("--workers requires a number");
                };
                workers = Some(value.parse()?);
            }
            "--headed" => headed = true,
            other => bail!("unrecognized argument: {other}"),
        }
    }

    Ok(CliArgs {
        mode,
        storage_dir,
        feed_url,
        workers,
        headed,
    })
}

// Current-thread flavor: discovery and all extraction workers are
// cooperatively scheduled tasks on one event loop.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let mut builder = ScrapeConfig::builder()
        .storage_dir(&args.storage_dir)
        .feed_url(&args.feed_url)
        .headless(!args.headed);
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    let config = builder.build()?;

    let _log_guard = logging::init(&config.log_dir())?;
    info!(mode = ?args.mode, dir = %args.storage_dir.display(), "starting threadscrape");
    let config_json = serde_json::to_string(&config)?;
    debug!(config = %config_json, "effective configuration");

    let renderer = Arc::new(
        ChromiumRenderer::launch(config.headless(), config.chrome_data_dir().cloned()).await?,
    );

    match args.mode {
        Mode::Discover => threadscrape::run_discovery(&config, renderer.as_ref()).await?,
        Mode::Extract => threadscrape::run_extraction(&config, renderer).await?,
        Mode::Both => threadscrape::run_full_crawl(&config, renderer).await?,
    }

    info!("threadscrape finished");
    Ok(())
}
