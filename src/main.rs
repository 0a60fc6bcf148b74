mod cli;
mod crawl;
mod plugins;
mod schedule;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

// mimalloc keeps memory in check with many concurrent workers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use webscout_core::{CrawlConfig, CrawlError};

use crate::cli::Cli;
use crate::crawl::run_crawl;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CrawlConfig::load(Path::new(path))?,
        None => CrawlConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.url = Some(url.clone());
    }
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }

    init_logging(&config)?;

    match config.schedule.clone() {
        Some(spec) => {
            let at = schedule::parse(&spec)?;
            info!(at = %spec, "scheduler enabled, crawling daily");
            loop {
                schedule::wait_until(at).await;
                run_crawl(config.clone(), cli.resume).await?;
            }
        }
        None => run_crawl(config, cli.resume).await,
    }
}

fn init_logging(config: &CrawlConfig) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| CrawlError::Config(format!("cannot open log file {}: {e}", config.log_file)))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(config.log_level.to_lowercase())
            .map_err(|e| CrawlError::Config(format!("invalid log_level {}: {e}", config.log_level)))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
