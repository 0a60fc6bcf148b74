use clap::Parser;

#[derive(Parser)]
#[command(name = "webscout", about = "Configurable multi-threaded web crawler")]
pub struct Cli {
    /// Seed URL to crawl (overrides the config file)
    pub url: Option<String>,

    /// Maximum traversal depth
    #[arg(long)]
    pub depth: Option<u32>,

    /// Sink target path
    #[arg(long)]
    pub output: Option<String>,

    /// YAML config file
    #[arg(long)]
    pub config: Option<String>,

    /// Resume from the saved state snapshot
    #[arg(long)]
    pub resume: bool,
}
