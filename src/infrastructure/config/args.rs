use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "libris",
    version,
    about = "A lightweight terminal client for browsing a library book catalog",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable mouse support.
    #[arg(long)]
    pub mouse: Option<bool>,

    /// Catalog API base URL.
    #[arg(long, env = "LIBRIS_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// User the recommendations tab is computed for.
    #[arg(long, value_name = "ID")]
    pub user_id: Option<u64>,

    /// Defer cover downloads until they scroll into view.
    #[arg(long)]
    pub lazy_covers: Option<bool>,

    /// Cover retries before falling back to the placeholder.
    #[arg(long, value_name = "N")]
    pub retry_count: Option<u32>,

    /// Preload every cover of a freshly loaded page.
    #[arg(long)]
    pub preload: Option<bool>,
}
