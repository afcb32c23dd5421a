//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::entities::{
    CoverOptions, DEFAULT_PAGE_SIZE, DEFAULT_RETRY_COUNT, DEFAULT_VISIBILITY_MARGIN,
    DEFAULT_VISIBILITY_THRESHOLD, Placeholder,
};

use super::args::CliArgs;

pub(super) const APP_NAME: &str = "libris";
pub(super) const APP_QUALIFIER: &str = "org";
pub(super) const APP_ORGANIZATION: &str = "libris";

/// Base URL of the catalog API when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overlaid with CLI flags.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Enable mouse support.
    #[serde(default = "default_true")]
    pub mouse: bool,

    /// Catalog API connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Cover loading behaviour.
    #[serde(default)]
    pub covers: CoversConfig,
}

/// Catalog API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Books requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// User the recommendations tab is computed for.
    #[serde(default = "default_user_id")]
    pub user_id: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            page_size: default_page_size(),
            user_id: default_user_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Cover loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoversConfig {
    /// Defer fetching until a cover scrolls into view.
    #[serde(default = "default_true")]
    pub lazy: bool,

    /// Retries before falling back to the placeholder.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fraction of a cover that must be on screen before it is fetched.
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,

    /// Rows around the grid that already count as on screen.
    #[serde(default = "default_visibility_margin")]
    pub visibility_margin: u16,

    /// Text shown on covers not yet scrolled into view instead of the book icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_text: Option<String>,

    /// Warm the image cache with every cover of a freshly loaded page.
    #[serde(default = "default_true")]
    pub preload: bool,

    /// Covers fetched concurrently by the preloader.
    #[serde(default = "default_preload_batch_size")]
    pub preload_batch_size: usize,

    /// Decoded covers kept in memory.
    #[serde(default = "default_memory_cache_size")]
    pub memory_cache_size: usize,

    /// Download timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CoversConfig {
    /// Options handed to every cover loader.
    #[must_use]
    pub fn cover_options(&self) -> CoverOptions {
        let options = CoverOptions::default()
            .with_lazy(self.lazy)
            .with_retry_count(self.retry_count)
            .with_threshold(self.visibility_threshold)
            .with_margin(self.visibility_margin);
        match self.placeholder_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                options.with_placeholder(Placeholder::Text(text.to_string()))
            }
            _ => options,
        }
    }
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            lazy: true,
            retry_count: DEFAULT_RETRY_COUNT,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            visibility_margin: DEFAULT_VISIBILITY_MARGIN,
            placeholder_text: None,
            preload: true,
            preload_batch_size: default_preload_batch_size(),
            memory_cache_size: default_memory_cache_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_user_id() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    DEFAULT_RETRY_COUNT
}

fn default_visibility_threshold() -> f32 {
    DEFAULT_VISIBILITY_THRESHOLD
}

fn default_visibility_margin() -> u16 {
    DEFAULT_VISIBILITY_MARGIN
}

fn default_preload_batch_size() -> usize {
    3
}

fn default_memory_cache_size() -> usize {
    50
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(mouse) = args.mouse {
            self.mouse = mouse;
        }
        if let Some(api_url) = args.api_url {
            self.api.base_url = api_url;
        }
        if let Some(user_id) = args.user_id {
            self.api.user_id = user_id;
        }
        if let Some(lazy) = args.lazy_covers {
            self.covers.lazy = lazy;
        }
        if let Some(retry_count) = args.retry_count {
            self.covers.retry_count = retry_count;
        }
        if let Some(preload) = args.preload {
            self.covers.preload = preload;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("libris.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            mouse: true,
            api: ApiConfig::default(),
            covers: CoversConfig::default(),
        }
    }
}
