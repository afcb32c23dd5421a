use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory on this platform")]
    ConfigDirNotFound,
    #[error("config file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Owns the directory holding `config.toml`.
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Uses the platform config directory for libris.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigDirNotFound` when the platform has no home directory.
    pub fn new() -> Result<Self, ConfigError> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| Self::with_dir(dirs.config_dir().to_path_buf()))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    #[must_use]
    pub fn with_dir(path: PathBuf) -> Self {
        Self { config_dir: path }
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn default_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Reads the config at `path_override`, or the default file.
    ///
    /// On first run the defaults are written out so users have a file to
    /// edit. A file that does not parse is kept as is and defaults are used
    /// for this session.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the defaults cannot be written.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let path = path_override.map_or_else(|| self.default_path(), Path::to_path_buf);

        if !path.exists() {
            info!(path = %path.display(), "Writing default config");
            let config = AppConfig::default();
            write_atomically(&path, &config)?;
            return Ok(config);
        }

        let text = fs::read_to_string(&path)?;
        Ok(toml::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
            AppConfig::default()
        }))
    }

    /// Stores `config` in the default file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        write_atomically(&self.default_path(), config)
    }
}

/// Writes through a temp file in the same directory so a crash never leaves
/// a truncated config behind.
fn write_atomically(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::other("config path has no parent"))?;
    fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(toml::to_string_pretty(config)?.as_bytes())?;
    staged.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "Config saved");
    Ok(())
}
