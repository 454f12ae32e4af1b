//! Layered application configuration.
//!
//! Values are merged with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config PATH`, else `dupfind/config.toml` in the
//!    platform config directory when it exists
//! 3. Environment variables prefixed `DUPFIND_` (e.g. `DUPFIND_MIN_SIZE=4096`)
//! 4. Command-line flags
//!
//! [`Config::resolve`] then validates the merged values into [`ScanSettings`].
//! Every problem found there is a [`ConfigError`] and ends the run before
//! any file is read.
//!
//! ```toml
//! min_size = 4096
//! extension_sensitive = false
//! action = "delete"
//! exclude = ["Application Data", "node_modules"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::{Action, DeleteConfig, UnknownAction};
use crate::cli::Cli;
use crate::duplicates::{PipelineConfig, DEFAULT_CHANNEL_CAPACITY};
use crate::scanner::{WalkerConfig, DEFAULT_EXCLUDED_SUBSTRING};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPFIND_";

/// Errors found while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration source could not be parsed.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unknown action name.
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),

    /// The scan root does not exist.
    #[error("path not found: {0}")]
    RootNotFound(PathBuf),

    /// The scan root is not a directory.
    #[error("not a directory: {0}")]
    RootNotADirectory(PathBuf),

    /// The scan root cannot be listed.
    #[error("cannot read directory {path}: {source}")]
    RootUnreadable {
        /// Root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The current directory could not be determined.
    #[error("cannot determine current directory: {0}")]
    NoCurrentDir(#[source] std::io::Error),

    /// The channel must hold at least one pair.
    #[error("channel capacity must be at least 1, got {0}")]
    InvalidChannelCapacity(usize),
}

/// Raw configuration values, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum file size in bytes.
    pub min_size: u64,
    /// Don't compare files with different extensions.
    pub extension_sensitive: bool,
    /// Action name (see [`Action`]).
    pub action: String,
    /// Capacity of the duplicate channel.
    pub channel_capacity: usize,
    /// Path substrings to exclude.
    pub exclude: Vec<String>,
    /// Delete permanently instead of using the trash.
    pub permanent: bool,
    /// Don't prompt before deleting.
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 0,
            extension_sensitive: true,
            action: Action::default().name().to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            exclude: vec![DEFAULT_EXCLUDED_SUBSTRING.to_string()],
            permanent: false,
            assume_yes: false,
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Directory to scan
    pub root: PathBuf,
    /// Pipeline options
    pub pipeline: PipelineConfig,
    /// Resolved action
    pub action: Action,
    /// Deletion mode
    pub delete: DeleteConfig,
    /// Skip delete prompts
    pub assume_yes: bool,
}

impl Config {
    /// Default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupfind").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment with defaults, an optional TOML file and the environment.
    ///
    /// An explicit `file` must exist; the default location is used only if
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] for a missing explicit file.
    pub fn figment(file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Loading config from {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or any layer is malformed.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(file)?)
    }

    /// Extract a config from an already assembled figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a value has the wrong type.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Apply command-line flags on top of the loaded values.
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(sensitive) = cli.extension_sensitive {
            self.extension_sensitive = sensitive;
        }
        if let Some(ref action) = cli.action {
            self.action.clone_from(action);
        }
        if let Some(capacity) = cli.channel_capacity {
            self.channel_capacity = capacity;
        }
        if !cli.exclude.is_empty() {
            self.exclude.clone_from(&cli.exclude);
        }
        self.permanent |= cli.permanent;
        self.assume_yes |= cli.yes;
        self
    }

    /// Validate into settings for scanning `root` (current directory if `None`).
    ///
    /// A relative root is made absolute against the current directory, so
    /// every reported path is absolute.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown action, a zero channel capacity
    /// or a root that is not a readable directory.
    pub fn resolve(&self, root: Option<&Path>) -> Result<ScanSettings, ConfigError> {
        let action: Action = self.action.parse()?;

        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity(self.channel_capacity));
        }

        let root = match root {
            Some(path) => std::path::absolute(path).map_err(ConfigError::NoCurrentDir)?,
            None => std::env::current_dir().map_err(ConfigError::NoCurrentDir)?,
        };
        validate_root(&root)?;

        Ok(ScanSettings {
            root,
            pipeline: PipelineConfig {
                walker: WalkerConfig::new(self.min_size, self.exclude.clone()),
                extension_sensitive: self.extension_sensitive,
                channel_capacity: self.channel_capacity,
                record_skipped: false,
            },
            action,
            delete: DeleteConfig {
                permanent: self.permanent,
            },
            assume_yes: self.assume_yes,
        })
    }
}

fn validate_root(root: &Path) -> Result<(), ConfigError> {
    let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::RootNotFound(root.to_path_buf()),
        _ => ConfigError::RootUnreadable {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(ConfigError::RootNotADirectory(root.to_path_buf()));
    }

    std::fs::read_dir(root).map_err(|e| ConfigError::RootUnreadable {
        path: root.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
