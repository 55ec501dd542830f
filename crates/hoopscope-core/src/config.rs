// Configuration loading and validation (hoopscope.toml).
//
// Every field has a default, so a missing file or a partial file is fine.
// Lookup order when no explicit path is given:
// 1. ./config/hoopscope.toml
// 2. <platform config dir>/hoopscope.toml
// 3. built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::loader::DEFAULT_TTL_SECS;
use crate::season::DEFAULT_EARLIEST_SEASON;
use crate::source::SEASON_PLACEHOLDER;

pub const CONFIG_FILE_NAME: &str = "hoopscope.toml";

/// Oldest season the per-game pages go back to.
const OLDEST_SUPPORTED_SEASON: i32 = 1950;

/// Longest cache lifetime accepted: one year.
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub seasons: SeasonsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub base_url: String,
    /// Path appended to `base_url`; must contain `{season}`.
    pub path_template: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.basketball-reference.com".into(),
            path_template: "/leagues/NBA_{season}_per_game.html".into(),
            timeout_secs: 30,
            user_agent: concat!("hoopscope/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX / 1000);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonsConfig {
    pub earliest: i32,
}

impl Default for SeasonsConfig {
    fn default() -> Self {
        Self {
            earliest: DEFAULT_EARLIEST_SEASON,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse and validate one config file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text, path)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration. An explicit path must exist; otherwise the first file
/// found in the lookup order wins, falling back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    match find_config(&cwd) {
        Some(path) => load_config_from(&path),
        None => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// First existing config file for a run from `base_dir`.
pub fn find_config(base_dir: &Path) -> Option<PathBuf> {
    let local = base_dir.join("config").join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    directories::ProjectDirs::from("", "", "hoopscope")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let source = &config.source;
    if !(source.base_url.starts_with("http://") || source.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "source.base_url".into(),
            message: format!("must be an http(s) URL, got {:?}", source.base_url),
        });
    }

    if !source.path_template.contains(SEASON_PLACEHOLDER) {
        return Err(ConfigError::ValidationError {
            field: "source.path_template".into(),
            message: format!("must contain {SEASON_PLACEHOLDER}"),
        });
    }

    if source.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "source.timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "cache.ttl_secs".into(),
            message: "must be > 0".into(),
        });
    }

    if config.cache.ttl_secs > MAX_TTL_SECS {
        return Err(ConfigError::ValidationError {
            field: "cache.ttl_secs".into(),
            message: format!("must be <= {MAX_TTL_SECS}, got {}", config.cache.ttl_secs),
        });
    }

    if config.seasons.earliest < OLDEST_SUPPORTED_SEASON {
        return Err(ConfigError::ValidationError {
            field: "seasons.earliest".into(),
            message: format!(
                "must be >= {OLDEST_SUPPORTED_SEASON}, got {}",
                config.seasons.earliest
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
