// Configuration loading and parsing (auction.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::roster::RoleLimits;
use crate::draft::Amount;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub auction: AuctionConfig,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionConfig {
    pub name: String,
    /// Budget given to participants added without an explicit one.
    pub default_budget: Amount,
    /// Per-role roster caps. Missing table means the standard 3/8/8/6.
    #[serde(default)]
    pub role_limits: RoleLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Player feed, relative to the working directory.
    pub path: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub db_path: String,
    /// Key the auction snapshot is saved under.
    pub state_key: String,
}

fn default_page_size() -> usize {
    25
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/auction.toml` relative to `base_dir`.
///
/// Does not seed from the defaults; `load_config()` does.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

const CONFIG_FILE: &str = "auction.toml";

/// Seed `config/auction.toml` from `defaults/auction.toml` on first run.
///
/// Returns the path written, or `None` when the user's copy already exists.
/// An edited config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {} in config/ or defaults/ under {}",
                CONFIG_FILE,
                base_dir.display()
            ),
        });
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("cannot create {}: {e}", dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("cannot copy {} to {}: {e}", source.display(), target.display()),
    })?;
    Ok(Some(target))
}

/// Load the config from the working directory, seeding it from the defaults
/// when missing.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.auction.default_budget <= 0 {
        return Err(ConfigError::ValidationError {
            field: "auction.default_budget".into(),
            message: format!("must be > 0, got {}", config.auction.default_budget),
        });
    }

    let limits = &config.auction.role_limits;
    let limit_fields: &[(&str, u32)] = &[
        ("auction.role_limits.goalkeepers", limits.goalkeepers),
        ("auction.role_limits.defenders", limits.defenders),
        ("auction.role_limits.midfielders", limits.midfielders),
        ("auction.role_limits.forwards", limits.forwards),
    ];
    for (name, val) in limit_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.catalog.page_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "catalog.page_size".into(),
            message: "must be > 0".into(),
        });
    }

    let string_fields: &[(&str, &str)] = &[
        ("storage.db_path", config.storage.db_path.as_str()),
        ("storage.state_key", config.storage.state_key.as_str()),
    ];
    for (name, val) in string_fields {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
