//! Configuration loading and config file resolution
//!
//! The TOML file is bootstrap-only: it is read once at startup and every
//! value in it is optional. Resolution order for the file itself:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/ccm/config.toml`)
//!
//! A missing file is not an error: callers get [`TomlConfig::default`] and a
//! [`ConfigOrigin`] to warn about once logging is up. A file that exists but
//! cannot be parsed is a [`Error::Config`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CCM_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR: &str = "ccm";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Archive ingest settings (optional)
    #[serde(default)]
    pub ingest: IngestSection,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[ingest]` table
///
/// Every field is optional so that environment variables and CLI flags can
/// be layered on top; unset fields fall through to compiled defaults in the
/// ingest crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngestSection {
    /// Accepted content-file suffix (e.g. ".package")
    #[serde(default)]
    pub content_extension: Option<String>,

    /// Literal top-level folder name that shifts provenance by one segment
    #[serde(default)]
    pub mods_folder: Option<String>,

    /// Minimum (exclusive) similarity for a fuzzy candidate
    #[serde(default)]
    pub fuzzy_threshold: Option<f64>,

    /// Decompress and CRC-check every accepted entry while scanning
    #[serde(default)]
    pub verify_payloads: Option<bool>,

    /// Emit a progress event every N enumerated entries
    #[serde(default)]
    pub progress_interval: Option<usize>,
}

/// Resolve which config file to read
///
/// Returns `None` when no candidate is named and the platform config
/// directory cannot be determined.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path()
}

/// Platform default config file path (`~/.config/ccm/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    /// Parsed from this file
    File(PathBuf),
    /// Named file does not exist; defaults in use
    Missing(PathBuf),
    /// No file named and no platform config directory; defaults in use
    Unresolved,
}

/// Configuration plus its origin
///
/// Loading happens before logging is initialized, so the origin is reported
/// afterwards through [`LoadedConfig::log_origin`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub origin: ConfigOrigin,
}

impl LoadedConfig {
    /// Log where the configuration came from (warns on degraded startup)
    pub fn log_origin(&self) {
        match &self.origin {
            ConfigOrigin::File(path) => {
                info!("Loaded TOML configuration from {}", path.display())
            }
            ConfigOrigin::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigOrigin::Unresolved => {
                warn!("No config directory available, using built-in defaults")
            }
        }
    }
}

/// Load config, degrading to defaults when the file does not exist
pub fn load_or_default(path: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = path else {
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            origin: ConfigOrigin::Unresolved,
        });
    };

    if !path.exists() {
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            origin: ConfigOrigin::Missing(path.to_path_buf()),
        });
    }

    Ok(LoadedConfig {
        config: load_toml_config(path)?,
        origin: ConfigOrigin::File(path.to_path_buf()),
    })
}
