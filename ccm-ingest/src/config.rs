//! Ingest settings resolution
//!
//! Provides multi-tier resolution with CLI → ENV → TOML → built-in priority.
//! The built-in values are the policy constants declared by the archive and
//! reconcile modules.

use crate::archive::{CONTENT_EXTENSION, DEFAULT_PROGRESS_INTERVAL, MODS_FOLDER};
use crate::error::{IngestError, IngestResult};
use crate::reconcile::DEFAULT_FUZZY_THRESHOLD;
use ccm_common::config::IngestSection;
use tracing::debug;

/// Environment override for the fuzzy threshold
pub const THRESHOLD_ENV_VAR: &str = "CCM_FUZZY_THRESHOLD";

/// Environment override for payload verification
pub const VERIFY_ENV_VAR: &str = "CCM_VERIFY_PAYLOADS";

/// Resolved ingest settings
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSettings {
    /// Accepted content-file suffix, compared case-sensitively
    pub content_extension: String,
    /// Top-level folder name that shifts provenance by one segment
    pub mods_folder: String,
    /// Fuzzy candidates must score strictly above this
    pub fuzzy_threshold: f64,
    /// Decompress accepted entries to detect corrupt payloads
    pub verify_payloads: bool,
    /// Progress event cadence in entries (0 disables progress events)
    pub progress_interval: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            content_extension: CONTENT_EXTENSION.to_string(),
            mods_folder: MODS_FOLDER.to_string(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            verify_payloads: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Command-line overrides
#[derive(Debug, Clone, Default)]
pub struct IngestOverrides {
    pub fuzzy_threshold: Option<f64>,
    pub verify_payloads: Option<bool>,
}

impl IngestSettings {
    /// Resolve settings from CLI overrides, environment and the `[ingest]` table
    pub fn resolve(toml: &IngestSection, overrides: &IngestOverrides) -> IngestResult<Self> {
        let defaults = Self::default();

        let env_threshold = read_env(THRESHOLD_ENV_VAR, |v| v.parse::<f64>().ok())?;
        let env_verify = read_env(VERIFY_ENV_VAR, parse_bool)?;

        let settings = Self {
            content_extension: toml
                .content_extension
                .clone()
                .unwrap_or(defaults.content_extension),
            mods_folder: toml.mods_folder.clone().unwrap_or(defaults.mods_folder),
            fuzzy_threshold: overrides
                .fuzzy_threshold
                .or(env_threshold)
                .or(toml.fuzzy_threshold)
                .unwrap_or(defaults.fuzzy_threshold),
            verify_payloads: overrides
                .verify_payloads
                .or(env_verify)
                .or(toml.verify_payloads)
                .unwrap_or(defaults.verify_payloads),
            progress_interval: toml.progress_interval.unwrap_or(defaults.progress_interval),
        };

        settings.validate()?;
        debug!(?settings, "Ingest settings resolved");
        Ok(settings)
    }

    /// Check value ranges
    pub fn validate(&self) -> IngestResult<()> {
        if !(0.0..1.0).contains(&self.fuzzy_threshold) {
            return Err(IngestError::Config(format!(
                "fuzzy_threshold must be in [0, 1), got {}",
                self.fuzzy_threshold
            )));
        }

        if self.content_extension.trim().is_empty() {
            return Err(IngestError::Config(
                "content_extension must not be empty".to_string(),
            ));
        }

        if self.mods_folder.is_empty() {
            return Err(IngestError::Config("mods_folder must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Read and parse an environment variable; unset or blank means `None`
fn read_env<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> IngestResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse(raw.trim())
            .map(Some)
            .ok_or_else(|| IngestError::Config(format!("Invalid value for {}: {:?}", name, raw))),
        _ => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_policy_constants() {
        let settings = IngestSettings::default();
        assert_eq!(settings.content_extension, ".package");
        assert_eq!(settings.mods_folder, "Mods");
        assert_eq!(settings.fuzzy_threshold, 0.7);
        assert!(!settings.verify_payloads);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let settings = IngestSettings {
            fuzzy_threshold: 1.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(IngestError::Config(_))));

        let settings = IngestSettings {
            fuzzy_threshold: -0.1,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
