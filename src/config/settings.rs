//! User settings for transparencia
//!
//! Report defaults: the remainder label and policy, how many categories to
//! keep by name, and the currency symbol used in terminal output.

use serde::{Deserialize, Serialize};

use super::paths::TransparencyPaths;
use crate::error::TransparencyError;
use crate::reports::RemainderPolicy;

/// User settings for transparencia
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol for terminal output
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Label of the remainder row when a preset does not name one
    #[serde(default = "default_other_label")]
    pub other_label: String,

    /// When to emit the remainder row
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,

    /// Categories kept by name when neither the preset nor the command sets it
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Number of largest commitment items listed by the commitments report
    #[serde(default = "default_commitment_top_n")]
    pub commitment_top_n: usize,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "R$".to_string()
}

fn default_other_label() -> String {
    "Outros".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_commitment_top_n() -> usize {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            other_label: default_other_label(),
            remainder_policy: RemainderPolicy::default(),
            default_top_k: default_top_k(),
            commitment_top_n: default_commitment_top_n(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &TransparencyPaths) -> Result<Self, TransparencyError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                TransparencyError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                TransparencyError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TransparencyPaths) -> Result<(), TransparencyError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            TransparencyError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            TransparencyError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
