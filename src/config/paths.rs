//! Path management for transparencia
//!
//! ## Path Resolution Order
//!
//! 1. `TRANSPARENCIA_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory reported by `directories`
//!    (`~/.config/transparencia` on Linux)

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::TransparencyError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "TRANSPARENCIA_DATA_DIR";

/// Manages all paths used by transparencia
#[derive(Debug, Clone)]
pub struct TransparencyPaths {
    base_dir: PathBuf,
}

impl TransparencyPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, TransparencyError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding downloaded portal documents and the manifest
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Default directory for CSV/JSON report exports
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Dataset manifest listing every known document
    pub fn manifest_file(&self) -> PathBuf {
        self.data_dir().join("manifest.json")
    }

    /// Resolve a manifest entry path; relative paths live under the data directory
    pub fn resolve_document(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir().join(file)
        }
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), TransparencyError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            TransparencyError::Io(format!("Failed to create base directory: {}", e))
        })?;

        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            TransparencyError::Io(format!("Failed to create data directory: {}", e))
        })?;

        std::fs::create_dir_all(self.exports_dir()).map_err(|e| {
            TransparencyError::Io(format!("Failed to create exports directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if transparencia has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, TransparencyError> {
    ProjectDirs::from("", "", "transparencia")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            TransparencyError::Config("Could not determine a home directory".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TransparencyPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.exports_dir(), temp_dir.path().join("exports"));
        assert_eq!(
            paths.manifest_file(),
            temp_dir.path().join("data").join("manifest.json")
        );
    }

    #[test]
    fn test_resolve_document() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TransparencyPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(
            paths.resolve_document(Path::new("despesa - 2022.json")),
            temp_dir.path().join("data").join("despesa - 2022.json")
        );
        let absolute = temp_dir.path().join("elsewhere.json");
        assert_eq!(paths.resolve_document(&absolute), absolute);
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TransparencyPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.exports_dir().exists());
        assert!(!paths.is_initialized());
    }
}
