//! File I/O helpers
//!
//! Documents are read whole and the handle released before parsing; the
//! manifest is written atomically so an interrupted save never corrupts it.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::TransparencyError;

/// Read a whole text file, mapping failures to storage errors naming the path
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String, TransparencyError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            TransparencyError::Storage(format!("File not found: {}", path.display()))
        }
        _ => TransparencyError::Storage(format!("Failed to read {}: {}", path.display(), e)),
    })
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, TransparencyError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        TransparencyError::Storage(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), TransparencyError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TransparencyError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| TransparencyError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| TransparencyError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| TransparencyError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| TransparencyError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        TransparencyError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Entry {
        file: String,
        year: Option<i32>,
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Entry = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Entry::default());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("manifest.json");

        let data = Entry {
            file: "receita - 2022.json".into(),
            year: Some(2022),
        };
        write_json_atomic(&path, &data).unwrap();

        let loaded: Entry = read_json(&path).unwrap();
        assert_eq!(data, loaded);
        assert!(!temp_dir.path().join("nested").join("manifest.json.tmp").exists());
    }

    #[test]
    fn test_read_text_missing_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_text(temp_dir.path().join("gone.json")).unwrap_err();
        assert!(err.to_string().contains("gone.json"));
    }

    #[test]
    fn test_invalid_json_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();
        let err = read_json::<Entry, _>(&path).unwrap_err();
        assert!(matches!(err, TransparencyError::Storage(_)));
    }
}
