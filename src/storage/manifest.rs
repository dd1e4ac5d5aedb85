//! Dataset manifest
//!
//! Tags each downloaded document with its dataset kind and, optionally, the
//! year it covers. Queries select documents through these tags instead of
//! matching on file names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::file_io::{read_json, write_json_atomic};
use crate::error::{TransparencyError, TransparencyResult};
use crate::models::DatasetKind;

/// Current manifest schema version
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// One document known to the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Path of the document; relative paths are under the data directory
    pub file: PathBuf,
    pub kind: DatasetKind,
    /// Year covered by the document, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Free-text period description, e.g. "1 a 12 - 2022"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl DocumentEntry {
    pub fn new(file: impl Into<PathBuf>, kind: DatasetKind) -> Self {
        Self {
            file: file.into(),
            kind,
            year: None,
            period: None,
        }
    }

    pub fn with_year(mut self, year: impl Into<Option<i32>>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_period(mut self, period: impl Into<Option<String>>) -> Self {
        self.period = period.into();
        self
    }

    /// Untagged documents may hold any year, so they match every year
    pub fn covers_year(&self, year: Option<i32>) -> bool {
        match (year, self.year) {
            (Some(wanted), Some(tagged)) => wanted == tagged,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestFile {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    documents: Vec<DocumentEntry>,
}

fn default_schema_version() -> u32 {
    MANIFEST_SCHEMA_VERSION
}

impl Default for ManifestFile {
    fn default() -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            documents: Vec::new(),
        }
    }
}

/// The manifest of a data directory
#[derive(Debug, Clone)]
pub struct DatasetManifest {
    path: PathBuf,
    documents: Vec<DocumentEntry>,
}

impl DatasetManifest {
    /// Load the manifest at `path`; a missing file is an empty manifest
    pub fn load(path: impl Into<PathBuf>) -> TransparencyResult<Self> {
        let path = path.into();
        let file: ManifestFile = read_json(&path)?;
        if file.schema_version > MANIFEST_SCHEMA_VERSION {
            return Err(TransparencyError::Storage(format!(
                "Manifest {} has schema version {}, newer than supported {}",
                path.display(),
                file.schema_version,
                MANIFEST_SCHEMA_VERSION
            )));
        }
        debug!(path = %path.display(), documents = file.documents.len(), "loaded manifest");
        Ok(Self {
            path,
            documents: file.documents,
        })
    }

    pub fn save(&self) -> TransparencyResult<()> {
        let file = ManifestFile {
            schema_version: MANIFEST_SCHEMA_VERSION,
            documents: self.documents.clone(),
        };
        write_json_atomic(&self.path, &file)
    }

    pub fn documents(&self) -> &[DocumentEntry] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Register a document; the same file cannot be listed twice
    pub fn add(&mut self, entry: DocumentEntry) -> TransparencyResult<()> {
        if self.documents.iter().any(|e| e.file == entry.file) {
            return Err(TransparencyError::Duplicate {
                entity_type: "Dataset document",
                identifier: entry.file.display().to_string(),
            });
        }
        self.documents.push(entry);
        Ok(())
    }

    /// Unregister a document, returning its entry
    pub fn remove(&mut self, file: &Path) -> TransparencyResult<DocumentEntry> {
        let position = self
            .documents
            .iter()
            .position(|e| e.file == file)
            .ok_or_else(|| TransparencyError::dataset_not_found(file.display().to_string()))?;
        Ok(self.documents.remove(position))
    }

    /// Documents of `kind` that may contain movements of `year`
    pub fn select(&self, kind: DatasetKind, year: Option<i32>) -> Vec<&DocumentEntry> {
        self.documents
            .iter()
            .filter(|e| e.kind == kind && e.covers_year(year))
            .collect()
    }

    /// Register JSON files in `dir` named by the download convention
    /// (`receita - ...`, `despesa - ...`, `despesaOrcamentaria - ...`)
    ///
    /// Returns the entries added; files already listed or not following the
    /// convention are left alone.
    pub fn scan_legacy(&mut self, dir: &Path) -> TransparencyResult<Vec<DocumentEntry>> {
        let reader = std::fs::read_dir(dir).map_err(|e| {
            TransparencyError::Storage(format!("Failed to list {}: {}", dir.display(), e))
        })?;

        let mut names: Vec<String> = Vec::new();
        for dirent in reader {
            let dirent = dirent?;
            if let Some(name) = dirent.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        // Files next to the manifest are recorded by name, others by full path
        let manifest_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        let mut added = Vec::new();
        for name in names {
            let Some((kind, year)) = infer_from_filename(&name) else {
                continue;
            };
            let path = dir.join(&name);
            let file = match path.strip_prefix(manifest_dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => path.clone(),
            };
            let entry = DocumentEntry::new(file, kind).with_year(year);
            if self.documents.iter().any(|e| e.file == entry.file) {
                continue;
            }
            self.documents.push(entry.clone());
            added.push(entry);
        }

        info!(dir = %dir.display(), added = added.len(), "scanned legacy documents");
        Ok(added)
    }
}

/// Infer kind and year from a legacy download file name
///
/// `"despesa - 1 a 12 - 2022.json"` gives `(Expense, Some(2022))`.
pub fn infer_from_filename(name: &str) -> Option<(DatasetKind, Option<i32>)> {
    let lower = name.to_lowercase();
    let stem = lower.strip_suffix(".json")?;

    // despesaorcamentaria must be checked before its prefix despesa
    let kind = if stem.starts_with("despesaorcamentaria") {
        DatasetKind::BudgetaryExpense
    } else if stem.starts_with("despesa") {
        DatasetKind::Expense
    } else if stem.starts_with("receita") {
        DatasetKind::Revenue
    } else {
        return None;
    };

    let trailing: Vec<char> = stem
        .trim_end()
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect();
    let year = if trailing.len() == 4 {
        trailing.iter().rev().collect::<String>().parse().ok()
    } else {
        None
    };

    Some((kind, year))
}
