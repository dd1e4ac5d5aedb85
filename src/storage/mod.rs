//! Storage layer for transparencia
//!
//! Resolves documents through the dataset manifest and streams their
//! movements one document at a time. Each document is read whole, its file
//! handle released, and its records handed out before the next one is opened.

pub mod document;
pub mod file_io;
pub mod manifest;

pub use document::{parse_commitments, parse_movements};
pub use file_io::{read_json, read_text, write_json_atomic};
pub use manifest::{infer_from_filename, DatasetManifest, DocumentEntry};

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::paths::TransparencyPaths;
use crate::error::{TransparencyError, TransparencyResult};
use crate::models::{CommitmentItem, DatasetKind, Dimension, MovementRecord};

/// Main storage coordinator
pub struct Storage {
    paths: TransparencyPaths,
    pub manifest: DatasetManifest,
}

impl Storage {
    /// Open storage under `paths`, creating directories as needed
    pub fn open(paths: TransparencyPaths) -> TransparencyResult<Self> {
        paths.ensure_directories()?;
        let manifest = DatasetManifest::load(paths.manifest_file())?;
        Ok(Self { paths, manifest })
    }

    pub fn paths(&self) -> &TransparencyPaths {
        &self.paths
    }

    fn document_paths(&self, kind: DatasetKind, year: Option<i32>) -> Vec<PathBuf> {
        self.manifest
            .select(kind, year)
            .into_iter()
            .map(|entry| self.paths.resolve_document(&entry.file))
            .collect()
    }

    /// Lazily stream the movements of every `kind` document covering `year`,
    /// resolving `dimensions` on each record
    pub fn movements(
        &self,
        kind: DatasetKind,
        year: Option<i32>,
        dimensions: &[Dimension],
    ) -> TransparencyResult<MovementStream> {
        for dimension in dimensions {
            dimension.ensure_applies_to(kind)?;
        }

        let files = self.document_paths(kind, year);
        debug!(%kind, ?year, documents = files.len(), "selected documents");
        Ok(MovementStream::new(files, kind, dimensions.to_vec()))
    }

    /// Commitment items of every expense document covering `year`
    pub fn commitments(&self, year: Option<i32>) -> TransparencyResult<Vec<CommitmentItem>> {
        let mut items = Vec::new();
        for path in self.document_paths(DatasetKind::Expense, year) {
            let contents = read_text(&path)?;
            let source = path.display().to_string();
            let parsed = parse_commitments(&source, &contents)?;
            debug!(document = %source, items = parsed.len(), "loaded commitment items");
            items.extend(parsed);
        }
        Ok(items)
    }
}

/// Iterator over the movements of a sequence of documents
///
/// Yields an error and stops at the first document that cannot be read or
/// parsed.
pub struct MovementStream {
    pending: std::vec::IntoIter<PathBuf>,
    current: std::vec::IntoIter<MovementRecord>,
    kind: DatasetKind,
    dimensions: Vec<Dimension>,
    failed: bool,
}

impl MovementStream {
    fn new(files: Vec<PathBuf>, kind: DatasetKind, dimensions: Vec<Dimension>) -> Self {
        Self {
            pending: files.into_iter(),
            current: Vec::new().into_iter(),
            kind,
            dimensions,
            failed: false,
        }
    }

    fn load(&self, path: &Path) -> TransparencyResult<Vec<MovementRecord>> {
        let contents = read_text(path)?;
        let source = path.display().to_string();
        let records = parse_movements(&source, &contents, self.kind, &self.dimensions)?;
        debug!(document = %source, records = records.len(), "loaded document");
        Ok(records)
    }
}

impl Iterator for MovementStream {
    type Item = TransparencyResult<MovementRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.current.next() {
                return Some(Ok(record));
            }
            if self.failed {
                return None;
            }

            let path = self.pending.next()?;
            match self.load(&path) {
                Ok(records) => self.current = records.into_iter(),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl std::fmt::Debug for MovementStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementStream")
            .field("kind", &self.kind)
            .field("pending", &self.pending.len())
            .field("failed", &self.failed)
            .finish()
    }
}

/// Ensure a file exists before it is registered in the manifest
pub fn ensure_document_exists(
    paths: &TransparencyPaths,
    entry: &DocumentEntry,
) -> TransparencyResult<()> {
    let path = paths.resolve_document(&entry.file);
    if path.is_file() {
        Ok(())
    } else {
        Err(TransparencyError::Storage(format!(
            "File not found: {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn revenue_doc(entries: &[(&str, &str, f64)]) -> String {
        let registros: Vec<String> = entries
            .iter()
            .map(|(species, date, value)| {
                format!(
                    r#"{{"registro": {{
                        "naturezaReceita": {{"especie": {{"denominacao": "{}"}}}},
                        "listMovimentos": [{{"tipoMovimento": "Arrecadação de receita", "dataMovimento": "{}", "valorMovimento": {}}}]
                    }}}}"#,
                    species, date, value
                )
            })
            .collect();
        format!(r#"{{"registros": [{}]}}"#, registros.join(","))
    }

    fn storage_with(docs: &[(&str, String, Option<i32>)]) -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TransparencyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::open(paths).unwrap();
        for (name, contents, year) in docs {
            std::fs::write(storage.paths().data_dir().join(name), contents).unwrap();
            storage
                .manifest
                .add(DocumentEntry::new(*name, DatasetKind::Revenue).with_year(*year))
                .unwrap();
        }
        (temp_dir, storage)
    }

    #[test]
    fn test_stream_merges_documents() {
        let (_tmp, storage) = storage_with(&[
            ("a.json", revenue_doc(&[("Impostos", "2022-01-05", 10.0)]), Some(2022)),
            ("b.json", revenue_doc(&[("Taxas", "2022-06-05", 2.5), ("Impostos", "2022-07-01", 1.0)]), None),
            ("c.json", revenue_doc(&[("Impostos", "2021-07-01", 99.0)]), Some(2021)),
        ]);

        let records: Vec<MovementRecord> = storage
            .movements(DatasetKind::Revenue, Some(2022), &[Dimension::Species])
            .unwrap()
            .collect::<TransparencyResult<_>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        let total: Money = records.iter().map(|r| r.amount).sum();
        assert_eq!(total.cents(), 1350);
    }

    #[test]
    fn test_stream_stops_at_unreadable_document() {
        let (_tmp, mut storage) = storage_with(&[(
            "a.json",
            revenue_doc(&[("Impostos", "2022-01-05", 10.0)]),
            Some(2022),
        )]);
        storage
            .manifest
            .add(DocumentEntry::new("missing.json", DatasetKind::Revenue))
            .unwrap();

        let items: Vec<_> = storage
            .movements(DatasetKind::Revenue, None, &[Dimension::Species])
            .unwrap()
            .collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].as_ref().unwrap_err().to_string().contains("missing.json"));
    }

    #[test]
    fn test_inapplicable_dimension_rejected_up_front() {
        let (_tmp, storage) = storage_with(&[]);
        assert!(storage
            .movements(DatasetKind::Revenue, None, &[Dimension::Department])
            .is_err());
    }

    #[test]
    fn test_ensure_document_exists() {
        let (_tmp, storage) = storage_with(&[]);
        let entry = DocumentEntry::new("nope.json", DatasetKind::Expense);
        assert!(ensure_document_exists(storage.paths(), &entry).is_err());
    }
}
