//! Dataset display formatting
//!
//! Formats the documents registered in the manifest and the label listings
//! for terminal output.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::storage::DocumentEntry;

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Period")]
    period: String,
}

impl From<&DocumentEntry> for DocumentRow {
    fn from(entry: &DocumentEntry) -> Self {
        Self {
            file: entry.file.display().to_string(),
            kind: entry.kind.to_string(),
            year: entry.year.map_or_else(|| "any".to_string(), |y| y.to_string()),
            period: entry.period.clone().unwrap_or_default(),
        }
    }
}

/// Format the manifest documents as a table
pub fn format_dataset_table(entries: &[DocumentEntry]) -> String {
    if entries.is_empty() {
        return "No dataset documents registered.\n\nAdd one with 'transparencia dataset add' or run 'transparencia dataset scan'."
            .to_string();
    }

    let rows: Vec<DocumentRow> = entries.iter().map(DocumentRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format a plain list of labels, numbered in first-seen order
pub fn format_label_list(heading: &str, labels: &[String]) -> String {
    if labels.is_empty() {
        return format!("{}: none found.", heading);
    }

    let mut output = format!("{} ({}):\n", heading, labels.len());
    for (i, label) in labels.iter().enumerate() {
        output.push_str(&format!("  {:>3}. {}\n", i + 1, label));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatasetKind;

    #[test]
    fn test_empty_table() {
        assert!(format_dataset_table(&[]).contains("No dataset documents"));
    }

    #[test]
    fn test_table_lists_documents() {
        let entries = vec![
            DocumentEntry::new("receita - 2022.json", DatasetKind::Revenue).with_year(2022),
            DocumentEntry::new("despesa.json", DatasetKind::Expense),
        ];
        let table = format_dataset_table(&entries);
        assert!(table.contains("receita - 2022.json"));
        assert!(table.contains("revenue"));
        assert!(table.contains("any"));
    }

    #[test]
    fn test_label_list() {
        let labels = vec!["Saúde".to_string(), "Educação".to_string()];
        let output = format_label_list("Functions", &labels);
        assert!(output.starts_with("Functions (2):"));
        assert!(output.contains("  2. Educação"));
        assert_eq!(format_label_list("Functions", &[]), "Functions: none found.");
    }
}
