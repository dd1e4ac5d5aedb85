//! Portal document parsing
//!
//! A portal document is `{"registros": [{"registro": {...}}, ...]}`. Each
//! registro nests its movements under `listMovimentos` and its classification
//! under paths that differ by document kind (see [`Dimension::source_path`]).
//! Every lookup that a query depends on fails loudly when absent; labels
//! fail only for movements that are actually classified.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{TransparencyError, TransparencyResult};
use crate::models::{CommitmentItem, DatasetKind, Dimension, Money, MovementRecord};

#[derive(Debug, Deserialize)]
struct PortalDocument {
    registros: Vec<PortalEntry>,
}

#[derive(Debug, Deserialize)]
struct PortalEntry {
    registro: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMovement {
    tipo_movimento: String,
    data_movimento: String,
    valor_movimento: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommitmentItem {
    denominacao: String,
    quantidade: f64,
    valor_unitario: f64,
}

fn parse_document(source: &str, contents: &str) -> TransparencyResult<PortalDocument> {
    serde_json::from_str(contents)
        .map_err(|e| TransparencyError::data_format(format!("{}: {}", source, e)))
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(key))
}

fn required<'a>(
    registro: &'a Value,
    path: &[&str],
    source: &str,
    index: usize,
) -> TransparencyResult<&'a Value> {
    lookup(registro, path).ok_or_else(|| {
        TransparencyError::data_format(format!(
            "{}: record {} has no '{}'",
            source,
            index,
            path.join(".")
        ))
    })
}

fn required_str(
    registro: &Value,
    path: &[&str],
    source: &str,
    index: usize,
) -> TransparencyResult<String> {
    required(registro, path, source, index)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| {
            TransparencyError::data_format(format!(
                "{}: record {} has a non-text '{}'",
                source,
                index,
                path.join(".")
            ))
        })
}

/// The `denominacao` at `path`, or the reason it cannot be read
fn label_at(registro: &Value, path: &[&str], source: &str, index: usize) -> Result<String, String> {
    let mut full_path = path.to_vec();
    full_path.push("denominacao");

    match lookup(registro, &full_path) {
        Some(Value::String(label)) => Ok(label.clone()),
        Some(_) => Err(format!(
            "{}: record {} has a non-text '{}'",
            source,
            index,
            full_path.join(".")
        )),
        None => Err(format!(
            "{}: record {} has no '{}'",
            source,
            index,
            full_path.join(".")
        )),
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    value: &Value,
    what: &str,
    source: &str,
    index: usize,
) -> TransparencyResult<T> {
    T::deserialize(value).map_err(|e| {
        TransparencyError::data_format(format!("{}: record {} has invalid {}: {}", source, index, what, e))
    })
}

/// Parse the movements of a document, resolving the requested dimensions
///
/// Dimensions not requested are not looked up, so documents lacking an
/// unrelated branch still load. A requested label missing from a registro is
/// kept on its records as unresolved and reported when one of them is
/// classified, so registros the query never counts do not fail it.
pub fn parse_movements(
    source: &str,
    contents: &str,
    kind: DatasetKind,
    dimensions: &[Dimension],
) -> TransparencyResult<Vec<MovementRecord>> {
    let mut paths = Vec::with_capacity(dimensions.len());
    for dimension in dimensions {
        dimension.ensure_applies_to(kind)?;
        if let Some(path) = dimension.source_path(kind) {
            paths.push((*dimension, path));
        }
    }

    let document = parse_document(source, contents)?;
    let mut records = Vec::new();

    for (index, entry) in document.registros.iter().enumerate() {
        let registro = &entry.registro;

        let labels: Vec<(Dimension, Result<String, String>)> = paths
            .iter()
            .map(|(dimension, path)| (*dimension, label_at(registro, path, source, index)))
            .collect();

        let movements: Vec<RawMovement> = decode(
            required(registro, &["listMovimentos"], source, index)?,
            "listMovimentos",
            source,
            index,
        )?;

        for movement in movements {
            let amount = Money::from_decimal(movement.valor_movimento).ok_or_else(|| {
                TransparencyError::data_format(format!(
                    "{}: record {} has a non-finite valorMovimento",
                    source, index
                ))
            })?;

            let mut record =
                MovementRecord::new(movement.data_movimento, movement.tipo_movimento, amount);
            for (dimension, label) in &labels {
                record = match label {
                    Ok(label) => record.with_label(*dimension, label.clone()),
                    Err(reason) => record.with_unresolved_label(*dimension, reason.clone()),
                };
            }
            records.push(record);
        }
    }

    Ok(records)
}

/// Parse the commitment items of an expense document
///
/// Items whose `quantidade * valorUnitario` is exactly zero are skipped;
/// smaller nonzero products are kept even if they round to zero cents. The
/// issue date and element are only required of registros that have items.
pub fn parse_commitments(source: &str, contents: &str) -> TransparencyResult<Vec<CommitmentItem>> {
    let document = parse_document(source, contents)?;
    let mut items = Vec::new();

    for (index, entry) in document.registros.iter().enumerate() {
        let registro = &entry.registro;
        let raw_items: Vec<RawCommitmentItem> = decode(
            required(registro, &["listEmpenhoItens"], source, index)?,
            "listEmpenhoItens",
            source,
            index,
        )?;
        if raw_items.is_empty() {
            continue;
        }

        let issued = required_str(registro, &["empenho", "emissao"], source, index)?;
        let element = required_str(
            registro,
            &["naturezaDespesa", "elemento", "denominacao"],
            source,
            index,
        )?;

        for raw in raw_items {
            if raw.quantidade * raw.valor_unitario == 0.0 {
                continue;
            }
            let item = CommitmentItem::new(
                issued.clone(),
                element.clone(),
                raw.denominacao,
                raw.quantidade,
                raw.valor_unitario,
            )
            .ok_or_else(|| {
                TransparencyError::data_format(format!(
                    "{}: record {} has a non-finite commitment item value",
                    source, index
                ))
            })?;
            items.push(item);
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{aggregate, AggregationFilter, MovementTypeMatch};

    const EXPENSE: &str = r#"{
        "registros": [
            {"registro": {
                "naturezaDespesa": {
                    "elemento": {"denominacao": "Material de Consumo"},
                    "grupo": {"denominacao": "Outras Despesas Correntes"}
                },
                "unidadeOrcamentaria": {"denominacao": "Secretaria de Saude"},
                "despesa": {"funcao": {"denominacao": "Saude"}},
                "empenho": {"emissao": "2022-02-03"},
                "listEmpenhoItens": [
                    {"denominacao": "Luvas", "quantidade": 10, "valorUnitario": 2.5},
                    {"denominacao": "Brinde", "quantidade": 0, "valorUnitario": 9.9}
                ],
                "listMovimentos": [
                    {"tipoMovimento": "Emissão de empenho", "dataMovimento": "2022-02-03", "valorMovimento": 25.0},
                    {"tipoMovimento": "Pagamento de empenho", "dataMovimento": "2022-02-20", "valorMovimento": 25}
                ]
            }}
        ]
    }"#;

    #[test]
    fn test_parse_movements_with_labels() {
        let records = parse_movements(
            "despesa.json",
            EXPENSE,
            DatasetKind::Expense,
            &[Dimension::Element, Dimension::Function],
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].movement_type, "Pagamento de empenho");
        assert_eq!(records[1].amount.cents(), 2500);
        assert_eq!(records[1].label(Dimension::Function).unwrap(), "Saude");
        assert_eq!(
            records[0].label(Dimension::Element).unwrap(),
            "Material de Consumo"
        );
        assert!(records[0].label(Dimension::Department).is_err());
    }

    #[test]
    fn test_missing_dimension_path_fails_when_classified() {
        let records = parse_movements(
            "despesa.json",
            EXPENSE,
            DatasetKind::Expense,
            &[Dimension::Detail],
        )
        .unwrap();

        let err = records[0].label(Dimension::Detail).unwrap_err();
        assert!(err.is_data_format());
        assert!(err
            .to_string()
            .contains("despesa.json: record 0 has no 'naturezaDespesa.detalhamento.denominacao'"));
    }

    const REVENUE_PARTIAL: &str = r#"{"registros": [
        {"registro": {
            "naturezaReceita": {"alinea": {"denominacao": "IPTU"}},
            "listMovimentos": [
                {"tipoMovimento": "Arrecadação de receita", "dataMovimento": "2022-01-10", "valorMovimento": 10.0}
            ]
        }},
        {"registro": {
            "naturezaReceita": {},
            "listMovimentos": [
                {"tipoMovimento": "Previsão inicial", "dataMovimento": "2022-01-01", "valorMovimento": 99.0}
            ]
        }},
        {"registro": {"listMovimentos": []}}
    ]}"#;

    #[test]
    fn test_uncounted_registro_without_label_does_not_fail() {
        let records = parse_movements(
            "receita.json",
            REVENUE_PARTIAL,
            DatasetKind::Revenue,
            &[Dimension::Subheading],
        )
        .unwrap();
        assert_eq!(records.len(), 2);

        let filter = AggregationFilter::matching(MovementTypeMatch::one_of(["Arrecadação de receita"]));
        let totals = aggregate(&records, &filter, Dimension::Subheading).unwrap();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("IPTU"), Some(Money::from_cents(1000)));
    }

    #[test]
    fn test_counted_registro_without_label_fails() {
        let records = parse_movements(
            "receita.json",
            REVENUE_PARTIAL,
            DatasetKind::Revenue,
            &[Dimension::Subheading],
        )
        .unwrap();

        let err = aggregate(&records, &AggregationFilter::any(), Dimension::Subheading).unwrap_err();
        assert!(err.is_data_format());
        assert!(err
            .to_string()
            .contains("receita.json: record 1 has no 'naturezaReceita.alinea.denominacao'"));
    }

    #[test]
    fn test_dimension_not_applicable_to_kind() {
        let err = parse_movements(
            "receita.json",
            EXPENSE,
            DatasetKind::Revenue,
            &[Dimension::Function],
        )
        .unwrap_err();
        assert!(matches!(err, TransparencyError::Validation(_)));
    }

    #[test]
    fn test_bad_movement_fails() {
        let doc = r#"{"registros": [{"registro": {"listMovimentos": [{"tipoMovimento": "x"}]}}]}"#;
        let err = parse_movements("d.json", doc, DatasetKind::Expense, &[]).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_not_a_portal_document() {
        let err = parse_movements("d.json", "[]", DatasetKind::Expense, &[]).unwrap_err();
        assert!(err.to_string().contains("d.json"));
    }

    #[test]
    fn test_parse_commitments_skips_zero_items() {
        let items = parse_commitments("despesa.json", EXPENSE).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Luvas");
        assert_eq!(items[0].total.cents(), 2500);
        assert_eq!(items[0].issued.as_str(), "2022-02-03");
    }

    #[test]
    fn test_registro_without_items_needs_no_date_or_element() {
        let doc = r#"{"registros": [
            {"registro": {"listEmpenhoItens": []}},
            {"registro": {
                "naturezaDespesa": {"elemento": {"denominacao": "Material de Consumo"}},
                "empenho": {"emissao": "2022-06-01"},
                "listEmpenhoItens": [{"denominacao": "Caneta", "quantidade": 3, "valorUnitario": 1.5}]
            }}
        ]}"#;

        let items = parse_commitments("despesa.json", doc).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total.cents(), 450);
    }

    #[test]
    fn test_registro_with_items_still_requires_date() {
        let doc = r#"{"registros": [{"registro": {
            "naturezaDespesa": {"elemento": {"denominacao": "Material de Consumo"}},
            "listEmpenhoItens": [{"denominacao": "Caneta", "quantidade": 3, "valorUnitario": 1.5}]
        }}]}"#;

        let err = parse_commitments("despesa.json", doc).unwrap_err();
        assert!(err.to_string().contains("record 0 has no 'empenho.emissao'"));
    }

    #[test]
    fn test_tiny_nonzero_item_is_kept() {
        let doc = r#"{"registros": [{"registro": {
            "naturezaDespesa": {"elemento": {"denominacao": "Material de Consumo"}},
            "empenho": {"emissao": "2022-06-01"},
            "listEmpenhoItens": [
                {"denominacao": "Clipe", "quantidade": 1, "valorUnitario": 0.004},
                {"denominacao": "Cancelado", "quantidade": 5, "valorUnitario": 0}
            ]
        }}]}"#;

        let items = parse_commitments("despesa.json", doc).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Clipe");
        assert!(items[0].total.is_zero());
    }
}
