//! Result assembly: records from every source into one table
//!
//! Pure and side-effect free. Rows keep discovery order, then within-source
//! order; docvar columns are the union over all rows in first-appearance
//! order, with `Value::Missing` where a row has no value.

use std::collections::{HashMap, HashSet};

use crate::docvars;
use crate::types::{DocumentRecord, ResultTable, Row, Value, Warning};

/// Extraction output of one source, ready for assembly
#[derive(Debug, Clone)]
pub struct SourceExtraction {
    /// Source identifier
    pub source_id: String,
    /// Base name used to derive document ids
    pub file_name: String,
    /// Records in within-source order
    pub records: Vec<DocumentRecord>,
    /// Synthesized docvars shared by every record of the source
    pub docvars: Vec<(String, Value)>,
}

/// Document id for record `index` of a source yielding `count` records
fn base_doc_id(extraction: &SourceExtraction, record: &DocumentRecord, index: usize, count: usize) -> String {
    if let Some(id) = &record.doc_id {
        return id.clone();
    }
    let name = if extraction.file_name.is_empty() {
        &extraction.source_id
    } else {
        &extraction.file_name
    };
    if count == 1 {
        name.clone()
    } else {
        format!("{}.{}", name, index + 1)
    }
}

/// Make `id` unique among `used` by appending `.2`, `.3`, ...
fn unique_id(id: String, used: &mut HashSet<String>) -> String {
    if used.insert(id.clone()) {
        return id;
    }
    let mut k = 2;
    loop {
        let candidate = format!("{}.{}", id, k);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        k += 1;
    }
}

/// Build the result table from per-source extractions in discovery order
pub fn assemble(extractions: Vec<SourceExtraction>) -> (ResultTable, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut columns: Vec<String> = Vec::new();
    let mut column_index: HashMap<String, usize> = HashMap::new();
    let mut used_ids = HashSet::new();
    let mut pending: Vec<(String, String, Vec<(usize, Value)>)> = Vec::new();

    for extraction in extractions {
        let count = extraction.records.len();
        let mut reported = HashSet::new();

        for (index, record) in extraction.records.iter().enumerate() {
            let doc_id = unique_id(base_doc_id(&extraction, record, index, count), &mut used_ids);
            let merged = docvars::merge(
                &extraction.source_id,
                &extraction.docvars,
                record.docvars.clone(),
                &mut reported,
                &mut warnings,
            );

            let cells = merged
                .into_iter()
                .map(|(name, value)| {
                    let next = columns.len();
                    let idx = *column_index.entry(name.clone()).or_insert(next);
                    if idx == next {
                        columns.push(name);
                    }
                    (idx, value)
                })
                .collect();
            pending.push((doc_id, record.text.clone(), cells));
        }
    }

    let width = columns.len();
    let rows = pending
        .into_iter()
        .map(|(doc_id, text, cells)| {
            let mut values = vec![Value::Missing; width];
            for (idx, value) in cells {
                values[idx] = value;
            }
            Row {
                doc_id,
                text,
                values,
            }
        })
        .collect();

    let table = ResultTable {
        docvar_columns: columns,
        rows,
    };
    (table, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WarningKind;

    fn extraction(id: &str, file_name: &str, records: Vec<DocumentRecord>) -> SourceExtraction {
        SourceExtraction {
            source_id: id.to_string(),
            file_name: file_name.to_string(),
            records,
            docvars: Vec::new(),
        }
    }

    fn record(text: &str, docvars: &[(&str, Value)]) -> DocumentRecord {
        DocumentRecord {
            text: text.to_string(),
            docvars: docvars.iter().map(|(n, v)| (n.to_string(), v.clone())).collect(),
            doc_id: None,
        }
    }

    #[test]
    fn test_doc_ids_and_order() {
        let (table, warnings) = assemble(vec![
            extraction("a.txt", "a.txt", vec![record("alpha", &[])]),
            extraction(
                "t.csv",
                "t.csv",
                vec![record("one", &[]), record("two", &[])],
            ),
        ]);

        assert!(warnings.is_empty());
        let ids: Vec<&str> = table.rows.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "t.csv.1", "t.csv.2"]);
        assert_eq!(table.rows[2].text, "two");
    }

    #[test]
    fn test_duplicate_file_names_are_disambiguated() {
        let (table, _) = assemble(vec![
            extraction("x/a.txt", "a.txt", vec![record("1", &[])]),
            extraction("y/a.txt", "a.txt", vec![record("2", &[])]),
            extraction("z/a.txt", "a.txt", vec![record("3", &[])]),
        ]);
        let ids: Vec<&str> = table.rows.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "a.txt.2", "a.txt.3"]);
    }

    #[test]
    fn test_explicit_doc_id() {
        let mut rec = record("body", &[]);
        rec.doc_id = Some("speech-42".to_string());
        let (table, _) = assemble(vec![extraction("s.json", "s.json", vec![rec])]);
        assert_eq!(table.rows[0].doc_id, "speech-42");
    }

    #[test]
    fn test_column_union_marks_missing() {
        let (table, _) = assemble(vec![
            extraction("a.csv", "a.csv", vec![record("x", &[("year", Value::Integer(1))])]),
            extraction("b.csv", "b.csv", vec![record("y", &[("party", Value::Text("SPD".into()))])]),
        ]);

        assert_eq!(table.docvar_columns, vec!["year", "party"]);
        assert_eq!(table.get(0, "party"), Some(&Value::Missing));
        assert_eq!(table.get(1, "year"), Some(&Value::Missing));
    }

    #[test]
    fn test_synthesized_docvars_win() {
        let mut ex = extraction(
            "SPD_2017.csv",
            "SPD_2017.csv",
            vec![
                record("a", &[("party", Value::Text("CDU".into()))]),
                record("b", &[("party", Value::Text("FDP".into()))]),
            ],
        );
        ex.docvars = vec![("party".to_string(), Value::Text("SPD".into()))];

        let (table, warnings) = assemble(vec![ex]);
        assert_eq!(table.get(1, "party"), Some(&Value::Text("SPD".into())));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0].kind, WarningKind::DocvarConflict { .. }));
    }

    #[test]
    fn test_source_without_records_adds_no_rows() {
        let (table, _) = assemble(vec![extraction("empty.json", "empty.json", vec![])]);
        assert!(table.is_empty());
    }
}
