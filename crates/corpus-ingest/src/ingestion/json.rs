//! JSON extractor: one object, an array of objects, or newline-delimited objects

use serde_json::{Map, Value as Json};

use super::{ExtractInput, ExtractionOptions, Extractor};
use crate::config::FieldSelector;
use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Value};

/// One record per JSON object; the text key becomes `text`, siblings docvars
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExtractor;

impl JsonExtractor {
    fn parse_objects(source_id: &str, extension: &str, content: &str) -> Result<Vec<Map<String, Json>>> {
        let line_delimited = matches!(extension, "ndjson" | "jsonl");

        if !line_delimited {
            match serde_json::from_str::<Json>(content) {
                Ok(value) => return Self::objects_from_value(source_id, value),
                Err(e) => {
                    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
                    if lines < 2 {
                        return Err(Error::parse(source_id, "json", e));
                    }
                    tracing::debug!("'{}' is not a single JSON document, trying line-delimited", source_id);
                }
            }
        }

        let mut objects = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Json = serde_json::from_str(line)
                .map_err(|e| Error::parse(source_id, "json", format!("line {}: {}", i + 1, e)))?;
            match value {
                Json::Object(obj) => objects.push(obj),
                _ => {
                    return Err(Error::parse(
                        source_id,
                        "json",
                        format!("line {} is not a JSON object", i + 1),
                    ))
                }
            }
        }
        Ok(objects)
    }

    fn objects_from_value(source_id: &str, value: Json) -> Result<Vec<Map<String, Json>>> {
        match value {
            Json::Object(obj) => Ok(vec![obj]),
            Json::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Json::Object(obj) => Ok(obj),
                    _ => Err(Error::parse(
                        source_id,
                        "json",
                        format!("array element {} is not an object", i + 1),
                    )),
                })
                .collect(),
            _ => Err(Error::parse(
                source_id,
                "json",
                "expected an object or an array of objects",
            )),
        }
    }

    fn select_key(obj: &Map<String, Json>, selector: &FieldSelector) -> Option<String> {
        match selector {
            FieldSelector::Name(name) => obj.contains_key(name.as_str()).then(|| name.clone()),
            FieldSelector::Index(i) => obj.keys().nth(i.checked_sub(1)?).cloned(),
        }
    }

    fn record_from_object(
        source_id: &str,
        index: usize,
        obj: Map<String, Json>,
        options: &ExtractionOptions,
    ) -> Result<DocumentRecord> {
        let selector = options.text_field.as_ref().ok_or_else(|| {
            Error::config_for(source_id, "text_field is required for json sources")
        })?;
        let text_key = Self::select_key(&obj, selector)
            .ok_or_else(|| {
                Error::config_for(
                    source_id,
                    format!("text_field '{}' not found in object {}", selector, index + 1),
                )
            })?;
        let docid_key = match &options.docid_field {
            Some(sel) => Some(
                Self::select_key(&obj, sel)
                    .ok_or_else(|| {
                        Error::config_for(
                            source_id,
                            format!("docid_field '{}' not found in object {}", sel, index + 1),
                        )
                    })?,
            ),
            None => None,
        };

        let mut record = DocumentRecord::text(String::new());
        for (key, value) in obj {
            if key == text_key {
                record.text = match value {
                    Json::String(s) => s,
                    Json::Number(n) => n.to_string(),
                    Json::Bool(b) => b.to_string(),
                    _ => {
                        return Err(Error::parse(
                            source_id,
                            "json",
                            format!(
                                "text field '{}' in object {} is not a string, number or boolean",
                                key,
                                index + 1
                            ),
                        ))
                    }
                };
            } else if Some(&key) == docid_key.as_ref() {
                record.doc_id = match Value::from_json(&value) {
                    Value::Missing => None,
                    v => Some(v.to_string()),
                };
            } else {
                record.docvars.push((key, Value::from_json(&value)));
            }
        }
        Ok(record)
    }
}

impl Extractor for JsonExtractor {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        let content = input.decode()?;
        let objects = Self::parse_objects(input.source_id, input.extension, &content)?;

        objects
            .into_iter()
            .enumerate()
            .map(|(i, obj)| Self::record_from_object(input.source_id, i, obj, input.options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(extension: &str, body: &str) -> Result<Vec<DocumentRecord>> {
        let options = ExtractionOptions {
            text_field: Some(FieldSelector::from("text")),
            has_header: true,
            ..Default::default()
        };
        let input = ExtractInput {
            source_id: "tweets.json",
            extension,
            bytes: body.as_bytes(),
            encoding: encoding_rs::UTF_8,
            options: &options,
        };
        JsonExtractor.extract(&input)
    }

    #[test]
    fn test_array_of_objects() {
        let records = run(
            "json",
            r#"[{"user": "a", "text": "hi", "retweets": 3, "meta": {"x": 1}},
                {"text": "bye", "user": "b", "retweets": null}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "hi");
        assert_eq!(
            records[0].docvars,
            vec![
                ("user".to_string(), Value::Text("a".to_string())),
                ("retweets".to_string(), Value::Integer(3)),
                ("meta".to_string(), Value::Text("{\"x\":1}".to_string())),
            ]
        );
        assert_eq!(records[1].docvars[1], ("retweets".to_string(), Value::Missing));
    }

    #[test]
    fn test_single_object() {
        let records = run("json", r#"{"text": "only"}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "only");
    }

    #[test]
    fn test_line_delimited() {
        let body = "{\"text\": \"one\", \"n\": 1}\n\n{\"text\": \"two\", \"n\": 2}\n";
        let records = run("json", body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "two");

        let records = run("jsonl", "{\"text\": \"solo\"}").unwrap();
        assert_eq!(records[0].text, "solo");
    }

    #[test]
    fn test_malformed_names_source() {
        let err = run("json", "{\"text\": ").unwrap_err();
        assert!(matches!(err, Error::Parse { ref source_id, .. } if source_id == "tweets.json"));
    }

    #[test]
    fn test_missing_key_and_null_text() {
        let err = run("json", r#"[{"body": "x"}]"#).unwrap_err();
        assert!(matches!(err, Error::ConfigurationFor { .. }));

        let err = run("json", r#"{"text": null}"#).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
