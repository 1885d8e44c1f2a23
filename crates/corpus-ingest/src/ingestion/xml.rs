//! XML extractor
//!
//! Every well-formed document yields exactly one record:
//! - text is the trimmed, non-empty text and CDATA nodes in document order,
//!   joined by single spaces;
//! - when `text_field` names an element, only text beneath elements with that
//!   local name is used (an element name that never occurs is an error);
//! - attributes of the root element become docvars, keyed by local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{ExtractInput, Extractor};
use crate::config::FieldSelector;
use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Value};

/// One record per XML document
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlExtractor;

fn root_attributes(source_id: &str, start: &BytesStart<'_>) -> Result<Vec<(String, Value)>> {
    let mut docvars = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::parse(source_id, "xml", e))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::parse(source_id, "xml", e))?;
        docvars.push((name, Value::infer(&value)));
    }
    Ok(docvars)
}

impl Extractor for XmlExtractor {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        let source_id = input.source_id;
        let content = input.decode()?;

        let target = match &input.options.text_field {
            None => None,
            Some(FieldSelector::Name(name)) => Some(name.as_bytes()),
            Some(FieldSelector::Index(_)) => {
                return Err(Error::config_for(
                    source_id,
                    "text_field for xml sources must be an element name",
                ))
            }
        };

        let mut reader = Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut depth = 0usize;
        let mut seen_root = false;
        let mut inside_target = 0usize;
        let mut target_seen = false;
        let mut docvars = Vec::new();
        let mut parts: Vec<String> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::parse(
                    source_id,
                    "xml",
                    format!("{} (at byte {})", e, reader.buffer_position()),
                )
            })?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    if depth == 0 {
                        if seen_root {
                            return Err(Error::parse(source_id, "xml", "multiple root elements"));
                        }
                        seen_root = true;
                        docvars = root_attributes(source_id, e)?;
                    }
                    let is_target = target == Some(e.local_name().as_ref());
                    target_seen |= is_target;
                    if matches!(event, Event::Start(_)) {
                        depth += 1;
                        if is_target {
                            inside_target += 1;
                        }
                    }
                }
                Event::End(ref e) => {
                    depth = depth.saturating_sub(1);
                    if target == Some(e.local_name().as_ref()) && inside_target > 0 {
                        inside_target -= 1;
                    }
                }
                Event::Text(ref t) => {
                    let text = t.unescape().map_err(|e| Error::parse(source_id, "xml", e))?;
                    if depth == 0 {
                        return Err(Error::parse(source_id, "xml", "text outside the root element"));
                    }
                    if target.is_none() || inside_target > 0 {
                        parts.push(text.trim().to_string());
                    }
                }
                Event::CData(ref c) => {
                    let text = std::str::from_utf8(c)
                        .map_err(|e| Error::parse(source_id, "xml", e))?;
                    if (target.is_none() || inside_target > 0) && !text.trim().is_empty() {
                        parts.push(text.trim().to_string());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(Error::parse(source_id, "xml", "no root element"));
        }
        if depth != 0 {
            return Err(Error::parse(source_id, "xml", "unexpected end of document"));
        }
        if let (Some(name), false) = (&input.options.text_field, target_seen) {
            return Err(Error::config_for(
                source_id,
                format!("element '{}' not found", name),
            ));
        }

        parts.retain(|p| !p.is_empty());
        Ok(vec![DocumentRecord {
            text: parts.join(" "),
            docvars,
            doc_id: None,
        }])
    }
}
