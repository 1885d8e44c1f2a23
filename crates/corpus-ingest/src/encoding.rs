//! Encoding resolution and strict decoding
//!
//! Labels are resolved with the WHATWG label table from `encoding_rs`.
//! Decoding is strict: a byte sequence that is malformed for the declared
//! encoding is an error, never a replacement character. A byte order mark
//! that agrees with the declared encoding is stripped.

use encoding_rs::{DecoderResult, Encoding};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::types::{Source, Warning, WarningKind};

/// Requested encoding for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodingSpec {
    /// One label for every source
    Single(String),
    /// One label per source, by discovery position
    List(Vec<String>),
    /// Labels keyed by source identifier or file name
    Map(BTreeMap<String, String>),
}

impl Default for EncodingSpec {
    fn default() -> Self {
        Self::Single("UTF-8".to_string())
    }
}

impl EncodingSpec {
    /// Structural checks that need no sources
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::List(labels) if labels.is_empty() => {
                Err(Error::config("encoding list must not be empty"))
            }
            Self::Map(map) if map.is_empty() => {
                Err(Error::config("encoding table must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Resolve a label, rejecting unknown labels and the replacement encoding
pub fn lookup(label: &str, source_id: &str) -> Result<&'static Encoding> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(enc) if enc != encoding_rs::REPLACEMENT => Ok(enc),
        _ => Err(Error::encoding(source_id, label, "unsupported encoding label")),
    }
}

/// One resolved encoding per source, in discovery order
#[derive(Debug, Clone)]
pub struct EncodingPlan {
    encodings: Vec<&'static Encoding>,
    warnings: Vec<Warning>,
}

impl EncodingPlan {
    /// Assign an encoding to every source
    pub fn resolve(spec: &EncodingSpec, sources: &[Source]) -> Result<Self> {
        let mut warnings = Vec::new();

        let encodings = match spec {
            EncodingSpec::Single(label) => {
                let first = sources.first().map(|s| s.id.as_str()).unwrap_or_default();
                let enc = lookup(label, first)?;
                vec![enc; sources.len()]
            }
            EncodingSpec::List(labels) => {
                if labels.len() > sources.len() {
                    return Err(Error::config(format!(
                        "{} encodings given for {} sources",
                        labels.len(),
                        sources.len()
                    )));
                }
                sources
                    .iter()
                    .enumerate()
                    .map(|(i, source)| match labels.get(i) {
                        Some(label) => lookup(label, &source.id),
                        None => Err(Error::encoding(
                            &source.id,
                            "<none>",
                            format!(
                                "encoding list has {} entries but this is source {}",
                                labels.len(),
                                i + 1
                            ),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            EncodingSpec::Map(map) => {
                let mut used = BTreeSet::new();
                let mut encodings = Vec::with_capacity(sources.len());
                for source in sources {
                    let entry = map
                        .get_key_value(source.id.as_str())
                        .or_else(|| map.get_key_value(source.file_name()));
                    let Some((key, label)) = entry else {
                        return Err(Error::encoding(
                            &source.id,
                            "<none>",
                            "no encoding entry for this source",
                        ));
                    };
                    used.insert(key.as_str());
                    encodings.push(lookup(label, &source.id)?);
                }
                for key in map.keys().filter(|k| !used.contains(k.as_str())) {
                    tracing::warn!("Encoding entry '{}' matched no source", key);
                    warnings.push(Warning {
                        source_id: key.clone(),
                        kind: WarningKind::UnusedEncoding { key: key.clone() },
                    });
                }
                encodings
            }
        };

        Ok(Self {
            encodings,
            warnings,
        })
    }

    /// Encoding for the source at `index`
    pub fn get(&self, index: usize) -> Option<&'static Encoding> {
        self.encodings.get(index).copied()
    }

    /// Warnings raised while resolving
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// Decode bytes under `encoding`, failing on any malformed sequence
pub fn decode(bytes: &[u8], encoding: &'static Encoding, source_id: &str) -> Result<String> {
    let bom_len = match Encoding::for_bom(bytes) {
        Some((bom_encoding, len)) if bom_encoding == encoding => len,
        _ => 0,
    };
    let body = &bytes[bom_len..];

    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(body.len())
        .ok_or_else(|| Error::encoding(source_id, encoding.name(), "input too large to decode"))?;
    let mut out = String::with_capacity(capacity);

    let (result, read) = decoder.decode_to_string_without_replacement(body, &mut out, true);
    match result {
        DecoderResult::InputEmpty => Ok(out),
        DecoderResult::Malformed(bad, extra) => {
            let offset = bom_len + read - bad as usize - extra as usize;
            Err(Error::encoding(
                source_id,
                encoding.name(),
                format!("invalid byte sequence at offset {}", offset),
            ))
        }
        DecoderResult::OutputFull => Err(Error::encoding(
            source_id,
            encoding.name(),
            "decoder output buffer exhausted",
        )),
    }
}
