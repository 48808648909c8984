//! Raw provider output classification
//!
//! The 3D providers give back loosely-shaped JSON: sometimes a list,
//! sometimes an object, with values that are inline binary payloads
//! (data URIs), remote URLs, or opaque other data. Classifying the shape
//! once up front gives the materializer narrow branches to work with
//! instead of dynamic probing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::BTreeMap;

/// A single value inside a provider output
#[derive(Debug, Clone)]
pub enum OutputValue {
    /// Inline binary payload, already decoded
    Bytes(Vec<u8>),
    /// Text value, typically a URL pointing at the hosted result
    Text(String),
    /// Anything else the provider included (numbers, nested objects, ...)
    Other(serde_json::Value),
}

impl OutputValue {
    /// Classify a single JSON value, decoding data-URI payloads eagerly
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => match decode_data_uri(&s) {
                Some(bytes) => OutputValue::Bytes(bytes),
                None => OutputValue::Text(s),
            },
            other => OutputValue::Other(other),
        }
    }

    /// The decoded binary payload, if this value carries one
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            OutputValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The text content, if this value is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A raw, un-normalized provider response
///
/// `Mapping` uses a `BTreeMap` so the materializer's fallback scan has an
/// arbitrary-but-stable iteration order.
#[derive(Debug, Clone)]
pub enum RawOutput {
    Sequence(Vec<OutputValue>),
    Mapping(BTreeMap<String, OutputValue>),
    Other(serde_json::Value),
}

impl RawOutput {
    /// Classify a provider's raw JSON output
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                RawOutput::Sequence(items.into_iter().map(OutputValue::from_json).collect())
            }
            serde_json::Value::Object(entries) => RawOutput::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, OutputValue::from_json(v)))
                    .collect(),
            ),
            other => RawOutput::Other(other),
        }
    }
}

/// Decode a `data:<mime>;base64,<payload>` URI into raw bytes
fn decode_data_uri(s: &str) -> Option<Vec<u8>> {
    let rest = s.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    STANDARD.decode(payload).ok()
}
