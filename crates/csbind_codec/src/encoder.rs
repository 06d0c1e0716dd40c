//! Canonical CBOR encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// CBOR tag for RFC 3339 date/time text.
pub(crate) const TAG_DATETIME_TEXT: u64 = 0;

/// Encode a value to canonical CBOR bytes.
///
/// - Map keys are sorted by their encoded form (length-first, then bytewise)
/// - Integers use the shortest possible encoding
/// - Floats are always written as 64-bit
/// - No indefinite-length encoding
/// - Date/time values are written as tag 0 text with as many fractional
///   digits as the instant needs
///
/// # Errors
///
/// Returns an error if the value contains a callback.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A canonical CBOR encoder.
pub struct CanonicalEncoder {
    buffer: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => self.buffer.push(0xf6),
            Value::Bool(b) => self.buffer.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Integer(n) => self.encode_integer(*n),
            Value::Float(x) => {
                self.buffer.push(0xfb);
                self.buffer.extend_from_slice(&x.to_bits().to_be_bytes());
            }
            Value::Bytes(b) => {
                self.encode_unsigned(2, b.len() as u64);
                self.buffer.extend_from_slice(b);
            }
            Value::Text(s) => self.encode_text(s),
            Value::DateTime(t) => self.encode_datetime(t),
            Value::Array(arr) => {
                self.encode_unsigned(4, arr.len() as u64);
                for item in arr {
                    self.encode(item)?;
                }
            }
            Value::Map(map) => self.encode_map(map)?,
            Value::Callback(_) => return Err(CodecError::unsupported_type("callback")),
        }
        Ok(())
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode_integer(&mut self, n: i64) {
        if n >= 0 {
            self.encode_unsigned(0, n as u64);
        } else {
            // -1 encodes as 0, -2 as 1, ...
            self.encode_unsigned(1, (-(n + 1)) as u64);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_unsigned(&mut self, major_type: u8, value: u64) {
        let mt = major_type << 5;

        if value < 24 {
            self.buffer.push(mt | (value as u8));
        } else if u8::try_from(value).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(value as u8);
        } else if u16::try_from(value).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if u32::try_from(value).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn encode_text(&mut self, text: &str) {
        self.encode_unsigned(3, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    fn encode_datetime(&mut self, t: &DateTime<Utc>) {
        self.encode_unsigned(6, TAG_DATETIME_TEXT);
        self.encode_text(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }

    fn encode_map(&mut self, map: &BTreeMap<String, Value>) -> CodecResult<()> {
        let mut encoded: Vec<(Vec<u8>, &Value)> = map
            .iter()
            .map(|(key, value)| {
                let mut key_encoder = CanonicalEncoder::new();
                key_encoder.encode_text(key);
                (key_encoder.into_bytes(), value)
            })
            .collect();

        // length-first, then bytewise
        encoded.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));

        self.encode_unsigned(5, map.len() as u64);
        for (key, value) in encoded {
            self.buffer.extend_from_slice(&key);
            self.encode(value)?;
        }
        Ok(())
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}
