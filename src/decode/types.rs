//! Decoder types
//!
//! Row and encoding abstractions shared by the readers.

use crate::error::{Error, Result};
use crate::types::{Document, JsonValue};
use std::sync::Arc;

/// Character encoding of a CSV payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 (default)
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value
    Latin1,
}

impl TextEncoding {
    /// Decode one field
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| Error::decode(format!("Invalid UTF-8 in field: {e}"))),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// One CSV row as published: header names paired with text values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl RawRow {
    /// Build a row; `values` must line up with `headers`
    pub fn new(headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Build a row from name/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (headers, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::new(Arc::new(headers), values)
    }

    /// Value of a column, if the column exists
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Value of a column if it exists and is not empty
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterate name/value pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert to a document with every value as a string
    pub fn into_document(self) -> Document {
        self.headers
            .iter()
            .cloned()
            .zip(self.values)
            .map(|(h, v)| (h, JsonValue::String(v)))
            .collect()
    }
}
