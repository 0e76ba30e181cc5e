//! Turning fetched bodies into candidate domain strings

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

/// Encoding of a declared source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// One domain per line
    Text,
    /// JSON array of strings
    Json,
}

impl SourceFormat {
    /// Extract candidate strings from a body in this format
    pub fn extract(self, body: &[u8]) -> Result<Vec<String>, DecodeError> {
        match self {
            SourceFormat::Text => Ok(extract_text(body)),
            SourceFormat::Json => extract_json(body),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Text => f.write_str("text"),
            SourceFormat::Json => f.write_str("json"),
        }
    }
}

/// Split a text body into lines
///
/// Accepts `\n` and `\r\n` endings. Empty lines are kept; filtering happens during
/// normalization. Invalid UTF-8 is replaced rather than rejected.
pub fn extract_text(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Decode a JSON array of strings
///
/// Anything else (an object, a number, an array with a non-string element) is a
/// [`DecodeError`].
pub fn extract_json(body: &[u8]) -> Result<Vec<String>, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}
