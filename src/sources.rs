//! Source declarations: which upstream lists feed a run
//!
//! Declarations are plain sequences of strings. URL lists may contain `#` comments
//! and blank lines; the pipeline skips those. The secure list holds domains that
//! are forced into the allow list and kept out of the deny list.

use crate::config::SourcePaths;
use crate::error::{Error, Result};
use crate::extract::SourceFormat;
use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All inputs of a run, already resident in memory
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDeclaration {
    /// Text deny source URLs
    #[serde(default)]
    pub deny_text: Vec<String>,
    /// JSON deny source URLs
    #[serde(default)]
    pub deny_json: Vec<String>,
    /// Text allow source URLs
    #[serde(default)]
    pub allow_text: Vec<String>,
    /// JSON allow source URLs
    #[serde(default)]
    pub allow_json: Vec<String>,
    /// Local secure domains (no fetch)
    #[serde(default)]
    pub secure: Vec<String>,
}

/// One fetchable source, after comment and blank-line skipping
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// Trimmed URL
    pub url: String,
    /// Body encoding
    pub format: SourceFormat,
}

impl SourceDeclaration {
    /// Read all declaration files
    ///
    /// The four URL files are required. The secure file is optional and treated
    /// as empty when it does not exist.
    pub fn load(paths: &SourcePaths) -> Result<Self> {
        Ok(Self {
            deny_text: read_required(&paths.deny_text)?,
            deny_json: read_required(&paths.deny_json)?,
            allow_text: read_required(&paths.allow_text)?,
            allow_json: read_required(&paths.allow_json)?,
            secure: read_optional(&paths.secure)?,
        })
    }

    /// Fetchable sources for `direction`: text URLs first, then JSON URLs, each in
    /// declaration order
    pub fn sources(&self, direction: Direction) -> Vec<Source> {
        let (text, json) = match direction {
            Direction::Deny => (&self.deny_text, &self.deny_json),
            Direction::Allow => (&self.allow_text, &self.allow_json),
        };
        declared_urls(text, SourceFormat::Text)
            .chain(declared_urls(json, SourceFormat::Json))
            .collect()
    }
}

fn declared_urls(
    entries: &[String],
    format: SourceFormat,
) -> impl Iterator<Item = Source> + '_ {
    entries.iter().filter_map(move |entry| {
        let url = entry.trim();
        if url.is_empty() || url.starts_with('#') {
            None
        } else {
            Some(Source {
                url: url.to_string(),
                format,
            })
        }
    })
}

/// Split file content into lines
///
/// Accepts `\n` and `\r\n`. Interior empty lines are kept; a final empty segment
/// (after a trailing newline) is not.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn read_required(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {}", path.display(), e),
        ))
    })?;
    Ok(split_lines(&text))
}

fn read_optional(path: &Path) -> Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(split_lines(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Optional source file not found");
            Ok(Vec::new())
        }
        Err(e) => Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {}", path.display(), e),
        ))),
    }
}
