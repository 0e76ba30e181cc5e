//! Error types for disposable-domains
//!
//! This module provides the error taxonomy for a pipeline run:
//! - Per-source failures ([`FetchError`], [`DecodeError`]) that are collected as
//!   non-fatal [`SourceDiagnostic`]s and never abort a run
//! - Output failures ([`WriteError`]) that always abort a run
//! - The top-level [`Error`] returned by library entry points

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for disposable-domains operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for disposable-domains
///
/// Source fetch/decode failures are not represented here directly: they are reported
/// through [`SourceErrors`] alongside successful results. An [`Error`] means the run
/// (or the setup around it) could not complete.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.concurrency")
        key: Option<String>,
    },

    /// I/O error outside of output writing (config and declaration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (config file parsing)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing an output artifact failed and no source diagnostics were recorded
    #[error("write outputs: {0}")]
    Write(#[from] WriteError),

    /// Writing an output artifact failed after some sources had already failed
    #[error("{diagnostics}; write outputs: {source}")]
    WriteAfterSourceErrors {
        /// Source diagnostics gathered before the write failure
        diagnostics: SourceErrors,
        /// The write failure that aborted the run
        source: WriteError,
    },
}

impl Error {
    /// Combine a fatal write failure with any diagnostics collected earlier in the run
    pub fn from_write(source: WriteError, diagnostics: Option<SourceErrors>) -> Self {
        match diagnostics {
            Some(diagnostics) => Error::WriteAfterSourceErrors {
                diagnostics,
                source,
            },
            None => Error::Write(source),
        }
    }
}

/// A single fetch attempt (or the last of a series of attempts) failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source URL could not be parsed
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// The server answered with a status outside 200..=299
    #[error("http {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Connection, TLS, timeout or body stream failure
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The response body exceeded the configured read cap
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured cap in bytes
        limit: usize,
    },

    /// The run deadline expired or the run was cancelled
    #[error("cancelled")]
    Cancelled,
}

/// A JSON source did not contain an array of strings
#[derive(Debug, Error)]
#[error("decode json: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Why a single declared source contributed nothing to a run
#[derive(Debug, Error)]
pub enum SourceError {
    /// Fetching failed after all attempts (or was cancelled)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched body could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A non-fatal failure attributed to one source URL
#[derive(Debug, Error)]
#[error("{url}: {error}")]
pub struct SourceDiagnostic {
    /// The source URL as declared (trimmed)
    pub url: String,
    /// What went wrong
    pub error: SourceError,
}

impl SourceDiagnostic {
    /// Create a diagnostic for `url`
    pub fn new(url: impl Into<String>, error: impl Into<SourceError>) -> Self {
        Self {
            url: url.into(),
            error: error.into(),
        }
    }
}

/// Combined non-fatal diagnostic for a run
///
/// Rendered as the individual diagnostics joined by `"; "`, in the order the
/// sources were declared (deny sources before allow sources).
#[derive(Debug, Default)]
pub struct SourceErrors(Vec<SourceDiagnostic>);

impl SourceErrors {
    /// Wrap a list of diagnostics, returning `None` when it is empty
    pub fn from_diagnostics(diagnostics: Vec<SourceDiagnostic>) -> Option<Self> {
        if diagnostics.is_empty() {
            None
        } else {
            Some(Self(diagnostics))
        }
    }

    /// The individual diagnostics
    pub fn diagnostics(&self) -> &[SourceDiagnostic] {
        &self.0
    }

    /// Number of failed sources
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no source failed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SourceErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SourceErrors {}

/// Writing one of the output artifacts failed
#[derive(Debug, Error)]
pub enum WriteError {
    /// The parent directory could not be created
    #[error("create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file could not be written
    #[error("write {path}: {source}")]
    Write {
        /// File that could not be written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The JSON artifact could not be encoded
    #[error("encode {path}: {source}")]
    Encode {
        /// File whose content failed to encode
        path: PathBuf,
        /// Underlying serializer error
        source: serde_json::Error,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn io_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn source_errors_join_in_order() {
        let errors = SourceErrors::from_diagnostics(vec![
            SourceDiagnostic::new("https://a.test/list.txt", FetchError::Status { status: 500 }),
            SourceDiagnostic::new("https://b.test/list.json", FetchError::Cancelled),
        ])
        .unwrap();

        assert_eq!(
            errors.to_string(),
            "https://a.test/list.txt: http 500; https://b.test/list.json: cancelled"
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn empty_diagnostics_are_not_an_error() {
        assert!(SourceErrors::from_diagnostics(Vec::new()).is_none());
    }

    #[test]
    fn decode_error_mentions_json() {
        let err = serde_json::from_str::<Vec<String>>("{}").unwrap_err();
        let diagnostic = SourceDiagnostic::new("https://c.test/x.json", DecodeError(err));
        let msg = diagnostic.to_string();
        assert!(msg.starts_with("https://c.test/x.json: decode json: "), "{msg}");
    }

    #[test]
    fn write_error_alone_is_not_wrapped() {
        let err = Error::from_write(
            WriteError::Write {
                path: PathBuf::from("lists/deny.txt"),
                source: io_error(),
            },
            None,
        );
        assert!(matches!(err, Error::Write(_)));
        assert_eq!(err.to_string(), "write outputs: write lists/deny.txt: denied");
    }

    #[test]
    fn write_error_is_appended_to_source_diagnostics() {
        let diagnostics = SourceErrors::from_diagnostics(vec![SourceDiagnostic::new(
            "https://a.test/list.txt",
            FetchError::Status { status: 404 },
        )]);
        let err = Error::from_write(
            WriteError::CreateDir {
                path: PathBuf::from("lists"),
                source: io_error(),
            },
            diagnostics,
        );

        assert!(matches!(err, Error::WriteAfterSourceErrors { .. }));
        assert_eq!(
            err.to_string(),
            "https://a.test/list.txt: http 404; write outputs: create directory lists: denied"
        );
        let source = std::error::Error::source(&err).expect("write error is the source");
        assert!(source.to_string().starts_with("create directory lists"));
    }
}
