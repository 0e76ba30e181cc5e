//! Configuration types for disposable-domains

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client-agent marker sent with every upstream request
pub const DEFAULT_USER_AGENT: &str =
    "disposable-email-domains/1.0 (+github.com/ilyasaftr/disposable-email-domains)";

/// Default response body cap (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 << 20;

/// Paths of the source-declaration files
///
/// Each URL file lists one upstream URL per line; `#` comments and blank lines
/// are allowed. The secure file lists domains, not URLs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePaths {
    /// Text deny sources (default: "sources/deny-text.txt")
    #[serde(default = "default_deny_text_sources")]
    pub deny_text: PathBuf,

    /// JSON deny sources (default: "sources/deny-json.txt")
    #[serde(default = "default_deny_json_sources")]
    pub deny_json: PathBuf,

    /// Text allow sources (default: "sources/allow-text.txt")
    #[serde(default = "default_allow_text_sources")]
    pub allow_text: PathBuf,

    /// JSON allow sources (default: "sources/allow-json.txt")
    #[serde(default = "default_allow_json_sources")]
    pub allow_json: PathBuf,

    /// Local secure domains, optional (default: "sources/secure.txt")
    #[serde(default = "default_secure_sources")]
    pub secure: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            deny_text: default_deny_text_sources(),
            deny_json: default_deny_json_sources(),
            allow_text: default_allow_text_sources(),
            allow_json: default_allow_json_sources(),
            secure: default_secure_sources(),
        }
    }
}

/// Destinations of the four published artifacts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Deny list, one domain per line (default: "lists/deny.txt")
    #[serde(default = "default_deny_text_out")]
    pub deny_text: PathBuf,

    /// Deny list as a JSON array (default: "lists/deny.json")
    #[serde(default = "default_deny_json_out")]
    pub deny_json: PathBuf,

    /// Allow list, one domain per line (default: "lists/allow.txt")
    #[serde(default = "default_allow_text_out")]
    pub allow_text: PathBuf,

    /// Allow list as a JSON array (default: "lists/allow.json")
    #[serde(default = "default_allow_json_out")]
    pub allow_json: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            deny_text: default_deny_text_out(),
            deny_json: default_deny_json_out(),
            allow_text: default_allow_text_out(),
            allow_json: default_allow_json_out(),
        }
    }
}

impl OutputPaths {
    /// All four outputs placed under `dir` with the default file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            deny_text: dir.join("deny.txt"),
            deny_json: dir.join("deny.json"),
            allow_text: dir.join("allow.txt"),
            allow_json: dir.join("allow.json"),
        }
    }
}

/// HTTP fetch behavior
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request transport timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Maximum accepted response body size in bytes (default: 10 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Sources fetched concurrently within one direction (default: 4)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            concurrency: default_concurrency(),
        }
    }
}

/// Retry policy for source fetches
///
/// The delay after failed attempt `i` (1-indexed) is `i * backoff_step`, capped at
/// `max_delay`, optionally stretched by up to 100% random jitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff step (default: 500 milliseconds)
    #[serde(default = "default_backoff_step", with = "duration_ms_serde")]
    pub backoff_step: Duration,

    /// Maximum delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step: default_backoff_step(),
            max_delay: default_max_delay(),
            jitter: false,
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Source-declaration file locations
    #[serde(default)]
    pub sources: SourcePaths,

    /// Output artifact locations
    #[serde(default)]
    pub outputs: OutputPaths,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Overall deadline for a run (default: 300 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Exit non-zero when any source failed (default: false)
    #[serde(default)]
    pub strict: bool,

    /// Log filter used when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing keys take their defaults. The result is validated before it is returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("fetch.concurrency".to_string()),
            });
        }
        if self.fetch.max_body_bytes == 0 {
            return Err(Error::Config {
                message: "max_body_bytes must be greater than zero".to_string(),
                key: Some("fetch.max_body_bytes".to_string()),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        if self.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".to_string(),
                key: Some("timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn default_deny_text_sources() -> PathBuf {
    PathBuf::from("sources/deny-text.txt")
}

fn default_deny_json_sources() -> PathBuf {
    PathBuf::from("sources/deny-json.txt")
}

fn default_allow_text_sources() -> PathBuf {
    PathBuf::from("sources/allow-text.txt")
}

fn default_allow_json_sources() -> PathBuf {
    PathBuf::from("sources/allow-json.txt")
}

fn default_secure_sources() -> PathBuf {
    PathBuf::from("sources/secure.txt")
}

fn default_deny_text_out() -> PathBuf {
    PathBuf::from("lists/deny.txt")
}

fn default_deny_json_out() -> PathBuf {
    PathBuf::from("lists/deny.json")
}

fn default_allow_text_out() -> PathBuf {
    PathBuf::from("lists/allow.txt")
}

fn default_allow_json_out() -> PathBuf {
    PathBuf::from("lists/allow.json")
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_log_level() -> String {
    "info".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
