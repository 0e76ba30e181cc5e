//! Core types shared by the pipeline and its callers

use crate::error::SourceErrors;
use serde::{Deserialize, Serialize};

/// Pipeline stage
///
/// A run moves through the stages strictly in declaration order; source failures
/// never divert it to a failure state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching deny sources
    FetchingDeny,
    /// Fetching allow sources
    FetchingAllow,
    /// Normalizing deny, allow and secure lists
    Normalizing,
    /// Computing the final sets
    Reconciling,
    /// Writing the four artifacts
    Writing,
    /// Run finished
    Done,
}

impl Stage {
    /// The stage that follows this one (`Done` is terminal)
    pub fn next(self) -> Stage {
        match self {
            Stage::FetchingDeny => Stage::FetchingAllow,
            Stage::FetchingAllow => Stage::Normalizing,
            Stage::Normalizing => Stage::Reconciling,
            Stage::Reconciling => Stage::Writing,
            Stage::Writing => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::FetchingDeny => "fetching_deny",
            Stage::FetchingAllow => "fetching_allow",
            Stage::Normalizing => "normalizing",
            Stage::Reconciling => "reconciling",
            Stage::Writing => "writing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Which list a source feeds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Disposable domains to block
    Deny,
    /// Trusted domains to permit
    Allow,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Deny => f.write_str("deny"),
            Direction::Allow => f.write_str("allow"),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Number of domains in the published deny list
    pub deny_count: usize,
    /// Number of domains in the published allow list
    pub allow_count: usize,
    /// Combined non-fatal source failures, if any source failed
    pub diagnostics: Option<SourceErrors>,
}

impl RunReport {
    /// True when every declared source contributed
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_none()
    }
}
