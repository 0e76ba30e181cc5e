//! Public-suffix lookups used to derive eTLD+1 comparison keys

use std::collections::HashSet;

/// Registrable-domain lookup, injected so reconciliation can run against a fixed table.
pub trait SuffixLookup: Send + Sync {
    /// The registrable domain (eTLD+1) of `host`
    ///
    /// Returns `None` when `host` is itself a public suffix or has no registrable part.
    /// `host` is expected to be lowercase without a trailing dot.
    fn registrable_domain<'a>(&self, host: &'a str) -> Option<&'a str>;
}

/// [`SuffixLookup`] backed by the public suffix list compiled into the `psl` crate
#[derive(Clone, Copy, Debug, Default)]
pub struct PublicSuffixList;

impl SuffixLookup for PublicSuffixList {
    fn registrable_domain<'a>(&self, host: &'a str) -> Option<&'a str> {
        psl::domain_str(host)
    }
}

/// [`SuffixLookup`] over an explicit set of suffixes
///
/// Follows the list's implicit `*` rule: a host whose labels match no listed
/// suffix is treated as having a one-label suffix.
#[derive(Clone, Debug, Default)]
pub struct StaticSuffixList {
    suffixes: HashSet<String>,
}

impl StaticSuffixList {
    /// Build a table from suffixes such as `"com"` or `"co.uk"`
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Length in bytes of the longest listed suffix of `host`, label-aligned
    fn suffix_len(&self, host: &str) -> usize {
        let mut best = None;
        let mut rest = host;
        loop {
            if self.suffixes.contains(rest) {
                best = Some(rest.len());
                break;
            }
            match rest.find('.') {
                Some(idx) => rest = &rest[idx + 1..],
                None => break,
            }
        }
        // Implicit rule: the last label
        best.unwrap_or_else(|| host.rsplit('.').next().map_or(0, str::len))
    }
}

impl SuffixLookup for StaticSuffixList {
    fn registrable_domain<'a>(&self, host: &'a str) -> Option<&'a str> {
        if host.is_empty() || host.starts_with('.') || host.contains("..") {
            return None;
        }
        let suffix_len = self.suffix_len(host);
        if suffix_len >= host.len() {
            return None;
        }
        // Host minus suffix ends with the separating dot
        let head = &host[..host.len() - suffix_len - 1];
        let start = head.rfind('.').map_or(0, |idx| idx + 1);
        Some(&host[start..])
    }
}
