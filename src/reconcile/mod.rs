//! Set reconciliation of deny, allow and secure domain lists.
//!
//! Given the three normalized lists of a run, produces the published sets:
//! 1. deny entries sharing an eTLD+1 with any secure entry are removed
//! 2. deny entries literally present in the declared allow list are removed
//! 3. allow becomes the union of the declared allow list and the secure list
//!
//! Both outputs are deduplicated and sorted ascending; the order is part of the
//! published format so that consecutive runs diff cleanly.

mod suffix;

pub use suffix::{PublicSuffixList, StaticSuffixList, SuffixLookup};

use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Why an eTLD+1 could not be derived
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Etld1Error {
    /// Nothing left after removing the trailing dot
    #[error("empty domain")]
    Empty,

    /// A label between dots is empty (`a..com`, `.a.com`)
    #[error("empty label in {0}")]
    EmptyLabel(String),

    /// The domain is a public suffix, a single label, or malformed
    #[error("no registrable domain in {0}")]
    NoRegistrableDomain(String),
}

/// Final deny and allow sets of a run, each sorted ascending and free of duplicates
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainSets {
    /// Domains to block
    pub deny: Vec<String>,
    /// Domains to always permit
    pub allow: Vec<String>,
}

/// Registrable domain of `domain`, ignoring one trailing dot
pub fn effective_tld_plus_one<'a>(
    suffixes: &dyn SuffixLookup,
    domain: &'a str,
) -> Result<&'a str, Etld1Error> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain.is_empty() {
        return Err(Etld1Error::Empty);
    }
    if domain.split('.').any(str::is_empty) {
        return Err(Etld1Error::EmptyLabel(domain.to_string()));
    }
    suffixes
        .registrable_domain(domain)
        .ok_or_else(|| Etld1Error::NoRegistrableDomain(domain.to_string()))
}

/// Key used to compare a domain against the secure list
///
/// Falls back to the domain itself when no eTLD+1 can be derived.
pub fn comparison_key<'a>(suffixes: &dyn SuffixLookup, domain: &'a str) -> &'a str {
    effective_tld_plus_one(suffixes, domain).unwrap_or(domain)
}

/// Drop every deny entry whose eTLD+1 matches the eTLD+1 of a secure entry
///
/// `evil.freemail.com` is dropped when `freemail.com` is secure. Order of the
/// surviving entries is preserved.
pub fn remove_secure_domains_by_etld1(
    deny: Vec<String>,
    secure: &[String],
    suffixes: &dyn SuffixLookup,
) -> Vec<String> {
    let secure_keys: HashSet<&str> = secure
        .iter()
        .map(|domain| comparison_key(suffixes, domain))
        .collect();

    deny.into_iter()
        .filter(|domain| !secure_keys.contains(comparison_key(suffixes, domain)))
        .collect()
}

/// Deduplicate, drop empty entries, and sort ascending
pub fn unique_sorted<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    entries
        .into_iter()
        .filter(|entry| !entry.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Entries of `a` not present in `b` (exact string comparison), keeping `a`'s order
pub fn difference(a: Vec<String>, b: &[String]) -> Vec<String> {
    let exclude: HashSet<&str> = b.iter().map(String::as_str).collect();
    a.into_iter()
        .filter(|entry| !exclude.contains(entry.as_str()))
        .collect()
}

/// Compute the published deny and allow sets from normalized lists
pub fn reconcile(
    deny: Vec<String>,
    allow: Vec<String>,
    secure: Vec<String>,
    suffixes: &dyn SuffixLookup,
) -> DomainSets {
    let deny = remove_secure_domains_by_etld1(deny, &secure, suffixes);
    let allow = unique_sorted(allow);
    let deny = difference(unique_sorted(deny), &allow);
    let allow = unique_sorted(allow.into_iter().chain(secure));

    DomainSets { deny, allow }
}
