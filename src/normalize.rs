//! Domain string normalization
//!
//! Two passes, applied in order to every list (deny, allow, secure):
//! 1. [`normalize_and_filter`]: trim, lowercase, drop blanks and `#` comments
//! 2. [`strip_wildcard_prefix`]: remove one leading `*.`, then one leading `.`

/// Trim and lowercase each entry, dropping blank lines and `#` comments
pub fn normalize_and_filter<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref().trim().to_lowercase();
            if entry.is_empty() || entry.starts_with('#') {
                None
            } else {
                Some(entry)
            }
        })
        .collect()
}

/// Remove a leading `*.` and then a leading `.` from each entry
///
/// Each prefix is removed at most once: `*..a.com` becomes `a.com`, while
/// `*.*.a.com` becomes `*.a.com` and `..b.com` becomes `.b.com`.
pub fn strip_wildcard_prefix(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| {
            let rest = entry.strip_prefix("*.").unwrap_or(entry.as_str());
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            if rest.len() == entry.len() {
                entry
            } else {
                rest.to_string()
            }
        })
        .collect()
}

/// Both normalization passes
pub fn normalize_domains<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strip_wildcard_prefix(normalize_and_filter(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_trims_lowercases_and_drops_comments() {
        let out = normalize_and_filter(["  Example.COM ", "#comment", "", "   ", "Trusted.org"]);
        assert_eq!(out, vec!["example.com", "trusted.org"]);
    }

    #[test]
    fn comment_detected_after_trimming() {
        assert!(normalize_and_filter(["   # indented comment"]).is_empty());
    }

    #[test]
    fn wildcard_takes_priority_over_dot() {
        let out = strip_wildcard_prefix(vec![
            "*.spam.io".to_string(),
            ".tracker.net".to_string(),
            "plain.org".to_string(),
        ]);
        assert_eq!(out, vec!["spam.io", "tracker.net", "plain.org"]);
    }

    #[test]
    fn dot_after_wildcard_is_also_stripped() {
        let out = normalize_domains(["*..a.com", "*.b.com", ".c.com"]);
        assert_eq!(out, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn prefix_is_stripped_only_once() {
        let out = strip_wildcard_prefix(vec!["*.*.a.com".to_string(), "..b.com".to_string()]);
        assert_eq!(out, vec!["*.a.com", ".b.com"]);
    }

    #[test]
    fn star_without_dot_is_untouched() {
        let out = strip_wildcard_prefix(vec!["*a.com".to_string()]);
        assert_eq!(out, vec!["*a.com"]);
    }

    #[test]
    fn combined_passes() {
        let out = normalize_domains([" *.Mail.Example.COM", "\t.Other.NET\r", "#x", ""]);
        assert_eq!(out, vec!["mail.example.com", "other.net"]);
        for domain in &out {
            assert_eq!(domain, &domain.to_lowercase());
            assert!(!domain.starts_with("*.") && !domain.starts_with('.'));
        }
    }

    #[test]
    fn bare_wildcard_becomes_empty() {
        // Left for unique_sorted to discard
        assert_eq!(normalize_domains(["*."]), vec![""]);
    }
}
