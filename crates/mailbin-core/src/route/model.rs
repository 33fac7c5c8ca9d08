//! Routing data models.

/// The verdict for one envelope recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientVerdict {
    /// Recipient is accepted for delivery.
    Accept,
    /// Address fails syntactic validation; skipped entirely.
    RejectMalformed,
    /// Address is valid but its domain is not allow-listed.
    RejectDomain,
}

impl RecipientVerdict {
    /// Check if this verdict accepts the recipient.
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// The domain allow-list controlling which recipient domains are accepted.
///
/// Patterns are either exact domains (`example.com`) or wildcard suffixes
/// (`*.example.com`). With `discard_unknown` disabled the policy accepts
/// every well-formed address regardless of domain.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    patterns: Vec<String>,
    discard_unknown: bool,
}

impl DomainPolicy {
    /// Creates a policy from domain patterns and the discard flag.
    ///
    /// Patterns are lowercased; recipients are compared lowercased as well.
    #[must_use]
    pub fn new(patterns: Vec<String>, discard_unknown: bool) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
            discard_unknown,
        }
    }

    /// Whether unmatched domains are discarded.
    #[must_use]
    pub const fn discard_unknown(&self) -> bool {
        self.discard_unknown
    }

    /// Checks a (lowercased) domain against the pattern set.
    ///
    /// A pattern containing `*` matches as a suffix with the marker removed;
    /// any other pattern must match exactly.
    #[must_use]
    pub fn matches(&self, domain: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            if pattern.contains('*') {
                domain.ends_with(&pattern.replace('*', ""))
            } else {
                domain == pattern
            }
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let policy = DomainPolicy::new(vec!["example.com".to_string()], true);
        assert!(policy.matches("example.com"));
        assert!(!policy.matches("other.com"));
        assert!(!policy.matches("sub.example.com"));
    }

    #[test]
    fn test_wildcard_suffix_match() {
        let policy = DomainPolicy::new(vec!["*.example.com".to_string()], true);
        assert!(policy.matches("mail.example.com"));
        assert!(policy.matches("a.b.example.com"));
        assert!(!policy.matches("example.org"));
    }

    #[test]
    fn test_wildcard_tld() {
        let policy = DomainPolicy::new(vec!["*.com".to_string()], true);
        assert!(policy.matches("b.com"));
        assert!(!policy.matches("b.org"));
    }

    #[test]
    fn test_patterns_lowercased() {
        let policy = DomainPolicy::new(vec!["Example.COM".to_string()], true);
        assert!(policy.matches("example.com"));
    }
}
