//! Recipient screening.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::model::{DomainPolicy, RecipientVerdict};

/// Basic `local@domain.tld` shape; anything else is malformed.
#[allow(clippy::expect_used)]
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[a-zA-Z0-9]+$").expect("address pattern is a valid regex")
});

/// Screens one recipient address against the domain policy.
///
/// The address must already be lowercased; patterns are compared lowercased.
/// Rejections are logged here so callers only need to skip the recipient.
#[must_use]
pub fn screen_recipient(address: &str, policy: &DomainPolicy) -> RecipientVerdict {
    if !ADDRESS_PATTERN.is_match(address) {
        warn!("invalid recipient: {address}");
        return RecipientVerdict::RejectMalformed;
    }

    // The pattern guarantees exactly one '@' with a non-empty domain.
    let Some((_, domain)) = address.split_once('@') else {
        warn!("invalid recipient: {address}");
        return RecipientVerdict::RejectMalformed;
    };

    if policy.discard_unknown() && !policy.matches(domain) {
        info!("discarding email for unknown domain: {domain}");
        return RecipientVerdict::RejectDomain;
    }

    RecipientVerdict::Accept
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

    fn policy(patterns: &[&str], discard_unknown: bool) -> DomainPolicy {
        DomainPolicy::new(
            patterns.iter().map(ToString::to_string).collect(),
            discard_unknown,
        )
    }

    #[test]
    fn test_accept_wildcard_domain() {
        let policy = policy(&["*.com"], true);
        assert_eq!(
            screen_recipient("a@b.com", &policy),
            RecipientVerdict::Accept
        );
    }

    #[test]
    fn test_reject_malformed() {
        let policy = policy(&["example.com"], true);
        assert_eq!(
            screen_recipient("not-an-address", &policy),
            RecipientVerdict::RejectMalformed
        );
        assert_eq!(
            screen_recipient("no domain@x.com", &policy),
            RecipientVerdict::RejectMalformed
        );
        assert_eq!(
            screen_recipient("user@notld", &policy),
            RecipientVerdict::RejectMalformed
        );
    }

    #[test]
    fn test_reject_unknown_domain_when_discarding() {
        let policy = policy(&["example.com"], true);
        assert_eq!(
            screen_recipient("a@evil.org", &policy),
            RecipientVerdict::RejectDomain
        );
    }

    #[test]
    fn test_accept_unknown_domain_when_not_discarding() {
        let policy = policy(&["example.com"], false);
        assert_eq!(
            screen_recipient("a@evil.org", &policy),
            RecipientVerdict::Accept
        );
    }

    #[test]
    fn test_accept_exact_domain() {
        let policy = policy(&["example.com"], true);
        assert_eq!(
            screen_recipient("someone@example.com", &policy),
            RecipientVerdict::Accept
        );
    }

    #[test]
    fn test_empty_policy_accepts_everything_wellformed() {
        let policy = policy(&[], false);
        assert_eq!(
            screen_recipient("a@b.co", &policy),
            RecipientVerdict::Accept
        );
    }
}
