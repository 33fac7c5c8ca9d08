//! Retention policy model.

use std::time::Duration;

use serde::Deserialize;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Retention policy for stored delivery records.
///
/// Disabled by default; when enabled, records whose last-modified age
/// exceeds the day threshold are deleted by the sweeper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetentionPolicy {
    /// Whether the sweep runs at all.
    #[serde(default)]
    pub enabled: bool,

    /// Age threshold in days for record deletion.
    #[serde(default)]
    pub delete_older_than_days: u64,
}

impl RetentionPolicy {
    /// Creates an enabled policy with the given day threshold.
    #[must_use]
    pub const fn days(days: u64) -> Self {
        Self {
            enabled: true,
            delete_older_than_days: days,
        }
    }

    /// The maximum record age, or `None` when retention is disabled.
    #[must_use]
    pub const fn max_age(&self) -> Option<Duration> {
        if self.enabled {
            Some(Duration::from_secs(
                self.delete_older_than_days * SECONDS_PER_DAY,
            ))
        } else {
            None
        }
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
    fn test_disabled_policy_has_no_max_age() {
        let policy = RetentionPolicy::default();
        assert!(policy.max_age().is_none());
    }

    #[test]
    fn test_enabled_policy_max_age() {
        let policy = RetentionPolicy::days(7);
        assert_eq!(
            policy.max_age().unwrap(),
            Duration::from_secs(7 * SECONDS_PER_DAY)
        );
    }
}
