//! The retention sweeper.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{info, warn};

use super::model::RetentionPolicy;

/// Minimum interval between two sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of one sweep attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Retention is disabled or the interval since the last sweep has not
    /// elapsed; nothing was walked.
    Skipped,
    /// The store was walked; holds the number of records deleted.
    Swept(usize),
}

/// Walks the store and reclaims aged delivery records.
///
/// Owns the process-wide "last swept" timestamp; however often `sweep` is
/// invoked, at most one sweep runs per 24 hours. Runs concurrently with
/// ingestion — deletion races with concurrent removal are logged per file
/// and never abort the pass.
#[derive(Debug)]
pub struct RetentionSweeper {
    root: PathBuf,
    policy: RetentionPolicy,
    last_sweep: Mutex<Option<SystemTime>>,
}

impl RetentionSweeper {
    /// Creates a sweeper over the store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, policy: RetentionPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
            last_sweep: Mutex::new(None),
        }
    }

    /// Runs one sweep attempt.
    ///
    /// Returns [`SweepOutcome::Skipped`] without touching the store when the
    /// policy is disabled or a sweep already ran within the last 24 hours.
    pub async fn sweep(&self) -> SweepOutcome {
        let Some(max_age) = self.policy.max_age() else {
            return SweepOutcome::Skipped;
        };

        let now = SystemTime::now();
        {
            let mut last = self
                .last_sweep
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = *last
                && now.duration_since(previous).unwrap_or_default() < SWEEP_INTERVAL
            {
                return SweepOutcome::Skipped;
            }
            *last = Some(now);
        }

        info!("cleaning up records older than {max_age:?}");
        let deleted = sweep_tree(&self.root, max_age, now).await;
        info!("retention sweep finished, {deleted} record(s) deleted");
        SweepOutcome::Swept(deleted)
    }
}

/// Recursively walks `root`, deleting `.json` record files whose modified
/// age at `now` exceeds `max_age`. Returns the number of deletions.
///
/// Attachment blobs (and anything else without the `.json` suffix) are
/// never candidates. Per-file failures are logged and the walk continues.
async fn sweep_tree(root: &Path, max_age: Duration, now: SystemTime) -> usize {
    let mut deleted = 0;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read directory {}: {e}", dir.display());
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("cannot walk directory {}: {e}", dir.display());
                    break;
                }
            };

            let path = entry.path();
            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => pending.push(path),
                Ok(_) => {
                    if path.extension().is_some_and(|ext| ext == "json")
                        && is_older_than(&path, max_age, now).await
                    {
                        match fs::remove_file(&path).await {
                            Ok(()) => {
                                info!("deleted record {}", path.display());
                                deleted += 1;
                            }
                            Err(e) => warn!("failed to delete {}: {e}", path.display()),
                        }
                    }
                }
                Err(e) => warn!("cannot stat {}: {e}", path.display()),
            }
        }
    }

    deleted
}

/// Checks whether a file's last-modified age at `now` exceeds `max_age`.
///
/// Unreadable metadata counts as young: never delete on doubt.
async fn is_older_than(path: &Path, max_age: Duration, now: SystemTime) -> bool {
    let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            warn!("cannot read modification time of {}: {e}", path.display());
            return false;
        }
    };

    now.duration_since(modified).unwrap_or_default() > max_age
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

    /// A `now` far enough in the future that any freshly written file is
    /// over the seven-day threshold used below.
    fn ten_days_from_now() -> SystemTime {
        SystemTime::now() + Duration::from_secs(10 * 24 * 60 * 60)
    }

    #[tokio::test]
    async fn test_sweep_tree_deletes_aged_records() {
        let dir = tempfile::tempdir().unwrap();
        let rcpt = dir.path().join("someone@example.com");
        std::fs::create_dir_all(&rcpt).unwrap();
        std::fs::write(rcpt.join("1700000000000.json"), b"{}").unwrap();

        let max_age = Duration::from_secs(7 * 24 * 60 * 60);
        let deleted = sweep_tree(dir.path(), max_age, ten_days_from_now()).await;

        assert_eq!(deleted, 1);
        assert!(!rcpt.join("1700000000000.json").exists());
    }

    #[tokio::test]
    async fn test_sweep_tree_keeps_young_records() {
        let dir = tempfile::tempdir().unwrap();
        let rcpt = dir.path().join("someone@example.com");
        std::fs::create_dir_all(&rcpt).unwrap();
        std::fs::write(rcpt.join("1700000000000.json"), b"{}").unwrap();

        let max_age = Duration::from_secs(7 * 24 * 60 * 60);
        let deleted = sweep_tree(dir.path(), max_age, SystemTime::now()).await;

        assert_eq!(deleted, 0);
        assert!(rcpt.join("1700000000000.json").exists());
    }

    #[tokio::test]
    async fn test_sweep_tree_never_touches_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let attachments = dir.path().join("someone@example.com/attachments");
        std::fs::create_dir_all(&attachments).unwrap();
        std::fs::write(attachments.join("deadbeefpixel.png"), b"blob").unwrap();

        let deleted = sweep_tree(dir.path(), Duration::ZERO, ten_days_from_now()).await;

        assert_eq!(deleted, 0);
        assert!(attachments.join("deadbeefpixel.png").exists());
    }

    #[tokio::test]
    async fn test_sweep_skipped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = RetentionSweeper::new(dir.path(), RetentionPolicy::default());
        assert_eq!(sweeper.sweep().await, SweepOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_sweep_rate_limited_within_interval() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = RetentionSweeper::new(dir.path(), RetentionPolicy::days(7));

        assert!(matches!(sweeper.sweep().await, SweepOutcome::Swept(_)));
        assert_eq!(sweeper.sweep().await, SweepOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_sweep_survives_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created");
        let sweeper = RetentionSweeper::new(&missing, RetentionPolicy::days(1));
        assert_eq!(sweeper.sweep().await, SweepOutcome::Swept(0));
    }
}
