//! Time-based record retention.
//!
//! An independent sweep walks the store and deletes delivery records older
//! than the configured day threshold. The sweep runs concurrently with
//! ingestion and is rate-limited to once per 24 hours no matter how often
//! it is triggered. Attachment blobs are never swept by this pass — only
//! `.json` record files are candidates; the asymmetry is intentional.

mod model;
mod sweeper;

pub use model::RetentionPolicy;
pub use sweeper::{RetentionSweeper, SweepOutcome};
