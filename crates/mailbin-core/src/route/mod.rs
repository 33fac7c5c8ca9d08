//! Recipient validation and domain routing.
//!
//! Each envelope recipient is screened independently: syntactically invalid
//! addresses are rejected outright, and valid ones are checked against the
//! configured domain allow-list. A rejected recipient is skipped and logged,
//! never retried; rejecting every recipient of a message is not an error.

mod model;
mod router;

pub use model::{DomainPolicy, RecipientVerdict};
pub use router::screen_recipient;
