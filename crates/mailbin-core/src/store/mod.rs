//! Per-recipient persistence.
//!
//! Each accepted recipient of a message gets one JSON delivery record under
//! `<root>/<recipient>/`, plus the message's attachment blobs under
//! `<root>/<recipient>/attachments/`. Records are written once and only ever
//! removed by the retention sweeper.

mod model;
mod repository;

pub use model::{AttachmentDetail, DeliveryRecord, ParsedPayload};
pub use repository::MessageStore;
