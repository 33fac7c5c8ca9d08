//! Persisted record structures.
//!
//! Field names here are the on-disk JSON contract consumed by the external
//! read path; renaming any of them breaks stored data compatibility.

use serde::Serialize;

/// Descriptor for one stored attachment, embedded in the record.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentDetail {
    /// Declared filename (or the `untitled` placeholder).
    pub filename: String,
    /// Content id correlating inline HTML references.
    pub cid: String,
    /// Storage key; the attachment blob's on-disk filename.
    pub id: String,
    /// Download reference: `<base url>/api/attachment/<recipient>/<id>`.
    pub download_url: String,
    /// Payload size in bytes.
    pub size: usize,
}

/// Parsed portion of a delivery record.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedPayload {
    /// Decoded Subject header.
    pub subject: Option<String>,
    /// Plaintext body.
    pub body: String,
    /// HTML body with `cid:` references rewritten for this recipient.
    pub htmlbody: String,
    /// Decoded From header.
    pub from: Option<String>,
    /// Storage keys of this message's attachments, in traversal order.
    pub attachments: Vec<String>,
    /// Full attachment descriptors, in the same order.
    pub attachments_details: Vec<AttachmentDetail>,
}

/// One persisted (message, accepted-recipient) delivery.
///
/// Created at persistence time, written once, deleted only by the retention
/// sweeper. Never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRecord {
    /// IP address of the submitting peer.
    pub sender_ip: String,
    /// Decoded From header of the message.
    pub from: Option<String>,
    /// Every recipient of the original envelope, accepted or not.
    pub rcpts: Vec<String>,
    /// Raw message text as received.
    pub raw: String,
    /// Parsed content with per-recipient rewritten HTML.
    pub parsed: ParsedPayload,
}
