//! Ingestion data models.

use std::net::SocketAddr;

/// One inbound message as handed off by the external mail transport.
///
/// Immutable once received; the pipeline never mutates it.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Address of the peer that submitted the message.
    pub peer: SocketAddr,
    /// Envelope sender (`MAIL FROM`).
    pub mail_from: String,
    /// Envelope recipients (`RCPT TO`) in submission order.
    pub rcpt_tos: Vec<String>,
    /// Raw message bytes as received.
    pub content: Vec<u8>,
}

/// Recipient-independent decomposition of one message.
///
/// The HTML body here is pre-rewrite; `cid:` references are rewritten per
/// recipient at persistence time because the recipient address is embedded
/// in the replacement path.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// Decoded Subject header, if present.
    pub subject: Option<String>,
    /// Decoded From header, if present.
    pub from: Option<String>,
    /// Plaintext body, concatenated over all body-text parts in order.
    pub body: String,
    /// HTML body, concatenated over all HTML parts in order.
    pub html: String,
    /// Attachments in MIME traversal order.
    pub attachments: Vec<Attachment>,
}

/// One non-body part extracted from a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Synthetic per-message key (`file0`, `file1`, ...), strictly
    /// sequential in traversal order.
    pub key: String,
    /// Declared filename, or `untitled` when the part declares none.
    pub filename: String,
    /// Decoded payload bytes.
    pub content: Vec<u8>,
    /// Content id correlating inline `cid:` HTML references to this part.
    pub cid: String,
    /// Storage key: md5 of the filename prefixed to the filename itself.
    ///
    /// Stable for identical filenames within one message so inline
    /// references and stored files can be joined, but NOT unique across
    /// distinct payloads sharing a filename: the last write wins on disk.
    pub fid: String,
}
