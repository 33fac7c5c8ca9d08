//! The message-ingestion pipeline.
//!
//! The external mail transport hands one [`Envelope`] per received message
//! to [`Pipeline::ingest`], which decomposes the MIME content, screens the
//! recipients, and persists one delivery per accepted recipient. The return
//! value is the transport-facing status string, not a structured error: the
//! transport sees one uniform verdict per envelope even when persistence
//! failed for some recipients (those failures are logged per recipient).
//!
//! Envelopes may be ingested concurrently; the pipeline holds no mutable
//! state beyond the filesystem store.

mod decompose;
mod identity;
mod model;
mod rewrite;

use chrono::Utc;
use mailbin_mime::Message;
use tracing::{debug, error};

pub use decompose::decompose;
pub use model::{Attachment, Envelope, ParsedMessage};
pub use rewrite::rewrite_cid_references;

use crate::config::Config;
use crate::route::{DomainPolicy, screen_recipient};
use crate::store::MessageStore;

/// Transport status for an accepted envelope.
pub const STATUS_OK: &str = "250 OK";

/// Transport status when the raw message cannot be parsed at all.
pub const STATUS_UNPARSEABLE: &str = "554 5.6.0 message content rejected";

/// The ingestion pipeline: one instance serves all envelopes.
#[derive(Debug)]
pub struct Pipeline {
    store: MessageStore,
    policy: DomainPolicy,
}

impl Pipeline {
    /// Creates a pipeline persisting to `store_root` under the given
    /// configuration.
    #[must_use]
    pub fn new(config: &Config, store_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            store: MessageStore::new(store_root, config.url.clone()),
            policy: config.domain_policy(),
        }
    }

    /// Ingests one envelope and returns the transport-facing status string.
    ///
    /// Recipient-level faults (malformed address, rejected domain, failed
    /// persistence) skip that recipient and continue with the rest; the
    /// envelope still reports acceptance. A message accepted for zero
    /// recipients produces no stored artifacts and is not an error.
    pub async fn ingest(&self, envelope: &Envelope) -> String {
        debug!("receiving message from {}", envelope.peer);
        debug!("message addressed from {}", envelope.mail_from);
        debug!("message addressed to {:?}", envelope.rcpt_tos);

        // Millisecond ingestion timestamp; record filename and the base of
        // rewritten inline-reference paths.
        let filename_base = Utc::now().timestamp_millis().to_string();

        let message = match Message::parse(&envelope.content) {
            Ok(message) => message,
            Err(e) => {
                error!("failed to parse message from {}: {e}", envelope.peer);
                return STATUS_UNPARSEABLE.to_string();
            }
        };

        let parsed = match decompose(&message) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("failed to decompose message from {}: {e}", envelope.peer);
                return STATUS_UNPARSEABLE.to_string();
            }
        };

        for recipient in &envelope.rcpt_tos {
            let recipient = recipient.to_lowercase();
            if !screen_recipient(&recipient, &self.policy).is_accept() {
                continue; // rejection already logged by the router
            }

            let htmlbody = rewrite_cid_references(
                &parsed.html,
                &parsed.attachments,
                &filename_base,
                &recipient,
            );

            if let Err(e) = self
                .store
                .deliver(&recipient, envelope, &parsed, htmlbody, &filename_base)
                .await
            {
                // One recipient's storage fault never fails the others.
                error!("failed to persist message for {recipient}: {e}");
            }
        }

        STATUS_OK.to_string()
    }
}
