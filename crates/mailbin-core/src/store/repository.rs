//! Filesystem message store.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::model::{AttachmentDetail, DeliveryRecord, ParsedPayload};
use crate::Result;
use crate::ingest::{Envelope, ParsedMessage};

/// Subdirectory holding attachment blobs within a recipient directory.
const ATTACHMENTS_DIR: &str = "attachments";

/// Per-recipient filesystem store.
///
/// Layout: `<root>/<recipient>/<millis>.json` records and
/// `<root>/<recipient>/attachments/<fid>` blobs. Directories are created on
/// demand; concurrent first-time deliveries to the same recipient are safe
/// because "already exists" is success.
#[derive(Debug, Clone)]
pub struct MessageStore {
    root: PathBuf,
    base_url: String,
}

impl MessageStore {
    /// Creates a store rooted at `root`, embedding `base_url` in download
    /// references.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// The store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persists one delivery: attachment blobs first, then the JSON record.
    ///
    /// The record filename is the millisecond ingestion timestamp
    /// (`filename_base`), chronological and mostly unique per recipient; two
    /// messages in the same millisecond for one recipient overwrite each
    /// other's record. Attachment blobs are keyed by fid alone, so identical
    /// filenames overwrite previous content, within and across messages.
    /// Both are accepted limitations of the storage contract.
    ///
    /// A crash between the attachment writes and the record write can leave
    /// orphaned blobs; the record is never written before its attachments.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or file cannot be created or written.
    /// The caller decides whether other recipients still proceed.
    pub async fn deliver(
        &self,
        recipient: &str,
        envelope: &Envelope,
        parsed: &ParsedMessage,
        htmlbody: String,
        filename_base: &str,
    ) -> Result<()> {
        let recipient_dir = self.root.join(recipient);
        fs::create_dir_all(&recipient_dir).await?;

        let mut attachment_ids = Vec::with_capacity(parsed.attachments.len());
        let mut attachment_details = Vec::with_capacity(parsed.attachments.len());

        if !parsed.attachments.is_empty() {
            let attachments_dir = recipient_dir.join(ATTACHMENTS_DIR);
            fs::create_dir_all(&attachments_dir).await?;

            for attachment in &parsed.attachments {
                fs::write(attachments_dir.join(&attachment.fid), &attachment.content).await?;
                attachment_ids.push(attachment.fid.clone());
                attachment_details.push(AttachmentDetail {
                    filename: attachment.filename.clone(),
                    cid: attachment.cid.clone(),
                    id: attachment.fid.clone(),
                    download_url: format!(
                        "{}/api/attachment/{recipient}/{}",
                        self.base_url, attachment.fid
                    ),
                    size: attachment.content.len(),
                });
            }
        }

        let record = DeliveryRecord {
            sender_ip: envelope.peer.ip().to_string(),
            from: parsed.from.clone(),
            rcpts: envelope.rcpt_tos.clone(),
            raw: String::from_utf8_lossy(&envelope.content).into_owned(),
            parsed: ParsedPayload {
                subject: parsed.subject.clone(),
                body: parsed.body.clone(),
                htmlbody,
                from: parsed.from.clone(),
                attachments: attachment_ids,
                attachments_details: attachment_details,
            },
        };

        let record_path = recipient_dir.join(format!("{filename_base}.json"));
        fs::write(&record_path, serde_json::to_vec(&record)?).await?;
        debug!("stored record {}", record_path.display());

        Ok(())
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
    use std::net::SocketAddr;
    use std::sync::Arc;

    use super::*;
    use crate::ingest::Attachment;

    fn envelope(rcpts: &[&str]) -> Envelope {
        let peer: SocketAddr = "192.0.2.7:41000".parse().unwrap();
        Envelope {
            peer,
            mail_from: "sender@example.com".to_string(),
            rcpt_tos: rcpts.iter().map(ToString::to_string).collect(),
            content: b"raw message bytes".to_vec(),
        }
    }

    fn parsed_with_attachment() -> ParsedMessage {
        ParsedMessage {
            subject: Some("subject".to_string()),
            from: Some("Sender <sender@example.com>".to_string()),
            body: "plain body".to_string(),
            html: "<p>html</p>".to_string(),
            attachments: vec![Attachment {
                key: "file0".to_string(),
                filename: "pixel.png".to_string(),
                content: b"pngbytes".to_vec(),
                cid: "img1".to_string(),
                fid: "deadbeefpixel.png".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_deliver_writes_record_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(dir.path(), "https://mail.example.com");
        let envelope = envelope(&["rcpt@example.com"]);
        let parsed = parsed_with_attachment();

        store
            .deliver(
                "rcpt@example.com",
                &envelope,
                &parsed,
                "<p>html</p>".to_string(),
                "1700000000000",
            )
            .await
            .unwrap();

        let record_path = dir.path().join("rcpt@example.com/1700000000000.json");
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&record_path).unwrap()).unwrap();

        assert_eq!(json["sender_ip"], "192.0.2.7");
        assert_eq!(json["rcpts"][0], "rcpt@example.com");
        assert_eq!(json["raw"], "raw message bytes");
        assert_eq!(json["parsed"]["subject"], "subject");
        assert_eq!(json["parsed"]["body"], "plain body");
        assert_eq!(json["parsed"]["attachments"][0], "deadbeefpixel.png");

        let detail = &json["parsed"]["attachments_details"][0];
        assert_eq!(detail["filename"], "pixel.png");
        assert_eq!(detail["cid"], "img1");
        assert_eq!(detail["id"], "deadbeefpixel.png");
        assert_eq!(detail["size"], 8);
        assert_eq!(
            detail["download_url"],
            "https://mail.example.com/api/attachment/rcpt@example.com/deadbeefpixel.png"
        );

        let blob = std::fs::read(
            dir.path()
                .join("rcpt@example.com/attachments/deadbeefpixel.png"),
        )
        .unwrap();
        assert_eq!(blob, b"pngbytes");
    }

    #[tokio::test]
    async fn test_deliver_without_attachments_creates_no_attachments_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(dir.path(), "");
        let envelope = envelope(&["rcpt@example.com"]);
        let parsed = ParsedMessage {
            subject: None,
            from: None,
            body: "body".to_string(),
            html: String::new(),
            attachments: Vec::new(),
        };

        store
            .deliver(
                "rcpt@example.com",
                &envelope,
                &parsed,
                String::new(),
                "1700000000001",
            )
            .await
            .unwrap();

        assert!(
            dir.path()
                .join("rcpt@example.com/1700000000001.json")
                .exists()
        );
        assert!(!dir.path().join("rcpt@example.com/attachments").exists());
    }

    #[tokio::test]
    async fn test_concurrent_first_deliveries_to_new_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MessageStore::new(dir.path(), ""));
        let parsed = Arc::new(parsed_with_attachment());

        let mut handles = Vec::new();
        for i in 0..2 {
            let store = Arc::clone(&store);
            let parsed = Arc::clone(&parsed);
            handles.push(tokio::spawn(async move {
                let envelope = envelope(&["fresh@example.com"]);
                store
                    .deliver(
                        "fresh@example.com",
                        &envelope,
                        &parsed,
                        String::new(),
                        &format!("170000000000{i}"),
                    )
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(dir.path().join("fresh@example.com/1700000000000.json").exists());
        assert!(dir.path().join("fresh@example.com/1700000000001.json").exists());
    }
}
