//! Attachment identity assignment.
//!
//! Derives `(filename, payload, cid, fid)` for one MIME leaf part. Pure
//! functions of the part; no side effects beyond a debug log line.

use mailbin_mime::{Body, Part};
use tracing::{debug, warn};

use super::model::Attachment;

/// Placeholder filename for parts that declare none.
const UNTITLED: &str = "untitled";

/// Builds an [`Attachment`] from one leaf part.
///
/// The cid precedence is fixed: an explicit `Content-ID` (angle brackets
/// stripped) wins over an explicit `X-Attachment-Id`, which wins over an
/// md5 of the decoded payload. Explicit ids always take priority over the
/// derived fallback.
///
/// A payload whose declared transfer encoding fails to decode is kept in
/// its raw form rather than dropped; see [`payload_or_raw`].
#[must_use]
pub fn identify(part: &Part, key: String) -> Attachment {
    let filename = part.filename().unwrap_or_else(|| UNTITLED.to_string());
    let content = payload_or_raw(part);
    let cid = content_id(part, &content);
    let fid = file_id(&filename);

    debug!(
        "handling attachment \"{filename}\" (id: \"{fid}\") of type \"{}\" with cid \"{cid}\"",
        part.content_type().map_or_else(|_| "?".to_string(), |ct| ct.essence()),
    );

    Attachment {
        key,
        filename,
        content,
        cid,
        fid,
    }
}

/// Decoded payload of a leaf part, keeping the raw bytes when the declared
/// transfer encoding turns out to be corrupt. One bad payload never fails
/// the message it arrived in.
pub(super) fn payload_or_raw(part: &Part) -> Vec<u8> {
    match part.decode_body() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("payload decoding failed, keeping raw bytes: {e}");
            match &part.body {
                Body::Leaf(bytes) => bytes.clone(),
                Body::Multipart(_) => Vec::new(),
            }
        }
    }
}

/// Resolves the content id for a part, falling back to a payload hash.
fn content_id(part: &Part, payload: &[u8]) -> String {
    if let Some(value) = part.headers.get("content-id") {
        return value
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_string();
    }
    if let Some(value) = part.headers.get("x-attachment-id") {
        return value.to_string();
    }
    format!("{:x}", md5::compute(payload))
}

/// Derives the storage key for a filename: md5 hex prefixed to the
/// filename itself, human-diagnosable yet collision-resistant per
/// distinct filename.
fn file_id(filename: &str) -> String {
    format!("{:x}{filename}", md5::compute(filename.as_bytes()))
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
    use mailbin_mime::{Body, Headers, Part};

    use super::*;

    fn part_with(headers: &[(&str, &str)], body: &[u8]) -> Part {
        let mut h = Headers::new();
        for (name, value) in headers {
            h.add(*name, *value);
        }
        Part::new(h, Body::Leaf(body.to_vec()))
    }

    #[test]
    fn test_content_id_precedence_over_x_attachment_id() {
        let part = part_with(
            &[
                ("Content-ID", "<abc>"),
                ("X-Attachment-Id", "other"),
                ("Content-Type", "image/png"),
            ],
            b"bytes",
        );
        let attachment = identify(&part, "file0".to_string());
        assert_eq!(attachment.cid, "abc");
    }

    #[test]
    fn test_x_attachment_id_fallback() {
        let part = part_with(
            &[("X-Attachment-Id", "xid-1"), ("Content-Type", "image/png")],
            b"bytes",
        );
        let attachment = identify(&part, "file0".to_string());
        assert_eq!(attachment.cid, "xid-1");
    }

    #[test]
    fn test_payload_hash_fallback() {
        let part = part_with(&[("Content-Type", "image/png")], b"bytes");
        let attachment = identify(&part, "file0".to_string());
        assert_eq!(attachment.cid, format!("{:x}", md5::compute(b"bytes")));
    }

    #[test]
    fn test_untitled_filename_default() {
        let part = part_with(&[("Content-Type", "application/octet-stream")], b"x");
        let attachment = identify(&part, "file0".to_string());
        assert_eq!(attachment.filename, "untitled");
        assert!(attachment.fid.ends_with("untitled"));
    }

    #[test]
    fn test_fid_is_hash_prefixed_filename() {
        let part = part_with(
            &[("Content-Type", "application/pdf; name=\"doc.pdf\"")],
            b"%PDF",
        );
        let attachment = identify(&part, "file0".to_string());
        let expected = format!("{:x}doc.pdf", md5::compute(b"doc.pdf"));
        assert_eq!(attachment.fid, expected);
    }

    #[test]
    fn test_fid_stable_for_identical_filenames() {
        let a = part_with(&[("Content-Type", "image/png; name=\"p.png\"")], b"one");
        let b = part_with(&[("Content-Type", "image/png; name=\"p.png\"")], b"two");
        let fid_a = identify(&a, "file0".to_string()).fid;
        let fid_b = identify(&b, "file1".to_string()).fid;
        assert_eq!(fid_a, fid_b);
    }

    #[test]
    fn test_base64_payload_decoded_before_hashing() {
        let part = part_with(
            &[
                ("Content-Type", "image/png"),
                ("Content-Transfer-Encoding", "base64"),
            ],
            b"Ynl0ZXM=", // "bytes"
        );
        let attachment = identify(&part, "file0".to_string());
        assert_eq!(attachment.content, b"bytes");
        assert_eq!(attachment.cid, format!("{:x}", md5::compute(b"bytes")));
    }

    #[test]
    fn test_corrupt_base64_payload_kept_raw() {
        let part = part_with(
            &[
                ("Content-Type", "image/png"),
                ("Content-Transfer-Encoding", "base64"),
            ],
            b"!!!not-base64!!!",
        );
        let attachment = identify(&part, "file0".to_string());
        assert_eq!(attachment.content, b"!!!not-base64!!!");
        assert_eq!(
            attachment.cid,
            format!("{:x}", md5::compute(b"!!!not-base64!!!"))
        );
    }
}
