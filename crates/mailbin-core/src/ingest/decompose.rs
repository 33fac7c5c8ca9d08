//! Message decomposition.
//!
//! Walks the parsed MIME tree depth-first and classifies each leaf part as
//! plaintext body, HTML body, or attachment. Multipart containers are
//! traversal structure only and are never classified themselves.

use mailbin_mime::Message;

use super::identity::{self, payload_or_raw};
use super::model::ParsedMessage;
use crate::Result;

/// Decomposes a parsed message into body text, HTML, and attachments.
///
/// Classification per leaf:
/// - `text/plain` without a declared filename is body text;
/// - `text/plain` WITH a filename is an attachment;
/// - `text/html` is HTML body, irrespective of filename;
/// - everything else is an attachment.
///
/// Multiple body or HTML leaves concatenate in traversal order. Attachment
/// keys (`file0`, `file1`, ...) are strictly sequential in traversal order,
/// never derived from content.
///
/// Decomposition is best-effort at the part level: a payload whose declared
/// transfer encoding fails to decode is kept raw instead of failing the
/// message.
///
/// # Errors
///
/// Returns an error if a part declares an unparseable content type.
pub fn decompose(message: &Message) -> Result<ParsedMessage> {
    let mut body = String::new();
    let mut html = String::new();
    let mut attachments = Vec::new();

    for part in message.leaves() {
        let content_type = part.content_type()?;
        match content_type.essence().as_str() {
            "text/plain" if part.filename().is_none() => {
                body.push_str(&String::from_utf8_lossy(&payload_or_raw(part)));
            }
            "text/html" => {
                html.push_str(&String::from_utf8_lossy(&payload_or_raw(part)));
            }
            _ => {
                let key = format!("file{}", attachments.len());
                attachments.push(identity::identify(part, key));
            }
        }
    }

    Ok(ParsedMessage {
        subject: message.subject(),
        from: message.from(),
        body,
        html,
        attachments,
    })
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

    fn parse(raw: &str) -> Message {
        Message::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_single_plaintext_message() {
        let message = parse(concat!(
            "Subject: hi\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "just a body"
        ));
        let parsed = decompose(&message).unwrap();
        assert_eq!(parsed.subject.as_deref(), Some("hi"));
        assert_eq!(parsed.body, "just a body");
        assert!(parsed.html.is_empty());
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn test_text_plain_with_filename_is_attachment() {
        let message = parse(concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "real body\r\n",
            "--b\r\n",
            "Content-Type: text/plain; name=\"notes.txt\"\r\n",
            "Content-Disposition: attachment; filename=\"notes.txt\"\r\n",
            "\r\n",
            "attached text\r\n",
            "--b--\r\n"
        ));
        let parsed = decompose(&message).unwrap();
        assert_eq!(parsed.body, "real body");
        assert_eq!(parsed.attachments.len(), 1);
        assert_eq!(parsed.attachments[0].filename, "notes.txt");
        assert_eq!(parsed.attachments[0].content, b"attached text");
    }

    #[test]
    fn test_html_with_filename_stays_html() {
        let message = parse(concat!(
            "Content-Type: text/html; name=\"page.html\"\r\n",
            "Content-Disposition: attachment; filename=\"page.html\"\r\n",
            "\r\n",
            "<p>still html body</p>"
        ));
        let parsed = decompose(&message).unwrap();
        assert_eq!(parsed.html, "<p>still html body</p>");
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn test_multiple_text_parts_concatenate_in_order() {
        let message = parse(concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "first \r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "second\r\n",
            "--b--\r\n"
        ));
        let parsed = decompose(&message).unwrap();
        assert_eq!(parsed.body, "first second");
    }

    #[test]
    fn test_attachment_keys_sequential_in_traversal_order() {
        let message = parse(concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: image/png; name=\"a.png\"\r\n",
            "\r\n",
            "aaa\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "body\r\n",
            "--b\r\n",
            "Content-Type: image/gif; name=\"b.gif\"\r\n",
            "\r\n",
            "bbb\r\n",
            "--b\r\n",
            "Content-Type: application/zip; name=\"c.zip\"\r\n",
            "\r\n",
            "ccc\r\n",
            "--b--\r\n"
        ));
        let parsed = decompose(&message).unwrap();
        let keys: Vec<_> = parsed.attachments.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["file0", "file1", "file2"]);
        let names: Vec<_> = parsed
            .attachments
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.png", "b.gif", "c.zip"]);
    }

    #[test]
    fn test_corrupt_attachment_payload_does_not_fail_the_message() {
        let message = parse(concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "still the body\r\n",
            "--b\r\n",
            "Content-Type: image/png; name=\"broken.png\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "!!!not-base64!!!\r\n",
            "--b--\r\n"
        ));
        let parsed = decompose(&message).unwrap();
        assert_eq!(parsed.body, "still the body");
        assert_eq!(parsed.attachments.len(), 1);
        assert_eq!(parsed.attachments[0].content, b"!!!not-base64!!!");
    }

    #[test]
    fn test_nested_multipart_classification() {
        let message = parse(concat!(
            "Content-Type: multipart/mixed; boundary=outer\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=inner\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<b>html</b>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: image/png; name=\"i.png\"\r\n",
            "\r\n",
            "img\r\n",
            "--outer--\r\n"
        ));
        let parsed = decompose(&message).unwrap();
        assert_eq!(parsed.body, "plain");
        assert_eq!(parsed.html, "<b>html</b>");
        assert_eq!(parsed.attachments.len(), 1);
        assert_eq!(parsed.attachments[0].key, "file0");
    }
}
