//! Inline `cid:` reference rewriting.

use super::model::Attachment;

/// Rewrites inline image references in an HTML body for one recipient.
///
/// Every `cid:<cid>` reference is replaced with the download path
/// `/api/attachment/<recipient>/<filename_base>-<filename>`. The recipient
/// address is embedded in the path, so the rewrite is re-derived for each
/// recipient. Attachments whose cid appears nowhere in the HTML match
/// nothing and cause no substitution. An empty cid (a bare `Content-ID: <>`
/// header) is skipped: its reference `cid:` would prefix-match every inline
/// reference in the document.
///
/// Idempotent per recipient: replacement paths never contain a `cid:`
/// prefix, so rewriting twice yields the same output.
#[must_use]
pub fn rewrite_cid_references(
    html: &str,
    attachments: &[Attachment],
    filename_base: &str,
    recipient: &str,
) -> String {
    let mut html = html.to_string();
    for attachment in attachments {
        if attachment.cid.is_empty() {
            continue;
        }
        let reference = format!("cid:{}", attachment.cid);
        let target = format!(
            "/api/attachment/{recipient}/{filename_base}-{}",
            attachment.filename
        );
        html = html.replace(&reference, &target);
    }
    html
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

    fn attachment(filename: &str, cid: &str) -> Attachment {
        Attachment {
            key: "file0".to_string(),
            filename: filename.to_string(),
            content: Vec::new(),
            cid: cid.to_string(),
            fid: format!("hash-{filename}"),
        }
    }

    #[test]
    fn test_rewrite_single_reference() {
        let html = "<img src=\"cid:img1\">";
        let rewritten = rewrite_cid_references(
            html,
            &[attachment("pixel.png", "img1")],
            "1700000000000",
            "someone@example.com",
        );
        assert_eq!(
            rewritten,
            "<img src=\"/api/attachment/someone@example.com/1700000000000-pixel.png\">"
        );
    }

    #[test]
    fn test_rewrite_is_recipient_scoped() {
        let html = "<img src=\"cid:img1\">";
        let attachments = [attachment("pixel.png", "img1")];
        let a = rewrite_cid_references(html, &attachments, "123", "a@example.com");
        let b = rewrite_cid_references(html, &attachments, "123", "b@example.com");
        assert!(a.contains("/a@example.com/"));
        assert!(b.contains("/b@example.com/"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rewrite_idempotent() {
        let html = "<img src=\"cid:img1\"> and <img src=\"cid:img2\">";
        let attachments = [attachment("a.png", "img1"), attachment("b.png", "img2")];
        let once = rewrite_cid_references(html, &attachments, "123", "x@example.com");
        let twice = rewrite_cid_references(&once, &attachments, "123", "x@example.com");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unreferenced_attachment_is_noop() {
        let html = "<p>no images here</p>";
        let rewritten = rewrite_cid_references(
            html,
            &[attachment("pixel.png", "img1")],
            "123",
            "x@example.com",
        );
        assert_eq!(rewritten, html);
    }

    #[test]
    fn test_empty_cid_never_substitutes() {
        let html = "<img src=\"cid:real\"> and <img src=\"cid:other\">";
        let attachments = [attachment("empty.png", ""), attachment("real.png", "real")];
        let rewritten = rewrite_cid_references(html, &attachments, "123", "x@example.com");
        assert!(rewritten.contains("123-real.png"));
        assert!(rewritten.contains("cid:other"));
        assert!(!rewritten.contains("123-empty.png"));
    }

    #[test]
    fn test_rewrite_all_occurrences() {
        let html = "<img src=\"cid:img1\"><img src=\"cid:img1\">";
        let rewritten = rewrite_cid_references(
            html,
            &[attachment("pixel.png", "img1")],
            "123",
            "x@example.com",
        );
        assert!(!rewritten.contains("cid:img1"));
        assert_eq!(rewritten.matches("123-pixel.png").count(), 2);
    }
}
