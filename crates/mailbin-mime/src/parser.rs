//! Raw message parsing.
//!
//! Splits a raw RFC 5322 message into a header block and body, then
//! recursively splits multipart bodies on their declared boundary into a
//! part tree. Preamble and epilogue around the boundary delimiters are
//! discarded, and a missing closing delimiter is tolerated.

use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Body, Message, Part};

impl Message {
    /// Parses a raw message into a part tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid UTF-8, a header block is
    /// malformed, or a multipart container lacks a usable boundary.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::Parse("message is not valid UTF-8".to_string()))?;
        Ok(Self {
            root: parse_part(text)?,
        })
    }
}

fn parse_part(text: &str) -> Result<Part> {
    let (header_text, body_text) = split_at_blank_line(text);
    let headers = Headers::parse(header_text)?;

    let content_type = headers
        .get("content-type")
        .map(ContentType::parse)
        .transpose()?;

    if let Some(ct) = content_type
        && ct.is_multipart()
    {
        let boundary = ct.boundary().ok_or(Error::MissingBoundary)?;
        let children = split_multipart(body_text, boundary)?
            .iter()
            .map(|segment| parse_part(segment))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Part::new(headers, Body::Multipart(children)));
    }

    Ok(Part::new(headers, Body::Leaf(body_text.as_bytes().to_vec())))
}

/// Splits a part at the first blank line into (headers, body).
///
/// A part with no blank line is all headers and has an empty body.
fn split_at_blank_line(text: &str) -> (&str, &str) {
    let crlf = text.find("\r\n\r\n");
    let lf = text.find("\n\n");

    match (crlf, lf) {
        (Some(c), Some(l)) if c < l => (&text[..c], &text[c + 4..]),
        (Some(c), None) => (&text[..c], &text[c + 4..]),
        (_, Some(l)) => (&text[..l], &text[l + 2..]),
        (None, None) => (text, ""),
    }
}

/// Splits a multipart body into raw part segments on its boundary.
fn split_multipart(body: &str, boundary: &str) -> Result<Vec<String>> {
    let delimiter = format!("--{boundary}");
    let terminator = format!("--{boundary}--");

    let mut segments = Vec::new();
    // None until the first delimiter: everything before it is preamble.
    let mut current: Option<Vec<&str>> = None;

    for line in body.lines() {
        let trimmed = line.trim_end();

        if trimmed == terminator {
            if let Some(lines) = current.take() {
                segments.push(lines.join("\r\n"));
            }
            break; // epilogue is discarded
        }

        if trimmed == delimiter {
            if let Some(lines) = current.take() {
                segments.push(lines.join("\r\n"));
            }
            current = Some(Vec::new());
            continue;
        }

        if let Some(lines) = &mut current {
            lines.push(line);
        }
    }

    // Unterminated multipart: keep what we collected.
    if let Some(lines) = current {
        segments.push(lines.join("\r\n"));
    }

    if segments.is_empty() {
        return Err(Error::InvalidMultipart(format!(
            "no parts delimited by boundary {boundary}"
        )));
    }

    Ok(segments)
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

    #[test]
    fn test_parse_single_part() {
        let raw = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "Hello, World!"
        );

        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.from().unwrap(), "sender@example.com");
        assert_eq!(message.subject().unwrap(), "Test");

        let leaves = message.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].body_text().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_parse_multipart() {
        let raw = concat!(
            "From: a@example.com\r\n",
            "Content-Type: multipart/mixed; boundary=\"xyz\"\r\n",
            "\r\n",
            "preamble to ignore\r\n",
            "--xyz\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "the body\r\n",
            "--xyz\r\n",
            "Content-Type: image/png; name=\"pixel.png\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "Content-ID: <img1>\r\n",
            "\r\n",
            "aW1hZ2VieXRlcw==\r\n",
            "--xyz--\r\n",
            "epilogue to ignore\r\n"
        );

        let message = Message::parse(raw.as_bytes()).unwrap();
        let leaves = message.leaves();
        assert_eq!(leaves.len(), 2);

        assert_eq!(leaves[0].body_text().unwrap(), "the body");
        assert_eq!(leaves[1].filename().unwrap(), "pixel.png");
        assert_eq!(leaves[1].headers.get("content-id"), Some("<img1>"));
        assert_eq!(leaves[1].decode_body().unwrap(), b"imagebytes");
    }

    #[test]
    fn test_parse_nested_multipart_order() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain alternative\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html alternative</p>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf; name=\"doc.pdf\"\r\n",
            "\r\n",
            "%PDF-1.4\r\n",
            "--outer--\r\n"
        );

        let message = Message::parse(raw.as_bytes()).unwrap();
        let leaves = message.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].body_text().unwrap(), "plain alternative");
        assert_eq!(leaves[1].body_text().unwrap(), "<p>html alternative</p>");
        assert_eq!(leaves[2].filename().unwrap(), "doc.pdf");
    }

    #[test]
    fn test_parse_unterminated_multipart() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=\"b\"\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "no closing delimiter"
        );

        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.leaves().len(), 1);
    }

    #[test]
    fn test_parse_multipart_missing_boundary() {
        let raw = concat!("Content-Type: multipart/mixed\r\n", "\r\n", "body");
        assert!(Message::parse(raw.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_invalid_utf8() {
        assert!(Message::parse(&[0x80, 0xFF, 0x00]).is_err());
    }

    #[test]
    fn test_parse_lf_only_line_endings() {
        let raw = "Subject: lf\nContent-Type: text/plain\n\nbody here";
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.subject().unwrap(), "lf");
        assert_eq!(message.leaves()[0].body_text().unwrap(), "body here");
    }

    #[test]
    fn test_parse_quoted_printable_body() {
        let raw = concat!(
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "H=C3=A9llo"
        );

        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.leaves()[0].body_text().unwrap(), "Héllo");
    }
}
