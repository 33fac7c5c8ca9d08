//! MIME message structure.

use crate::content_type::{ContentType, parse_parameters};
use crate::encoding::{decode_base64, decode_quoted_printable, decode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

/// Body of a MIME part.
#[derive(Debug, Clone)]
pub enum Body {
    /// A leaf part: raw, still transfer-encoded bytes.
    Leaf(Vec<u8>),
    /// A multipart container holding child parts in document order.
    Multipart(Vec<Part>),
}

/// One node of the MIME part tree.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body: leaf bytes or nested parts.
    pub body: Body,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Body) -> Self {
        Self { headers, body }
    }

    /// Gets the content type, defaulting to text/plain when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the leaf parts of this subtree in depth-first document order.
    ///
    /// Multipart containers are traversed, never yielded.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Self> {
        match &self.body {
            Body::Leaf(_) => vec![self],
            Body::Multipart(children) => children.iter().flat_map(Self::leaves).collect(),
        }
    }

    /// Gets the declared filename, if any.
    ///
    /// Checks the Content-Disposition `filename` parameter first, then the
    /// Content-Type `name` parameter. Encoded-word filenames are decoded.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let from_disposition = self.headers.get("content-disposition").and_then(|value| {
            let mut segments = value.split(';');
            segments.next(); // skip the disposition token itself
            parse_parameters(segments).remove("filename")
        });

        let raw = from_disposition.or_else(|| {
            self.content_type()
                .ok()
                .and_then(|ct| ct.name().map(ToString::to_string))
        })?;

        Some(decode_rfc2047(&raw).unwrap_or(raw))
    }

    /// Decodes the leaf body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if this part is a multipart container or decoding
    /// fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        let Body::Leaf(body) = &self.body else {
            return Err(Error::InvalidMultipart(
                "cannot decode a multipart container".to_string(),
            ));
        };

        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                let body_str = String::from_utf8_lossy(body);
                // Remove whitespace for lenient parsing
                let cleaned: String = body_str.chars().filter(|c| !c.is_whitespace()).collect();
                decode_base64(&cleaned)
            }
            TransferEncoding::QuotedPrintable => {
                decode_quoted_printable(&String::from_utf8_lossy(body))
            }
            _ => Ok(body.clone()),
        }
    }

    /// Gets the decoded body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or UTF-8 conversion fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        String::from_utf8(decoded).map_err(Into::into)
    }
}

/// A parsed MIME message: the root part plus top-level header accessors.
#[derive(Debug, Clone)]
pub struct Message {
    /// The root of the part tree. For non-multipart messages this is the
    /// only part.
    pub root: Part,
}

impl Message {
    /// Gets the Subject header, decoded.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.root.headers.get_decoded("subject")
    }

    /// Gets the From header, decoded.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.root.headers.get_decoded("from")
    }

    /// Returns all leaf parts in depth-first document order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Part> {
        self.root.leaves()
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
    use super::*;

    fn leaf(headers: Headers, body: &[u8]) -> Part {
        Part::new(headers, Body::Leaf(body.to_vec()))
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("base64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_part_default_content_type() {
        let part = leaf(Headers::new(), b"hi");
        assert_eq!(part.content_type().unwrap().essence(), "text/plain");
    }

    #[test]
    fn test_part_body_text() {
        let mut headers = Headers::new();
        headers.add("content-type", "text/plain; charset=utf-8");
        let part = leaf(headers, b"Hello, World!");
        assert_eq!(part.body_text().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_part_decode_base64_body() {
        let mut headers = Headers::new();
        headers.add("content-type", "image/png");
        headers.add("content-transfer-encoding", "base64");
        let part = leaf(headers, b"SGVsbG8s\r\nIFdvcmxkIQ==");
        assert_eq!(part.decode_body().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_part_filename_from_disposition() {
        let mut headers = Headers::new();
        headers.add("content-type", "application/pdf; name=\"fallback.pdf\"");
        headers.add("content-disposition", "attachment; filename=\"report.pdf\"");
        let part = leaf(headers, b"");
        assert_eq!(part.filename().unwrap(), "report.pdf");
    }

    #[test]
    fn test_part_filename_from_content_type_name() {
        let mut headers = Headers::new();
        headers.add("content-type", "image/png; name=\"pixel.png\"");
        let part = leaf(headers, b"");
        assert_eq!(part.filename().unwrap(), "pixel.png");
    }

    #[test]
    fn test_part_filename_absent() {
        let part = leaf(Headers::new(), b"plain body");
        assert!(part.filename().is_none());
    }

    #[test]
    fn test_leaves_depth_first_order() {
        let mut inner_headers = Headers::new();
        inner_headers.add("content-type", "multipart/alternative; boundary=i");
        let inner = Part::new(
            inner_headers,
            Body::Multipart(vec![
                leaf(Headers::new(), b"first"),
                leaf(Headers::new(), b"second"),
            ]),
        );

        let mut outer_headers = Headers::new();
        outer_headers.add("content-type", "multipart/mixed; boundary=o");
        let root = Part::new(
            outer_headers,
            Body::Multipart(vec![inner, leaf(Headers::new(), b"third")]),
        );

        let bodies: Vec<_> = root
            .leaves()
            .iter()
            .map(|p| match &p.body {
                Body::Leaf(b) => b.clone(),
                Body::Multipart(_) => unreachable!(),
            })
            .collect();
        assert_eq!(bodies, vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]);
    }

    #[test]
    fn test_decode_body_on_container_is_error() {
        let mut headers = Headers::new();
        headers.add("content-type", "multipart/mixed; boundary=x");
        let part = Part::new(headers, Body::Multipart(vec![]));
        assert!(part.decode_body().is_err());
    }
}
