//! # mailbin-mime
//!
//! MIME message parsing for inbound mail ingestion.
//!
//! ## Features
//!
//! - **Message parsing**: Recursive multipart parsing into a part tree
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 header decoding
//! - **Content types**: `type/subtype; parameter` parsing with boundary,
//!   charset, and name access
//! - **Part inspection**: depth-first leaf traversal, declared filenames,
//!   transfer-encoding decode of payloads
//!
//! ## Quick Start
//!
//! ```
//! use mailbin_mime::Message;
//!
//! let raw = "From: sender@example.com\r\n\
//!            Subject: Test\r\n\
//!            Content-Type: text/plain\r\n\
//!            \r\n\
//!            Hello, World!";
//!
//! let message = Message::parse(raw.as_bytes())?;
//! assert_eq!(message.subject().as_deref(), Some("Test"));
//! for part in message.leaves() {
//!     let _bytes = part.decode_body()?;
//! }
//! # Ok::<(), mailbin_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;
mod parser;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Message, Part, TransferEncoding};
