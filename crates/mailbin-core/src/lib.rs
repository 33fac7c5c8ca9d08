//! # mailbin-core
//!
//! Core ingestion pipeline for the `mailbin` inbound mail store.
//!
//! This crate provides:
//! - MIME decomposition and content classification (body / HTML / attachment)
//! - Attachment identity assignment and inline `cid:` reference rewriting
//! - Recipient validation and domain-based routing policy
//! - Per-recipient filesystem persistence of delivery records and blobs
//! - An independent, rate-limited retention sweep over the store
//!
//! The wire-level mail transport is an external collaborator: it parses the
//! SMTP dialogue into an [`Envelope`] and hands it to [`Pipeline::ingest`],
//! which returns the transport-facing status string.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod ingest;
pub mod retention;
pub mod route;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{
    Attachment, Envelope, ParsedMessage, Pipeline, STATUS_OK, STATUS_UNPARSEABLE, decompose,
    rewrite_cid_references,
};
pub use retention::{RetentionPolicy, RetentionSweeper, SweepOutcome};
pub use route::{DomainPolicy, RecipientVerdict, screen_recipient};
pub use store::{AttachmentDetail, DeliveryRecord, MessageStore, ParsedPayload};
