//! Error types for the edgequake-pdf2img library.
//!
//! Two error types mirror the two layers of the pipeline:
//!
//! * [`RenderError`]: what a [`crate::render::Renderer`] may report. It only
//!   covers failures an engine can observe (bad document, bad page, crashed
//!   engine, limits exceeded).
//!
//! * [`ConversionError`]: what [`crate::Converter::convert`] returns. Every
//!   failure is classified into exactly one [`ErrorKind`]; callers map that tag
//!   to a transport status and show the message to the user.
//!
//! A conversion never carries partial results: the caller gets either every
//! requested page or one of these errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification tag of a [`ConversionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnreadableDocument,
    PageOutOfRange,
    EngineFailure,
    Timeout,
    ResourceExhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UnreadableDocument => "unreadable_document",
            ErrorKind::PageOutOfRange => "page_out_of_range",
            ErrorKind::EngineFailure => "engine_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ResourceExhausted => "resource_exhausted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors returned by a conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request itself is malformed: empty or oversized bytes, a bad page
    /// range, an unusable DPI or quality value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Document errors ───────────────────────────────────────────────────
    /// The engine cannot parse the bytes as a PDF (corrupt, truncated,
    /// encrypted without a password, or without any page).
    #[error("Unreadable PDF: {0}")]
    UnreadableDocument(String),

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The rendering engine crashed, exited with an error, or produced output
    /// that could not be read or encoded.
    #[error("Rendering engine failed: {0}")]
    EngineFailure(String),

    /// Rendering did not finish within the configured budget.
    #[error("Rendering timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// A configured ceiling (DPI, page count, rendered size) was exceeded.
    #[error("Resource limit exceeded: {0}")]
    ResourceExhausted(String),
}

impl ConversionError {
    /// The classification tag of this error.
    ///
    /// A configuration error can only reach a caller through a bad request
    /// value, so it is reported as [`ErrorKind::InvalidInput`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::InvalidInput(_) | ConversionError::InvalidConfig(_) => {
                ErrorKind::InvalidInput
            }
            ConversionError::UnreadableDocument(_) => ErrorKind::UnreadableDocument,
            ConversionError::PageOutOfRange { .. } => ErrorKind::PageOutOfRange,
            ConversionError::EngineFailure(_) => ErrorKind::EngineFailure,
            ConversionError::Timeout { .. } => ErrorKind::Timeout,
            ConversionError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
        }
    }
}

/// Failure reported by a rendering engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot parse document: {0}")]
    UnreadableDocument(String),

    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("{0}")]
    EngineFailure(String),

    #[error("{0}")]
    ResourceExhausted(String),
}

impl From<RenderError> for ConversionError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::UnreadableDocument(d) => ConversionError::UnreadableDocument(d),
            RenderError::PageOutOfRange { page, total } => {
                ConversionError::PageOutOfRange { page, total }
            }
            RenderError::EngineFailure(d) => ConversionError::EngineFailure(d),
            RenderError::ResourceExhausted(d) => ConversionError::ResourceExhausted(d),
        }
    }
}
