//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its own
//! and the rendering engine can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ workspace ──▶ render ──▶ encode
//! (limits)     (temp dir)    (engine)   (JPEG/PNG)
//! ```
//!
//! 1. [`validate`]  : size, DPI and quality checks plus the `%PDF-` sniff; no
//!    engine is touched when these fail
//! 2. [`workspace`] : a private directory per call, removed on every exit path
//! 3. render        : delegated to a [`crate::render::Renderer`]
//! 4. [`encode`]    : raster pages to JPEG or PNG bytes on the blocking pool

pub mod encode;
pub mod validate;
pub mod workspace;
