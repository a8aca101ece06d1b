//! # edgequake-pdf2img
//!
//! Rasterise PDF pages to JPEG or PNG images.
//!
//! Uploaded PDFs are untrusted: they may be truncated, encrypted, huge, or
//! crafted to hang a renderer. This crate wraps a native rendering engine
//! behind a narrow [`Renderer`] trait and runs it inside a pipeline that
//! validates input first, bounds the render with a timeout, confines
//! temporary files to a per-call directory, and classifies every failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Validate   size, DPI, quality, %PDF- header
//!  ├─ 2. Workspace  private temp dir, removed on every exit path
//!  ├─ 3. Render     pdfium (spawn_blocking) or poppler (child process), timed
//!  ├─ 4. Encode     JPEG / PNG on the blocking pool
//!  └─ 5. Output     ordered pages + stats, or a ConversionError
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{ConversionConfig, ConversionOptions, Converter, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::from_engine(ConversionConfig::default(), &EngineConfig::default());
//!     let bytes = std::fs::read("document.pdf")?;
//!     let output = converter.convert(bytes, &ConversionOptions::default()).await?;
//!     for page in &output.pages {
//!         std::fs::write(page.file_name(), &page.data)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | off     | Enables [`server`] and the `pdf2img-server` binary (axum) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2img = { version = "0.1", default-features = false }
//! ```
//!
//! ## Engines
//!
//! | Engine | Runs | Needs |
//! |--------|------|-------|
//! | `pdfium`  | in-process, blocking pool | `libpdfium` (`PDFIUM_LIB_PATH` or system path) |
//! | `poppler` | `pdfinfo` + `pdftoppm` child processes | poppler-utils on `PATH` or `poppler_path` |

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(any(feature = "cli", feature = "server"))]
pub mod archive;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod render;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConversionOptions, Engine, EngineConfig,
    OutputFormat, PageRange, PageSpan,
};
pub use convert::Converter;
pub use document::SourceDocument;
pub use error::{ConversionError, ErrorKind, RenderError};
pub use output::{ConversionOutput, ConversionStats, RenderedPage};
pub use render::{
    PdfiumRenderer, PopplerRenderer, RasterPage, RenderRequest, RenderSpec, RenderedDocument,
    Renderer,
};
