//! Rendering adapter: the only code that talks to a PDF engine.
//!
//! The pipeline sees engines through the [`Renderer`] capability trait and
//! never knows whether pages come from an in-process library or a child
//! process. Two production engines exist:
//!
//! * [`PdfiumRenderer`]: pdfium loaded in-process through `pdfium-render`.
//!   Fast, no temporary files, but cannot be killed: a runaway render is
//!   stopped cooperatively between pages.
//! * [`PopplerRenderer`]: `pdfinfo` + `pdftoppm` child processes. Slower,
//!   but a hung or crashing engine is isolated and killed on timeout.
//!
//! Engines treat every document as hostile. Whatever goes wrong inside them
//! comes back as a typed [`RenderError`], never as a panic or raw I/O error.

mod pdfium;
mod poppler;

pub use pdfium::PdfiumRenderer;
pub use poppler::PopplerRenderer;

use crate::config::{Engine, EngineConfig, PageRange};
use crate::document::SourceDocument;
use crate::error::RenderError;
use async_trait::async_trait;
use image::DynamicImage;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// A PDF rendering engine.
///
/// Implementations must honour the [`RenderSpec`] limits and may only write
/// files inside [`RenderRequest::workdir`]. The returned pages must be exactly
/// the selected pages, in ascending order.
///
/// Cancellation is by drop: when the returned future is dropped (timeout,
/// client disconnect) the engine must stop its work and release what it
/// holds as soon as it can.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short engine name for logs, e.g. `"pdfium"`.
    fn name(&self) -> &'static str;

    async fn render_pages(
        &self,
        request: &RenderRequest<'_>,
    ) -> Result<RenderedDocument, RenderError>;
}

/// Everything an engine needs for one call.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    pub document: &'a SourceDocument,
    pub spec: RenderSpec,
    /// Scoped working directory, removed by the caller after the call.
    pub workdir: &'a Path,
    pub password: Option<&'a str>,
}

/// Page selection, resolution and per-call ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSpec {
    pub pages: PageRange,
    pub dpi: u32,
    pub max_pages: usize,
    pub max_rendered_pixels: u32,
}

impl RenderSpec {
    /// Resolve the requested pages against the detected page count.
    pub fn select_pages(&self, page_count: u32) -> Result<RangeInclusive<u32>, RenderError> {
        if page_count == 0 {
            return Err(RenderError::UnreadableDocument(
                "document has no pages".into(),
            ));
        }
        let selected = self
            .pages
            .resolve(page_count)
            .map_err(|page| RenderError::PageOutOfRange {
                page,
                total: page_count,
            })?;
        let count = (selected.end() - selected.start() + 1) as usize;
        if count > self.max_pages {
            return Err(RenderError::ResourceExhausted(format!(
                "{count} pages selected, limit is {}",
                self.max_pages
            )));
        }
        Ok(selected)
    }

    /// Pixel size of a page measured in points, checked against the edge cap.
    pub fn page_pixels(
        &self,
        page: u32,
        width_pts: f32,
        height_pts: f32,
    ) -> Result<(u32, u32), RenderError> {
        let scale = self.dpi as f32 / POINTS_PER_INCH;
        let width = (width_pts.abs() * scale).round().max(1.0);
        let height = (height_pts.abs() * scale).round().max(1.0);
        let cap = self.max_rendered_pixels as f32;
        if width > cap || height > cap {
            return Err(RenderError::ResourceExhausted(format!(
                "page {page} would render at {width}x{height} px at {} DPI, limit is {} px per edge",
                self.dpi, self.max_rendered_pixels
            )));
        }
        Ok((width as u32, height as u32))
    }
}

/// One rasterised page, before encoding.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-indexed page number.
    pub page: u32,
    pub image: DynamicImage,
}

/// What an engine returns: the document's page count and the selected pages.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub page_count: u32,
    pub pages: Vec<RasterPage>,
}

/// Build the production renderer for an engine selection.
pub fn renderer_for(config: &EngineConfig) -> Arc<dyn Renderer> {
    match config.engine {
        Engine::Pdfium => Arc::new(PdfiumRenderer::new(config.pdfium_library.clone())),
        Engine::Poppler => Arc::new(PopplerRenderer::new(config.poppler_path.clone())),
    }
}
