//! PDF rasterisation via pdfium, in-process.
//!
//! pdfium is synchronous and CPU-bound, so every call runs on Tokio's
//! blocking pool via `spawn_blocking` and never on a runtime worker thread.
//!
//! ## Stopping a render
//!
//! A blocking thread cannot be killed. When the caller drops the render
//! future, an abort flag is raised and the thread stops before its next page.
//! A single pathological page still runs to completion in the background; the
//! caller's timeout has already returned by then.

use super::{RasterPage, RenderRequest, RenderSpec, RenderedDocument, Renderer};
use crate::error::RenderError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// In-process pdfium engine.
///
/// The bindings are not `Send`, so each render binds the library on the
/// blocking thread that uses it and drops it when the document is done.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// `library` may point at the shared library itself or at the directory
    /// holding it. `None` falls back to `PDFIUM_LIB_PATH`, then to the
    /// system library search path.
    pub fn new(library: Option<PathBuf>) -> Self {
        Self { library }
    }
}

#[async_trait]
impl Renderer for PdfiumRenderer {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    async fn render_pages(
        &self,
        request: &RenderRequest<'_>,
    ) -> Result<RenderedDocument, RenderError> {
        let bytes = request.document.shared();
        let password = request.password.map(str::to_owned);
        let spec = request.spec;
        let library = self.library.clone();

        let guard = AbortOnDrop::default();
        let abort = Arc::clone(&guard.0);

        let result = tokio::task::spawn_blocking(move || {
            let pdfium = bind(library.as_deref())?;
            render_blocking(&pdfium, &bytes, password.as_deref(), spec, &abort)
        })
        .await
        .map_err(|e| RenderError::EngineFailure(format!("render task panicked: {e}")))?;

        drop(guard);
        result
    }
}

/// Raises the shared flag when dropped, i.e. when the render future is
/// abandoned or finishes.
#[derive(Default)]
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Bind to the pdfium shared library.
fn bind(library: Option<&Path>) -> Result<Pdfium, RenderError> {
    let location = library
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match location {
        Some(path) => {
            let path = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            Pdfium::bind_to_library(&path)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| RenderError::EngineFailure(format!("failed to bind pdfium library: {e}")))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rendering.
fn render_blocking(
    pdfium: &Pdfium,
    bytes: &[u8],
    password: Option<&str>,
    spec: RenderSpec,
    abort: &AtomicBool,
) -> Result<RenderedDocument, RenderError> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(&format!("{e:?}"), password.is_some()))?;

    let pages = document.pages();
    let page_count = pages.len() as u32;
    debug!("PDF loaded: {} pages", page_count);

    let selected = spec.select_pages(page_count)?;
    let mut results = Vec::with_capacity(selected.clone().count());

    for number in selected {
        if abort.load(Ordering::Relaxed) {
            return Err(RenderError::EngineFailure(format!(
                "render abandoned before page {number}"
            )));
        }

        let page = pages
            .get((number - 1) as u16)
            .map_err(|e| RenderError::EngineFailure(format!("page {number}: {e:?}")))?;

        let (width, height) = spec.page_pixels(number, page.width().value, page.height().value)?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| RenderError::EngineFailure(format!("page {number}: {e:?}")))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            number,
            image.width(),
            image.height()
        );

        results.push(RasterPage {
            page: number,
            image,
        });
    }

    Ok(RenderedDocument {
        page_count,
        pages: results,
    })
}

/// Map a pdfium load failure onto the error taxonomy.
///
/// Every load failure means the bytes are not a usable PDF; the password
/// cases only get a clearer message.
fn classify_load_error(detail: &str, password_given: bool) -> RenderError {
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            RenderError::UnreadableDocument("wrong password".into())
        } else {
            RenderError::UnreadableDocument("document is encrypted and requires a password".into())
        }
    } else {
        RenderError::UnreadableDocument(detail.to_string())
    }
}
