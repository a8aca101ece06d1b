//! Shared fixtures: a scriptable in-memory engine and document builders.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_pdf2img::{
    ConversionConfig, Converter, RasterPage, RenderError, RenderRequest, RenderedDocument,
    Renderer,
};
use image::{DynamicImage, Luma};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Page size used when a fake document does not say otherwise: one inch.
pub const DEFAULT_PAGE_PTS: f32 = 72.0;

/// What the fake engine does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Render the pages the document declares.
    Render,
    /// Fail with this error after staging a file.
    Fail(RenderError),
    /// Stage a file, then sleep this long before rendering.
    Hang(Duration),
    /// Render, but return the pages in reverse order.
    Reverse,
    /// Report an empty document without failing.
    Empty,
}

/// In-memory [`Renderer`].
///
/// Documents are fake PDFs carrying `pages=N` (and optionally `size=WxH` in
/// points) in their body; see [`fake_pdf`]. Every call records its working
/// directory and drops a file into it, like a real engine staging its input.
#[derive(Debug)]
pub struct FakeRenderer {
    behavior: Behavior,
    calls: AtomicUsize,
    workdirs: Mutex<Vec<PathBuf>>,
    passwords: Mutex<Vec<Option<String>>>,
}

impl FakeRenderer {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            workdirs: Mutex::new(Vec::new()),
            passwords: Mutex::new(Vec::new()),
        })
    }

    pub fn rendering() -> Arc<Self> {
        Self::new(Behavior::Render)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn workdirs(&self) -> Vec<PathBuf> {
        self.workdirs.lock().unwrap().clone()
    }

    /// The password each call was given, in call order.
    pub fn passwords(&self) -> Vec<Option<String>> {
        self.passwords.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn render_pages(
        &self,
        request: &RenderRequest<'_>,
    ) -> Result<RenderedDocument, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.workdirs
            .lock()
            .unwrap()
            .push(request.workdir.to_path_buf());
        self.passwords
            .lock()
            .unwrap()
            .push(request.password.map(str::to_owned));
        std::fs::write(request.workdir.join("input.pdf"), request.document.as_bytes())
            .map_err(|e| RenderError::EngineFailure(e.to_string()))?;

        match &self.behavior {
            Behavior::Fail(e) => return Err(e.clone()),
            Behavior::Hang(d) => tokio::time::sleep(*d).await,
            Behavior::Empty => {
                return Ok(RenderedDocument {
                    page_count: 0,
                    pages: Vec::new(),
                })
            }
            Behavior::Render | Behavior::Reverse => {}
        }

        let text = String::from_utf8_lossy(request.document.as_bytes()).into_owned();
        let page_count = field(&text, "pages=")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| RenderError::UnreadableDocument("no page count".into()))?;
        let (w_pts, h_pts) = field(&text, "size=")
            .and_then(|v| v.split_once('x'))
            .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
            .unwrap_or((DEFAULT_PAGE_PTS, DEFAULT_PAGE_PTS));

        let selected = request.spec.select_pages(page_count)?;
        let mut pages = Vec::new();
        for page in selected {
            let (w, h) = request.spec.page_pixels(page, w_pts, h_pts)?;
            let shade = (page * 40 % 256) as u8;
            let image = DynamicImage::ImageLuma8(image::ImageBuffer::from_pixel(w, h, Luma([shade])));
            pages.push(RasterPage { page, image });
        }
        if matches!(self.behavior, Behavior::Reverse) {
            pages.reverse();
        }

        Ok(RenderedDocument { page_count, pages })
    }
}

fn field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = text.find(key)? + key.len();
    text[start..].split_whitespace().next()
}

/// A fake PDF declaring `pages` one-inch pages.
pub fn fake_pdf(pages: u32) -> Vec<u8> {
    format!("%PDF-1.7\n% pages={pages}\n%%EOF\n").into_bytes()
}

/// A fake PDF with a custom page size in points.
pub fn fake_pdf_sized(pages: u32, width_pts: f32, height_pts: f32) -> Vec<u8> {
    format!("%PDF-1.7\n% pages={pages} size={width_pts}x{height_pts}\n%%EOF\n").into_bytes()
}

/// Config whose working directories live under `root`.
pub fn config_in(root: &Path) -> edgequake_pdf2img::ConversionConfigBuilder {
    ConversionConfig::builder().dpi(72).work_dir(root)
}

pub fn converter(config: ConversionConfig, renderer: &Arc<FakeRenderer>) -> Converter {
    Converter::new(config, renderer.clone())
}

/// Number of entries directly under `dir`.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("edgequake_pdf2img=debug")
        .with_test_writer()
        .try_init();
}
