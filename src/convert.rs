//! Conversion entry points.
//!
//! [`Converter`] binds an immutable [`ConversionConfig`] to one rendering
//! engine and turns PDF bytes into an ordered set of encoded page images. It
//! holds no per-call state, so one instance (or clones of it) can serve any
//! number of concurrent conversions.

use crate::config::{ConversionConfig, ConversionOptions, EngineConfig};
use crate::document::SourceDocument;
use crate::error::ConversionError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::{encode, validate, workspace::Workspace};
use crate::render::{self, RenderRequest, RenderSpec, RenderedDocument, Renderer};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// PDF-to-image converter.
#[derive(Clone)]
pub struct Converter {
    config: Arc<ConversionConfig>,
    renderer: Arc<dyn Renderer>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("renderer", &self.renderer.name())
            .finish()
    }
}

impl Converter {
    pub fn new(config: ConversionConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
        }
    }

    /// Converter backed by one of the production engines.
    pub fn from_engine(config: ConversionConfig, engine: &EngineConfig) -> Self {
        Self::new(config, render::renderer_for(engine))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    /// Convert a PDF to page images.
    ///
    /// # Returns
    /// Every requested page, encoded, in page order. There are no partial
    /// results: if any page fails, the whole call fails.
    ///
    /// # Errors
    /// A [`ConversionError`] classified by [`ConversionError::kind`]. Invalid
    /// requests are rejected before the engine is invoked.
    ///
    /// # Cancellation
    /// Dropping the returned future stops the engine (child process killed,
    /// in-process render aborted at the next page) and removes the working
    /// directory.
    pub async fn convert(
        &self,
        document: impl Into<SourceDocument>,
        options: &ConversionOptions,
    ) -> Result<ConversionOutput, ConversionError> {
        let total_start = Instant::now();
        let document = document.into();

        // ── Step 1: Validate ─────────────────────────────────────────────
        let settings = validate::validate(&document, options, &self.config)?;
        info!(
            "Starting conversion: {} bytes, pages {}, {} DPI, {} via {}",
            document.len(),
            options.pages,
            settings.dpi,
            settings.format.extension(),
            self.renderer.name()
        );

        // ── Step 2: Render inside a scoped working directory ─────────────
        let render_start = Instant::now();
        let workspace = Workspace::create(&self.config.work_root())?;
        let request = RenderRequest {
            document: &document,
            spec: RenderSpec {
                pages: options.pages,
                dpi: settings.dpi,
                max_pages: self.config.max_pages,
                max_rendered_pixels: self.config.max_rendered_pixels,
            },
            workdir: workspace.path(),
            password: options.password.as_deref(),
        };
        let outcome = tokio::time::timeout(
            self.config.render_timeout,
            self.renderer.render_pages(&request),
        )
        .await;
        // The engine future is gone by now; nothing else uses the directory.
        release(workspace);

        let rendered = match outcome {
            Ok(result) => result?,
            Err(_) => {
                return Err(ConversionError::Timeout {
                    elapsed_ms: render_start.elapsed().as_millis() as u64,
                })
            }
        };
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        check_order(&rendered, options)?;
        info!(
            "Rendered {} of {} pages in {}ms",
            rendered.pages.len(),
            rendered.page_count,
            render_duration_ms
        );

        // ── Step 3: Encode ───────────────────────────────────────────────
        let encode_start = Instant::now();
        let page_count = rendered.page_count;
        let pages =
            encode::encode_pages_blocking(rendered.pages, settings.format, settings.jpeg_quality)
                .await?;
        let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

        // ── Step 4: Assemble ─────────────────────────────────────────────
        let stats = ConversionStats {
            render_duration_ms,
            encode_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            output_bytes: pages.iter().map(|p| p.data.len()).sum(),
        };
        info!(
            "Conversion complete: {} pages, {} bytes in {}ms",
            pages.len(),
            stats.output_bytes,
            stats.total_duration_ms
        );

        Ok(ConversionOutput {
            pages,
            page_count,
            dpi: settings.dpi,
            stats,
        })
    }

    /// Convert a PDF file on disk.
    pub async fn convert_file(
        &self,
        path: impl AsRef<Path>,
        options: &ConversionOptions,
    ) -> Result<ConversionOutput, ConversionError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ConversionError::InvalidInput(format!("cannot read '{}': {e}", path.display()))
        })?;
        self.convert(bytes, options).await
    }
}

/// Remove the working directory. A failure here only leaks a temp dir, so it
/// is logged rather than returned.
fn release(workspace: Workspace) {
    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        debug!("Failed to remove {}: {}", path.display(), e);
    }
}

/// The engine must return exactly the resolved range, ascending, and at
/// least one page.
fn check_order(
    rendered: &RenderedDocument,
    options: &ConversionOptions,
) -> Result<(), ConversionError> {
    if rendered.page_count == 0 || rendered.pages.is_empty() {
        return Err(ConversionError::UnreadableDocument(
            "engine produced no pages".into(),
        ));
    }
    let expected = options
        .pages
        .resolve(rendered.page_count)
        .map_err(|page| ConversionError::PageOutOfRange {
            page,
            total: rendered.page_count,
        })?;
    let matches = rendered.pages.len() == expected.clone().count()
        && rendered.pages.iter().map(|p| p.page).eq(expected.clone());
    if matches {
        Ok(())
    } else {
        Err(ConversionError::EngineFailure(format!(
            "engine returned pages {:?}, expected {}-{}",
            rendered.pages.iter().map(|p| p.page).collect::<Vec<_>>(),
            expected.start(),
            expected.end()
        )))
    }
}
