//! Configuration types for PDF rasterisation.
//!
//! Two levels of configuration exist:
//!
//! * [`ConversionConfig`]: process-wide limits and defaults, fixed when the
//!   [`crate::Converter`] is constructed and never mutated afterwards. Built
//!   via [`ConversionConfigBuilder`] so callers only set what they care about.
//! * [`ConversionOptions`]: per-request choices (pages, DPI, format). Every
//!   field is optional and falls back to the config defaults; the pipeline
//!   validates them against the config ceilings before rendering.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Process-wide configuration for the conversion pipeline.
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::ConversionConfig;
/// use std::time::Duration;
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .max_pages(50)
///     .render_timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// DPI used when a request does not ask for one. Default: 150.
    pub dpi: u32,

    /// Highest DPI a request may ask for. Default: 600.
    ///
    /// Pixel memory grows with the square of the DPI: a letter page is
    /// ~2 MP at 150 DPI but ~34 MP at 600 DPI.
    pub max_dpi: u32,

    /// Largest accepted document, in bytes. Default: 50 MiB.
    pub max_input_bytes: usize,

    /// Most pages a single conversion may render. Default: 500.
    pub max_pages: usize,

    /// Cap on either edge of a rendered page, in pixels. Default: 10 000.
    ///
    /// Guards against poster-sized pages: an A0 sheet at 300 DPI is
    /// ~10 000 × 14 000 px even though the DPI itself is reasonable.
    pub max_rendered_pixels: u32,

    /// Time budget for the rendering engine call. Default: 60 s.
    pub render_timeout: Duration,

    /// Output image format when a request does not choose one. Default: JPEG.
    pub format: OutputFormat,

    /// JPEG quality (1–100) when a request does not choose one. Default: 85.
    pub jpeg_quality: u8,

    /// Directory under which per-call working directories are created.
    /// `None` means the system temp directory.
    pub work_dir: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_dpi: 600,
            max_input_bytes: 50 * 1024 * 1024,
            max_pages: 500,
            max_rendered_pixels: 10_000,
            render_timeout: Duration::from_secs(60),
            format: OutputFormat::Jpeg,
            jpeg_quality: 85,
            work_dir: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Root directory for per-call working directories.
    pub fn work_root(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_dpi(mut self, dpi: u32) -> Self {
        self.config.max_dpi = dpi;
        self
    }

    pub fn max_input_bytes(mut self, bytes: usize) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    pub fn max_pages(mut self, pages: usize) -> Self {
        self.config.max_pages = pages;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.config.render_timeout = timeout;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConversionError> {
        let c = &self.config;
        if c.max_dpi == 0 {
            return Err(ConversionError::InvalidConfig("max DPI must be ≥ 1".into()));
        }
        if c.dpi == 0 || c.dpi > c.max_dpi {
            return Err(ConversionError::InvalidConfig(format!(
                "DPI must be 1–{}, got {}",
                c.max_dpi, c.dpi
            )));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(ConversionError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.max_input_bytes == 0 {
            return Err(ConversionError::InvalidConfig(
                "max input size must be ≥ 1 byte".into(),
            ));
        }
        if c.max_pages == 0 {
            return Err(ConversionError::InvalidConfig("max pages must be ≥ 1".into()));
        }
        if c.max_rendered_pixels == 0 {
            return Err(ConversionError::InvalidConfig(
                "max rendered pixels must be ≥ 1".into(),
            ));
        }
        if c.render_timeout.is_zero() {
            return Err(ConversionError::InvalidConfig(
                "render timeout must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Per-request options ──────────────────────────────────────────────────

/// Per-request conversion choices. Unset fields use the config defaults.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Pages to render. Default: all pages.
    pub pages: PageRange,
    pub dpi: Option<u32>,
    pub format: Option<OutputFormat>,
    pub jpeg_quality: Option<u8>,
    /// User password for encrypted documents.
    pub password: Option<String>,
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Encoded image format of the rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy, small files. (default)
    #[default]
    Jpeg,
    /// Lossless, larger files.
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(ConversionError::InvalidInput(format!(
                "unknown image format '{other}' (expected jpeg or png)"
            ))),
        }
    }
}

/// Which pages of the PDF to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRange {
    /// Every page of the document (default).
    #[default]
    All,
    /// A contiguous, inclusive, 1-indexed span.
    Span(PageSpan),
}

/// Inclusive page span with `1 <= first <= last`.
///
/// The fields are private; a span only comes out of [`PageRange::new`],
/// [`PageRange::single`] or parsing.
///
/// ```compile_fail
/// use edgequake_pdf2img::config::PageSpan;
/// let backwards = PageSpan { first: 5, last: 2 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    first: u32,
    last: u32,
}

impl PageSpan {
    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }
}

impl PageRange {
    pub fn new(first: u32, last: u32) -> Result<Self, ConversionError> {
        if first < 1 {
            return Err(ConversionError::InvalidInput(format!(
                "pages are 1-indexed, minimum is 1 (got {first})"
            )));
        }
        if last < first {
            return Err(ConversionError::InvalidInput(format!(
                "invalid page range '{first}-{last}': start must be <= end"
            )));
        }
        Ok(PageRange::Span(PageSpan { first, last }))
    }

    pub fn single(page: u32) -> Result<Self, ConversionError> {
        Self::new(page, page)
    }

    /// Intersect the range with a document of `total` pages.
    ///
    /// `All` covers every page. An explicit span reaching past the last page
    /// is an error, not a silent clip; the error carries the highest
    /// requested page.
    pub fn resolve(&self, total: u32) -> Result<RangeInclusive<u32>, u32> {
        match *self {
            PageRange::All => Ok(1..=total),
            PageRange::Span(span) if span.last > total => Err(span.last),
            PageRange::Span(span) => Ok(span.first..=span.last),
        }
    }
}

impl FromStr for PageRange {
    type Err = ConversionError;

    /// Parse `all`, `5` or `3-15`. Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        if s.is_empty() || s == "all" {
            return Ok(PageRange::All);
        }

        let parse = |p: &str| {
            p.trim().parse::<u32>().map_err(|_| {
                ConversionError::InvalidInput(format!("invalid page number '{}'", p.trim()))
            })
        };

        // Range: "3-15"
        if let Some((start, end)) = s.split_once('-') {
            return PageRange::new(parse(start)?, parse(end)?);
        }

        PageRange::single(parse(&s)?)
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageRange::All => f.write_str("all"),
            PageRange::Span(span) if span.first == span.last => write!(f, "{}", span.first),
            PageRange::Span(span) => write!(f, "{}-{}", span.first, span.last),
        }
    }
}

/// Which rendering engine backs the [`crate::render::Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// In-process pdfium via `pdfium-render`. (default)
    #[default]
    Pdfium,
    /// Out-of-process poppler (`pdfinfo` + `pdftoppm`).
    Poppler,
}

impl FromStr for Engine {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdfium" => Ok(Engine::Pdfium),
            "poppler" => Ok(Engine::Poppler),
            other => Err(ConversionError::InvalidConfig(format!(
                "unknown engine '{other}' (expected pdfium or poppler)"
            ))),
        }
    }
}

/// Engine selection plus where to find its native parts.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub engine: Engine,
    /// Path to libpdfium (file or directory). `None` falls back to
    /// `PDFIUM_LIB_PATH`, then to the system library.
    pub pdfium_library: Option<PathBuf>,
    /// Directory holding `pdfinfo`/`pdftoppm`. `None` uses `PATH`.
    pub poppler_path: Option<PathBuf>,
}
