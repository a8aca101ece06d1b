//! HTTP server binary for edgequake-pdf2img.
//!
//! Maps flags (or `PDF2IMG_*` environment variables) onto a
//! `ConversionConfig`, picks an engine and serves the router from
//! `edgequake_pdf2img::server`.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::server::{start_server, ServerState};
use edgequake_pdf2img::{ConversionConfig, Converter, Engine, EngineConfig, OutputFormat};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve PDF-to-image conversion over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img-server",
    version,
    about = "Serve PDF-to-image conversion over HTTP",
    color = clap::ColorChoice::Auto
)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "PDF2IMG_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Rendering engine: pdfium or poppler.
    #[arg(long, env = "PDF2IMG_ENGINE", default_value = "pdfium")]
    engine: Engine,

    /// Path to libpdfium (file or directory). Falls back to PDFIUM_LIB_PATH.
    #[arg(long, env = "PDF2IMG_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Directory holding pdfinfo and pdftoppm.
    #[arg(long, env = "PDF2IMG_POPPLER_PATH")]
    poppler_path: Option<PathBuf>,

    /// Default rendering DPI.
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = 150)]
    dpi: u32,

    /// Highest DPI a request may ask for.
    #[arg(long, env = "PDF2IMG_MAX_DPI", default_value_t = 600)]
    max_dpi: u32,

    /// Default image format: jpeg or png.
    #[arg(long, env = "PDF2IMG_FORMAT", default_value = "jpeg")]
    format: OutputFormat,

    /// Default JPEG quality (1–100).
    #[arg(long, env = "PDF2IMG_QUALITY", default_value_t = 85)]
    quality: u8,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "PDF2IMG_MAX_INPUT_MB", default_value_t = 50)]
    max_input_mb: usize,

    /// Most pages rendered per request.
    #[arg(long, env = "PDF2IMG_MAX_PAGES", default_value_t = 500)]
    max_pages: usize,

    /// Longest rendered page edge, in pixels.
    #[arg(long, env = "PDF2IMG_MAX_PIXELS", default_value_t = 10_000)]
    max_pixels: u32,

    /// Render time budget per request, in seconds.
    #[arg(long, env = "PDF2IMG_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Parent directory for per-request working directories.
    #[arg(long, env = "PDF2IMG_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if args.verbose {
        "debug"
    } else {
        "edgequake_pdf2img=info,pdf2img_server=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build converter ──────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder()
        .dpi(args.dpi)
        .max_dpi(args.max_dpi)
        .format(args.format)
        .jpeg_quality(args.quality)
        .max_input_bytes(args.max_input_mb.saturating_mul(1024 * 1024))
        .max_pages(args.max_pages)
        .max_rendered_pixels(args.max_pixels)
        .render_timeout(Duration::from_secs(args.timeout));
    if let Some(dir) = &args.work_dir {
        builder = builder.work_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let engine = EngineConfig {
        engine: args.engine,
        pdfium_library: args.pdfium_lib.clone(),
        poppler_path: args.poppler_path.clone(),
    };
    let converter = Converter::from_engine(config, &engine);

    info!("Starting pdf2img server");
    start_server(args.bind.as_str(), ServerState::new(converter))
        .await
        .with_context(|| format!("Server on {} failed", args.bind))?;

    Ok(())
}
