//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` / `ConversionOptions` and writes the page images.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::{
    archive, ConversionConfig, ConversionOptions, ConversionOutput, Converter, Engine,
    EngineConfig, OutputFormat, PageRange,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page as JPEG into ./document_pages/
  pdf2img document.pdf

  # Pages 2 to 5 as PNG at 300 DPI into ./out
  pdf2img --pages 2-5 --format png --dpi 300 -o out document.pdf

  # One zip archive holding page_N.jpg entries
  pdf2img --zip -o pages.zip document.pdf

  # Use poppler instead of pdfium
  pdf2img --engine poppler --poppler-path /opt/bin document.pdf

  # Page sizes and timings as JSON (images are not written)
  pdf2img --json document.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PDF2IMG_*               Every flag, e.g. PDF2IMG_DPI=200
  RUST_LOG                Log filter override, e.g. RUST_LOG=debug
"#;

/// Rasterise PDF pages to JPEG or PNG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Rasterise PDF pages to JPEG or PNG images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to convert.
    input: PathBuf,

    /// Output directory, or archive path with --zip.
    /// Default: `<input stem>_pages` (or `<input stem>_pages.zip`).
    #[arg(short, long, env = "PDF2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Write one zip archive instead of separate files.
    #[arg(long, env = "PDF2IMG_ZIP", conflicts_with = "json")]
    zip: bool,

    /// Print conversion metadata as JSON instead of writing images.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Page selection: all, 5, or 3-15.
    #[arg(long, env = "PDF2IMG_PAGES", default_value = "all")]
    pages: PageRange,

    /// Rendering DPI.
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = 150)]
    dpi: u32,

    /// Image format: jpeg or png.
    #[arg(long, env = "PDF2IMG_FORMAT", default_value = "jpeg")]
    format: OutputFormat,

    /// JPEG quality (1–100).
    #[arg(long, env = "PDF2IMG_QUALITY", default_value_t = 85)]
    quality: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Rendering engine: pdfium or poppler.
    #[arg(long, env = "PDF2IMG_ENGINE", default_value = "pdfium")]
    engine: Engine,

    /// Path to libpdfium (file or directory). Falls back to PDFIUM_LIB_PATH.
    #[arg(long, env = "PDF2IMG_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Directory holding pdfinfo and pdftoppm.
    #[arg(long, env = "PDF2IMG_POPPLER_PATH")]
    poppler_path: Option<PathBuf>,

    /// Highest accepted DPI.
    #[arg(long, env = "PDF2IMG_MAX_DPI", default_value_t = 600)]
    max_dpi: u32,

    /// Most pages rendered in one run.
    #[arg(long, env = "PDF2IMG_MAX_PAGES", default_value_t = 500)]
    max_pages: usize,

    /// Render time budget in seconds.
    #[arg(long, env = "PDF2IMG_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Disable the spinner.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

/// `--json` output: everything but the image bytes.
#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a Path,
    #[serde(flatten)]
    output: &'a ConversionOutput,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; library INFO lines
    // would tear it, so they are only shown without it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build converter ──────────────────────────────────────────────────
    let config = ConversionConfig::builder()
        .dpi(cli.dpi)
        .max_dpi(cli.max_dpi)
        .format(cli.format)
        .jpeg_quality(cli.quality)
        .max_pages(cli.max_pages)
        .render_timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("Invalid configuration")?;
    let engine = EngineConfig {
        engine: cli.engine,
        pdfium_library: cli.pdfium_lib.clone(),
        poppler_path: cli.poppler_path.clone(),
    };
    let converter = Converter::from_engine(config, &engine);
    let options = ConversionOptions {
        pages: cli.pages,
        password: cli.password.clone(),
        ..Default::default()
    };

    // ── Run conversion ───────────────────────────────────────────────────
    let progress = show_progress.then(|| spinner(&cli.input, converter.renderer_name()));
    let result = converter.convert_file(&cli.input, &options).await;
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }
    let output = result.with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    if cli.json {
        let report = JsonReport {
            input: &cli.input,
            output: &output,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
        return Ok(());
    }

    let target = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, cli.zip));
    if cli.zip {
        write_archive(&output, &target).await?;
    } else {
        output
            .write_to_dir(&target)
            .await
            .with_context(|| format!("Failed to write pages to {}", target.display()))?;
    }

    if !cli.quiet {
        eprintln!(
            "{} {} of {} pages  {}  {}ms  →  {}",
            green("✔"),
            bold(&output.pages.len().to_string()),
            output.page_count,
            dim(&format!("{} DPI, {} bytes", output.dpi, output.stats.output_bytes)),
            output.stats.total_duration_ms,
            bold(&target.display().to_string()),
        );
    }

    Ok(())
}

fn spinner(input: &Path, engine: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Rendering");
    bar.set_message(format!("{} via {engine}", input.display()));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// `report.pdf` → `report_pages` or `report_pages.zip`, next to the input.
fn default_output(input: &Path, zip: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = if zip {
        format!("{stem}_pages.zip")
    } else {
        format!("{stem}_pages")
    };
    input.with_file_name(name)
}

/// Atomic write: build the archive in memory, write a temp file, rename.
async fn write_archive(output: &ConversionOutput, path: &Path) -> Result<()> {
    let bytes = archive::zip_pages(&output.pages).context("Failed to build zip archive")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("zip.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
