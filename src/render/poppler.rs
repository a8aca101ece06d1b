//! PDF rasterisation via poppler's command-line tools, out-of-process.
//!
//! `pdfinfo` reports the page count and page sizes; `pdftoppm` writes one PNG
//! per page into the working directory. Every child is spawned with
//! `kill_on_drop`, so abandoning the render future (timeout, disconnect)
//! kills the process instead of leaving it running.
//!
//! Poppler exit codes: 0 success, 1 cannot open the PDF, 2 cannot open an
//! output file, 3 permission (encryption) error, 99 anything else.
//!
//! A password is passed as `-upw <password>` on the command line, where other
//! local users can read it from the process list while the tool runs. Use the
//! pdfium engine for encrypted documents on shared hosts.

use super::{RasterPage, RenderRequest, RenderedDocument, Renderer};
use crate::error::RenderError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const INPUT_FILE: &str = "input.pdf";
const OUTPUT_PREFIX: &str = "page";

static RE_PAGE_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)").unwrap());

static RE_PAGE_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^Page\s+(\d+)\s+size:\s+([\d.]+)\s+x\s+([\d.]+)\s+pts").unwrap()
});

static RE_OUTPUT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page-(\d+)\.png$").unwrap());

/// Out-of-process poppler engine.
#[derive(Debug, Clone, Default)]
pub struct PopplerRenderer {
    bin_dir: Option<PathBuf>,
}

impl PopplerRenderer {
    /// `bin_dir` is the directory holding `pdfinfo` and `pdftoppm`; `None`
    /// resolves them through `PATH`.
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    fn program(&self, tool: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(tool),
            None => PathBuf::from(tool),
        }
    }

    /// Run a poppler tool to completion and return its stdout.
    async fn run(&self, tool: &str, args: Vec<OsString>) -> Result<String, RenderError> {
        let output = Command::new(self.program(tool))
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::EngineFailure(format!(
                        "{tool} not found; install poppler-utils or set the poppler path"
                    ))
                } else {
                    RenderError::EngineFailure(format!("failed to run {tool}: {e}"))
                }
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_exit(tool, output.status.code(), stderr))
    }
}

#[async_trait]
impl Renderer for PopplerRenderer {
    fn name(&self) -> &'static str {
        "poppler"
    }

    async fn render_pages(
        &self,
        request: &RenderRequest<'_>,
    ) -> Result<RenderedDocument, RenderError> {
        let spec = request.spec;
        let input = request.workdir.join(INPUT_FILE);
        tokio::fs::write(&input, request.document.as_bytes())
            .await
            .map_err(|e| RenderError::EngineFailure(format!("cannot stage document: {e}")))?;

        // ── Page count ───────────────────────────────────────────────────
        let info = self
            .run("pdfinfo", with_password(request.password, vec![input.clone().into()]))
            .await?;
        let page_count = parse_page_count(&info)?;
        debug!("PDF loaded: {} pages", page_count);

        let selected = spec.select_pages(page_count)?;
        let (first, last) = (*selected.start(), *selected.end());

        // ── Size check before any pixel is allocated ─────────────────────
        let sizes = self
            .run(
                "pdfinfo",
                with_password(
                    request.password,
                    vec![
                        "-f".into(),
                        first.to_string().into(),
                        "-l".into(),
                        last.to_string().into(),
                        input.clone().into(),
                    ],
                ),
            )
            .await?;
        let sizes = parse_page_sizes(&sizes);
        for number in selected.clone() {
            let (w, h) = sizes.get(&number).copied().ok_or_else(|| {
                RenderError::EngineFailure(format!("pdfinfo reported no size for page {number}"))
            })?;
            spec.page_pixels(number, w, h)?;
        }

        // ── Rasterise ────────────────────────────────────────────────────
        self.run(
            "pdftoppm",
            with_password(
                request.password,
                vec![
                    "-r".into(),
                    spec.dpi.to_string().into(),
                    "-f".into(),
                    first.to_string().into(),
                    "-l".into(),
                    last.to_string().into(),
                    "-png".into(),
                    input.into(),
                    request.workdir.join(OUTPUT_PREFIX).into(),
                ],
            ),
        )
        .await?;

        let outputs = collect_outputs(request.workdir).await?;
        let mut wanted = Vec::with_capacity(outputs.len());
        for number in selected {
            let path = outputs.get(&number).cloned().ok_or_else(|| {
                RenderError::EngineFailure(format!("pdftoppm produced no image for page {number}"))
            })?;
            wanted.push((number, path));
        }

        let pages = tokio::task::spawn_blocking(move || decode_outputs(wanted))
            .await
            .map_err(|e| RenderError::EngineFailure(format!("decode task panicked: {e}")))??;

        Ok(RenderedDocument { page_count, pages })
    }
}

/// Prepend `-upw <password>` when a password is given.
fn with_password(password: Option<&str>, args: Vec<OsString>) -> Vec<OsString> {
    match password {
        Some(pw) => {
            let mut full: Vec<OsString> = vec!["-upw".into(), pw.into()];
            full.extend(args);
            full
        }
        None => args,
    }
}

fn classify_exit(tool: &str, code: Option<i32>, stderr: String) -> RenderError {
    match code {
        Some(1) | Some(3) => {
            if stderr.is_empty() {
                RenderError::UnreadableDocument(format!("{tool} could not open the document"))
            } else {
                RenderError::UnreadableDocument(stderr)
            }
        }
        Some(c) => RenderError::EngineFailure(format!("{tool} exited with status {c}: {stderr}")),
        None => RenderError::EngineFailure(format!("{tool} was terminated by a signal: {stderr}")),
    }
}

fn parse_page_count(info: &str) -> Result<u32, RenderError> {
    RE_PAGE_COUNT
        .captures(info)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| RenderError::EngineFailure("pdfinfo did not report a page count".into()))
}

fn parse_page_sizes(info: &str) -> BTreeMap<u32, (f32, f32)> {
    RE_PAGE_SIZE
        .captures_iter(info)
        .filter_map(|c| {
            let page = c[1].parse().ok()?;
            let w = c[2].parse().ok()?;
            let h = c[3].parse().ok()?;
            Some((page, (w, h)))
        })
        .collect()
}

/// Map page numbers to the PNGs `pdftoppm` wrote.
///
/// `pdftoppm` zero-pads the number to the width of the last page number
/// (`page-07.png` in a 12-page document), so the digits are parsed rather
/// than formatted.
async fn collect_outputs(workdir: &Path) -> Result<BTreeMap<u32, PathBuf>, RenderError> {
    let mut entries = tokio::fs::read_dir(workdir)
        .await
        .map_err(|e| RenderError::EngineFailure(format!("cannot list output: {e}")))?;

    let mut outputs = BTreeMap::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RenderError::EngineFailure(format!("cannot list output: {e}")))?
    {
        let name = entry.file_name();
        let Some(page) = name.to_str().and_then(output_page_number) else {
            continue;
        };
        outputs.insert(page, entry.path());
    }
    Ok(outputs)
}

fn output_page_number(file_name: &str) -> Option<u32> {
    RE_OUTPUT_FILE
        .captures(file_name)
        .and_then(|c| c[1].parse().ok())
}

fn decode_outputs(wanted: Vec<(u32, PathBuf)>) -> Result<Vec<RasterPage>, RenderError> {
    wanted
        .into_iter()
        .map(|(page, path)| {
            let image = image::open(&path).map_err(|e| {
                RenderError::EngineFailure(format!("unreadable output for page {page}: {e}"))
            })?;
            debug!(
                "Rendered page {} → {}x{} px",
                page,
                image.width(),
                image.height()
            );
            Ok(RasterPage { page, image })
        })
        .collect()
}
