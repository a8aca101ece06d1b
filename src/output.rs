//! Output types returned by a successful conversion.

use crate::config::OutputFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One encoded page image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    /// 1-indexed page number in the source document.
    pub page: u32,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Encoded image bytes. Not serialised; see [`RenderedPage::to_base64`].
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl RenderedPage {
    /// Conventional file name for this page, e.g. `page_3.jpg`.
    pub fn file_name(&self) -> String {
        format!("page_{}.{}", self.page, self.format.extension())
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

/// Timing of a conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub render_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Sum of encoded image sizes.
    pub output_bytes: usize,
}

/// A complete, ordered page set.
///
/// `pages` is never empty and holds exactly the requested pages in ascending
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub pages: Vec<RenderedPage>,
    /// Total pages in the source document (not just the rendered ones).
    pub page_count: u32,
    pub dpi: u32,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Write each page as `page_N.<ext>` into `dir`, creating it if needed.
    ///
    /// Each image is written to a temporary name and renamed into place, so
    /// an interrupted run never leaves a truncated image behind.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let path = dir.join(page.file_name());
            let tmp_path = path.with_extension("tmp");
            tokio::fs::write(&tmp_path, &page.data).await?;
            tokio::fs::rename(&tmp_path, &path).await?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
