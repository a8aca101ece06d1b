//! Zip packaging for multi-page results.
//!
//! Used by the CLI (`--zip`) and by the HTTP service when a conversion yields
//! more than one page. Entries are named `page_N.<ext>` in page order.

use crate::output::RenderedPage;
use std::io::{Cursor, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `pages` as a zip archive into `writer`.
pub fn write_zip<W: Write + Seek>(pages: &[RenderedPage], writer: W) -> zip::result::ZipResult<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for page in pages {
        zip.start_file(page.file_name(), options)?;
        zip.write_all(&page.data)?;
    }

    zip.finish()
}

/// Build the archive in memory.
pub fn zip_pages(pages: &[RenderedPage]) -> zip::result::ZipResult<Vec<u8>> {
    Ok(write_zip(pages, Cursor::new(Vec::new()))?.into_inner())
}
