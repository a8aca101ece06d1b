//! Image encoding: `DynamicImage` → JPEG or PNG bytes.
//!
//! JPEG has no alpha channel, so pages are flattened to RGB first. PNG keeps
//! whatever colour type the engine produced.

use crate::config::OutputFormat;
use crate::error::ConversionError;
use crate::output::RenderedPage;
use crate::render::RasterPage;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode one rasterised page.
pub fn encode_page(
    img: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, jpeg_quality))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
    }
    Ok(buf)
}

/// Encode every page, preserving order.
///
/// CPU-bound; callers on the async runtime should run it through
/// [`encode_pages_blocking`].
pub fn encode_pages(
    pages: Vec<RasterPage>,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<RenderedPage>, ConversionError> {
    pages
        .into_iter()
        .map(|raster| {
            let data = encode_page(&raster.image, format, jpeg_quality).map_err(|e| {
                ConversionError::EngineFailure(format!(
                    "failed to encode page {}: {e}",
                    raster.page
                ))
            })?;
            debug!(
                "Encoded page {} → {} bytes {}",
                raster.page,
                data.len(),
                format.extension()
            );
            Ok(RenderedPage {
                page: raster.page,
                width: raster.image.width(),
                height: raster.image.height(),
                format,
                data,
            })
        })
        .collect()
}

/// [`encode_pages`] on Tokio's blocking pool.
pub async fn encode_pages_blocking(
    pages: Vec<RasterPage>,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<RenderedPage>, ConversionError> {
    tokio::task::spawn_blocking(move || encode_pages(pages, format, jpeg_quality))
        .await
        .map_err(|e| ConversionError::EngineFailure(format!("encode task panicked: {e}")))?
}
