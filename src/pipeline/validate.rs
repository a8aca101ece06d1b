//! Structural validation: cheap checks that run before any engine is touched.

use crate::config::{ConversionConfig, ConversionOptions, OutputFormat};
use crate::document::SourceDocument;
use crate::error::ConversionError;

/// Request options after defaults are applied and ceilings checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub dpi: u32,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
}

/// Reject requests that can be refused without rendering.
///
/// Order matters only for which error a doubly-broken request reports: size
/// problems first, then option problems, then the header sniff.
pub fn validate(
    document: &SourceDocument,
    options: &ConversionOptions,
    config: &ConversionConfig,
) -> Result<Settings, ConversionError> {
    if document.is_empty() {
        return Err(ConversionError::InvalidInput("document is empty".into()));
    }
    if document.len() > config.max_input_bytes {
        return Err(ConversionError::InvalidInput(format!(
            "document is {} bytes, limit is {} bytes",
            document.len(),
            config.max_input_bytes
        )));
    }

    let dpi = options.dpi.unwrap_or(config.dpi);
    if dpi == 0 {
        return Err(ConversionError::InvalidInput("DPI must be positive".into()));
    }
    if dpi > config.max_dpi {
        return Err(ConversionError::ResourceExhausted(format!(
            "{dpi} DPI requested, limit is {} DPI",
            config.max_dpi
        )));
    }

    let jpeg_quality = options.jpeg_quality.unwrap_or(config.jpeg_quality);
    if !(1..=100).contains(&jpeg_quality) {
        return Err(ConversionError::InvalidInput(format!(
            "JPEG quality must be 1–100, got {jpeg_quality}"
        )));
    }

    if !document.has_pdf_header() {
        return Err(ConversionError::UnreadableDocument(
            "no %PDF- header found".into(),
        ));
    }

    Ok(Settings {
        dpi,
        format: options.format.unwrap_or(config.format),
        jpeg_quality,
    })
}
