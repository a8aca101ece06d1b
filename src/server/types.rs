//! Request, response and error types for the HTTP API.

use crate::config::{ConversionOptions, OutputFormat, PageRange};
use crate::error::{ConversionError, ErrorKind};
use crate::output::{ConversionOutput, ConversionStats};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ── Query ────────────────────────────────────────────────────────────────

/// `POST /convert` query string.
///
/// Every field is text so that malformed values come back as a JSON
/// `invalid_input` error like any other bad request. The password is not a
/// query parameter; it travels in the multipart form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertQuery {
    pub pages: Option<String>,
    pub dpi: Option<String>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub output: Option<String>,
}

impl ConvertQuery {
    pub fn options(&self) -> Result<ConversionOptions, ConversionError> {
        Ok(ConversionOptions {
            pages: match &self.pages {
                Some(p) => p.parse::<PageRange>()?,
                None => PageRange::All,
            },
            dpi: parse_number(self.dpi.as_deref(), "dpi")?,
            format: self
                .format
                .as_deref()
                .map(OutputFormat::from_str)
                .transpose()?,
            jpeg_quality: parse_number(self.quality.as_deref(), "quality")?,
            password: None,
        })
    }

    pub fn output_mode(&self) -> Result<OutputMode, ConversionError> {
        self.output
            .as_deref()
            .map(OutputMode::from_str)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

fn parse_number<T: FromStr>(value: Option<&str>, name: &str) -> Result<Option<T>, ConversionError> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| {
                ConversionError::InvalidInput(format!("invalid {name} '{v}'"))
            })
        })
        .transpose()
}

/// How a successful conversion is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One page → the image itself; several → a zip archive.
    #[default]
    Auto,
    /// Always a zip archive.
    Zip,
    /// JSON with base64 image data.
    Json,
}

impl FromStr for OutputMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "zip" => Ok(Self::Zip),
            "json" => Ok(Self::Json),
            other => Err(ConversionError::InvalidInput(format!(
                "unknown output '{other}', expected auto, zip or json"
            ))),
        }
    }
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
}

/// One page in a JSON response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageJson {
    pub page: u32,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub file_name: String,
    /// Base64 (standard alphabet) encoded image.
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertJsonResponse {
    pub page_count: u32,
    pub dpi: u32,
    pub pages: Vec<PageJson>,
    pub stats: ConversionStats,
}

impl From<&ConversionOutput> for ConvertJsonResponse {
    fn from(output: &ConversionOutput) -> Self {
        Self {
            page_count: output.page_count,
            dpi: output.dpi,
            pages: output
                .pages
                .iter()
                .map(|p| PageJson {
                    page: p.page,
                    width: p.width,
                    height: p.height,
                    format: p.format,
                    file_name: p.file_name(),
                    data: p.to_base64(),
                })
                .collect(),
            stats: output.stats.clone(),
        }
    }
}

/// Error body: `{"error": "<kind>", "message": "<text>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The upload itself is unusable (missing part, wrong file type, body
    /// too large). Carries the status the transport chose.
    Upload { status: StatusCode, message: String },
    /// The pipeline refused or failed the conversion.
    Conversion(ConversionError),
    /// The result could not be packaged.
    Packaging(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Upload {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upload { .. } => ErrorKind::InvalidInput,
            Self::Conversion(e) => e.kind(),
            Self::Packaging(_) => ErrorKind::EngineFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upload { status, .. } => *status,
            Self::Conversion(e) => status_for(e.kind()),
            Self::Packaging(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Upload { message, .. } | Self::Packaging(message) => message.clone(),
            Self::Conversion(e) => e.to_string(),
        }
    }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::PageOutOfRange => StatusCode::BAD_REQUEST,
        ErrorKind::UnreadableDocument => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ResourceExhausted => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::EngineFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ConversionError> for ApiError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.kind(),
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
