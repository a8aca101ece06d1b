//! HTTP request handlers.

use super::types::{ApiError, ConvertJsonResponse, ConvertQuery, HealthResponse, OutputMode};
use super::ServerState;
use crate::archive;
use crate::output::ConversionOutput;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "pdfFile";

/// Optional multipart text field with the PDF user password. A form field
/// keeps it out of the request URI and so out of access logs and trace spans.
pub const PASSWORD_FIELD: &str = "password";

/// Download name of the multi-page archive.
pub const ARCHIVE_NAME: &str = "converted_pages.zip";

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>PDF to JPG Converter</title>
  <style>
    body { font-family: system-ui, sans-serif; background: #f3f4f6; display: flex;
           align-items: center; justify-content: center; min-height: 100vh; margin: 0; }
    main { background: #fff; border-radius: 12px; padding: 2rem; max-width: 600px;
           box-shadow: 0 4px 12px rgba(0, 0, 0, .08); }
    button { background: #4f46e5; color: #fff; border: 0; border-radius: 8px;
             padding: .75rem 1.5rem; font-weight: 600; cursor: pointer; }
  </style>
</head>
<body>
  <main>
    <h1>PDF to JPG Converter</h1>
    <p>Single-page PDFs come back as one JPG. Multi-page PDFs come back as a
       zip archive holding one JPG per page.</p>
    <form action="/convert" method="post" enctype="multipart/form-data">
      <p><input type="file" name="pdfFile" accept=".pdf" required></p>
      <p><button type="submit">Convert PDF</button></p>
    </form>
  </main>
</body>
</html>
"#;

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /health`
pub async fn health_check(State(state): State<ServerState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.converter.renderer_name().to_string(),
    })
}

/// `POST /convert`
///
/// # Example
///
/// ```bash
/// curl -X POST 'http://localhost:8080/convert?pages=1-3&dpi=200' \
///   -F "pdfFile=@document.pdf" \
///   -o converted_pages.zip
/// ```
pub async fn convert_pdf(
    State(state): State<ServerState>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Upload {
        status: e.status(),
        message: e.body_text(),
    })?;
    let mut multipart = multipart.map_err(|e| ApiError::Upload {
        status: e.status(),
        message: e.body_text(),
    })?;
    let mut options = query.options()?;
    let mode = query.output_mode()?;

    let upload = read_upload(&mut multipart).await?;
    options.password = upload.password;
    info!(
        "Conversion request: '{}' ({} bytes, pages {})",
        upload.file_name,
        upload.bytes.len(),
        options.pages
    );

    let output = state
        .converter
        .convert(upload.bytes.to_vec(), &options)
        .await
        .map_err(|e| {
            warn!("Conversion of '{}' failed: {}", upload.file_name, e);
            ApiError::from(e)
        })?;

    package(&output, mode)
}

/// The uploaded document, its client-side name and the optional password.
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
    pub password: Option<String>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Read the `pdfFile` part and the `password` field, skipping anything else.
/// The fields may come in either order.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let mut document = None;
    let mut password = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        match field.name() {
            Some(UPLOAD_FIELD) if document.is_none() => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                check_file_name(&file_name)?;
                let bytes = field.bytes().await.map_err(upload_error)?;
                document = Some((file_name, bytes));
            }
            Some(PASSWORD_FIELD) => {
                let text = field.text().await.map_err(upload_error)?;
                password = Some(text).filter(|p| !p.is_empty());
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        document.ok_or_else(|| ApiError::bad_request("No PDF file part in the request"))?;
    Ok(Upload {
        file_name,
        bytes,
        password,
    })
}

fn check_file_name(file_name: &str) -> Result<(), ApiError> {
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    if !file_name.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request(
            "Invalid file type. Please upload a PDF.",
        ));
    }
    Ok(())
}

fn upload_error(e: MultipartError) -> ApiError {
    ApiError::Upload {
        status: e.status(),
        message: e.body_text(),
    }
}

/// Turn a conversion result into the response the client asked for.
pub fn package(output: &ConversionOutput, mode: OutputMode) -> Result<Response, ApiError> {
    match (mode, output.pages.as_slice()) {
        (OutputMode::Json, _) => Ok(Json(ConvertJsonResponse::from(output)).into_response()),
        (OutputMode::Auto, [page]) => Ok(attachment(
            page.format.mime_type(),
            &format!("converted_{}", page.file_name()),
            page.data.clone(),
        )),
        _ => {
            let zip = archive::zip_pages(&output.pages)
                .map_err(|e| ApiError::Packaging(format!("failed to build zip archive: {e}")))?;
            Ok(attachment("application/zip", ARCHIVE_NAME, zip))
        }
    }
}

fn attachment(content_type: &str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}
