//! HTTP front end over the conversion pipeline.
//!
//! | Route           | Method | Purpose |
//! |-----------------|--------|---------|
//! | `/`             | GET    | minimal upload form |
//! | `/health`       | GET    | liveness probe |
//! | `/convert`      | POST   | multipart upload (`pdfFile`) → image, zip or JSON |
//!
//! Handlers own transport concerns only: reading the upload, mapping query
//! parameters onto [`crate::ConversionOptions`], packaging the result and
//! turning a [`crate::ConversionError`] into a status code. All rendering
//! rules live in [`crate::Converter`].
//!
//! A client disconnect drops the handler future, which drops the conversion
//! and with it the engine and the working directory.

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

use crate::convert::Converter;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for multipart boundaries and part headers on top of the PDF itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// State shared across handlers.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub converter: Converter,
}

impl ServerState {
    pub fn new(converter: Converter) -> Self {
        Self { converter }
    }
}

/// Build the router with all endpoints.
pub fn build_router(state: ServerState) -> Router {
    let body_limit = state
        .converter
        .config()
        .max_input_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/convert", post(convert_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already-bound listener.
pub async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(
            "Listening on http://{} (engine: {})",
            addr,
            state.converter.renderer_name()
        );
    }
    axum::serve(listener, build_router(state)).await
}

/// Bind `addr` and serve until the process exits.
pub async fn start_server(addr: impl ToSocketAddrs, state: ServerState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}
