//! HTTP API tests: a real listener on an ephemeral port, the fake engine
//! behind it, and reqwest as the client.
//!
//! Run with:
//!   cargo test --features server --test server

#![cfg(feature = "server")]

mod common;

use common::*;
use edgequake_pdf2img::server::{serve, ErrorResponse, ServerState};
use edgequake_pdf2img::{ErrorKind, RenderError};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

struct TestServer {
    base: String,
    handle: tokio::task::JoinHandle<()>,
    _root: tempfile::TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start(renderer: &Arc<FakeRenderer>, max_input_bytes: usize) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path())
        .max_input_bytes(max_input_bytes)
        .render_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let state = ServerState::new(converter(config, renderer));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        serve(listener, state).await.expect("server failed");
    });

    TestServer {
        base: format!("http://{addr}"),
        handle,
        _root: root,
    }
}

fn upload(bytes: Vec<u8>, file_name: &str) -> Form {
    Form::new().part(
        "pdfFile",
        Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .unwrap(),
    )
}

async fn post(server: &TestServer, query: &str, form: Form) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/convert{query}", server.base))
        .multipart(form)
        .send()
        .await
        .expect("request failed")
}

async fn error_body(resp: reqwest::Response) -> ErrorResponse {
    resp.json().await.expect("error body is JSON")
}

fn disposition(resp: &reqwest::Response) -> String {
    resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn health_and_index() {
    let server = start(&FakeRenderer::rendering(), 1 << 20).await;

    let resp = reqwest::get(format!("{}/health", server.base)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["engine"], "fake");
    assert!(json["version"].is_string());

    let resp = reqwest::get(format!("{}/", server.base)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"name="pdfFile""#));
}

#[tokio::test]
async fn single_page_comes_back_as_jpeg() {
    let server = start(&FakeRenderer::rendering(), 1 << 20).await;

    let resp = post(&server, "", upload(fake_pdf(1), "letter.pdf")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/jpeg");
    assert_eq!(
        disposition(&resp),
        "attachment; filename=\"converted_page_1.jpg\""
    );
    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn several_pages_come_back_zipped() {
    let server = start(&FakeRenderer::rendering(), 1 << 20).await;

    let resp = post(&server, "", upload(fake_pdf(3), "Report.PDF")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/zip");
    assert!(disposition(&resp).contains("converted_pages.zip"));

    let body = resp.bytes().await.unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 3);
    for n in 1..=3 {
        let mut data = Vec::new();
        archive
            .by_name(&format!("page_{n}.jpg"))
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }
}

#[tokio::test]
async fn json_output_with_query_options() {
    let server = start(&FakeRenderer::rendering(), 1 << 20).await;

    let resp = post(
        &server,
        "?pages=2-3&dpi=144&format=png&output=json",
        upload(fake_pdf(4), "doc.pdf"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["page_count"], 4);
    assert_eq!(json["dpi"], 144);
    let pages = json["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["page"], 2);
    assert_eq!(pages[0]["width"], 144);
    assert_eq!(pages[1]["file_name"], "page_3.png");
    assert!(!pages[1]["data"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn upload_problems_are_bad_requests() {
    let renderer = FakeRenderer::rendering();
    let server = start(&renderer, 1 << 20).await;

    let wrong_field = Form::new().part("file", Part::bytes(fake_pdf(1)).file_name("a.pdf"));
    let resp = post(&server, "", wrong_field).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = error_body(resp).await;
    assert_eq!(body.error, ErrorKind::InvalidInput);
    assert_eq!(body.message, "No PDF file part in the request");

    let resp = post(&server, "", upload(fake_pdf(1), "scan.png")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(resp).await.message,
        "Invalid file type. Please upload a PDF."
    );

    let resp = post(&server, "", upload(Vec::new(), "empty.pdf")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.error, ErrorKind::InvalidInput);

    let resp = post(&server, "?output=tar", upload(fake_pdf(1), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn conversion_errors_map_to_statuses() {
    let server = start(&FakeRenderer::rendering(), 1 << 20).await;

    let resp = post(&server, "?pages=5", upload(fake_pdf(3), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.error, ErrorKind::PageOutOfRange);

    let resp = post(&server, "", upload(b"not a pdf".to_vec(), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_body(resp).await.error, ErrorKind::UnreadableDocument);

    let resp = post(&server, "?dpi=5000", upload(fake_pdf(1), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_body(resp).await.error, ErrorKind::ResourceExhausted);

    let failing = FakeRenderer::new(Behavior::Fail(RenderError::EngineFailure("boom".into())));
    let server = start(&failing, 1 << 20).await;
    let resp = post(&server, "", upload(fake_pdf(1), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(resp).await.error, ErrorKind::EngineFailure);

    let hanging = FakeRenderer::new(Behavior::Hang(Duration::from_secs(30)));
    let server = start(&hanging, 1 << 20).await;
    let resp = post(&server, "", upload(fake_pdf(1), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error_body(resp).await.error, ErrorKind::Timeout);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let renderer = FakeRenderer::rendering();
    let server = start(&renderer, 1024).await;

    let mut big = fake_pdf(1);
    big.resize(2048, b' ');
    let resp = post(&server, "", upload(big, "big.pdf")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.error, ErrorKind::InvalidInput);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn password_comes_from_the_form_not_the_query() {
    let renderer = FakeRenderer::rendering();
    let server = start(&renderer, 1 << 20).await;

    let resp = post(&server, "?password=leaked", upload(fake_pdf(1), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Text field after the file part.
    let form = upload(fake_pdf(1), "a.pdf").text("password", "s3cret");
    let resp = post(&server, "", form).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(renderer.passwords(), vec![None, Some("s3cret".to_string())]);
}

#[tokio::test]
async fn rejected_requests_still_get_json_errors() {
    let renderer = FakeRenderer::rendering();
    let server = start(&renderer, 1 << 20).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/convert", server.base))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error(), "{}", resp.status());
    assert_eq!(error_body(resp).await.error, ErrorKind::InvalidInput);

    let resp = post(&server, "?dpi=100&dpi=200", upload(fake_pdf(1), "a.pdf")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.error, ErrorKind::InvalidInput);

    assert_eq!(renderer.calls(), 0);
}
