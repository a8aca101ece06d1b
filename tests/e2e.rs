//! End-to-end tests against the real engines.
//!
//! These need libpdfium and/or poppler-utils installed, so they are gated
//! behind the `PDF2IMG_E2E` environment variable and do not run in CI unless
//! explicitly requested. Documents are generated in-process; no fixture files
//! are needed.
//!
//! Run with:
//!   PDF2IMG_E2E=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to one engine:
//!   PDF2IMG_E2E=1 cargo test --test e2e poppler -- --nocapture

use edgequake_pdf2img::{
    ConversionConfig, ConversionOptions, Converter, Engine, EngineConfig, ErrorKind,
    OutputFormat, PageRange,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless PDF2IMG_E2E is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("PDF2IMG_E2E").is_err() {
            println!("SKIP: set PDF2IMG_E2E=1 to run e2e tests");
            return;
        }
    }};
}

/// A well-formed PDF with one blank page per `(width, height)` in points,
/// each carrying a filled rectangle so the raster is not uniform.
fn minimal_pdf(pages: &[(u32, u32)]) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 3 + 2 * i).collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" "),
        pages.len()
    ));
    for (i, (w, h)) in pages.iter().enumerate() {
        let content_id = page_ids[i] + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] /Contents {content_id} 0 R /Resources << >> >>"
        ));
        let stream = format!("0 0 0 rg 10 10 {} {} re f", w / 4, h / 4);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

fn converter(engine: Engine, work_root: PathBuf) -> Converter {
    let config = ConversionConfig::builder()
        .dpi(72)
        .work_dir(work_root)
        .build()
        .unwrap();
    let engine = EngineConfig {
        engine,
        pdfium_library: std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from),
        poppler_path: std::env::var_os("POPPLER_PATH").map(PathBuf::from),
    };
    Converter::from_engine(config, &engine)
}

async fn three_letter_pages(engine: Engine) {
    let root = tempfile::tempdir().unwrap();
    let converter = converter(engine, root.path().to_path_buf());
    let pdf = minimal_pdf(&[(612, 792), (612, 792), (792, 612)]);

    let output = converter
        .convert(pdf, &ConversionOptions::default())
        .await
        .unwrap_or_else(|e| panic!("[{engine:?}] conversion failed: {e}"));

    println!("[{engine:?}] stats: {:?}", output.stats);
    assert_eq!(output.page_count, 3);
    assert_eq!(
        output.pages.iter().map(|p| p.page).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    for page in &output.pages {
        // Engines may round a pixel either way.
        let (w, h) = if page.page == 3 { (792, 612) } else { (612, 792) };
        assert!(
            page.width.abs_diff(w) <= 1 && page.height.abs_diff(h) <= 1,
            "[{engine:?}] page {} is {}x{}",
            page.page,
            page.width,
            page.height
        );
        let decoded = image::load_from_memory(&page.data).expect("valid JPEG");
        assert_eq!((decoded.width(), decoded.height()), (page.width, page.height));
    }
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

async fn single_page_png_at_double_dpi(engine: Engine) {
    let root = tempfile::tempdir().unwrap();
    let converter = converter(engine, root.path().to_path_buf());
    let options = ConversionOptions {
        pages: PageRange::single(2).unwrap(),
        dpi: Some(144),
        format: Some(OutputFormat::Png),
        ..Default::default()
    };

    let output = converter
        .convert(minimal_pdf(&[(100, 200), (300, 150)]), &options)
        .await
        .unwrap_or_else(|e| panic!("[{engine:?}] conversion failed: {e}"));
    assert_eq!(output.pages.len(), 1);
    let page = &output.pages[0];
    assert_eq!(page.page, 2);
    assert!(page.width.abs_diff(600) <= 1 && page.height.abs_diff(300) <= 1);
    assert_eq!(&page.data[..4], b"\x89PNG");
}

async fn failures_are_classified(engine: Engine) {
    let root = tempfile::tempdir().unwrap();
    let converter = converter(engine, root.path().to_path_buf());

    let corrupt = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> garbage".to_vec();
    let err = converter
        .convert(corrupt, &ConversionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnreadableDocument, "[{engine:?}] {err}");

    let options = ConversionOptions {
        pages: PageRange::single(5).unwrap(),
        ..Default::default()
    };
    let err = converter
        .convert(minimal_pdf(&[(612, 792)]), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PageOutOfRange, "[{engine:?}] {err}");

    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

// ── pdfium ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdfium_renders_every_page() {
    e2e_skip_unless_enabled!();
    three_letter_pages(Engine::Pdfium).await;
}

#[tokio::test]
async fn pdfium_single_page_png() {
    e2e_skip_unless_enabled!();
    single_page_png_at_double_dpi(Engine::Pdfium).await;
}

#[tokio::test]
async fn pdfium_failures() {
    e2e_skip_unless_enabled!();
    failures_are_classified(Engine::Pdfium).await;
}

// ── poppler ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn poppler_renders_every_page() {
    e2e_skip_unless_enabled!();
    three_letter_pages(Engine::Poppler).await;
}

#[tokio::test]
async fn poppler_single_page_png() {
    e2e_skip_unless_enabled!();
    single_page_png_at_double_dpi(Engine::Poppler).await;
}

#[tokio::test]
async fn poppler_failures() {
    e2e_skip_unless_enabled!();
    failures_are_classified(Engine::Poppler).await;
}

// ── Always-on sanity check of the generator itself ───────────────────────────

#[test]
fn generated_pdf_is_well_formed() {
    let pdf = minimal_pdf(&[(612, 792), (100, 100)]);
    let text = String::from_utf8(pdf).unwrap();
    assert!(text.starts_with("%PDF-1.4\n"));
    assert!(text.ends_with("%%EOF\n"));
    assert!(text.contains("/Count 2"));

    // Every xref entry must point at the start of its object.
    let xref_at: usize = text
        .rsplit("startxref\n")
        .next()
        .and_then(|t| t.lines().next())
        .and_then(|l| l.parse().ok())
        .unwrap();
    assert!(text[xref_at..].starts_with("xref\n"));
    for (i, line) in text[xref_at..].lines().skip(3).take(6).enumerate() {
        let offset: usize = line[..10].parse().unwrap();
        assert!(
            text[offset..].starts_with(&format!("{} 0 obj", i + 1)),
            "object {} not at {offset}",
            i + 1
        );
    }
}
