//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tmpl2pdf::{
    ConvertError, LocalTemplates, PdfConverter, PdfGenerator, RemoteTemplates, StorageClient,
    TemplateCache, TemplateSource,
};

pub const BUCKET: &str = "test-bucket";

/// Route library logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stands in for wkhtmltopdf: one page per call, whose only text is the
/// rendered HTML with surrounding whitespace trimmed.
#[derive(Default)]
pub struct MarkerConverter {
    pub calls: AtomicUsize,
}

impl MarkerConverter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfConverter for MarkerConverter {
    fn convert(&self, html: &str) -> Result<Vec<u8>, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(single_page_pdf(html.trim()))
    }
}

/// A converter that always fails, as a crashed wkhtmltopdf would.
pub struct FailingConverter;

impl PdfConverter for FailingConverter {
    fn convert(&self, _html: &str) -> Result<Vec<u8>, ConvertError> {
        Err(ConvertError::Failed {
            program: "wkhtmltopdf".into(),
            status: "exit status: 1".into(),
            stderr: "Segmentation fault".into(),
        })
    }
}

pub fn single_page_pdf(marker: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(marker)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
        ),
    ]));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Text drawn on each page of `pdf`, in page order.
pub fn page_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("response should be a PDF");
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first())
                .filter_map(|o| o.as_str().ok())
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .collect::<String>()
        })
        .collect()
}

/// A temp directory holding `(name, content)` template files.
pub fn template_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
    dir
}

pub fn local_generator(dir: &Path, converter: Arc<dyn PdfConverter>) -> Arc<PdfGenerator> {
    Arc::new(PdfGenerator::new(
        TemplateSource::Local(LocalTemplates::new(dir)),
        converter,
    ))
}

pub fn remote_source(base_url: &str, cache: Arc<TemplateCache>) -> TemplateSource {
    let client = StorageClient::new(
        base_url,
        BUCKET,
        Some("test-token".to_string()),
        std::time::Duration::from_secs(5),
    )
    .unwrap();
    TemplateSource::Remote(RemoteTemplates::new(client, "templates", cache))
}

/// Request path the storage API sees for `templates/<id>`.
pub fn object_path(template_id: &str) -> String {
    format!("/v0/b/{BUCKET}/o/templates%2F{template_id}")
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
