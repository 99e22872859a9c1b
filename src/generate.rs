//! Batch orchestration: the request body in, one merged PDF out.
//!
//! Items are processed strictly in order and the first failure aborts the
//! batch. Nothing is returned until every item has been resolved, rendered,
//! converted and appended, so a caller never sees a partial document.

use crate::config::ServiceConfig;
use crate::error::{MergeError, SourceError, Tmpl2PdfError};
use crate::pipeline::convert::{PdfConverter, WkHtmlToPdf};
use crate::pipeline::merge::PdfMerger;
use crate::pipeline::render::Renderer;
use crate::pipeline::request::{RenderBatch, RenderRequest};
use crate::source::TemplateSource;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns batches of `(template, data)` items into merged PDFs.
///
/// Shared across requests behind an `Arc`; the only mutable state it reaches
/// is the remote template cache.
pub struct PdfGenerator {
    source: TemplateSource,
    renderer: Renderer,
    converter: Arc<dyn PdfConverter>,
}

impl std::fmt::Debug for PdfGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfGenerator")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl PdfGenerator {
    pub fn new(source: TemplateSource, converter: Arc<dyn PdfConverter>) -> Self {
        Self {
            source,
            renderer: Renderer::new(),
            converter,
        }
    }

    /// Build a generator backed by `wkhtmltopdf` and the configured source.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, Tmpl2PdfError> {
        let source = TemplateSource::from_config(config)?;
        let converter = Arc::new(WkHtmlToPdf::new(&config.wkhtmltopdf_path));
        Ok(Self::new(source, converter))
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Parse a raw request body and process it.
    pub async fn generate(&self, body: &[u8]) -> Result<Vec<u8>, Tmpl2PdfError> {
        let batch = RenderBatch::from_slice(body)?;
        self.process(&batch).await
    }

    /// Render, convert and merge every item of `batch`, in order.
    pub async fn process(&self, batch: &RenderBatch) -> Result<Vec<u8>, Tmpl2PdfError> {
        let start = Instant::now();
        info!("Processing batch of {} item(s)", batch.len());

        let mut merger = PdfMerger::new();
        for (index, request) in batch.requests().enumerate() {
            let request = request?;
            let pdf = self.process_item(index, &request).await?;
            // Parsing the converted PDF is CPU-bound; the merger travels to
            // the blocking pool and back.
            merger = tokio::task::spawn_blocking(move || {
                merger.append(&pdf)?;
                Ok::<_, MergeError>(merger)
            })
            .await
            .map_err(|e| Tmpl2PdfError::Internal(format!("Merge task panicked: {}", e)))??;
        }

        let pages = merger.page_count();
        let merged = tokio::task::spawn_blocking(move || merger.finish())
            .await
            .map_err(|e| Tmpl2PdfError::Internal(format!("Merge task panicked: {}", e)))??;

        info!(
            "Merged {} item(s) into {} page(s), {} bytes in {}ms",
            batch.len(),
            pages,
            merged.len(),
            start.elapsed().as_millis()
        );
        Ok(merged)
    }

    async fn process_item(
        &self,
        index: usize,
        request: &RenderRequest,
    ) -> Result<Vec<u8>, Tmpl2PdfError> {
        let id = &request.template_id;

        let template = self
            .source
            .resolve(id)
            .await
            .map_err(|e| classify_source_error(id, e))?;
        debug!(
            "Item {}: resolved '{}' ({} bytes, cached: {})",
            index,
            id,
            template.content.len(),
            template.up_to_date
        );

        let context = request.context()?;
        let html = self
            .renderer
            .render(id, &template.content, &context)
            .map_err(|e| Tmpl2PdfError::TemplateProcessing {
                template: id.clone(),
                detail: e.to_string(),
            })?;

        let converter = Arc::clone(&self.converter);
        let pdf = tokio::task::spawn_blocking(move || converter.convert(&html))
            .await
            .map_err(|e| Tmpl2PdfError::Internal(format!("Conversion task panicked: {}", e)))??;
        debug!("Item {}: converted '{}' → {} bytes", index, id, pdf.len());
        Ok(pdf)
    }
}

/// Local misses are 404s; any remote failure is a processing error the
/// client can act on. Unreadable local files are internal.
fn classify_source_error(template: &str, err: SourceError) -> Tmpl2PdfError {
    match err {
        SourceError::NotFound { .. } => Tmpl2PdfError::TemplateNotFound {
            template: template.to_string(),
        },
        SourceError::Storage(e) => {
            warn!("Fetching template '{}' failed: {}", template, e);
            Tmpl2PdfError::TemplateProcessing {
                template: template.to_string(),
                detail: e.to_string(),
            }
        }
        SourceError::Io { .. } => Tmpl2PdfError::Internal(err.to_string()),
    }
}
