//! # tmpl2pdf
//!
//! Render batches of HTML templates to PDF and merge them into one document.
//!
//! A client posts a JSON array of `{template, data}` items. Each template is
//! looked up (local directory, or a storage bucket behind a TTL cache),
//! expanded with its data, converted to PDF by `wkhtmltopdf`, and the
//! per-item PDFs are concatenated in request order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /generate_pdf
//!  │
//!  ├─ 1. Parse    body must be a JSON array of {template, data}
//!  ├─ 2. Resolve  template id → text (local file, or cached remote object)
//!  ├─ 3. Render   minijinja + render_qrcode filter → HTML
//!  ├─ 4. Convert  wkhtmltopdf, on the blocking pool
//!  └─ 5. Merge    lopdf, page order = request order
//! ```
//!
//! The first failing item aborts the batch; no partial PDF is ever returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tmpl2pdf::{router, PdfGenerator, ServiceConfig, TemplateSourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder()
//!         .source(TemplateSourceConfig::local("templates"))
//!         .build()?;
//!     let generator = Arc::new(PdfGenerator::from_config(&config)?);
//!
//!     // Either mount the router in your own server...
//!     let _app = router(Arc::clone(&generator), config.redact_internal_errors);
//!     // ...or let the crate bind and serve it.
//!     tmpl2pdf::serve(generator, &config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tmpl2pdf` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{CacheEntry, TemplateCache};
pub use config::{ServiceConfig, ServiceConfigBuilder, TemplateSourceConfig};
pub use error::{
    ConvertError, ErrorKind, MergeError, RenderError, SourceError, StorageError, Tmpl2PdfError,
};
pub use generate::PdfGenerator;
pub use pipeline::convert::{PdfConverter, WkHtmlToPdf};
pub use pipeline::merge::PdfMerger;
pub use server::{router, serve};
pub use source::{LocalTemplates, RemoteTemplates, ResolvedTemplate, TemplateSource};
pub use storage::StorageClient;
