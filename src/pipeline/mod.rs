//! Pipeline stages for template-to-PDF generation.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. Template lookup lives outside the pipeline, in [`crate::source`].
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ render ──▶ convert ──▶ merge
//! (JSON)     (minijinja) (wkhtmltopdf) (lopdf)
//!               │
//!               └── encode (render_qrcode filter: QR → PNG → data-URI)
//! ```
//!
//! 1. [`request`] parses the body into `(template, data)` items
//! 2. [`render`] expands a template against its data
//! 3. [`encode`] backs the `render_qrcode` filter
//! 4. [`convert`] turns HTML into PDF bytes; blocking, so it runs in
//!    `spawn_blocking`
//! 5. [`merge`] concatenates the per-item PDFs in batch order

pub mod convert;
pub mod encode;
pub mod merge;
pub mod render;
pub mod request;
