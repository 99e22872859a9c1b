//! Error types for the tmpl2pdf library.
//!
//! Every component reports failures through its own narrow error type
//! ([`SourceError`], [`StorageError`], [`RenderError`], [`ConvertError`],
//! [`MergeError`]). The generator classifies those into [`Tmpl2PdfError`]
//! at the point where it knows which request item failed and why, so the
//! HTTP layer only has to map an [`ErrorKind`] to a status code.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client can fix the request (400).
    BadRequest,
    /// A local template does not exist (404).
    NotFound,
    /// Anything unanticipated (500).
    Internal,
}

/// All errors returned by a batch run.
///
/// The `Display` text of each variant is exactly what the HTTP endpoint puts
/// into the `error` field of its JSON body.
#[derive(Debug, Error)]
pub enum Tmpl2PdfError {
    // ── Batch validation ──────────────────────────────────────────────────
    /// The request body is not a JSON array.
    #[error("Expected array of template requests")]
    InvalidBatch,

    /// An item has no usable `template` field.
    #[error("Missing template name")]
    MissingTemplateName { index: usize },

    // ── Template errors ───────────────────────────────────────────────────
    /// A local template file does not exist.
    #[error("Template {template} not found")]
    TemplateNotFound { template: String },

    /// Fetching or rendering a template failed.
    #[error("Template processing failed: {detail}")]
    TemplateProcessing { template: String, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The HTML→PDF converter failed.
    #[error("{0}")]
    Conversion(#[from] ConvertError),

    /// The merger rejected a converted document or could not write the result.
    #[error("{0}")]
    Merge(#[from] MergeError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl Tmpl2PdfError {
    /// Classify this error for transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Tmpl2PdfError::InvalidBatch
            | Tmpl2PdfError::MissingTemplateName { .. }
            | Tmpl2PdfError::TemplateProcessing { .. } => ErrorKind::BadRequest,
            Tmpl2PdfError::TemplateNotFound { .. } => ErrorKind::NotFound,
            Tmpl2PdfError::Conversion(_)
            | Tmpl2PdfError::Merge(_)
            | Tmpl2PdfError::InvalidConfig(_)
            | Tmpl2PdfError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Failure to resolve a template identifier to text.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No file backs this identifier under the template directory.
    #[error("template '{template}' not found under '{}'", dir.display())]
    NotFound { template: String, dir: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read template '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The object store could not deliver the template.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the remote object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store answered 404 for the object.
    #[error("object '{object}' does not exist in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, object: String },

    /// The store answered with another non-success status.
    #[error("storage returned HTTP {status} for '{object}'")]
    Status { object: String, status: u16 },

    /// The request never completed (DNS, TLS, timeout, body decode).
    #[error("storage request for '{object}' failed: {reason}")]
    Transport { object: String, reason: String },

    /// The configured base URL cannot be used to address objects.
    #[error("invalid storage URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Template expansion failed.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl From<minijinja::Error> for RenderError {
    fn from(e: minijinja::Error) -> Self {
        RenderError(e.to_string())
    }
}

/// HTML→PDF conversion failed.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The converter executable could not be started.
    #[error("failed to start '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter exited unsuccessfully.
    #[error("'{}' exited with {status}: {stderr}", program.display())]
    Failed {
        program: PathBuf,
        status: String,
        stderr: String,
    },

    /// The converter succeeded but produced something that is not a PDF.
    #[error("converter output is not a PDF ({len} bytes)")]
    NotAPdf { len: usize },

    /// Any other converter failure.
    #[error("PDF conversion failed: {0}")]
    Other(String),
}

/// PDF concatenation failed.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A converted document could not be parsed.
    #[error("failed to load PDF for item {index}: {detail}")]
    Load { index: usize, detail: String },

    /// The merged document could not be serialised.
    #[error("failed to write merged PDF: {0}")]
    Save(String),
}
