//! Service configuration.
//!
//! Everything the service needs at startup lives in [`ServiceConfig`], built
//! via [`ServiceConfigBuilder`]. The binary maps CLI flags and `TMPL2PDF_*`
//! environment variables onto the builder; tests construct configs directly.

use crate::error::Tmpl2PdfError;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Public Firebase Storage REST endpoint.
pub const DEFAULT_STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com";

/// Configuration for the PDF generation service.
///
/// # Example
/// ```rust
/// use tmpl2pdf::{ServiceConfig, TemplateSourceConfig};
///
/// let config = ServiceConfig::builder()
///     .source(TemplateSourceConfig::local("templates"))
///     .cache_ttl_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.cache_ttl_secs, 60);
/// ```
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to. Default: `0.0.0.0:5000`.
    pub bind_addr: SocketAddr,

    /// Where templates come from. Default: local directory `templates`.
    pub source: TemplateSourceConfig,

    /// Lifetime of a cached remote template in seconds. Default: 300.
    ///
    /// Only the remote source caches. Zero disables caching in practice:
    /// every lookup is stale.
    pub cache_ttl_secs: u64,

    /// Path to the `wkhtmltopdf` executable. Default: `/usr/bin/wkhtmltopdf`.
    pub wkhtmltopdf_path: PathBuf,

    /// Timeout for a single object-store download in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Replace the message of 500 responses with a generic one. Default: false.
    ///
    /// Internal errors are always logged in full; this only controls what the
    /// client sees.
    pub redact_internal_errors: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            source: TemplateSourceConfig::default(),
            cache_ttl_secs: 300,
            wkhtmltopdf_path: PathBuf::from("/usr/bin/wkhtmltopdf"),
            fetch_timeout_secs: 30,
            redact_internal_errors: false,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn source(mut self, source: TemplateSourceConfig) -> Self {
        self.config.source = source;
        self
    }

    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.cache_ttl_secs = secs;
        self
    }

    pub fn wkhtmltopdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wkhtmltopdf_path = path.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn redact_internal_errors(mut self, v: bool) -> Self {
        self.config.redact_internal_errors = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, Tmpl2PdfError> {
        match &self.config.source {
            TemplateSourceConfig::Local { dir } => {
                if dir.as_os_str().is_empty() {
                    return Err(Tmpl2PdfError::InvalidConfig(
                        "template directory must not be empty".into(),
                    ));
                }
            }
            TemplateSourceConfig::Remote {
                bucket, base_url, ..
            } => {
                if bucket.trim().is_empty() {
                    return Err(Tmpl2PdfError::InvalidConfig(
                        "storage bucket must not be empty".into(),
                    ));
                }
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(Tmpl2PdfError::InvalidConfig(format!(
                        "storage base URL must be http(s), got '{base_url}'"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which template source the service is built with.
#[derive(Clone, PartialEq, Eq)]
pub enum TemplateSourceConfig {
    /// Read `<dir>/<template_id>` from the local filesystem.
    Local { dir: PathBuf },
    /// Download `<prefix>/<template_id>` from a storage bucket, cached in memory.
    Remote {
        bucket: String,
        base_url: String,
        access_token: Option<String>,
        prefix: String,
    },
}

impl Default for TemplateSourceConfig {
    fn default() -> Self {
        TemplateSourceConfig::local("templates")
    }
}

impl TemplateSourceConfig {
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        TemplateSourceConfig::Local { dir: dir.into() }
    }

    /// Remote source on the public Firebase endpoint with the `templates` prefix.
    pub fn remote(bucket: impl Into<String>) -> Self {
        TemplateSourceConfig::Remote {
            bucket: bucket.into(),
            base_url: DEFAULT_STORAGE_BASE_URL.to_string(),
            access_token: None,
            prefix: "templates".to_string(),
        }
    }
}

impl fmt::Debug for TemplateSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSourceConfig::Local { dir } => {
                f.debug_struct("Local").field("dir", dir).finish()
            }
            TemplateSourceConfig::Remote {
                bucket,
                base_url,
                access_token,
                prefix,
            } => f
                .debug_struct("Remote")
                .field("bucket", bucket)
                .field("base_url", base_url)
                .field("access_token", &access_token.as_ref().map(|_| "<redacted>"))
                .field("prefix", prefix)
                .finish(),
        }
    }
}
