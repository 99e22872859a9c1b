//! CLI binary for tmpl2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ServiceConfig` and runs the HTTP service until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tmpl2pdf::{serve, PdfGenerator, ServiceConfig, TemplateSourceConfig};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINT:
  POST /generate_pdf   body: [{"template": "invoice.html", "data": {...}}, ...]
                       reply: merged PDF (attachment "merged.pdf")
  GET  /health         reply: ok

EXAMPLES:
  # Templates from ./templates, wkhtmltopdf from PATH
  tmpl2pdf --templates-dir ./templates --wkhtmltopdf wkhtmltopdf

  # Templates from a Firebase Storage bucket, cached for 5 minutes
  TMPL2PDF_STORAGE_TOKEN=ya29... tmpl2pdf --source remote --bucket my-app.appspot.com

  # Try it
  curl -X POST localhost:5000/generate_pdf -H 'content-type: application/json' \
       -d '[{"template":"invoice.html","data":{"id":"X1"}}]' -o merged.pdf
"#;

/// Render batches of HTML templates to one merged PDF over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "tmpl2pdf",
    version,
    about = "Render batches of HTML templates to one merged PDF over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "TMPL2PDF_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Where templates come from.
    #[arg(long, env = "TMPL2PDF_SOURCE", value_enum, default_value = "local")]
    source: SourceArg,

    /// Template directory (local source).
    #[arg(long, env = "TMPL2PDF_TEMPLATES_DIR", default_value = "templates")]
    templates_dir: PathBuf,

    /// Storage bucket (remote source), e.g. my-app.appspot.com.
    #[arg(long, env = "TMPL2PDF_BUCKET")]
    bucket: Option<String>,

    /// Storage REST endpoint (remote source).
    #[arg(long, env = "TMPL2PDF_STORAGE_URL", default_value = tmpl2pdf::config::DEFAULT_STORAGE_BASE_URL)]
    storage_url: String,

    /// Bearer token for the storage API (remote source).
    #[arg(long, env = "TMPL2PDF_STORAGE_TOKEN", hide_env_values = true)]
    storage_token: Option<String>,

    /// Object prefix under which templates live (remote source).
    #[arg(long, env = "TMPL2PDF_PREFIX", default_value = "templates")]
    prefix: String,

    /// Seconds a fetched remote template stays fresh.
    #[arg(long, env = "TMPL2PDF_CACHE_TTL", default_value_t = 300)]
    cache_ttl: u64,

    /// Timeout for one storage request, in seconds.
    #[arg(long, env = "TMPL2PDF_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Path to the wkhtmltopdf executable.
    #[arg(long, env = "TMPL2PDF_WKHTMLTOPDF", default_value = "/usr/bin/wkhtmltopdf")]
    wkhtmltopdf: PathBuf,

    /// Answer 500s with a generic message instead of the error text.
    #[arg(long, env = "TMPL2PDF_REDACT_INTERNAL_ERRORS")]
    redact_internal_errors: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TMPL2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TMPL2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SourceArg {
    Local,
    Remote,
}

impl Cli {
    fn source_config(&self) -> Result<TemplateSourceConfig> {
        Ok(match self.source {
            SourceArg::Local => TemplateSourceConfig::local(&self.templates_dir),
            SourceArg::Remote => TemplateSourceConfig::Remote {
                bucket: self
                    .bucket
                    .clone()
                    .context("--bucket (or TMPL2PDF_BUCKET) is required with --source remote")?,
                base_url: self.storage_url.clone(),
                access_token: self.storage_token.clone(),
                prefix: self.prefix.clone(),
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ServiceConfig::builder()
        .bind_addr(cli.bind)
        .source(cli.source_config()?)
        .cache_ttl_secs(cli.cache_ttl)
        .fetch_timeout_secs(cli.fetch_timeout)
        .wkhtmltopdf_path(&cli.wkhtmltopdf)
        .redact_internal_errors(cli.redact_internal_errors)
        .build()
        .context("invalid configuration")?;
    tracing::debug!("{:?}", config);

    if !config.wkhtmltopdf_path.exists() {
        tracing::warn!(
            "{} does not exist; every conversion will fail until it is installed",
            config.wkhtmltopdf_path.display()
        );
    }

    let generator =
        Arc::new(PdfGenerator::from_config(&config).context("failed to set up template source")?);

    serve(generator, &config)
        .await
        .with_context(|| format!("failed to serve on {}", config.bind_addr))
}
