//! HTML → PDF conversion.
//!
//! The converter is an external collaborator behind [`PdfConverter`]. The
//! shipped implementation shells out to `wkhtmltopdf`, feeding HTML on stdin
//! and reading the PDF from stdout, so nothing touches the disk.
//!
//! Converters are synchronous; the generator calls them inside
//! `tokio::task::spawn_blocking` so a slow conversion never stalls the
//! runtime's worker threads.

use crate::error::ConvertError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Converts one HTML document into one PDF byte stream.
pub trait PdfConverter: Send + Sync {
    fn convert(&self, html: &str) -> Result<Vec<u8>, ConvertError>;
}

/// `wkhtmltopdf` driven over pipes.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl WkHtmlToPdf {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append a command-line option, e.g. `--page-size A4`.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--quiet", "--encoding", "utf-8"])
            .args(&self.extra_args)
            // `-` twice: read HTML from stdin, write PDF to stdout.
            .args(["-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl PdfConverter for WkHtmlToPdf {
    fn convert(&self, html: &str) -> Result<Vec<u8>, ConvertError> {
        let mut child = self.command().spawn().map_err(|source| ConvertError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Write stdin from a separate thread: wkhtmltopdf may start emitting
        // output before it has read all input, and both pipes have bounded buffers.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConvertError::Other("stdin not captured".into()))?;
        let input = html.as_bytes().to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .map_err(|e| ConvertError::Other(format!("waiting for converter: {e}")))?;
        // A write error (typically EPIPE) only matters if the exit status or
        // the output says so.
        if writer.join().is_err() {
            return Err(ConvertError::Other("stdin writer panicked".into()));
        }

        if !output.status.success() {
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pdf = output.stdout;
        if !pdf.starts_with(b"%PDF") {
            return Err(ConvertError::NotAPdf { len: pdf.len() });
        }
        debug!("Converted {} bytes of HTML → {} bytes of PDF", html.len(), pdf.len());
        Ok(pdf)
    }
}
