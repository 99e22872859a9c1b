//! Template rendering: template text + JSON data → HTML.
//!
//! Expansion is delegated to `minijinja`, which speaks the Jinja2 dialect
//! the templates are written in (variables, `if`, `for`, attribute access,
//! built-in filters). The only addition is the `render_qrcode` filter:
//!
//! ```text
//! {{ invoice.url | render_qrcode }}
//! {{ invoice.url | render_qrcode(style="width: 120px") }}
//! ```
//!
//! Non-string filter input is stringified the Jinja2 way, so `true`, `false`
//! and `none` encode as `True`, `False` and `None`.
//!
//! Keys of the request's `data` object become top-level template variables.
//! Autoescaping is off: templates author HTML and data is inserted verbatim.

use crate::error::RenderError;
use crate::pipeline::encode;
use minijinja::value::{Kwargs, Value, ValueKind};
use minijinja::{AutoEscape, Environment, ErrorKind};
use serde_json::{Map, Value as Json};

/// Name under which the QR filter is registered.
pub const QR_FILTER: &str = "render_qrcode";

/// Reusable rendering environment with the custom filter registered.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter(QR_FILTER, render_qrcode);
        Self { env }
    }

    /// Render `template` with `data` as its context.
    ///
    /// `name` only appears in error messages.
    pub fn render(
        &self,
        name: &str,
        template: &str,
        data: &Map<String, Json>,
    ) -> Result<String, RenderError> {
        Ok(self.env.render_named_str(name, template, data)?)
    }
}

/// `value | render_qrcode(style=None)`
fn render_qrcode(
    value: &Value,
    style: Option<String>,
    kwargs: Kwargs,
) -> Result<Value, minijinja::Error> {
    let kw_style: Option<String> = kwargs.get("style")?;
    kwargs.assert_all_used()?;

    let text = qr_text(value);
    let style = style.or(kw_style);

    let tag = encode::img_tag(&text, style.as_deref())
        .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e))?;
    Ok(Value::from_safe_string(tag))
}

/// Text encoded in the QR code for `value`.
fn qr_text(value: &Value) -> String {
    if let Some(s) = value.as_str() {
        return s.to_string();
    }
    match value.kind() {
        ValueKind::Bool if value.is_true() => "True".to_string(),
        ValueKind::Bool => "False".to_string(),
        ValueKind::None => "None".to_string(),
        _ => value.to_string(),
    }
}
