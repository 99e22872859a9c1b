//! Request parsing: JSON body → batch of `(template, data)` items.
//!
//! Only the outer shape is checked up front. Items are parsed one at a time
//! as the generator reaches them, so when several items are broken the error
//! reported is the one for the first broken item in batch order.

use crate::error::Tmpl2PdfError;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// One item of a batch.
///
/// `data` is kept as sent; its shape only matters once the template has been
/// resolved, see [`RenderRequest::context`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub template_id: String,
    pub data: Value,
}

impl RenderRequest {
    /// Parse the `index`-th element of a batch. Only the template name is
    /// checked here.
    pub fn from_value(index: usize, item: &Value) -> Result<Self, Tmpl2PdfError> {
        let fields = item
            .as_object()
            .ok_or(Tmpl2PdfError::MissingTemplateName { index })?;

        let template_id = fields
            .get("template")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(Tmpl2PdfError::MissingTemplateName { index })?
            .to_string();

        let data = fields.get("data").cloned().unwrap_or(Value::Null);
        Ok(Self { template_id, data })
    }

    /// The template variables: `data` as an object.
    ///
    /// Absent or `null` data is an empty context. Anything else that is not
    /// an object is a template processing failure.
    pub fn context(&self) -> Result<Cow<'_, Map<String, Value>>, Tmpl2PdfError> {
        match &self.data {
            Value::Null => Ok(Cow::Owned(Map::new())),
            Value::Object(map) => Ok(Cow::Borrowed(map)),
            other => Err(Tmpl2PdfError::TemplateProcessing {
                template: self.template_id.clone(),
                detail: format!(
                    "data for template {} must be an object, got {}",
                    self.template_id,
                    json_type_name(other)
                ),
            }),
        }
    }
}

/// The raw batch: a JSON array whose items are parsed lazily.
#[derive(Debug, Clone)]
pub struct RenderBatch {
    items: Vec<Value>,
}

impl RenderBatch {
    /// Parse a request body. Anything but a JSON array is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, Tmpl2PdfError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| Tmpl2PdfError::InvalidBatch)?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, Tmpl2PdfError> {
        match value {
            Value::Array(items) => Ok(Self { items }),
            _ => Err(Tmpl2PdfError::InvalidBatch),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in batch order, each parsed when reached.
    pub fn requests(&self) -> impl Iterator<Item = Result<RenderRequest, Tmpl2PdfError>> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| RenderRequest::from_value(i, item))
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
