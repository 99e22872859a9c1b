//! QR image encoding: text → QR code → base64 PNG → `<img>` tag.
//!
//! Templates embed QR codes inline as data-URIs so the rendered HTML is
//! self-contained and the PDF converter never has to fetch anything.
//! The symbol parameters are fixed: error-correction level L (~7%
//! redundancy), 10 px per module, and the standard 4-module quiet zone.
//! The QR version grows with the input length.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use tracing::debug;

/// Pixels per QR module.
pub const MODULE_PX: u32 = 10;

/// Encode `value` as a QR code and return the PNG as base64.
///
/// Deterministic: the same input always yields the same bytes.
pub fn make_image(value: &str) -> Result<String, String> {
    let code = QrCode::with_error_correction_level(value.as_bytes(), EcLevel::L)
        .map_err(|e| format!("cannot encode {} bytes as QR code: {e}", value.len()))?;

    let pixels = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PX, MODULE_PX)
        .quiet_zone(true)
        .dark_color(Luma([0]))
        .light_color(Luma([255]))
        .build();

    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(pixels)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded QR ({} input bytes) → {} bytes base64", value.len(), b64.len());
    Ok(b64)
}

/// Wrap `value` as an inline `<img>` QR tag.
///
/// The `style` attribute is emitted only when `style` is non-empty.
pub fn img_tag(value: &str, style: Option<&str>) -> Result<String, String> {
    let b64 = make_image(value)?;
    Ok(match style.filter(|s| !s.is_empty()) {
        Some(style) => format!(
            r#"<img src="data:image/png;base64,{b64}" style="{}">"#,
            html_escape::encode_double_quoted_attribute(style)
        ),
        None => format!(r#"<img src="data:image/png;base64,{b64}">"#),
    })
}
