use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{PrintwarpError, PrintwarpResult};

/// Decode encoded image bytes (PNG, JPEG, ...) into a straight-alpha RGBA8 [`PixelBuffer`].
///
/// Images without an alpha channel come back fully opaque.
pub fn decode_image(bytes: &[u8]) -> PrintwarpResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PrintwarpError::decode(format!("decode image from memory: {e}")))?;
    PixelBuffer::from_rgba_image(dyn_img.to_rgba8())
}

/// Decode a user-supplied design image.
///
/// This is the gate that keeps undecodable input away from the compositing engine.
pub fn decode_design(bytes: &[u8]) -> PrintwarpResult<PixelBuffer> {
    if bytes.is_empty() {
        return Err(PrintwarpError::decode("design image is empty"));
    }
    decode_image(bytes).map_err(|e| match e {
        PrintwarpError::Decode(msg) => {
            PrintwarpError::decode(format!("design is not a decodable image ({msg})"))
        }
        other => other,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
