use std::sync::Arc;

use crate::foundation::error::{PrintwarpError, PrintwarpResult};

pub use kurbo::Rect;

/// Immutable straight-alpha RGBA8 raster.
///
/// Samples are row-major, four bytes per pixel. The byte storage is shared, so cloning a buffer
/// is cheap and never copies pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba8: Arc<Vec<u8>>,
}

impl PixelBuffer {
    /// Wrap raw RGBA8 bytes. `data.len()` must equal `width * height * 4` and both dimensions
    /// must be non-zero.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> PrintwarpResult<Self> {
        if width == 0 || height == 0 {
            return Err(PrintwarpError::validation(
                "pixel buffer dimensions must be non-zero",
            ));
        }
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(PrintwarpError::validation(format!(
                "pixel buffer expects {expected} bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(data),
        })
    }

    /// Buffer of `width x height` pixels all set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> PrintwarpResult<Self> {
        let n = byte_len(width, height)? / 4;
        Self::from_raw(width, height, rgba.repeat(n))
    }

    /// Take ownership of an `image` crate RGBA buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> PrintwarpResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, img.into_raw())
    }

    /// Copy into an `image` crate RGBA buffer for use with `image::imageops`.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        // Length is checked at construction.
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8.to_vec())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw row-major RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.rgba8.as_slice()
    }

    /// RGBA sample at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        let px = &self.rgba8[i..i + 4];
        [px[0], px[1], px[2], px[3]]
    }

    /// Byte offset of pixel `(x, y)`.
    pub fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Bilinear resample to `width x height`. Returns a cheap clone when the size already matches.
    pub fn resized(&self, width: u32, height: u32) -> PrintwarpResult<Self> {
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }
        let img = image::imageops::resize(
            &self.to_rgba_image(),
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        Self::from_rgba_image(img)
    }
}

fn byte_len(width: u32, height: u32) -> PrintwarpResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PrintwarpError::validation("pixel buffer size overflow"))
}

/// Inclusive axis-aligned bounding box of the printable mask area.
///
/// When no pixel qualifies the box is inverted (`left = width, right = 0, top = height,
/// bottom = 0`); check [`MaskBounds::is_empty`] before using it for placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MaskBounds {
    /// Leftmost qualifying column.
    pub left: u32,
    /// Topmost qualifying row.
    pub top: u32,
    /// Rightmost qualifying column (inclusive).
    pub right: u32,
    /// Bottommost qualifying row (inclusive).
    pub bottom: u32,
}

impl MaskBounds {
    /// The inverted box produced for a mask with no qualifying pixel.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            left: width,
            top: height,
            right: 0,
            bottom: 0,
        }
    }

    /// `true` for the inverted degenerate box.
    pub fn is_empty(self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    /// Inclusive width in pixels, `0` when empty.
    pub fn width(self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.right - self.left + 1
        }
    }

    /// Inclusive height in pixels, `0` when empty.
    pub fn height(self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.bottom - self.top + 1
        }
    }

    /// Covered area as a half-open pixel rectangle, `None` when empty.
    pub fn to_rect(self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::new(
            f64::from(self.left),
            f64::from(self.top),
            f64::from(self.right) + 1.0,
            f64::from(self.bottom) + 1.0,
        ))
    }
}
