use crate::foundation::core::{MaskBounds, Rect};
use crate::render::params::RenderParameters;

/// Where the design lands on the base canvas, in base pixel coordinates.
///
/// The design is fitted into the mask box preserving aspect ratio, scaled by
/// `scale / 100`, then anchored inside the leftover slack by the offset percentages.
/// Returns `None` for an empty mask box or an empty design.
pub fn design_rect(
    bounds: MaskBounds,
    design_size: (u32, u32),
    params: &RenderParameters,
) -> Option<Rect> {
    let area = bounds.to_rect()?;
    let (dw, dh) = (f64::from(design_size.0), f64::from(design_size.1));
    if dw <= 0.0 || dh <= 0.0 {
        return None;
    }

    let fit = (area.width() / dw).min(area.height() / dh);
    let k = fit * f64::from(params.scale) / 100.0;
    let (w, h) = (dw * k, dh * k);

    let x = area.x0 + (area.width() - w) * f64::from(params.offset_x) / 100.0;
    let y = area.y0 + (area.height() - h) * f64::from(params.offset_y) / 100.0;
    Some(Rect::new(x, y, x + w, y + h))
}

/// Integer raster footprint of a placement rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge; may be negative when the design overhangs the canvas.
    pub x: i64,
    /// Top edge; may be negative when the design overhangs the canvas.
    pub y: i64,
    /// Width in pixels, never zero.
    pub width: u32,
    /// Height in pixels, never zero.
    pub height: u32,
}

impl PixelRect {
    /// Snap `rect` to whole pixels, `None` when it rounds to nothing.
    pub fn from_rect(rect: Rect) -> Option<Self> {
        let width = rect.width().round();
        let height = rect.height().round();
        let max = f64::from(u32::MAX);
        if !(width >= 1.0 && height >= 1.0) || width > max || height > max {
            return None;
        }
        Some(Self {
            x: rect.x0.round() as i64,
            y: rect.y0.round() as i64,
            width: width as u32,
            height: height as u32,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/placement.rs"]
mod tests;
