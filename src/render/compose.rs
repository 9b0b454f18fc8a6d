use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::{
    analyze::displacement::DisplacementBuffer,
    foundation::core::PixelBuffer,
    foundation::error::{PrintwarpError, PrintwarpResult},
    foundation::math::{lerp, to_channel, unit},
    render::placement::PixelRect,
};

/// Largest single-axis offset, in pixels, per percent of displacement intensity.
pub const DEFAULT_DISPLACEMENT_PX_PER_PERCENT: f32 = 0.5;

/// Opacity of the multiply-blended shadow overlay.
pub const DEFAULT_SHADOW_OPACITY: f32 = 0.25;

/// Mask and design alphas below this contribute nothing.
pub const MIN_ALPHA: f32 = 0.01;

/// Draw `design` into a transparent canvas of `canvas` size at `rect`, resampling bilinearly.
///
/// With no rectangle the canvas stays fully transparent.
pub fn rasterize_design(
    design: &PixelBuffer,
    rect: Option<PixelRect>,
    canvas: (u32, u32),
) -> PrintwarpResult<PixelBuffer> {
    let mut out = image::RgbaImage::new(canvas.0, canvas.1);
    if let Some(rect) = rect {
        let scaled = design.resized(rect.width, rect.height)?;
        image::imageops::replace(&mut out, &scaled.to_rgba_image(), rect.x, rect.y);
    }
    PixelBuffer::from_rgba_image(out)
}

/// Peak displacement in pixels for an intensity percentage.
pub fn max_displacement(intensity: f32, px_per_percent: f32) -> f32 {
    intensity * px_per_percent
}

/// Signed pixel offset encoded by one displacement channel (128 is zero).
#[inline]
pub fn displacement_offset(channel: u8, max_displacement: f32) -> i64 {
    ((unit(channel) - 0.5) * max_displacement * 2.0).round() as i64
}

/// Edge-clamped sampling coordinate for pixel `(x, y)` moved by `(dx, dy)`.
#[inline]
pub fn sample_coord(x: u32, y: u32, dx: i64, dy: i64, width: u32, height: u32) -> (u32, u32) {
    let sx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1);
    let sy = (i64::from(y) + dy).clamp(0, i64::from(height) - 1);
    (sx as u32, sy as u32)
}

/// Design sampling coordinate for base pixel `(x, y)` under `displacement`.
pub fn displaced_coord(
    displacement: &DisplacementBuffer,
    x: u32,
    y: u32,
    max_displacement: f32,
) -> (u32, u32) {
    let px = displacement.pixels().pixel(x, y);
    let (width, height) = displacement.dimensions();
    sample_coord(
        x,
        y,
        displacement_offset(px[0], max_displacement),
        displacement_offset(px[1], max_displacement),
        width,
        height,
    )
}

/// Borrowed, shape-checked inputs of one compose pass.
#[derive(Clone, Copy, Debug)]
pub struct ComposeInputs<'a> {
    /// Product photo.
    pub base: &'a PixelBuffer,
    /// Printable-area mask.
    pub mask: &'a PixelBuffer,
    /// Offset map.
    pub displacement: &'a DisplacementBuffer,
    /// Design already rasterized onto a base-sized transparent canvas.
    pub design: &'a PixelBuffer,
    /// Optional shadow overlay.
    pub shadow: Option<&'a PixelBuffer>,
    /// Peak offset in pixels.
    pub max_displacement: f32,
    /// Shadow multiply opacity.
    pub shadow_opacity: f32,
}

impl ComposeInputs<'_> {
    fn check_shapes(&self) -> PrintwarpResult<()> {
        let dims = self.base.dimensions();
        let mut others = vec![
            ("mask", self.mask.dimensions()),
            ("displacement", self.displacement.dimensions()),
            ("design", self.design.dimensions()),
        ];
        if let Some(shadow) = self.shadow {
            others.push(("shadow", shadow.dimensions()));
        }
        for (name, d) in others {
            if d != dims {
                return Err(PrintwarpError::validation(format!(
                    "{name} buffer is {d:?}, expected base dimensions {dims:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Displace, multiply-blend and shadow every pixel into a new base-sized buffer.
///
/// Rows are independent; with `parallel` they are spread over the current rayon pool.
/// `should_abort` is polled once per row and a `true` answer discards the pass (`Ok(None)`).
pub fn compose(
    inputs: &ComposeInputs<'_>,
    parallel: bool,
    should_abort: &(dyn Fn() -> bool + Sync),
) -> PrintwarpResult<Option<PixelBuffer>> {
    inputs.check_shapes()?;
    let (width, height) = inputs.base.dimensions();
    let row_bytes = width as usize * 4;
    let mut out = vec![0u8; inputs.base.as_bytes().len()];
    let aborted = AtomicBool::new(false);

    let run_row = |(y, row): (usize, &mut [u8])| {
        if aborted.load(Ordering::Relaxed) {
            return;
        }
        if should_abort() {
            aborted.store(true, Ordering::Relaxed);
            return;
        }
        compose_row(inputs, y as u32, row);
    };

    if parallel {
        out.par_chunks_mut(row_bytes).enumerate().for_each(run_row);
    } else {
        out.chunks_mut(row_bytes).enumerate().for_each(run_row);
    }

    if aborted.load(Ordering::Relaxed) {
        return Ok(None);
    }
    PixelBuffer::from_raw(width, height, out).map(Some)
}

fn compose_row(inputs: &ComposeInputs<'_>, y: u32, row: &mut [u8]) {
    for (x, dst) in row.chunks_exact_mut(4).enumerate() {
        let x = x as u32;
        let mut px = blend_pixel(inputs, x, y);
        if let Some(shadow) = inputs.shadow {
            px = shadow_multiply(px, shadow.pixel(x, y), inputs.shadow_opacity);
        }
        dst.copy_from_slice(&px);
    }
}

fn blend_pixel(inputs: &ComposeInputs<'_>, x: u32, y: u32) -> [u8; 4] {
    let b = inputs.base.pixel(x, y);
    let out = [b[0], b[1], b[2], if b[3] == 0 { 255 } else { b[3] }];

    let m = inputs.mask.pixel(x, y);
    let mask_alpha = unit(m[0]) * unit(m[3]);
    if mask_alpha < MIN_ALPHA {
        return out;
    }

    let (sx, sy) = displaced_coord(inputs.displacement, x, y, inputs.max_displacement);
    let d = inputs.design.pixel(sx, sy);
    let design_alpha = unit(d[3]);
    if design_alpha < MIN_ALPHA {
        return out;
    }

    let blend_alpha = design_alpha * mask_alpha;
    let mut mixed = out;
    for c in 0..3 {
        let base = f32::from(b[c]);
        let multiplied = base * f32::from(d[c]) / 255.0;
        mixed[c] = to_channel(lerp(base, multiplied, blend_alpha));
    }
    mixed
}

/// Multiply `shadow` over `dst` at `opacity`, weighted by the shadow's own alpha.
pub fn shadow_multiply(dst: [u8; 4], shadow: [u8; 4], opacity: f32) -> [u8; 4] {
    let a = unit(shadow[3]) * opacity.clamp(0.0, 1.0);
    if a <= 0.0 {
        return dst;
    }
    let mut out = dst;
    for c in 0..3 {
        let base = f32::from(dst[c]);
        let multiplied = base * f32::from(shadow[c]) / 255.0;
        out[c] = to_channel(lerp(base, multiplied, a));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/compose.rs"]
mod tests;
