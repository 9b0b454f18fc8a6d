use crate::{
    analyze::mask::is_mask_pixel,
    foundation::core::PixelBuffer,
    foundation::error::{PrintwarpError, PrintwarpResult},
    foundation::math::{luma, to_channel},
};

/// Channel value that encodes zero displacement.
pub const DISPLACEMENT_NEUTRAL: u8 = 128;

/// Default factor applied to luma deviations from the masked average.
pub const DEFAULT_COMPRESSION: f32 = 0.5;

/// Where a mockup's displacement map came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplacementSource {
    /// Normalized from a shipped displacement asset.
    Provided,
    /// Derived from the base photo's own shading.
    Generated,
}

/// Offset map with the base image's shape.
///
/// Red encodes horizontal and green vertical displacement; [`DISPLACEMENT_NEUTRAL`] is zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplacementBuffer {
    pixels: PixelBuffer,
}

impl DisplacementBuffer {
    /// Use an already-encoded map as-is, without normalization.
    pub fn from_encoded(pixels: PixelBuffer) -> Self {
        Self { pixels }
    }

    /// Map with zero offset everywhere.
    pub fn neutral(width: u32, height: u32) -> PrintwarpResult<Self> {
        let n = DISPLACEMENT_NEUTRAL;
        Ok(Self {
            pixels: PixelBuffer::filled(width, height, [n, n, n, 255])?,
        })
    }

    /// Underlying encoded pixels.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Average luma over pixels where the mask qualifies, `None` when no pixel does.
pub fn masked_average_luma(source: &PixelBuffer, mask: &PixelBuffer) -> Option<f32> {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for (s, m) in source
        .as_bytes()
        .chunks_exact(4)
        .zip(mask.as_bytes().chunks_exact(4))
    {
        if !is_mask_pixel([m[0], m[1], m[2], m[3]]) {
            continue;
        }
        sum += f64::from(luma(s[0], s[1], s[2]));
        count += 1;
    }
    (count > 0).then(|| (sum / count as f64) as f32)
}

/// Recenter `source` luma so its masked average maps to 128, scale deviations by `compression`,
/// and write the clamped result to red, green and blue.
///
/// With an empty mask there is nothing to center on and the average is taken as 128.
pub fn normalize_displacement(
    source: &PixelBuffer,
    mask: &PixelBuffer,
    compression: f32,
) -> PrintwarpResult<DisplacementBuffer> {
    if source.dimensions() != mask.dimensions() {
        return Err(PrintwarpError::validation(format!(
            "displacement source {:?} and mask {:?} must share dimensions",
            source.dimensions(),
            mask.dimensions()
        )));
    }
    if !compression.is_finite() || compression < 0.0 {
        return Err(PrintwarpError::validation(
            "displacement compression must be finite and >= 0",
        ));
    }

    let center = f32::from(DISPLACEMENT_NEUTRAL);
    let avg = masked_average_luma(source, mask).unwrap_or_else(|| {
        tracing::warn!("no qualifying mask pixels; displacement left uncentered");
        center
    });

    let mut out = Vec::with_capacity(source.as_bytes().len());
    for px in source.as_bytes().chunks_exact(4) {
        let v = to_channel(center + (luma(px[0], px[1], px[2]) - avg) * compression);
        out.extend_from_slice(&[v, v, v, 255]);
    }

    let (width, height) = source.dimensions();
    Ok(DisplacementBuffer::from_encoded(PixelBuffer::from_raw(
        width, height, out,
    )?))
}

/// Build the mockup's displacement map.
///
/// A provided map and the base photo go through the same normalization; only the source differs.
/// `provided` must already match the base dimensions.
pub fn build_displacement(
    base: &PixelBuffer,
    mask: &PixelBuffer,
    provided: Option<&PixelBuffer>,
    compression: f32,
) -> PrintwarpResult<(DisplacementBuffer, DisplacementSource)> {
    let (source, kind) = match provided {
        Some(map) => (map, DisplacementSource::Provided),
        None => (base, DisplacementSource::Generated),
    };
    tracing::debug!(?kind, "building displacement map");
    let buf = normalize_displacement(source, mask, compression)?;
    Ok((buf, kind))
}

#[cfg(test)]
#[path = "../../tests/unit/analyze/displacement.rs"]
mod tests;
