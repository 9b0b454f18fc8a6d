use crate::foundation::error::{PrintwarpError, PrintwarpResult};

/// Upper bound of [`RenderParameters::scale`] in percent.
pub const MAX_SCALE: f32 = 200.0;
/// Upper bound of offsets and displacement intensity in percent.
pub const MAX_PERCENT: f32 = 100.0;

/// User-controlled placement and warp settings, re-supplied on every render.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderParameters {
    /// Design size relative to fitting the mask area, `0..=200` percent.
    pub scale: f32,
    /// Horizontal anchor within the leftover slack of the mask box, `0..=100` (50 centers).
    pub offset_x: f32,
    /// Vertical anchor within the leftover slack of the mask box, `0..=100` (50 centers).
    pub offset_y: f32,
    /// Displacement strength, `0..=100` percent.
    pub displacement_intensity: f32,
}

impl Default for RenderParameters {
    fn default() -> Self {
        ProductPreset::Generic.defaults()
    }
}

impl RenderParameters {
    /// Build and validate parameters.
    pub fn new(
        scale: f32,
        offset_x: f32,
        offset_y: f32,
        displacement_intensity: f32,
    ) -> PrintwarpResult<Self> {
        let p = Self {
            scale,
            offset_x,
            offset_y,
            displacement_intensity,
        };
        p.validate()?;
        Ok(p)
    }

    /// Reject non-finite or out-of-range values.
    pub fn validate(&self) -> PrintwarpResult<()> {
        check_range("scale", self.scale, MAX_SCALE)?;
        check_range("offset_x", self.offset_x, MAX_PERCENT)?;
        check_range("offset_y", self.offset_y, MAX_PERCENT)?;
        check_range(
            "displacement_intensity",
            self.displacement_intensity,
            MAX_PERCENT,
        )
    }

    /// Copy with every field clamped into range; non-finite values fall back to `fallback`.
    pub fn clamped(self, fallback: RenderParameters) -> Self {
        fn clamp(v: f32, max: f32, fallback: f32) -> f32 {
            if v.is_finite() {
                v.clamp(0.0, max)
            } else {
                fallback
            }
        }
        Self {
            scale: clamp(self.scale, MAX_SCALE, fallback.scale),
            offset_x: clamp(self.offset_x, MAX_PERCENT, fallback.offset_x),
            offset_y: clamp(self.offset_y, MAX_PERCENT, fallback.offset_y),
            displacement_intensity: clamp(
                self.displacement_intensity,
                MAX_PERCENT,
                fallback.displacement_intensity,
            ),
        }
    }
}

fn check_range(name: &str, v: f32, max: f32) -> PrintwarpResult<()> {
    if !v.is_finite() || !(0.0..=max).contains(&v) {
        return Err(PrintwarpError::validation(format!(
            "{name} must be within 0..={max}, got {v}"
        )));
    }
    Ok(())
}

/// Built-in default parameter sets for common products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductPreset {
    /// Anything without a dedicated preset.
    Generic,
    /// Apparel front print.
    Tshirt,
    /// Wrap-around mug print.
    Mug,
    /// Framed or flat poster.
    Poster,
}

impl ProductPreset {
    /// Match a product name case-insensitively, falling back to [`ProductPreset::Generic`].
    pub fn from_product_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tshirt" | "t-shirt" | "tee" => Self::Tshirt,
            "mug" => Self::Mug,
            "poster" => Self::Poster,
            _ => Self::Generic,
        }
    }

    /// Parameters restored by a reset.
    pub fn defaults(self) -> RenderParameters {
        let (scale, displacement_intensity) = match self {
            Self::Generic => (70.0, 35.0),
            Self::Tshirt => (70.0, 35.0),
            Self::Mug => (60.0, 30.0),
            Self::Poster => (80.0, 40.0),
        };
        RenderParameters {
            scale,
            offset_x: 50.0,
            offset_y: 50.0,
            displacement_intensity,
        }
    }
}
