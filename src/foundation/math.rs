/// Rec. 601 luma weights used for displacement derivation.
pub(crate) const LUMA_R: f32 = 0.299;
pub(crate) const LUMA_G: f32 = 0.587;
pub(crate) const LUMA_B: f32 = 0.114;

pub(crate) fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * f32::from(r) + LUMA_G * f32::from(g) + LUMA_B * f32::from(b)
}

pub(crate) fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// Round to nearest and saturate into a channel value.
pub(crate) fn to_channel(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// `base + (mixed - base) * t` on channel values.
pub(crate) fn lerp(base: f32, mixed: f32, t: f32) -> f32 {
    base + (mixed - base) * t
}
