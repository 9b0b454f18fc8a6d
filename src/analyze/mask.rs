use crate::foundation::core::{MaskBounds, PixelBuffer};

/// Channel threshold for mask qualification.
pub const MASK_THRESHOLD: u8 = 128;

/// A mask pixel is printable when both red and alpha exceed [`MASK_THRESHOLD`].
///
/// The same predicate drives bounds extraction and displacement normalization so the placement
/// rectangle always agrees with the area that is actually composited.
#[inline]
pub fn is_mask_pixel(px: [u8; 4]) -> bool {
    px[0] > MASK_THRESHOLD && px[3] > MASK_THRESHOLD
}

/// Smallest axis-aligned box containing every qualifying mask pixel.
///
/// Disconnected regions are not separated; the box spans all of them. A mask with no qualifying
/// pixel yields [`MaskBounds::empty`].
pub fn mask_bounds(mask: &PixelBuffer) -> MaskBounds {
    let (width, height) = mask.dimensions();
    let mut bounds = MaskBounds::empty(width, height);

    for (y, row) in mask
        .as_bytes()
        .chunks_exact(width as usize * 4)
        .enumerate()
    {
        let y = y as u32;
        for (x, px) in row.chunks_exact(4).enumerate() {
            if !is_mask_pixel([px[0], px[1], px[2], px[3]]) {
                continue;
            }
            let x = x as u32;
            bounds.left = bounds.left.min(x);
            bounds.right = bounds.right.max(x);
            bounds.top = bounds.top.min(y);
            bounds.bottom = bounds.bottom.max(y);
        }
    }

    tracing::debug!(?bounds, empty = bounds.is_empty(), "mask bounds");
    bounds
}

#[cfg(test)]
#[path = "../../tests/unit/analyze/mask.rs"]
mod tests;
