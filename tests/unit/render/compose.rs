use super::*;
use crate::render::params::RenderParameters;
use crate::render::placement::design_rect;

fn varied_base(width: u32, height: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[
                (x * 37 + y * 11) as u8,
                (200 - x * 3 - y) as u8,
                (17 + x * y * 5) as u8,
                255,
            ]);
        }
    }
    PixelBuffer::from_raw(width, height, data).unwrap()
}

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
    PixelBuffer::filled(width, height, rgba).unwrap()
}

fn run(inputs: &ComposeInputs<'_>) -> PixelBuffer {
    compose(inputs, false, &|| false).unwrap().unwrap()
}

fn placed_design(
    design: &PixelBuffer,
    mask: &PixelBuffer,
    params: &RenderParameters,
) -> PixelBuffer {
    let bounds = crate::analyze::mask::mask_bounds(mask);
    let rect = design_rect(bounds, design.dimensions(), params).and_then(PixelRect::from_rect);
    rasterize_design(design, rect, mask.dimensions()).unwrap()
}

#[test]
fn offset_encoding_is_centered_on_128() {
    assert_eq!(displacement_offset(128, 50.0), 0);
    assert_eq!(displacement_offset(255, 50.0), 50);
    assert_eq!(displacement_offset(0, 50.0), -50);
    assert_eq!(displacement_offset(255, 0.0), 0);
}

#[test]
fn sample_coord_clamps_to_edges() {
    assert_eq!(sample_coord(3, 2, 10, 0, 8, 4), (7, 2));
    assert_eq!(sample_coord(3, 2, -10, -10, 8, 4), (0, 0));
    assert_eq!(sample_coord(3, 2, 1, 1, 8, 4), (4, 3));
}

#[test]
fn scenario_a_uniform_gray_design_multiplies_base() {
    let base = varied_base(4, 4);
    let mask = solid(4, 4, [255, 255, 255, 255]);
    let displacement = DisplacementBuffer::neutral(4, 4).unwrap();
    let params = RenderParameters::new(100.0, 50.0, 50.0, 0.0).unwrap();
    let design = placed_design(&solid(4, 4, [128, 128, 128, 255]), &mask, &params);

    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: max_displacement(params.displacement_intensity, 0.5),
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });

    for y in 0..4 {
        for x in 0..4 {
            let b = base.pixel(x, y);
            let o = out.pixel(x, y);
            for c in 0..3 {
                let expected = (f32::from(b[c]) * 128.0 / 255.0).round() as u8;
                assert_eq!(o[c], expected, "pixel ({x},{y}) channel {c}");
            }
            assert_eq!(o[3], 255);
        }
    }
}

#[test]
fn scenario_b_transparent_design_leaves_base() {
    let base = varied_base(4, 4);
    let mask = solid(4, 4, [255, 255, 255, 255]);
    let displacement = DisplacementBuffer::neutral(4, 4).unwrap();
    let params = RenderParameters::new(100.0, 50.0, 50.0, 0.0).unwrap();
    let design = placed_design(&solid(4, 4, [128, 128, 128, 0]), &mask, &params);

    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });
    assert_eq!(out, base);
}

#[test]
fn scenario_c_max_red_shifts_sampling_right() {
    let (w, h) = (80u32, 3u32);
    let displacement = DisplacementBuffer::from_encoded(solid(w, h, [255, 128, 128, 255]));
    let max = max_displacement(100.0, DEFAULT_DISPLACEMENT_PX_PER_PERCENT);
    assert_eq!(max, 50.0);

    for y in 0..h {
        for x in 0..w {
            assert_eq!(
                displaced_coord(&displacement, x, y, max),
                ((x + 50).min(w - 1), y)
            );
        }
    }

    // End to end: each design column carries its own red value.
    let mut data = Vec::new();
    for _y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 3) as u8, 255, 255, 255]);
        }
    }
    let design = PixelBuffer::from_raw(w, h, data).unwrap();
    let base = solid(w, h, [255, 255, 255, 255]);
    let mask = solid(w, h, [255, 255, 255, 255]);
    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: max,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });
    for x in 0..w {
        let sx = (x + 50).min(w - 1);
        assert_eq!(out.pixel(x, 1)[0], (sx * 3) as u8);
    }
}

#[test]
fn masked_out_pixels_are_bit_identical_to_base() {
    let (w, h) = (6u32, 5u32);
    let base = varied_base(w, h);
    let mut mask_data = Vec::new();
    for y in 0..h {
        for x in 0..w {
            // mixes fully off, red-only, alpha-only and faint pixels with on pixels
            let px = match (x + y) % 4 {
                0 => [0, 0, 0, 0],
                1 => [255, 255, 255, 1],
                2 => [1, 0, 0, 255],
                _ => [255, 255, 255, 255],
            };
            mask_data.extend_from_slice(&px);
        }
    }
    let mask = PixelBuffer::from_raw(w, h, mask_data).unwrap();
    let displacement = DisplacementBuffer::neutral(w, h).unwrap();
    let design = solid(w, h, [10, 20, 30, 255]);

    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });

    for y in 0..h {
        for x in 0..w {
            let m = mask.pixel(x, y);
            let mask_alpha = unit(m[0]) * unit(m[3]);
            if mask_alpha < MIN_ALPHA {
                assert_eq!(out.pixel(x, y), base.pixel(x, y));
            } else {
                assert_ne!(out.pixel(x, y), base.pixel(x, y));
            }
        }
    }
}

#[test]
fn transparent_design_pixels_are_bit_identical_to_base() {
    let (w, h) = (5u32, 5u32);
    let base = varied_base(w, h);
    let mask = solid(w, h, [255, 255, 255, 255]);
    let displacement = DisplacementBuffer::neutral(w, h).unwrap();
    let mut design_data = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let a = if (x * y) % 2 == 0 { 2 } else { 255 };
            design_data.extend_from_slice(&[0, 0, 0, a]);
        }
    }
    let design = PixelBuffer::from_raw(w, h, design_data).unwrap();

    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });
    for y in 0..h {
        for x in 0..w {
            if (x * y) % 2 == 0 {
                assert_eq!(out.pixel(x, y), base.pixel(x, y));
            } else {
                assert_eq!(&out.pixel(x, y)[..3], &[0, 0, 0]);
            }
        }
    }
}

#[test]
fn white_design_is_multiply_identity() {
    let base = varied_base(7, 3);
    let mask = solid(7, 3, [255, 255, 255, 255]);
    let displacement = DisplacementBuffer::neutral(7, 3).unwrap();
    let design = solid(7, 3, [255, 255, 255, 255]);
    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });
    assert_eq!(out, base);
}

#[test]
fn partial_mask_alpha_interpolates() {
    let base = solid(1, 1, [200, 100, 50, 255]);
    let mask = solid(1, 1, [255, 255, 255, 128]);
    let displacement = DisplacementBuffer::neutral(1, 1).unwrap();
    let design = solid(1, 1, [0, 0, 0, 255]);
    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });
    let t = 128.0f32 / 255.0;
    let expect = |b: f32| (b - b * t).round() as u8;
    assert_eq!(out.pixel(0, 0), [expect(200.0), expect(100.0), expect(50.0), 255]);
}

#[test]
fn transparent_base_is_forced_opaque() {
    let base = solid(2, 1, [9, 9, 9, 0]);
    let mask = solid(2, 1, [0, 0, 0, 0]);
    let displacement = DisplacementBuffer::neutral(2, 1).unwrap();
    let design = solid(2, 1, [0, 0, 0, 0]);
    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    });
    assert_eq!(out.pixel(0, 0), [9, 9, 9, 255]);
}

#[test]
fn shadow_applies_outside_the_mask() {
    let base = solid(2, 2, [200, 200, 200, 255]);
    let mask = solid(2, 2, [0, 0, 0, 0]);
    let displacement = DisplacementBuffer::neutral(2, 2).unwrap();
    let design = solid(2, 2, [0, 0, 0, 0]);
    let shadow = solid(2, 2, [0, 0, 0, 255]);
    let out = run(&ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: Some(&shadow),
        max_displacement: 0.0,
        shadow_opacity: 0.25,
    });
    assert_eq!(out.pixel(1, 1), [150, 150, 150, 255]);
}

#[test]
fn shadow_multiply_identities() {
    let dst = [120, 80, 40, 255];
    assert_eq!(shadow_multiply(dst, [255, 255, 255, 255], 0.6), dst);
    assert_eq!(shadow_multiply(dst, [0, 0, 0, 0], 1.0), dst);
    assert_eq!(shadow_multiply(dst, [0, 0, 0, 255], 0.0), dst);
    assert_eq!(shadow_multiply(dst, [0, 0, 0, 255], 1.0), [0, 0, 0, 255]);
}

#[test]
fn parallel_and_sequential_agree() {
    let (w, h) = (33u32, 17u32);
    let base = varied_base(w, h);
    let mask = solid(w, h, [255, 255, 255, 255]);
    let displacement = crate::analyze::displacement::normalize_displacement(&base, &mask, 0.5)
        .unwrap();
    let params = RenderParameters::new(80.0, 30.0, 60.0, 40.0).unwrap();
    let design = placed_design(&varied_base(9, 5), &mask, &params);
    let shadow = solid(w, h, [90, 90, 90, 200]);
    let inputs = ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &design,
        shadow: Some(&shadow),
        max_displacement: max_displacement(params.displacement_intensity, 0.5),
        shadow_opacity: 0.25,
    };

    let seq = compose(&inputs, false, &|| false).unwrap().unwrap();
    let par = compose(&inputs, true, &|| false).unwrap().unwrap();
    assert_eq!(seq, par);
}

#[test]
fn abort_discards_the_pass() {
    let base = varied_base(4, 4);
    let mask = solid(4, 4, [255, 255, 255, 255]);
    let displacement = DisplacementBuffer::neutral(4, 4).unwrap();
    let inputs = ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &base,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    };
    assert!(compose(&inputs, true, &|| true).unwrap().is_none());
}

#[test]
fn shape_mismatch_is_rejected() {
    let base = varied_base(4, 4);
    let mask = solid(3, 4, [255, 255, 255, 255]);
    let displacement = DisplacementBuffer::neutral(4, 4).unwrap();
    let inputs = ComposeInputs {
        base: &base,
        mask: &mask,
        displacement: &displacement,
        design: &base,
        shadow: None,
        max_displacement: 0.0,
        shadow_opacity: DEFAULT_SHADOW_OPACITY,
    };
    assert!(compose(&inputs, false, &|| false).is_err());
}

#[test]
fn rasterized_design_is_transparent_outside_rect() {
    let design = solid(2, 2, [10, 20, 30, 255]);
    let rect = PixelRect {
        x: 1,
        y: 1,
        width: 2,
        height: 2,
    };
    let canvas = rasterize_design(&design, Some(rect), (4, 4)).unwrap();
    assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(canvas.pixel(1, 1), [10, 20, 30, 255]);
    assert_eq!(canvas.pixel(2, 2), [10, 20, 30, 255]);
    assert_eq!(canvas.pixel(3, 3), [0, 0, 0, 0]);

    let empty = rasterize_design(&design, None, (4, 4)).unwrap();
    assert!(empty.as_bytes().iter().all(|&b| b == 0));
}
