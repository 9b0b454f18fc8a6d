use std::io::Cursor;

use super::*;

fn encode_png(img: image::DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_keeps_straight_alpha() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
    let buf = encode_png(image::DynamicImage::ImageRgba8(img));

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.dimensions(), (1, 1));
    assert_eq!(decoded.as_bytes(), &[100, 50, 200, 128]);
}

#[test]
fn decode_rgb_image_is_opaque() {
    let img = image::RgbImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
    let buf = encode_png(image::DynamicImage::ImageRgb8(img));

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.pixel(0, 0), [1, 2, 3, 255]);
    assert_eq!(decoded.pixel(1, 0), [4, 5, 6, 255]);
}

#[test]
fn decode_design_rejects_garbage() {
    let err = decode_design(b"definitely not a png").unwrap_err();
    assert!(matches!(err, PrintwarpError::Decode(_)));
    assert!(err.to_string().contains("design"));

    assert!(matches!(
        decode_design(&[]).unwrap_err(),
        PrintwarpError::Decode(_)
    ));
}
