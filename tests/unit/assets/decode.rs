use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(1, 1, [100, 50, 200, 128]), 4096).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_downscales_to_max_dim_keeping_aspect() {
    let prepared = decode_image(&png_bytes(400, 100, [1, 2, 3, 255]), 200).unwrap();
    assert_eq!(prepared.width, 200);
    assert_eq!(prepared.height, 50);
}

#[test]
fn decode_garbage_is_an_error() {
    assert!(decode_image(b"not an image", 64).is_err());
}

#[test]
fn premul_bytes_length_is_checked() {
    assert!(PreparedImage::from_premul_bytes(&[0u8; 12], 2, 2).is_err());
    let ok = PreparedImage::from_premul_bytes(&[0u8; 16], 2, 2).unwrap();
    assert_eq!(ok.rgba8_premul().len(), 16);
}
