use super::*;

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn pixel_lookup_is_bounds_checked() {
    let mut frame = FrameRGBA::transparent(Canvas {
        width: 2,
        height: 2,
    });
    frame.data[12..16].copy_from_slice(&[9, 8, 7, 255]);
    assert_eq!(frame.pixel(1, 1), Some([9, 8, 7, 255]));
    assert_eq!(frame.pixel(2, 0), None);
}

#[test]
fn png_roundtrip_dimensions() {
    let frame = FrameRGBA::transparent(Canvas {
        width: 4,
        height: 2,
    });
    let png = frame.to_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 2));
}
