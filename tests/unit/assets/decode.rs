use std::io::Cursor;

use super::*;

fn png_bytes(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decodes_png_to_premultiplied_rgba() {
    let bytes = png_bytes(vec![100, 50, 200, 128], 1, 1);
    let decoded = decode_background(&BackgroundImage::new(bytes, "image/png")).unwrap();
    assert_eq!((decoded.width, decoded.height), (1, 1));
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn mislabelled_but_decodable_bytes_still_load() {
    let bytes = png_bytes(vec![[0u8, 0, 0, 255]; 4].concat(), 2, 2);
    let decoded = decode_background(&BackgroundImage::new(bytes, "image/jpeg")).unwrap();
    assert_eq!(decoded.width, 2);
}

#[test]
fn corrupted_bytes_are_resource_load_errors() {
    let err = decode_background(&BackgroundImage::new(vec![0xde, 0xad, 0xbe, 0xef], "image/png"))
        .unwrap_err();
    assert!(matches!(err, VoxframeError::ResourceLoad(_)));

    let err = decode_background(&BackgroundImage::new(Vec::new(), "image/png")).unwrap_err();
    assert!(matches!(err, VoxframeError::ResourceLoad(_)));
}

#[test]
fn unknown_mime_type_is_rejected_before_decoding() {
    let bytes = png_bytes(vec![0, 0, 0, 255], 1, 1);
    let err = decode_background(&BackgroundImage::new(bytes, "text/plain")).unwrap_err();
    assert!(matches!(err, VoxframeError::ResourceLoad(_)));
}

#[test]
fn mime_parameters_and_case_are_ignored() {
    assert_eq!(image_format("IMAGE/PNG; q=1"), Some(image::ImageFormat::Png));
    assert_eq!(BackgroundImage::mime_for_extension("JPG"), Some("image/jpeg"));
    assert_eq!(BackgroundImage::mime_for_extension("tiff"), None);
}
