use std::io::Cursor;

use super::*;

fn encode_png(w: u32, h: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = encode_png(1, 1, vec![100u8, 50u8, 200u8, 128u8]);

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width, 1);
    assert_eq!(decoded.height, 1);
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
fn fully_transparent_pixels_zero_their_color() {
    let decoded = DecodedImage::from_straight_rgba8(1, 1, vec![9, 9, 9, 0]).unwrap();
    assert_eq!(decoded.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn decode_source_reads_data_uri() {
    let buf = encode_png(3, 2, [10u8, 20, 30, 255].repeat(6));
    let src = ImageSource::from_image_bytes(&buf).unwrap();
    let decoded = decode_source(&src).unwrap();
    assert_eq!((decoded.width, decoded.height), (3, 2));
}

#[test]
fn garbage_bytes_fail_to_decode() {
    assert!(matches!(
        decode_image(b"definitely not a png"),
        Err(ThumbError::Decode(_))
    ));
    assert!(DecodedImage::from_straight_rgba8(2, 2, vec![0; 4]).is_err());
}
