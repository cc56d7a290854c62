use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = png_bytes(1, 1, [100, 50, 200, 128]);

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
fn decode_rejects_garbage() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, ThumbError::Load(_)));
    assert!(err.to_string().contains("failed to load: decode image"));
}

#[test]
fn decode_svg_rasterizes_at_natural_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="3"><rect width="4" height="3" fill="#ff0000"/></svg>"##;
    let decoded = decode_image(svg).unwrap();
    assert_eq!((decoded.width, decoded.height), (4, 3));
    assert_eq!(&decoded.rgba8_premul[..4], &[255, 0, 0, 255]);
}

#[test]
fn png_encode_then_decode_keeps_opaque_pixels() {
    let img = DecodedImage::from_straight(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 255]).unwrap();
    let png = encode_png(&img).unwrap();
    let back = decode_image(&png).unwrap();
    assert_eq!(back.rgba8_premul, img.rgba8_premul);
}

#[test]
fn data_url_base64_and_plain_payloads() {
    let url = to_data_url("image/png", &[1, 2, 3]);
    assert!(url.starts_with("data:image/png;base64,"));
    assert_eq!(parse_data_url(&url).unwrap(), vec![1, 2, 3]);

    assert_eq!(
        parse_data_url("data:text/plain,hello").unwrap(),
        b"hello".to_vec()
    );
    assert!(parse_data_url("data:image/png;base64").is_err());
    assert!(parse_data_url("data:image/png;base64,@@@").is_err());
    assert!(parse_data_url("blob:nope").is_err());
}

#[test]
fn from_premul_validates_length() {
    assert!(DecodedImage::from_premul(2, 2, vec![0; 15]).is_err());
}
