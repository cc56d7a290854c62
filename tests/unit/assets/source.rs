use std::io::Cursor;

use super::*;
use crate::assets::decode::to_data_url;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn classifies_source_strings() {
    assert!(matches!(
        ImageSource::parse("data:image/png;base64,AAAA"),
        ImageSource::DataUrl(_)
    ));
    assert!(matches!(
        ImageSource::parse("blob:thumbkit/3"),
        ImageSource::Object(_)
    ));
    assert_eq!(
        ImageSource::parse("file:///tmp/a.png"),
        ImageSource::Path(PathBuf::from("/tmp/a.png"))
    );
    assert!(matches!(
        ImageSource::parse("https://example.com/a.png"),
        ImageSource::Remote(_)
    ));
    assert_eq!(
        ImageSource::parse("shots/a.png"),
        ImageSource::Path(PathBuf::from("shots/a.png"))
    );
}

#[test]
fn serde_uses_plain_strings() {
    let src: ImageSource = serde_json::from_str("\"blob:thumbkit/1\"").unwrap();
    assert_eq!(src, ImageSource::Object("blob:thumbkit/1".to_owned()));
    assert_eq!(serde_json::to_string(&src).unwrap(), "\"blob:thumbkit/1\"");
}

#[test]
fn loads_data_urls_and_object_urls() {
    let png = png_bytes(3, 2, [1, 2, 3, 255]);
    let loader = ImageLoader::default();

    let img = loader
        .load(&ImageSource::parse(&to_data_url("image/png", &png)))
        .unwrap();
    assert_eq!((img.width, img.height), (3, 2));

    let url = loader.store().register(png).unwrap();
    let img = loader.load(&ImageSource::parse(url.as_str())).unwrap();
    assert_eq!((img.width, img.height), (3, 2));
}

#[test]
fn load_failures_are_load_errors() {
    let loader = ImageLoader::default().with_base_dir("/definitely/missing");
    let err = loader.load(&ImageSource::parse("nope.png")).unwrap_err();
    assert!(matches!(err, ThumbError::Load(_)));
    assert!(err.to_string().contains("/definitely/missing/nope.png"));

    let err = loader
        .load(&ImageSource::parse("data:image/png;base64,aGVsbG8="))
        .unwrap_err();
    assert!(matches!(err, ThumbError::Load(_)));
}

#[test]
fn empty_and_remote_sources_are_input_errors() {
    let loader = ImageLoader::default();
    let err = loader.load(&ImageSource::parse("")).unwrap_err();
    assert!(matches!(err, ThumbError::Validation(_)));

    let err = loader
        .load(&ImageSource::parse("http://example.com/x.png"))
        .unwrap_err();
    assert!(matches!(err, ThumbError::Validation(_)));
}
