use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(
        CssColor::parse("#ff0000").unwrap(),
        CssColor::rgba(1.0, 0.0, 0.0, 1.0)
    );
    assert_eq!(
        CssColor::parse("#f00").unwrap(),
        CssColor::rgba(1.0, 0.0, 0.0, 1.0)
    );

    let c = CssColor::parse("#0000ff80").unwrap();
    assert!((c.b - 1.0).abs() < 1e-9);
    assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);

    assert!(CssColor::parse("#12345").is_err());
    assert!(CssColor::parse("#gg0000").is_err());
}

#[test]
fn parses_rgb_functions() {
    let c = CssColor::parse("rgb(255, 128, 0)").unwrap();
    assert_eq!(c.to_rgba8_straight(), [255, 128, 0, 255]);

    let c = CssColor::parse("rgba(0,0,0,0.5)").unwrap();
    assert_eq!(c.to_rgba8_premul().a, 128);

    let c = CssColor::parse("rgb(0 0 0 / 50%)").unwrap();
    assert!((c.a - 0.5).abs() < 1e-9);

    assert!(CssColor::parse("rgb(1, 2)").is_err());
}

#[test]
fn parses_hsl_and_names() {
    let c = CssColor::parse("hsl(0, 100%, 50%)").unwrap();
    assert!((c.r - 1.0).abs() < 1e-9);
    assert!(c.g.abs() < 1e-9);

    assert_eq!(
        CssColor::parse("White").unwrap().to_rgba8_straight(),
        [255, 255, 255, 255]
    );
    assert!(
        CssColor::parse("transparent")
            .unwrap()
            .to_rgba8_premul()
            .is_transparent()
    );
    assert!(CssColor::parse("not-a-color").is_err());
    assert!(CssColor::parse("  ").is_err());
}
