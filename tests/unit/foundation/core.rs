use super::*;

#[test]
fn canvas_rejects_zero_and_oversized_edges() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(MAX_SURFACE_DIM + 1, 10).is_err());
    assert_eq!(
        Canvas::new(1280, 720).unwrap(),
        Canvas {
            width: 1280,
            height: 720
        }
    );
}

#[test]
fn scale_factor_uses_shorter_edge() {
    let c = Canvas::new(1920, 1080).unwrap();
    assert!((c.scale_factor() - 1.08).abs() < 1e-12);

    let c = Canvas::new(500, 2000).unwrap();
    assert!((c.scale_factor() - 0.5).abs() < 1e-12);
}

#[test]
fn premul_from_straight_rounds() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
    assert!(Rgba8Premul::transparent().is_transparent());
}
