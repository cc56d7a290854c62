use super::*;

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over([0, 0, 255, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn over_respects_opacity_and_transparent_src() {
    assert_eq!(over([0, 0, 0, 255], [0, 0, 0, 0], 1.0), [0, 0, 0, 255]);
    assert_eq!(over([10, 20, 30, 255], [255, 255, 255, 255], 0.0), [10, 20, 30, 255]);
    let half = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert_eq!(half, [128, 128, 128, 255]);
}

#[test]
fn destination_over_keeps_opaque_dst() {
    let mut dst = vec![0u8, 255, 0, 255, 0, 0, 0, 0];
    let src = vec![255u8, 0, 0, 255, 255, 0, 0, 255];
    composite_in_place(&mut dst, &src, 1.0, CompositeMode::DestinationOver).unwrap();
    assert_eq!(dst, vec![0, 255, 0, 255, 255, 0, 0, 255]);
}

#[test]
fn copy_replaces_everything() {
    let mut dst = vec![9u8, 9, 9, 255, 9, 9, 9, 255];
    let src = vec![0u8, 0, 0, 0, 200, 100, 0, 255];
    composite_in_place(&mut dst, &src, 1.0, CompositeMode::Copy).unwrap();
    assert_eq!(dst, vec![0, 0, 0, 0, 200, 100, 0, 255]);
}

#[test]
fn composite_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(composite_in_place(&mut dst, &[0u8; 4], 1.0, CompositeMode::SourceOver).is_err());
}

#[test]
fn composite_mode_names() {
    for mode in [
        CompositeMode::SourceOver,
        CompositeMode::DestinationOver,
        CompositeMode::Copy,
    ] {
        assert_eq!(CompositeMode::parse(mode.as_str()).unwrap(), mode);
    }
    assert!(CompositeMode::parse("xor").is_err());
}

#[test]
fn shadow_of_transparent_layer_is_none() {
    let layer = vec![0u8; 4 * 4 * 4];
    let s = shadow_layer(&layer, 4, 4, Rgba8Premul::from_straight_rgba(0, 0, 0, 255), 1.0, (1, 1))
        .unwrap();
    assert!(s.is_none());
}

#[test]
fn unblurred_shadow_is_tinted_and_offset() {
    let (w, h) = (5u32, 5u32);
    let mut layer = vec![0u8; (w * h * 4) as usize];
    let i = ((1 * w + 1) * 4) as usize;
    layer[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);

    let tint = Rgba8Premul::from_straight_rgba(0, 0, 255, 255);
    let s = shadow_layer(&layer, w, h, tint, 0.0, (2, 1)).unwrap().unwrap();
    let j = ((2 * w + 3) * 4) as usize;
    assert_eq!(&s[j..j + 4], &[0, 0, 255, 255]);
    assert_eq!(s.iter().filter(|&&b| b != 0).count(), 2);
}

#[test]
fn blurred_shadow_spreads_beyond_the_shape() {
    let (w, h) = (16u32, 16u32);
    let mut layer = vec![0u8; (w * h * 4) as usize];
    let i = ((8 * w + 8) * 4) as usize;
    layer[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);

    let tint = Rgba8Premul::from_straight_rgba(0, 0, 0, 255);
    let s = shadow_layer(&layer, w, h, tint, 1.5, (0, 0)).unwrap().unwrap();
    let neighbor = ((8 * w + 9) * 4 + 3) as usize;
    assert!(s[neighbor] > 0);
    let centre = ((8 * w + 8) * 4 + 3) as usize;
    assert!(s[centre] < 255);
}
