use super::*;

#[test]
fn kernel_sums_to_one_in_q16() {
    for (radius, sigma) in [(1u32, 0.5f32), (3, 1.0), (12, 4.0)] {
        let k = gaussian_kernel_q16(radius, sigma).unwrap();
        assert_eq!(k.len(), (2 * radius + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
}

#[test]
fn zero_sigma_is_identity() {
    let src: Vec<u8> = (0..(4 * 3 * 4)).map(|i| (i as u8).wrapping_mul(31)).collect();
    let out = blur_rgba8_premul(&src, 4, 3, 0.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn constant_image_is_unchanged() {
    let mut src = vec![0u8; 5 * 5 * 4];
    for px in src.chunks_exact_mut(4) {
        px.copy_from_slice(&[10, 20, 30, 40]);
    }
    let out = blur_rgba8_premul(&src, 5, 5, 1.5).unwrap();
    assert_eq!(out, src);
}

#[test]
fn single_pixel_spreads_to_neighbours() {
    let (w, h) = (9u32, 9u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((4 * w + 4) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_rgba8_premul(&src, w, h, 1.0).unwrap();
    let neighbour = ((4 * w + 5) * 4) as usize;
    assert!(out[center + 3] < 255);
    assert!(out[neighbour + 3] > 0);
}

#[test]
fn rejects_mismatched_buffer() {
    assert!(blur_rgba8_premul(&[0u8; 7], 2, 1, 1.0).is_err());
    assert_eq!(radius_for_sigma(f32::NAN), 0);
    assert_eq!(radius_for_sigma(2.0), 6);
}
