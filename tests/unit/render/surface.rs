use super::*;
use crate::assets::decode::decode_image;
use crate::effects::filters::{ImageFilterSet, apply_filters};

fn surface(w: u32, h: u32) -> Surface {
    Surface::new(Canvas::new(w, h).unwrap()).unwrap()
}

fn font_surface(w: u32, h: u32) -> Surface {
    let mut book = FontBook::new();
    book.add_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/fonts/DejaVuSans.ttf"
    ))
    .unwrap();
    Surface::with_fonts(Canvas::new(w, h).unwrap(), &book, None).unwrap()
}

fn solid(w: u32, h: u32, px: [u8; 4]) -> DecodedImage {
    let bytes = px.iter().copied().cycle().take((w * h * 4) as usize).collect();
    DecodedImage::from_premul(w, h, bytes).unwrap()
}

fn opaque_columns(s: &Surface) -> Vec<u32> {
    let mut cols = Vec::new();
    for x in 0..s.width() {
        if (0..s.height()).any(|y| s.pixel(x, y).unwrap()[3] > 0) {
            cols.push(x);
        }
    }
    cols
}

#[test]
fn new_surface_is_transparent() {
    let s = surface(3, 2);
    assert_eq!(s.pixels().len(), 3 * 2 * 4);
    assert!(s.pixels().iter().all(|&b| b == 0));
    assert_eq!(s.pixel(3, 0), None);
}

#[test]
fn fill_rect_covers_pixels_with_fill_color() {
    let mut s = surface(4, 4);
    s.set_fill_style("#ff0000").unwrap();
    s.fill_rect(0.0, 0.0, 4.0, 4.0).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(s.pixel(x, y), Some([255, 0, 0, 255]));
        }
    }
    s.clear();
    assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
}

#[test]
fn global_alpha_scales_coverage() {
    let mut s = surface(2, 2);
    s.set_fill_style("white").unwrap();
    s.set_global_alpha(0.5);
    s.set_global_alpha(7.0);
    assert_eq!(s.global_alpha(), 0.5);
    s.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    assert_eq!(s.pixel(0, 0), Some([128, 128, 128, 128]));
}

#[test]
fn save_restore_isolates_state() {
    let mut s = surface(2, 2);
    s.restore();
    s.save();
    s.set_global_alpha(0.25);
    s.translate(5.0, 5.0);
    s.set_fill_style("red").unwrap();
    s.set_shadow(Shadow {
        color: CssColor::parse("black").unwrap(),
        blur: 2.0,
        offset: Vec2::new(1.0, 1.0),
    });
    assert_eq!(s.save_depth(), 1);
    s.restore();
    assert_eq!(s.save_depth(), 0);
    assert_eq!(s.global_alpha(), 1.0);
    assert_eq!(s.transform(), Affine::IDENTITY);
    assert_eq!(s.fill(), CssColor::rgba(0.0, 0.0, 0.0, 1.0));
    assert!(s.shadow().is_none());
}

#[test]
fn draw_image_at_integer_offset_is_exact() {
    let mut s = surface(4, 3);
    let img = solid(2, 2, [10, 20, 30, 255]);
    s.draw_image(&img, 3.0, 2.0).unwrap();
    assert_eq!(s.pixel(3, 2), Some([10, 20, 30, 255]));
    assert_eq!(s.pixel(2, 2), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(3, 1), Some([0, 0, 0, 0]));
}

#[test]
fn draw_image_far_off_canvas_draws_nothing() {
    let mut s = surface(4, 4);
    let img = solid(2, 2, [10, 20, 30, 255]);
    s.draw_image(&img, 1e19, 0.0).unwrap();
    s.draw_image(&img, 0.0, -1e19).unwrap();
    s.draw_image(&img, f64::MAX, f64::MAX).unwrap();
    assert!(s.pixels().iter().all(|&b| b == 0));
    assert_eq!(integer_translation(Affine::translate((1e19, -1e19))), Some((1 << 53, -(1 << 53))));
}

#[test]
fn consecutive_draws_do_not_carry_over_earlier_layers() {
    let mut s = surface(6, 2);
    let img = solid(2, 2, [10, 20, 30, 255]);
    s.draw_image(&img, 0.0, 0.0).unwrap();
    s.set_fill_style("red").unwrap();
    s.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    s.clear();

    s.draw_image(&img, 4.0, 0.0).unwrap();
    assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
    s.fill_rect(2.0, 0.0, 2.0, 2.0).unwrap();
    assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(2, 1), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(5, 1), Some([10, 20, 30, 255]));
}

#[test]
fn rollback_restores_checkpointed_pixels() {
    let mut s = surface(2, 2);
    s.set_fill_style("blue").unwrap();
    s.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    s.checkpoint();
    s.set_fill_style("red").unwrap();
    s.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    s.rollback();
    assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
}

#[test]
fn draw_image_scaled_fills_destination() {
    let mut s = surface(8, 8);
    let img = solid(2, 2, [0, 0, 255, 255]);
    s.draw_image_scaled(&img, 0.0, 0.0, 8.0, 8.0).unwrap();
    for (x, y) in [(4, 4), (0, 0), (7, 7)] {
        let px = s.pixel(x, y).unwrap();
        assert!(px[0] <= 2 && px[1] <= 2, "{px:?}");
        assert!(px[2] >= 250 && px[3] >= 250, "{px:?}");
    }
}

#[test]
fn active_filter_applies_to_images_until_reset() {
    let mut s = surface(1, 1);
    let img = solid(1, 1, [200, 100, 50, 255]);
    s.set_filter("brightness(50%)").unwrap();
    s.draw_image(&img, 0.0, 0.0).unwrap();
    assert_eq!(s.pixel(0, 0), Some([100, 50, 25, 255]));

    s.reset_filter();
    s.draw_image(&img, 0.0, 0.0).unwrap();
    assert_eq!(s.pixel(0, 0), Some([200, 100, 50, 255]));
}

#[test]
fn invalid_filter_is_rejected_and_apply_filters_falls_back() {
    let mut s = surface(1, 1);
    s.set_filter("sepia(20%)").unwrap();
    assert!(s.set_filter("sparkle(3)").is_err());
    assert_eq!(s.filter().ops().len(), 1);

    apply_filters(&mut s, &ImageFilterSet::default());
    assert!(s.filter().is_identity());
}

#[test]
fn destination_over_draws_behind() {
    let mut s = surface(2, 2);
    s.set_fill_style("red").unwrap();
    s.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    s.set_composite(CompositeMode::DestinationOver);
    s.set_fill_style("blue").unwrap();
    s.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    assert_eq!(s.pixel(1, 1), Some([255, 0, 0, 255]));
}

#[test]
fn shadow_is_drawn_offset_under_the_shape() {
    let mut s = surface(10, 4);
    s.set_fill_style("white").unwrap();
    s.set_shadow(Shadow {
        color: CssColor::parse("#0000ff").unwrap(),
        blur: 0.0,
        offset: Vec2::new(4.0, 0.0),
    });
    s.fill_rect(0.0, 0.0, 2.0, 4.0).unwrap();
    assert_eq!(s.pixel(1, 1), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(5, 1), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(3, 1), Some([0, 0, 0, 0]));
}

#[test]
fn text_needs_fonts() {
    let mut s = surface(10, 10);
    assert!(s.measure_text("abc").is_err());
    assert!(s.fill_text("abc", 5.0, 5.0, None).is_err());
}

#[test]
fn measure_text_scales_with_font_size() {
    let mut s = font_surface(10, 10);
    s.set_font_css("20px sans-serif").unwrap();
    let small = s.measure_text("Thumbnail").unwrap();
    s.set_font_css("40px sans-serif").unwrap();
    let large = s.measure_text("Thumbnail").unwrap();
    assert!(small > 0.0);
    assert!((large / small - 2.0).abs() < 0.1);
}

#[test]
fn centered_text_straddles_the_origin() {
    let mut s = font_surface(200, 60);
    s.set_font_css("bold 32px DejaVu Sans").unwrap();
    s.set_fill_style("white").unwrap();
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);
    s.fill_text("HHHH", 100.0, 30.0, None).unwrap();

    let cols = opaque_columns(&s);
    assert!(!cols.is_empty());
    assert!(cols.iter().any(|&x| x < 90));
    assert!(cols.iter().any(|&x| x > 110));
    let rows: Vec<u32> = (0..60)
        .filter(|&y| (0..200).any(|x| s.pixel(x, y).unwrap()[3] > 0))
        .collect();
    assert!(rows.iter().any(|&y| y < 30) && rows.iter().any(|&y| y > 30));
}

#[test]
fn max_width_condenses_text() {
    let mut s = font_surface(300, 60);
    s.set_font_css("32px sans-serif").unwrap();
    s.set_fill_style("white").unwrap();
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);
    assert!(s.measure_text("WWWWWWWW").unwrap() > 100.0);
    s.fill_text("WWWWWWWW", 150.0, 30.0, Some(60.0)).unwrap();

    let cols = opaque_columns(&s);
    assert!(!cols.is_empty());
    assert!(cols.iter().all(|&x| (118..=182).contains(&x)), "{cols:?}");
}

#[test]
fn bold_without_a_bold_face_is_thickened() {
    let coverage = |css: &str| {
        let mut s = font_surface(200, 60);
        s.set_font_css(css).unwrap();
        s.set_fill_style("white").unwrap();
        s.set_text_baseline(TextBaseline::Middle);
        s.fill_text("Bold", 10.0, 30.0, None).unwrap();
        s.pixels()
            .chunks_exact(4)
            .map(|px| u64::from(px[3]))
            .sum::<u64>()
    };
    let regular = coverage("48px DejaVu Sans");
    let bold = coverage("bold 48px DejaVu Sans");
    assert!(regular > 0);
    assert!(bold > regular + regular / 20, "regular={regular} bold={bold}");
}

#[test]
fn non_positive_max_width_draws_nothing() {
    let mut s = font_surface(50, 20);
    s.set_font_css("12px sans-serif").unwrap();
    s.fill_text("abc", 10.0, 10.0, Some(0.0)).unwrap();
    assert!(s.pixels().iter().all(|&b| b == 0));
}

#[test]
fn png_export_decodes_back() {
    let mut s = surface(3, 2);
    s.set_fill_style("rgba(0, 255, 0, 1)").unwrap();
    s.fill_rect(0.0, 0.0, 3.0, 2.0).unwrap();
    let decoded = decode_image(&s.to_png().unwrap()).unwrap();
    assert_eq!((decoded.width, decoded.height), (3, 2));
    assert_eq!(&decoded.rgba8_premul[0..4], &[0, 255, 0, 255]);
    assert!(s.to_data_url().unwrap().starts_with("data:image/png;base64,"));
}
