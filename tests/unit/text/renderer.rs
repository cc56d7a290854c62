use super::*;
use crate::foundation::core::Canvas;
use crate::text::font::FontBook;

fn font_surface(w: u32, h: u32) -> Surface {
    let mut book = FontBook::new();
    book.add_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/fonts/DejaVuSans.ttf"
    ))
    .unwrap();
    Surface::with_fonts(Canvas::new(w, h).unwrap(), &book, None).unwrap()
}

fn coverage(s: &Surface) -> usize {
    s.pixels().chunks_exact(4).filter(|p| p[3] > 0).count()
}

fn bounds(s: &Surface) -> Option<(u32, u32, u32, u32)> {
    let mut out: Option<(u32, u32, u32, u32)> = None;
    for y in 0..s.height() {
        for x in 0..s.width() {
            if s.pixel(x, y).unwrap()[3] == 0 {
                continue;
            }
            out = Some(match out {
                None => (x, y, x, y),
                Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
            });
        }
    }
    out
}

fn element(text: &str) -> TextElement {
    TextElement {
        font_size: 64.0,
        color: "#ffffff".to_owned(),
        ..TextElement::new("t", text)
    }
}

#[test]
fn straight_text_is_drawn_around_the_resolved_position() {
    let mut s = font_surface(640, 360);
    render_text(&mut s, &element("Hello"), 640.0, 360.0, 0.36);
    let (x0, y0, x1, y1) = bounds(&s).unwrap();
    assert!(x0 < 320 && x1 > 320, "{x0}..{x1}");
    assert!(y0 < 180 && y1 > 180, "{y0}..{y1}");
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn anchored_text_starts_near_the_inset() {
    let mut s = font_surface(640, 360);
    let mut el = element("Left");
    el.position = Some("left".to_owned());
    el.text_align = crate::text::element::TextAlign::Left;
    render_text(&mut s, &el, 640.0, 360.0, 0.36);
    let (x0, _, _, _) = bounds(&s).unwrap();
    assert!((18..=30).contains(&x0), "{x0}");
}

#[test]
fn curved_empty_string_is_a_no_op() {
    let mut s = font_surface(200, 200);
    let mut el = element("");
    el.curve = true;
    render_text(&mut s, &el, 200.0, 200.0, 0.2);
    assert_eq!(coverage(&s), 0);
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn curved_text_sits_above_the_origin() {
    let mut s = font_surface(640, 640);
    let mut el = element("ARC");
    el.curve = true;
    render_text(&mut s, &el, 640.0, 640.0, 0.64);
    let (_, _, _, y1) = bounds(&s).unwrap();
    // radius = max(80, 2 * 32) = 80, so every glyph ends well above the centre line.
    assert!(y1 < 300, "{y1}");
}

#[test]
fn invisible_opacity_draws_nothing() {
    let mut s = font_surface(320, 180);
    let mut el = element("ghost");
    el.opacity = 0.0;
    render_text(&mut s, &el, 320.0, 180.0, 0.18);
    assert_eq!(coverage(&s), 0);
}

#[test]
fn background_plate_is_drawn_without_text_color() {
    let mut s = font_surface(640, 360);
    let mut el = element("Plate");
    el.color = "transparent".to_owned();
    el.background_enabled = true;
    el.background_color = Some("#ff0000".to_owned());
    render_text(&mut s, &el, 640.0, 360.0, 0.36);
    assert_eq!(s.pixel(320, 180), Some([255, 0, 0, 255]));

    let mut off = font_surface(640, 360);
    el.background_enabled = false;
    render_text(&mut off, &el, 640.0, 360.0, 0.36);
    assert_eq!(coverage(&off), 0);
}

#[test]
fn underline_extends_below_the_text() {
    let mut plain = font_surface(640, 360);
    render_text(&mut plain, &element("under"), 640.0, 360.0, 1.0);
    let mut lined = font_surface(640, 360);
    let mut el = element("under");
    el.underline = true;
    render_text(&mut lined, &el, 640.0, 360.0, 1.0);
    assert!(coverage(&lined) > coverage(&plain));
}

#[test]
fn shadow_adds_offset_coverage() {
    let mut plain = font_surface(640, 360);
    render_text(&mut plain, &element("Shadow"), 640.0, 360.0, 2.0);
    let mut shadowed = font_surface(640, 360);
    let mut el = element("Shadow");
    el.shadow = true;
    el.shadow_color = "#000000".to_owned();
    el.shadow_blur = 0.0;
    render_text(&mut shadowed, &el, 640.0, 360.0, 2.0);
    let (_, _, px1, py1) = bounds(&plain).unwrap();
    let (_, _, sx1, sy1) = bounds(&shadowed).unwrap();
    assert!(sx1 >= px1 + 3 && sy1 >= py1 + 3);
}

#[test]
fn bad_element_is_skipped_without_touching_pixels() {
    let mut s = font_surface(100, 100);
    s.set_fill_style("#00ff00").unwrap();
    s.fill_rect(0.0, 0.0, 100.0, 100.0).unwrap();
    let before = s.pixels().to_vec();

    let mut bad_color = element("oops");
    bad_color.color = "not-a-color".to_owned();
    render_text(&mut s, &bad_color, 100.0, 100.0, 0.1);

    let mut bad_size = element("oops");
    bad_size.font_size = f64::NAN;
    render_text(&mut s, &bad_size, 100.0, 100.0, 0.1);

    let mut bad_plate = element("oops");
    bad_plate.background_enabled = true;
    bad_plate.background_color = Some("#00ff00".to_owned());
    bad_plate.shadow = true;
    bad_plate.shadow_color = "???".to_owned();
    render_text(&mut s, &bad_plate, 100.0, 100.0, 0.1);

    assert_eq!(s.pixels(), before.as_slice());
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn state_does_not_leak_between_elements() {
    let mut s = font_surface(100, 100);
    let mut el = element("x");
    el.rotation = 45.0;
    el.opacity = 50.0;
    el.shadow = true;
    render_text(&mut s, &el, 100.0, 100.0, 0.1);
    assert_eq!(s.global_alpha(), 1.0);
    assert!(s.shadow().is_none());
    assert_eq!(s.transform(), crate::foundation::core::Affine::IDENTITY);
}
