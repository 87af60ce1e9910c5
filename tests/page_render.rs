//! Page Rendering Tests
//!
//! Layout and rendering scenarios using the built-in block font so no font
//! or template assets are needed.

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use pitchpage::render::{
    layout, line_step, max_line_width, wrap_text, BlockFont, FontMetrics, GlyphFont, LayoutParams, PageFormat,
    PageRenderer,
};

const PAPER: Rgb<u8> = Rgb([250, 250, 250]);
const INK: Rgb<u8> = Rgb([1, 22, 55]);

fn font() -> BlockFont {
    BlockFont::new(10.0, 20)
}

fn renderer(width: u32, height: u32, format: PageFormat) -> PageRenderer {
    PageRenderer::new(
        Box::new(font()),
        RgbImage::from_pixel(width, height, PAPER),
        LayoutParams::default(),
    )
    .unwrap()
    .with_format(format, 90)
    .unwrap()
}

fn dejavu(size_px: f32) -> GlyphFont {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    GlyphFont::from_file(&path, size_px).unwrap()
}

#[test]
fn test_hello_world_single_page() {
    let page_layout = layout("hello world", &font(), (800, 1000), &LayoutParams::default());
    assert_eq!(page_layout.num_pages(), 1);
    assert_eq!(page_layout.num_lines(), 1);
    assert_eq!(page_layout.pages[0][0].text, "hello world");

    let pages = renderer(800, 1000, PageFormat::Jpeg).render("hello world").unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(&pages[0].bytes[..2], &[0xFF, 0xD8]);
    assert_eq!(pages[0].filename(), "page_01.jpg");
}

#[test]
fn test_fifty_words_wrap_within_width() {
    let text = (0..50).map(|i| format!("word{}", i % 10)).collect::<Vec<_>>().join(" ");
    let params = LayoutParams::default();
    let f = font();
    // 400 - 150 - 10 = 240 px: four words per line
    let page_layout = layout(&text, &f, (400, 400), &params);
    let limit = max_line_width(400, &params);

    assert!(page_layout.num_lines() > 1);
    assert!(page_layout.num_pages() > 1);
    for line in page_layout.pages.iter().flatten() {
        let single_word = !line.text.contains(' ');
        assert!(f.text_width(&line.text) <= limit || single_word, "{:?}", line.text);
    }

    let rejoined: Vec<&str> = page_layout
        .pages
        .iter()
        .flatten()
        .map(|l| l.text.as_str())
        .collect();
    assert_eq!(rejoined.join(" "), text);
}

#[test]
fn test_overlong_word_gets_its_own_line() {
    let word = "x".repeat(40);
    let text = format!("a {} b", word);
    let page_layout = layout(&text, &font(), (400, 1000), &LayoutParams::default());
    let lines: Vec<&str> = page_layout.pages[0].iter().map(|l| l.text.as_str()).collect();
    assert_eq!(lines, vec!["a", word.as_str(), "b"]);
}

#[test]
fn test_every_line_fits_on_one_page() {
    let text = "one\ntwo\nthree\nfour";
    let page_layout = layout(text, &font(), (800, 1000), &LayoutParams::default());
    assert_eq!(page_layout.num_pages(), 1);
    assert_eq!(page_layout.num_lines(), 4);
    let ys: Vec<i32> = page_layout.pages[0].iter().map(|l| l.y).collect();
    assert_eq!(ys, vec![140, 163, 186, 209]);
}

#[test]
fn test_forced_break_after_every_line() {
    // step 23, bottom = 300 - 69 = 231: from y = 190 only one line fits
    let params = LayoutParams {
        origin_y: 190,
        ..LayoutParams::default()
    };
    let text = "a\nb\nc\nd\ne";
    let page_layout = layout(text, &font(), (800, 300), &params);
    assert_eq!(page_layout.num_pages(), 5);
    assert!(page_layout.pages.iter().all(|p| p.len() == 1));
}

#[test]
fn test_rendering_is_deterministic() {
    let r = renderer(500, 600, PageFormat::Jpeg);
    let text = "The same words\ndrawn twice should give the same bytes every time.";
    assert_eq!(r.render(text).unwrap(), r.render(text).unwrap());
}

#[test]
fn test_png_pages_carry_ink_on_fresh_templates() {
    let r = renderer(500, 400, PageFormat::Png);
    // 400 - 3 * 23 = 331 bottom: lines at 140..=301, eight per page
    let text = (0..12).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
    let pages = r.render(&text).unwrap();
    assert_eq!(pages.len(), 2);

    for page in &pages {
        let decoded = image::load_from_memory(&page.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (500, 400));
        assert_eq!(*decoded.get_pixel(151, 141), INK);
        // The bottom margin stays blank
        assert_eq!(*decoded.get_pixel(151, 395), PAPER);
    }

    let second = image::load_from_memory(&pages[1].bytes).unwrap().to_rgb8();
    // Second page holds four lines; the fifth slot (y = 232) is blank
    assert_eq!(*second.get_pixel(151, 233), PAPER);
}

// === Outline font ===

#[test]
fn test_outline_font_line_step_follows_ink_height() {
    let font = dejavu(30.0);
    let height = font.glyph_height();
    // "hg" spans ascender to descender: about one em at 30 px
    assert!((20..=40).contains(&height), "ink height {}", height);

    let params = LayoutParams::default();
    assert_eq!(line_step(&font, &params), height as i64 + 3);

    let page_layout = layout("first\nsecond\nthird", &font, (1000, 1400), &params);
    let ys: Vec<i32> = page_layout.pages[0].iter().map(|l| l.y).collect();
    let step = height as i32 + 3;
    assert_eq!(ys, vec![140, 140 + step, 140 + 2 * step]);
}

#[test]
fn test_outline_font_widths() {
    let font = dejavu(30.0);
    assert_eq!(font.text_width(""), 0.0);

    let whole = font.text_width("hello world");
    let parts = font.text_width("hello") + font.text_width(" ") + font.text_width("world");
    assert!(whole > font.text_width("hello"));
    assert!((whole - parts).abs() < 0.1 * parts, "{} vs {}", whole, parts);

    // Advances and kerning scale linearly with the pixel size
    let double = dejavu(60.0).text_width("hello world");
    assert!((double / whole - 2.0).abs() < 1e-3, "{} vs {}", double, whole);
}

#[test]
fn test_outline_font_wraps_at_measured_width() {
    let font = dejavu(30.0);
    let limit = font.text_width("hello") + font.text_width(" ") + font.text_width("brave");

    let lines = wrap_text("hello brave world", &font, limit);
    assert_eq!(lines, vec!["hello brave", "world"]);

    let lines = wrap_text("hello brave world", &font, limit - 1.0);
    assert_eq!(lines, vec!["hello", "brave", "world"]);
}

#[test]
fn test_outline_font_draws_in_first_line_box() {
    let font = dejavu(30.0);
    let width = font.text_width("hello world").ceil() as u32;
    let step = line_step(&font, &LayoutParams::default()) as u32;

    let r = PageRenderer::new(
        Box::new(font),
        RgbImage::from_pixel(600, 400, PAPER),
        LayoutParams::default(),
    )
    .unwrap()
    .with_format(PageFormat::Png, 90)
    .unwrap();
    let pages = r.render("hello world").unwrap();
    assert_eq!(pages.len(), 1);

    let page = image::load_from_memory(&pages[0].bytes).unwrap().to_rgb8();
    let inked = |x: u32, y: u32| *page.get_pixel(x, y) != PAPER;

    let in_box = (150..150 + width).any(|x| (140..140 + step).any(|y| inked(x, y)));
    assert!(in_box, "no ink in the first line box");

    // Above the first line and below it the page is untouched
    assert!((0..600).all(|x| (0..130).all(|y| !inked(x, y))));
    assert!((0..600).all(|x| (140 + step + 5..400).all(|y| !inked(x, y))));
}
