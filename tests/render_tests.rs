//! End-to-end rendering checks: encoder, style lookup, shapes and surfaces.

use qr_lite::models::{BitMatrix, Rect, Shape};
use qr_lite::render::raster::{RasterPalette, rasterize};
use qr_lite::render::svg::{Palette, document, document_or_error};
use qr_lite::render::{in_finder_region, module_style_names, render_symbol};
use qr_lite::{
    EcLevel, Encoder, QrcodeEncoder, RenderError, RenderOptions, render, render_svg, render_text,
};

fn options(
    module_style: &str,
    finder_style: &str,
    module_size_px: f32,
    quiet_zone: u32,
) -> RenderOptions {
    RenderOptions {
        module_style: module_style.to_owned(),
        finder_style: finder_style.to_owned(),
        ec_level: EcLevel::L,
        module_size_px,
        quiet_zone,
    }
}

fn data_modules(matrix: &BitMatrix) -> Vec<(usize, usize)> {
    let (w, h) = (matrix.width(), matrix.height());
    (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .filter(|&(x, y)| matrix.get(x, y) && !in_finder_region(x, y, w, h))
        .collect()
}

#[test]
fn test_version1_tiles_are_exact_squares() {
    let matrix = QrcodeEncoder.encode("hello", EcLevel::L).unwrap();
    assert_eq!(matrix.width(), 21);

    let symbol = render_symbol(&matrix, &options("tiles", "default", 10.0, 0));
    let expected = data_modules(&matrix);
    assert_eq!(symbol.shapes.len(), 6 + expected.len());

    for (shape, (x, y)) in symbol.shapes[6..].iter().zip(expected) {
        assert_eq!(
            shape,
            &Shape::Rect(Rect::new(x as f32 * 10.0, y as f32 * 10.0, 10.0, 10.0))
        );
    }
}

#[test]
fn test_default_finders_match_standard_footprint() {
    let symbol = render_text("hello", &options("tiles", "default", 10.0, 0)).unwrap();
    let bounds: Vec<Rect> = symbol.shapes[..6].iter().map(Shape::bounds).collect();
    assert_eq!(
        bounds,
        [
            Rect::new(0.0, 0.0, 70.0, 70.0),
            Rect::new(20.0, 20.0, 30.0, 30.0),
            Rect::new(140.0, 0.0, 70.0, 70.0),
            Rect::new(160.0, 20.0, 30.0, 30.0),
            Rect::new(0.0, 140.0, 70.0, 70.0),
            Rect::new(20.0, 160.0, 30.0, 30.0),
        ]
    );
}

#[test]
fn test_every_style_renders_inside_symbol() {
    let matrix = QrcodeEncoder.encode("https://example.com/path", EcLevel::M).unwrap();
    for name in module_style_names() {
        let symbol = render_symbol(&matrix, &options(name, "r50w130", 4.0, 4));
        let side = symbol.size_px();
        assert!(symbol.shapes.len() > 6, "{name}");
        for shape in &symbol.shapes {
            let b = shape.bounds();
            assert!(b.is_finite(), "{name}: {b:?}");
            // dots_l grows past its cell; allow that overhang only
            assert!(b.x >= -1.0 && b.y >= -1.0, "{name}: {b:?}");
            assert!(b.right() <= side + 1.0 && b.bottom() <= side + 1.0, "{name}: {b:?}");
        }
    }
}

#[test]
fn test_unknown_styles_fall_back() {
    let fallback = render_text("fallback", &options("sparkles", "nope", 1.0, 4)).unwrap();
    let tiles = render_text("fallback", &options("tiles", "default", 1.0, 4)).unwrap();
    assert_eq!(fallback, tiles);
}

#[test]
fn test_errors_surface_unchanged() {
    assert_eq!(
        render("", &RenderOptions::default(), &QrcodeEncoder),
        Err(RenderError::EmptyContent)
    );

    let too_long = "x".repeat(4000);
    let err = render(&too_long, &options("tiles", "default", 1.0, 4), &QrcodeEncoder).unwrap_err();
    assert!(matches!(err, RenderError::Encode(_)));
}

#[test]
fn test_svg_and_raster_surfaces() {
    // version 1 plus a 4 module quiet zone on each side: 29 modules
    let symbol = render_text("surface", &options("dots_s", "default", 1.0, 4)).unwrap();
    assert_eq!(symbol.size_modules(), 29);

    let svg = document(&symbol, 250, 250, &Palette::default());
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"viewBox="0 0 29 29""#));
    assert!(svg.ends_with("</g></svg>"));

    // 10px per module
    let image = rasterize(&symbol, 290, &RasterPalette::default());
    assert_eq!(image.dimensions(), (290, 290));
    assert_eq!(image.get_pixel(2, 2)[0], 255);
    // top-left finder: ring, light gap, eye
    assert_eq!(image.get_pixel(45, 75)[0], 0);
    assert_eq!(image.get_pixel(55, 55)[0], 255);
    assert_eq!(image.get_pixel(75, 75)[0], 0);
}

#[test]
fn test_svg_preview_palette_and_placeholder() {
    let opts = options("tiles", "default", 1.0, 4);

    let dark = render_svg("preview", &opts, 200, &Palette::resolve(true, true));
    assert!(dark.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200""#));
    assert!(dark.contains(r#"fill="transparent""#));
    assert!(dark.contains(r#"<g fill="white">"#));

    let light = render_svg("preview", &opts, 200, &Palette::resolve(true, false));
    assert!(light.contains(r#"<g fill="black">"#));

    let failed = render_svg("", &opts, 200, &Palette::resolve(false, true));
    assert!(failed.contains(">Error</text>"));
    assert!(!failed.contains("<g fill="));

    let rendered = render_text("preview", &opts);
    assert_eq!(
        document_or_error(&rendered, 200, 200, &Palette::resolve(true, true)),
        dark
    );
}
