//! SVG surface for rendered symbols.

use std::fmt::Write as _;

use tracing::warn;

use super::{RenderError, Symbol};
use crate::models::shape::fmt_num;
use crate::models::{FillRule, Shape};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Foreground and background colours, as CSS colour strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Module colour
    pub foreground: String,
    /// Fill behind the symbol, including the quiet zone
    pub background: String,
}

impl Palette {
    /// Build a palette from two CSS colours
    pub fn new(foreground: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            foreground: foreground.into(),
            background: background.into(),
        }
    }

    /// Colours for an on-screen preview.
    ///
    /// White modules are only used when the host is in dark mode and the user
    /// opted into white-on-black codes.
    pub fn resolve(dark_mode: bool, white_on_black: bool) -> Self {
        if super::light_modules(dark_mode, white_on_black) {
            Self::new("white", "transparent")
        } else {
            Self::new("black", "transparent")
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new("#000000", "#ffffff")
    }
}

/// Serialize a symbol as a standalone SVG document scaled to `width`×`height`
pub fn document(symbol: &Symbol, width: u32, height: u32, palette: &Palette) -> String {
    let side = fmt_num(symbol.size_px());
    let mut out = String::with_capacity(64 * symbol.shapes.len() + 256);

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        r#"<svg xmlns="{SVG_NS}" width="{width}" height="{height}" viewBox="0 0 {side} {side}">"#
    );
    let _ = write!(
        out,
        r#"<rect x="0" y="0" width="{side}" height="{side}" fill="{}"/>"#,
        escape_attr(&palette.background)
    );
    let _ = write!(out, r#"<g fill="{}">"#, escape_attr(&palette.foreground));
    for shape in &symbol.shapes {
        write_shape(&mut out, shape);
    }
    out.push_str("</g></svg>");
    out
}

/// The symbol's document, or the error placeholder when rendering failed
pub fn document_or_error(
    rendered: &Result<Symbol, RenderError>,
    width: u32,
    height: u32,
    palette: &Palette,
) -> String {
    match rendered {
        Ok(symbol) => document(symbol, width, height, palette),
        Err(err) => {
            warn!(%err, "could not render QR code");
            error_document(width, height)
        }
    }
}

/// Placeholder shown when the content could not be encoded
pub fn error_document(width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="{ns}" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{cx}" y="{cy}" fill="red" text-anchor="middle" dominant-baseline="middle">Error</text>"#,
            "</svg>"
        ),
        ns = SVG_NS,
        w = width,
        h = height,
        cx = fmt_num(width as f32 / 2.0),
        cy = fmt_num(height as f32 / 2.0),
    )
}

fn write_shape(out: &mut String, shape: &Shape) {
    let _ = match shape {
        Shape::Rect(r) => write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}"/>"#,
            fmt_num(r.x),
            fmt_num(r.y),
            fmt_num(r.width),
            fmt_num(r.height)
        ),
        Shape::RoundedRect { rect: r, radii } if radii.iter().all(|v| *v == radii[0]) => write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}"/>"#,
            fmt_num(r.x),
            fmt_num(r.y),
            fmt_num(r.width),
            fmt_num(r.height),
            fmt_num(radii[0])
        ),
        Shape::RoundedRect { .. } => write_path(out, &shape.to_path().to_svg_data(), FillRule::NonZero),
        Shape::Path(path) if path.commands.is_empty() => Ok(()),
        Shape::Path(path) => write_path(out, &path.to_svg_data(), path.fill_rule),
    };
}

fn write_path(out: &mut String, d: &str, rule: FillRule) -> std::fmt::Result {
    match rule {
        FillRule::NonZero => write!(out, r#"<path d="{d}"/>"#),
        FillRule::EvenOdd => write!(out, r#"<path d="{d}" fill-rule="{}"/>"#, rule.as_svg()),
    }
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}
