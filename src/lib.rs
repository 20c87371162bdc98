//! qr_lite - QR code render geometry and scan-region picker core
//!
//! Turns text into styled QR shapes (rounded modules, liquid merges, custom
//! finder patterns) that can be written as SVG or rasterized to PNG, and
//! models the on-page region picker used to scan codes from a tab.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Environment-derived defaults
pub mod config;
/// Text to module matrix
pub mod encode;
/// Encode/decode history list
pub mod history;
/// Locale catalogue checks
pub mod locales;
/// Core data structures (BitMatrix, Point, Rect, Shape, ...)
pub mod models;
/// Scan-region picker geometry and state
pub mod picker;
/// Module and finder shapes, SVG and raster surfaces
pub mod render;
/// Tab capture and decode boundary
pub mod scan;
/// User settings and persistence
pub mod settings;
/// Helpers shared with the CLI
pub mod tools;

pub use encode::{EncodeError, Encoder, QrcodeEncoder};
pub use models::{BitMatrix, EcLevel, Point, Rect, Shape, Size};
pub use render::{RenderError, RenderOptions, Symbol, render, render_symbol};
pub use settings::{Settings, SettingsService};

/// Encode `content` with the default encoder and render it with `options`
///
/// # Example
/// ```
/// use qr_lite::{RenderOptions, render_text};
///
/// let symbol = render_text("https://example.com", &RenderOptions::default()).unwrap();
/// assert!(symbol.matrix_size >= 21);
/// ```
pub fn render_text(content: &str, options: &RenderOptions) -> Result<Symbol, RenderError> {
    render(content, options, &QrcodeEncoder)
}

/// Render `content` as a standalone SVG document of `size`×`size` pixels.
///
/// Content that cannot be encoded produces the error placeholder instead.
///
/// # Example
/// ```
/// use qr_lite::render::svg::Palette;
/// use qr_lite::{RenderOptions, render_svg};
///
/// let svg = render_svg("", &RenderOptions::default(), 128, &Palette::default());
/// assert!(svg.contains(">Error</text>"));
/// ```
pub fn render_svg(
    content: &str,
    options: &RenderOptions,
    size: u32,
    palette: &render::svg::Palette,
) -> String {
    render::svg::document_or_error(&render_text(content, options), size, size, palette)
}
