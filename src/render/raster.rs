//! Raster surface: point-sampled grayscale rendering of a symbol.

use image::{GrayImage, Luma};
use rayon::prelude::*;
use tracing::debug;

use super::Symbol;
use crate::models::{FillRule, Path, PathCommand, Point, Rect, Shape};

/// Line segments per flattened arc
const ARC_SEGMENTS: usize = 8;

/// Gray levels for modules and background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterPalette {
    /// Module level
    pub dark: u8,
    /// Background level
    pub light: u8,
}

impl RasterPalette {
    /// Gray levels for a preview; see [`svg::Palette::resolve`](super::svg::Palette::resolve)
    pub fn resolve(dark_mode: bool, white_on_black: bool) -> Self {
        if super::light_modules(dark_mode, white_on_black) {
            Self::default().inverted()
        } else {
            Self::default()
        }
    }

    /// Light modules on a dark background
    pub fn inverted(self) -> Self {
        Self {
            dark: self.light,
            light: self.dark,
        }
    }
}

impl Default for RasterPalette {
    fn default() -> Self {
        Self { dark: 0, light: 255 }
    }
}

enum Fill {
    Rect(Rect),
    Polygon {
        rings: Vec<Vec<Point>>,
        rule: FillRule,
        bounds: Rect,
    },
}

impl Fill {
    fn from_shape(shape: &Shape) -> Option<Self> {
        match shape {
            Shape::Rect(rect) => Some(Fill::Rect(*rect)),
            other => {
                let path = other.to_path();
                let rings = flatten(&path);
                if rings.is_empty() {
                    return None;
                }
                Some(Fill::Polygon {
                    rings,
                    rule: path.fill_rule,
                    bounds: other.bounds(),
                })
            }
        }
    }

    fn bounds(&self) -> Rect {
        match self {
            Fill::Rect(rect) => *rect,
            Fill::Polygon { bounds, .. } => *bounds,
        }
    }

    fn contains(&self, p: Point) -> bool {
        match self {
            Fill::Rect(r) => p.x >= r.x && p.x < r.right() && p.y >= r.y && p.y < r.bottom(),
            Fill::Polygon { rings, rule, .. } => {
                let winding: i32 = rings.iter().map(|ring| winding_number(ring, p)).sum();
                match rule {
                    FillRule::NonZero => winding != 0,
                    FillRule::EvenOdd => winding % 2 != 0,
                }
            }
        }
    }
}

/// Rasterize a symbol into a `size_px`×`size_px` grayscale image.
///
/// Each pixel takes the dark level when its centre falls inside any shape.
pub fn rasterize(symbol: &Symbol, size_px: u32, palette: &RasterPalette) -> GrayImage {
    let mut img = GrayImage::from_pixel(size_px, size_px, Luma([palette.light]));
    let symbol_px = symbol.size_px();
    if size_px == 0 || symbol_px <= 0.0 {
        return img;
    }

    let scale = symbol_px / size_px as f32;
    let fills: Vec<Fill> = symbol.shapes.iter().filter_map(Fill::from_shape).collect();
    debug!(size_px, fills = fills.len(), "rasterizing symbol");

    let width = size_px as usize;
    img.par_chunks_mut(width).enumerate().for_each(|(row, pixels)| {
        let y = (row as f32 + 0.5) * scale;
        let hits: Vec<&Fill> = fills
            .iter()
            .filter(|f| {
                let b = f.bounds();
                y >= b.y && y < b.bottom()
            })
            .collect();
        if hits.is_empty() {
            return;
        }
        for (col, pixel) in pixels.iter_mut().enumerate() {
            let p = Point::new((col as f32 + 0.5) * scale, y);
            if hits.iter().any(|f| f.contains(p)) {
                *pixel = palette.dark;
            }
        }
    });

    img
}

/// Flatten a path into closed polygons, one per subpath
fn flatten(path: &Path) -> Vec<Vec<Point>> {
    let mut rings = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for cmd in &path.commands {
        match *cmd {
            PathCommand::MoveTo(p) => {
                if current.len() > 2 {
                    rings.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(p);
            }
            PathCommand::LineTo(p) => current.push(p),
            PathCommand::Arc { rx, ry, sweep, to } => {
                let from = current.last().copied().unwrap_or(to);
                flatten_arc(&mut current, from, rx, ry, sweep, to);
            }
            PathCommand::Close => {
                if current.len() > 2 {
                    rings.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() > 2 {
        rings.push(current);
    }
    rings
}

/// Append the points of a small, axis-aligned elliptical arc (endpoint form)
fn flatten_arc(out: &mut Vec<Point>, from: Point, rx: f32, ry: f32, sweep: bool, to: Point) {
    let (mut rx, mut ry) = (rx.abs(), ry.abs());
    if rx == 0.0 || ry == 0.0 || from == to {
        out.push(to);
        return;
    }

    let x1p = (from.x - to.x) / 2.0;
    let y1p = (from.y - to.y) / 2.0;

    // grow radii that cannot span the endpoints
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
    let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
    // small arc: the centre sits on the sweep side
    let sign = if sweep { 1.0 } else { -1.0 };
    let coef = sign * (num / den).max(0.0).sqrt();
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;
    let cx = cxp + (from.x + to.x) / 2.0;
    let cy = cyp + (from.y + to.y) / 2.0;

    let start = ((y1p - cyp) / ry).atan2((x1p - cxp) / rx);
    let end = ((-y1p - cyp) / ry).atan2((-x1p - cxp) / rx);
    let mut delta = end - start;
    if sweep && delta < 0.0 {
        delta += std::f32::consts::TAU;
    } else if !sweep && delta > 0.0 {
        delta -= std::f32::consts::TAU;
    }

    for i in 1..ARC_SEGMENTS {
        let t = start + delta * i as f32 / ARC_SEGMENTS as f32;
        out.push(Point::new(cx + rx * t.cos(), cy + ry * t.sin()));
    }
    out.push(to);
}

/// Winding number of a closed polygon around `p`
fn winding_number(ring: &[Point], p: Point) -> i32 {
    let mut winding = 0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let side = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BitMatrix, CornerArc};
    use crate::render::{RenderOptions, render_symbol};

    fn dark(img: &GrayImage, x: u32, y: u32) -> bool {
        img.get_pixel(x, y).0[0] == 0
    }

    fn single(shape: Shape, side: usize) -> Symbol {
        Symbol {
            matrix_size: side,
            quiet_zone: 0,
            module_size_px: 1.0,
            shapes: vec![shape],
        }
    }

    #[test]
    fn test_tiles_symbol_pixels() {
        let matrix = BitMatrix::from_fn(21, 21, |x, y| x == 10 && y == 10);
        let symbol = render_symbol(
            &matrix,
            &RenderOptions {
                module_size_px: 1.0,
                quiet_zone: 4,
                ..RenderOptions::default()
            },
        );
        let img = rasterize(&symbol, 29, &RasterPalette::default());
        assert_eq!(img.dimensions(), (29, 29));

        assert!(dark(&img, 14, 14));
        assert!(!dark(&img, 13, 14));
        assert!(!dark(&img, 0, 0));
        // finder: outer ring, light gap, eye
        assert!(dark(&img, 4, 4));
        assert!(!dark(&img, 5, 5));
        assert!(dark(&img, 7, 7));
        assert!(dark(&img, 24, 4));
    }

    #[test]
    fn test_scaled_output() {
        let symbol = single(Shape::Rect(Rect::new(0.0, 0.0, 5.0, 10.0)), 10);
        let img = rasterize(&symbol, 100, &RasterPalette::default());
        assert!(dark(&img, 49, 99));
        assert!(!dark(&img, 50, 0));
    }

    #[test]
    fn test_circle_corners_are_light() {
        let symbol = single(
            Shape::RoundedRect {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                radii: [5.0; 4],
            },
            10,
        );
        let img = rasterize(&symbol, 10, &RasterPalette::default());
        assert!(!dark(&img, 0, 0));
        assert!(!dark(&img, 9, 9));
        assert!(!dark(&img, 0, 9));
        assert!(dark(&img, 5, 5));
        assert!(dark(&img, 0, 5));
        assert!(dark(&img, 5, 0));
    }

    #[test]
    fn test_fill_rules() {
        let mut path = Path::new(FillRule::EvenOdd);
        path.push_rounded_rect(Rect::new(0.0, 0.0, 10.0, 10.0), [CornerArc::default(); 4]);
        path.push_rounded_rect(Rect::new(3.0, 3.0, 4.0, 4.0), [CornerArc::default(); 4]);

        let img = rasterize(&single(Shape::Path(path.clone()), 10), 10, &RasterPalette::default());
        assert!(dark(&img, 1, 1));
        assert!(!dark(&img, 5, 5));

        path.fill_rule = FillRule::NonZero;
        let img = rasterize(&single(Shape::Path(path), 10), 10, &RasterPalette::default());
        assert!(dark(&img, 5, 5));
    }

    #[test]
    fn test_inverted_palette_and_empty_size() {
        let symbol = single(Shape::Rect(Rect::new(0.0, 0.0, 1.0, 1.0)), 2);
        let palette = RasterPalette::default().inverted();
        let img = rasterize(&symbol, 2, &palette);
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(1, 1).0[0], 0);

        assert_eq!(rasterize(&symbol, 0, &palette).dimensions(), (0, 0));

        assert_eq!(RasterPalette::resolve(true, true), palette);
        assert_eq!(RasterPalette::resolve(true, false), RasterPalette::default());
        assert_eq!(RasterPalette::resolve(false, true), RasterPalette::default());
    }
}
