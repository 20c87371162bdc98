//! Data module rendering.

use super::styles::{ModuleShape, ModuleStyle};
use crate::models::{BitMatrix, Rect, Shape};

/// Side of the square reserved around each finder (7×7 pattern plus separator)
pub const FINDER_REGION: usize = 8;

/// 3×3 on/off flags around a module, row-major; index 4 is the module itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighborhood(pub [bool; 9]);

impl Neighborhood {
    /// Read the neighbourhood of (x, y); cells outside the matrix are off
    pub fn from_matrix(matrix: &BitMatrix, x: usize, y: usize) -> Self {
        let mut flags = [false; 9];
        for (i, flag) in flags.iter_mut().enumerate() {
            let dx = (i % 3) as isize - 1;
            let dy = (i / 3) as isize - 1;
            *flag = matrix.get_signed(x as isize + dx, y as isize + dy);
        }
        Self(flags)
    }

    /// Flag at offset (dx, dy), both in `-1..=1`
    pub fn at(&self, dx: isize, dy: isize) -> bool {
        let index = (dy + 1) * 3 + (dx + 1);
        self.0[index as usize]
    }

    /// Module above
    pub fn up(&self) -> bool {
        self.0[1]
    }

    /// Module to the left
    pub fn left(&self) -> bool {
        self.0[3]
    }

    /// Module to the right
    pub fn right(&self) -> bool {
        self.0[5]
    }

    /// Module below
    pub fn down(&self) -> bool {
        self.0[7]
    }
}

/// Pixel placement of one module cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFrame {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Module size
    pub size: f32,
}

/// Whether (x, y) lies in one of the three 8×8 finder regions of a `width`×`height` matrix
pub fn in_finder_region(x: usize, y: usize, width: usize, height: usize) -> bool {
    let left = x < FINDER_REGION;
    let top = y < FINDER_REGION;
    let right = x + FINDER_REGION >= width;
    let bottom = y + FINDER_REGION >= height;
    (left && top) || (right && top) || (left && bottom)
}

pub(crate) fn sanitize_size(module_size_px: f32) -> f32 {
    if module_size_px.is_finite() {
        module_size_px.max(0.0)
    } else {
        0.0
    }
}

/// Render every dark data module as one shape.
///
/// Shapes are offset by `quiet_zone` modules. Modules inside the finder regions
/// are left to [`super::render_finders`] unless the style covers them.
pub fn render_modules(
    matrix: &BitMatrix,
    style: &ModuleStyle,
    module_size_px: f32,
    quiet_zone: u32,
) -> Vec<Shape> {
    let ms = sanitize_size(module_size_px);
    let offset = quiet_zone as f32 * ms;
    let (width, height) = (matrix.width(), matrix.height());
    let mut shapes = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if !matrix.get(x, y) {
                continue;
            }
            if !style.covers_finders && in_finder_region(x, y, width, height) {
                continue;
            }
            let cell = CellFrame {
                x: offset + x as f32 * ms,
                y: offset + y as f32 * ms,
                size: ms,
            };
            let shape = match style.shape {
                ModuleShape::Static { radii, margin } => static_module(cell, radii.0, margin),
                ModuleShape::Context(draw) => {
                    Shape::Path(draw(&Neighborhood::from_matrix(matrix, x, y), cell))
                }
            };
            shapes.push(shape);
        }
    }

    shapes
}

fn static_module(cell: CellFrame, radii: [f32; 4], margin: f32) -> Shape {
    let inset = margin * cell.size;
    let side = (cell.size - 2.0 * inset).max(0.0);
    let rect = Rect::new(cell.x + inset, cell.y + inset, side, side);
    let radii = radii.map(|r| (r * cell.size).clamp(0.0, side / 2.0));
    if radii.iter().all(|r| *r == 0.0) {
        Shape::Rect(rect)
    } else {
        Shape::RoundedRect { rect, radii }
    }
}

#[cfg(test)]
mod tests {
    use super::super::styles::{module_style, module_styles};
    use super::*;

    fn checker(size: usize) -> BitMatrix {
        BitMatrix::from_fn(size, size, |x, y| (x * 7 + y * 3) % 5 < 2)
    }

    fn dark_outside_finders(matrix: &BitMatrix) -> usize {
        let (w, h) = (matrix.width(), matrix.height());
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .filter(|&(x, y)| matrix.get(x, y) && !in_finder_region(x, y, w, h))
            .count()
    }

    #[test]
    fn test_finder_regions() {
        assert!(in_finder_region(0, 0, 21, 21));
        assert!(in_finder_region(7, 7, 21, 21));
        assert!(!in_finder_region(8, 0, 21, 21));
        assert!(in_finder_region(13, 0, 21, 21));
        assert!(in_finder_region(0, 13, 21, 21));
        assert!(!in_finder_region(13, 13, 21, 21));
        assert!(!in_finder_region(10, 10, 21, 21));
    }

    #[test]
    fn test_one_shape_per_dark_module_for_every_style() {
        let matrix = checker(25);
        let expected = dark_outside_finders(&matrix);
        for style in module_styles() {
            let shapes = render_modules(&matrix, style, 4.0, 0);
            assert_eq!(shapes.len(), expected, "style {}", style.name);
        }
    }

    #[test]
    fn test_tiles_are_exact_squares() {
        let matrix = checker(21);
        let shapes = render_modules(&matrix, module_style("tiles"), 10.0, 0);
        assert!(!shapes.is_empty());
        for shape in &shapes {
            let Shape::Rect(rect) = shape else {
                panic!("tiles must render plain rects, got {shape:?}");
            };
            assert_eq!((rect.width, rect.height), (10.0, 10.0));
            assert_eq!(rect.x % 10.0, 0.0);
            assert_eq!(rect.y % 10.0, 0.0);
            assert!(matrix.get((rect.x / 10.0) as usize, (rect.y / 10.0) as usize));
        }
    }

    #[test]
    fn test_margin_and_radius_clamping() {
        let matrix = BitMatrix::from_fn(21, 21, |x, y| x == 10 && y == 10);

        let shapes = render_modules(&matrix, module_style("dots_s"), 10.0, 0);
        assert_eq!(
            shapes,
            vec![Shape::RoundedRect {
                rect: Rect::new(101.0, 101.0, 8.0, 8.0),
                radii: [4.0; 4],
            }]
        );

        // oversized radius collapses to a circle on the enlarged module
        let shapes = render_modules(&matrix, module_style("dots_l"), 10.0, 0);
        let Shape::RoundedRect { rect, radii } = &shapes[0] else {
            panic!("expected rounded rect");
        };
        assert!((rect.x - 99.0).abs() < 1e-4);
        assert!((rect.width - 12.0).abs() < 1e-4);
        assert!(radii.iter().all(|r| (r - 6.0).abs() < 1e-4));
    }

    #[test]
    fn test_quiet_zone_offset() {
        let matrix = BitMatrix::from_fn(21, 21, |x, y| x == 10 && y == 10);
        let shapes = render_modules(&matrix, module_style("tiles"), 2.0, 4);
        assert_eq!(shapes, vec![Shape::Rect(Rect::new(28.0, 28.0, 2.0, 2.0))]);
    }

    #[test]
    fn test_degenerate_module_size() {
        let matrix = checker(21);
        for size in [-3.0, f32::NAN] {
            let shapes = render_modules(&matrix, module_style("dots_xs"), size, 4);
            assert!(shapes.iter().all(|s| s.bounds().width >= 0.0));
        }
    }

    #[test]
    fn test_neighborhood_edges_are_off() {
        let matrix = BitMatrix::from_fn(3, 3, |_, _| true);
        let corner = Neighborhood::from_matrix(&matrix, 0, 0);
        assert!(!corner.up());
        assert!(!corner.left());
        assert!(corner.right());
        assert!(corner.down());
        assert!(corner.at(1, 1));
        assert!(!corner.at(-1, -1));

        let centre = Neighborhood::from_matrix(&matrix, 1, 1);
        assert_eq!(centre, Neighborhood([true; 9]));
    }
}
