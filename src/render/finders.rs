//! Finder pattern rendering.

use super::modules::sanitize_size;
use super::styles::{FinderCorner, FinderStyle, RingStyle, Sweep};
use crate::models::{CornerArc, FillRule, Path, Rect, Shape};

/// Finder side in modules
pub const FINDER_SIZE: f32 = 7.0;
/// Eye side in modules before the `w2` multiplier
pub const EYE_SIZE: f32 = 3.0;

/// Render the finder patterns at all three corners.
///
/// Returns two shapes per corner: the even-odd ring, then the eye.
pub fn render_finders(
    style: &FinderStyle,
    module_size_px: f32,
    quiet_zone: u32,
    matrix_size: usize,
) -> Vec<Shape> {
    FinderCorner::ALL
        .iter()
        .flat_map(|&corner| render_finder(style, corner, module_size_px, quiet_zone, matrix_size))
        .collect()
}

/// Render the finder pattern at one corner as `[ring, eye]`
pub fn render_finder(
    style: &FinderStyle,
    corner: FinderCorner,
    module_size_px: f32,
    quiet_zone: u32,
    matrix_size: usize,
) -> [Shape; 2] {
    let ms = sanitize_size(module_size_px);
    let (ox, oy) = corner.origin(matrix_size);
    let qz = quiet_zone as f32;
    let outer = Rect::new(
        (qz + ox as f32) * ms,
        (qz + oy as f32) * ms,
        FINDER_SIZE * ms,
        FINDER_SIZE * ms,
    );
    let center = outer.center();

    let w1 = style.w1.max(0.0) * ms;
    let hole_side = (outer.width - 2.0 * w1).max(0.0);
    let hole = Rect::centered(center, hole_side, hole_side);

    let mut ring = Path::new(FillRule::EvenOdd);
    ring.push_rounded_rect(outer, ring_corners(&style.outer, corner, outer.width));
    if hole_side > 0.0 {
        ring.push_rounded_rect(hole, ring_corners(&style.middle, corner, hole_side));
    }

    let eye_side = (EYE_SIZE * style.w2 * ms).clamp(0.0, hole_side);
    let mut eye = Path::new(FillRule::NonZero);
    if eye_side > 0.0 {
        eye.push_rounded_rect(
            Rect::centered(center, eye_side, eye_side),
            ring_corners(&style.inner, corner, eye_side),
        );
    }

    [Shape::Path(ring), Shape::Path(eye)]
}

/// Pixel corner arcs of one ring with side `side`
fn ring_corners(ring: &RingStyle, corner: FinderCorner, side: f32) -> [CornerArc; 4] {
    let half = side / 2.0;
    let eccentricity = ring.eccentricity.max(0.0);
    ring.corners.resolve(corner).map(|r| {
        let rx = (r * side).clamp(0.0, half);
        CornerArc {
            rx,
            ry: (rx * eccentricity).min(half),
            sweep: ring.sweep == Sweep::Convex,
        }
    })
}
