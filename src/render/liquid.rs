//! Neighbourhood-aware "liquid" modules.
//!
//! Adjacent dark modules merge into one blob: exposed outer corners are rounded
//! and inside corners get a small fillet drawn into the empty diagonal cell.

use super::modules::{CellFrame, Neighborhood};
use crate::models::{CornerArc, FillRule, Path, PathCommand, Point, Rect};

/// Outer corner radius as a fraction of the module size
pub const LIQUID_RADIUS: f32 = 0.5;
/// Inside-corner fillet size as a fraction of the module size
pub const LIQUID_FILLET: f32 = 0.25;

// (dx, dy) of each corner, clockwise from top-left
const CORNERS: [(isize, isize); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

/// Draw one dark module given its neighbourhood
pub fn liquid_path(n: &Neighborhood, cell: CellFrame) -> Path {
    let s = cell.size;
    let mut path = Path::new(FillRule::NonZero);

    let corners = CORNERS.map(|(dx, dy)| {
        if !n.at(dx, 0) && !n.at(0, dy) {
            CornerArc::round(LIQUID_RADIUS * s)
        } else {
            CornerArc::default()
        }
    });
    path.push_rounded_rect(Rect::new(cell.x, cell.y, s, s), corners);

    let f = LIQUID_FILLET * s;
    if f <= 0.0 {
        return path;
    }
    for (dx, dy) in CORNERS {
        if n.at(dx, 0) && n.at(0, dy) && !n.at(dx, dy) {
            let corner = Point::new(
                cell.x + if dx > 0 { s } else { 0.0 },
                cell.y + if dy > 0 { s } else { 0.0 },
            );
            push_fillet(&mut path, corner, dx as f32, dy as f32, f);
        }
    }

    path
}

fn push_fillet(path: &mut Path, p: Point, dx: f32, dy: f32, f: f32) {
    let start = Point::new(p.x + dx * f, p.y);
    path.commands.extend([
        PathCommand::MoveTo(start),
        PathCommand::LineTo(p),
        PathCommand::LineTo(Point::new(p.x, p.y + dy * f)),
        PathCommand::Arc {
            rx: f,
            ry: f,
            sweep: dx * dy > 0.0,
            to: start,
        },
        PathCommand::Close,
    ]);
}
