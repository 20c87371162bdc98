use std::fmt::Write as _;

use super::{Point, Rect};

/// One step of a vector path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath
    MoveTo(Point),
    /// Straight line to a point
    LineTo(Point),
    /// Axis-aligned elliptical arc (small-arc variant) to a point
    Arc {
        /// Horizontal radius
        rx: f32,
        /// Vertical radius
        ry: f32,
        /// `true` draws the arc in the positive-angle (clockwise on screen) direction
        sweep: bool,
        /// End point
        to: Point,
    },
    /// Close the current subpath
    Close,
}

/// How overlapping subpaths are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Non-zero winding
    #[default]
    NonZero,
    /// Even-odd; used to punch holes
    EvenOdd,
}

impl FillRule {
    /// SVG `fill-rule` attribute value
    pub fn as_svg(&self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// Radii of one rounded corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerArc {
    /// Extent along the horizontal edge
    pub rx: f32,
    /// Extent along the vertical edge
    pub ry: f32,
    /// `true` for the usual outward rounding, `false` for an arc bent into the shape
    pub sweep: bool,
}

impl CornerArc {
    /// Circular outward corner
    pub fn round(r: f32) -> Self {
        Self {
            rx: r,
            ry: r,
            sweep: true,
        }
    }

    fn is_sharp(&self) -> bool {
        self.rx <= 0.0 || self.ry <= 0.0
    }
}

/// A filled vector path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// Path commands
    pub commands: Vec<PathCommand>,
    /// Fill rule
    pub fill_rule: FillRule,
}

impl Path {
    /// Empty path with the given fill rule
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            commands: Vec::new(),
            fill_rule,
        }
    }

    /// Append a clockwise rectangle subpath with independently rounded corners.
    ///
    /// Corners are given as `[top-left, top-right, bottom-right, bottom-left]`.
    /// Sharp corners (zero radius) get no arc command.
    pub fn push_rounded_rect(&mut self, rect: Rect, corners: [CornerArc; 4]) {
        let Rect {
            x,
            y,
            width: w,
            height: h,
        } = rect;
        let [tl, tr, br, bl] = corners;
        let c = &mut self.commands;

        c.push(PathCommand::MoveTo(Point::new(x + tl.rx, y)));
        c.push(PathCommand::LineTo(Point::new(x + w - tr.rx, y)));
        if !tr.is_sharp() {
            c.push(arc(tr, Point::new(x + w, y + tr.ry)));
        }
        c.push(PathCommand::LineTo(Point::new(x + w, y + h - br.ry)));
        if !br.is_sharp() {
            c.push(arc(br, Point::new(x + w - br.rx, y + h)));
        }
        c.push(PathCommand::LineTo(Point::new(x + bl.rx, y + h)));
        if !bl.is_sharp() {
            c.push(arc(bl, Point::new(x, y + h - bl.ry)));
        }
        c.push(PathCommand::LineTo(Point::new(x, y + tl.ry)));
        if !tl.is_sharp() {
            c.push(arc(tl, Point::new(x + tl.rx, y)));
        }
        c.push(PathCommand::Close);
    }

    /// Number of arc commands
    pub fn arc_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::Arc { .. }))
            .count()
    }

    /// SVG path data (`d` attribute)
    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                d.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = match cmd {
                PathCommand::MoveTo(p) => write!(d, "M{} {}", fmt_num(p.x), fmt_num(p.y)),
                PathCommand::LineTo(p) => write!(d, "L{} {}", fmt_num(p.x), fmt_num(p.y)),
                PathCommand::Arc { rx, ry, sweep, to } => write!(
                    d,
                    "A{} {} 0 0 {} {} {}",
                    fmt_num(*rx),
                    fmt_num(*ry),
                    u8::from(*sweep),
                    fmt_num(to.x),
                    fmt_num(to.y)
                ),
                PathCommand::Close => write!(d, "Z"),
            };
        }
        d
    }
}

fn arc(corner: CornerArc, to: Point) -> PathCommand {
    PathCommand::Arc {
        rx: corner.rx,
        ry: corner.ry,
        sweep: corner.sweep,
        to,
    }
}

/// Format a coordinate compactly: integers without a fraction, others to 4 places
pub fn fmt_num(v: f32) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

/// A drawable primitive with absolute pixel geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Plain axis-aligned rectangle
    Rect(Rect),
    /// Rectangle with per-corner radii in pixels, `[tl, tr, br, bl]`
    RoundedRect {
        /// Bounds
        rect: Rect,
        /// Corner radii
        radii: [f32; 4],
    },
    /// Arbitrary path
    Path(Path),
}

impl Shape {
    /// Axis-aligned bounds of the shape (control extents for paths)
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rect(rect) | Shape::RoundedRect { rect, .. } => *rect,
            Shape::Path(path) => {
                let mut min = Point::new(f32::INFINITY, f32::INFINITY);
                let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
                for cmd in &path.commands {
                    let p = match cmd {
                        PathCommand::MoveTo(p) | PathCommand::LineTo(p) => *p,
                        PathCommand::Arc { to, .. } => *to,
                        PathCommand::Close => continue,
                    };
                    min = Point::new(min.x.min(p.x), min.y.min(p.y));
                    max = Point::new(max.x.max(p.x), max.y.max(p.y));
                }
                if !min.is_finite() {
                    return Rect::default();
                }
                Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
            }
        }
    }

    /// Convert to a path; rectangles become one clockwise subpath
    pub fn to_path(&self) -> Path {
        match self {
            Shape::Rect(rect) => {
                let mut path = Path::default();
                path.push_rounded_rect(*rect, [CornerArc::default(); 4]);
                path
            }
            Shape::RoundedRect { rect, radii } => {
                let mut path = Path::default();
                path.push_rounded_rect(*rect, radii.map(CornerArc::round));
                path
            }
            Shape::Path(path) => path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_rect_sharp_has_no_arcs() {
        let mut path = Path::default();
        path.push_rounded_rect(Rect::new(0.0, 0.0, 7.0, 7.0), [CornerArc::default(); 4]);
        assert_eq!(path.arc_count(), 0);
        assert_eq!(path.to_svg_data(), "M0 0 L7 0 L7 7 L0 7 L0 0 Z");
    }

    #[test]
    fn test_rounded_rect_arcs() {
        let mut path = Path::default();
        path.push_rounded_rect(Rect::new(0.0, 0.0, 2.0, 2.0), [CornerArc::round(0.5); 4]);
        assert_eq!(path.arc_count(), 4);
        assert!(path.to_svg_data().contains("A0.5 0.5 0 0 1 2 0.5"));
    }

    #[test]
    fn test_bounds_of_path() {
        let shape = Shape::RoundedRect {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            radii: [0.5; 4],
        };
        let bounds = Shape::Path(shape.to_path()).bounds();
        assert_eq!(bounds, Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(0.25), "0.25");
        assert_eq!(fmt_num(-1.5), "-1.5");
    }
}
