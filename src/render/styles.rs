//! Named module and finder styles.
//!
//! Radii are fractions: of the module size for module styles, of the ring's own
//! side for finder rings. Unknown names resolve to the default style.

use std::sync::OnceLock;

use tracing::debug;

use super::liquid::liquid_path;
use super::modules::{CellFrame, Neighborhood};
use crate::models::Path;

/// Per-corner radii in clockwise order `[top-left, top-right, bottom-right, bottom-left]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerRadii(pub [f32; 4]);

impl CornerRadii {
    /// Same radius on every corner
    pub const fn uniform(r: f32) -> Self {
        Self([r; 4])
    }

    /// True when every corner is sharp
    pub fn is_sharp(&self) -> bool {
        self.0.iter().all(|r| *r <= 0.0)
    }
}

impl From<f32> for CornerRadii {
    fn from(r: f32) -> Self {
        Self::uniform(r)
    }
}

impl From<[f32; 4]> for CornerRadii {
    fn from(radii: [f32; 4]) -> Self {
        Self(radii)
    }
}

/// Turn a corner array a quarter turn clockwise: the top-left value moves to the top-right.
pub fn rotate90<T: Copy>(a: [T; 4]) -> [T; 4] {
    [a[3], a[0], a[1], a[2]]
}

/// Turn a corner array a quarter turn counter-clockwise.
pub fn rotate270<T: Copy>(a: [T; 4]) -> [T; 4] {
    [a[1], a[2], a[3], a[0]]
}

/// The three physical finder positions; QR symbols never have a bottom-right finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinderCorner {
    /// Top-left finder
    TopLeft,
    /// Top-right finder
    TopRight,
    /// Bottom-left finder
    BottomLeft,
}

impl FinderCorner {
    /// All finder positions in render order
    pub const ALL: [FinderCorner; 3] = [
        FinderCorner::TopLeft,
        FinderCorner::TopRight,
        FinderCorner::BottomLeft,
    ];

    /// Module coordinates of the finder's top-left module
    pub fn origin(&self, matrix_size: usize) -> (usize, usize) {
        let far = matrix_size.saturating_sub(7);
        match self {
            FinderCorner::TopLeft => (0, 0),
            FinderCorner::TopRight => (far, 0),
            FinderCorner::BottomLeft => (0, far),
        }
    }
}

/// Orient a corner array so the same definition points inward at every finder.
pub fn centripetal<T: Copy>(a: [T; 4], corner: FinderCorner) -> [T; 4] {
    match corner {
        FinderCorner::TopLeft => a,
        FinderCorner::TopRight => rotate90(a),
        FinderCorner::BottomLeft => rotate270(a),
    }
}

/// Neighbourhood-aware module drawing function
pub type ContextFn = fn(&Neighborhood, CellFrame) -> Path;

/// How a dark module is drawn
#[derive(Debug, Clone, Copy)]
pub enum ModuleShape {
    /// Independent (rounded) square inset by `margin`
    Static {
        /// Corner radii as fractions of the module size
        radii: CornerRadii,
        /// Inset on each side as a fraction of the module size; negative enlarges
        margin: f32,
    },
    /// Path computed from the 3×3 neighbourhood
    Context(ContextFn),
}

/// A named module style
#[derive(Debug, Clone, Copy)]
pub struct ModuleStyle {
    /// Unique name
    pub name: &'static str,
    /// Drawing variant
    pub shape: ModuleShape,
    /// Draw modules inside the finder regions as well
    pub covers_finders: bool,
}

impl ModuleStyle {
    const fn fixed(name: &'static str, radii: [f32; 4], margin: f32) -> Self {
        Self {
            name,
            shape: ModuleShape::Static {
                radii: CornerRadii(radii),
                margin,
            },
            covers_finders: false,
        }
    }
}

/// Name of the fallback module style
pub const DEFAULT_MODULE_STYLE: &str = "tiles";

static MODULE_STYLES: [ModuleStyle; 7] = [
    ModuleStyle::fixed("tiles", [0.0; 4], 0.0),
    ModuleStyle::fixed("tiles_r", [0.2; 4], 0.1),
    ModuleStyle::fixed("dots_s", [0.4; 4], 0.1),
    ModuleStyle::fixed("dots_xs", [0.25; 4], 0.2),
    // larger than half a module; clamped to a circle at draw time
    ModuleStyle::fixed("dots_l", [0.6; 4], -0.1),
    ModuleStyle::fixed("leaf", [0.5, 0.0, 0.5, 0.0], 0.05),
    ModuleStyle {
        name: "liquid",
        shape: ModuleShape::Context(liquid_path),
        covers_finders: false,
    },
];

/// All registered module styles
pub fn module_styles() -> &'static [ModuleStyle] {
    &MODULE_STYLES
}

/// Names of all registered module styles
pub fn module_style_names() -> impl Iterator<Item = &'static str> {
    MODULE_STYLES.iter().map(|s| s.name)
}

/// Look up a module style, falling back to `tiles`
pub fn module_style(name: &str) -> &'static ModuleStyle {
    find_module_style(name).unwrap_or_else(|| {
        debug!(name, "unknown module style, using {DEFAULT_MODULE_STYLE}");
        &MODULE_STYLES[0]
    })
}

/// Exact lookup without fallback
pub fn find_module_style(name: &str) -> Option<&'static ModuleStyle> {
    MODULE_STYLES.iter().find(|s| s.name == name)
}

/// Radius specification for one finder ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CornerSpec {
    /// Same orientation at every finder
    Uniform(CornerRadii),
    /// Base orientation at the top-left finder, rotated at the other two
    Centripetal(CornerRadii),
}

impl CornerSpec {
    /// Radii for the finder at `corner`
    pub fn resolve(&self, corner: FinderCorner) -> [f32; 4] {
        match self {
            CornerSpec::Uniform(r) => r.0,
            CornerSpec::Centripetal(r) => centripetal(r.0, corner),
        }
    }
}

/// Arc direction of rounded ring corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sweep {
    /// Usual outward rounding
    #[default]
    Convex,
    /// Corner arc bent into the ring
    Concave,
}

/// Geometry parameters of one finder ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingStyle {
    /// Corner radii, fractions of the ring side
    pub corners: CornerSpec,
    /// Arc direction
    pub sweep: Sweep,
    /// Vertical arc extent divided by horizontal extent; 1.0 is circular
    pub eccentricity: f32,
}

impl RingStyle {
    /// Circular convex ring, same radius on every corner
    pub fn rounded(r: f32) -> Self {
        Self::per_corner([r; 4])
    }

    /// Circular convex ring with per-corner radii and uniform orientation
    pub fn per_corner(radii: [f32; 4]) -> Self {
        Self {
            corners: CornerSpec::Uniform(CornerRadii(radii)),
            sweep: Sweep::Convex,
            eccentricity: 1.0,
        }
    }

    /// Circular convex ring that points inward at every finder
    pub fn centripetal(radii: [f32; 4]) -> Self {
        Self {
            corners: CornerSpec::Centripetal(CornerRadii(radii)),
            ..Self::rounded(0.0)
        }
    }
}

impl Default for RingStyle {
    fn default() -> Self {
        Self::rounded(0.0)
    }
}

/// A named finder pattern style
#[derive(Debug, Clone, PartialEq)]
pub struct FinderStyle {
    /// Unique name
    pub name: String,
    /// 7×7 outer edge
    pub outer: RingStyle,
    /// Edge of the light gap
    pub middle: RingStyle,
    /// 3×3 eye
    pub inner: RingStyle,
    /// Outer ring thickness in modules
    pub w1: f32,
    /// Eye size multiplier applied to 3 modules
    pub w2: f32,
}

impl FinderStyle {
    /// Style with the same ring geometry everywhere
    pub fn uniform(name: impl Into<String>, ring: RingStyle, w1: f32, w2: f32) -> Self {
        Self {
            name: name.into(),
            outer: ring,
            middle: ring,
            inner: ring,
            w1,
            w2,
        }
    }
}

/// Name of the fallback finder style
pub const DEFAULT_FINDER_STYLE: &str = "default";

fn build_finder_styles() -> Vec<FinderStyle> {
    let mut styles = vec![FinderStyle::uniform(
        DEFAULT_FINDER_STYLE,
        RingStyle::default(),
        1.0,
        1.0,
    )];

    for w in [100u32, 130, 70] {
        for r in [0u32, 50, 100] {
            styles.push(FinderStyle::uniform(
                format!("r{r}w{w}"),
                RingStyle::rounded(0.5 * r as f32 / 100.0),
                w as f32 / 100.0,
                1.0,
            ));
        }
    }

    styles.push(FinderStyle::uniform("dots", RingStyle::rounded(0.5), 0.8, 0.8));

    let drop = [0.5, 0.5, 0.0, 0.5];
    styles.push(FinderStyle::uniform("drop", RingStyle::centripetal(drop), 1.0, 1.0));
    styles.push(FinderStyle::uniform(
        "drop_out",
        RingStyle::centripetal(rotate90(rotate90(drop))),
        1.0,
        1.0,
    ));
    styles.push(FinderStyle::uniform(
        "leaf",
        RingStyle::per_corner([0.5, 0.0, 0.5, 0.0]),
        1.0,
        1.0,
    ));
    styles.push(FinderStyle {
        name: "notch".to_owned(),
        outer: RingStyle {
            sweep: Sweep::Concave,
            ..RingStyle::rounded(0.2)
        },
        middle: RingStyle::rounded(0.1),
        inner: RingStyle {
            eccentricity: 0.6,
            ..RingStyle::rounded(0.4)
        },
        w1: 1.0,
        w2: 1.0,
    });

    styles
}

static FINDER_STYLES: OnceLock<Vec<FinderStyle>> = OnceLock::new();

/// All registered finder styles, `default` first
pub fn finder_styles() -> &'static [FinderStyle] {
    FINDER_STYLES.get_or_init(build_finder_styles)
}

/// Names of all registered finder styles
pub fn finder_style_names() -> impl Iterator<Item = &'static str> {
    finder_styles().iter().map(|s| s.name.as_str())
}

/// Look up a finder style, falling back to `default`
pub fn finder_style(name: &str) -> &'static FinderStyle {
    let styles = finder_styles();
    styles.iter().find(|s| s.name == name).unwrap_or_else(|| {
        debug!(name, "unknown finder style, using {DEFAULT_FINDER_STYLE}");
        &styles[0]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rotate90_four_times_is_identity() {
        let a = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(rotate90(rotate90(rotate90(rotate90(a)))), a);
        assert_eq!(rotate90(rotate270(a)), a);
    }

    #[test]
    fn test_rotate90_moves_top_left_clockwise() {
        assert_eq!(rotate90(['a', 'b', 'c', 'd']), ['d', 'a', 'b', 'c']);
        assert_eq!(rotate270(['a', 'b', 'c', 'd']), ['b', 'c', 'd', 'a']);
    }

    #[test]
    fn test_centripetal_points_sharp_corner_inward() {
        // sharp bottom-right corner at the top-left finder faces the symbol centre
        let drop = [0.5, 0.5, 0.0, 0.5];
        assert_eq!(centripetal(drop, FinderCorner::TopLeft), drop);
        // top-right finder: sharp bottom-left
        assert_eq!(centripetal(drop, FinderCorner::TopRight), [0.5, 0.5, 0.5, 0.0]);
        // bottom-left finder: sharp top-right
        assert_eq!(centripetal(drop, FinderCorner::BottomLeft), [0.5, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_style_names_unique() {
        let modules: HashSet<_> = module_style_names().collect();
        assert_eq!(modules.len(), module_styles().len());

        let finders: HashSet<_> = finder_style_names().collect();
        assert_eq!(finders.len(), finder_styles().len());
    }

    #[test]
    fn test_generated_finder_names() {
        for name in ["r0w100", "r50w100", "r100w100", "r0w130", "r100w70"] {
            assert!(finder_style_names().any(|n| n == name), "missing {name}");
        }
        let style = finder_style("r100w130");
        assert_eq!(style.outer.corners.resolve(FinderCorner::TopLeft), [0.5; 4]);
        assert!((style.w1 - 1.3).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_names_fall_back() {
        assert_eq!(module_style("no-such-style").name, "tiles");
        assert_eq!(finder_style("no-such-style").name, "default");
        assert!(find_module_style("no-such-style").is_none());
    }

    #[test]
    fn test_corner_radii_from() {
        assert_eq!(CornerRadii::from(0.25_f32), CornerRadii([0.25; 4]));
        assert!(CornerRadii::from([0.0_f32; 4]).is_sharp());
    }
}
