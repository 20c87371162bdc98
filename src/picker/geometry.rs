//! Pure spotlight geometry.

use crate::models::{Point, Rect, Size};

/// Scale stepping parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSteps {
    /// Size factor at level 0
    pub min_factor: f32,
    /// Size factor at the highest level
    pub max_factor: f32,
    /// Highest level
    pub max_level: u32,
}

impl ScaleSteps {
    /// Factor change per level
    pub fn distance(&self) -> f32 {
        (self.max_factor - self.min_factor) / self.max_level.max(1) as f32
    }

    /// Clamp an arbitrary level into `[0, max_level]`
    pub fn clamp_level(&self, level: i64) -> u32 {
        level.clamp(0, i64::from(self.max_level)) as u32
    }

    /// Size factor at `level` (clamped)
    pub fn factor(&self, level: i64) -> f32 {
        self.min_factor + self.distance() * self.clamp_level(level) as f32
    }

    /// Spotlight side for `level` on a viewport with the given base size
    pub fn scan_size(&self, base_scan_size: f32, level: i64) -> f32 {
        (base_scan_size * self.factor(level)).max(1.0)
    }
}

impl Default for ScaleSteps {
    fn default() -> Self {
        Self {
            min_factor: 0.2,
            max_factor: 10.0,
            max_level: 30,
        }
    }
}

/// Level a fresh picker starts at when nothing was persisted
pub const DEFAULT_SCALE_LEVEL: u32 = 10;

/// Reference spotlight side for a viewport: 11% of its shorter edge, at least 1px
pub fn base_scan_size(viewport: Size) -> f32 {
    let short = viewport.width.min(viewport.height);
    if short.is_finite() {
        (short / 10.0 * 1.1).max(1.0)
    } else {
        1.0
    }
}

/// Place a `width`×`height` box centred on `center`, snapped to whole pixels
pub fn snap_centered(center: Point, width: f32, height: f32) -> Rect {
    let x1 = (center.x - width / 2.0).floor();
    let y1 = (center.y - height / 2.0).floor();
    let x2 = (x1 + width).floor();
    let y2 = (y1 + height).floor();
    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// Square spotlight of side `scan_size` centred on the pointer.
///
/// The pointer is clamped into the viewport first. Without a usable pointer the
/// previous rect is kept.
pub fn compute_spotlight(
    pointer: Option<Point>,
    scan_size: f32,
    viewport: Size,
    previous: Rect,
) -> Rect {
    let Some(p) = pointer.filter(Point::is_finite) else {
        return previous;
    };
    let side = if scan_size.is_finite() {
        scan_size.max(1.0)
    } else {
        1.0
    };
    let clamped = Point::new(
        p.x.clamp(0.0, viewport.width.max(0.0)),
        p.y.clamp(0.0, viewport.height.max(0.0)),
    );
    snap_centered(clamped, side, side)
}

/// Move and scale a spotlight to a resized viewport.
///
/// The centre follows each axis independently; the size follows the change in
/// base scan size.
pub fn resize_spotlight(spotlight: Rect, old_viewport: Size, new_viewport: Size) -> Rect {
    let center = spotlight.center();
    let sx = ratio(new_viewport.width, old_viewport.width);
    let sy = ratio(new_viewport.height, old_viewport.height);
    let r = base_scan_size(new_viewport) / base_scan_size(old_viewport);
    Rect::centered(
        Point::new(center.x * sx, center.y * sy),
        spotlight.width * r,
        spotlight.height * r,
    )
}

fn ratio(new: f32, old: f32) -> f32 {
    if old > 0.0 && new.is_finite() {
        new / old
    } else {
        1.0
    }
}

/// Widths of the dimming mask around the spotlight
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaskBorders {
    /// Above the spotlight
    pub top: f32,
    /// Right of the spotlight
    pub right: f32,
    /// Below the spotlight
    pub bottom: f32,
    /// Left of the spotlight
    pub left: f32,
}

/// Mask border widths for a spotlight, never negative
pub fn mask_borders(spotlight: Rect, viewport: Size) -> MaskBorders {
    MaskBorders {
        top: spotlight.y.max(0.0),
        right: (viewport.width - spotlight.right()).max(0.0),
        bottom: (viewport.height - spotlight.bottom()).max(0.0),
        left: spotlight.x.max(0.0),
    }
}

/// Axis-aligned overlap; rects that only share an edge do not collide
pub fn collides(a: &Rect, b: &Rect) -> bool {
    a.collides(b)
}

/// Whether an overlay element (tips, close button) stays visible.
///
/// It fades out while the spotlight covers it, unless the pointer is on it.
pub fn overlay_visible(element: &Rect, spotlight: &Rect, pointer: Option<Point>) -> bool {
    let hovered = pointer.is_some_and(|p| element.contains(p));
    hovered || !element.collides(spotlight)
}

/// Display rect of the captured image in the result view.
///
/// Centred at `(w/2, h/4)`; scaled up to at least half the width and a quarter
/// of the height, and down to at most 80% of the width and 40% of the height.
pub fn result_preview_rect(captured: Size, viewport: Size) -> Rect {
    let (aw, ah) = (captured.width.max(1.0), captured.height.max(1.0));
    let (vw, vh) = (viewport.width.max(0.0), viewport.height.max(0.0));

    let scale_x = if aw >= vw * 0.8 {
        vw * 0.8 / aw
    } else if aw < vw * 0.5 {
        vw * 0.5 / aw
    } else {
        1.0
    };
    let scale_y = if ah >= vh / 2.0 * 0.8 {
        vh / 2.0 * 0.8 / ah
    } else if ah < vh * 0.25 {
        vh * 0.25 / ah
    } else {
        1.0
    };
    let scale = scale_x.min(scale_y);

    snap_centered(Point::new(vw / 2.0, vh / 4.0), aw * scale, ah * scale)
}
