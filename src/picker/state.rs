//! Picker stage machine and frame cadence.

use thiserror::Error;
use tracing::debug;

use super::geometry::{
    DEFAULT_SCALE_LEVEL, MaskBorders, ScaleSteps, base_scan_size, compute_spotlight, mask_borders,
    overlay_visible, resize_spotlight, result_preview_rect,
};
use crate::models::{Point, Rect, Size};
use crate::scan::ScanOutcome;
use crate::tools::is_url;

/// Interaction stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Spotlight follows the pointer
    Picking,
    /// Waiting for capture and decode
    Scanning,
    /// Showing the scan result
    Result,
    /// Torn down; every further action is ignored
    Closed,
}

/// Rejected stage transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    /// The action is not valid in the current stage
    #[error("cannot {action} while {stage:?}")]
    InvalidTransition {
        /// Stage the picker was in
        stage: Stage,
        /// Attempted action
        action: &'static str,
    },
}

/// Host hook for the per-frame callback
pub trait FrameScheduler {
    /// Ask for one [`Picker::on_frame`] call on the next frame
    fn request_frame(&mut self) -> FrameHandle;
    /// Drop a frame that was requested but has not fired
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Identifies a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Page scroll position at capture time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    /// Horizontal scroll in CSS pixels
    pub left: f32,
    /// Vertical scroll in CSS pixels
    pub top: f32,
}

/// What the capture collaborator should grab
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    /// Spotlight in viewport CSS pixels
    pub rect: Rect,
    /// Page scroll at confirm time
    pub scroll: ScrollOffset,
    /// Device pixels per CSS pixel
    pub device_pixel_ratio: f32,
}

/// Animated mask change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Duration in milliseconds
    pub duration_ms: u32,
}

impl Transition {
    /// Wheel resize animation
    pub const WHEEL: Transition = Transition { duration_ms: 100 };
}

/// Everything the host redraws on a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotlightFrame {
    /// Spotlight rect
    pub rect: Rect,
    /// Dimming mask around it
    pub borders: MaskBorders,
    /// Animate towards this frame
    pub transition: Option<Transition>,
    /// Tips overlay visibility
    pub tips_visible: bool,
    /// Close button visibility
    pub close_visible: bool,
}

/// Why no content is shown in the result view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultError {
    /// The capture held no readable code
    NoCode,
    /// Capture or decode failed
    Failed(String),
}

/// Result stage contents
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResultView {
    /// First decoded content
    pub content: Option<String>,
    /// Shown instead of content
    pub error: Option<ResultError>,
    /// Where the captured image is displayed, when there is one
    pub preview: Option<Rect>,
    /// Offer a copy button
    pub can_copy: bool,
    /// Link target when the content is a URL
    pub open_link: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    center: Option<Point>,
    transition: Option<Transition>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Overlays {
    tips: Option<Rect>,
    close: Option<Rect>,
}

/// Region picker state, from mount to close
#[derive(Debug)]
pub struct Picker<S: FrameScheduler> {
    steps: ScaleSteps,
    viewport: Size,
    base_scan_size: f32,
    scale_level: u32,
    scan_size: f32,
    pointer: Option<Point>,
    spotlight: Rect,
    stage: Stage,
    pending: Option<PendingUpdate>,
    frame: Option<FrameHandle>,
    overlays: Overlays,
    result: Option<ScanResultView>,
    scheduler: S,
}

impl<S: FrameScheduler> Picker<S> {
    /// Mount a picker over `viewport`, starting at `initial_level` (clamped).
    ///
    /// The spotlight starts collapsed at the viewport centre and opens on the
    /// first frame.
    pub fn mount(viewport: Size, initial_level: i64, scheduler: S) -> Self {
        let steps = ScaleSteps::default();
        let base = base_scan_size(viewport);
        let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        let mut picker = Self {
            steps,
            viewport,
            base_scan_size: base,
            scale_level: DEFAULT_SCALE_LEVEL,
            scan_size: steps.scan_size(base, i64::from(DEFAULT_SCALE_LEVEL)),
            pointer: None,
            spotlight: Rect::new(center.x, center.y, 0.0, 0.0),
            stage: Stage::Picking,
            pending: None,
            frame: None,
            overlays: Overlays::default(),
            result: None,
            scheduler,
        };
        picker.set_scale_level(initial_level);
        picker.schedule(Some(center), None);
        picker
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Effective scale level
    pub fn scale_level(&self) -> u32 {
        self.scale_level
    }

    /// Current spotlight side in pixels
    pub fn scan_size(&self) -> f32 {
        self.scan_size
    }

    /// Reference size derived from the viewport
    pub fn base_scan_size(&self) -> f32 {
        self.base_scan_size
    }

    /// Last spotlight drawn (or computed on resize)
    pub fn spotlight(&self) -> Rect {
        self.spotlight
    }

    /// Last known pointer position
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    /// Current viewport
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Result view while in [`Stage::Result`]
    pub fn result(&self) -> Option<&ScanResultView> {
        self.result.as_ref()
    }

    /// A frame has been requested and not yet delivered
    pub fn frame_pending(&self) -> bool {
        self.frame.is_some()
    }

    /// The host's frame scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Set the scale level, clamped to the valid range; returns the effective level
    pub fn set_scale_level(&mut self, level: i64) -> u32 {
        self.scale_level = self.steps.clamp_level(level);
        self.scan_size = self
            .steps
            .scan_size(self.base_scan_size, i64::from(self.scale_level));
        self.scale_level
    }

    /// Overlay element bounds used for fading
    pub fn set_overlay_rects(&mut self, tips: Option<Rect>, close: Option<Rect>) {
        self.overlays = Overlays { tips, close };
    }

    /// Pointer entered or moved over the mask
    pub fn pointer_moved(&mut self, p: Point) {
        if self.stage != Stage::Picking || !p.is_finite() {
            return;
        }
        self.pointer = Some(p);
        self.schedule(Some(p), None);
    }

    /// One wheel tick; returns whether the scale level changed
    pub fn wheel(&mut self, delta_y: f32, p: Point) -> bool {
        if self.stage != Stage::Picking || delta_y == 0.0 || delta_y.is_nan() {
            return false;
        }
        let before = self.scale_level;
        let step = if delta_y > 0.0 { -1 } else { 1 };
        self.set_scale_level(i64::from(before) + step);
        self.schedule(Some(p), Some(Transition::WHEEL));
        self.scale_level != before
    }

    /// Viewport changed size; spotlight and scan size follow
    pub fn resized(&mut self, viewport: Size) {
        self.spotlight = resize_spotlight(self.spotlight, self.viewport, viewport);
        self.viewport = viewport;
        self.base_scan_size = base_scan_size(viewport);
        self.set_scale_level(i64::from(self.scale_level));
        debug!(
            width = viewport.width,
            height = viewport.height,
            scan_size = self.scan_size,
            "picker viewport resized"
        );
        self.schedule(None, None);
    }

    /// Frame callback: apply the latest pending update.
    ///
    /// Returns `None` when there is nothing to draw or the picker left `Picking`.
    pub fn on_frame(&mut self) -> Option<SpotlightFrame> {
        self.frame = None;
        if self.stage != Stage::Picking {
            self.pending = None;
            return None;
        }
        let update = self.pending.take()?;
        if update.center.is_some() {
            self.spotlight =
                compute_spotlight(update.center, self.scan_size, self.viewport, self.spotlight);
        }
        Some(self.frame_for(update.transition))
    }

    /// Confirm the current spotlight and start scanning
    pub fn confirm(
        &mut self,
        scroll: ScrollOffset,
        device_pixel_ratio: f32,
    ) -> Result<CaptureRequest, PickerError> {
        self.expect_stage(Stage::Picking, "confirm")?;
        self.leave_picking(Stage::Scanning);
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        debug!(rect = ?self.spotlight, "picker confirmed region");
        Ok(CaptureRequest {
            rect: self.spotlight,
            scroll,
            device_pixel_ratio,
        })
    }

    /// Capture and decode returned; success and failure both show the result
    pub fn finish_scan(
        &mut self,
        outcome: &ScanOutcome,
        has_image: bool,
    ) -> Result<&ScanResultView, PickerError> {
        self.expect_stage(Stage::Scanning, "finish scan")?;

        let (content, error) = match outcome {
            ScanOutcome::Decoded { content, .. } => (Some(content.clone()), None),
            ScanOutcome::NoCode => (None, Some(ResultError::NoCode)),
            ScanOutcome::Failed(message) => (None, Some(ResultError::Failed(message.clone()))),
        };

        let preview = has_image.then(|| {
            let captured = Size::new(self.spotlight.width, self.spotlight.height);
            result_preview_rect(captured, self.viewport)
        });
        if let Some(rect) = preview {
            self.spotlight = rect;
        }

        let open_link = content.as_deref().filter(|c| is_url(c)).map(str::to_owned);
        self.stage = Stage::Result;
        let view = self.result.insert(ScanResultView {
            can_copy: content.as_deref().is_some_and(|c| !c.is_empty()),
            content,
            error,
            preview,
            open_link,
        });
        Ok(view)
    }

    /// Dismiss the result and pick again, optionally recentred on `pointer`
    pub fn rescan(&mut self, pointer: Option<Point>) -> Result<(), PickerError> {
        self.expect_stage(Stage::Result, "rescan")?;
        self.stage = Stage::Picking;
        self.result = None;
        if let Some(p) = pointer.filter(Point::is_finite) {
            self.pointer = Some(p);
        }
        let center = self
            .pointer
            .unwrap_or(Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0));
        self.schedule(Some(center), None);
        Ok(())
    }

    /// Tear down from any stage
    pub fn close(&mut self) {
        if self.stage == Stage::Closed {
            return;
        }
        self.leave_picking(Stage::Closed);
        self.result = None;
        debug!("picker closed");
    }

    fn expect_stage(&self, expected: Stage, action: &'static str) -> Result<(), PickerError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(PickerError::InvalidTransition {
                stage: self.stage,
                action,
            })
        }
    }

    fn leave_picking(&mut self, next: Stage) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.pending = None;
        self.stage = next;
    }

    /// Record an update; the latest one wins and at most one frame is outstanding
    fn schedule(&mut self, center: Option<Point>, transition: Option<Transition>) {
        self.pending = Some(PendingUpdate { center, transition });
        if self.stage == Stage::Picking && self.frame.is_none() {
            self.frame = Some(self.scheduler.request_frame());
        }
    }

    fn frame_for(&self, transition: Option<Transition>) -> SpotlightFrame {
        let visible = |element: Option<Rect>| {
            element.is_none_or(|r| overlay_visible(&r, &self.spotlight, self.pointer))
        };
        SpotlightFrame {
            rect: self.spotlight,
            borders: mask_borders(self.spotlight, self.viewport),
            transition,
            tips_visible: visible(self.overlays.tips),
            close_visible: visible(self.overlays.close),
        }
    }
}
