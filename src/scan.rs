//! Capture and decode boundary.
//!
//! The picker hands over a [`CaptureRequest`]; a [`PlatformApi`] turns it into
//! pixels through the host's [`TabCapture`], and a [`Decoder`] finds codes in
//! them. Both collaborators live outside this crate.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use image::imageops;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config;
use crate::history::{self, HistoryKind};
use crate::models::Point;
use crate::picker::CaptureRequest;
use crate::settings::KeyValueStore;

/// Capture and decode failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The host could not capture the tab
    #[error("capture failed: {0}")]
    Capture(String),
    /// The requested region lies outside the captured image
    #[error("capture region is empty")]
    EmptyRegion,
    /// The decoder gave up
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Region of the visible tab in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

/// Host screenshot capability
pub trait TabCapture {
    /// Capture the visible tab, or only `region` when the browser supports it
    fn capture_visible(&self, region: Option<CaptureRegion>) -> Result<RgbaImage, ScanError>;
}

/// One code found in an image
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Decoded text
    pub content: String,
    /// Corner points in image pixels
    pub vertices: Vec<Point>,
}

impl Detection {
    /// Vertices as an SVG `points` attribute, for a position marker overlay
    pub fn polygon_points(&self) -> String {
        self.vertices
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// QR decoding collaborator
pub trait Decoder {
    /// Find all codes in the image; an empty list is not an error
    fn decode(&self, image: &RgbaImage) -> Result<Vec<Detection>, ScanError>;
}

/// Browser-specific capture behaviour, chosen once at startup
pub trait PlatformApi {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Grab the pixels under a confirmed spotlight
    fn capture(
        &self,
        request: &CaptureRequest,
        tab: &dyn TabCapture,
    ) -> Result<RgbaImage, ScanError>;
}

/// Browsers that crop during capture
#[derive(Debug, Clone, Copy, Default)]
pub struct Firefox;

impl PlatformApi for Firefox {
    fn name(&self) -> &'static str {
        "firefox"
    }

    fn capture(
        &self,
        request: &CaptureRequest,
        tab: &dyn TabCapture,
    ) -> Result<RgbaImage, ScanError> {
        let rect = request.rect;
        let region = CaptureRegion {
            x: (rect.x + request.scroll.left).round() as i64,
            y: (rect.y + request.scroll.top).round() as i64,
            width: rect.width.max(0.0).round() as u32,
            height: rect.height.max(0.0).round() as u32,
        };
        if region.width == 0 || region.height == 0 {
            return Err(ScanError::EmptyRegion);
        }
        tab.capture_visible(Some(region))
    }
}

/// Browsers that capture the whole tab in device pixels
#[derive(Debug, Clone, Copy, Default)]
pub struct Chromium;

impl PlatformApi for Chromium {
    fn name(&self) -> &'static str {
        "chromium"
    }

    fn capture(
        &self,
        request: &CaptureRequest,
        tab: &dyn TabCapture,
    ) -> Result<RgbaImage, ScanError> {
        let full = tab.capture_visible(None)?;
        let dpr = request.device_pixel_ratio;
        let rect = request.rect;

        let x0 = (rect.x * dpr).round().max(0.0) as u32;
        let y0 = (rect.y * dpr).round().max(0.0) as u32;
        let x1 = ((rect.right() * dpr).round().max(0.0) as u32).min(full.width());
        let y1 = ((rect.bottom() * dpr).round().max(0.0) as u32).min(full.height());
        if x1 <= x0 || y1 <= y0 {
            return Err(ScanError::EmptyRegion);
        }

        Ok(imageops::crop_imm(&full, x0, y0, x1 - x0, y1 - y0).to_image())
    }
}

/// Capture API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    /// Region capture with scroll offsets
    Firefox,
    /// Full capture plus crop
    #[default]
    Chromium,
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BrowserKind::Firefox => "firefox",
            BrowserKind::Chromium => "chromium",
        })
    }
}

impl FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firefox" => Ok(BrowserKind::Firefox),
            "chromium" | "chrome" | "edge" => Ok(BrowserKind::Chromium),
            other => Err(format!("unknown browser: {other}")),
        }
    }
}

/// The capture implementation for a browser
pub fn platform_for(kind: BrowserKind) -> Box<dyn PlatformApi> {
    match kind {
        BrowserKind::Firefox => Box::new(Firefox),
        BrowserKind::Chromium => Box::new(Chromium),
    }
}

/// The capture implementation selected by `QR_LITE_BROWSER`
pub fn default_platform() -> Box<dyn PlatformApi> {
    let kind = config::browser();
    debug!(%kind, "selected capture platform");
    platform_for(kind)
}

/// What a scan produced
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// At least one code; `content` is the first one's
    Decoded {
        /// First decoded content
        content: String,
        /// Every detection, in decoder order
        detections: Vec<Detection>,
    },
    /// The image held no readable code
    NoCode,
    /// Capture or decode failed; the message is shown as-is
    Failed(String),
}

/// A scan outcome plus the captured image, when capture succeeded
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Decode result
    pub outcome: ScanOutcome,
    /// Captured pixels for the result preview
    pub image: Option<RgbaImage>,
}

/// Capture the requested region and decode it.
///
/// Failures never escape: they become [`ScanOutcome::Failed`]. A successful
/// decode is recorded in `history` when one is given.
pub fn scan_region(
    request: &CaptureRequest,
    platform: &dyn PlatformApi,
    tab: &dyn TabCapture,
    decoder: &dyn Decoder,
    history: Option<&mut dyn KeyValueStore>,
) -> ScanReport {
    let image = match platform.capture(request, tab) {
        Ok(image) => image,
        Err(err) => {
            warn!(platform = platform.name(), %err, "capture failed");
            return ScanReport {
                outcome: ScanOutcome::Failed(err.to_string()),
                image: None,
            };
        }
    };
    debug!(
        platform = platform.name(),
        width = image.width(),
        height = image.height(),
        "captured region"
    );

    let outcome = match decoder.decode(&image) {
        Ok(detections) => match detections.first().map(|d| d.content.clone()) {
            Some(content) => ScanOutcome::Decoded {
                content,
                detections,
            },
            None => ScanOutcome::NoCode,
        },
        Err(err) => {
            warn!(%err, "decode failed");
            ScanOutcome::Failed(err.to_string())
        }
    };

    if let (ScanOutcome::Decoded { content, .. }, Some(store)) = (&outcome, history) {
        if let Err(err) = history::add_history(store, HistoryKind::Decode, content) {
            warn!(%err, "could not record scan in history");
        }
    }

    ScanReport {
        outcome,
        image: Some(image),
    }
}
