//! Picker flows driven the way a host page would drive them.

use qr_lite::models::{Point, Rect, Size};
use qr_lite::picker::{
    FrameHandle, FrameScheduler, Picker, ScrollOffset, Stage, base_scan_size, compute_spotlight,
    mount_with_settings, persist_scale_level, resize_spotlight,
};
use qr_lite::scan::{
    CaptureRegion, Chromium, Detection, Firefox, PlatformApi, ScanError, ScanOutcome, TabCapture,
    scan_region,
};
use qr_lite::settings::{KeyValueStore, MemoryStore, SettingsService};

use image::RgbaImage;

#[derive(Debug, Default)]
struct Frames {
    next: u64,
    requested: usize,
    cancelled: usize,
}

impl FrameScheduler for Frames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        self.requested += 1;
        FrameHandle(self.next)
    }

    fn cancel_frame(&mut self, _handle: FrameHandle) {
        self.cancelled += 1;
    }
}

struct BlankTab;

impl TabCapture for BlankTab {
    fn capture_visible(&self, region: Option<CaptureRegion>) -> Result<RgbaImage, ScanError> {
        Ok(match region {
            Some(r) => RgbaImage::new(r.width, r.height),
            None => RgbaImage::new(800, 600),
        })
    }
}

struct Reads(&'static str);

impl qr_lite::scan::Decoder for Reads {
    fn decode(&self, _image: &RgbaImage) -> Result<Vec<Detection>, ScanError> {
        Ok(vec![Detection {
            content: self.0.to_owned(),
            vertices: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
        }])
    }
}

#[test]
fn test_pointer_scenario() {
    let rect = compute_spotlight(
        Some(Point::new(100.0, 100.0)),
        50.0,
        Size::new(800.0, 600.0),
        Rect::default(),
    );
    assert_eq!(rect, Rect::new(75.0, 75.0, 50.0, 50.0));
}

#[test]
fn test_resize_scenario() {
    let old = Size::new(800.0, 600.0);
    let new = Size::new(1600.0, 1200.0);
    let spotlight = Rect::centered(Point::new(400.0, 300.0), 40.0, 40.0);

    let resized = resize_spotlight(spotlight, old, new);
    assert_eq!(resized.center(), Point::new(800.0, 600.0));
    let expected = 40.0 * base_scan_size(new) / base_scan_size(old);
    assert!((resized.width - expected).abs() < 1e-3);
    assert!((resized.width - 80.0).abs() < 1e-3);
}

#[test]
fn test_full_scan_flow() {
    let mut settings = SettingsService::new(MemoryStore::default());
    let mut picker: Picker<Frames> =
        mount_with_settings(Size::new(800.0, 600.0), &settings, Frames::default()).unwrap();
    assert_eq!(picker.scale_level(), 10);
    assert!(picker.on_frame().is_some());

    picker.pointer_moved(Point::new(200.0, 150.0));
    picker.pointer_moved(Point::new(210.0, 160.0));
    // coalesced into one frame
    assert_eq!(picker.scheduler().requested, 2);
    let frame = picker.on_frame().unwrap();
    let center = frame.rect.center();
    assert!((center.x - 210.0).abs() <= 1.0 && (center.y - 160.0).abs() <= 1.0);

    assert!(picker.wheel(-120.0, Point::new(210.0, 160.0)));
    assert_eq!(picker.scale_level(), 11);
    persist_scale_level(&picker, &mut settings).unwrap();
    assert_eq!(settings.load().unwrap().picker_scale_level, 11);
    picker.on_frame();

    let request = picker
        .confirm(ScrollOffset { left: 0.0, top: 300.0 }, 2.0)
        .unwrap();
    assert_eq!(picker.stage(), Stage::Scanning);
    assert!(!picker.frame_pending());

    let mut history = MemoryStore::default();
    for platform in [&Firefox as &dyn PlatformApi, &Chromium] {
        let report = scan_region(
            &request,
            platform,
            &BlankTab,
            &Reads("https://example.com"),
            Some(&mut history as &mut dyn KeyValueStore),
        );
        assert!(matches!(
            &report.outcome,
            ScanOutcome::Decoded { content, .. } if content == "https://example.com"
        ));
        assert!(report.image.is_some());
    }
    assert_eq!(qr_lite::history::get_history(&history).unwrap().len(), 1);

    let view = picker
        .finish_scan(
            &ScanOutcome::Decoded {
                content: "https://example.com".into(),
                detections: Vec::new(),
            },
            true,
        )
        .unwrap();
    assert_eq!(view.open_link.as_deref(), Some("https://example.com"));
    assert!(view.can_copy);
    assert!(view.preview.is_some());

    picker.rescan(None).unwrap();
    assert_eq!(picker.stage(), Stage::Picking);
    assert!(picker.frame_pending());

    picker.close();
    assert_eq!(picker.stage(), Stage::Closed);
    assert!(!picker.frame_pending());
    assert_eq!(picker.scheduler().cancelled, 1);
    assert!(picker.confirm(ScrollOffset::default(), 1.0).is_err());
}

#[test]
fn test_mount_uses_persisted_level() {
    let mut settings = SettingsService::new(MemoryStore::default());
    let mut values = serde_json::Map::new();
    values.insert("pickerScaleLevel".into(), serde_json::json!(500));
    settings.save(values).unwrap();

    let picker: Picker<Frames> =
        mount_with_settings(Size::new(1000.0, 1000.0), &settings, Frames::default()).unwrap();
    assert_eq!(picker.scale_level(), 30);
    assert!((picker.scan_size() - 110.0 * 10.0).abs() < 1e-2);
}
