//! Region-picker interaction geometry.
//!
//! Pointer, wheel and click input drive a square capture region (the
//! spotlight) through `Picking → Scanning → Result`. Geometry lives in
//! [`geometry`] as pure functions; [`Picker`] owns the state and the frame
//! cadence.

pub mod geometry;
pub mod state;

pub use geometry::{
    DEFAULT_SCALE_LEVEL, MaskBorders, ScaleSteps, base_scan_size, collides, compute_spotlight,
    mask_borders, overlay_visible, resize_spotlight, result_preview_rect,
};
pub use state::{
    CaptureRequest, FrameHandle, FrameScheduler, Picker, PickerError, ResultError,
    ScanResultView, ScrollOffset, SpotlightFrame, Stage, Transition,
};

use serde_json::{Map, Value};

use crate::models::Size;
use crate::settings::{KeyValueStore, SettingKey, SettingsService, StoreError};

/// Mount a picker at the scale level persisted in settings
pub fn mount_with_settings<S, K>(
    viewport: Size,
    settings: &SettingsService<K>,
    scheduler: S,
) -> Result<Picker<S>, StoreError>
where
    S: FrameScheduler,
    K: KeyValueStore,
{
    let level = settings.load()?.picker_scale_level;
    Ok(Picker::mount(viewport, i64::from(level), scheduler))
}

/// Write the picker's current scale level back to settings
pub fn persist_scale_level<S, K>(
    picker: &Picker<S>,
    settings: &mut SettingsService<K>,
) -> Result<(), StoreError>
where
    S: FrameScheduler,
    K: KeyValueStore,
{
    let mut values = Map::new();
    values.insert(
        SettingKey::PickerScaleLevel.as_str().to_owned(),
        Value::from(picker.scale_level()),
    );
    settings.save(values)
}
