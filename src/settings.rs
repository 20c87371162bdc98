//! User settings: definition, normalization, storage and change notification.
//!
//! Values are stored as loose JSON in a [`KeyValueStore`]. Every read and write
//! goes through the per-key normalizer, so callers always see a valid value no
//! matter what is on disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::EcLevel;
use crate::picker::{DEFAULT_SCALE_LEVEL, ScaleSteps};
use crate::render::styles::{
    DEFAULT_FINDER_STYLE, DEFAULT_MODULE_STYLE, find_module_style, finder_styles,
};

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("settings file I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The backing file is not valid JSON
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A key outside the settings definition
    #[error("unknown settings key: {0}")]
    UnknownKey(String),
}

/// Opaque JSON key-value persistence
pub trait KeyValueStore {
    /// Values for the keys that are present; missing keys are left out
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;
    /// Merge `values` into the store
    fn set(&mut self, values: Map<String, Value>) -> Result<(), StoreError>;
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Map<String, Value>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        Ok(pick(&self.values, keys))
    }

    fn set(&mut self, values: Map<String, Value>) -> Result<(), StoreError> {
        self.values.extend(values);
        Ok(())
    }
}

/// Store backed by one pretty-printed JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Open `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Object(map) => map,
                other => {
                    warn!(path = %path.display(), kind = json_kind(&other), "settings file is not an object, ignoring");
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "opened settings file");
        Ok(Self { path, values })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        Ok(pick(&self.values, keys))
    }

    fn set(&mut self, values: Map<String, Value>) -> Result<(), StoreError> {
        // memory only follows a successful write
        let mut merged = self.values.clone();
        merged.extend(values);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&merged)?;
        fs::write(&self.path, text)?;
        self.values = merged;
        Ok(())
    }
}

fn pick(values: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| values.get(*k).map(|v| ((*k).to_owned(), v.clone())))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Legacy style preset that also picks a finder style
pub const DOTS_XS_RF: &str = "dots_xs_rf";

/// Every known settings key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Record encodes and decodes in history
    HistoryEnabled,
    /// Play a sound after a successful scan
    ScanSuccessSoundEnabled,
    /// Error correction level for generated codes
    EcLevel,
    /// Module style (or a legacy preset)
    QrCodeStyle,
    /// Finder style
    QrCodeFinderStyle,
    /// Light modules on dark backgrounds when the UI is dark
    WhiteOnBlackQrCodeInDarkMode,
    /// Pause page videos while the picker is open
    PickerPauseVideosOnloadEnabled,
    /// Last picker scale level
    PickerScaleLevel,
}

impl SettingKey {
    /// All keys in definition order
    pub const ALL: [SettingKey; 8] = [
        SettingKey::HistoryEnabled,
        SettingKey::ScanSuccessSoundEnabled,
        SettingKey::EcLevel,
        SettingKey::QrCodeStyle,
        SettingKey::QrCodeFinderStyle,
        SettingKey::WhiteOnBlackQrCodeInDarkMode,
        SettingKey::PickerPauseVideosOnloadEnabled,
        SettingKey::PickerScaleLevel,
    ];

    /// Storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::HistoryEnabled => "historyEnabled",
            SettingKey::ScanSuccessSoundEnabled => "scanSuccessSoundEnabled",
            SettingKey::EcLevel => "ecLevel",
            SettingKey::QrCodeStyle => "qrCodeStyle",
            SettingKey::QrCodeFinderStyle => "qrCodeFinderStyle",
            SettingKey::WhiteOnBlackQrCodeInDarkMode => "whiteOnBlackQRCodeInDarkMode",
            SettingKey::PickerPauseVideosOnloadEnabled => "pickerPauseVideosOnloadEnabled",
            SettingKey::PickerScaleLevel => "pickerScaleLevel",
        }
    }

    /// Coerce a stored value (or its absence) into a valid one
    pub fn normalize(&self, value: Option<&Value>) -> Value {
        match self {
            SettingKey::HistoryEnabled | SettingKey::ScanSuccessSoundEnabled => {
                Value::Bool(matches!(value, None | Some(Value::Bool(true))))
            }
            SettingKey::PickerPauseVideosOnloadEnabled => {
                Value::Bool(value.is_none_or(|v| *v == Value::Bool(true)))
            }
            SettingKey::WhiteOnBlackQrCodeInDarkMode => {
                Value::Bool(matches!(value, Some(Value::Bool(true))))
            }
            SettingKey::EcLevel => {
                let level = value
                    .and_then(Value::as_str)
                    .and_then(|s| EcLevel::ALL.into_iter().find(|l| l.as_str() == s))
                    .unwrap_or_default();
                Value::from(level.as_str())
            }
            SettingKey::QrCodeStyle => {
                let name = value
                    .and_then(Value::as_str)
                    .filter(|s| *s == DOTS_XS_RF || find_module_style(s).is_some())
                    .unwrap_or(DEFAULT_MODULE_STYLE);
                Value::from(name)
            }
            SettingKey::QrCodeFinderStyle => {
                let name = value
                    .and_then(Value::as_str)
                    .filter(|s| finder_styles().iter().any(|f| f.name == *s))
                    .unwrap_or(DEFAULT_FINDER_STYLE);
                Value::from(name)
            }
            SettingKey::PickerScaleLevel => {
                let level = value
                    .and_then(Value::as_f64)
                    .filter(|v| v.is_finite())
                    .map_or(DEFAULT_SCALE_LEVEL, |v| {
                        ScaleSteps::default().clamp_level(v.round() as i64)
                    });
                Value::from(level)
            }
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| StoreError::UnknownKey(s.to_owned()))
    }
}

/// Normalized settings snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// See [`SettingKey::HistoryEnabled`]
    pub history_enabled: bool,
    /// See [`SettingKey::ScanSuccessSoundEnabled`]
    pub scan_success_sound_enabled: bool,
    /// See [`SettingKey::EcLevel`]
    pub ec_level: EcLevel,
    /// See [`SettingKey::QrCodeStyle`]
    pub qr_code_style: String,
    /// See [`SettingKey::QrCodeFinderStyle`]
    pub qr_code_finder_style: String,
    /// See [`SettingKey::WhiteOnBlackQrCodeInDarkMode`]
    #[serde(rename = "whiteOnBlackQRCodeInDarkMode")]
    pub white_on_black_qr_code_in_dark_mode: bool,
    /// See [`SettingKey::PickerPauseVideosOnloadEnabled`]
    pub picker_pause_videos_onload_enabled: bool,
    /// See [`SettingKey::PickerScaleLevel`]
    pub picker_scale_level: u32,
}

impl Settings {
    /// Module and finder style names to render with.
    ///
    /// The `dots_xs_rf` preset maps to `dots_xs` modules with `dots` finders
    /// unless a finder style was picked explicitly.
    pub fn render_styles(&self) -> (String, String) {
        if self.qr_code_style == DOTS_XS_RF {
            let finder = if self.qr_code_finder_style == DEFAULT_FINDER_STYLE {
                "dots".to_owned()
            } else {
                self.qr_code_finder_style.clone()
            };
            ("dots_xs".to_owned(), finder)
        } else {
            (self.qr_code_style.clone(), self.qr_code_finder_style.clone())
        }
    }

    fn from_raw(raw: &Map<String, Value>) -> Result<Self, StoreError> {
        let normalized: Map<String, Value> = SettingKey::ALL
            .into_iter()
            .map(|k| (k.as_str().to_owned(), k.normalize(raw.get(k.as_str()))))
            .collect();
        Ok(serde_json::from_value(Value::Object(normalized))?)
    }
}

impl Default for Settings {
    fn default() -> Self {
        // Normalizing an empty map only produces valid values.
        Self::from_raw(&Map::new()).unwrap_or_else(|err| {
            warn!(%err, "default settings failed to deserialize");
            Self {
                history_enabled: true,
                scan_success_sound_enabled: true,
                ec_level: EcLevel::L,
                qr_code_style: DEFAULT_MODULE_STYLE.to_owned(),
                qr_code_finder_style: DEFAULT_FINDER_STYLE.to_owned(),
                white_on_black_qr_code_in_dark_mode: false,
                picker_pause_videos_onload_enabled: true,
                picker_scale_level: DEFAULT_SCALE_LEVEL,
            }
        })
    }
}

/// Normalized values that changed
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsChange(pub Map<String, Value>);

impl SettingsChange {
    /// New value for `key`, when it changed
    pub fn get(&self, key: SettingKey) -> Option<&Value> {
        self.0.get(key.as_str())
    }
}

/// Handle returned by [`Subscriptions::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SettingsChange)>;

/// Change listeners with explicit subscribe/unsubscribe
#[derive(Default)]
pub struct Subscriptions {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscriptions {
    /// Register a listener
    pub fn subscribe(&mut self, listener: impl FnMut(&SettingsChange) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; false when it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    /// Call every listener in subscription order
    pub fn notify(&mut self, change: &SettingsChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }

    /// Number of listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// No listeners registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Settings access over a store
#[derive(Debug)]
pub struct SettingsService<K> {
    store: K,
    subscriptions: Subscriptions,
}

impl<K: KeyValueStore> SettingsService<K> {
    /// Wrap a store
    pub fn new(store: K) -> Self {
        Self {
            store,
            subscriptions: Subscriptions::default(),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &K {
        &self.store
    }

    /// Underlying store, for collaborators such as history
    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }

    /// Read and normalize every setting
    pub fn load(&self) -> Result<Settings, StoreError> {
        let keys = SettingKey::ALL.map(|k| k.as_str());
        let raw = self.store.get(&keys)?;
        Settings::from_raw(&raw)
    }

    /// Read and normalize one setting, straight from the store
    pub fn value_from_storage(&self, key: &str) -> Result<Value, StoreError> {
        let key: SettingKey = key.parse()?;
        let raw = self.store.get(&[key.as_str()])?;
        Ok(key.normalize(raw.get(key.as_str())))
    }

    /// Normalize and persist `values`, then notify subscribers.
    ///
    /// Any unknown key rejects the whole batch before anything is written.
    pub fn save(&mut self, values: Map<String, Value>) -> Result<(), StoreError> {
        let mut normalized = Map::new();
        for (name, value) in &values {
            let key: SettingKey = name.parse()?;
            normalized.insert(name.clone(), key.normalize(Some(value)));
        }
        self.store.set(normalized.clone())?;
        debug!(keys = normalized.len(), "saved settings");
        self.subscriptions.notify(&SettingsChange(normalized));
        Ok(())
    }

    /// Forward a change made by another writer; unknown keys are dropped
    pub fn apply_external_change(&mut self, changes: &Map<String, Value>) {
        let normalized: Map<String, Value> = changes
            .iter()
            .filter_map(|(name, value)| {
                let key = name.parse::<SettingKey>().ok()?;
                Some((name.clone(), key.normalize(Some(value))))
            })
            .collect();
        if !normalized.is_empty() {
            self.subscriptions.notify(&SettingsChange(normalized));
        }
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl FnMut(&SettingsChange) + 'static) -> SubscriptionId {
        self.subscriptions.subscribe(listener)
    }

    /// Remove a change listener
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    /// Registered listeners
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }
}
