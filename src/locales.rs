//! Locale consistency checks for `_locales/<locale>/messages.json` trees.
//!
//! Two passes: keys referenced by the sources against the source locale, then
//! every other locale against the source locale.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name of a locale catalogue
pub const MESSAGES_FILE: &str = "messages.json";

/// `__MSG_key__` in manifests and markup, `i18n.getMessage('key')` in scripts
const KEY_PATTERN: &str = r#"__MSG_(\w+)__|i18n\.getMessage\s*\(\s*['"](\w+)['"]"#;

/// File extensions searched for message keys
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "json", "html"];

/// Directories under the source root that are never searched
pub const SKIPPED_DIRS: &[&str] = &["_locales", "icons", "opencv"];

/// Keys the browser provides, plus `version` which the build injects
pub const PREDEFINED_KEYS: &[&str] = &[
    "extension_id",
    "ui_locale",
    "bidi_dir",
    "bidi_reversed_dir",
    "bidi_start_edge",
    "bidi_end_edge",
    "version",
];

/// Locale checking failures
#[derive(Debug, Error)]
pub enum LocaleError {
    /// A directory or catalogue could not be read
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
    /// A catalogue is not valid JSON
    #[error("invalid messages file `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),
    /// The source locale has no catalogue
    #[error("source locale `{0}` not found")]
    MissingSource(String),
    /// The key pattern failed to compile
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// One catalogue entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Translated text
    pub message: String,
    /// Note for translators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named substitutions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub placeholders: BTreeMap<String, serde_json::Value>,
}

/// Catalogue keyed by message name
pub type Messages = BTreeMap<String, Message>;

/// Differences between one locale and the source locale
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocaleReport {
    /// Locale directory name
    pub locale: String,
    /// Keys present in the source only
    pub missing: Vec<String>,
    /// Keys whose text equals the source text
    pub untranslated: Vec<String>,
    /// Keys present in this locale only
    pub redundant: Vec<String>,
    /// Keys whose placeholder names differ from the source
    pub placeholder_mismatch: Vec<String>,
}

impl LocaleReport {
    /// Nothing missing and nothing stale
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.redundant.is_empty()
            && self.placeholder_mismatch.is_empty()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} missing, {} untranslated",
            self.locale,
            self.missing.len(),
            self.untranslated.len()
        )
    }
}

/// Keys used by the sources compared with the source locale
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceReport {
    /// Source locale name
    pub locale: String,
    /// Keys referenced in code but absent from the source locale
    pub missing: Vec<String>,
    /// Source locale keys nothing references
    pub unused: Vec<String>,
}

impl SourceReport {
    /// Every used key is defined and every defined key is used
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unused.is_empty()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "SRC({}): {} missing, {} unused",
            self.locale,
            self.missing.len(),
            self.unused.len()
        )
    }
}

/// Compare keys found in the sources against the source catalogue
pub fn compare_usage(locale: &str, used: &BTreeSet<String>, source: &Messages) -> SourceReport {
    SourceReport {
        locale: locale.to_owned(),
        missing: used
            .iter()
            .filter(|k| !source.contains_key(*k) && !PREDEFINED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect(),
        unused: source.keys().filter(|k| !used.contains(*k)).cloned().collect(),
    }
}

/// Collect every message key referenced under `root`
pub fn scan_sources(root: &Path) -> Result<BTreeSet<String>, LocaleError> {
    let pattern = Regex::new(KEY_PATTERN)?;
    let mut keys = BTreeSet::new();
    scan_recursive(&pattern, root, &mut keys)?;
    debug!(root = %root.display(), keys = keys.len(), "scanned sources for message keys");
    Ok(keys)
}

fn scan_recursive(
    pattern: &Regex,
    dir: &Path,
    keys: &mut BTreeSet<String>,
) -> Result<(), LocaleError> {
    let entries = fs::read_dir(dir).map_err(|e| LocaleError::Io(dir.to_path_buf(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LocaleError::Io(dir.to_path_buf(), e))?;
        let path = entry.path();
        if path.is_dir() {
            let skipped = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if !skipped {
                scan_recursive(pattern, &path, keys)?;
            }
        } else if is_source_file(&path) {
            let text = fs::read_to_string(&path).map_err(|e| LocaleError::Io(path.clone(), e))?;
            extract_keys(pattern, &text, keys);
        }
    }
    Ok(())
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn extract_keys(pattern: &Regex, text: &str, keys: &mut BTreeSet<String>) {
    for caps in pattern.captures_iter(text) {
        if let Some(key) = caps.get(1).or_else(|| caps.get(2)) {
            keys.insert(key.as_str().to_owned());
        }
    }
}

/// Scan `src_root` and compare the keys with the `source` catalogue under `locales_dir`
pub fn check_sources(
    src_root: &Path,
    locales_dir: &Path,
    source: &str,
) -> Result<SourceReport, LocaleError> {
    let source_path = locales_dir.join(source).join(MESSAGES_FILE);
    if !source_path.is_file() {
        return Err(LocaleError::MissingSource(source.to_owned()));
    }
    let messages = load_messages(&source_path)?;
    let used = scan_sources(src_root)?;

    let report = compare_usage(source, &used, &messages);
    for key in &report.missing {
        warn!(locale = %source, key = %key, "key used in sources but not defined");
    }
    for key in &report.unused {
        warn!(locale = %source, key = %key, "key defined but never used");
    }
    info!("{}", report.summary());
    Ok(report)
}

/// Compare `target` against `source`
pub fn compare(locale: &str, source: &Messages, target: &Messages) -> LocaleReport {
    let mut report = LocaleReport {
        locale: locale.to_owned(),
        ..LocaleReport::default()
    };

    for (key, src) in source {
        match target.get(key) {
            None => report.missing.push(key.clone()),
            Some(dst) => {
                if dst.message == src.message {
                    report.untranslated.push(key.clone());
                }
                let src_names: BTreeSet<&String> = src.placeholders.keys().collect();
                let dst_names: BTreeSet<&String> = dst.placeholders.keys().collect();
                if src_names != dst_names {
                    report.placeholder_mismatch.push(key.clone());
                }
            }
        }
    }
    report.redundant = target
        .keys()
        .filter(|k| !source.contains_key(*k))
        .cloned()
        .collect();
    report
}

/// Read one catalogue
pub fn load_messages(path: &Path) -> Result<Messages, LocaleError> {
    let text = fs::read_to_string(path).map_err(|e| LocaleError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&text).map_err(|e| LocaleError::Json(path.to_path_buf(), e))
}

/// Check every locale under `dir` against `source`, sorted by locale name.
///
/// Directories without a catalogue are skipped.
pub fn check_dir(dir: &Path, source: &str) -> Result<Vec<LocaleReport>, LocaleError> {
    let source_path = dir.join(source).join(MESSAGES_FILE);
    if !source_path.is_file() {
        return Err(LocaleError::MissingSource(source.to_owned()));
    }
    let source_messages = load_messages(&source_path)?;

    let entries = fs::read_dir(dir).map_err(|e| LocaleError::Io(dir.to_path_buf(), e))?;
    let mut locales = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LocaleError::Io(dir.to_path_buf(), e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name == source || !entry.path().join(MESSAGES_FILE).is_file() {
            continue;
        }
        locales.push(name);
    }
    locales.sort();

    let mut reports = Vec::with_capacity(locales.len());
    for locale in locales {
        let messages = load_messages(&dir.join(&locale).join(MESSAGES_FILE))?;
        let report = compare(&locale, &source_messages, &messages);
        for key in &report.missing {
            warn!(%locale, key = %key, "missing key");
        }
        for key in &report.untranslated {
            debug!(%locale, key = %key, "untranslated key");
        }
        info!("{}", report.summary());
        reports.push(report);
    }
    Ok(reports)
}
