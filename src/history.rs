//! Encode/decode history.
//!
//! The list lives in the settings store as a JSON string under `history`,
//! oldest entry first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::settings::{KeyValueStore, StoreError};

/// Storage key of the serialized list
pub const HISTORY_KEY: &str = "history";

/// Entries kept after an insert
pub const MAX_HISTORY: usize = 100;

/// What produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    /// Content turned into a QR code
    Encode,
    /// Content read from a QR code
    Decode,
}

/// One history item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Origin of the entry
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    /// Encoded or decoded text
    pub text: String,
}

/// Stored history, oldest first.
///
/// A corrupt list is logged and reads as empty.
pub fn get_history<S>(store: &S) -> Result<Vec<HistoryEntry>, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(&[HISTORY_KEY])?;
    let Some(value) = raw.get(HISTORY_KEY) else {
        return Ok(Vec::new());
    };
    let Some(text) = value.as_str().filter(|t| !t.is_empty()) else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(text) {
        Ok(entries) => Ok(entries),
        Err(err) => {
            warn!(%err, "error while parsing history");
            Ok(Vec::new())
        }
    }
}

/// Append `text` unless it is already the newest entry.
///
/// Older entries with the same text are dropped so each text appears once,
/// and only the newest [`MAX_HISTORY`] entries are kept.
pub fn add_history<S>(store: &mut S, kind: HistoryKind, text: &str) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let mut entries = get_history(store)?;
    if entries.last().is_some_and(|e| e.text == text) {
        return Ok(());
    }
    entries.retain(|e| !e.text.is_empty() && e.text != text);
    entries.push(HistoryEntry {
        kind,
        text: text.to_owned(),
    });
    if entries.len() > MAX_HISTORY {
        entries.drain(..entries.len() - MAX_HISTORY);
    }
    debug!(?kind, len = entries.len(), "history updated");
    write(store, &entries)
}

/// Remove every entry
pub fn clear_history<S>(store: &mut S) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
{
    write(store, &[])
}

fn write<S>(store: &mut S, entries: &[HistoryEntry]) -> Result<(), StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let mut values = Map::new();
    values.insert(
        HISTORY_KEY.to_owned(),
        Value::String(serde_json::to_string(entries)?),
    );
    store.set(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;

    fn texts(store: &MemoryStore) -> Vec<String> {
        get_history(store)
            .unwrap()
            .into_iter()
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn test_empty_store() {
        assert!(get_history(&MemoryStore::default()).unwrap().is_empty());
    }

    #[test]
    fn test_add_and_format() {
        let mut store = MemoryStore::default();
        add_history(&mut store, HistoryKind::Encode, "hello").unwrap();
        add_history(&mut store, HistoryKind::Decode, "world").unwrap();

        let raw = store.get(&[HISTORY_KEY]).unwrap();
        assert_eq!(
            raw[HISTORY_KEY],
            Value::from(r#"[{"type":"encode","text":"hello"},{"type":"decode","text":"world"}]"#)
        );
    }

    #[test]
    fn test_duplicates() {
        let mut store = MemoryStore::default();
        for text in ["a", "b", "b", "c", "a"] {
            add_history(&mut store, HistoryKind::Encode, text).unwrap();
        }
        assert_eq!(texts(&store), ["b", "c", "a"]);
    }

    #[test]
    fn test_consecutive_duplicate_keeps_kind() {
        let mut store = MemoryStore::default();
        add_history(&mut store, HistoryKind::Encode, "x").unwrap();
        add_history(&mut store, HistoryKind::Decode, "x").unwrap();
        let entries = get_history(&store).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, HistoryKind::Encode);
    }

    #[test]
    fn test_cap() {
        let mut store = MemoryStore::default();
        for i in 0..(MAX_HISTORY + 5) {
            add_history(&mut store, HistoryKind::Decode, &i.to_string()).unwrap();
        }
        let texts = texts(&store);
        assert_eq!(texts.len(), MAX_HISTORY);
        assert_eq!(texts[0], "5");
        assert_eq!(texts[MAX_HISTORY - 1], (MAX_HISTORY + 4).to_string());
    }

    #[test]
    fn test_corrupt_history_reads_empty() {
        let mut store = MemoryStore::default();
        let mut values = Map::new();
        values.insert(HISTORY_KEY.into(), Value::from("{oops"));
        store.set(values).unwrap();
        assert!(get_history(&store).unwrap().is_empty());

        add_history(&mut store, HistoryKind::Encode, "fresh").unwrap();
        assert_eq!(texts(&store), ["fresh"]);
    }

    #[test]
    fn test_empty_text_entries_dropped() {
        let mut store = MemoryStore::default();
        let mut values = Map::new();
        values.insert(
            HISTORY_KEY.into(),
            Value::from(r#"[{"type":"decode","text":""},{"type":"encode","text":"k"}]"#),
        );
        store.set(values).unwrap();
        add_history(&mut store, HistoryKind::Decode, "n").unwrap();
        assert_eq!(texts(&store), ["k", "n"]);
    }

    #[test]
    fn test_clear() {
        let mut store = MemoryStore::default();
        add_history(&mut store, HistoryKind::Encode, "a").unwrap();
        clear_history(&mut store).unwrap();
        assert!(get_history(&store).unwrap().is_empty());
    }

    #[test]
    fn test_dyn_store() {
        let mut store = MemoryStore::default();
        let dyn_store: &mut dyn KeyValueStore = &mut store;
        add_history(dyn_store, HistoryKind::Decode, "via dyn").unwrap();
        assert_eq!(texts(&store), ["via dyn"]);
    }
}
