//! Persistence of the last-known transaction count.

use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed storage key of the cached count.
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";

/// A single cached scalar, read once at startup and written on change.
///
/// Advisory only: never a source of truth for balance or history.
#[derive(Debug, Default)]
pub struct CountCache {
    value: Mutex<Option<u64>>,
    persistence_path: Option<PathBuf>,
}

impl CountCache {
    /// Create an empty cache. Nothing is written unless a path is given.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            value: Mutex::new(None),
            persistence_path,
        }
    }

    /// Load from file if it exists. An unreadable or corrupt file is logged
    /// and treated as empty; it is overwritten on the next change.
    pub fn load_from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let cache = Self::new(Some(path.to_path_buf()));
        if !path.exists() {
            return cache;
        }

        match read_file(path) {
            Ok(value) => {
                *cache.lock() = value;
                tracing::debug!(path = %path.display(), count = ?value, "Loaded cached transaction count");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable transaction count cache");
            }
        }
        cache
    }

    /// The cached count, if any.
    pub fn get(&self) -> Option<u64> {
        *self.lock()
    }

    /// Store `count`, writing to disk only when it differs from the cached
    /// value. Returns whether it changed.
    pub fn set(&self, count: u64) -> std::io::Result<bool> {
        let mut current = self.lock();
        if *current == Some(count) {
            return Ok(false);
        }

        if let Some(path) = &self.persistence_path {
            let mut map = Map::new();
            map.insert(TRANSACTION_COUNT_KEY.to_string(), Value::from(count));
            // Write aside and rename so a crash never leaves a truncated file.
            let tmp = temp_path(path);
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &map)?;
            writer.flush()?;
            drop(writer);
            fs::rename(&tmp, path)?;
            tracing::debug!(path = %path.display(), count, "Saved transaction count");
        }
        *current = Some(count);
        Ok(true)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<u64>> {
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_file(path: &Path) -> std::io::Result<Option<u64>> {
    let reader = BufReader::new(File::open(path)?);
    let map: Map<String, Value> = serde_json::from_reader(reader)?;
    Ok(map.get(TRANSACTION_COUNT_KEY).and_then(read_count))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Numbers or numeric strings.
fn read_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory() {
        let cache = CountCache::new(None);
        assert_eq!(cache.get(), None);
        assert!(cache.set(3).unwrap());
        assert!(!cache.set(3).unwrap());
        assert_eq!(cache.get(), Some(3));
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let cache = CountCache::load_from_file(&path);
        assert_eq!(cache.get(), None);
        cache.set(12).unwrap();

        let loaded = CountCache::load_from_file(&path);
        assert_eq!(loaded.get(), Some(12));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"transactionCount":12}"#);
    }

    #[test]
    fn test_string_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"transactionCount":"7"}"#).unwrap();
        assert_eq!(CountCache::load_from_file(&path).get(), Some(7));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"transactionCount":1"#).unwrap();

        let cache = CountCache::load_from_file(&path);
        assert_eq!(cache.get(), None);

        // The next change replaces the damaged file.
        assert!(cache.set(5).unwrap());
        assert_eq!(CountCache::load_from_file(&path).get(), Some(5));
        assert!(!dir.path().join("session.json.tmp").exists());
    }
}
