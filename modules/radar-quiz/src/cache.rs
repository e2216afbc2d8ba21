// Durable local cache for in-progress attempts.
//
// Values are JSON blobs keyed `quiz-progress-{quiz_id}-{admission_number}`.
// `FileCache` keeps one file per key; `MemoryCache` is for tests and for
// clients with no writable disk.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use radar_common::Answers;

use crate::machine::{AttemptState, Phase, SavedFrom, SavedProgress};

pub fn cache_key(quiz_id: Uuid, admission_number: &str) -> String {
    format!("quiz-progress-{quiz_id}-{admission_number}")
}

/// Synchronous key/value storage that survives restarts.
pub trait LocalCache: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// The cached JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedProgress {
    pub student_name: String,
    pub admission_number: String,
    pub answers: Answers,
    #[serde(default)]
    pub locked: BTreeMap<Uuid, bool>,
    pub current: usize,
    pub started: bool,
    pub last_saved: DateTime<Utc>,
}

impl CachedProgress {
    pub fn from_state(state: &AttemptState, now: DateTime<Utc>) -> Self {
        Self {
            student_name: state.student_name.clone(),
            admission_number: state.admission_number.clone(),
            answers: state.answers.clone(),
            locked: state.locked.iter().map(|id| (*id, true)).collect(),
            current: state.current,
            started: state.phase == Phase::InProgress,
            last_saved: now,
        }
    }

    /// Lock flags are not carried over; they are rebuilt from the answers on resume.
    pub fn into_saved(self) -> SavedProgress {
        SavedProgress {
            student_name: self.student_name,
            answers: self.answers,
            current: self.current,
            last_saved: Some(self.last_saved),
            origin: SavedFrom::Local,
        }
    }
}

// ---------------------------------------------------------------------------
// FileCache
// ---------------------------------------------------------------------------

pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Hex keeps distinct keys in distinct files whatever the admission number holds.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }
}

impl LocalCache for FileCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("writing {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, like storage that is full or disabled.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("MemoryCache: storage unavailable");
        }
        Ok(())
    }
}

impl LocalCache for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.get(key))
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pattern() {
        let quiz_id = Uuid::from_u128(7);
        assert_eq!(
            cache_key(quiz_id, "A-17"),
            format!("quiz-progress-{quiz_id}-A-17")
        );
    }

    #[test]
    fn cached_shape_uses_camel_case_fields() {
        let mut state = AttemptState::new(Uuid::from_u128(1), "A-17");
        state.student_name = "Ada".into();
        state.phase = Phase::InProgress;
        state.answers.insert(Uuid::from_u128(5), 2);
        state.locked.insert(Uuid::from_u128(5));

        let value = serde_json::to_value(CachedProgress::from_state(&state, Utc::now())).unwrap();

        for field in [
            "studentName",
            "admissionNumber",
            "answers",
            "locked",
            "current",
            "started",
            "lastSaved",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["started"], true);
        assert_eq!(value["locked"][Uuid::from_u128(5).to_string()], true);
    }

    #[test]
    fn file_cache_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("progress"));

        assert_eq!(cache.load("k").unwrap(), None);
        cache.store("k", "{\"a\":1}").unwrap();
        assert_eq!(cache.load("k").unwrap().as_deref(), Some("{\"a\":1}"));

        cache.remove("k").unwrap();
        cache.remove("k").unwrap();
        assert_eq!(cache.load("k").unwrap(), None);
    }

    #[test]
    fn file_cache_keeps_odd_keys_inside_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        cache.store("quiz-progress-x-../../etc", "{}").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].contains('/') && !names[0].contains(".."));
        assert_eq!(cache.load("quiz-progress-x-../../etc").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn file_cache_keeps_similar_admission_numbers_apart() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let quiz_id = Uuid::from_u128(7);

        cache.store(&cache_key(quiz_id, "2024/117"), "alice").unwrap();

        assert_eq!(cache.load(&cache_key(quiz_id, "2024_117")).unwrap(), None);
        assert_eq!(cache.load(&cache_key(quiz_id, "2024.117")).unwrap(), None);
        cache.store(&cache_key(quiz_id, "2024_117"), "bob").unwrap();
        assert_eq!(
            cache.load(&cache_key(quiz_id, "2024/117")).unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn unavailable_memory_cache_errors() {
        let cache = MemoryCache::new();
        cache.set_unavailable(true);
        assert!(cache.store("k", "v").is_err());
        assert!(cache.load("k").is_err());
    }
}
