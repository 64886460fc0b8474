//! Last-known-good snapshot of the set collection.
//!
//! The cache is a fallback only. It is rewritten whenever the mirror changes
//! and read back when the backend cannot be reached.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};

use crate::core::{
    errors::Result,
    UserId,
    VocabSet,
};

/// Slot holding the serialized collection.
pub const SNAPSHOT_KEY: &str = "vocab_sets";

pub trait LocalCache: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// What the snapshot slot holds: the collection and the scope it was
/// fetched for.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    user: Option<UserId>,
    sets: Vec<VocabSet>,
}

pub fn store_snapshot(cache: &dyn LocalCache, scope: Option<&UserId>, sets: &[VocabSet]) -> Result<()> {
    let snapshot = Snapshot { user: scope.cloned(), sets: sets.to_vec() };
    let json = serde_json::to_string(&snapshot)?;
    cache.write(SNAPSHOT_KEY, &json)
}

/// The cached collection for `scope`. Snapshots taken for another user, and
/// unreadable or corrupt ones, count as absent.
pub fn load_snapshot(cache: &dyn LocalCache, scope: Option<&UserId>) -> Option<Vec<VocabSet>> {
    let raw = match cache.read(SNAPSHOT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read cached snapshot: {}", e);
            return None;
        }
    };

    let snapshot = match serde_json::from_str::<Snapshot>(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Discarding corrupt cached snapshot: {}", e);
            return None;
        }
    };

    if snapshot.user.as_ref() != scope {
        debug!(cached = ?snapshot.user, active = ?scope, "cached snapshot belongs to another scope");
        return None;
    }
    Some(snapshot.sets)
}

/// One JSON file per key inside `dir`.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalCache for FileCache {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves half a snapshot behind.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "cache slot written");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
