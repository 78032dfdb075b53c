//! Key-value persistence of the workout list.
//!
//! The whole list lives under a single key as a JSON array and is rewritten on
//! every change. Reading never fails: anything absent or unreadable is treated
//! as "no workouts yet".

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::Workout;

pub const WORKOUTS_KEY: &str = "workouts";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { key: key.to_string(), source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io { key: key.to_string(), source };
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { key: key.to_string(), source }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// The store the app runs on: on disk when possible, otherwise in memory.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    File(FileStore),
    Memory(MemoryStore),
}

impl StoreBackend {
    /// Falls back to memory when `dir` cannot be created.
    pub fn open_or_memory(dir: impl Into<PathBuf>) -> Self {
        match FileStore::open(dir) {
            Ok(store) => {
                info!(dir = %store.dir().display(), "using file store");
                StoreBackend::File(store)
            }
            Err(e) => {
                warn!("{e}; workouts will not survive a restart");
                StoreBackend::Memory(MemoryStore::new())
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, StoreBackend::File(_))
    }
}

impl KeyValueStore for StoreBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            StoreBackend::File(s) => s.get(key),
            StoreBackend::Memory(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::File(s) => s.set(key, value),
            StoreBackend::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::File(s) => s.remove(key),
            StoreBackend::Memory(s) => s.remove(key),
        }
    }
}

/// What the caller has to do after the stored list was wiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    ReloadRequired,
}

#[derive(Debug, Clone)]
pub struct WorkoutStore<S> {
    backend: S,
}

impl<S: KeyValueStore> WorkoutStore<S> {
    pub fn new(backend: S) -> Self {
        WorkoutStore { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Overwrite the stored list with `workouts`.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), StoreError> {
        let json = serde_json::to_string(workouts)?;
        self.backend.set(WORKOUTS_KEY, &json)?;
        debug!(count = workouts.len(), "saved workouts");
        Ok(())
    }

    /// Read the stored list. Records that do not look like a workout are skipped.
    pub fn load(&self) -> Vec<Workout> {
        let raw = match self.backend.get(WORKOUTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("could not read stored workouts: {e}");
                return Vec::new();
            }
        };

        let records: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(Value::Null) => return Vec::new(),
            Ok(other) => {
                warn!("stored workouts are not a list (found {}), ignoring", kind_of(&other));
                return Vec::new();
            }
            Err(e) => {
                warn!("stored workouts are not valid JSON, ignoring: {e}");
                return Vec::new();
            }
        };

        let total = records.len();
        let workouts: Vec<Workout> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<Workout>(record) {
                Ok(mut workout) if workout.has_valid_base() => {
                    workout.rederive();
                    Some(workout)
                }
                Ok(workout) => {
                    warn!(index, id = %workout.id, "skipping stored workout with invalid distance/duration");
                    None
                }
                Err(e) => {
                    warn!(index, "skipping unreadable stored workout: {e}");
                    None
                }
            })
            .collect();

        info!(loaded = workouts.len(), stored = total, "restored workouts");
        workouts
    }

    pub fn clear(&mut self) -> Result<ResetOutcome, StoreError> {
        self.backend.remove(WORKOUTS_KEY)?;
        info!("cleared stored workouts");
        Ok(ResetOutcome::ReloadRequired)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
