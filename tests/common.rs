#![allow(dead_code)]
use std::cell::Cell;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{DateTime, Local, TimeZone};
use mapty::error::StoreError;
use mapty::{AppState, KeyValueStore, MemoryStore, WorkoutStore};

/// Memory store that counts writes.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub writes: Rc<Cell<usize>>,
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writes.set(self.writes.get() + 1);
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

/// Reads nothing, refuses every write.
#[derive(Clone, Default)]
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.set(key, "")
    }
}

pub fn counting_app() -> (AppState<CountingStore>, Rc<Cell<usize>>) {
    let store = CountingStore::default();
    let writes = Rc::clone(&store.writes);
    (AppState::new(WorkoutStore::new(store), 13), writes)
}

/// A fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("mapty_{}_{}", name, std::process::id()));
    fs::remove_dir_all(&path).ok();
    path
}

pub fn fixed_date() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 14, 10, 30, 0).unwrap()
}
