//! mapty: log runs and rides by clicking on a map.

pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod geolocation;
pub mod logging;
pub mod map;
pub mod models;
pub mod storage;
pub mod ui;

pub use app::{AppState, ListEntry, Mode};
pub use error::{AppError, AppResult};
pub use models::{Coords, Workout, WorkoutId, WorkoutKind, WorkoutType};
pub use storage::{FileStore, KeyValueStore, MemoryStore, WorkoutStore};
