//! Error types shared by the controller, the store and the collaborators.

use thiserror::Error;

use crate::models::WorkoutType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Inputs have to be positive numbers ({field} is not a number)")]
    NotFinite { field: &'static str },

    #[error("Inputs have to be positive numbers ({field} must be greater than zero)")]
    NotPositive { field: &'static str },

    #[error("Click on the map to choose where the {0} workout took place")]
    NoLocation(WorkoutType),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("Could not get your position")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    InvalidInput(#[from] FormError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Map is not ready yet")]
    MapNotReady,

    #[error("No workout with id {0}")]
    UnknownWorkout(String),
}

pub type AppResult<T> = Result<T, AppError>;
