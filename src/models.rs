//models.rs
use std::fmt;

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// A latitude/longitude pair. Stored as `[lat, lng]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coords { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Coords { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    /// Last ten digits of a millisecond timestamp.
    pub fn from_millis(millis: i64) -> Self {
        let digits = millis.to_string();
        let start = digits.len().saturating_sub(10);
        WorkoutId(digits[start..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    #[default]
    Running,
    Cycling,
}

impl WorkoutType {
    pub fn label(self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            WorkoutType::Running => "🏃",
            WorkoutType::Cycling => "🚴",
        }
    }

    pub fn popup_class(self) -> String {
        format!("{}-popup", self)
    }

    pub fn toggled(self) -> Self {
        match self {
            WorkoutType::Running => WorkoutType::Cycling,
            WorkoutType::Cycling => WorkoutType::Running,
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutType::Running => f.write_str("running"),
            WorkoutType::Cycling => f.write_str("cycling"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutKind {
    Running {
        /// steps/min
        cadence: f64,
        /// min/km
        pace: f64,
    },
    Cycling {
        /// meters, may be zero or negative
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
        /// km/h
        speed: f64,
    },
}

/// One logged session. Only `clicks` changes after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub date: DateTime<Local>,
    pub coords: Coords,
    /// km
    pub distance: f64,
    /// min
    pub duration: f64,
    pub description: String,
    #[serde(default)]
    pub clicks: u32,
    #[serde(flatten)]
    pub kind: WorkoutKind,
}

impl Workout {
    /// Inputs must already be validated, see [`crate::form::WorkoutForm::validate`].
    pub fn running(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: f64,
    ) -> Self {
        let mut workout = Workout {
            id,
            date,
            coords,
            distance,
            duration,
            description: String::new(),
            clicks: 0,
            kind: WorkoutKind::Running { cadence, pace: 0.0 },
        };
        workout.rederive();
        workout
    }

    pub fn cycling(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Self {
        let mut workout = Workout {
            id,
            date,
            coords,
            distance,
            duration,
            description: String::new(),
            clicks: 0,
            kind: WorkoutKind::Cycling { elevation_gain, speed: 0.0 },
        };
        workout.rederive();
        workout
    }

    pub fn workout_type(&self) -> WorkoutType {
        match self.kind {
            WorkoutKind::Running { .. } => WorkoutType::Running,
            WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
        }
    }

    /// Recompute pace/speed and the description from the base fields.
    pub fn rederive(&mut self) {
        let (distance, duration) = (self.distance, self.duration);
        match &mut self.kind {
            WorkoutKind::Running { pace, .. } => *pace = calc_pace(distance, duration),
            WorkoutKind::Cycling { speed, .. } => *speed = calc_speed(distance, duration),
        }
        self.description = describe(self.workout_type(), &self.date);
    }

    pub fn pace(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Running { pace, .. } => Some(pace),
            WorkoutKind::Cycling { .. } => None,
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Cycling { speed, .. } => Some(speed),
            WorkoutKind::Running { .. } => None,
        }
    }

    pub fn click(&mut self) {
        self.clicks += 1;
    }

    pub fn has_valid_base(&self) -> bool {
        self.distance.is_finite()
            && self.duration.is_finite()
            && self.distance > 0.0
            && self.duration > 0.0
            && self.coords.lat.is_finite()
            && self.coords.lng.is_finite()
    }
}

pub fn calc_pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

pub fn calc_speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// "{Type} on {Month} {day}", e.g. "Running on March 14".
pub fn describe(kind: WorkoutType, date: &impl Datelike) -> String {
    format!("{} on {} {}", kind.label(), MONTHS[date.month0() as usize], date.day())
}
