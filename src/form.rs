use crate::error::FormError;
use crate::models::WorkoutType;

/// Raw text of the workout form, as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutForm {
    pub kind: WorkoutType,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Validated numbers ready to become a workout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WorkoutInput {
    Running { distance: f64, duration: f64, cadence: f64 },
    Cycling { distance: f64, duration: f64, elevation_gain: f64 },
}

impl WorkoutForm {
    /// Swap between the cadence and the elevation field.
    pub fn toggle_kind(&mut self) {
        self.kind = self.kind.toggled();
    }

    pub fn shows_cadence(&self) -> bool {
        self.kind == WorkoutType::Running
    }

    pub fn validate(&self) -> Result<WorkoutInput, FormError> {
        let distance = finite("distance", &self.distance)?;
        let duration = finite("duration", &self.duration)?;

        match self.kind {
            WorkoutType::Running => {
                let cadence = finite("cadence", &self.cadence)?;
                positive("distance", distance)?;
                positive("duration", duration)?;
                positive("cadence", cadence)?;
                Ok(WorkoutInput::Running { distance, duration, cadence })
            }
            WorkoutType::Cycling => {
                // elevation gain only has to be a number
                let elevation_gain = finite("elevation", &self.elevation)?;
                positive("distance", distance)?;
                positive("duration", duration)?;
                Ok(WorkoutInput::Cycling { distance, duration, elevation_gain })
            }
        }
    }

    /// Empty the numeric fields, keep the selected type.
    pub fn clear(&mut self) {
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }
}

/// Browser-style numeric coercion: blank is zero, garbage is NaN.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn finite(field: &'static str, text: &str) -> Result<f64, FormError> {
    let value = parse_number(text);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), FormError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(FormError::NotPositive { field })
    }
}
