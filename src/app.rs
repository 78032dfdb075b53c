//! Application state and the "new workout" flow.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, FormError, GeolocationError};
use crate::form::{WorkoutForm, WorkoutInput};
use crate::map::{MapClick, MapHandle, ViewOptions};
use crate::models::{Coords, Workout, WorkoutId, WorkoutKind, WorkoutType};
use crate::storage::{KeyValueStore, ResetOutcome, WorkoutStore};

pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    Idle,
    FormOpen { pending: Coords },
}

/// One line of detail in a list entry, e.g. `⏱ 25 min`.
#[derive(Clone, Debug, PartialEq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub kind: WorkoutType,
    pub title: String,
    pub details: Vec<Detail>,
}

impl From<&Workout> for ListEntry {
    fn from(workout: &Workout) -> Self {
        let kind = workout.workout_type();
        let mut details = vec![
            Detail { icon: kind.icon(), value: workout.distance.to_string(), unit: "km" },
            Detail { icon: "⏱", value: workout.duration.to_string(), unit: "min" },
        ];
        match workout.kind {
            WorkoutKind::Running { cadence, pace } => {
                details.push(Detail { icon: "⚡️", value: format!("{pace:.1}"), unit: "min/km" });
                details.push(Detail { icon: "🦶🏼", value: cadence.to_string(), unit: "spm" });
            }
            WorkoutKind::Cycling { elevation_gain, speed } => {
                details.push(Detail { icon: "⚡️", value: format!("{speed:.1}"), unit: "km/h" });
                details.push(Detail { icon: "⛰", value: elevation_gain.to_string(), unit: "m" });
            }
        }
        ListEntry {
            id: workout.id.clone(),
            kind,
            title: workout.description.clone(),
            details,
        }
    }
}

pub fn popup_content(workout: &Workout) -> String {
    format!("{} {}", workout.workout_type().icon(), workout.description)
}

pub struct AppState<S> {
    workouts: Vec<Workout>,
    mode: Mode,
    pub form: WorkoutForm,
    map: Option<MapHandle>,
    store: WorkoutStore<S>,
    alerts: VecDeque<String>,
    zoom: u8,
    last_id_millis: i64,
    clicks_tx: Sender<MapClick>,
    clicks_rx: Receiver<MapClick>,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(store: WorkoutStore<S>, zoom: u8) -> Self {
        let (clicks_tx, clicks_rx) = channel();
        AppState {
            workouts: Vec::new(),
            mode: Mode::Idle,
            form: WorkoutForm::default(),
            map: None,
            store,
            alerts: VecDeque::new(),
            zoom,
            last_id_millis: 0,
            clicks_tx,
            clicks_rx,
        }
    }

    /// Restore persisted workouts. Markers wait until the map exists.
    pub fn startup(&mut self) {
        self.workouts = self.store.load();
        info!(count = self.workouts.len(), "startup");
        if self.map.is_some() {
            self.render_all_markers();
        }
    }

    pub fn on_position(&mut self, position: Result<Coords, GeolocationError>) {
        match position {
            Ok(center) => {
                if self.map.is_some() {
                    debug!("map already initialised, ignoring position");
                    return;
                }
                let mut map = MapHandle::init(center, self.zoom);
                let tx = self.clicks_tx.clone();
                map.on_click(move |click| {
                    let _ = tx.send(click);
                });
                self.map = Some(map);
                self.render_all_markers();
                info!(%center, markers = self.workouts.len(), "map ready");
            }
            Err(e) => {
                warn!("geolocation failed: {}", e);
                self.alert(e.to_string());
            }
        }
    }

    /// Handle clicks the map queued since the last call.
    pub fn pump_map_clicks(&mut self) {
        while let Ok(click) = self.clicks_rx.try_recv() {
            self.on_map_click(click.latlng);
        }
    }

    pub fn on_map_click(&mut self, coords: Coords) {
        debug!(%coords, "form opened");
        self.mode = Mode::FormOpen { pending: coords };
    }

    pub fn toggle_kind(&mut self) {
        self.form.toggle_kind();
    }

    /// Validate the form and, when it passes, record a new workout at the
    /// pending location. Nothing changes when validation fails.
    pub fn submit(&mut self, now: DateTime<Local>) -> AppResult<WorkoutId> {
        let Mode::FormOpen { pending } = self.mode else {
            let err = FormError::NoLocation(self.form.kind);
            self.alert(err.to_string());
            return Err(err.into());
        };

        let input = match self.form.validate() {
            Ok(input) => input,
            Err(e) => {
                info!("rejected workout: {}", e);
                self.alert(e.to_string());
                return Err(e.into());
            }
        };

        let id = self.next_id(now);
        let workout = match input {
            WorkoutInput::Running { distance, duration, cadence } => {
                Workout::running(id.clone(), now, pending, distance, duration, cadence)
            }
            WorkoutInput::Cycling { distance, duration, elevation_gain } => {
                Workout::cycling(id.clone(), now, pending, distance, duration, elevation_gain)
            }
        };
        info!(id = %workout.id, description = %workout.description, "workout added");

        self.render_marker(&workout);
        self.workouts.push(workout);
        self.form.clear();
        self.mode = Mode::Idle;
        self.persist();
        Ok(id)
    }

    /// Pan the map to a workout from the list.
    pub fn focus_workout(&mut self, id: &WorkoutId) -> AppResult<()> {
        let coords = self
            .workouts
            .iter()
            .find(|w| &w.id == id)
            .map(|w| w.coords)
            .ok_or_else(|| AppError::UnknownWorkout(id.to_string()))?;
        let map = self.map.as_mut().ok_or(AppError::MapNotReady)?;
        map.set_view(coords, self.zoom, ViewOptions { animate: true, pan_duration: 1.0 });
        Ok(())
    }

    /// Wipe stored and in-memory workouts. The caller rebuilds the app.
    pub fn reset(&mut self) -> AppResult<ResetOutcome> {
        let outcome = self.store.clear()?;
        self.workouts.clear();
        self.map = None;
        self.mode = Mode::Idle;
        self.form = WorkoutForm::default();
        Ok(outcome)
    }

    /// Newest first.
    pub fn list_entries(&self) -> Vec<ListEntry> {
        self.workouts.iter().rev().map(ListEntry::from).collect()
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn map(&self) -> Option<&MapHandle> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut MapHandle> {
        self.map.as_mut()
    }

    pub fn store(&self) -> &WorkoutStore<S> {
        &self.store
    }

    pub fn take_alert(&mut self) -> Option<String> {
        self.alerts.pop_front()
    }

    pub fn peek_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    fn alert(&mut self, message: String) {
        self.alerts.push_back(message);
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.workouts) {
            error!("could not save workouts: {}", e);
            self.alert(format!("Could not save workouts: {e}"));
        }
    }

    fn render_marker(&mut self, workout: &Workout) {
        if let Some(map) = self.map.as_mut() {
            map.add_marker(workout.coords, popup_content(workout), workout.workout_type().popup_class());
        }
    }

    fn render_all_markers(&mut self) {
        if let Some(map) = self.map.as_mut() {
            for workout in &self.workouts {
                map.add_marker(workout.coords, popup_content(workout), workout.workout_type().popup_class());
            }
        }
    }

    fn next_id(&mut self, now: DateTime<Local>) -> WorkoutId {
        let mut millis = now.timestamp_millis().max(self.last_id_millis + 1);
        while self.workouts.iter().any(|w| w.id == WorkoutId::from_millis(millis)) {
            millis += 1;
        }
        self.last_id_millis = millis;
        WorkoutId::from_millis(millis)
    }
}
