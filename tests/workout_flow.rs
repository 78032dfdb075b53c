mod common;

use common::{counting_app, fixed_date, BrokenStore};
use mapty::error::{FormError, GeolocationError};
use mapty::storage::ResetOutcome;
use mapty::{AppError, AppState, Coords, MemoryStore, Mode, WorkoutStore, WorkoutType};

#[test]
fn running_submit_appends_renders_and_persists() {
    let (mut app, writes) = counting_app();
    app.startup();
    app.on_position(Ok(Coords::new(15.0, -10.0)));
    assert!(app.workouts().is_empty());

    app.on_map_click(Coords::new(15.0, -10.0));
    app.form.distance = "100".into();
    app.form.duration = "5".into();
    app.form.cadence = "120".into();
    let id = app.submit(fixed_date()).unwrap();

    let workouts = app.workouts();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].id, id);
    assert_eq!(workouts[0].workout_type(), WorkoutType::Running);
    assert_eq!(workouts[0].coords, Coords::new(15.0, -10.0));
    assert_eq!(workouts[0].pace(), Some(0.05));
    assert_eq!(workouts[0].description, "Running on March 14");

    assert_eq!(writes.get(), 1);
    assert_eq!(app.store().load(), app.workouts());

    let map = app.map().unwrap();
    assert_eq!(map.markers().len(), 1);
    assert_eq!(map.markers()[0].popup_content, "🏃 Running on March 14");
    assert_eq!(map.markers()[0].popup_class, "running-popup");

    assert_eq!(app.mode(), Mode::Idle);
    assert!(app.form.distance.is_empty());
    assert!(app.form.cadence.is_empty());
    assert!(app.take_alert().is_none());
}

#[test]
fn invalid_input_changes_nothing() {
    let (mut app, writes) = counting_app();
    app.on_position(Ok(Coords::new(0.0, 0.0)));
    app.on_map_click(Coords::new(1.0, 2.0));
    app.form.distance = "-5".into();
    app.form.duration = "10".into();
    app.form.cadence = "80".into();

    let err = app.submit(fixed_date()).unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(FormError::NotPositive { field: "distance" })));
    assert!(app.workouts().is_empty());
    assert_eq!(writes.get(), 0);
    assert!(app.map().unwrap().markers().is_empty());

    // form stays open with its values
    assert_eq!(app.mode(), Mode::FormOpen { pending: Coords::new(1.0, 2.0) });
    assert_eq!(app.form.distance, "-5");
    assert!(app.take_alert().unwrap().contains("positive"));
}

#[test]
fn cycling_accepts_negative_elevation() {
    let (mut app, writes) = counting_app();
    app.on_map_click(Coords::new(45.0, 15.0));
    app.toggle_kind();
    app.form.distance = "30".into();
    app.form.duration = "90".into();
    app.form.elevation = "-120".into();
    app.submit(fixed_date()).unwrap();

    assert_eq!(app.workouts()[0].speed(), Some(20.0));
    assert_eq!(writes.get(), 1);
    // type selection survives the reset of the fields
    assert_eq!(app.form.kind, WorkoutType::Cycling);
    assert!(app.form.elevation.is_empty());
}

#[test]
fn map_clicks_open_the_form_through_the_handler() {
    let (mut app, _) = counting_app();
    app.on_position(Ok(Coords::new(45.0, 15.0)));
    app.map_mut().unwrap().click(Coords::new(45.01, 15.02));
    assert_eq!(app.mode(), Mode::Idle);
    app.pump_map_clicks();
    assert_eq!(app.mode(), Mode::FormOpen { pending: Coords::new(45.01, 15.02) });
}

#[test]
fn restored_workouts_get_markers_once_the_map_is_ready() {
    let mut backend = WorkoutStore::new(MemoryStore::new());
    {
        let mut first = AppState::new(WorkoutStore::new(MemoryStore::new()), 13);
        for (i, coords) in [Coords::new(1.0, 1.0), Coords::new(2.0, 2.0)].into_iter().enumerate() {
            first.on_map_click(coords);
            first.form.distance = format!("{}", i + 3);
            first.form.duration = "20".into();
            first.form.cadence = "170".into();
            first.submit(fixed_date()).unwrap();
        }
        backend.save(first.workouts()).unwrap();
    }

    let mut app = AppState::new(backend, 13);
    app.startup();
    assert_eq!(app.workouts().len(), 2);
    assert_eq!(app.list_entries().len(), 2);
    assert!(app.map().is_none());

    app.on_position(Ok(Coords::new(1.5, 1.5)));
    let markers = app.map().unwrap().markers();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[1].coords, Coords::new(2.0, 2.0));
}

#[test]
fn list_entries_are_newest_first() {
    let (mut app, _) = counting_app();
    for distance in ["3", "7"] {
        app.on_map_click(Coords::new(0.0, 0.0));
        app.form.distance = distance.into();
        app.form.duration = "30".into();
        app.form.cadence = "160".into();
        app.submit(fixed_date()).unwrap();
    }
    let entries = app.list_entries();
    assert_eq!(entries[0].details[0].value, "7");
    assert_eq!(entries[1].details[0].value, "3");
    assert_ne!(entries[0].id, entries[1].id);
}

#[test]
fn geolocation_failure_alerts_and_keeps_the_list() {
    let (mut app, _) = counting_app();
    app.startup();
    app.on_position(Err(GeolocationError::Unavailable));
    assert!(app.map().is_none());
    assert_eq!(app.take_alert().as_deref(), Some("Could not get your position"));
}

#[test]
fn focus_pans_to_the_workout() {
    let (mut app, _) = counting_app();
    app.on_map_click(Coords::new(10.0, 20.0));
    app.form.distance = "5".into();
    app.form.duration = "25".into();
    app.form.cadence = "165".into();
    let id = app.submit(fixed_date()).unwrap();

    assert!(matches!(app.focus_workout(&id), Err(AppError::MapNotReady)));

    app.on_position(Ok(Coords::new(0.0, 0.0)));
    app.focus_workout(&id).unwrap();
    let map = app.map_mut().unwrap();
    assert!(map.is_animating());
    map.advance(0.0);
    map.advance(2.0);
    assert_eq!(map.center(), Coords::new(10.0, 20.0));

    let unknown = mapty::WorkoutId::from_millis(1);
    assert!(matches!(app.focus_workout(&unknown), Err(AppError::UnknownWorkout(_))));
}

#[test]
fn reset_wipes_everything() {
    let (mut app, _) = counting_app();
    app.on_position(Ok(Coords::new(0.0, 0.0)));
    app.on_map_click(Coords::new(0.0, 0.0));
    app.form.distance = "5".into();
    app.form.duration = "25".into();
    app.form.cadence = "165".into();
    app.submit(fixed_date()).unwrap();

    assert_eq!(app.reset().unwrap(), ResetOutcome::ReloadRequired);
    assert!(app.workouts().is_empty());
    assert!(app.map().is_none());
    assert!(app.store().load().is_empty());
}

#[test]
fn failed_save_keeps_workout_and_alerts() {
    let mut app = AppState::new(WorkoutStore::new(BrokenStore), 13);
    app.on_map_click(Coords::new(0.0, 0.0));
    app.form.distance = "5".into();
    app.form.duration = "25".into();
    app.form.cadence = "165".into();
    assert!(app.submit(fixed_date()).is_ok());
    assert_eq!(app.workouts().len(), 1);
    assert!(app.take_alert().unwrap().starts_with("Could not save workouts"));
    assert!(app.reset().is_err());
}
