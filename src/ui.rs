use std::time::Duration;

use chrono::Local;
use eframe::egui::{self, Align, Align2, Layout, RichText, ScrollArea, TextEdit, Ui};
use eframe::{App, CreationContext, Frame};
use egui_extras::{Column, TableBuilder};
use tracing::{debug, error, info};

use crate::app::{AppState, ListEntry, Mode};
use crate::config::Config;
use crate::geolocation::{request_position, FixedLocation, IpGeolocator, PositionRequest};
use crate::map::popup_accent;
use crate::models::{WorkoutId, WorkoutType};
use crate::storage::{ResetOutcome, StoreBackend, WorkoutStore};

pub struct MaptyApp {
    config: Config,
    state: AppState<StoreBackend>,
    position: Option<PositionRequest>,
    persistent: bool,
    form_was_open: bool,
    focus_distance: bool,
}

impl MaptyApp {
    pub fn new(cc: &CreationContext, config: Config) -> Self {
        apply_style(&cc.egui_ctx);
        Self::boot(config)
    }

    /// Fresh state: restore the list, then ask where we are.
    fn boot(config: Config) -> Self {
        let backend = StoreBackend::open_or_memory(config.data_dir.clone());
        let persistent = backend.is_persistent();
        let mut state = AppState::new(WorkoutStore::new(backend), config.map_zoom);
        state.startup();

        let position = match config.fixed_location {
            Some(coords) => request_position(FixedLocation(coords)),
            None => request_position(IpGeolocator::new(config.geolocation_url.clone())),
        };

        MaptyApp {
            config,
            state,
            position: Some(position),
            persistent,
            form_was_open: false,
            focus_distance: false,
        }
    }

    fn reload(&mut self) {
        match self.state.reset() {
            Ok(ResetOutcome::ReloadRequired) => {
                info!("workouts cleared, reloading");
                *self = Self::boot(self.config.clone());
            }
            Err(e) => error!("reset failed: {}", e),
        }
    }

    fn poll_position(&mut self, ctx: &egui::Context) {
        if let Some(request) = self.position.as_mut() {
            match request.try_result() {
                Some(result) => {
                    self.state.on_position(result);
                    self.position = None;
                }
                None => ctx.request_repaint_after(Duration::from_millis(100)),
            }
        }
    }

    fn show_form(&mut self, ui: &mut Ui) {
        let Mode::FormOpen { pending } = self.state.mode() else {
            return;
        };

        ui.label(RichText::new(format!("New workout at {pending}")).strong());
        ui.add_space(6.0);

        egui::Grid::new("workout_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Type");
                let mut kind = self.state.form.kind;
                egui::ComboBox::from_id_salt("workout_type")
                    .selected_text(kind.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut kind, WorkoutType::Running, "Running");
                        ui.selectable_value(&mut kind, WorkoutType::Cycling, "Cycling");
                    });
                if kind != self.state.form.kind {
                    self.state.toggle_kind();
                }
                ui.end_row();

                ui.label("Distance");
                let distance = ui.add(TextEdit::singleline(&mut self.state.form.distance).hint_text("km"));
                if self.focus_distance {
                    distance.request_focus();
                    self.focus_distance = false;
                }
                ui.end_row();

                ui.label("Duration");
                ui.add(TextEdit::singleline(&mut self.state.form.duration).hint_text("min"));
                ui.end_row();

                if self.state.form.shows_cadence() {
                    ui.label("Cadence");
                    ui.add(TextEdit::singleline(&mut self.state.form.cadence).hint_text("step/min"));
                } else {
                    ui.label("Elev Gain");
                    ui.add(TextEdit::singleline(&mut self.state.form.elevation).hint_text("meters"));
                }
                ui.end_row();
            });

        ui.add_space(6.0);
        let enter = ui.is_enabled() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("OK").clicked() || enter {
            if let Err(e) = self.state.submit(Local::now()) {
                debug!("submit rejected: {}", e);
            }
        }
    }

    fn show_workouts(&mut self, ui: &mut Ui) {
        let entries = self.state.list_entries();
        if entries.is_empty() {
            ui.label(RichText::new("No workouts yet. Click on the map to add one.").italics());
            return;
        }

        let mut focus: Option<WorkoutId> = None;
        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .column(Column::initial(170.0).at_least(120.0))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(24.0, |mut header| {
                for title in ["Workout", "Distance", "Duration", "Pace / Speed", "Cadence / Elev."] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(28.0, entries.len(), |mut row| {
                    let entry: &ListEntry = &entries[row.index()];
                    row.col(|ui| {
                        let accent = popup_accent(&entry.kind.popup_class());
                        if ui.link(RichText::new(&entry.title).color(accent)).clicked() {
                            focus = Some(entry.id.clone());
                        }
                    });
                    for detail in &entry.details {
                        row.col(|ui| {
                            ui.label(format!("{} {} {}", detail.icon, detail.value, detail.unit));
                        });
                    }
                });
            });

        if let Some(id) = focus {
            if let Err(e) = self.state.focus_workout(&id) {
                debug!("cannot focus workout {}: {}", id, e);
            }
        }
    }

    fn show_map(&mut self, ui: &mut Ui) {
        match self.state.map_mut() {
            Some(map) => {
                map.show(ui);
            }
            None if self.position.is_some() => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("Locating you…").size(24.0));
                });
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("Map unavailable without your position.").size(24.0));
                });
            }
        }
        self.state.pump_map_clicks();
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.peek_alert().map(str::to_owned) else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Alert")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    dismissed = true;
                }
            });
        if dismissed {
            self.state.take_alert();
        }
    }
}

impl App for MaptyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_position(ctx);

        if ctx.input(|i| i.modifiers.ctrl && i.modifiers.shift && i.key_pressed(egui::Key::R)) {
            self.reload();
        }

        let form_open = matches!(self.state.mode(), Mode::FormOpen { .. });
        if form_open && !self.form_was_open {
            self.focus_distance = true;
        }
        self.form_was_open = form_open;

        let blocked = self.state.peek_alert().is_some();

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} workouts", self.state.workouts().len()));
                ui.separator();
                if self.persistent {
                    ui.label(format!("Saved in {}", self.config.data_dir.display()));
                } else {
                    ui.label(RichText::new("Not saved: storage unavailable").color(egui::Color32::YELLOW));
                }
            });
        });

        egui::SidePanel::left("workouts")
            .default_width(520.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!blocked, |ui| {
                    ui.add_space(10.0);
                    ui.heading(RichText::new("mapty").strong());
                    ui.add_space(10.0);
                    self.show_form(ui);
                    ui.separator();
                    ScrollArea::vertical().show(ui, |ui| {
                        self.show_workouts(ui);
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                self.show_map(ui);
            });
        });

        self.show_alert(ctx);
    }
}

fn apply_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.text_styles.insert(
        egui::TextStyle::Body,
        egui::FontId::new(17.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::new(17.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::new(30.0, egui::FontFamily::Proportional),
    );
    ctx.set_style(style);
}
