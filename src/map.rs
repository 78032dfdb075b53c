//! Minimal slippy-map surface: a Web Mercator view with markers and popups.
//!
//! Tiles and pan/zoom gestures are not drawn here; the view only recentres
//! through [`MapHandle::set_view`].

use std::f64::consts::PI;
use std::fmt;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui};
use tracing::debug;

use crate::models::Coords;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;
const GRID_STEPS: [f64; 14] = [
    30.0, 10.0, 5.0, 1.0, 0.5, 0.1, 0.05, 0.01, 0.005, 0.001, 0.0005, 0.0001, 0.000_05, 0.000_01,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapClick {
    pub latlng: Coords,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub coords: Coords,
    pub popup_content: String,
    pub popup_class: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewOptions {
    pub animate: bool,
    /// seconds
    pub pan_duration: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions { animate: true, pan_duration: 1.0 }
    }
}

#[derive(Clone, Copy, Debug)]
struct PanAnimation {
    from: Coords,
    to: Coords,
    duration: f64,
    started: Option<f64>,
}

pub struct MapHandle {
    center: Coords,
    zoom: u8,
    markers: Vec<Marker>,
    click_handler: Option<Box<dyn FnMut(MapClick)>>,
    animation: Option<PanAnimation>,
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHandle")
            .field("center", &self.center)
            .field("zoom", &self.zoom)
            .field("markers", &self.markers.len())
            .field("animating", &self.animation.is_some())
            .finish()
    }
}

impl MapHandle {
    pub fn init(center: Coords, zoom: u8) -> Self {
        debug!(%center, zoom, "map initialised");
        MapHandle {
            center,
            zoom,
            markers: Vec::new(),
            click_handler: None,
            animation: None,
        }
    }

    pub fn center(&self) -> Coords {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Replaces any previously registered handler.
    pub fn on_click(&mut self, handler: impl FnMut(MapClick) + 'static) {
        self.click_handler = Some(Box::new(handler));
    }

    /// Forward a click at `latlng` to the registered handler.
    pub fn click(&mut self, latlng: Coords) {
        if let Some(handler) = self.click_handler.as_mut() {
            handler(MapClick { latlng });
        }
    }

    /// Popups stay open; adding another marker never closes them.
    pub fn add_marker(&mut self, coords: Coords, popup_content: impl Into<String>, popup_class: impl Into<String>) {
        self.markers.push(Marker {
            coords,
            popup_content: popup_content.into(),
            popup_class: popup_class.into(),
        });
    }

    pub fn set_view(&mut self, coords: Coords, zoom: u8, options: ViewOptions) {
        self.zoom = zoom;
        if options.animate && options.pan_duration > 0.0 {
            self.animation = Some(PanAnimation {
                from: self.center,
                to: coords,
                duration: options.pan_duration,
                started: None,
            });
        } else {
            self.animation = None;
            self.center = coords;
        }
    }

    /// Move an ongoing pan forward to time `now` (seconds). Returns true while
    /// the pan is still running.
    pub fn advance(&mut self, now: f64) -> bool {
        let Some(anim) = self.animation.as_mut() else {
            return false;
        };
        let started = *anim.started.get_or_insert(now);
        let t = ((now - started) / anim.duration).clamp(0.0, 1.0);
        if t >= 1.0 {
            self.center = anim.to;
            self.animation = None;
            return false;
        }
        let eased = t * (2.0 - t);
        self.center = Coords::new(
            anim.from.lat + (anim.to.lat - anim.from.lat) * eased,
            anim.from.lng + (anim.to.lng - anim.from.lng) * eased,
        );
        true
    }

    pub fn show(&mut self, ui: &mut Ui) -> egui::Response {
        let now = ui.input(|i| i.time);
        if self.advance(now) {
            ui.ctx().request_repaint();
        }

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::from_rgb(42, 46, 52));
        self.draw_grid(&painter, rect);

        for marker in &self.markers {
            let pos = self.to_screen(marker.coords, rect);
            if rect.expand(200.0).contains(pos) {
                draw_marker(&painter, pos, marker);
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let latlng = self.from_screen(pos, rect);
                debug!(%latlng, "map clicked");
                self.click(latlng);
            }
        }

        response
    }

    fn to_screen(&self, coords: Coords, rect: Rect) -> Pos2 {
        let (dx, dy) = offset_px(self.center, coords, self.zoom);
        rect.center() + egui::vec2(dx as f32, dy as f32)
    }

    fn from_screen(&self, pos: Pos2, rect: Rect) -> Coords {
        let d = pos - rect.center();
        coords_at_offset(self.center, d.x as f64, d.y as f64, self.zoom)
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let px_per_degree = world_size(self.zoom) / 360.0;
        let Some(step) = GRID_STEPS.iter().copied().rev().find(|s| s * px_per_degree >= 80.0) else {
            return;
        };
        let stroke = Stroke::new(1.0, Color32::from_gray(70));
        let label_color = Color32::from_gray(130);
        let font = FontId::monospace(10.0);

        let top_left = self.from_screen(rect.left_top(), rect);
        let bottom_right = self.from_screen(rect.right_bottom(), rect);

        let mut lng = (top_left.lng / step).floor() * step;
        while lng <= bottom_right.lng {
            let x = self.to_screen(Coords::new(self.center.lat, lng), rect).x;
            painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
            painter.text(egui::pos2(x + 2.0, rect.bottom() - 2.0), Align2::LEFT_BOTTOM, format_degrees(lng, step), font.clone(), label_color);
            lng += step;
        }

        let mut lat = (bottom_right.lat / step).floor() * step;
        while lat <= top_left.lat {
            let y = self.to_screen(Coords::new(lat, self.center.lng), rect).y;
            painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
            painter.text(egui::pos2(rect.left() + 2.0, y - 2.0), Align2::LEFT_BOTTOM, format_degrees(lat, step), font.clone(), label_color);
            lat += step;
        }
    }
}

fn draw_marker(painter: &egui::Painter, pos: Pos2, marker: &Marker) {
    let accent = popup_accent(&marker.popup_class);
    painter.circle(pos, 7.0, accent, Stroke::new(2.0, Color32::WHITE));

    let galley = painter.layout_no_wrap(marker.popup_content.clone(), FontId::proportional(15.0), Color32::from_gray(230));
    let size = galley.size() + egui::vec2(20.0, 12.0);
    let popup = Rect::from_center_size(pos - egui::vec2(0.0, 14.0 + size.y / 2.0), size);
    painter.rect_filled(popup, 5.0, Color32::from_rgb(45, 52, 57));
    painter.rect_filled(Rect::from_min_size(popup.min, egui::vec2(5.0, popup.height())), 0.0, accent);
    painter.galley(popup.min + egui::vec2(12.0, 6.0), galley, Color32::from_gray(230));
}

pub fn popup_accent(popup_class: &str) -> Color32 {
    match popup_class {
        "running-popup" => Color32::from_rgb(0, 196, 106),
        "cycling-popup" => Color32::from_rgb(255, 181, 69),
        _ => Color32::from_rgb(120, 160, 220),
    }
}

fn format_degrees(value: f64, step: f64) -> String {
    let decimals = (-step.log10()).ceil().max(0.0) as usize;
    format!("{value:.decimals$}°")
}

pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * 2f64.powi(zoom as i32)
}

/// Web Mercator world pixel position of `coords` at `zoom`.
pub fn project(coords: Coords, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = coords.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (coords.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

pub fn unproject(x: f64, y: f64, zoom: u8) -> Coords {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    Coords::new(n.sinh().atan().to_degrees(), lng)
}

/// Screen offset of `coords` from a view centred on `center`.
pub fn offset_px(center: Coords, coords: Coords, zoom: u8) -> (f64, f64) {
    let (cx, cy) = project(center, zoom);
    let (x, y) = project(coords, zoom);
    (x - cx, y - cy)
}

pub fn coords_at_offset(center: Coords, dx: f64, dy: f64, zoom: u8) -> Coords {
    let (cx, cy) = project(center, zoom);
    unproject(cx + dx, cy + dy, zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn close(a: Coords, b: Coords) -> bool {
        (a.lat - b.lat).abs() < 1e-9 && (a.lng - b.lng).abs() < 1e-9
    }

    #[test]
    fn origin_is_world_centre() {
        let (x, y) = project(Coords::new(0.0, 0.0), 0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let center = Coords::new(45.0, 15.0);
        let (dx, dy) = offset_px(center, Coords::new(45.01, 15.01), 13);
        assert!(dx > 0.0);
        assert!(dy < 0.0);
    }

    #[test]
    fn screen_offsets_map_back_to_coords() {
        let center = Coords::new(45.81, 15.97);
        let target = Coords::new(45.82, 15.95);
        let (dx, dy) = offset_px(center, target, 15);
        assert!(close(coords_at_offset(center, dx, dy, 15), target));
        assert!(close(coords_at_offset(center, 0.0, 0.0, 15), center));
    }

    #[test]
    fn click_reaches_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut map = MapHandle::init(Coords::new(0.0, 0.0), 13);
        map.click(Coords::new(1.0, 1.0));

        let sink = Rc::clone(&seen);
        map.on_click(move |e| sink.borrow_mut().push(e.latlng));
        map.click(Coords::new(15.0, -10.0));
        assert_eq!(*seen.borrow(), vec![Coords::new(15.0, -10.0)]);
    }

    #[test]
    fn markers_accumulate() {
        let mut map = MapHandle::init(Coords::new(0.0, 0.0), 13);
        map.add_marker(Coords::new(1.0, 2.0), "🏃 Running on May 2", "running-popup");
        map.add_marker(Coords::new(3.0, 4.0), "🚴 Cycling on May 2", "cycling-popup");
        assert_eq!(map.markers().len(), 2);
        assert_eq!(map.markers()[1].popup_class, "cycling-popup");
    }

    #[test]
    fn set_view_without_animation_jumps() {
        let mut map = MapHandle::init(Coords::new(0.0, 0.0), 13);
        map.set_view(Coords::new(10.0, 10.0), 16, ViewOptions { animate: false, pan_duration: 0.0 });
        assert_eq!(map.center(), Coords::new(10.0, 10.0));
        assert_eq!(map.zoom(), 16);
        assert!(!map.is_animating());
    }

    #[test]
    fn animated_pan_finishes_after_duration() {
        let mut map = MapHandle::init(Coords::new(0.0, 0.0), 13);
        map.set_view(Coords::new(10.0, 20.0), 13, ViewOptions::default());
        assert!(map.advance(5.0));
        assert_eq!(map.center(), Coords::new(0.0, 0.0));
        assert!(map.advance(5.5));
        let mid = map.center();
        assert!(mid.lat > 0.0 && mid.lat < 10.0);
        assert!(!map.advance(6.0));
        assert_eq!(map.center(), Coords::new(10.0, 20.0));
        assert!(!map.is_animating());
    }

    #[test]
    fn popup_colours_follow_class() {
        assert_ne!(popup_accent("running-popup"), popup_accent("cycling-popup"));
    }
}
