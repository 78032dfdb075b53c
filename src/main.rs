use eframe::egui;
use tracing::{info, warn};

use mapty::config::Config;
use mapty::logging;
use mapty::ui::MaptyApp;

fn main() -> Result<(), eframe::Error> {
    let loaded = Config::try_load();
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default().with_env_overrides(|key| std::env::var(key).ok()),
    };
    logging::init(&config.log_level);
    if let Err(e) = loaded {
        warn!("{e}, using defaults");
    }
    info!(data_dir = %config.data_dir.display(), zoom = config.map_zoom, "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("mapty"),
        ..Default::default()
    };

    eframe::run_native(
        "mapty",
        options,
        Box::new(move |cc| Ok(Box::new(MaptyApp::new(cc, config)))),
    )
}
