mod app;
mod ui;

use anyhow::{Context, Result};
use app::RustyEstateApp;
use eframe::egui;
use rusty_estate::config::AppConfig;
use rusty_estate::data::loader::load_file;
use rusty_estate::state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let dataset = match load_file(&config.data_path) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("Failed to load {}: {e}", config.data_path.display());
            return Err(e).with_context(|| format!("loading {}", config.data_path.display()));
        }
    };
    let state = AppState::new(dataset, &config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Estate – Listing Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(RustyEstateApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}
