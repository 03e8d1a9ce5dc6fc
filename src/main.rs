//! Realty Insights - Taiwan housing & mortgage dashboards
//!
//! A Rust application rendering animated real-estate charts from pre-aggregated CSV data.

mod analysis;
mod charts;
mod config;
mod dashboard;
mod data;
mod gui;

use anyhow::Context;
use config::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DashboardConfig::discover(config_path.as_deref())
        .context("Cannot start without a valid configuration")?;
    log::info!("Reading datasets from {}", config.data_dir.display());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Realty Insights"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Realty Insights",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Window failed: {e}"))
}
