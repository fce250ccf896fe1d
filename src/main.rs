mod app;
mod charts;
mod color;
mod config;
mod data;
mod error;
mod export;
mod geo;
mod state;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::DashboardApp;
use charts::build_dashboard;
use config::{Cli, Commands, DashboardConfig};
use geo::BoundarySet;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = DashboardConfig::from(Cli::parse());

    match config.command.clone() {
        Commands::Gui => run_gui(&config),
        Commands::Summary { sex } => {
            let dataset = data::loader::load_file(config.require_data()?)?;
            print!("{}", export::summary_text(&dataset, sex)?);
            Ok(())
        }
        Commands::Export { sex, output } => {
            let dataset = data::loader::load_file(config.require_data()?)?;
            let update = build_dashboard(&dataset, sex, &config.chart_options);
            export::export_dashboard(&update, output.as_deref())
        }
    }
}

fn run_gui(config: &DashboardConfig) -> Result<()> {
    let mut state = AppState {
        chart_options: config.chart_options.clone(),
        logos: config.logo_uris(),
        ..AppState::default()
    };

    // A broken dataset given on the command line is fatal: there is nothing to show.
    if let Some(path) = &config.data {
        state.set_dataset(data::loader::load_file(path)?);
    }

    // Missing outlines only cost the map its shapes.
    match config.boundaries_path() {
        Some(path) => match BoundarySet::load(&path, &config.feature_key) {
            Ok(set) => state.boundaries = Some(set),
            Err(e) => {
                log::warn!("State outlines unavailable, using tile map: {e:#}");
                state.status_message = Some(format!("Mapa sem contornos: {e:#}"));
            }
        },
        None => log::info!(
            "No state outlines at {}; using tile map (outlines: {})",
            geo::DEFAULT_BOUNDARIES_PATH,
            geo::BOUNDARIES_SOURCE_URL
        ),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Análise de Candidatos do ENEM",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the header logos.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running the dashboard window")
}
