use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::filter::SexFilter;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Header – logos, title and the sex selector
// ---------------------------------------------------------------------------

/// Render the page header.
pub fn header(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(8.0);
    ui.horizontal(|ui: &mut Ui| {
        if let Some(uri) = state.logos.first() {
            ui.add(egui::Image::new(uri.as_str()).max_height(100.0));
        }
        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading(
                RichText::new(format!(
                    "Análise de Candidatos do ENEM {}",
                    state.chart_options.year
                ))
                .size(28.0)
                .color(Color32::from_rgb(0x2C, 0x3E, 0x50)),
            );
            ui.label(
                RichText::new(format!(
                    "Visualização da distribuição dos candidatos por Sexo, Cor/Raça e Estado Civil no ENEM {}",
                    state.chart_options.year
                ))
                .color(Color32::from_rgb(0x7F, 0x8C, 0x8D)),
            );
        });
        if let Some(uri) = state.logos.get(1) {
            ui.add(egui::Image::new(uri.as_str()).max_height(100.0));
        }
    });
    ui.add_space(8.0);

    ui.vertical_centered(|ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            sex_selector(ui, state);
        });
    });
    ui.add_space(8.0);
}

/// The one cross-cutting control.
fn sex_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Selecione o Sexo:");
    let current = state.filter();
    let mut selected = current;
    ui.add_enabled_ui(state.controller.is_some(), |ui: &mut Ui| {
        egui::ComboBox::from_id_salt("sex_filter")
            .selected_text(current.display_name())
            .width(200.0)
            .show_ui(ui, |ui: &mut Ui| {
                for option in SexFilter::ALL {
                    ui.selectable_value(&mut selected, option, option.display_name());
                }
            });
    });
    if selected != current {
        state.select_filter(selected);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.loading {
            ui.spinner();
        }

        if let Some(update) = state.dashboard() {
            ui.label(format!(
                "{} candidates loaded, {} selected",
                update.total, update.selected
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open ENEM microdata")
        .add_filter("Supported files", &["parquet", "pq", "csv", "txt", "json", "xlsx", "xls"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}
