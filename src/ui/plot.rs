use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Align2, Color32, RichText, ScrollArea, Sense, Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::charts::{ChartKind, ChartSpec, ColorScale};
use crate::color::{contrast_text, reds, to_color32};
use crate::geo::{state_tile, BoundarySet, STATES};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 420.0;
const MAP_HEIGHT: f32 = 560.0;
const NO_DATA_FILL: Color32 = Color32::from_rgb(0xEE, 0xEE, 0xEE);

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the five charts of the current dashboard update.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(update) = state.dashboard() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a microdata file to build the dashboard  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for spec in update.charts() {
                chart(ui, spec, state.boundaries.as_ref());
                ui.separator();
            }
        });
}

fn chart(ui: &mut Ui, spec: &ChartSpec, boundaries: Option<&BoundarySet>) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(RichText::new(&spec.title).size(16.0));
    });

    if spec.is_empty() {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label("Nenhum candidato para a seleção atual.");
        });
        ui.add_space(CHART_HEIGHT / 4.0);
        return;
    }

    match spec.kind {
        ChartKind::VerticalBar { tick_angle } => vertical_bars(ui, spec, tick_angle != 0),
        ChartKind::HorizontalBar => horizontal_bars(ui, spec),
        ChartKind::Pie => pie(ui, spec),
        ChartKind::Choropleth => choropleth(ui, spec, boundaries),
    }
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn vertical_bars(ui: &mut Ui, spec: &ChartSpec, wrap_labels: bool) {
    let labels: Vec<String> = spec
        .series
        .iter()
        .map(|p| {
            if wrap_labels {
                p.label.replace('/', "/\n")
            } else {
                p.label.clone()
            }
        })
        .collect();

    let bars: Vec<Bar> = spec
        .series
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Bar::new(i as f64, p.count as f64)
                .name(&p.label)
                .fill(to_color32(&p.color))
                .width(0.6)
        })
        .collect();

    let mut plot = Plot::new(format!("chart_{:?}", spec.id))
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_grid([false, true])
        .x_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            category_tick(&labels, mark.value)
        })
        .y_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            format_count(mark.value.max(0.0) as u64)
        });
    if let Some(label) = &spec.x_label {
        plot = plot.x_axis_label(label.as_str());
    }
    if let Some(label) = &spec.y_label {
        plot = plot.y_axis_label(label.as_str());
    }

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).element_formatter(Box::new(|bar: &Bar, _: &BarChart| {
            format!("{}\n{}", bar.name, format_count(bar.value as u64))
        })));
        for (i, p) in spec.series.iter().enumerate() {
            plot_ui.text(
                Text::new(PlotPoint::new(i as f64, p.count as f64), format_count(p.count))
                    .anchor(Align2::CENTER_BOTTOM),
            );
        }
    });
}

/// Categories run top to bottom in series order.
fn horizontal_bars(ui: &mut Ui, spec: &ChartSpec) {
    let n = spec.series.len();
    let position = move |i: usize| (n - 1 - i) as f64;
    let labels: Vec<String> = (0..n)
        .map(|slot| spec.series[n - 1 - slot].label.clone())
        .collect();

    let bars: Vec<Bar> = spec
        .series
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Bar::new(position(i), p.count as f64)
                .name(&p.label)
                .fill(to_color32(&p.color))
                .width(0.9)
        })
        .collect();

    let mut plot = Plot::new(format!("chart_{:?}", spec.id))
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_grid([true, false])
        .y_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            category_tick(&labels, mark.value)
        })
        .x_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            format_count(mark.value.max(0.0) as u64)
        });
    if let Some(label) = &spec.x_label {
        plot = plot.x_axis_label(label.as_str());
    }
    if let Some(label) = &spec.y_label {
        plot = plot.y_axis_label(label.as_str());
    }

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(
            BarChart::new(bars)
                .horizontal()
                .element_formatter(Box::new(|bar: &Bar, _: &BarChart| {
                    format!("{}\n{}", bar.name, format_count(bar.value as u64))
                })),
        );
        for (i, p) in spec.series.iter().enumerate() {
            plot_ui.text(
                Text::new(PlotPoint::new(p.count as f64, position(i)), format_count(p.count))
                    .anchor(Align2::LEFT_CENTER),
            );
        }
    });
}

/// Tick text for a category axis: the label at integer positions, nothing
/// in between.
fn category_tick(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Largest angle drawn as one polygon; keeps every piece convex.
const MAX_PIECE: f64 = FRAC_PI_2;

fn pie(ui: &mut Ui, spec: &ChartSpec) {
    let total = spec.total() as f64;

    Plot::new(format!("chart_{:?}", spec.id))
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .legend(Legend::default().position(egui_plot::Corner::RightTop))
        .label_formatter(|name, _| name.to_string())
        .show(ui, |plot_ui| {
            let mut start = FRAC_PI_2;
            for p in &spec.series {
                let sweep = p.count as f64 / total * TAU;
                let fill = to_color32(&p.color);
                for piece in wedge_pieces(start, sweep) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(piece))
                            .name(&p.label)
                            .fill_color(fill)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                }
                if p.percentage >= 4.0 {
                    let mid = start - sweep / 2.0;
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(0.62 * mid.cos(), 0.62 * mid.sin()),
                            RichText::new(format!("{}\n{:.1}%", p.label, p.percentage))
                                .color(contrast_text(fill)),
                        )
                        .anchor(Align2::CENTER_CENTER),
                    );
                }
                start -= sweep;
            }
        });
}

/// Outline of a unit-circle slice starting at `start` and running clockwise
/// over `sweep` radians, split into convex pieces of at most [`MAX_PIECE`].
fn wedge_pieces(start: f64, sweep: f64) -> Vec<Vec<[f64; 2]>> {
    if sweep <= 0.0 {
        return Vec::new();
    }
    let n_pieces = (sweep / MAX_PIECE).ceil().max(1.0) as usize;
    let step = sweep / n_pieces as f64;
    (0..n_pieces)
        .map(|k| {
            let a0 = start - step * k as f64;
            let segments = ((step / TAU) * 96.0).ceil().max(2.0) as usize;
            let mut pts = Vec::with_capacity(segments + 2);
            pts.push([0.0, 0.0]);
            for s in 0..=segments {
                let a = a0 - step * s as f64 / segments as f64;
                pts.push([a.cos(), a.sin()]);
            }
            pts
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Choropleth
// ---------------------------------------------------------------------------

fn choropleth(ui: &mut Ui, spec: &ChartSpec, boundaries: Option<&BoundarySet>) {
    let counts: BTreeMap<String, u64> = spec
        .series
        .iter()
        .map(|p| (p.label.clone(), p.count))
        .collect();
    let fills: BTreeMap<&str, Color32> = spec
        .series
        .iter()
        .map(|p| (p.label.as_str(), to_color32(&p.color)))
        .collect();

    let plot = Plot::new(format!("chart_{:?}", spec.id))
        .height(MAP_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_scroll(false)
        .label_formatter(move |name, _| match counts.get(name) {
            Some(count) => {
                let state = state_tile(name).map(|t| t.name).unwrap_or(name);
                format!("Estado: {state} ({name})\nCandidatos: {}", format_count(*count))
            }
            None => String::new(),
        });

    match boundaries {
        Some(set) if !set.is_empty() => {
            plot.show(ui, |plot_ui| {
                for p in &spec.series {
                    let Some(region) = set.get(&p.label) else {
                        continue;
                    };
                    let fill = fills.get(p.label.as_str()).copied().unwrap_or(NO_DATA_FILL);
                    for ring in &region.rings {
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(ring.clone()))
                                .name(&p.label)
                                .fill_color(fill.gamma_multiply(0.7))
                                .stroke(Stroke::new(1.0, Color32::DARK_GRAY)),
                        );
                    }
                }
            });
            let unmatched: Vec<&str> = spec
                .series
                .iter()
                .filter(|p| set.get(&p.label).is_none())
                .map(|p| p.label.as_str())
                .collect();
            if !unmatched.is_empty() {
                ui.label(format!("Sem contorno no mapa: {}", unmatched.join(", ")));
            }
        }
        _ => {
            plot.show(ui, |plot_ui| {
                for tile in &STATES {
                    let fill = fills.get(tile.code).copied().unwrap_or(NO_DATA_FILL);
                    let (x, y) = (tile.col as f64, -(tile.row as f64));
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(tile_square(x, y)))
                            .name(tile.code)
                            .fill_color(fill)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                    plot_ui.text(
                        Text::new(PlotPoint::new(x, y), RichText::new(tile.code).color(contrast_text(fill)))
                            .anchor(Align2::CENTER_CENTER),
                    );
                }
            });
            let unknown: Vec<&str> = spec
                .series
                .iter()
                .filter(|p| !STATES.iter().any(|t| t.code == p.label))
                .map(|p| p.label.as_str())
                .collect();
            if !unknown.is_empty() {
                ui.label(format!("Códigos fora do mapa: {}", unknown.join(", ")));
            }
        }
    }

    if let Some(scale) = &spec.color_scale {
        color_bar(ui, scale);
    }
}

fn tile_square(x: f64, y: f64) -> Vec<[f64; 2]> {
    let h = 0.46;
    vec![[x - h, y - h], [x + h, y - h], [x + h, y + h], [x - h, y + h]]
}

/// Horizontal gradient with the scale's min and max underneath.
fn color_bar(ui: &mut Ui, scale: &ColorScale) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(&scale.title);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(320.0, 14.0), Sense::hover());
        let steps = 64;
        let w = rect.width() / steps as f32;
        for i in 0..steps {
            let x0 = rect.left() + w * i as f32;
            let slice = egui::Rect::from_min_max(
                egui::pos2(x0, rect.top()),
                egui::pos2(x0 + w + 0.5, rect.bottom()),
            );
            let t = i as f64 / (steps - 1) as f64;
            ui.painter().rect_filled(slice, 0.0, to_color32(&reds(t)));
        }
        ui.label(format!("{}  –  {}", format_count(scale.min), format_count(scale.max)));
    });
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `1234567` → `1,234,567`.
fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
