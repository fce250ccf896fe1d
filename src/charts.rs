use serde::Serialize;

use crate::color::{category_color, reds, scale_position, SEQUENTIAL_SCALE};
use crate::data::aggregate::{aggregate, aggregate_by_state, round2, FrequencyTable};
use crate::data::category::Dimension;
use crate::data::filter::{filtered_records, SexFilter};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Chart specification – what the rendering side receives
// ---------------------------------------------------------------------------

/// Which of the five dashboard views a spec belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    Sex,
    Race,
    MaritalStatus,
    AgeBracket,
    State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Categories along x, counts up. `tick_angle` tilts long category names.
    VerticalBar { tick_angle: i16 },
    /// Categories along y (top to bottom in series order), counts along x.
    HorizontalBar,
    /// Slices labelled with label and percent.
    Pie,
    /// Regions keyed by two-letter state code, shaded by count.
    Choropleth,
}

/// One category (or region) of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
    /// `#RRGGBB`.
    pub color: String,
}

/// Continuous colour scale of a choropleth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub name: &'static str,
    pub title: String,
    pub min: u64,
    pub max: u64,
}

/// A renderable chart: everything a front end needs, nothing it has to compute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub show_legend: bool,
    pub series: Vec<SeriesPoint>,
    pub color_scale: Option<ColorScale>,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.series.iter().map(|p| p.count).sum()
    }
}

/// Presentation settings shared by every builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Exam edition shown in titles.
    pub year: u16,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions { year: 2023 }
    }
}

const COUNT_AXIS: &str = "Número de Candidatos";

fn title(dimension: Dimension, filter: SexFilter, opts: &ChartOptions) -> String {
    format!(
        "Distribuição de Candidatos por {} - ENEM {} ({})",
        dimension.display_name(),
        opts.year,
        filter.display_name()
    )
}

fn categorical_series(table: &FrequencyTable) -> Vec<SeriesPoint> {
    table
        .rows
        .iter()
        .map(|row| SeriesPoint {
            label: row.label.clone(),
            count: row.count,
            percentage: row.percentage,
            color: category_color(table.dimension, &row.label).to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn sex_chart(dataset: &Dataset, filter: SexFilter, opts: &ChartOptions) -> ChartSpec {
    let table = aggregate(dataset, Dimension::Sex, filter);
    ChartSpec {
        id: ChartId::Sex,
        kind: ChartKind::VerticalBar { tick_angle: 0 },
        title: title(Dimension::Sex, filter, opts),
        x_label: Some(Dimension::Sex.display_name().to_string()),
        y_label: Some(COUNT_AXIS.to_string()),
        show_legend: false,
        series: categorical_series(&table),
        color_scale: None,
    }
}

pub fn race_chart(dataset: &Dataset, filter: SexFilter, opts: &ChartOptions) -> ChartSpec {
    let table = aggregate(dataset, Dimension::Race, filter);
    ChartSpec {
        id: ChartId::Race,
        kind: ChartKind::Pie,
        title: title(Dimension::Race, filter, opts),
        x_label: None,
        y_label: None,
        show_legend: true,
        series: categorical_series(&table),
        color_scale: None,
    }
}

pub fn marital_status_chart(dataset: &Dataset, filter: SexFilter, opts: &ChartOptions) -> ChartSpec {
    let table = aggregate(dataset, Dimension::MaritalStatus, filter);
    ChartSpec {
        id: ChartId::MaritalStatus,
        kind: ChartKind::VerticalBar { tick_angle: 45 },
        title: title(Dimension::MaritalStatus, filter, opts),
        x_label: Some(Dimension::MaritalStatus.display_name().to_string()),
        y_label: Some(COUNT_AXIS.to_string()),
        show_legend: false,
        series: categorical_series(&table),
        color_scale: None,
    }
}

pub fn age_bracket_chart(dataset: &Dataset, filter: SexFilter, opts: &ChartOptions) -> ChartSpec {
    let table = aggregate(dataset, Dimension::AgeBracket, filter);
    ChartSpec {
        id: ChartId::AgeBracket,
        kind: ChartKind::HorizontalBar,
        title: title(Dimension::AgeBracket, filter, opts),
        x_label: Some(COUNT_AXIS.to_string()),
        y_label: Some(Dimension::AgeBracket.display_name().to_string()),
        show_legend: false,
        series: categorical_series(&table),
        color_scale: None,
    }
}

/// Choropleth of candidates per state.
///
/// There is deliberately no filter parameter: the map covers the whole
/// dataset whatever sex is selected elsewhere.
pub fn state_chart(dataset: &Dataset, opts: &ChartOptions) -> ChartSpec {
    let states = aggregate_by_state(dataset);
    let total: u64 = states.iter().map(|s| s.count).sum();
    let min = states.iter().map(|s| s.count).min().unwrap_or(0);
    let max = states.iter().map(|s| s.count).max().unwrap_or(0);

    let series = states
        .into_iter()
        .map(|s| SeriesPoint {
            color: reds(scale_position(s.count, min, max)),
            percentage: round2(s.count as f64 / total as f64 * 100.0),
            label: s.code,
            count: s.count,
        })
        .collect();

    ChartSpec {
        id: ChartId::State,
        kind: ChartKind::Choropleth,
        title: format!("Distribuição de Candidatos por Estado - ENEM {}", opts.year),
        x_label: None,
        y_label: None,
        show_legend: false,
        series,
        color_scale: Some(ColorScale {
            name: SEQUENTIAL_SCALE,
            title: "Quantidade de Candidatos".to_string(),
            min,
            max,
        }),
    }
}

// ---------------------------------------------------------------------------
// Whole dashboard
// ---------------------------------------------------------------------------

/// The five chart specs for one filter value, always produced together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardUpdate {
    pub filter: SexFilter,
    /// Records passing `filter`.
    pub selected: u64,
    /// Records in the dataset.
    pub total: u64,
    pub sex: ChartSpec,
    pub race: ChartSpec,
    pub marital_status: ChartSpec,
    pub age_bracket: ChartSpec,
    pub state: ChartSpec,
}

impl DashboardUpdate {
    /// Charts in page order.
    pub fn charts(&self) -> [&ChartSpec; 5] {
        [
            &self.sex,
            &self.race,
            &self.marital_status,
            &self.age_bracket,
            &self.state,
        ]
    }
}

/// Compute every chart for `filter`. Pure: same inputs, same output.
pub fn build_dashboard(dataset: &Dataset, filter: SexFilter, opts: &ChartOptions) -> DashboardUpdate {
    DashboardUpdate {
        filter,
        selected: filtered_records(dataset, filter).count() as u64,
        total: dataset.len() as u64,
        sex: sex_chart(dataset, filter, opts),
        race: race_chart(dataset, filter, opts),
        marital_status: marital_status_chart(dataset, filter, opts),
        age_bracket: age_bracket_chart(dataset, filter, opts),
        state: state_chart(dataset, opts),
    }
}
