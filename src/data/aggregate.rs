use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use super::category::{age_bracket_rank, Dimension};
use super::filter::{filtered_records, SexFilter};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// FrequencyTable
// ---------------------------------------------------------------------------

/// One category of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub label: String,
    pub count: u64,
    /// Share of the selected records, 0–100, rounded to two decimals.
    pub percentage: f64,
}

/// Ordered per-category counts of one dimension over a (possibly filtered)
/// dataset. Counts always sum to the number of selected records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub dimension: Dimension,
    pub rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&FrequencyRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Arrow view of the table, used for pretty-printing summaries.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new(self.dimension.display_name(), DataType::Utf8, false),
            Field::new("Quantidade", DataType::UInt64, false),
            Field::new("Percentual", DataType::Float64, false),
        ]));
        let labels: ArrayRef = Arc::new(StringArray::from(self.labels()));
        let counts: ArrayRef = Arc::new(UInt64Array::from(
            self.rows.iter().map(|r| r.count).collect::<Vec<_>>(),
        ));
        let pcts: ArrayRef = Arc::new(Float64Array::from(
            self.rows.iter().map(|r| r.percentage).collect::<Vec<_>>(),
        ));
        Ok(RecordBatch::try_new(schema, vec![labels, counts, pcts])?)
    }
}

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Percentage of `count` in `total`. Callers never pass `total == 0`.
fn percentage(count: u64, total: u64) -> f64 {
    round2(count as f64 / total as f64 * 100.0)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group the records passing `filter` by their label along `dimension`.
///
/// Sex, race and marital status tables are ordered by descending count with
/// ties broken by label. Age bracket tables keep the youngest-to-oldest order;
/// only observed brackets appear. An empty selection gives an empty table.
pub fn aggregate(dataset: &Dataset, dimension: Dimension, filter: SexFilter) -> FrequencyTable {
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    for record in filtered_records(dataset, filter) {
        *counts.entry(dimension.label_of(record)).or_default() += 1;
    }

    let unmapped: u64 = counts
        .iter()
        .filter(|(label, _)| dimension.is_fallback(label))
        .map(|(_, n)| *n)
        .sum();
    if unmapped > 0 {
        log::warn!("{unmapped} record(s) carry an unmapped {dimension} code");
    }

    let total: u64 = counts.values().sum();
    let mut rows: Vec<FrequencyRow> = counts
        .into_iter()
        .map(|(label, count)| FrequencyRow {
            label: label.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    match dimension {
        Dimension::AgeBracket => rows.sort_by_key(|r| age_bracket_rank(&r.label)),
        _ => rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label))),
    }

    FrequencyTable { dimension, rows }
}

// ---------------------------------------------------------------------------
// Geographic aggregation
// ---------------------------------------------------------------------------

/// Candidates per state of test application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    pub code: String,
    pub count: u64,
}

/// Count records per state code over the whole dataset, descending by count
/// then by code.
///
/// This takes no filter: the map always shows every candidate, whatever sex
/// is selected for the other charts.
pub fn aggregate_by_state(dataset: &Dataset) -> Vec<StateCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in dataset.records() {
        let code = record.state_code.trim().to_ascii_uppercase();
        *counts.entry(code).or_default() += 1;
    }

    let mut out: Vec<StateCount> = counts
        .into_iter()
        .map(|(code, count)| StateCount { code, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
    out
}
