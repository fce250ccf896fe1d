use std::sync::Arc;

use crate::charts::{build_dashboard, ChartOptions, DashboardUpdate};
use crate::data::filter::SexFilter;
use crate::data::model::Dataset;
use crate::geo::BoundarySet;

// ---------------------------------------------------------------------------
// Filter controller
// ---------------------------------------------------------------------------

/// Where the controller is in its request → publish cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A selection was requested and its charts are not published yet.
    Updating { pending: SexFilter },
}

/// Owns the sex selection and the last published set of charts.
///
/// Every selection rebuilds all five charts and swaps them in as one
/// [`DashboardUpdate`]; readers never see charts from two different
/// selections at once.
pub struct FilterController {
    dataset: Arc<Dataset>,
    options: ChartOptions,
    filter: SexFilter,
    phase: Phase,
    published: DashboardUpdate,
}

impl FilterController {
    /// Start with the `All` selection already published.
    pub fn new(dataset: Arc<Dataset>, options: ChartOptions) -> Self {
        let filter = SexFilter::default();
        let published = build_dashboard(&dataset, filter, &options);
        FilterController {
            dataset,
            options,
            filter,
            phase: Phase::Idle,
            published,
        }
    }

    /// Record a selection without recomputing. A later request replaces an
    /// earlier one that has not been applied yet.
    pub fn request(&mut self, filter: SexFilter) {
        self.phase = Phase::Updating { pending: filter };
    }

    /// Recompute and publish the pending selection, if any.
    pub fn apply(&mut self) -> &DashboardUpdate {
        if let Phase::Updating { pending } = self.phase {
            let update = build_dashboard(&self.dataset, pending, &self.options);
            log::debug!(
                "Publishing dashboard for {pending}: {} of {} candidates",
                update.selected,
                update.total
            );
            self.published = update;
            self.filter = pending;
            self.phase = Phase::Idle;
        }
        &self.published
    }

    /// Request and apply in one step.
    pub fn select(&mut self, filter: SexFilter) -> &DashboardUpdate {
        self.request(filter);
        self.apply()
    }

    pub fn filter(&self) -> SexFilter {
        self.filter
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn published(&self) -> &DashboardUpdate {
        &self.published
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Chart controller (None until a dataset is loaded).
    pub controller: Option<FilterController>,

    /// Presentation settings used for every controller built from here on.
    pub chart_options: ChartOptions,

    /// State outlines for the map; the map falls back to a tile grid without them.
    pub boundaries: Option<BoundarySet>,

    /// Header images, as `file://` URIs.
    pub logos: Vec<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            controller: None,
            chart_options: ChartOptions::default(),
            boundaries: None,
            logos: Vec::new(),
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset; the selection resets to `All`.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.controller = Some(FilterController::new(
            Arc::new(dataset),
            self.chart_options.clone(),
        ));
        self.status_message = None;
        self.loading = false;
    }

    /// Current selection (`All` when nothing is loaded).
    pub fn filter(&self) -> SexFilter {
        self.controller
            .as_ref()
            .map(FilterController::filter)
            .unwrap_or_default()
    }

    /// Forward a selector change to the controller. Reselecting the current
    /// value is a no-op.
    pub fn select_filter(&mut self, filter: SexFilter) {
        if let Some(controller) = &mut self.controller {
            if controller.filter() != filter {
                controller.select(filter);
            }
        }
    }

    pub fn dashboard(&self) -> Option<&DashboardUpdate> {
        self.controller.as_ref().map(FilterController::published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::aggregate;
    use crate::data::category::Dimension;
    use crate::data::model::Record;

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::from_records(vec![
            Record::new("F", Some(1), Some(1), Some(3), "SP"),
            Record::new("F", Some(3), Some(1), Some(12), "SP"),
            Record::new("M", Some(3), Some(2), Some(1), "BA"),
        ]))
    }

    #[test]
    fn starts_idle_with_all_published() {
        let c = FilterController::new(dataset(), ChartOptions::default());
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.filter(), SexFilter::All);
        assert_eq!(c.published().filter, SexFilter::All);
        assert_eq!(c.published().selected, 3);
    }

    #[test]
    fn select_publishes_all_five_for_the_new_filter() {
        let mut c = FilterController::new(dataset(), ChartOptions::default());
        let update = c.select(SexFilter::Female).clone();
        assert_eq!(update.filter, SexFilter::Female);
        assert_eq!(update.selected, 2);
        for spec in [&update.sex, &update.race, &update.marital_status, &update.age_bracket] {
            assert_eq!(spec.total(), 2);
        }
        assert_eq!(update.state.total(), 3);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.filter(), SexFilter::Female);
    }

    #[test]
    fn same_selection_twice_is_identical() {
        let mut c = FilterController::new(dataset(), ChartOptions::default());
        let first = c.select(SexFilter::Male).clone();
        let second = c.select(SexFilter::Male).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn request_is_pending_until_applied() {
        let mut c = FilterController::new(dataset(), ChartOptions::default());
        c.request(SexFilter::Female);
        assert_eq!(c.phase(), Phase::Updating { pending: SexFilter::Female });
        assert_eq!(c.published().filter, SexFilter::All);
        assert_eq!(c.filter(), SexFilter::All);

        assert_eq!(c.apply().filter, SexFilter::Female);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn unapplied_request_is_replaced_by_the_next() {
        let mut c = FilterController::new(dataset(), ChartOptions::default());
        c.request(SexFilter::Male);
        c.request(SexFilter::Female);
        let update = c.apply().clone();
        assert_eq!(update.filter, SexFilter::Female);
        assert_eq!(update.selected, 2);
    }

    #[test]
    fn apply_when_idle_keeps_published() {
        let mut c = FilterController::new(dataset(), ChartOptions::default());
        c.select(SexFilter::Male);
        let before = c.published().clone();
        assert_eq!(c.apply(), &before);
    }

    #[test]
    fn latest_selection_wins() {
        let mut c = FilterController::new(dataset(), ChartOptions::default());
        c.select(SexFilter::Male);
        c.select(SexFilter::Female);
        c.select(SexFilter::All);
        assert_eq!(c.published().filter, SexFilter::All);
        assert_eq!(c.published().sex.total(), 3);
    }

    #[test]
    fn published_tables_match_direct_aggregation() {
        let ds = dataset();
        let mut c = FilterController::new(ds.clone(), ChartOptions::default());
        let update = c.select(SexFilter::Female).clone();
        let table = aggregate(&ds, Dimension::Race, SexFilter::Female);
        let labels: Vec<&str> = update.race.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, table.labels());
    }

    #[test]
    fn app_state_without_dataset_ignores_selection() {
        let mut state = AppState::default();
        state.select_filter(SexFilter::Male);
        assert!(state.dashboard().is_none());
        assert_eq!(state.filter(), SexFilter::All);
    }

    #[test]
    fn loading_a_dataset_resets_selection() {
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(vec![Record::new("M", None, None, None, "RJ")]));
        state.select_filter(SexFilter::Male);
        assert_eq!(state.filter(), SexFilter::Male);

        state.set_dataset(Dataset::from_records(vec![Record::new("F", None, None, None, "RJ")]));
        assert_eq!(state.filter(), SexFilter::All);
        assert_eq!(state.dashboard().map(|d| d.total), Some(1));
    }
}
