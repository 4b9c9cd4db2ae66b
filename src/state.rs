use std::path::PathBuf;

use anyhow::Result;

use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::data::export::{export_to_file, write_listings, CsvTable};
use crate::data::filter::{FilterPipeline, FilterSelections, PipelineOutcome};
use crate::data::model::{AttrValue, Attribute, Dataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
///
/// Only the dataset and the selections persist; the outcome and dashboard
/// are rebuilt from scratch after every change.
pub struct AppState {
    /// Loaded dataset, never modified after startup.
    pub dataset: Dataset,

    /// Per-attribute filter selections.
    pub selections: FilterSelections,

    /// Result of the last pipeline run.
    pub outcome: PipelineOutcome,

    /// Derived tables for the current view.
    pub dashboard: Dashboard,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pipeline: FilterPipeline,
    export_dir: PathBuf,
    top_n: usize,
}

impl AppState {
    pub fn new(dataset: Dataset, config: &AppConfig) -> Self {
        let pipeline = FilterPipeline::new(config.pipeline.clone());
        let selections = FilterSelections::new();
        let outcome = pipeline.apply(&dataset, &selections);
        let dashboard = Dashboard::compute(&dataset, outcome.view.indices(), config.top_n);
        AppState {
            dataset,
            selections,
            outcome,
            dashboard,
            status_message: None,
            pipeline,
            export_dir: config.export_dir.clone(),
            top_n: config.top_n,
        }
    }

    /// Recompute the outcome and dashboard after a selection change.
    pub fn refilter(&mut self) {
        self.outcome = self.pipeline.apply(&self.dataset, &self.selections);
        self.dashboard = Dashboard::compute(&self.dataset, self.outcome.view.indices(), self.top_n);
    }

    /// Toggle a single value in a set-membership filter.
    pub fn toggle_value(&mut self, attr: Attribute, value: AttrValue) {
        self.selections.toggle_member(attr, value);
        self.refilter();
    }

    pub fn toggle_facility(&mut self, name: &str) {
        self.selections.toggle_facility(name);
        self.refilter();
    }

    pub fn set_range(&mut self, attr: Attribute, min: Option<f64>, max: Option<f64>) {
        self.selections.set_range(attr, min, max);
        self.refilter();
    }

    /// Deselect everything in one filter.
    pub fn clear_filter(&mut self, attr: Attribute) {
        self.selections.clear(attr);
        self.refilter();
    }

    pub fn clear_all_filters(&mut self) {
        self.selections.clear_all();
        self.refilter();
    }

    /// Write one derived table to `<export_dir>/<name>.csv`.
    pub fn export_table(&mut self, name: &str, table: &dyn CsvTable) {
        let path = self.export_dir.join(format!("{name}.csv"));
        let result = export_to_file(table, &path);
        self.report_export(&path, result);
    }

    /// Write the filtered listings to `<export_dir>/filtered_listings.csv`.
    pub fn export_filtered_rows(&mut self) {
        let path = self.export_dir.join("filtered_listings.csv");
        let result = std::fs::File::create(&path)
            .map_err(anyhow::Error::from)
            .and_then(|file| write_listings(&self.dataset, self.outcome.view.indices(), file));
        self.report_export(&path, result);
    }

    fn report_export(&mut self, path: &std::path::Path, result: Result<()>) {
        self.status_message = Some(match result {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                format!("Error: {e:#}")
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Listing;

    fn state() -> AppState {
        let ds = Dataset::from_listings(vec![
            Listing {
                url: "u0".into(),
                city: Some("Jakarta".into()),
                price_in_rp: Some(5e9),
                facilities: vec!["Pool".into(), "Gym".into()],
                ..Default::default()
            },
            Listing {
                url: "u1".into(),
                city: Some("Bogor".into()),
                price_in_rp: Some(2e9),
                ..Default::default()
            },
        ])
        .unwrap();
        AppState::new(ds, &AppConfig::default())
    }

    #[test]
    fn starts_with_every_row_visible() {
        let s = state();
        assert_eq!(s.outcome.view.len(), 2);
        assert_eq!(s.dashboard.summary.count, 2);
    }

    #[test]
    fn toggling_refilters_and_rebuilds_dashboard() {
        let mut s = state();
        s.toggle_value(Attribute::City, "Jakarta".into());
        assert_eq!(s.outcome.view.indices(), &[0]);
        assert_eq!(s.dashboard.summary.count, 1);
        assert_eq!(s.dashboard.summary.mean_price, Some(5e9));

        s.toggle_facility("Gym");
        assert_eq!(s.outcome.view.len(), 1);

        s.clear_all_filters();
        assert_eq!(s.outcome.view.len(), 2);
        assert!(s.selections.is_unconstrained());
    }

    #[test]
    fn export_writes_into_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            export_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let mut s = AppState::new(state().dataset, &config);
        let table = s.dashboard.city_counts.clone();
        s.export_table("city_counts", &table);
        s.export_filtered_rows();

        let counts = std::fs::read_to_string(dir.path().join("city_counts.csv")).unwrap();
        assert!(counts.starts_with("city,count\n"));
        assert!(dir.path().join("filtered_listings.csv").exists());
        assert!(s.status_message.unwrap().starts_with("Saved"));
    }
}
