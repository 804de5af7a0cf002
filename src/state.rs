use crate::config::Config;
use crate::crash::dataset::{CrashDataset, load_or_empty};
use crate::crash::stats::DatasetStats;
use crate::error::AppError;
use crate::geocode::Geocoder;
use crate::scoring::model::{SafetyModel, create_model};
use std::sync::Arc;
use tracing::{info, warn};

/// Read-only service state shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    dataset: Arc<CrashDataset>,
    stats: DatasetStats,
    model: Arc<dyn SafetyModel>,
    geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    pub fn new(
        dataset: Arc<CrashDataset>,
        model: Arc<dyn SafetyModel>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let stats = DatasetStats::from_records(dataset.records());
        Self {
            dataset,
            stats,
            model,
            geocoder,
        }
    }

    /// Loads the configured dataset and builds the scoring model.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let dataset = match config.dataset_path() {
            Some(path) => load_or_empty(path),
            None => {
                warn!("No dataset path configured in [dataset].path");
                Arc::new(CrashDataset::empty())
            }
        };
        let model = create_model(
            config.scoring_model(),
            Arc::clone(&dataset),
            Some(config.max_distance_km()),
        )?;
        info!(
            model = model.name(),
            records = dataset.len(),
            skipped = dataset.skipped(),
            "Scoring model ready"
        );

        Ok(Self::new(
            dataset,
            Arc::from(model),
            Arc::new(config.geocoder()),
        ))
    }

    pub fn dataset(&self) -> &CrashDataset {
        &self.dataset
    }

    pub fn stats(&self) -> &DatasetStats {
        &self.stats
    }

    pub fn model(&self) -> &dyn SafetyModel {
        self.model.as_ref()
    }

    pub fn geocoder(&self) -> &dyn Geocoder {
        self.geocoder.as_ref()
    }
}
