use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::design::{TotalsSource, VolumeRecord};

/// summarizes a bund design run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RunSummary {
    /// information describing how this run was configured
    pub source: RunSource,
    pub stats: RunStats,
    /// output product name to written file path
    pub outputs: IndexMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct RunSource {
    /// date and time this run finished
    pub created: String,
    pub centrelines: String,
    pub terrain: String,
    pub mode: String,
    pub datum: String,
    pub merge_by_id: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub struct RunStats {
    /// centrelines read from the input
    pub features_read: usize,
    /// centrelines remaining after merging by id
    pub features_merged: usize,
    /// centrelines that produced a volumes row
    pub features_processed: usize,
    /// centrelines skipped for a missing design value
    pub features_skipped: usize,
    /// centrelines reported with zero metrics after a failure
    pub features_degraded: usize,
    /// cells where a maintained crest lies below the terrain, over all features
    pub negative_fill_cells: usize,
    pub totals_source: Option<TotalsSource>,
    pub total_fill_area_m2: f64,
    pub total_fill_volume_m3: f64,
    pub total_strip_volume_m3: f64,
}

impl RunSource {
    pub fn new(
        centrelines: &str,
        terrain: &str,
        mode: &str,
        datum: &str,
        merge_by_id: bool,
    ) -> RunSource {
        let created = chrono::Utc::now().to_rfc3339();
        RunSource {
            created,
            centrelines: centrelines.to_string(),
            terrain: terrain.to_string(),
            mode: mode.to_string(),
            datum: datum.to_string(),
            merge_by_id,
        }
    }
}

impl RunStats {
    pub fn set_totals(&mut self, totals: &VolumeRecord, source: TotalsSource) {
        self.totals_source = Some(source);
        self.total_fill_area_m2 = totals.fill_area_m2;
        self.total_fill_volume_m3 = totals.fill_volume_m3;
        self.total_strip_volume_m3 = totals.strip_volume_m3;
    }
}
