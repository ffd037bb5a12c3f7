use bund_core::raster::Raster;
use serde::{Deserialize, Serialize};

use super::{derive_footprint, FootprintMetrics, VolumeRecord};
use crate::config::DesignParameters;

/// where the totals row got its area and volumes from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TotalsSource {
    /// the footprint of the merged fill raster
    MergedRaster,
    /// the sum of the per-feature rows
    SummedRows,
}

/// produces the single totals row of a run.
pub struct VolumeAggregator<'a> {
    params: &'a DesignParameters,
}

impl<'a> VolumeAggregator<'a> {
    pub fn new(params: &'a DesignParameters) -> VolumeAggregator<'a> {
        VolumeAggregator { params }
    }

    /// totals from the merged fill raster when one exists, otherwise (or when the
    /// merged footprint cannot be derived) the sum of the per-feature rows.
    pub fn totals(
        &self,
        merged_fill: Option<&Raster>,
        rows: &[VolumeRecord],
    ) -> (VolumeRecord, TotalsSource) {
        if let Some(fill) = merged_fill {
            match derive_footprint(fill, self.params.strip_depth) {
                Ok(footprint) => {
                    log::info!(
                        "totals from merged fill: {} cells, {:.3} m2, {:.3} m3",
                        footprint.cell_count,
                        footprint.metrics.area_m2,
                        footprint.metrics.volume_m3
                    );
                    let record = VolumeRecord::totals(self.params, &footprint.metrics);
                    return (record, TotalsSource::MergedRaster);
                }
                Err(e) => {
                    log::warn!("merged footprint failed, totals are summed from the rows: {e}");
                }
            }
        }
        let summed = rows
            .iter()
            .filter(|r| !r.is_totals())
            .fold(FootprintMetrics::default(), |acc, r| acc.add(&r.metrics()));
        (
            VolumeRecord::totals(self.params, &summed),
            TotalsSource::SummedRows,
        )
    }
}
