use bund_core::raster::{GridSpec, ProcessingEnv, Raster};

use super::{derive_footprint, FeatureSurface, FootprintCollection, FootprintMetrics};
use crate::{centreline::Centreline, BundError};

/// combines the value already held by a merged cell with an incoming one. NaN is
/// "no data". implementations must be commutative and associative so that the
/// merged result does not depend on the order features are processed in.
pub trait CellReducer {
    fn reduce(&self, current: f64, incoming: f64) -> f64;
}

/// the highest defined value wins, no data when no input defines the cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxWins;

impl CellReducer for MaxWins {
    #[inline]
    fn reduce(&self, current: f64, incoming: f64) -> f64 {
        match (current.is_nan(), incoming.is_nan()) {
            (true, _) => incoming,
            (_, true) => current,
            _ => current.max(incoming),
        }
    }
}

/// a full-extent raster that feature rasters are merged into.
#[derive(Clone, Debug)]
pub struct MergedRaster<R: CellReducer> {
    raster: Raster,
    reducer: R,
}

impl<R: CellReducer> MergedRaster<R> {
    pub fn new(grid: GridSpec, reducer: R) -> MergedRaster<R> {
        MergedRaster {
            raster: Raster::empty(grid),
            reducer,
        }
    }

    /// merges a raster on an aligned window of the merged grid. only allowed while no
    /// processing mask is active.
    pub fn merge(&mut self, env: &ProcessingEnv, incoming: &Raster) -> Result<(), BundError> {
        if env.is_masked() {
            return Err(BundError::StaleMask);
        }
        let reducer = &self.reducer;
        self.raster
            .update_from(incoming, |current, value| {
                *current = reducer.reduce(*current, value);
            })?;
        Ok(())
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }
}

/// merges per-feature results into the run's global rasters and footprints.
pub struct FeatureAccumulator<R: CellReducer + Clone = MaxWins> {
    surface: Option<MergedRaster<R>>,
    fill: Option<MergedRaster<R>>,
    footprints: Option<FootprintCollection>,
    strip_depth: f64,
    datum: String,
}

impl<R: CellReducer + Clone> FeatureAccumulator<R> {
    /// `keep_surface`, `keep_fill` and `keep_footprints` select which merged
    /// products are retained.
    pub fn new(
        grid: GridSpec,
        reducer: R,
        keep_surface: bool,
        keep_fill: bool,
        keep_footprints: bool,
        strip_depth: f64,
        datum: &str,
    ) -> FeatureAccumulator<R> {
        FeatureAccumulator {
            surface: keep_surface.then(|| MergedRaster::new(grid, reducer.clone())),
            fill: keep_fill.then(|| MergedRaster::new(grid, reducer)),
            footprints: keep_footprints.then(FootprintCollection::new),
            strip_depth,
            datum: datum.to_string(),
        }
    }

    /// merges the rasters of one feature and derives its footprint metrics.
    ///
    /// a failed footprint derivation is not an error: the rasters are still merged,
    /// a warning is logged and None is returned so that the caller can report zero
    /// metrics for the feature.
    pub fn accumulate(
        &mut self,
        env: &ProcessingEnv,
        feature: &Centreline,
        result: &FeatureSurface,
    ) -> Result<Option<FootprintMetrics>, BundError> {
        if env.is_masked() {
            return Err(BundError::StaleMask);
        }
        if let Some(merged) = self.surface.as_mut() {
            merged.merge(env, &result.surface)?;
        }
        if let Some(merged) = self.fill.as_mut() {
            merged.merge(env, &result.fill)?;
        }
        match derive_footprint(&result.fill, self.strip_depth) {
            Ok(footprint) => {
                if let Some(collection) = self.footprints.as_mut() {
                    collection.push(&feature.id, &self.datum, &footprint);
                }
                Ok(Some(footprint.metrics))
            }
            Err(e) => {
                log::warn!(
                    "centreline {} (id '{}'): footprint and volumes failed, reporting zero: {e}",
                    feature.source_id,
                    feature.id
                );
                Ok(None)
            }
        }
    }

    pub fn surface(&self) -> Option<&Raster> {
        self.surface.as_ref().map(|m| m.raster())
    }

    pub fn fill(&self) -> Option<&Raster> {
        self.fill.as_ref().map(|m| m.raster())
    }

    pub fn footprints(&self) -> Option<&FootprintCollection> {
        self.footprints.as_ref()
    }

    /// the merged surface, merged fill and footprint collection.
    pub fn finish(self) -> (Option<Raster>, Option<Raster>, Option<FootprintCollection>) {
        (
            self.surface.map(MergedRaster::into_raster),
            self.fill.map(MergedRaster::into_raster),
            self.footprints,
        )
    }
}
