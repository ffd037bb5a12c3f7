use bund_core::{
    geometry::{sample_along, LineSample},
    interpolation::{InterpolatorConfig, PointInterpolator},
    raster::{focal_mean, radius_in_cells, FocalCoverage, MaskGuard, Raster},
};

use crate::{
    centreline::Centreline,
    config::{DesignMode, DesignParameters},
    BundError,
};

/// how the crest elevation of one feature is obtained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CrestPolicy {
    /// the same absolute elevation everywhere
    Constant(f64),
    /// linear in chainage from `start` at the beginning of the line to `end`
    Gradient { start: f64, end: f64 },
    /// a fixed height above the terrain under the line
    AboveGround(f64),
}

impl CrestPolicy {
    /// the policy of a feature, None when the feature lacks the value the design
    /// mode reads from it.
    pub fn for_feature(params: &DesignParameters, feature: &Centreline) -> Option<CrestPolicy> {
        match params.mode {
            DesignMode::ConstantAbsolute => feature.attribute.map(CrestPolicy::Constant),
            DesignMode::Gradient => Some(CrestPolicy::Gradient {
                start: params.start_height?,
                end: params.end_height?,
            }),
            DesignMode::HagField => feature.attribute.map(CrestPolicy::AboveGround),
            DesignMode::HagValue => params.hag_value.map(CrestPolicy::AboveGround),
        }
    }
}

/// builds the crest elevation field of a feature over its mask window.
pub struct CrestProfileBuilder<'a> {
    params: &'a DesignParameters,
}

impl<'a> CrestProfileBuilder<'a> {
    pub fn new(params: &'a DesignParameters) -> CrestProfileBuilder<'a> {
        CrestProfileBuilder { params }
    }

    /// `terrain` is the full terrain model, used to sample heights under the line;
    /// `terrain_window` is the terrain read through the mask.
    pub fn build(
        &self,
        guard: &MaskGuard<'_>,
        feature: &Centreline,
        policy: CrestPolicy,
        terrain: &Raster,
        terrain_window: &Raster,
    ) -> Result<Raster, BundError> {
        let window = *guard.window();
        let field = match policy {
            CrestPolicy::Constant(z) => Raster::filled(window, z),
            CrestPolicy::Gradient { start, end } => {
                let length = feature.length().max(0.0001);
                let samples = self.samples(feature, window.cell_size)?;
                let interpolator = PointInterpolator::new(
                    samples
                        .iter()
                        .map(|s| (s.point, start + (end - start) * (s.chainage / length))),
                    self.interpolator_config(),
                );
                Raster::from_fn(window, |_, _, p| {
                    interpolator.interpolate(p).unwrap_or(start)
                })
            }
            CrestPolicy::AboveGround(hag) => {
                let samples = self.samples(feature, window.cell_size)?;
                let interpolator = PointInterpolator::new(
                    samples.iter().filter_map(|s| {
                        let z = terrain.sample_bilinear(s.point.x, s.point.y)?;
                        Some((s.point, z + hag))
                    }),
                    self.interpolator_config(),
                );
                if interpolator.is_empty() {
                    log::warn!(
                        "centreline {}: no terrain under the line, crest follows the terrain cells",
                        feature.source_id
                    );
                }
                Raster::from_fn(window, |row, col, p| {
                    interpolator
                        .interpolate(p)
                        .unwrap_or_else(|| terrain_window.value(row, col) + hag)
                })
            }
        };
        let field = guard.restrict(field)?;
        Ok(self.smooth(guard, feature, field))
    }

    fn samples(&self, feature: &Centreline, cell_size: f64) -> Result<Vec<LineSample>, BundError> {
        let step = cell_size.max(2.0 * cell_size);
        Ok(sample_along(&feature.geometry, step)?)
    }

    fn interpolator_config(&self) -> InterpolatorConfig {
        InterpolatorConfig::default()
            .with_max_neighbors(8)
            .with_search_radius(self.params.reach())
    }

    /// focal mean of the crest field. on failure the unsmoothed field is kept.
    fn smooth(&self, guard: &MaskGuard<'_>, feature: &Centreline, field: Raster) -> Raster {
        let radius = self.params.crest_smoothing;
        if radius <= 0.0 {
            return field;
        }
        let smoothed = radius_in_cells(radius, field.spec().cell_size)
            .and_then(|cells| focal_mean(&field, cells, FocalCoverage::AnyNeighbour))
            .and_then(|s| guard.restrict(s));
        match smoothed {
            Ok(s) => s,
            Err(e) => {
                log::warn!(
                    "centreline {}: crest smoothing failed, using the unsmoothed crest: {e}",
                    feature.source_id
                );
                field
            }
        }
    }
}
