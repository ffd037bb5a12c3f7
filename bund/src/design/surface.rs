use bund_core::{
    geometry::{distance_to_points, Corridor},
    raster::{focal_mean, radius_in_cells, FocalCoverage, MaskGuard, Raster, RasterError},
};

use crate::{centreline::Centreline, config::DesignParameters, BundError};

/// the slope and end rules shaping a design surface from its crest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRule {
    pub batter: f64,
    pub taper: f64,
    pub maintain_crest: bool,
}

impl From<&DesignParameters> for SurfaceRule {
    fn from(params: &DesignParameters) -> Self {
        SurfaceRule {
            batter: params.batter,
            taper: params.taper,
            maintain_crest: params.maintain_crest,
        }
    }
}

/// everything the design elevation of a single cell depends on.
#[derive(Clone, Copy, Debug)]
pub struct CellInputs {
    /// crest elevation, NaN when undefined
    pub crest: f64,
    /// terrain elevation, NaN when undefined
    pub terrain: f64,
    /// distance from the cell centre to the crest zone, zero inside
    pub crest_distance: f64,
    /// distance from the cell centre to the nearest line end
    pub end_distance: f64,
}

/// the design elevation before it is compared against the terrain: the crest
/// falling off at the batter slope, blended towards the terrain near line ends.
pub fn raw_design(cell: &CellInputs, rule: &SurfaceRule) -> f64 {
    let design = cell.crest - cell.crest_distance / rule.batter;
    if rule.taper > 0.0 {
        let t = if cell.end_distance >= rule.taper {
            1.0
        } else {
            cell.end_distance / rule.taper
        };
        cell.terrain + (design - cell.terrain) * t
    } else {
        design
    }
}

/// the design elevation of a cell, NaN where the bund does not exist.
///
/// with maintain-crest, cells inside the crest zone carry the crest elevation even
/// when it lies below the terrain. every other cell is defined only where the
/// design rises above the terrain.
pub fn design_elevation(cell: &CellInputs, rule: &SurfaceRule) -> f64 {
    if cell.terrain.is_nan() {
        return f64::NAN;
    }
    if rule.maintain_crest && cell.crest_distance <= 0.0 {
        return cell.crest;
    }
    let design = raw_design(cell, rule);
    if design > cell.terrain {
        design
    } else {
        f64::NAN
    }
}

/// the rasters produced for one feature, on its mask window.
#[derive(Clone, Debug)]
pub struct FeatureSurface {
    pub surface: Raster,
    /// surface minus terrain, defined where the surface is
    pub fill: Raster,
    /// cells where a maintained crest lies below the terrain (negative fill)
    pub below_terrain_cells: usize,
}

pub struct DesignSurfaceSynthesizer<'a> {
    params: &'a DesignParameters,
}

impl<'a> DesignSurfaceSynthesizer<'a> {
    pub fn new(params: &'a DesignParameters) -> DesignSurfaceSynthesizer<'a> {
        DesignSurfaceSynthesizer { params }
    }

    pub fn synthesize(
        &self,
        guard: &MaskGuard<'_>,
        feature: &Centreline,
        crest: &Raster,
        terrain_window: &Raster,
    ) -> Result<FeatureSurface, BundError> {
        let window = *guard.window();
        for input in [crest, terrain_window] {
            if *input.spec() != window {
                return Err(RasterError::Misaligned(format!(
                    "design inputs must be on the mask window {window:?}, found {:?}",
                    input.spec()
                ))
                .into());
            }
        }
        let zone = Corridor::new(
            &feature.geometry,
            self.params.crest_half_width(window.cell_size),
        )?;
        let ends = zone.ends().to_vec();
        let rule = SurfaceRule::from(self.params);

        let surface = Raster::from_fn(window, |row, col, p| {
            let end_distance = if rule.taper > 0.0 {
                distance_to_points(&ends, p)
            } else {
                f64::INFINITY
            };
            let cell = CellInputs {
                crest: crest.value(row, col),
                terrain: terrain_window.value(row, col),
                crest_distance: zone.distance(p),
                end_distance,
            };
            design_elevation(&cell, &rule)
        });
        let surface = guard.restrict(surface)?;
        let surface = self.smooth(feature, surface);

        let fill = surface.zip_with(terrain_window, |s, t| s - t)?;
        let below_terrain_cells = fill.data().iter().filter(|v| **v < 0.0).count();
        if below_terrain_cells > 0 {
            log::warn!(
                "centreline {}: maintained crest lies below the terrain in {below_terrain_cells} cells, \
                 negative fill is kept in the fill raster",
                feature.source_id
            );
        }
        Ok(FeatureSurface {
            surface,
            fill,
            below_terrain_cells,
        })
    }

    /// optional focal mean over the defined cells. the set of defined cells does not
    /// change. on failure the unsmoothed surface is kept.
    fn smooth(&self, feature: &Centreline, surface: Raster) -> Raster {
        let radius = self.params.design_smoothing;
        if radius <= 0.0 {
            return surface;
        }
        let smoothed = radius_in_cells(radius, surface.spec().cell_size)
            .and_then(|cells| focal_mean(&surface, cells, FocalCoverage::PreserveDefined));
        match smoothed {
            Ok(s) => s,
            Err(e) => {
                log::warn!(
                    "centreline {}: design smoothing failed, using the unsmoothed surface: {e}",
                    feature.source_id
                );
                surface
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DesignConfig, SmoothingConfig};
    use bund_core::raster::{GridSpec, Mask, ProcessingEnv};
    use geo::{line_string, MultiLineString};

    const RULE: SurfaceRule = SurfaceRule {
        batter: 2.0,
        taper: 0.0,
        maintain_crest: false,
    };

    fn cell(crest: f64, terrain: f64, crest_distance: f64, end_distance: f64) -> CellInputs {
        CellInputs {
            crest,
            terrain,
            crest_distance,
            end_distance,
        }
    }

    #[test]
    fn test_batter_falloff_above_terrain() {
        // c - d/b at distance d
        for d in [0.0, 1.0, 4.0, 9.5] {
            let z = design_elevation(&cell(12.0, 5.0, d, f64::INFINITY), &RULE);
            assert!((z - (12.0 - d / 2.0)).abs() < 1e-12);
        }
        // exactly at terrain and below it the bund does not exist
        assert!(design_elevation(&cell(12.0, 5.0, 14.0, f64::INFINITY), &RULE).is_nan());
        assert!(design_elevation(&cell(12.0, 5.0, 20.0, f64::INFINITY), &RULE).is_nan());
        assert!(design_elevation(&cell(12.0, f64::NAN, 0.0, f64::INFINITY), &RULE).is_nan());
    }

    #[test]
    fn test_taper_blends_to_terrain_at_ends() {
        let rule = SurfaceRule { taper: 10.0, ..RULE };
        let at_end = raw_design(&cell(12.0, 5.0, 0.0, 0.0), &rule);
        assert!((at_end - 5.0).abs() < 1e-12);
        assert!(design_elevation(&cell(12.0, 5.0, 0.0, 0.0), &rule).is_nan());
        let halfway = raw_design(&cell(12.0, 5.0, 0.0, 5.0), &rule);
        assert!((halfway - 8.5).abs() < 1e-12);
        for de in [10.0, 25.0] {
            let untapered = raw_design(&cell(12.0, 5.0, 2.0, de), &rule);
            assert!((untapered - 11.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_maintain_crest_inside_zone_even_below_terrain() {
        let rule = SurfaceRule {
            maintain_crest: true,
            ..RULE
        };
        assert_eq!(design_elevation(&cell(4.0, 5.0, 0.0, 50.0), &rule), 4.0);
        // outside of the zone the usual rule applies
        assert!(design_elevation(&cell(4.0, 5.0, 1.0, 50.0), &rule).is_nan());
        let outside = design_elevation(&cell(8.0, 5.0, 2.0, 50.0), &rule);
        assert!((outside - 7.0).abs() < 1e-12);
        // with taper, the zone keeps the untapered crest
        let tapered = SurfaceRule { taper: 10.0, ..rule };
        assert_eq!(design_elevation(&cell(8.0, 5.0, 0.0, 0.0), &tapered), 8.0);
    }

    fn params(maintain_crest: bool, design_radius: f64, taper: f64) -> DesignParameters {
        let design = DesignConfig {
            mode: String::from("HagValue"),
            height_field: None,
            start_height: None,
            end_height: None,
            hag_field: None,
            hag_value: Some(1.0),
            crest_width: 4.0,
            maintain_crest,
            batter: 2.0,
            taper,
            strip_depth: 0.0,
            extra_buffer: 2.0,
            datum: String::new(),
            name_suffix: false,
            merge_by_id: false,
        };
        let smoothing = SmoothingConfig {
            crest_radius: 0.0,
            design_radius,
        };
        DesignParameters::new(&design, &smoothing).expect("test invariant failed: parameters")
    }

    fn line() -> MultiLineString<f64> {
        MultiLineString::new(vec![line_string![(x: 10.0, y: 30.0), (x: 50.0, y: 30.0)]])
    }

    fn synthesize(
        params: &DesignParameters,
        geometry: MultiLineString<f64>,
        terrain: &Raster,
        crest_z: f64,
    ) -> FeatureSurface {
        let feature = Centreline {
            source_id: 1,
            id: String::from("A"),
            geometry,
            attribute: None,
        };
        let mut env = ProcessingEnv::new(*terrain.spec());
        let reach = Corridor::new(&feature.geometry, params.reach())
            .expect("test invariant failed: reach corridor");
        let mask = Mask::from_fn(terrain.spec(), reach.bounds(), |p| reach.contains(p))
            .expect("test invariant failed: mask");
        let guard = env.apply_mask(mask);
        let terrain_window = guard.extract(terrain).expect("test invariant failed: window");
        let crest = guard
            .restrict(Raster::filled(*guard.window(), crest_z))
            .expect("test invariant failed: crest");
        DesignSurfaceSynthesizer::new(params)
            .synthesize(&guard, &feature, &crest, &terrain_window)
            .expect("surface should synthesize")
    }

    fn terrain() -> Raster {
        let spec = GridSpec::new(0.0, 60.0, 1.0, 60, 60).expect("test invariant failed: grid");
        Raster::filled(spec, 5.0)
    }

    #[test]
    fn test_fill_is_surface_minus_terrain() {
        let result = synthesize(&params(false, 0.0, 0.0), line(), &terrain(), 9.0);
        let spec = *result.surface.spec();
        let (row, col) = spec.cell_of(30.5, 30.5).expect("test invariant failed: cell");
        assert_eq!(result.surface.get(row, col), Some(9.0));
        assert_eq!(result.fill.get(row, col), Some(4.0));
        // 3.5m off the line the crest zone edge is 1.5m away: 9 - 0.75
        let (row, col) = spec.cell_of(30.5, 33.5).expect("test invariant failed: cell");
        assert!((result.surface.value(row, col) - 8.25).abs() < 1e-12);
        assert_eq!(result.below_terrain_cells, 0);
        assert_eq!(result.surface.defined_count(), result.fill.defined_count());
    }

    #[test]
    fn test_maintained_crest_below_terrain_reports_negative_fill() {
        let result = synthesize(&params(true, 0.0, 0.0), line(), &terrain(), 4.0);
        assert!(result.below_terrain_cells > 0);
        assert_eq!(result.surface.defined_count(), result.below_terrain_cells);
        assert!(result.fill.data().iter().all(|v| v.is_nan() || *v == -1.0));
    }

    #[test]
    fn test_design_smoothing_keeps_footprint() {
        let plain = synthesize(&params(false, 0.0, 0.0), line(), &terrain(), 9.0);
        let smoothed = synthesize(&params(false, 2.0, 0.0), line(), &terrain(), 9.0);
        assert_eq!(plain.surface.defined_count(), smoothed.surface.defined_count());
        for (a, b) in plain.surface.data().iter().zip(smoothed.surface.data()) {
            assert_eq!(a.is_nan(), b.is_nan());
        }
    }

    fn fill_at(result: &FeatureSurface, x: f64, y: f64) -> Option<f64> {
        let (row, col) = result.fill.spec().cell_of(x, y)?;
        result.fill.get(row, col)
    }

    #[test]
    fn test_taper_from_the_ends_of_every_part() {
        let parts = MultiLineString::new(vec![
            line_string![(x: 10.0, y: 20.0), (x: 50.0, y: 20.0)],
            line_string![(x: 10.0, y: 45.0), (x: 50.0, y: 45.0)],
        ]);
        let result = synthesize(&params(false, 0.0, 10.0), parts, &terrain(), 9.0);
        // half a cell diagonal from an end, 4 * sqrt(0.5) / 10 above terrain
        let near_end = 0.4 * 0.5_f64.sqrt();
        for (x, y) in [(10.5, 20.5), (49.5, 20.5), (10.5, 45.5), (49.5, 45.5)] {
            let depth = fill_at(&result, x, y).expect("cell near an end is filled");
            assert!((depth - near_end).abs() < 1e-9, "fill at ({x}, {y}): {depth}");
        }
        let partway = fill_at(&result, 15.5, 20.5).expect("tapered cell is filled");
        assert!((partway - 0.4 * 5.5_f64.hypot(0.5)).abs() < 1e-9);
        // at and past the taper distance the crest is untapered
        for x in [20.5, 30.5, 39.5] {
            assert_eq!(fill_at(&result, x, 20.5), Some(4.0));
            assert_eq!(fill_at(&result, x, 45.5), Some(4.0));
        }
    }

    #[test]
    fn test_failed_design_smoothing_keeps_unsmoothed_surface() {
        let plain = synthesize(&params(false, 0.0, 0.0), line(), &terrain(), 9.0);
        // a radius wider than the window cannot be applied
        let fallback = synthesize(&params(false, 500.0, 0.0), line(), &terrain(), 9.0);
        assert_eq!(plain.surface.spec(), fallback.surface.spec());
        for (a, b) in plain.surface.data().iter().zip(fallback.surface.data()) {
            assert!((a.is_nan() && b.is_nan()) || a == b);
        }
    }
}
