use std::path::Path;

use bund_core::{
    geometry::Corridor,
    raster::{read_ascii_grid, Mask, ProcessingEnv, Raster},
};
use indexmap::IndexMap;
use kdam::tqdm;

use crate::{
    centreline::{merge_by_id, read_centrelines, write_centrelines, Centreline},
    config::{BundConfig, DesignParameters},
    design::{
        CrestPolicy, CrestProfileBuilder, DesignSurfaceSynthesizer, FeatureAccumulator,
        FeatureSurface, FootprintMetrics, MaxWins, VolumeAggregator, VolumeRecord,
    },
    output::{
        fill_gaps, write_footprints, write_obj, write_raster, write_volumes_csv,
        write_volumes_json, OutputNames, RunSource, RunStats, RunSummary, SolidMesh,
    },
    util::fs::{create_dirs, require_exists, write_json},
    BundError,
};

/// runs a bund design.
///
/// every input is validated before the first feature is processed, so a
/// configuration error never leaves partial outputs behind. after validation,
/// failures of a single feature are logged and reported as a zero row.
pub fn run(config: &BundConfig) -> Result<RunSummary, BundError> {
    // validate
    if !config.capabilities.raster_analysis {
        return Err(BundError::MissingCapability(String::from("raster analysis")));
    }
    let params = DesignParameters::new(&config.design, &config.smoothing)?;
    let centrelines_path = Path::new(&config.centrelines);
    let terrain_path = Path::new(&config.terrain);
    let output_directory = Path::new(&config.output_directory);
    require_exists(centrelines_path, "centreline dataset")?;
    require_exists(terrain_path, "terrain raster")?;
    if !output_directory.is_dir() {
        return Err(BundError::MissingInput {
            kind: String::from("output directory"),
            path: output_directory.to_path_buf(),
        });
    }
    let centrelines = read_centrelines(centrelines_path, &config.id_field, params.carry_field())?;
    let terrain = read_ascii_grid(terrain_path)?;
    log::info!(
        "terrain grid: {} x {} cells of {} map units",
        terrain.spec().cols,
        terrain.spec().rows,
        terrain.spec().cell_size
    );

    let names = OutputNames::new(output_directory, centrelines_path, &params.output_suffix());
    let mut stats = RunStats {
        features_read: centrelines.len(),
        ..Default::default()
    };
    let mut outputs: IndexMap<String, String> = IndexMap::new();

    let features = if params.merge_by_id {
        let merged = merge_by_id(&centrelines);
        log::info!(
            "merged {} centrelines into {} by '{}'",
            centrelines.len(),
            merged.len(),
            config.id_field
        );
        let path = names.merged_centrelines();
        match write_centrelines(&merged, &config.id_field, params.carry_field(), &path) {
            Ok(()) => {
                outputs.insert(String::from("merged_centrelines"), path_string(&path));
            }
            Err(e) => log::warn!("could not save the merged centrelines: {e}"),
        }
        merged
    } else {
        centrelines
    };
    stats.features_merged = features.len();

    let toggles = &config.outputs;
    let mut per_feature = toggles.per_feature_surface;
    if per_feature {
        if let Err(e) = create_dirs(names.per_feature_directory()) {
            log::warn!("per-feature surfaces are not written: {e}");
            per_feature = false;
        }
    }

    // per-feature design and accumulation
    let mut env = ProcessingEnv::new(*terrain.spec());
    let mut accumulator = FeatureAccumulator::new(
        *terrain.spec(),
        MaxWins,
        toggles.merged_surface,
        toggles.merged_surface || toggles.fill_raster,
        toggles.footprint,
        params.strip_depth,
        &params.datum,
    );
    let mut rows: Vec<VolumeRecord> = Vec::with_capacity(features.len() + 1);
    let bar_iter = tqdm!(features.iter(), total = features.len(), desc = "design bunds");
    for feature in bar_iter {
        let Some(policy) = CrestPolicy::for_feature(&params, feature) else {
            log::warn!(
                "centreline {} (id '{}'): no {} value, skipped",
                feature.source_id,
                feature.id,
                params.carry_field().unwrap_or("design")
            );
            stats.features_skipped += 1;
            continue;
        };
        let result = match synthesize_feature(&mut env, &terrain, &params, feature, policy) {
            Ok(Some(result)) => result,
            Ok(None) => {
                log::warn!(
                    "centreline {} (id '{}'): reach does not overlap the terrain, reporting zero",
                    feature.source_id,
                    feature.id
                );
                stats.features_degraded += 1;
                rows.push(zero_row(feature, &params));
                continue;
            }
            Err(e) => {
                log::warn!(
                    "centreline {} (id '{}'): design failed, reporting zero: {e}",
                    feature.source_id,
                    feature.id
                );
                stats.features_degraded += 1;
                rows.push(zero_row(feature, &params));
                continue;
            }
        };
        stats.negative_fill_cells += result.below_terrain_cells;
        if per_feature {
            let path = names.per_feature_surface(feature.source_id);
            if let Err(e) = write_raster(&result.surface, &path) {
                log::warn!("centreline {}: per-feature surface not written: {e}", feature.source_id);
            }
        }
        let metrics = match accumulator.accumulate(&env, feature, &result)? {
            Some(metrics) => metrics,
            None => {
                stats.features_degraded += 1;
                FootprintMetrics::default()
            }
        };
        log::debug!(
            "centreline {} (id '{}'): {:.3} m2, {:.3} m3",
            feature.source_id,
            feature.id,
            metrics.area_m2,
            metrics.volume_m3
        );
        rows.push(VolumeRecord::for_feature(feature, &params, &metrics));
    }
    eprintln!();
    stats.features_processed = rows.len();
    if env.is_masked() {
        return Err(BundError::StaleMask);
    }
    let (merged_surface, merged_fill, footprints) = accumulator.finish();

    // rasters
    if let Some(surface) = merged_surface.as_ref() {
        let path = names.surface();
        write_raster(&fill_gaps(surface, &terrain)?, &path)?;
        outputs.insert(String::from("surface"), path_string(&path));
    }
    if let Some(fill) = merged_fill.as_ref() {
        let path = names.fill();
        write_raster(fill, &path)?;
        outputs.insert(String::from("fill"), path_string(&path));
    }

    // vectors
    if let Some(collection) = footprints.as_ref() {
        let path = names.footprint();
        write_footprints(collection, &path)?;
        outputs.insert(String::from("footprint"), path_string(&path));
    }
    if toggles.multipatch {
        let path = names.multipatch();
        match (config.capabilities.extrusion_3d, &footprints, &merged_surface, &merged_fill) {
            (false, _, _, _) => {
                log::warn!("3-D extrusion is not available, the bund solid is skipped")
            }
            (true, Some(_), Some(surface), Some(fill)) => {
                let written = SolidMesh::between(surface, &terrain, fill)
                    .and_then(|mesh| write_obj(&mesh, &params.datum, &path));
                match written {
                    Ok(()) => {
                        outputs.insert(String::from("multipatch"), path_string(&path));
                    }
                    Err(e) => log::warn!("bund solid creation failed: {e}"),
                }
            }
            _ => log::warn!(
                "the bund solid needs the footprint and the merged surface outputs, skipped"
            ),
        }
    }

    // tables
    let (totals, source) = VolumeAggregator::new(&params).totals(merged_fill.as_ref(), &rows);
    stats.set_totals(&totals, source);
    rows.push(totals);
    if toggles.csv {
        let csv_path = names.volumes_csv();
        match write_volumes_csv(&rows, &csv_path) {
            Ok(()) => {
                outputs.insert(String::from("volumes_csv"), path_string(&csv_path));
            }
            Err(e) => log::warn!("volumes CSV creation failed: {e}"),
        }
        let json_path = names.volumes_json();
        match write_volumes_json(&rows, &json_path) {
            Ok(()) => {
                outputs.insert(String::from("volumes_table"), path_string(&json_path));
            }
            Err(e) => log::warn!("volumes table creation failed: {e}"),
        }
    }

    let summary = RunSummary {
        source: RunSource::new(
            &config.centrelines,
            &config.terrain,
            params.mode.as_str(),
            &params.datum,
            params.merge_by_id,
        ),
        stats,
        outputs,
    };
    if let Err(e) = write_json(&summary, &names.summary()) {
        log::warn!("run summary not written: {e}");
    }
    log::info!(
        "bund design finished: {} features, total fill {:.3} m3 over {:.3} m2",
        summary.stats.features_processed,
        summary.stats.total_fill_volume_m3,
        summary.stats.total_fill_area_m2
    );
    Ok(summary)
}

/// builds the crest and design surface of one feature inside its processing mask.
/// None when the feature's reach does not cover any terrain cell. the mask is
/// cleared when this returns, on every path.
fn synthesize_feature(
    env: &mut ProcessingEnv,
    terrain: &Raster,
    params: &DesignParameters,
    feature: &Centreline,
    policy: CrestPolicy,
) -> Result<Option<FeatureSurface>, BundError> {
    let reach = Corridor::new(&feature.geometry, params.reach())?;
    let Some(mask) = Mask::from_fn(env.grid(), reach.bounds(), |p| reach.contains(p)) else {
        return Ok(None);
    };
    let guard = env.apply_mask(mask);
    let terrain_window = guard.extract(terrain)?;
    let crest = CrestProfileBuilder::new(params).build(
        &guard,
        feature,
        policy,
        terrain,
        &terrain_window,
    )?;
    let surface =
        DesignSurfaceSynthesizer::new(params).synthesize(&guard, feature, &crest, &terrain_window)?;
    Ok(Some(surface))
}

fn zero_row(feature: &Centreline, params: &DesignParameters) -> VolumeRecord {
    VolumeRecord::for_feature(feature, params, &FootprintMetrics::default())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
