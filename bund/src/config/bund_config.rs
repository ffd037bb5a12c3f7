use std::path::Path;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::BundError;

/// top-level configuration of a bund design run, read from a TOML file.
///
/// ```toml
/// centrelines = "data/bunds.geojson"
/// id_field = "bund_id"
/// terrain = "data/dem.asc"
/// output_directory = "out"
///
/// [design]
/// mode = "Gradient"
/// start_height = 10.0
/// end_height = 12.0
/// crest_width = 4.0
/// batter = 2.0
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BundConfig {
    /// GeoJSON FeatureCollection of centreline (multi)linestrings
    pub centrelines: String,
    /// property identifying each centreline, also used to group features when
    /// merging by id
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// ESRI ASCII grid terrain model. its grid is the snap grid of the run
    pub terrain: String,
    /// existing directory receiving every output
    pub output_directory: String,
    pub design: DesignConfig,
    #[serde(default)]
    pub outputs: OutputToggles,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub capabilities: Capabilities,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DesignConfig {
    /// one of ConstantAbsolute, Gradient, HagField, HagValue
    pub mode: String,
    /// numeric property holding the absolute crest height (ConstantAbsolute)
    pub height_field: Option<String>,
    /// crest height at the start of each line (Gradient)
    pub start_height: Option<f64>,
    /// crest height at the end of each line (Gradient)
    pub end_height: Option<f64>,
    /// numeric property holding the height above ground (HagField)
    pub hag_field: Option<String>,
    /// height above ground shared by every line (HagValue)
    pub hag_value: Option<f64>,
    #[serde(default = "default_crest_width")]
    pub crest_width: f64,
    /// keep the crest at design height even where it falls below terrain
    #[serde(default)]
    pub maintain_crest: bool,
    /// horizontal run per unit of vertical rise
    #[serde(default = "default_batter")]
    pub batter: f64,
    /// distance over which the bund tapers down to terrain at line ends
    #[serde(default)]
    pub taper: f64,
    /// topsoil strip depth used for strip volume estimates
    #[serde(default)]
    pub strip_depth: f64,
    /// extra distance added to the per-feature processing reach
    #[serde(default = "default_extra_buffer")]
    pub extra_buffer: f64,
    /// vertical datum label carried into outputs
    #[serde(default)]
    pub datum: String,
    /// append `_<datum>` to output names
    #[serde(default)]
    pub name_suffix: bool,
    /// dissolve centrelines sharing an id before processing
    #[serde(default)]
    pub merge_by_id: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OutputToggles {
    #[serde(default = "default_true")]
    pub merged_surface: bool,
    #[serde(default)]
    pub per_feature_surface: bool,
    #[serde(default = "default_true")]
    pub fill_raster: bool,
    #[serde(default)]
    pub multipatch: bool,
    #[serde(default = "default_true")]
    pub footprint: bool,
    #[serde(default = "default_true")]
    pub csv: bool,
}

impl Default for OutputToggles {
    fn default() -> Self {
        Self {
            merged_surface: true,
            per_feature_surface: false,
            fill_raster: true,
            multipatch: false,
            footprint: true,
            csv: true,
        }
    }
}

/// focal mean radii, in map units. zero disables a pass.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SmoothingConfig {
    #[serde(default = "default_crest_smoothing")]
    pub crest_radius: f64,
    #[serde(default)]
    pub design_radius: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            crest_radius: default_crest_smoothing(),
            design_radius: 0.0,
        }
    }
}

/// processing capabilities available to this run. raster analysis is required;
/// without 3-D extrusion the solid output is skipped.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Capabilities {
    #[serde(default = "default_true")]
    pub raster_analysis: bool,
    #[serde(default = "default_true")]
    pub extrusion_3d: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            raster_analysis: true,
            extrusion_3d: true,
        }
    }
}

impl BundConfig {
    pub fn from_file(filepath: &Path) -> Result<BundConfig, BundError> {
        let config = Config::builder()
            .add_source(File::from(filepath))
            .build()
            .map_err(|e| {
                let msg = format!("file '{}' produced error: {e}", filepath.display());
                BundError::InvalidUserInput(msg)
            })?;
        config.try_deserialize::<BundConfig>().map_err(|e| {
            let msg = format!(
                "error reading bund configuration from '{}': {e}",
                filepath.display()
            );
            BundError::InvalidUserInput(msg)
        })
    }
}

fn default_id_field() -> String {
    String::from("id")
}

fn default_crest_width() -> f64 {
    2.0
}

fn default_batter() -> f64 {
    5.0
}

fn default_extra_buffer() -> f64 {
    20.0
}

fn default_crest_smoothing() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}
