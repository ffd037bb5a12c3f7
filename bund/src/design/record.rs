use serde::{Deserialize, Serialize};

use super::FootprintMetrics;
use crate::{
    centreline::Centreline,
    config::{DesignMode, DesignParameters},
};

/// source id of the totals row.
pub const TOTALS_SOURCE_ID: i64 = -1;
/// centreline id of the totals row.
pub const TOTALS_ID: &str = "__TOTAL__";

/// one row of the volumes table. values that do not apply to the design mode
/// (or to the totals row) are None and written blank.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VolumeRecord {
    #[serde(rename = "sourceId")]
    pub source_id: i64,
    #[serde(rename = "centrelineId")]
    pub centreline_id: String,
    pub length_m: Option<f64>,
    pub mode: String,
    pub hag_m: Option<f64>,
    #[serde(rename = "crestField_m")]
    pub crest_field_m: Option<f64>,
    #[serde(rename = "startH_m")]
    pub start_h_m: Option<f64>,
    #[serde(rename = "endH_m")]
    pub end_h_m: Option<f64>,
    #[serde(rename = "crestWidth_m")]
    pub crest_width_m: f64,
    #[serde(rename = "batterHperV")]
    pub batter_h_per_v: f64,
    #[serde(rename = "endTaper_m")]
    pub end_taper_m: f64,
    #[serde(rename = "maintainCrest")]
    pub maintain_crest: bool,
    #[serde(rename = "stripDepth_m")]
    pub strip_depth_m: f64,
    #[serde(rename = "fillArea_m2")]
    pub fill_area_m2: f64,
    #[serde(rename = "fillVolume_m3")]
    pub fill_volume_m3: f64,
    #[serde(rename = "stripVolume_m3")]
    pub strip_volume_m3: f64,
    #[serde(rename = "vertDatum")]
    pub vert_datum: String,
}

impl VolumeRecord {
    pub fn for_feature(
        feature: &Centreline,
        params: &DesignParameters,
        metrics: &FootprintMetrics,
    ) -> VolumeRecord {
        let hag_m = match params.mode {
            DesignMode::HagField => feature.attribute,
            DesignMode::HagValue => params.hag_value,
            _ => None,
        };
        let crest_field_m = match params.mode {
            DesignMode::ConstantAbsolute => feature.attribute,
            _ => None,
        };
        VolumeRecord {
            source_id: feature.source_id,
            centreline_id: feature.id.clone(),
            length_m: Some(feature.length()),
            hag_m,
            crest_field_m,
            ..VolumeRecord::common(params, metrics)
        }
    }

    /// the final row of the table.
    pub fn totals(params: &DesignParameters, metrics: &FootprintMetrics) -> VolumeRecord {
        let hag_m = match params.mode {
            DesignMode::HagValue => params.hag_value,
            _ => None,
        };
        VolumeRecord {
            hag_m,
            ..VolumeRecord::common(params, metrics)
        }
    }

    pub fn is_totals(&self) -> bool {
        self.source_id == TOTALS_SOURCE_ID && self.centreline_id == TOTALS_ID
    }

    pub fn metrics(&self) -> FootprintMetrics {
        FootprintMetrics {
            area_m2: self.fill_area_m2,
            volume_m3: self.fill_volume_m3,
            strip_m3: self.strip_volume_m3,
        }
    }

    fn common(params: &DesignParameters, metrics: &FootprintMetrics) -> VolumeRecord {
        let gradient = params.mode == DesignMode::Gradient;
        VolumeRecord {
            source_id: TOTALS_SOURCE_ID,
            centreline_id: TOTALS_ID.to_string(),
            length_m: None,
            mode: params.mode.to_string(),
            hag_m: None,
            crest_field_m: None,
            start_h_m: params.start_height.filter(|_| gradient),
            end_h_m: params.end_height.filter(|_| gradient),
            crest_width_m: params.crest_width,
            batter_h_per_v: params.batter,
            end_taper_m: params.taper,
            maintain_crest: params.maintain_crest,
            strip_depth_m: params.strip_depth,
            fill_area_m2: metrics.area_m2,
            fill_volume_m3: metrics.volume_m3,
            strip_volume_m3: metrics.strip_m3,
            vert_datum: params.datum.clone(),
        }
    }
}
