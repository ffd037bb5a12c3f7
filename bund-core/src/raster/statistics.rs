use serde::{Deserialize, Serialize};

/// summary of the defined cells of a raster, written next to output rasters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct RasterStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
}

impl RasterStatistics {
    /// computes statistics while skipping NaN values.
    pub fn from_values<I>(values: I) -> Option<RasterStatistics>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        if count == 0 {
            return None;
        }
        Some(RasterStatistics {
            count,
            min,
            max,
            mean: sum / count as f64,
            sum,
        })
    }
}
