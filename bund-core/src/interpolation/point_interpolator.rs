//! scattered point interpolation onto raster cells.
//!
//! samples are indexed in an R-tree; a query gathers the nearest samples within the
//! search radius and blends them with inverse distance weights. queries with no
//! sample in range are outside the interpolation domain and return None, which lets
//! callers substitute their own fallback value.

use geo::Coord;
use rstar::{primitives::GeomWithData, RTree};
use serde::{Deserialize, Serialize};

type Sample = GeomWithData<[f64; 2], f64>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InterpolatorConfig {
    /// inverse distance exponent
    pub power: f64,
    /// number of nearest samples blended per query
    pub max_neighbors: usize,
    /// samples farther than this are ignored. None means unlimited
    pub search_radius: Option<f64>,
    /// queries closer than this to a sample return the sample value
    pub distance_tolerance: f64,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_neighbors: 8,
            search_radius: None,
            distance_tolerance: 1e-10,
        }
    }
}

impl InterpolatorConfig {
    pub fn with_search_radius(mut self, radius: f64) -> Self {
        self.search_radius = Some(radius);
        self
    }

    pub fn with_max_neighbors(mut self, n: usize) -> Self {
        self.max_neighbors = n;
        self
    }
}

pub struct PointInterpolator {
    tree: RTree<Sample>,
    config: InterpolatorConfig,
}

impl PointInterpolator {
    /// builds the interpolator. samples with non-finite values are dropped.
    pub fn new<I>(samples: I, config: InterpolatorConfig) -> PointInterpolator
    where
        I: IntoIterator<Item = (Coord<f64>, f64)>,
    {
        let points: Vec<Sample> = samples
            .into_iter()
            .filter(|(c, v)| v.is_finite() && c.x.is_finite() && c.y.is_finite())
            .map(|(c, v)| GeomWithData::new([c.x, c.y], v))
            .collect();
        PointInterpolator {
            tree: RTree::bulk_load(points),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// interpolated value at a location, None outside of the interpolation domain.
    pub fn interpolate(&self, p: Coord<f64>) -> Option<f64> {
        let max_d2 = self.config.search_radius.map(|r| r * r);
        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        let neighbors = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[p.x, p.y])
            .take(self.config.max_neighbors.max(1));
        for (sample, d2) in neighbors {
            if max_d2.is_some_and(|max| d2 > max) {
                break;
            }
            let d = d2.sqrt();
            if d <= self.config.distance_tolerance {
                return Some(sample.data);
            }
            let w = 1.0 / d.powf(self.config.power);
            weight_sum += w;
            value_sum += w * sample.data;
        }
        if weight_sum > 0.0 {
            Some(value_sum / weight_sum)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn test_exact_hit_returns_sample() {
        let interp = PointInterpolator::new(
            vec![(c(0.0, 0.0), 1.0), (c(10.0, 0.0), 3.0)],
            InterpolatorConfig::default(),
        );
        assert_eq!(interp.interpolate(c(10.0, 0.0)), Some(3.0));
        assert_eq!(interp.len(), 2);
    }

    #[test]
    fn test_symmetric_samples_average() {
        let interp = PointInterpolator::new(
            vec![(c(0.0, 0.0), 10.0), (c(10.0, 0.0), 12.0)],
            InterpolatorConfig::default(),
        );
        let v = interp.interpolate(c(5.0, 7.0)).expect("in range");
        assert!((v - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_outside_search_radius_is_none() {
        let interp = PointInterpolator::new(
            vec![(c(0.0, 0.0), 1.0)],
            InterpolatorConfig::default().with_search_radius(5.0),
        );
        assert_eq!(interp.interpolate(c(3.0, 3.0)), Some(1.0));
        assert_eq!(interp.interpolate(c(6.0, 0.0)), None);
    }

    #[test]
    fn test_drops_non_finite_values() {
        let interp = PointInterpolator::new(
            vec![(c(0.0, 0.0), f64::NAN)],
            InterpolatorConfig::default(),
        );
        assert!(interp.is_empty());
        assert_eq!(interp.interpolate(c(0.0, 0.0)), None);
    }
}
