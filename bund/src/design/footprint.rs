use bund_core::{geometry::polygonize_cells, raster::Raster};
use geo::{Area, MultiPolygon};
use serde::Serialize;
use uom::si::{
    area::{hectare, square_meter},
    f64::Area as AreaQuantity,
};

use crate::BundError;

/// relative tolerance between the polygon area and the cell count area.
const AREA_TOLERANCE: f64 = 1e-6;

/// area and volumes of a fill footprint.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct FootprintMetrics {
    pub area_m2: f64,
    pub volume_m3: f64,
    pub strip_m3: f64,
}

impl FootprintMetrics {
    pub fn add(&self, other: &FootprintMetrics) -> FootprintMetrics {
        FootprintMetrics {
            area_m2: self.area_m2 + other.area_m2,
            volume_m3: self.volume_m3 + other.volume_m3,
            strip_m3: self.strip_m3 + other.strip_m3,
        }
    }
}

/// the dissolved cells with positive fill.
#[derive(Clone, Debug)]
pub struct Footprint {
    pub polygon: MultiPolygon<f64>,
    pub cell_count: usize,
    pub metrics: FootprintMetrics,
}

/// derives the footprint of a fill raster: cells with fill > 0 dissolved into one
/// polygon, its area, the fill volume over it and the strip volume.
pub fn derive_footprint(fill: &Raster, strip_depth: f64) -> Result<Footprint, BundError> {
    let spec = fill.spec();
    let polygon = polygonize_cells(fill, |v| v > 0.0);
    let (cell_count, depth_sum) = fill
        .data()
        .iter()
        .filter(|v| **v > 0.0)
        .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    let area_m2 = polygon.unsigned_area();
    let expected = cell_count as f64 * spec.cell_area();
    if (area_m2 - expected).abs() > AREA_TOLERANCE * expected.max(1.0) {
        return Err(BundError::FootprintError(format!(
            "dissolved footprint area {area_m2} does not match the {cell_count} filled cells ({expected})"
        )));
    }
    let volume_m3 = depth_sum * spec.cell_area();
    if !volume_m3.is_finite() {
        return Err(BundError::FootprintError(format!(
            "fill volume is not a finite number ({volume_m3})"
        )));
    }
    Ok(Footprint {
        polygon,
        cell_count,
        metrics: FootprintMetrics {
            area_m2,
            volume_m3,
            strip_m3: area_m2 * strip_depth,
        },
    })
}

/// one dissolved footprint of the output collection.
#[derive(Clone, Debug)]
pub struct FootprintEntry {
    pub id: String,
    pub area_ha: f64,
    pub datum: String,
    pub polygon: MultiPolygon<f64>,
}

/// footprints of every processed feature, in processing order.
#[derive(Clone, Debug, Default)]
pub struct FootprintCollection {
    entries: Vec<FootprintEntry>,
}

impl FootprintCollection {
    pub fn new() -> FootprintCollection {
        FootprintCollection::default()
    }

    /// appends a footprint. empty footprints are not recorded.
    pub fn push(&mut self, id: &str, datum: &str, footprint: &Footprint) {
        if footprint.polygon.0.is_empty() {
            return;
        }
        let area = AreaQuantity::new::<square_meter>(footprint.metrics.area_m2);
        self.entries.push(FootprintEntry {
            id: id.to_string(),
            area_ha: area.get::<hectare>(),
            datum: datum.to_string(),
            polygon: footprint.polygon.clone(),
        });
    }

    pub fn entries(&self) -> &[FootprintEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bund_core::raster::GridSpec;

    #[test]
    fn test_footprint_of_positive_fill() {
        let spec = GridSpec::new(0.0, 4.0, 2.0, 2, 3).expect("test invariant failed: grid");
        let fill = Raster::from_vec(spec, vec![1.0, 2.0, f64::NAN, -0.5, 0.5, 0.0])
            .expect("test invariant failed: fill");
        let footprint = derive_footprint(&fill, 0.1).expect("footprint");
        assert_eq!(footprint.cell_count, 3);
        assert!((footprint.metrics.area_m2 - 12.0).abs() < 1e-9);
        assert!((footprint.metrics.volume_m3 - 14.0).abs() < 1e-9);
        assert!((footprint.metrics.strip_m3 - 1.2).abs() < 1e-9);
        assert_eq!(footprint.polygon.0.len(), 1);
    }

    #[test]
    fn test_empty_footprint_is_not_collected() {
        let spec = GridSpec::new(0.0, 1.0, 1.0, 1, 1).expect("test invariant failed: grid");
        let footprint = derive_footprint(&Raster::empty(spec), 0.0).expect("footprint");
        assert_eq!(footprint.metrics, FootprintMetrics::default());
        let mut collection = FootprintCollection::new();
        collection.push("A", "AHD", &footprint);
        assert!(collection.is_empty());
    }

    #[test]
    fn test_area_in_hectares() {
        let spec = GridSpec::new(0.0, 100.0, 100.0, 1, 2).expect("test invariant failed: grid");
        let fill = Raster::filled(spec, 1.0);
        let footprint = derive_footprint(&fill, 0.0).expect("footprint");
        let mut collection = FootprintCollection::new();
        collection.push("A", "AHD", &footprint);
        assert_eq!(collection.len(), 1);
        assert!((collection.entries()[0].area_ha - 2.0).abs() < 1e-9);
    }
}
