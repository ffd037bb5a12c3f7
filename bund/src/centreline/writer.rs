use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

use super::Centreline;
use crate::BundError;

/// writes centrelines as a GeoJSON FeatureCollection carrying the id and, when
/// given, the carried numeric property.
pub fn write_centrelines(
    centrelines: &[Centreline],
    id_field: &str,
    carry_field: Option<&str>,
    path: &Path,
) -> Result<(), BundError> {
    let features = centrelines
        .iter()
        .map(|c| {
            let mut properties = JsonObject::new();
            properties.insert(id_field.to_string(), JsonValue::from(c.id.clone()));
            if let Some(field) = carry_field {
                properties.insert(field.to_string(), JsonValue::from(c.attribute));
            }
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&c.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    std::fs::write(path, collection.to_string()).map_err(|e| BundError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
