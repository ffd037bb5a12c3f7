use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::{design::FootprintCollection, BundError};

/// writes the dissolved footprints with their `id`, `area_ha` and `datum`.
pub fn write_footprints(collection: &FootprintCollection, path: &Path) -> Result<(), BundError> {
    let features = collection
        .entries()
        .iter()
        .map(|entry| {
            let mut properties = JsonObject::new();
            properties.insert(String::from("id"), JsonValue::from(entry.id.clone()));
            properties.insert(String::from("area_ha"), JsonValue::from(entry.area_ha));
            properties.insert(String::from("datum"), JsonValue::from(entry.datum.clone()));
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&entry.polygon))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    let geojson = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    std::fs::write(path, geojson.to_string()).map_err(|e| BundError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    log::info!(
        "wrote {} footprints to '{}'",
        collection.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::derive_footprint;
    use bund_core::raster::{GridSpec, Raster};

    #[test]
    fn test_footprint_properties() {
        let spec = GridSpec::new(0.0, 100.0, 10.0, 10, 10).expect("test invariant failed: grid");
        let fill = Raster::from_fn(spec, |row, _, _| if row < 5 { 1.0 } else { f64::NAN });
        let footprint = derive_footprint(&fill, 0.0).expect("test invariant failed: footprint");
        let mut collection = FootprintCollection::new();
        collection.push("north", "AHD", &footprint);

        let dir = std::env::temp_dir().join(format!("bund-footprint-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("test invariant failed: temp dir");
        let path = dir.join("footprint.geojson");
        write_footprints(&collection, &path).expect("should write");
        let text = std::fs::read_to_string(&path).expect("test invariant failed: read back");
        let geojson: GeoJson = text.parse().expect("valid geojson");
        let GeoJson::FeatureCollection(fc) = geojson else {
            panic!("expected a feature collection");
        };
        assert_eq!(fc.features.len(), 1);
        let feature = &fc.features[0];
        assert_eq!(feature.property("id"), Some(&JsonValue::from("north")));
        assert_eq!(feature.property("datum"), Some(&JsonValue::from("AHD")));
        let area_ha = feature
            .property("area_ha")
            .and_then(|v| v.as_f64())
            .expect("area_ha should be numeric");
        assert!((area_ha - 0.5).abs() < 1e-9);
        let _ = std::fs::remove_dir_all(dir);
    }
}
