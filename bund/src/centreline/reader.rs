use std::path::Path;

use geo::{Geometry, MultiLineString};
use geojson::{Feature, GeoJson, JsonValue};

use super::Centreline;
use crate::BundError;

/// reads centrelines from a GeoJSON FeatureCollection of (multi)linestrings.
///
/// the id property and, when given, the numeric `carry_field` property must appear
/// on the collection. a carried value that is not a number fails the whole read,
/// a null value reads as None. features without geometry are skipped with a
/// warning, but keep their position in the source ids of the remaining features.
pub fn read_centrelines(
    path: &Path,
    id_field: &str,
    carry_field: Option<&str>,
) -> Result<Vec<Centreline>, BundError> {
    let geojson_str = std::fs::read_to_string(path).map_err(|e| BundError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let geojson_value = geojson_str
        .parse::<GeoJson>()
        .map_err(|e| BundError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let collection = match geojson_value {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(BundError::InvalidUserInput(format!(
                "geojson in '{}' must be a FeatureCollection",
                path.display()
            )))
        }
    };

    let has_field =
        |field: &str| collection.features.iter().any(|f| f.contains_property(field));
    if !collection.features.is_empty() {
        for field in std::iter::once(id_field).chain(carry_field) {
            if !has_field(field) {
                return Err(BundError::MissingField {
                    field: field.to_string(),
                    path: path.to_path_buf(),
                });
            }
        }
    }

    let mut centrelines = Vec::with_capacity(collection.features.len());
    for (n, feature) in collection.features.iter().enumerate() {
        let source_id = n as i64 + 1;
        let id = read_id(feature, id_field);
        let attribute = match carry_field {
            Some(field) => read_numeric(feature, field)?,
            None => None,
        };
        let geometry = match read_geometry(feature, source_id)? {
            Some(g) => g,
            None => {
                log::warn!("centreline {source_id} (id '{id}') has no geometry, skipping");
                continue;
            }
        };
        centrelines.push(Centreline {
            source_id,
            id,
            geometry,
            attribute,
        });
    }
    log::info!(
        "read {} centrelines from '{}'",
        centrelines.len(),
        path.display()
    );
    Ok(centrelines)
}

fn read_id(feature: &Feature, id_field: &str) -> String {
    match feature.property(id_field) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn read_numeric(feature: &Feature, field: &str) -> Result<Option<f64>, BundError> {
    match feature.property(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(BundError::WrongFieldType {
            field: field.to_string(),
            found: json_type_name(other).to_string(),
        }),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn read_geometry(
    feature: &Feature,
    source_id: i64,
) -> Result<Option<MultiLineString<f64>>, BundError> {
    let geom_json = match feature.geometry.clone() {
        Some(g) => g,
        None => return Ok(None),
    };
    let geometry: Geometry<f64> = geom_json.try_into().map_err(|e| {
        BundError::InvalidGeometry(format!(
            "failure decoding GeoJson geometry of centreline {source_id}: {e}"
        ))
    })?;
    match geometry {
        Geometry::LineString(line) => Ok(Some(MultiLineString::new(vec![line]))),
        Geometry::MultiLineString(lines) => Ok(Some(lines)),
        other => Err(BundError::InvalidGeometry(format!(
            "centreline {source_id} must be a line, found {}",
            geometry_type_name(&other)
        ))),
    }
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
