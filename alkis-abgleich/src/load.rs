//! Loading canonical address records from per-state GeoJSON dumps
//!
//! The extraction collaborators write one FeatureCollection per dataset
//! with point geometries in WGS84 and the record fields as properties.

use std::path::Path;

use abgleich::{AbgleichError, AddressRecord};
use anyhow::{Context, Result};
use geo::Point;
use geojson::{FeatureCollection, GeoJson, Value as GeoJsonValue};
use tracing::{debug, warn};

/// Fallback district when the extraction did not assign one
const DEFAULT_DISTRICT: &str = "Global";

/// Reads one dataset. Features without a usable point geometry or without
/// street/housenumber properties are dropped, not errors.
pub fn load_records(path: &Path, state: &str) -> Result<Vec<AddressRecord>> {
    if !path.exists() {
        return Err(AbgleichError::missing_input(path).into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON {}", path.display()))?;
    let collection = FeatureCollection::try_from(geojson)
        .with_context(|| format!("{} is not a FeatureCollection", path.display()))?;

    let mut records = Vec::with_capacity(collection.features.len());
    let mut skipped_geometry = 0usize;
    let mut skipped_fields = 0usize;

    for feature in collection.features {
        let Some(point) = point_of(feature.geometry.as_ref()) else {
            skipped_geometry += 1;
            continue;
        };
        let (Some(street), Some(housenumber)) = (
            property_string(&feature, "street"),
            property_string(&feature, "housenumber"),
        ) else {
            skipped_fields += 1;
            continue;
        };

        let district =
            property_string(&feature, "district").unwrap_or_else(|| DEFAULT_DISTRICT.to_string());
        let mut record = AddressRecord::new(street, housenumber, district, state, point);
        record.postcode = property_string(&feature, "postcode");
        record.city = property_string(&feature, "city");
        record.alkis_id = property_string(&feature, "alkis_id");
        records.push(record);
    }

    if skipped_geometry > 0 || skipped_fields > 0 {
        warn!(
            path = %path.display(),
            skipped_geometry,
            skipped_fields,
            "dropped unusable features"
        );
    }
    debug!(path = %path.display(), records = records.len(), "loaded dataset");
    Ok(records)
}

/// Extracts a finite point from a feature geometry
fn point_of(geometry: Option<&geojson::Geometry>) -> Option<Point<f64>> {
    let geometry = geometry?;
    let GeoJsonValue::Point(position) = &geometry.value else {
        return None;
    };
    let (&x, &y) = (position.first()?, position.get(1)?);
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Point::new(x, y))
}

fn property_string(feature: &geojson::Feature, key: &str) -> Option<String> {
    feature
        .properties
        .as_ref()
        .and_then(|properties| properties.get(key))
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("abgleich_load_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_basic_collection() {
        let path = write_temp(
            "basic.geojson",
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[9.7,52.4]},
                 "properties":{"street":"Hauptstraße","housenumber":"1","district":"Hannover","city":"Hannover","alkis_id":"a1"}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[9.8,52.5]},
                 "properties":{"street":"Ring","housenumber":"2"}}
            ]}"#,
        );
        let records = load_records(&path, "nds").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].street, "Hauptstraße");
        assert_eq!(records[0].district, "Hannover");
        assert_eq!(records[0].alkis_id.as_deref(), Some("a1"));
        assert_eq!(records[1].district, "Global");
        assert_eq!(records[1].state, "nds");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unusable_features_dropped() {
        let path = write_temp(
            "partial.geojson",
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":null,"properties":{"street":"A","housenumber":"1"}},
                {"type":"Feature","geometry":{"type":"LineString","coordinates":[[9.7,52.4],[9.8,52.5]]},
                 "properties":{"street":"B","housenumber":"2"}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[9.7,52.4]},
                 "properties":{"housenumber":"3"}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[9.7,52.4]},
                 "properties":{"street":"C","housenumber":"4"}}
            ]}"#,
        );
        let records = load_records(&path, "nds").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].street, "C");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_error() {
        let path = std::env::temp_dir().join("abgleich_load_no_such_file.geojson");
        assert!(load_records(&path, "nds").is_err());
    }
}
