use geojson::GeoJson;
use serde_json::Value;

use super::Parsed;
use crate::error::{IngestError, Result};
use crate::feature::{Feature, FeatureCollection, SourceFormat};

/// A `FeatureCollection` passes through, a bare `Feature` is wrapped.
pub(crate) fn parse_geojson(bytes: &[u8]) -> Result<Parsed> {
    let value: Value = serde_json::from_slice(bytes)?;

    let found = match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") | Some("Feature") => None,
        Some(other) => Some(other.to_string()),
        None => Some("no type member".to_string()),
    };
    if let Some(found) = found {
        return Err(IngestError::InvalidGeoJson { found });
    }

    let mut collection = FeatureCollection::new(SourceFormat::GeoJson);
    let features = match GeoJson::try_from(value)? {
        GeoJson::FeatureCollection(fc) => {
            collection.bbox = fc.bbox;
            collection.foreign_members = fc.foreign_members;
            fc.features
        }
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(IngestError::InvalidGeoJson {
                found: "Geometry".to_string(),
            })
        }
    };

    collection.features = features
        .into_iter()
        .map(Feature::from_geojson)
        .collect::<std::result::Result<_, _>>()?;

    Ok(Parsed {
        detected_geometry: collection.detected_kind(),
        collection,
        dropped_rows: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::GeometryKind;
    use assert_matches::assert_matches;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "a"},
             "geometry": {"type": "LineString", "coordinates": [[72.82, 19.08], [72.83, 19.09]]}},
            {"type": "Feature", "properties": {"name": "b"},
             "geometry": {"type": "LineString", "coordinates": [[72.84, 19.10], [72.85, 19.11]]}}
        ]
    }"#;

    #[test]
    fn feature_collection_passes_through() {
        let parsed = parse_geojson(COLLECTION.as_bytes()).unwrap();
        assert_eq!(parsed.collection.len(), 2);
        assert_eq!(parsed.detected_geometry, GeometryKind::LineString);
        assert!(parsed
            .collection
            .features
            .iter()
            .all(|f| f.kind() == Some(GeometryKind::LineString)));
        assert_eq!(parsed.collection.features[1].property("name").unwrap(), "b");
    }

    #[test]
    fn extra_members_and_null_properties_survive() {
        let json = r#"{"type": "FeatureCollection", "bbox": [72.8, 19.0, 72.9, 19.2], "source": "survey",
            "features": [
                {"type": "Feature", "properties": null, "foo": "bar", "bbox": [72.8, 19.1, 72.8, 19.1],
                 "geometry": {"type": "Point", "coordinates": [72.8, 19.1]}}
            ]}"#;
        let parsed = parse_geojson(json.as_bytes()).unwrap();
        let out = serde_json::to_value(parsed.collection.to_geojson()).unwrap();

        assert_eq!(out["bbox"], serde_json::json!([72.8, 19.0, 72.9, 19.2]));
        assert_eq!(out["source"], "survey");
        let feature = &out["features"][0];
        assert!(feature.get("properties").is_some());
        assert_eq!(feature["properties"], Value::Null);
        assert_eq!(feature["foo"], "bar");
        assert_eq!(feature["bbox"], serde_json::json!([72.8, 19.1, 72.8, 19.1]));
        assert_eq!(feature["geometry"]["coordinates"][0], 72.8);
    }

    #[test]
    fn bare_feature_is_wrapped() {
        let json = r#"{"type": "Feature", "properties": null,
                       "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}"#;
        let parsed = parse_geojson(json.as_bytes()).unwrap();
        assert_eq!(parsed.collection.len(), 1);
        assert_eq!(parsed.detected_geometry, GeometryKind::Polygon);
    }

    #[test]
    fn empty_collection_is_mixed() {
        let parsed = parse_geojson(br#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(parsed.collection.is_empty());
        assert_eq!(parsed.detected_geometry, GeometryKind::Mixed);
    }

    #[test]
    fn bare_geometry_is_invalid() {
        assert_matches!(
            parse_geojson(br#"{"type": "Point", "coordinates": [1, 2]}"#),
            Err(IngestError::InvalidGeoJson { found }) if found == "Point"
        );
        assert_matches!(parse_geojson(b"[1, 2]"), Err(IngestError::InvalidGeoJson { .. }));
    }

    #[test]
    fn syntax_error_is_processing_failure() {
        assert_matches!(parse_geojson(b"{\"type\": "), Err(IngestError::ProcessingFailed(_)));
    }
}
