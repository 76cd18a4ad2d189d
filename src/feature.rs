//! Canonical feature model shared by every ingestion branch.
//!
//! Geometries are `geo` geometries in `[longitude, latitude]` order. Properties
//! are a JSON object whose keys keep their source order.

use std::fmt;

use geo::Geometry;
use geojson::{feature::Id, Bbox, JsonObject};
use serde::Serialize;
use serde_json::Value;

/// Format a collection was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceFormat {
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "GeoJSON")]
    GeoJson,
    #[serde(rename = "Shapefile (ZIP)")]
    ShapefileZip,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::GeoJson => "GeoJSON",
            SourceFormat::ShapefileZip => "Shapefile (ZIP)",
        };
        f.write_str(name)
    }
}

/// GeoJSON geometry type name, or `Mixed` when a collection has no single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Mixed,
}

impl GeometryKind {
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// `bbox` and `foreign_members` are carried through unchanged from GeoJSON
/// input. `properties` stays `None` when the source had `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<Id>,
    pub bbox: Option<Bbox>,
    pub geometry: Option<Geometry<f64>>,
    pub properties: Option<JsonObject>,
    pub foreign_members: Option<JsonObject>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>, properties: JsonObject) -> Self {
        let mut feature = Feature::new_untyped(Some(geometry));
        feature.properties = Some(properties);
        feature
    }

    /// Feature with an optional geometry and no properties member.
    pub fn new_untyped(geometry: Option<Geometry<f64>>) -> Self {
        Feature {
            id: None,
            bbox: None,
            geometry,
            properties: None,
            foreign_members: None,
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(GeometryKind::of)
    }

    /// Converts a GeoJSON feature. Fails on geometries `geo` cannot represent.
    pub fn from_geojson(feature: geojson::Feature) -> Result<Self, geojson::Error> {
        let geometry = feature.geometry.map(Geometry::<f64>::try_from).transpose()?;
        Ok(Feature {
            id: feature.id,
            bbox: feature.bbox,
            geometry,
            properties: feature.properties,
            foreign_members: feature.foreign_members,
        })
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: self.bbox.clone(),
            geometry: self
                .geometry
                .as_ref()
                .map(|geometry| geojson::Geometry::new(geojson::Value::from(geometry))),
            id: self.id.clone(),
            properties: self.properties.clone(),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

/// Ordered features produced by one ingestion call.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub format: SourceFormat,
    pub bbox: Option<Bbox>,
    pub features: Vec<Feature>,
    pub foreign_members: Option<JsonObject>,
}

impl FeatureCollection {
    pub fn new(format: SourceFormat) -> Self {
        FeatureCollection {
            format,
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Type of the first feature, `Mixed` when that is absent or the
    /// collection holds more than one geometry type.
    pub fn detected_kind(&self) -> GeometryKind {
        let first = match self.features.first().and_then(Feature::kind) {
            Some(kind) => kind,
            None => return GeometryKind::Mixed,
        };
        if self.features.iter().all(|f| f.kind() == Some(first)) {
            first
        } else {
            GeometryKind::Mixed
        }
    }

    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> {
        self.features.iter().filter_map(|f| f.geometry.as_ref())
    }

    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: self.bbox.clone(),
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, LineString};

    fn point_feature(x: f64, y: f64) -> Feature {
        Feature::new(Geometry::Point(point! { x: x, y: y }), JsonObject::new())
    }

    #[test]
    fn detected_kind_of_uniform_collection() {
        let mut collection = FeatureCollection::new(SourceFormat::Csv);
        collection.features.push(point_feature(1.0, 2.0));
        collection.features.push(point_feature(3.0, 4.0));
        assert_eq!(collection.detected_kind(), GeometryKind::Point);
    }

    #[test]
    fn detected_kind_is_mixed_for_empty_or_heterogeneous() {
        let mut collection = FeatureCollection::new(SourceFormat::GeoJson);
        assert_eq!(collection.detected_kind(), GeometryKind::Mixed);

        collection.features.push(point_feature(1.0, 2.0));
        collection.features.push(Feature::new(
            Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])),
            JsonObject::new(),
        ));
        assert_eq!(collection.detected_kind(), GeometryKind::Mixed);
    }

    #[test]
    fn geojson_output_keeps_lon_lat_order_and_properties() {
        let mut properties = JsonObject::new();
        properties.insert("name".into(), "buoy".into());
        let feature = Feature::new(Geometry::Point(point! { x: 72.8, y: 19.1 }), properties);

        let json = serde_json::to_value(feature.to_geojson()).unwrap();
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["geometry"]["coordinates"][0], 72.8);
        assert_eq!(json["geometry"]["coordinates"][1], 19.1);
        assert_eq!(json["properties"]["name"], "buoy");
        assert!(json.get("bbox").is_none());
    }

    #[test]
    fn null_properties_stay_null() {
        let feature = Feature::new_untyped(None);
        assert_eq!(feature.property("name"), None);

        let json = serde_json::to_value(feature.to_geojson()).unwrap();
        assert_eq!(json["properties"], Value::Null);
        assert_eq!(json["geometry"], Value::Null);
    }

    #[test]
    fn format_names() {
        assert_eq!(SourceFormat::ShapefileZip.to_string(), "Shapefile (ZIP)");
        assert_eq!(
            serde_json::to_value(SourceFormat::GeoJson).unwrap(),
            serde_json::json!("GeoJSON")
        );
        assert_eq!(GeometryKind::MultiPolygon.to_string(), "MultiPolygon");
    }
}
