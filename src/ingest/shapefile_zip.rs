use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use geo::Geometry;
use geojson::JsonObject;
use serde_json::Value;
use shapefile::dbase::{self, FieldValue};
use shapefile::{Shape, ShapeReader};
use zip::ZipArchive;

use super::Parsed;
use crate::error::{IngestError, Result};
use crate::feature::{Feature, FeatureCollection, SourceFormat};

/// One `.shp` entry and the attribute table sharing its stem.
struct Layer {
    name: String,
    shp: Vec<u8>,
    dbf: Option<Vec<u8>>,
}

fn read_layers(bytes: &[u8]) -> Result<Vec<Layer>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut shapes: Vec<(String, Vec<u8>)> = Vec::new();
    let mut tables: HashMap<String, Vec<u8>> = HashMap::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || entry.name().starts_with("__MACOSX/") {
            continue;
        }

        let name = entry.name().to_string();
        let path = Path::new(&name);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let stem = path.with_extension("").to_string_lossy().to_lowercase();

        match extension.as_str() {
            "shp" | "dbf" => {
                let mut content = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut content)?;
                if extension == "shp" {
                    shapes.push((stem, content));
                } else {
                    tables.insert(stem, content);
                }
            }
            "prj" => log::debug!("Ignoring projection file {} (no reprojection)", name),
            _ => {}
        }
    }

    if shapes.is_empty() {
        return Err(IngestError::ProcessingFailed(
            "archive contains no .shp layer".to_string(),
        ));
    }

    Ok(shapes
        .into_iter()
        .map(|(stem, shp)| Layer {
            dbf: tables.remove(&stem),
            name: stem,
            shp,
        })
        .collect())
}

fn field_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Value::String(s),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => n.into(),
        FieldValue::Float(Some(n)) => f64::from(n).into(),
        FieldValue::Integer(n) => n.into(),
        FieldValue::Logical(Some(b)) => b.into(),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => Value::Null,
        other => Value::String(format!("{other:?}")),
    }
}

/// Single-part multi geometries are reported as their single-part type.
fn simplify(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::MultiPolygon(mut mp) if mp.0.len() == 1 => Geometry::Polygon(mp.0.remove(0)),
        Geometry::MultiLineString(mut ml) if ml.0.len() == 1 => {
            Geometry::LineString(ml.0.remove(0))
        }
        other => other,
    }
}

fn convert_shape(shape: Shape) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from(shape)
        .map(simplify)
        .map_err(|e| IngestError::ProcessingFailed(e.to_string()))
}

fn shape_to_geometry(shape: Shape) -> Result<Option<Geometry<f64>>> {
    match shape {
        Shape::NullShape => Ok(None),
        shape => convert_shape(shape).map(Some),
    }
}

/// Properties in the attribute table's column order.
fn record_properties(columns: &[String], record: dbase::Record) -> JsonObject {
    let mut fields = HashMap::<String, FieldValue>::from(record);
    columns
        .iter()
        .filter_map(|name| fields.remove_entry(name))
        .map(|(name, value)| (name, field_to_json(value)))
        .collect()
}

fn read_layer(layer: Layer, collection: &mut FeatureCollection) -> Result<()> {
    let shape_reader = ShapeReader::new(Cursor::new(layer.shp))?;
    let before = collection.len();

    match layer.dbf {
        Some(dbf) => {
            let table = dbase::Reader::new(Cursor::new(dbf))
                .map_err(|e| IngestError::ProcessingFailed(e.to_string()))?;
            let columns: Vec<String> = table
                .fields()
                .iter()
                .map(|field| field.name().to_string())
                .collect();
            let mut reader = shapefile::Reader::new(shape_reader, table);
            for item in reader.iter_shapes_and_records() {
                let (shape, record) = item?;
                let mut feature = Feature::new_untyped(shape_to_geometry(shape)?);
                feature.properties = Some(record_properties(&columns, record));
                collection.features.push(feature);
            }
        }
        None => {
            let mut shape_reader = shape_reader;
            for shape in shape_reader.iter_shapes() {
                let mut feature = Feature::new_untyped(shape_to_geometry(shape?)?);
                feature.properties = Some(JsonObject::new());
                collection.features.push(feature);
            }
        }
    }

    log::debug!(
        "Layer {} contributed {} features",
        layer.name,
        collection.len() - before
    );
    Ok(())
}

/// Zipped shapefile archive; all layers are flattened into one collection.
pub(crate) fn parse_shapefile_zip(bytes: &[u8]) -> Result<Parsed> {
    let layers = read_layers(bytes)?;
    log::info!("Archive holds {} shapefile layer(s)", layers.len());

    let mut collection = FeatureCollection::new(SourceFormat::ShapefileZip);
    for layer in layers {
        read_layer(layer, &mut collection)?;
    }

    Ok(Parsed {
        detected_geometry: collection.detected_kind(),
        collection,
        dropped_rows: 0,
    })
}
