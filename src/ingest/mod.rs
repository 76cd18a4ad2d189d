//! Per-format parse and normalize into a [`FeatureCollection`].

mod geojson_input;
mod shapefile_zip;
mod tabular;

use std::path::Path;

use serde::Serialize;

use crate::detect::detect_format;
use crate::error::Result;
use crate::feature::{FeatureCollection, GeometryKind, SourceFormat};

use geojson_input::parse_geojson;
use shapefile_zip::parse_shapefile_zip;
use tabular::parse_csv;

/// Summary of one ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionMetadata {
    pub filename: String,
    pub format: SourceFormat,
    pub feature_count: usize,
    pub detected_geometry: GeometryKind,
    /// Tabular rows skipped because a coordinate did not parse.
    pub dropped_rows: usize,
}

/// Output of a branch before metadata is attached.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub collection: FeatureCollection,
    pub detected_geometry: GeometryKind,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub metadata: IngestionMetadata,
    pub data: FeatureCollection,
}

impl Serialize for IngestOutput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("IngestOutput", 2)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("data", &self.data.to_geojson())?;
        state.end()
    }
}

/// Ingests raw bytes declared as `filename` with MIME type `mime_type`.
pub fn ingest(bytes: &[u8], filename: &str, mime_type: &str) -> Result<IngestOutput> {
    let format = detect_format(filename, mime_type)?;
    log::info!("Ingesting {} as {}", filename, format);

    let parsed = match format {
        SourceFormat::Csv => parse_csv(bytes)?,
        SourceFormat::GeoJson => parse_geojson(bytes)?,
        SourceFormat::ShapefileZip => parse_shapefile_zip(bytes)?,
    };

    let metadata = IngestionMetadata {
        filename: filename.to_string(),
        format,
        feature_count: parsed.collection.len(),
        detected_geometry: parsed.detected_geometry,
        dropped_rows: parsed.dropped_rows,
    };
    log::info!(
        "Loaded {} features ({}) from {}",
        metadata.feature_count,
        metadata.detected_geometry,
        filename
    );

    Ok(IngestOutput {
        metadata,
        data: parsed.collection,
    })
}

/// Reads `path` and ingests it under its file name.
pub fn ingest_path(path: &Path, mime_type: &str) -> Result<IngestOutput> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    ingest(&bytes, filename, mime_type)
}
