use csv::ReaderBuilder;
use geo::{point, Geometry};
use geojson::JsonObject;

use super::Parsed;
use crate::detect::detect_columns;
use crate::error::{IngestError, Result};
use crate::feature::{Feature, FeatureCollection, GeometryKind, SourceFormat};

fn parse_coordinate(record: &csv::StringRecord, index: usize) -> Option<f64> {
    record
        .get(index)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Delimited text with a header row. Rows whose latitude or longitude does not
/// parse are dropped and only counted.
pub(crate) fn parse_csv(bytes: &[u8]) -> Result<Parsed> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(record);
    }

    if rows.len() < 2 {
        return Err(IngestError::EmptyInput);
    }

    let headers: Vec<String> = rows[0].iter().map(str::to_string).collect();
    let columns = detect_columns(&headers)?;
    log::debug!(
        "Using column '{}' as latitude and '{}' as longitude",
        headers[columns.latitude],
        headers[columns.longitude]
    );

    let mut collection = FeatureCollection::new(SourceFormat::Csv);
    let mut dropped_rows = 0;

    for row in &rows[1..] {
        let (lat, lon) = match (
            parse_coordinate(row, columns.latitude),
            parse_coordinate(row, columns.longitude),
        ) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                dropped_rows += 1;
                continue;
            }
        };

        let mut properties = JsonObject::new();
        for (i, (header, value)) in headers.iter().zip(row.iter()).enumerate() {
            if !columns.is_coordinate(i) {
                properties.insert(header.clone(), value.into());
            }
        }

        collection
            .features
            .push(Feature::new(Geometry::Point(point! { x: lon, y: lat }), properties));
    }

    if dropped_rows > 0 {
        log::warn!("Dropped {} rows with unparseable coordinates", dropped_rows);
    }

    Ok(Parsed {
        collection,
        detected_geometry: GeometryKind::Point,
        dropped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn points_are_lon_lat_and_skip_coordinate_columns() {
        let parsed = parse_csv(b"station,Latitude,Longitude,depth\nS1,19.10,72.82,4.5\n").unwrap();
        let feature = &parsed.collection.features[0];

        assert_eq!(feature.geometry, Some(Geometry::Point(point! { x: 72.82, y: 19.10 })));
        let keys: Vec<&str> = feature.properties.as_ref().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["station", "depth"]);
        assert_eq!(feature.property("depth").unwrap(), "4.5");
    }

    #[test]
    fn unparseable_rows_are_dropped_silently() {
        let csv = b"lat,lon\n19.1,72.8\nn/a,72.8\n19.2,\n19.3,72.9\nNaN,72.9\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.collection.len(), 2);
        assert_eq!(parsed.dropped_rows, 3);
    }

    #[test]
    fn short_rows_keep_present_properties_only() {
        let parsed = parse_csv(b"lat,lon,name,notes\n19.1,72.8,buoy\n").unwrap();
        let properties = parsed.collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["name"], "buoy");
    }

    #[test]
    fn empty_lines_are_skipped() {
        let parsed = parse_csv(b"\nlat,lon\n\n19.1,72.8\n\n").unwrap();
        assert_eq!(parsed.collection.len(), 1);
    }

    #[test]
    fn header_only_is_empty_input() {
        assert_matches!(parse_csv(b"lat,lon\n"), Err(IngestError::EmptyInput));
        assert_matches!(parse_csv(b""), Err(IngestError::EmptyInput));
    }

    #[test]
    fn headers_without_coordinates() {
        assert_matches!(
            parse_csv(b"name,depth\na,1\n"),
            Err(IngestError::ColumnDetection { headers }) if headers == vec!["name", "depth"]
        );
    }
}
