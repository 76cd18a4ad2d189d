//! Parser selection and coordinate column detection.

use crate::error::{IngestError, Result};
use crate::feature::SourceFormat;

const LATITUDE_KEYS: [&str; 4] = ["lat", "latitude", "y", "north"];
const LONGITUDE_KEYS: [&str; 5] = ["lon", "lng", "longitude", "x", "east"];

/// Picks a parser from the declared MIME type and file name.
///
/// CSV wins on either signal; the other formats are chosen by suffix only.
pub fn detect_format(filename: &str, mime_type: &str) -> Result<SourceFormat> {
    if mime_type == "text/csv" || filename.ends_with(".csv") {
        Ok(SourceFormat::Csv)
    } else if filename.ends_with(".json") || filename.ends_with(".geojson") {
        Ok(SourceFormat::GeoJson)
    } else if filename.ends_with(".zip") {
        Ok(SourceFormat::ShapefileZip)
    } else {
        Err(IngestError::UnsupportedFormat {
            filename: filename.to_string(),
        })
    }
}

/// Indices of the coordinate columns in a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateColumns {
    pub latitude: usize,
    pub longitude: usize,
}

impl CoordinateColumns {
    pub fn is_coordinate(&self, index: usize) -> bool {
        index == self.latitude || index == self.longitude
    }
}

fn find_column(headers: &[String], keys: &[&str], skip: Option<usize>) -> Option<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .find(|(_, header)| keys.iter().any(|key| header.contains(key)))
        .map(|(i, _)| i)
}

/// Case-insensitive substring scan of a header row, first match wins.
///
/// A header matching both keyword sets is taken as latitude; longitude is then
/// searched among the remaining headers.
pub fn detect_columns(headers: &[String]) -> Result<CoordinateColumns> {
    let normalized: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    let latitude = find_column(&normalized, &LATITUDE_KEYS, None);
    let longitude = latitude.and_then(|lat| find_column(&normalized, &LONGITUDE_KEYS, Some(lat)));

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(CoordinateColumns {
            latitude,
            longitude,
        }),
        _ => Err(IngestError::ColumnDetection {
            headers: headers.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dispatch_by_mime_and_suffix() {
        assert_eq!(detect_format("points.csv", "").unwrap(), SourceFormat::Csv);
        assert_eq!(detect_format("upload.bin", "text/csv").unwrap(), SourceFormat::Csv);
        assert_eq!(detect_format("coast.json", "application/json").unwrap(), SourceFormat::GeoJson);
        assert_eq!(detect_format("coast.geojson", "").unwrap(), SourceFormat::GeoJson);
        assert_eq!(detect_format("layers.zip", "application/zip").unwrap(), SourceFormat::ShapefileZip);
    }

    #[test]
    fn csv_mime_takes_precedence_over_suffix() {
        assert_eq!(detect_format("coast.geojson", "text/csv").unwrap(), SourceFormat::Csv);
    }

    #[test]
    fn unsupported_suffix() {
        assert_matches!(
            detect_format("data.txt", "text/plain"),
            Err(IngestError::UnsupportedFormat { filename }) if filename == "data.txt"
        );
    }

    #[test]
    fn latitude_detection_is_case_insensitive_substring() {
        for name in ["LAT", "Latitude_deg", "north_coord"] {
            let columns = detect_columns(&headers(&["id", name, "lon"])).unwrap();
            assert_eq!(columns.latitude, 1, "header {name}");
            assert_eq!(columns.longitude, 2, "header {name}");
        }
    }

    #[test]
    fn longitude_aliases() {
        for name in ["LNG", "Longitude", "easting", "X"] {
            let columns = detect_columns(&headers(&["lat", "depth", name])).unwrap();
            assert_eq!(columns.longitude, 2, "header {name}");
        }
    }

    #[test]
    fn first_match_wins() {
        let columns = detect_columns(&headers(&["lat", "latitude", "lon", "lng"])).unwrap();
        assert_eq!(columns, CoordinateColumns { latitude: 0, longitude: 2 });
    }

    #[test]
    fn header_matching_both_sets_is_latitude() {
        let columns = detect_columns(&headers(&["x_y", "lon"])).unwrap();
        assert_eq!(columns, CoordinateColumns { latitude: 0, longitude: 1 });

        assert_matches!(detect_columns(&headers(&["x_y", "depth"])), Err(IngestError::ColumnDetection { .. }));
    }

    #[test]
    fn missing_column_reports_original_headers() {
        let original = headers(&["Name", "Depth"]);
        assert_matches!(
            detect_columns(&original),
            Err(IngestError::ColumnDetection { headers }) if headers == original
        );
    }
}
