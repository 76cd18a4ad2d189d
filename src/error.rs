//! Error types for ingestion and shoreline analysis.

use serde::Serialize;
use thiserror::Error;

/// Failures of a single ingestion call.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Neither the MIME type nor the file suffix selects a parser.
    #[error("Unsupported file format for '{filename}'. Use CSV, GeoJSON, or Shapefile (ZIP).")]
    UnsupportedFormat { filename: String },

    /// Tabular input without recognizable latitude/longitude columns.
    #[error("Could not detect geospatial columns. Please ensure columns formatted as Lat/Lon exist.")]
    ColumnDetection { headers: Vec<String> },

    /// Fewer than two non-empty rows in tabular input.
    #[error("Empty or invalid CSV")]
    EmptyInput,

    /// Top-level JSON is valid but neither a Feature nor a FeatureCollection.
    #[error("Invalid GeoJSON structure: expected Feature or FeatureCollection, found {found}")]
    InvalidGeoJson { found: String },

    /// Catch-all for malformed payloads (bad JSON syntax, broken archives, ...).
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

macro_rules! processing_failed_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for IngestError {
                fn from(value: $source) -> Self {
                    IngestError::ProcessingFailed(value.to_string())
                }
            }
        )*
    };
}

processing_failed_from!(
    std::io::Error,
    csv::Error,
    serde_json::Error,
    geojson::Error,
    zip::result::ZipError,
    shapefile::Error,
);

/// Failures of a shoreline change analysis call.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    /// The collaborator could not produce a curve for the requested layer.
    #[error("No shoreline available for site {site}, year {year}: {reason}")]
    CurveUnavailable {
        site: String,
        year: i32,
        reason: String,
    },
}

/// Soft failures of geometric operations. Callers decide whether to degrade.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("curve has no vertices")]
    EmptyCurve,
    #[error("degenerate polygon: {0}")]
    Degenerate(&'static str),
    #[error("boolean operation failed: {0}")]
    BooleanOp(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Structured error payload handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
}

impl From<&IngestError> for ErrorResponse {
    fn from(error: &IngestError) -> Self {
        let (kind, headers) = match error {
            IngestError::UnsupportedFormat { .. } => ("UnsupportedFormat", None),
            IngestError::ColumnDetection { headers } => ("ColumnDetection", Some(headers.clone())),
            IngestError::EmptyInput => ("EmptyInput", None),
            IngestError::InvalidGeoJson { .. } => ("InvalidGeoJSON", None),
            IngestError::ProcessingFailed(_) => ("ProcessingFailed", None),
        };
        ErrorResponse {
            kind,
            message: error.to_string(),
            headers,
        }
    }
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(error: &AnalysisError) -> Self {
        let kind = match error {
            AnalysisError::MissingParameters(_) => "MissingParameters",
            AnalysisError::CurveUnavailable { .. } => "CurveUnavailable",
        };
        ErrorResponse {
            kind,
            message: error.to_string(),
            headers: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_detection_response_carries_headers() {
        let error = IngestError::ColumnDetection {
            headers: vec!["name".into(), "depth".into()],
        };
        let response = ErrorResponse::from(&error);
        assert_eq!(response.kind, "ColumnDetection");
        assert_eq!(response.headers, Some(vec!["name".to_string(), "depth".to_string()]));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["headers"][1], "depth");
    }

    #[test]
    fn headers_are_omitted_for_other_kinds() {
        let response = ErrorResponse::from(&IngestError::EmptyInput);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("headers").is_none());
        assert_eq!(json["kind"], "EmptyInput");
    }

    #[test]
    fn library_errors_become_processing_failed() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = IngestError::from(json_error);
        assert!(matches!(error, IngestError::ProcessingFailed(_)));
    }
}
