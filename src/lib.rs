use std::path::Path;

pub mod analysis;
pub mod catalog;
pub mod crs;
pub mod detect;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod ingest;
pub mod source;

pub use analysis::{
    analyze_change, analyze_curves, AnalysisOptions, AnalysisRequest, ChangeReport,
    InlandDirection, ShorelineCurve, UnequalCurves,
};
pub use error::{AnalysisError, ErrorResponse, IngestError};
pub use feature::{Feature, FeatureCollection, GeometryKind, SourceFormat};
pub use ingest::{ingest, IngestOutput, IngestionMetadata};
pub use source::{DirectorySource, ShorelineSource};

/// Ingests a file and reports whether its coordinates look unprojected.
pub fn process_file(
    path: &Path,
    mime_type: &str,
) -> Result<(IngestOutput, Option<&'static str>), IngestError> {
    let output = ingest::ingest_path(path, mime_type)?;
    let warning = crs::check_collection(&output.data);
    Ok((output, warning))
}

/// Resolves curves from `curves_dir` and runs the change analysis.
pub fn process_analysis(
    curves_dir: &Path,
    request: &AnalysisRequest,
    options: &AnalysisOptions,
) -> Result<ChangeReport, AnalysisError> {
    analyze_change(&DirectorySource::new(curves_dir), request, options)
}
