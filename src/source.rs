//! Resolution of `(site, year)` to a shoreline curve.

use std::path::{Path, PathBuf};

use geo::Geometry;

use crate::analysis::ShorelineCurve;
use crate::catalog::shoreline_layer_name;
use crate::error::AnalysisError;
use crate::ingest::ingest_path;

pub trait ShorelineSource {
    fn shoreline(&self, site: &str, year: i32) -> Result<ShorelineCurve, AnalysisError>;
}

impl<F> ShorelineSource for F
where
    F: Fn(&str, i32) -> Result<ShorelineCurve, AnalysisError>,
{
    fn shoreline(&self, site: &str, year: i32) -> Result<ShorelineCurve, AnalysisError> {
        self(site, year)
    }
}

/// Reads `Site{site}_{year}_Shoreline.geojson` files from a directory.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    pub fn path_for(&self, site: &str, year: i32) -> PathBuf {
        self.root
            .join(format!("{}.geojson", shoreline_layer_name(site, year)))
    }
}

fn first_line(path: &Path) -> Result<ShorelineCurve, String> {
    let output = ingest_path(path, "application/geo+json").map_err(|e| e.to_string())?;
    let line = output.data.geometries().find_map(|geometry| match geometry {
        Geometry::LineString(line) => Some(line.clone()),
        Geometry::MultiLineString(lines) => lines.0.first().cloned(),
        _ => None,
    });
    line.map(ShorelineCurve::new)
        .ok_or_else(|| "no LineString feature".to_string())
}

impl ShorelineSource for DirectorySource {
    fn shoreline(&self, site: &str, year: i32) -> Result<ShorelineCurve, AnalysisError> {
        let path = self.path_for(site, year);
        log::debug!("Resolving shoreline from {}", path.display());
        let curve = first_line(&path).map_err(|reason| AnalysisError::CurveUnavailable {
            site: site.to_string(),
            year,
            reason,
        })?;
        if let Some(warning) = curve.crs_warning() {
            log::warn!("{}: {}", shoreline_layer_name(site, year), warning);
        }
        Ok(curve)
    }
}
