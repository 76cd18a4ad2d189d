//! Shoreline change between a baseline trace and a comparison trace.
//!
//! Displacement is measured vertex by vertex; eroded and accreted areas come
//! from closing each open curve into a polygon and differencing the two.

use std::str::FromStr;

use geo::{coord, Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::catalog::shoreline_layer_name;
use crate::crs::check_crs;
use crate::error::{AnalysisError, GeometryError};
use crate::geometry::{close_curve, difference_area_sqm, haversine_m, PolylineIndex};
use crate::source::ShorelineSource;

/// Ordered `[lon, lat]` vertices of a shoreline at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineCurve(LineString<f64>);

impl ShorelineCurve {
    pub fn new(line: LineString<f64>) -> Self {
        ShorelineCurve(line)
    }

    pub fn from_lon_lat(vertices: &[[f64; 2]]) -> Self {
        ShorelineCurve(vertices.iter().map(|v| coord! { x: v[0], y: v[1] }).collect())
    }

    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.0 .0
    }

    pub fn line(&self) -> &LineString<f64> {
        &self.0
    }

    /// Set when the vertices look like projected meters rather than degrees.
    pub fn crs_warning(&self) -> Option<&'static str> {
        check_crs(self.vertices().iter().copied())
    }
}

/// Side of the curve the closing vertices are placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlandDirection {
    #[default]
    South,
    North,
    East,
    West,
    /// Left of the chord from the first to the last vertex.
    LeftOfCurve,
    /// Right of the chord from the first to the last vertex.
    RightOfCurve,
}

impl InlandDirection {
    pub const NAMES: [&'static str; 6] = ["south", "north", "east", "west", "left", "right"];

    /// Offset of `distance` degrees toward the inland side.
    pub fn offset(&self, curve: &[Coord<f64>], distance: f64) -> Coord<f64> {
        match self {
            InlandDirection::South => coord! { x: 0.0, y: -distance },
            InlandDirection::North => coord! { x: 0.0, y: distance },
            InlandDirection::East => coord! { x: distance, y: 0.0 },
            InlandDirection::West => coord! { x: -distance, y: 0.0 },
            InlandDirection::LeftOfCurve | InlandDirection::RightOfCurve => {
                let (first, last) = match (curve.first(), curve.last()) {
                    (Some(first), Some(last)) => (*first, *last),
                    _ => return InlandDirection::South.offset(curve, distance),
                };
                let chord = last - first;
                let length = chord.x.hypot(chord.y);
                if length == 0.0 {
                    return InlandDirection::South.offset(curve, distance);
                }
                let left = coord! { x: -chord.y / length, y: chord.x / length };
                let sign = if *self == InlandDirection::LeftOfCurve { 1.0 } else { -1.0 };
                left * (sign * distance)
            }
        }
    }
}

impl FromStr for InlandDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "south" => Ok(InlandDirection::South),
            "north" => Ok(InlandDirection::North),
            "east" => Ok(InlandDirection::East),
            "west" => Ok(InlandDirection::West),
            "left" => Ok(InlandDirection::LeftOfCurve),
            "right" => Ok(InlandDirection::RightOfCurve),
            other => Err(format!("unknown inland direction '{other}'")),
        }
    }
}

/// What to do when the two curves have different vertex counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnequalCurves {
    /// Compare only indices present in both curves.
    Truncate,
    /// Measure each baseline vertex against the closest point on the target.
    #[default]
    NearestPoint,
}

impl UnequalCurves {
    pub const NAMES: [&'static str; 2] = ["nearest", "truncate"];
}

impl FromStr for UnequalCurves {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "truncate" => Ok(UnequalCurves::Truncate),
            "nearest" | "nearest-point" => Ok(UnequalCurves::NearestPoint),
            other => Err(format!("unknown alignment mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub inland: InlandDirection,
    /// Distance of the closing vertices from the curve, in degrees.
    pub closure_offset_deg: f64,
    /// Shift in meters that maps to full heatmap intensity.
    pub intensity_full_scale_m: f64,
    pub unequal_curves: UnequalCurves,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            inland: InlandDirection::South,
            closure_offset_deg: 0.01,
            intensity_full_scale_m: 50.0,
            unequal_curves: UnequalCurves::NearestPoint,
        }
    }
}

/// How baseline vertices were paired with the target curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Index,
    Truncated,
    NearestPoint,
}

/// `[lat, lon, intensity]` with intensity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapSample(pub f64, pub f64, pub f64);

impl HeatmapSample {
    pub fn intensity(&self) -> f64 {
        self.2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub site: String,
    pub baseline_year: i32,
    pub comparison_year: i32,
    pub max_shift_m: f64,
    pub avg_shift_m: f64,
    pub erosion_sqm: f64,
    pub accretion_sqm: f64,
    pub net_change_sqm: f64,
    pub heatmap_points: Vec<HeatmapSample>,
    pub changed_layers: Vec<String>,
    pub alignment: Alignment,
    /// `<layer>: <warning>` for each curve failing the degree-range check.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crs_warnings: Vec<String>,
}

/// Analysis parameters as received from a caller; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub site: Option<String>,
    pub baseline_year: Option<i32>,
    pub comparison_years: Option<Vec<i32>>,
}

/// A request with all parameters present. `target_year` is the last
/// comparison year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub site: String,
    pub baseline_year: i32,
    pub target_year: i32,
}

impl AnalysisRequest {
    /// Parses a JSON body. A body of the wrong shape counts as missing parameters.
    pub fn from_json(body: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(body).map_err(|e| AnalysisError::MissingParameters(e.to_string()))
    }

    pub fn validate(&self) -> Result<ValidatedRequest, AnalysisError> {
        let site = self
            .site
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AnalysisError::MissingParameters("site".to_string()))?;
        let baseline_year = self
            .baseline_year
            .filter(|year| *year != 0)
            .ok_or_else(|| AnalysisError::MissingParameters("baselineYear".to_string()))?;
        let target_year = self
            .comparison_years
            .as_ref()
            .and_then(|years| years.last().copied())
            .ok_or_else(|| AnalysisError::MissingParameters("comparisonYears".to_string()))?;

        Ok(ValidatedRequest {
            site: site.to_string(),
            baseline_year,
            target_year,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-baseline-vertex shift in meters, paired with the vertex it belongs to.
fn displacements(
    baseline: &ShorelineCurve,
    target: &ShorelineCurve,
    mode: UnequalCurves,
) -> (Vec<(Coord<f64>, f64)>, Alignment) {
    if baseline.len() == target.len() || mode == UnequalCurves::Truncate {
        let alignment = if baseline.len() == target.len() {
            Alignment::Index
        } else {
            Alignment::Truncated
        };
        let shifts = baseline
            .vertices()
            .iter()
            .zip(target.vertices())
            .map(|(a, b)| (*a, haversine_m(*a, *b)))
            .collect();
        return (shifts, alignment);
    }

    log::info!(
        "Curves differ in length ({} vs {} vertices), measuring against nearest points",
        baseline.len(),
        target.len()
    );
    let index = PolylineIndex::new(target.line());
    let shifts = baseline
        .vertices()
        .iter()
        .filter_map(|v| index.closest_point(*v).map(|p| (*v, haversine_m(*v, p))))
        .collect();
    (shifts, Alignment::NearestPoint)
}

fn soft_area(label: &str, area: Result<f64, GeometryError>) -> f64 {
    match area {
        Ok(area) => area,
        Err(e) => {
            log::warn!("{} calculation failed: {}", label, e);
            0.0
        }
    }
}

/// Compares `target` against `baseline` for one site.
///
/// Failures of the polygon operations degrade the affected area to zero; the
/// report is always produced.
pub fn analyze_curves(
    baseline: &ShorelineCurve,
    target: &ShorelineCurve,
    site: &str,
    baseline_year: i32,
    target_year: i32,
    options: &AnalysisOptions,
) -> ChangeReport {
    let (shifts, alignment) = displacements(baseline, target, options.unequal_curves);

    let max_shift = shifts.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    let avg_shift = if shifts.is_empty() {
        0.0
    } else {
        shifts.iter().map(|(_, d)| *d).sum::<f64>() / shifts.len() as f64
    };

    let heatmap_points = shifts
        .iter()
        .map(|(v, d)| {
            let intensity = (d / options.intensity_full_scale_m).clamp(0.0, 1.0);
            HeatmapSample(v.y, v.x, if intensity.is_nan() { 0.0 } else { intensity })
        })
        .collect();

    let close = |curve: &ShorelineCurve| {
        let offset = options.inland.offset(curve.vertices(), options.closure_offset_deg);
        close_curve(curve.line(), offset)
    };
    let (erosion, accretion) = match (close(baseline), close(target)) {
        (Ok(base_poly), Ok(target_poly)) => (
            soft_area("Erosion", difference_area_sqm(&base_poly, &target_poly)),
            soft_area("Accretion", difference_area_sqm(&target_poly, &base_poly)),
        ),
        (base, target) => {
            let error = base.err().or(target.err()).unwrap_or(GeometryError::EmptyCurve);
            (
                soft_area("Erosion", Err(error.clone())),
                soft_area("Accretion", Err(error)),
            )
        }
    };

    let erosion_sqm = round2(erosion);
    let accretion_sqm = round2(accretion);

    let crs_warnings = [(baseline, baseline_year), (target, target_year)]
        .into_iter()
        .filter_map(|(curve, year)| {
            curve
                .crs_warning()
                .map(|warning| format!("{}: {}", shoreline_layer_name(site, year), warning))
        })
        .collect();

    let report = ChangeReport {
        site: site.to_string(),
        baseline_year,
        comparison_year: target_year,
        max_shift_m: round2(max_shift),
        avg_shift_m: round2(avg_shift),
        erosion_sqm,
        accretion_sqm,
        net_change_sqm: round2(accretion_sqm - erosion_sqm),
        heatmap_points,
        changed_layers: vec![
            shoreline_layer_name(site, baseline_year),
            shoreline_layer_name(site, target_year),
        ],
        alignment,
        crs_warnings,
    };
    log::info!(
        "Site {} {}..{}: avg shift {} m, erosion {} m2, accretion {} m2",
        site,
        baseline_year,
        target_year,
        report.avg_shift_m,
        report.erosion_sqm,
        report.accretion_sqm
    );
    report
}

/// Validates `request`, resolves both curves through `source` and compares them.
pub fn analyze_change<S: ShorelineSource + ?Sized>(
    source: &S,
    request: &AnalysisRequest,
    options: &AnalysisOptions,
) -> Result<ChangeReport, AnalysisError> {
    let request = request.validate()?;
    let baseline = source.shoreline(&request.site, request.baseline_year)?;
    let target = source.shoreline(&request.site, request.target_year)?;

    Ok(analyze_curves(
        &baseline,
        &target,
        &request.site,
        request.baseline_year,
        request.target_year,
        options,
    ))
}
