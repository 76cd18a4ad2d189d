use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::{
    Area, BooleanOps, ChamberlainDuquetteArea, ClosestPoint, Closest, Coord, HaversineDistance,
    Line, LineString, MultiPolygon, Point, Polygon,
};
use rstar::RTree;

use crate::error::GeometryError;

/// Great-circle distance in meters between two `[lon, lat]` coordinates.
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Point::from(a).haversine_distance(&Point::from(b))
}

/// Closes an open curve into a ring by stepping `offset` away from both ends.
///
/// The ring is `curve.., last + offset, first + offset, first`.
pub fn close_curve(curve: &LineString<f64>, offset: Coord<f64>) -> Result<Polygon<f64>, GeometryError> {
    let (first, last) = match (curve.0.first(), curve.0.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(GeometryError::EmptyCurve),
    };

    let mut ring = curve.0.clone();
    ring.push(last + offset);
    ring.push(first + offset);
    ring.push(first);

    Ok(Polygon::new(LineString::new(ring), vec![]))
}

fn check_polygon(polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        return Err(GeometryError::Degenerate("ring needs at least 4 coordinates"));
    }
    if exterior.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::Degenerate("ring contains non-finite coordinates"));
    }
    if polygon.unsigned_area() <= f64::EPSILON * f64::EPSILON {
        return Err(GeometryError::Degenerate("ring encloses no area"));
    }
    Ok(())
}

/// `a - b` as a multipolygon.
///
/// Degenerate input and panics inside the sweep-line implementation both come
/// back as `Err`, so each caller can degrade independently.
pub fn difference(a: &Polygon<f64>, b: &Polygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    check_polygon(a)?;
    check_polygon(b)?;

    catch_unwind(AssertUnwindSafe(|| a.difference(b))).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        GeometryError::BooleanOp(reason)
    })
}

/// Spherical area of `a - b` in square meters.
pub fn difference_area_sqm(a: &Polygon<f64>, b: &Polygon<f64>) -> Result<f64, GeometryError> {
    difference(a, b).map(|region| region.chamberlain_duquette_unsigned_area())
}

/// Nearest-segment index over a polyline.
pub struct PolylineIndex {
    tree: RTree<Line<f64>>,
    single: Option<Coord<f64>>,
}

impl PolylineIndex {
    pub fn new(line: &LineString<f64>) -> Self {
        let segments: Vec<Line<f64>> = line.lines().collect();
        let single = if segments.is_empty() { line.0.first().copied() } else { None };
        PolylineIndex {
            tree: RTree::bulk_load(segments),
            single,
        }
    }

    /// Closest point on the polyline to `coord`, or `None` for an empty polyline.
    pub fn closest_point(&self, coord: Coord<f64>) -> Option<Coord<f64>> {
        if let Some(single) = self.single {
            return Some(single);
        }
        let query = Point::from(coord);
        let segment = self.tree.nearest_neighbor(&query)?;
        match segment.closest_point(&query) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p.0),
            Closest::Indeterminate => Some(segment.start),
        }
    }
}
