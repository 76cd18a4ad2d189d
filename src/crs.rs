//! Coarse check for data that was never reprojected to geographic degrees.
//!
//! This only flags a suspicion; nothing is ever transformed.

use geo::{Coord, CoordsIter, Geometry};

use crate::feature::FeatureCollection;

pub const CRS_WARNING: &str = "GeoJSON CRS mismatch suspected (UTM detected)";

/// Warns when any coordinate falls outside the degree range
/// `[-180, 180] x [-90, 90]`. No coordinates means no warning.
pub fn check_crs<I>(coords: I) -> Option<&'static str>
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let projected = coords
        .into_iter()
        .any(|c| c.x.abs() > 180.0 || c.y.abs() > 90.0);
    if projected {
        log::warn!("{}", CRS_WARNING);
        Some(CRS_WARNING)
    } else {
        None
    }
}

pub fn check_geometry(geometry: &Geometry<f64>) -> Option<&'static str> {
    check_crs(geometry.coords_iter())
}

pub fn check_collection(collection: &FeatureCollection) -> Option<&'static str> {
    check_crs(collection.geometries().flat_map(|g| g.coords_iter()))
}
