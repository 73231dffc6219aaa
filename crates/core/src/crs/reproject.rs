//! Coordinate transforms between supported CRS pairs
//!
//! Transforms are an explicit table: identity for equal codes, plus the
//! spherical Web Mercator pair (EPSG:4326 <-> EPSG:3857). Any other pair is
//! an undefined transform and fails with [`Error::Reprojection`].

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::layer::Layer;
use geo::MapCoords;
use geo_types::Coord;
use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

fn wgs84_to_web_mercator(c: Coord<f64>) -> Coord<f64> {
    let x = EARTH_RADIUS_M * c.x.to_radians();
    let lat = c.y.clamp(-85.06, 85.06).to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat / 2.0).tan().ln();
    Coord { x, y }
}

fn web_mercator_to_wgs84(c: Coord<f64>) -> Coord<f64> {
    let lon = (c.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    Coord { x: lon, y: lat }
}

fn transform_for(from: u32, to: u32) -> Option<fn(Coord<f64>) -> Coord<f64>> {
    match (from, to) {
        (4326, 3857) => Some(wgs84_to_web_mercator),
        (3857, 4326) => Some(web_mercator_to_wgs84),
        _ => None,
    }
}

/// Reproject every geometry of a layer to `target`.
///
/// Returns a new layer; the input is untouched. Fails when the source CRS
/// is undefined or the (source, target) pair has no transform.
pub fn reproject_layer(layer: &Layer, target: &Crs) -> Result<Layer> {
    let source = layer.crs().clone();

    let from = source.epsg().ok_or_else(|| Error::Reprojection {
        from: source.identifier(),
        to: target.identifier(),
    })?;
    let to = target.epsg().ok_or_else(|| Error::Reprojection {
        from: source.identifier(),
        to: target.identifier(),
    })?;

    if from == to {
        return Ok(layer.clone());
    }

    let f = transform_for(from, to).ok_or_else(|| Error::Reprojection {
        from: source.identifier(),
        to: target.identifier(),
    })?;

    let mut out = Layer::new(layer.name(), target.clone());
    for feature in layer.iter() {
        let mut feature = feature.clone();
        feature.geometry = feature.geometry.map(|g| g.map_coords(f));
        out.push(feature);
    }
    Ok(out)
}
