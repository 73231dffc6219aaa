//! Geometric measurements: area and length

use geo::{Area as GeoArea, Euclidean, Geometry, Length};

/// Calculate the area of a geometry.
///
/// Returns unsigned area in CRS units squared; non-areal geometries
/// measure zero.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        _ => 0.0,
    }
}

/// Calculate the length of a linear geometry.
///
/// Returns Euclidean length in CRS units; non-linear geometries measure
/// zero.
pub fn length(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::LineString(ls) => ls.length::<Euclidean>(),
        Geometry::MultiLineString(mls) => {
            mls.0.iter().map(|ls| ls.length::<Euclidean>()).sum()
        }
        Geometry::Line(l) => {
            let dx = l.end.x - l.start.x;
            let dy = l.end.y - l.start.y;
            (dx * dx + dy * dy).sqrt()
        }
        _ => 0.0,
    }
}
