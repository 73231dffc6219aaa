//! Geometry validity checks
//!
//! Overlay inputs are checked for degenerate and self-intersecting rings
//! before any set operation runs, so failures carry the operation name and
//! record index instead of surfacing as garbage output.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::Area;
use geo_types::{Geometry, Line, LineString, Polygon};
use rtplan_core::error::{Error, Result};
use rtplan_core::layer::Layer;

/// Check every polygon-family geometry of a layer.
///
/// Point and line layers pass unchecked; only polygon rings can carry the
/// defects that break overlay output.
pub fn check_layer(layer: &Layer, op: &'static str) -> Result<()> {
    for (index, feature) in layer.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        if let Some(reason) = geometry_issue(geometry) {
            return Err(Error::InvalidGeometry { op, index, reason });
        }
    }
    Ok(())
}

/// Describe what is wrong with a geometry, if anything
pub fn geometry_issue(geometry: &Geometry<f64>) -> Option<String> {
    match geometry {
        Geometry::Polygon(p) => polygon_issue(p),
        Geometry::MultiPolygon(mp) => mp.iter().find_map(polygon_issue),
        _ => None,
    }
}

fn polygon_issue(polygon: &Polygon<f64>) -> Option<String> {
    if let Some(reason) = ring_issue(polygon.exterior(), "exterior") {
        return Some(reason);
    }
    polygon
        .interiors()
        .iter()
        .find_map(|ring| ring_issue(ring, "interior"))
}

fn ring_issue(ring: &LineString<f64>, which: &str) -> Option<String> {
    let coords = &ring.0;
    if coords.is_empty() {
        return None;
    }
    if coords.len() < 4 {
        return Some(format!("{} ring has fewer than 4 coordinates", which));
    }
    if coords.first() != coords.last() {
        return Some(format!("{} ring is not closed", which));
    }
    if ring_area(ring) == 0.0 {
        return Some(format!("{} ring has zero area", which));
    }
    if ring_self_intersects(ring) {
        return Some(format!("{} ring is self-intersecting", which));
    }
    None
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Pairwise segment test, skipping adjacent segments which always share an
/// endpoint. Quadratic, acceptable for the ring sizes seen in planning
/// layers.
fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 1)..n {
            // Adjacent segments (including the closing wrap-around pair)
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            match line_intersection(segments[i], segments[j]) {
                Some(LineIntersection::SinglePoint { is_proper, .. }) if is_proper => {
                    return true
                }
                Some(LineIntersection::Collinear { .. }) => return true,
                _ => {}
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtplan_core::crs::Crs;
    use rtplan_core::layer::Feature;

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        )
    }

    fn bowtie() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 10.0),
                (10.0, 0.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_valid_polygon_passes() {
        assert_eq!(geometry_issue(&Geometry::Polygon(square())), None);
    }

    #[test]
    fn test_bowtie_is_flagged() {
        let issue = geometry_issue(&Geometry::Polygon(bowtie())).unwrap();
        assert!(issue.contains("self-intersecting"), "{}", issue);
    }

    #[test]
    fn test_degenerate_ring_is_flagged() {
        let sliver = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]),
            vec![],
        );
        let issue = geometry_issue(&Geometry::Polygon(sliver)).unwrap();
        assert!(issue.contains("fewer than 4"), "{}", issue);
    }

    #[test]
    fn test_zero_area_ring_is_flagged() {
        let flat = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (0.0, 0.0)]),
            vec![],
        );
        let issue = geometry_issue(&Geometry::Polygon(flat)).unwrap();
        assert!(issue.contains("zero area"), "{}", issue);
    }

    #[test]
    fn test_check_layer_reports_index() {
        let mut layer = Layer::new("zones", Crs::from_epsg(2285));
        layer.push(Feature::new(Geometry::Polygon(square())));
        layer.push(Feature::new(Geometry::Polygon(bowtie())));

        let err = check_layer(&layer, "overlay").unwrap_err();
        match err {
            Error::InvalidGeometry { op, index, .. } => {
                assert_eq!(op, "overlay");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_lines_pass_unchecked() {
        let mut layer = Layer::new("routes", Crs::from_epsg(2285));
        layer.push(Feature::new(Geometry::LineString(LineString::from(vec![
            (0.0, 0.0),
            (10.0, 10.0),
        ]))));
        assert!(check_layer(&layer, "overlay").is_ok());
    }
}
