//! Buffer operations
//!
//! Create buffer zones around geometries. Points become circles
//! approximated as polygons; lines and polygon boundaries are offset by
//! unioning per-segment capsules. A distance of zero or less is a no-op
//! copy of the input, never an error.

use geo::BooleanOps;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use rayon::prelude::*;
use rtplan_core::layer::{Feature, Layer};
use std::f64::consts::PI;

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Number of segments to approximate curved arcs (default: 16)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self { segments: 16 }
    }
}

/// Buffer every geometry of a layer outward by `distance`.
///
/// Distance is in the linear units of the layer's CRS. When
/// `distance <= 0` the layer is returned unchanged (a copy); the input is
/// never mutated.
pub fn buffer_layer(layer: &Layer, distance: f64, params: &BufferParams) -> Layer {
    if distance <= 0.0 {
        return layer.clone();
    }

    let segments = params.segments.max(4);
    let features: Vec<Feature> = layer
        .features()
        .par_iter()
        .map(|feature| {
            let mut out = feature.clone();
            out.geometry = feature
                .geometry
                .as_ref()
                .map(|g| Geometry::MultiPolygon(buffer_geometry(g, distance, segments)));
            out
        })
        .collect();

    let mut out = Layer::with_capacity(layer.name(), layer.crs().clone(), features.len());
    for feature in features {
        out.push(feature);
    }
    out
}

/// Buffer a single geometry into a multipolygon
pub fn buffer_geometry(geometry: &Geometry<f64>, distance: f64, segments: usize) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Point(p) => MultiPolygon::new(vec![circle(p.0, distance, segments)]),
        Geometry::MultiPoint(mp) => {
            union_all(mp.iter().map(|p| circle(p.0, distance, segments)))
        }
        Geometry::Line(l) => {
            MultiPolygon::new(vec![capsule(l.start, l.end, distance, segments)])
        }
        Geometry::LineString(ls) => buffer_line_string(ls, distance, segments),
        Geometry::MultiLineString(mls) => union_parts(
            mls.iter()
                .map(|ls| buffer_line_string(ls, distance, segments)),
        ),
        Geometry::Polygon(p) => buffer_polygon(p, distance, segments),
        Geometry::MultiPolygon(mp) => {
            union_parts(mp.iter().map(|p| buffer_polygon(p, distance, segments)))
        }
        Geometry::Rect(r) => buffer_polygon(&r.to_polygon(), distance, segments),
        Geometry::Triangle(t) => buffer_polygon(&t.to_polygon(), distance, segments),
        Geometry::GeometryCollection(gc) => union_parts(
            gc.iter().map(|g| buffer_geometry(g, distance, segments)),
        ),
    }
}

fn buffer_line_string(ls: &LineString<f64>, distance: f64, segments: usize) -> MultiPolygon<f64> {
    if ls.0.len() < 2 {
        return match ls.0.first() {
            Some(&c) => MultiPolygon::new(vec![circle(c, distance, segments)]),
            None => MultiPolygon::new(vec![]),
        };
    }
    union_all(
        ls.0.windows(2)
            .map(|w| capsule(w[0], w[1], distance, segments)),
    )
}

fn buffer_polygon(polygon: &Polygon<f64>, distance: f64, segments: usize) -> MultiPolygon<f64> {
    // Outward offset: the polygon itself plus capsules along every ring.
    // Capsules along interior rings also shrink the holes, which is the
    // correct outward-buffer behavior.
    let mut parts = vec![MultiPolygon::new(vec![polygon.clone()])];
    parts.push(buffer_line_string(polygon.exterior(), distance, segments));
    for ring in polygon.interiors() {
        parts.push(buffer_line_string(ring, distance, segments));
    }
    union_parts(parts.into_iter())
}

/// Circle around a center point, approximated with `segments` vertices
fn circle(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let mut coords = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        coords.push((
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        ));
    }
    coords.push(coords[0]);
    Polygon::new(LineString::from(coords), vec![])
}

/// Stadium-shaped buffer of a single segment: a rectangle with a
/// semicircular cap at each end
fn capsule(a: Coord<f64>, b: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return circle(a, radius, segments);
    }

    let theta = dy.atan2(dx);
    let half = (segments / 2).max(2);
    let mut coords = Vec::with_capacity(segments + 3);

    // Cap around b, sweeping from theta - 90deg to theta + 90deg
    for i in 0..=half {
        let angle = theta - PI / 2.0 + PI * i as f64 / half as f64;
        coords.push((b.x + radius * angle.cos(), b.y + radius * angle.sin()));
    }
    // Cap around a, sweeping from theta + 90deg to theta + 270deg
    for i in 0..=half {
        let angle = theta + PI / 2.0 + PI * i as f64 / half as f64;
        coords.push((a.x + radius * angle.cos(), a.y + radius * angle.sin()));
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

fn union_all(polygons: impl Iterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    union_parts(polygons.map(|p| MultiPolygon::new(vec![p])))
}

/// Fold a sequence of multipolygons into their union
pub(crate) fn union_parts(parts: impl Iterator<Item = MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let mut acc = MultiPolygon::new(vec![]);
    for part in parts {
        if part.0.is_empty() {
            continue;
        }
        acc = if acc.0.is_empty() { part } else { acc.union(&part) };
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use geo_types::Point;
    use rtplan_core::crs::Crs;

    fn point_layer() -> Layer {
        let mut layer = Layer::new("stops", Crs::from_epsg(2285));
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set("stop_id", "s-1");
        layer.push(f);
        layer
    }

    #[test]
    fn test_zero_distance_is_noop() {
        let layer = point_layer();
        let out = buffer_layer(&layer, 0.0, &BufferParams::default());
        assert_eq!(out.len(), 1);
        match (&layer.features()[0].geometry, &out.features()[0].geometry) {
            (Some(Geometry::Point(a)), Some(Geometry::Point(b))) => assert_eq!(a, b),
            _ => panic!("geometry changed on zero-distance buffer"),
        }
    }

    #[test]
    fn test_negative_distance_is_noop() {
        let layer = point_layer();
        let out = buffer_layer(&layer, -50.0, &BufferParams::default());
        assert!(matches!(
            out.features()[0].geometry,
            Some(Geometry::Point(_))
        ));
    }

    #[test]
    fn test_point_buffer_area() {
        let layer = point_layer();
        let out = buffer_layer(&layer, 10.0, &BufferParams { segments: 64 });
        let area = match &out.features()[0].geometry {
            Some(Geometry::MultiPolygon(mp)) => mp.unsigned_area(),
            _ => panic!("expected polygons"),
        };
        let expected = PI * 100.0;
        let error = (area - expected).abs() / expected;
        assert!(error < 0.01, "circle area error {:.2}%", error * 100.0);
    }

    #[test]
    fn test_attributes_preserved() {
        let layer = point_layer();
        let out = buffer_layer(&layer, 5.0, &BufferParams::default());
        assert_eq!(out.features()[0].text("stop_id"), Some("s-1"));
    }

    #[test]
    fn test_segment_capsule_area() {
        let capsule = capsule(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            1.0,
            64,
        );
        // rectangle 10 x 2 plus a full unit circle from the two caps
        let expected = 20.0 + PI;
        let error = (capsule.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.01);
    }

    #[test]
    fn test_convex_polygon_buffer_is_monotonic() {
        let square = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        );
        let original = square.unsigned_area();
        let buffered = buffer_geometry(&Geometry::Polygon(square), 2.0, 32);
        assert!(
            buffered.unsigned_area() >= original,
            "outward buffer shrank a convex polygon"
        );
    }

    #[test]
    fn test_line_buffer_covers_line_vicinity() {
        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]));
        let buffered = buffer_geometry(&line, 5.0, 32);
        // ~ 100 x 10 corridor plus end caps
        let area = buffered.unsigned_area();
        assert!(area > 1000.0 && area < 1100.0, "corridor area {}", area);
    }
}
