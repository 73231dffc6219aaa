//! Layer overlay: boolean set operations between two polygon layers
//!
//! Output attributes are the union of both inputs' attributes for the
//! surviving regions; colliding column names are disambiguated by
//! suffixing (`_1` for the left layer, `_2` for the right). An empty
//! result is an empty layer, not an error.

use crate::vector::buffer::union_parts;
use crate::vector::validity;
use geo::{BooleanOps, BoundingRect, Intersects};
use geo_types::{Geometry, MultiPolygon, Rect};
use rayon::prelude::*;
use rtplan_core::error::{Error, Result};
use rtplan_core::layer::{AttributeValue, Feature, Layer};
use std::collections::HashMap;

/// Boolean set operation between two layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Intersection,
    Union,
    Difference,
    SymmetricDifference,
}

/// Compute a boolean set operation between the polygon geometries of two
/// layers.
///
/// Both layers must share an equivalent, defined CRS. Inputs with
/// degenerate or self-intersecting rings fail with
/// [`Error::InvalidGeometry`]; records without polygon geometry are
/// ignored. Results are invariant to input record order up to output
/// ordering, which follows the left layer's record order.
pub fn overlay(a: &Layer, b: &Layer, mode: OverlayMode) -> Result<Layer> {
    if !a.crs().is_equivalent(b.crs()) {
        return Err(Error::CrsMismatch(
            a.crs().identifier(),
            b.crs().identifier(),
        ));
    }
    validity::check_layer(a, "overlay")?;
    validity::check_layer(b, "overlay")?;

    let a_polys = polygon_records(a);
    let b_polys = polygon_records(b);

    let mut out = Layer::new("overlay", a.crs().clone());
    match mode {
        OverlayMode::Intersection => {
            for feature in intersection_features(a, &a_polys, b, &b_polys) {
                out.push(feature);
            }
        }
        OverlayMode::Union => {
            for feature in intersection_features(a, &a_polys, b, &b_polys) {
                out.push(feature);
            }
            for feature in difference_features(a, &a_polys, &b_polys) {
                out.push(feature);
            }
            for feature in difference_features(b, &b_polys, &a_polys) {
                out.push(feature);
            }
        }
        OverlayMode::Difference => {
            for feature in difference_features(a, &a_polys, &b_polys) {
                out.push(feature);
            }
        }
        OverlayMode::SymmetricDifference => {
            for feature in difference_features(a, &a_polys, &b_polys) {
                out.push(feature);
            }
            for feature in difference_features(b, &b_polys, &a_polys) {
                out.push(feature);
            }
        }
    }
    Ok(out)
}

struct PolygonRecord {
    index: usize,
    geometry: MultiPolygon<f64>,
    bbox: Rect<f64>,
}

fn polygon_records(layer: &Layer) -> Vec<PolygonRecord> {
    layer
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let geometry = feature_multipolygon(feature)?;
            let bbox = geometry.bounding_rect()?;
            Some(PolygonRecord {
                index,
                geometry,
                bbox,
            })
        })
        .collect()
}

pub(crate) fn feature_multipolygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
    match feature.geometry.as_ref()? {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

/// Pairwise intersections with a bounding-box prefilter, parallel over the
/// left layer's records
fn intersection_features(
    a: &Layer,
    a_polys: &[PolygonRecord],
    b: &Layer,
    b_polys: &[PolygonRecord],
) -> Vec<Feature> {
    a_polys
        .par_iter()
        .flat_map_iter(|ra| {
            b_polys
                .iter()
                .filter(|rb| ra.bbox.intersects(&rb.bbox))
                .filter_map(|rb| {
                    let piece = ra.geometry.intersection(&rb.geometry);
                    if piece.0.is_empty() {
                        return None;
                    }
                    let properties = merge_properties(
                        &a.features()[ra.index].properties,
                        &b.features()[rb.index].properties,
                    );
                    let mut feature = Feature::new(Geometry::MultiPolygon(piece));
                    feature.properties = properties;
                    Some(feature)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Each left record minus the dissolved union of the right layer, keeping
/// the left attributes
fn difference_features(
    layer: &Layer,
    records: &[PolygonRecord],
    mask_records: &[PolygonRecord],
) -> Vec<Feature> {
    let mask = union_parts(mask_records.iter().map(|r| r.geometry.clone()));
    records
        .par_iter()
        .filter_map(|record| {
            let remainder = if mask.0.is_empty() {
                record.geometry.clone()
            } else {
                record.geometry.difference(&mask)
            };
            if remainder.0.is_empty() {
                return None;
            }
            let mut feature = layer.features()[record.index].clone();
            feature.geometry = Some(Geometry::MultiPolygon(remainder));
            Some(feature)
        })
        .collect()
}

/// Union of two attribute maps; colliding keys are suffixed `_1` / `_2`
pub(crate) fn merge_properties(
    left: &HashMap<String, AttributeValue>,
    right: &HashMap<String, AttributeValue>,
) -> HashMap<String, AttributeValue> {
    let mut out = HashMap::with_capacity(left.len() + right.len());
    for (key, value) in left {
        if right.contains_key(key) {
            out.insert(format!("{}_1", key), value.clone());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in right {
        if left.contains_key(key) {
            out.insert(format!("{}_2", key), value.clone());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}
