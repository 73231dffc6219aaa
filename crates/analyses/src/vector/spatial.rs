//! Spatial predicates across layers: dissolve, clip, point-in-polygon,
//! spatial join

use crate::vector::buffer::{buffer_layer, union_parts, BufferParams};
use crate::vector::overlay::{feature_multipolygon, merge_properties};
use geo::{BooleanOps, BoundingRect, Contains, Intersects};
use geo_types::{Geometry, MultiLineString, MultiPolygon};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use rtplan_core::error::{Error, Result};
use rtplan_core::layer::{Feature, Layer};

/// Geometric predicate for [`spatial_join`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPredicate {
    Intersects,
    Within,
}

/// Union of all polygon geometries of a layer into one region.
///
/// Per-record identity is not preserved; the result is the dissolved
/// service area the record set covers. Empty when the layer holds no
/// polygon geometry.
pub fn dissolve(layer: &Layer) -> MultiPolygon<f64> {
    union_parts(layer.iter().filter_map(feature_multipolygon))
}

/// Restrict a layer to the dissolved region of a polygon mask.
///
/// Points are kept whole when they intersect the mask; lines are cut at
/// the mask boundary; polygons are intersected with it.
pub fn clip(layer: &Layer, mask: &Layer) -> Result<Layer> {
    if !layer.crs().is_equivalent(mask.crs()) {
        return Err(Error::CrsMismatch(
            layer.crs().identifier(),
            mask.crs().identifier(),
        ));
    }

    let region = dissolve(mask);
    let mut out = Layer::new(layer.name(), layer.crs().clone());
    if region.0.is_empty() {
        return Ok(out);
    }

    for feature in layer.iter() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => {
                if geometry.intersects(&region) {
                    out.push(feature.clone());
                }
            }
            Geometry::LineString(ls) => {
                let cut = region.clip(&MultiLineString::new(vec![ls.clone()]), false);
                push_clipped_lines(&mut out, feature, cut);
            }
            Geometry::MultiLineString(mls) => {
                let cut = region.clip(mls, false);
                push_clipped_lines(&mut out, feature, cut);
            }
            _ => {
                if let Some(mp) = feature_multipolygon(feature) {
                    let piece = mp.intersection(&region);
                    if !piece.0.is_empty() {
                        let mut clipped = feature.clone();
                        clipped.geometry = Some(Geometry::MultiPolygon(piece));
                        out.push(clipped);
                    }
                }
            }
        }
    }
    Ok(out)
}

fn push_clipped_lines(out: &mut Layer, feature: &Feature, cut: MultiLineString<f64>) {
    let kept: Vec<_> = cut.0.into_iter().filter(|ls| ls.0.len() >= 2).collect();
    if kept.is_empty() {
        return;
    }
    let mut clipped = feature.clone();
    clipped.geometry = Some(Geometry::MultiLineString(MultiLineString::new(kept)));
    out.push(clipped);
}

/// Flag each point of a layer by whether it intersects the dissolved
/// polygon region.
///
/// With `buffer > 0` the test uses points expanded by that distance; the
/// output keeps the original point geometry either way and gains a boolean
/// `flag_column`. Returns a new layer; the input is untouched.
pub fn points_in_polygon(
    points: &Layer,
    polygons: &Layer,
    flag_column: &str,
    buffer: f64,
) -> Result<Layer> {
    if !points.crs().is_equivalent(polygons.crs()) {
        return Err(Error::CrsMismatch(
            points.crs().identifier(),
            polygons.crs().identifier(),
        ));
    }

    let region = dissolve(polygons);
    let probe = if buffer > 0.0 {
        buffer_layer(points, buffer, &BufferParams::default())
    } else {
        points.clone()
    };

    let mut out = Layer::with_capacity(points.name(), points.crs().clone(), points.len());
    for (feature, probe_feature) in points.iter().zip(probe.iter()) {
        let hit = probe_feature
            .geometry
            .as_ref()
            .map(|g| !region.0.is_empty() && g.intersects(&region))
            .unwrap_or(false);
        let mut flagged = feature.clone();
        flagged.set(flag_column, hit);
        out.push(flagged);
    }
    Ok(out)
}

/// Inner spatial join: left features matched against right features by a
/// geometric predicate.
///
/// Each left feature appears at most once, paired with its matching right
/// feature of lowest index (deterministic regardless of index insertion
/// order). Attributes are merged with overlay's collision suffixing.
pub fn spatial_join(left: &Layer, right: &Layer, predicate: JoinPredicate) -> Result<Layer> {
    if !left.crs().is_equivalent(right.crs()) {
        return Err(Error::CrsMismatch(
            left.crs().identifier(),
            right.crs().identifier(),
        ));
    }

    // R-tree over the right layer's envelopes; candidates are then checked
    // with the exact predicate.
    let mut entries = Vec::new();
    for (index, feature) in right.iter().enumerate() {
        let Some(rect) = feature.geometry.as_ref().and_then(|g| g.bounding_rect()) else {
            continue;
        };
        entries.push(GeomWithData::new(
            Rectangle::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
            index,
        ));
    }
    let tree: RTree<GeomWithData<Rectangle<[f64; 2]>, usize>> = RTree::bulk_load(entries);

    let mut out = Layer::new(left.name(), left.crs().clone());
    for feature in left.iter() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let Some(rect) = geometry.bounding_rect() else {
            continue;
        };
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        let mut candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        candidates.sort_unstable();

        let matched = candidates.into_iter().find(|&index| {
            right.features()[index]
                .geometry
                .as_ref()
                .map(|rg| match predicate {
                    JoinPredicate::Intersects => geometry.intersects(rg),
                    JoinPredicate::Within => rg.contains(geometry),
                })
                .unwrap_or(false)
        });

        if let Some(index) = matched {
            let mut joined = Feature::new(geometry.clone());
            joined.properties =
                merge_properties(&feature.properties, &right.features()[index].properties);
            out.push(joined);
        }
    }
    Ok(out)
}
