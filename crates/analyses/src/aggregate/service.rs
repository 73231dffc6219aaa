//! Service-area summaries
//!
//! For each named category (a transit service tier, an equity population
//! group) the universe of records is split into the part intersecting the
//! category's filter geometry ("with service") and the remainder. Sums are
//! computed per metric column; shares stay numeric.

use crate::vector::spatial::clip;
use rtplan_core::error::Result;
use rtplan_core::layer::Layer;

/// One category row of a service-area summary
#[derive(Debug, Clone)]
pub struct ServiceSummaryRow {
    pub category: String,
    /// Per-metric totals across the whole universe
    pub totals: Vec<f64>,
    /// Per-metric sums over records intersecting the filter geometry
    pub with_service: Vec<f64>,
    /// `totals - with_service`, element-wise
    pub without_service: Vec<f64>,
    /// `with_service / totals`; NaN when the total is zero. The NaN
    /// sentinel is the uniform zero-denominator policy: it never raises
    /// and renders as an empty cell at export.
    pub shares: Vec<f64>,
}

/// Summarize metric columns of `universe` inside and outside each
/// category's filter geometry.
///
/// `categories` pairs a label with the polygon layer whose dissolved
/// region defines "with service" for that label. For every row,
/// `with_service + without_service == totals` holds exactly by
/// construction.
pub fn service_area_summary(
    universe: &Layer,
    metrics: &[&str],
    categories: &[(String, Layer)],
) -> Result<Vec<ServiceSummaryRow>> {
    let totals: Vec<f64> = metrics
        .iter()
        .map(|m| universe.column_sum(m))
        .collect::<Result<_>>()?;

    let mut rows = Vec::with_capacity(categories.len());
    for (label, filter) in categories {
        let inside = clip(universe, filter)?;
        let with_service: Vec<f64> = metrics
            .iter()
            .map(|m| {
                if inside.is_empty() {
                    Ok(0.0)
                } else {
                    inside.column_sum(m)
                }
            })
            .collect::<Result<_>>()?;
        let without_service: Vec<f64> = totals
            .iter()
            .zip(&with_service)
            .map(|(total, with)| total - with)
            .collect();
        let shares: Vec<f64> = totals
            .iter()
            .zip(&with_service)
            .map(|(total, with)| if *total == 0.0 { f64::NAN } else { with / total })
            .collect();

        rows.push(ServiceSummaryRow {
            category: label.clone(),
            totals: totals.clone(),
            with_service,
            without_service,
            shares,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{Geometry, LineString, Polygon};
    use rtplan_core::crs::Crs;
    use rtplan_core::layer::Feature;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Geometry<f64> {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        ))
    }

    /// Universe: two hexes-as-squares, one inside the service area and one
    /// far outside
    fn universe() -> Layer {
        let mut layer = Layer::new("au", Crs::from_epsg(2285));
        let mut inside = Feature::new(rect(0.0, 0.0, 10.0, 10.0));
        inside.set("population", 100.0);
        inside.set("jobs", 40.0);
        layer.push(inside);
        let mut outside = Feature::new(rect(100.0, 100.0, 110.0, 110.0));
        outside.set("population", 60.0);
        outside.set("jobs", 10.0);
        layer.push(outside);
        layer
    }

    fn service_filter() -> Layer {
        let mut layer = Layer::new("buffered_stops", Crs::from_epsg(2285));
        layer.push(Feature::new(rect(-5.0, -5.0, 15.0, 15.0)));
        layer
    }

    #[test]
    fn test_with_plus_without_equals_total() {
        let rows = service_area_summary(
            &universe(),
            &["population", "jobs"],
            &[("local".to_string(), service_filter())],
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        for i in 0..2 {
            assert_relative_eq!(
                row.with_service[i] + row.without_service[i],
                row.totals[i],
                epsilon = 1e-9
            );
        }
        assert_relative_eq!(row.with_service[0], 100.0, epsilon = 1e-9);
        assert_relative_eq!(row.without_service[0], 60.0, epsilon = 1e-9);
        assert_relative_eq!(row.shares[0], 100.0 / 160.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_total_share_is_nan() {
        let mut empty_universe = Layer::new("au", Crs::from_epsg(2285));
        let mut f = Feature::new(rect(0.0, 0.0, 10.0, 10.0));
        f.set("population", 0.0);
        empty_universe.push(f);

        let rows = service_area_summary(
            &empty_universe,
            &["population"],
            &[("local".to_string(), service_filter())],
        )
        .unwrap();

        assert!(rows[0].shares[0].is_nan());
        assert_eq!(rows[0].with_service[0], 0.0);
        assert_eq!(rows[0].without_service[0], 0.0);
    }

    #[test]
    fn test_empty_filter_geometry() {
        let empty_filter = Layer::new("none", Crs::from_epsg(2285));
        let rows = service_area_summary(
            &universe(),
            &["population"],
            &[("brt".to_string(), empty_filter)],
        )
        .unwrap();

        assert_eq!(rows[0].with_service[0], 0.0);
        assert_relative_eq!(rows[0].without_service[0], 160.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiple_categories_ordered() {
        let rows = service_area_summary(
            &universe(),
            &["population"],
            &[
                ("local".to_string(), service_filter()),
                ("hct".to_string(), Layer::new("none", Crs::from_epsg(2285))),
            ],
        )
        .unwrap();
        assert_eq!(rows[0].category, "local");
        assert_eq!(rows[1].category, "hct");
    }
}
