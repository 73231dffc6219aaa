//! Pedestrian signals in dense areas
//!
//! Classifies activity-unit hexes as high or low density, joins signals
//! to the hex they fall within, cross-tabulates pedestrian-signal
//! availability against density class, and exports the accessible
//! pedestrian signals found in dense hexes as a layer.

use crate::aggregate::crosstab;
use crate::vector::{spatial_join, JoinPredicate};
use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::{load_layer, write_csv, Container, Table};
use rtplan_core::layer::Layer;
use tracing::info;

const PED_COLUMN: &str = "ped_signal";
const DENSITY_COLUMN: &str = "au_per_acre";
const CLASS_COLUMN: &str = "density_class";
/// Activity units per acre above which a hex counts as high density
const HIGH_DENSITY: f64 = 25.0;

/// Source data carries the literal string "Null" for signals never
/// surveyed; fold those into "No"
fn normalize_ped_signal(signals: &Layer) -> Layer {
    let mut out = Layer::with_capacity(signals.name(), signals.crs().clone(), signals.len());
    for feature in signals.iter() {
        let mut f = feature.clone();
        match f.text(PED_COLUMN) {
            Some("Null") | None => f.set(PED_COLUMN, "No"),
            _ => {}
        }
        out.push(f);
    }
    out
}

/// Attach a density class label to every hex
fn classify_density(au: &Layer) -> Layer {
    let mut out = Layer::with_capacity(au.name(), au.crs().clone(), au.len());
    for feature in au.iter() {
        let mut f = feature.clone();
        let class = if f.number(DENSITY_COLUMN).unwrap_or(0.0) > HIGH_DENSITY {
            "high density"
        } else {
            "low density"
        };
        f.set(CLASS_COLUMN, class);
        out.push(f);
    }
    out
}

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let signals_src = Container::open(config.source("its_signals")?)?;
    let signals = normalize_ped_signal(&load_layer(&signals_src, "its_signals", &crs)?);

    let au_src = Container::open(config.source("activity_units")?)?;
    let au = classify_density(&load_layer(&au_src, "activity_units_2050", &crs)?);

    let joined = spatial_join(&signals, &au, JoinPredicate::Within)?;
    info!(joined = joined.len(), "signals matched to hexes");

    let xtab = crosstab(&joined, PED_COLUMN, CLASS_COLUMN)?;
    let mut columns = vec![PED_COLUMN.to_string()];
    columns.extend(xtab.col_labels.iter().cloned());
    let mut table = Table::new(columns);
    for (label, counts) in xtab.row_labels.iter().zip(&xtab.counts) {
        let mut row = vec![label.clone()];
        row.extend(counts.iter().map(|c| c.to_string()));
        table.push_row(row)?;
    }

    let mut accessible = joined.filter(|f| {
        f.text(PED_COLUMN) == Some("Yes") && f.text(CLASS_COLUMN) == Some("high density")
    });
    accessible.set_name("accessible_ped_signals_in_dense_areas");

    let out = Container::create(config.output_container_path())?;
    write_csv(config.output_file("density_and_signals.csv"), &table, true)?;
    out.write_layer("accessible_ped_signals_in_dense_areas", &accessible)?;
    info!("finished density and signals export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point};
    use rtplan_core::crs::Crs;
    use rtplan_core::layer::Feature;

    #[test]
    fn test_normalize_ped_signal() {
        let mut signals = Layer::new("its_signals", Crs::from_epsg(2285));
        for value in ["Yes", "Null", "No"] {
            let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
            f.set(PED_COLUMN, value);
            signals.push(f);
        }
        signals.push(Feature::new(Geometry::Point(Point::new(0.0, 0.0))));

        let out = normalize_ped_signal(&signals);
        let values: Vec<_> = out.iter().map(|f| f.text(PED_COLUMN).unwrap()).collect();
        assert_eq!(values, ["Yes", "No", "No", "No"]);
    }

    #[test]
    fn test_classify_density_threshold() {
        let mut au = Layer::new("au", Crs::from_epsg(2285));
        for density in [40.0, 25.0, 3.0] {
            let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
            f.set(DENSITY_COLUMN, density);
            au.push(f);
        }

        let out = classify_density(&au);
        let classes: Vec<_> = out.iter().map(|f| f.text(CLASS_COLUMN).unwrap()).collect();
        // 25.0 exactly is not above the threshold
        assert_eq!(classes, ["high density", "low density", "low density"]);
    }
}
