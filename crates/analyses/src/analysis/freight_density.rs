//! Activity-unit density near freight corridors
//!
//! Buffers T-1 and T-2 freight routes by 500 feet, intersects the
//! corridor with the activity-unit hex grid for each vintage and compares
//! regional activity-unit totals against the totals inside the corridor.

use crate::aggregate::weighted_density_sum;
use crate::vector::{buffer_layer, overlay, BufferParams, OverlayMode};
use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::{load_layer, write_csv, Container, Table};
use tracing::info;

const BUFFER_FEET: f64 = 500.0;
const CLASS_COLUMN: &str = "freight_class";
const CORRIDOR_CLASSES: [&str; 2] = ["T-1", "T-2"];
const DENSITY_COLUMN: &str = "au_per_acre";
const TOTAL_COLUMN: &str = "au";

const VINTAGES: [(&str, &str); 2] = [
    ("activity_units_2050", "activity units 2050"),
    ("activity_units_2024", "activity units 2024"),
];

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let routes_src = Container::open(config.source("freight_routes")?)?;
    let freight = load_layer(&routes_src, "freight_routes", &crs)?.filter(|f| {
        matches!(f.text(CLASS_COLUMN), Some(class) if CORRIDOR_CLASSES.contains(&class))
    });
    info!(routes = freight.len(), "buffering freight corridors");
    let corridor = buffer_layer(&freight, BUFFER_FEET, &BufferParams::default());

    let au_src = Container::open(config.source("activity_units")?)?;
    let mut regional = Vec::with_capacity(VINTAGES.len());
    let mut within = Vec::with_capacity(VINTAGES.len());
    for (layer_name, _) in VINTAGES {
        let au = load_layer(&au_src, layer_name, &crs)?;
        let combined = overlay(&corridor, &au, OverlayMode::Intersection)?;
        regional.push(au.column_sum(TOTAL_COLUMN)?);
        within.push(weighted_density_sum(
            &combined,
            DENSITY_COLUMN,
            config.sqft_per_acre,
            config.missing_values,
        )?);
    }

    let mut columns = vec!["selection".to_string()];
    columns.extend(VINTAGES.iter().map(|(_, label)| label.to_string()));
    let mut table = Table::new(columns);
    let mut total_row = vec!["regional total".to_string()];
    total_row.extend(regional.iter().map(|v| v.to_string()));
    table.push_row(total_row)?;
    let mut within_row = vec!["within 500 ft of freight routes".to_string()];
    within_row.extend(within.iter().map(|v| v.to_string()));
    table.push_row(within_row)?;

    write_csv(config.output_file("density_and_freight.csv"), &table, false)?;
    info!("finished density and freight export");
    Ok(())
}
