//! Transit service coverage of dense areas
//!
//! Buffers transit stops by a half and a quarter mile, restricts the
//! activity-unit grid to supportive densities, and summarizes people,
//! jobs and activity units with and without service per service tier.

use crate::aggregate::service_area_summary;
use crate::vector::{buffer_layer, BufferParams};
use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::csv_io::percent_string;
use rtplan_core::io::{load_layer, write_csv, Container, Table};
use rtplan_core::layer::Layer;
use tracing::info;

const SERVICE_TIERS: [&str; 5] = ["local", "all_day", "frequent", "hct", "brt"];
const METRICS: [&str; 3] = ["population", "jobs", "au"];
const DENSITY_COLUMN: &str = "au_per_acre";
/// Minimum activity units per acre considered transit-supportive
const SUPPORTIVE_DENSITY: f64 = 30.0;

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let transit_src = Container::open(config.source("transit_network")?)?;
    let stops = load_layer(&transit_src, "transit_stops", &crs)?;
    let half_mile = buffer_layer(&stops, config.feet_per_mile / 2.0, &BufferParams::default());
    let quarter_mile = buffer_layer(&stops, config.feet_per_mile / 4.0, &BufferParams::default());

    let au_src = Container::open(config.source("activity_units")?)?;
    let au = load_layer(&au_src, "activity_units_2050", &crs)?;
    let dense = au.filter(|f| f.number(DENSITY_COLUMN).unwrap_or(0.0) >= SUPPORTIVE_DENSITY);
    info!(
        dense = dense.len(),
        total = au.len(),
        "restricted grid to supportive densities"
    );

    let mut table = Table::new([
        "route type",
        "people with service",
        "jobs with service",
        "activity units with service",
        "people w/o service",
        "jobs w/o service",
        "activity units w/o service",
        "% people with service",
        "% jobs with service",
        "% activity units with service",
    ]);

    for (buffered, suffix) in [(&half_mile, "_half_mi"), (&quarter_mile, "_quarter_mi")] {
        let categories: Vec<(String, Layer)> = SERVICE_TIERS
            .iter()
            .map(|tier| {
                let filter = buffered.filter(|f| f.number(tier).unwrap_or(0.0) > 0.0);
                (format!("{}{}", tier, suffix), filter)
            })
            .collect();

        for row in service_area_summary(&dense, &METRICS, &categories)? {
            let mut cells = vec![row.category.clone()];
            cells.extend(row.with_service.iter().map(|v| v.to_string()));
            cells.extend(row.without_service.iter().map(|v| v.to_string()));
            cells.extend(row.shares.iter().map(|s| percent_string(*s, 1)));
            table.push_row(cells)?;
        }
    }

    write_csv(
        config.output_file("transit_stops_density_intersect.csv"),
        &table,
        false,
    )?;
    info!("finished transit service coverage export");
    Ok(())
}
