//! Transit stops near city boundaries
//!
//! Flags every transit stop within 100 feet of a city boundary and
//! exports the flagged layer plus a count summary.

use crate::aggregate::value_counts;
use crate::vector::points_in_polygon;
use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::{load_layer, write_csv, Container, Table};
use tracing::info;

const FLAG_COLUMN: &str = "in_city_100ft";
const CITY_BUFFER_FEET: f64 = 100.0;

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let transit_src = Container::open(config.source("transit_network")?)?;
    let stops = load_layer(&transit_src, "transit_stops", &crs)?;

    let cities_src = Container::open(config.source("cities")?)?;
    let cities = load_layer(&cities_src, "cities", &crs)?;

    let mut flagged = points_in_polygon(&stops, &cities, FLAG_COLUMN, CITY_BUFFER_FEET)?;
    flagged.set_name("transit_stops_city_flag");

    let mut counts = Table::new([FLAG_COLUMN, "count"]);
    for (value, count) in value_counts(&flagged, FLAG_COLUMN)? {
        counts.push_row(vec![value, count.to_string()])?;
    }

    let out = Container::create(config.output_container_path())?;
    out.write_layer("transit_stops_city_flag", &flagged)?;
    write_csv(
        config.output_file("transit_stops_city_counts.csv"),
        &counts,
        false,
    )?;
    info!(stops = flagged.len(), "finished stops-in-cities export");
    Ok(())
}
