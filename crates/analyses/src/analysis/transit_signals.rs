//! Signals on frequent transit routes
//!
//! Buffers ITS signals by 100 feet, joins them to frequent transit
//! routes, exports the joined layer plus a tabular view, and counts the
//! yes/no values of the transit-signal-priority and pedestrian-signal
//! columns.

use crate::aggregate::value_counts;
use crate::vector::{buffer_layer, spatial_join, BufferParams, JoinPredicate};
use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::csv_io::layer_table;
use rtplan_core::io::{load_layer, write_csv, Container, Table};
use tracing::info;

const SIGNAL_BUFFER_FEET: f64 = 100.0;
const EXPORT_COLUMNS: [&str; 4] = ["signal_id", "tsp", "ped_signal", "route_id"];
const COUNT_COLUMNS: [(&str, &str); 2] = [
    ("tsp", "tsp_counts.csv"),
    ("ped_signal", "ped_signal_counts.csv"),
];

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let signals_src = Container::open(config.source("its_signals")?)?;
    let signals = load_layer(&signals_src, "its_signals", &crs)?;
    let buffered = buffer_layer(&signals, SIGNAL_BUFFER_FEET, &BufferParams::default());

    let transit_src = Container::open(config.source("transit_network")?)?;
    let routes = load_layer(&transit_src, "transit_routes", &crs)?
        .filter(|f| f.number("frequent").unwrap_or(0.0) > 0.0);
    info!(
        signals = signals.len(),
        frequent_routes = routes.len(),
        "joining signals to frequent routes"
    );

    let mut joined = spatial_join(&buffered, &routes, JoinPredicate::Intersects)?;
    joined.set_name("frequent_transit_routes_and_signals");

    // Stage every output before writing anything
    let joined_table = layer_table(&joined, &EXPORT_COLUMNS)?;
    let mut count_tables = Vec::new();
    for (column, file) in COUNT_COLUMNS {
        let mut table = Table::new([column, "count"]);
        for (value, count) in value_counts(&joined, column)? {
            table.push_row(vec![value, count.to_string()])?;
        }
        count_tables.push((file, table));
    }

    let out = Container::create(config.output_container_path())?;
    out.write_layer("frequent_transit_routes_and_signals", &joined)?;
    write_csv(
        config.output_file("frequent_transit_routes_and_signal.csv"),
        &joined_table,
        false,
    )?;
    for (file, table) in count_tables {
        write_csv(config.output_file(file), &table, false)?;
    }
    info!(matched = joined.len(), "finished signals on frequent routes");
    Ok(())
}
