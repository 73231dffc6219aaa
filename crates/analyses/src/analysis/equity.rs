//! Equity population coverage of the transit service area
//!
//! Buffers transit routes by three-quarters of a mile (excluding
//! commuter-rail, express and ferry service), assigns population parcels
//! to tracts and to the inside/outside of the buffered service area,
//! weights parcel population by each tract's equity-group shares, and
//! summarizes group populations and shares by jurisdiction.

use crate::vector::{
    buffer_layer, dissolve, points_in_polygon, spatial_join, BufferParams, JoinPredicate,
};
use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::csv_io::{number_string, percent_string};
use rtplan_core::io::{load_layer, read_csv, write_csv, Container, Table};
use rtplan_core::layer::{Feature, Layer};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Equity focus groups, matching the `<group>_share` columns of the
/// equity shares table
const GROUPS: [&str; 6] = ["poc", "pov200", "lep", "youth", "older", "dis"];

const POPULATION_COLUMN: &str = "population_2050";
const TRACT_COLUMN: &str = "tract_id";
const COUNTY_COLUMN: &str = "county";
const FLAG_COLUMN: &str = "in_service_area";
const INSIDE: &str = "Inside Service Area";
const OUTSIDE: &str = "Outside Service Area";
const REGION: &str = "Region";

/// Commuter rail and express routes of the regional agency, and all
/// ferries, do not define the service area
fn excluded_route(feature: &Feature) -> bool {
    let route_type = feature.number("route_type").unwrap_or(0.0);
    let regional_agency = feature.text("agency_id") == Some("6");
    ((route_type == 2.0 || route_type == 3.0) && regional_agency) || route_type == 4.0
}

/// Dissolved three-quarter-mile service area around the kept routes
fn service_area(routes: &Layer, feet_per_mile: f64) -> Layer {
    let kept = routes.filter(|f| !excluded_route(f));
    let buffered = buffer_layer(&kept, 0.75 * feet_per_mile, &BufferParams::default());
    let region = dissolve(&buffered);

    let mut layer = Layer::new("transit_service_area", routes.crs().clone());
    if !region.0.is_empty() {
        let mut f = Feature::new(geo_types::Geometry::MultiPolygon(region));
        f.set("area", INSIDE);
        layer.push(f);
    }
    layer
}

/// Per-tract equity group shares, keyed by tract id.
///
/// Unparseable cells count as zero, mirroring the zero-fill treatment of
/// missing shares.
fn share_lookup(table: &Table) -> HashMap<String, Vec<f64>> {
    let mut lookup = HashMap::new();
    for row in 0..table.len() {
        let Some(tract) = table.cell(row, TRACT_COLUMN) else {
            continue;
        };
        let shares: Vec<f64> = GROUPS
            .iter()
            .map(|g| {
                table
                    .cell(row, &format!("{}_share", g))
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0.0)
            })
            .collect();
        lookup.insert(tract.to_string(), shares);
    }
    lookup
}

/// Group-population sums keyed by (jurisdiction, area label), plus total
/// population per jurisdiction as the share denominator
struct Summary {
    sums: BTreeMap<(String, String), Vec<f64>>,
    denominators: BTreeMap<String, f64>,
}

fn summarize(flagged: &Layer, shares: &HashMap<String, Vec<f64>>) -> Summary {
    let mut sums: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    let mut denominators: BTreeMap<String, f64> = BTreeMap::new();

    for feature in flagged.iter() {
        let population = feature.number(POPULATION_COLUMN).unwrap_or(0.0);
        let county = feature.text(COUNTY_COLUMN).unwrap_or("Unknown").to_string();
        let area = match feature.get(FLAG_COLUMN) {
            Some(rtplan_core::layer::AttributeValue::Bool(true)) => INSIDE,
            _ => OUTSIDE,
        };
        let tract_shares = feature
            .text(TRACT_COLUMN)
            .and_then(|t| shares.get(t))
            .cloned()
            .unwrap_or_else(|| vec![0.0; GROUPS.len()]);

        for jurisdiction in [county.as_str(), REGION] {
            let entry = sums
                .entry((jurisdiction.to_string(), area.to_string()))
                .or_insert_with(|| vec![0.0; GROUPS.len()]);
            for (slot, share) in entry.iter_mut().zip(&tract_shares) {
                *slot += population * share;
            }
            *denominators.entry(jurisdiction.to_string()).or_insert(0.0) += population;
        }
    }

    Summary { sums, denominators }
}

fn build_table(summary: &Summary) -> Result<Table> {
    let mut columns = vec!["jurisdiction".to_string(), "area".to_string()];
    columns.extend(GROUPS.iter().map(|g| format!("{}_pop", g)));
    columns.extend(GROUPS.iter().map(|g| format!("{}_pop_share", g)));
    let mut table = Table::new(columns);

    let jurisdictions: Vec<String> = summary.denominators.keys().cloned().collect();
    for jurisdiction in jurisdictions {
        let denominator = summary.denominators[&jurisdiction];
        let zero = vec![0.0; GROUPS.len()];
        let inside = summary
            .sums
            .get(&(jurisdiction.clone(), INSIDE.to_string()))
            .unwrap_or(&zero);
        let outside = summary
            .sums
            .get(&(jurisdiction.clone(), OUTSIDE.to_string()))
            .unwrap_or(&zero);
        let total: Vec<f64> = inside.iter().zip(outside).map(|(a, b)| a + b).collect();

        for (area, values) in [(INSIDE, inside), (OUTSIDE, outside), ("Total", &total)] {
            let mut row = vec![jurisdiction.clone(), area.to_string()];
            row.extend(values.iter().map(|v| number_string(*v, 1)));
            row.extend(values.iter().map(|v| {
                let share = if denominator == 0.0 {
                    f64::NAN
                } else {
                    v / denominator
                };
                percent_string(share, 1)
            }));
            table.push_row(row)?;
        }
    }
    Ok(table)
}

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let transit_src = Container::open(config.source("transit_network")?)?;
    let routes = load_layer(&transit_src, "transit_routes", &crs)?;
    let service = service_area(&routes, config.feet_per_mile);
    info!(routes = routes.len(), "built transit service area");

    let parcel_src = Container::open(config.source("parcels")?)?;
    let parcels = load_layer(&parcel_src, "population_parcels", &crs)?;
    let tract_src = Container::open(config.source("tracts")?)?;
    let tracts = load_layer(&tract_src, "tracts", &crs)?;

    let parcels_with_tract = spatial_join(&parcels, &tracts, JoinPredicate::Within)?;
    let flagged = points_in_polygon(&parcels_with_tract, &service, FLAG_COLUMN, 0.0)?;

    let shares = share_lookup(&read_csv(config.source("equity_shares")?)?);
    let summary = summarize(&flagged, &shares);
    let table = build_table(&summary)?;

    let out = Container::create(config.output_container_path())?;
    out.write_layer("transit_service_area", &service)?;
    write_csv(
        config.output_file("population_in_service_area.csv"),
        &table,
        true,
    )?;
    info!("finished equity coverage export");
    Ok(())
}
