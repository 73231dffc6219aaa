//! Congested freight links
//!
//! Joins model-run link results against the network layer, keeps heavily
//! congested links on freight routes and exports them sorted by freight
//! classification.

use rtplan_core::config::Config;
use rtplan_core::error::Result;
use rtplan_core::io::csv_io::layer_table;
use rtplan_core::io::{load_layer, read_csv, write_csv, Container};
use rtplan_core::layer::Layer;
use std::collections::HashSet;
use tracing::info;

const LINK_COLUMN: &str = "link_id";
const FREIGHT_COLUMN: &str = "fgts";
const CATEGORY_COLUMN: &str = "congestion_category";
const CONGESTED: [&str; 2] = ["Heavy", "Severe"];

/// Link ids whose modeled congestion category is heavy or severe
fn congested_ids(results: &rtplan_core::io::Table) -> HashSet<String> {
    let mut ids = HashSet::new();
    for row in 0..results.len() {
        let congested = results
            .cell(row, CATEGORY_COLUMN)
            .map(|c| CONGESTED.contains(&c))
            .unwrap_or(false);
        if congested {
            if let Some(id) = results.cell(row, LINK_COLUMN) {
                ids.insert(id.to_string());
            }
        }
    }
    ids
}

/// Sort a layer by freight classification, highest first; ties keep input
/// order
fn sort_by_freight_class(layer: &Layer) -> Layer {
    let mut indexed: Vec<(usize, f64)> = layer
        .iter()
        .enumerate()
        .map(|(i, f)| (i, f.number(FREIGHT_COLUMN).unwrap_or(0.0)))
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = Layer::with_capacity(layer.name(), layer.crs().clone(), layer.len());
    for (index, _) in indexed {
        out.push(layer.features()[index].clone());
    }
    out
}

pub fn run(config: &Config) -> Result<()> {
    let crs = config.crs();

    let results = read_csv(config.source("model_link_results")?)?;
    let ids = congested_ids(&results);
    info!(links = ids.len(), "congested links in model results");

    let network_src = Container::open(config.source("model_network")?)?;
    let network = load_layer(&network_src, "network_links", &crs)?;
    let congested = network.filter(|f| {
        f.text(LINK_COLUMN).is_some_and(|id| ids.contains(id))
            && f.number(FREIGHT_COLUMN).unwrap_or(0.0) > 0.0
    });
    let mut sorted = sort_by_freight_class(&congested);
    sorted.set_name("congested_freight_links");

    let table = layer_table(&sorted, &[LINK_COLUMN, FREIGHT_COLUMN])?;

    let out = Container::create(config.output_container_path())?;
    out.write_layer("congested_freight_links", &sorted)?;
    write_csv(
        config.output_file("congested_freight_links.csv"),
        &table,
        false,
    )?;
    info!(kept = sorted.len(), "finished congested freight export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, LineString};
    use rtplan_core::crs::Crs;
    use rtplan_core::io::Table;
    use rtplan_core::layer::Feature;

    #[test]
    fn test_congested_ids() {
        let mut table = Table::new([LINK_COLUMN, CATEGORY_COLUMN]);
        for (id, category) in [
            ("1", "Heavy"),
            ("2", "Moderate"),
            ("3", "Severe"),
            ("4", "Light"),
        ] {
            table
                .push_row(vec![id.to_string(), category.to_string()])
                .unwrap();
        }
        let ids = congested_ids(&table);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("1") && ids.contains("3"));
    }

    #[test]
    fn test_sort_by_freight_class() {
        let mut layer = Layer::new("links", Crs::from_epsg(2285));
        for (id, fgts) in [("a", 1.0), ("b", 3.0), ("c", 2.0)] {
            let mut f = Feature::new(Geometry::LineString(LineString::from(vec![
                (0.0, 0.0),
                (1.0, 1.0),
            ])));
            f.set(LINK_COLUMN, id);
            f.set(FREIGHT_COLUMN, fgts);
            layer.push(f);
        }

        let sorted = sort_by_freight_class(&layer);
        let order: Vec<_> = sorted.iter().map(|f| f.text(LINK_COLUMN).unwrap()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }
}
