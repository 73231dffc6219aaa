//! End-to-end pipeline tests over temporary containers

use geo::{Area, BooleanOps};
use geo_types::{Geometry, LineString, MultiPolygon, Point, Polygon};
use rtplan_analyses::analysis;
use rtplan_analyses::vector::buffer::buffer_geometry;
use rtplan_core::config::{AnalysisFlags, Config, MissingValuePolicy};
use rtplan_core::crs::Crs;
use rtplan_core::io::{read_csv, Container};
use rtplan_core::layer::{Feature, Layer};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

const EPSG: u32 = 2285;

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

fn base_config(root: &Path) -> Config {
    Config {
        output_dir: root.join("out"),
        output_container: "rtp_outputs".to_string(),
        epsg: EPSG,
        feet_per_mile: 1000.0,
        sqft_per_acre: 10_000.0,
        missing_values: MissingValuePolicy::ZeroFill,
        sources: HashMap::new(),
        analyses: AnalysisFlags::default(),
    }
}

fn write_container(path: &Path, layers: &[(&str, &Layer)]) -> Container {
    let container = Container::create(path).unwrap();
    for (name, layer) in layers {
        container.write_layer(name, layer).unwrap();
    }
    container
}

/// Freight corridor: one T-1 route along the x axis plus one route below
/// corridor classification, and two activity-unit hexes, one inside the
/// 500 ft corridor and one far away.
#[test]
fn freight_density_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(dir.path());
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let mut routes = Layer::new("freight_routes", Crs::from_epsg(EPSG));
    let mut t1 = Feature::new(Geometry::LineString(LineString::from(vec![
        (0.0, 0.0),
        (1000.0, 0.0),
    ])));
    t1.set("freight_class", "T-1");
    routes.push(t1);
    let mut t3 = Feature::new(Geometry::LineString(LineString::from(vec![
        (5000.0, 5000.0),
        (6000.0, 5000.0),
    ])));
    t3.set("freight_class", "T-3");
    routes.push(t3);

    let mut au_2050 = Layer::new("activity_units_2050", Crs::from_epsg(EPSG));
    let mut inside = Feature::new(rect(0.0, 0.0, 100.0, 100.0));
    inside.set("au", 100.0);
    inside.set("au_per_acre", 2.0);
    au_2050.push(inside);
    let mut outside = Feature::new(rect(20_000.0, 20_000.0, 20_100.0, 20_100.0));
    outside.set("au", 50.0);
    outside.set("au_per_acre", 1.0);
    au_2050.push(outside);

    // 2024 vintage: same geography, lower totals, and a null density to
    // exercise the zero-fill policy
    let mut au_2024 = Layer::new("activity_units_2024", Crs::from_epsg(EPSG));
    let mut inside24 = Feature::new(rect(0.0, 0.0, 100.0, 100.0));
    inside24.set("au", 80.0);
    inside24.properties.insert(
        "au_per_acre".to_string(),
        rtplan_core::layer::AttributeValue::Null,
    );
    au_2024.push(inside24);

    write_container(&dir.path().join("freight"), &[("freight_routes", &routes)]);
    write_container(
        &dir.path().join("au"),
        &[
            ("activity_units_2050", &au_2050),
            ("activity_units_2024", &au_2024),
        ],
    );
    config
        .sources
        .insert("freight_routes".to_string(), dir.path().join("freight"));
    config
        .sources
        .insert("activity_units".to_string(), dir.path().join("au"));

    analysis::freight_density::run(&config).unwrap();

    let table = read_csv(config.output_file("density_and_freight.csv")).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(0, "selection"), Some("regional total"));

    let regional_2050: f64 = table.cell(0, "activity units 2050").unwrap().parse().unwrap();
    assert!((regional_2050 - 150.0).abs() < 1e-6);

    // inside hex: 2.0 au/acre * (100x100 sqft / 10,000 sqft-per-acre) = 2.0
    let within_2050: f64 = table.cell(1, "activity units 2050").unwrap().parse().unwrap();
    assert!((within_2050 - 2.0).abs() < 1e-6, "got {}", within_2050);

    // null density zero-filled
    let within_2024: f64 = table.cell(1, "activity units 2024").unwrap().parse().unwrap();
    assert!(within_2024.abs() < 1e-9);
}

/// Transit service coverage: one stop serving the local tier, one dense
/// hex within a half mile and one dense hex far outside.
#[test]
fn transit_service_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(dir.path());
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let mut stops = Layer::new("transit_stops", Crs::from_epsg(EPSG));
    let mut stop = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
    stop.set("local", 1.0);
    stop.set("all_day", 0.0);
    stop.set("frequent", 0.0);
    stop.set("hct", 0.0);
    stop.set("brt", 0.0);
    stops.push(stop);

    let mut au = Layer::new("activity_units_2050", Crs::from_epsg(EPSG));
    let mut near = Feature::new(rect(0.0, 0.0, 100.0, 100.0));
    near.set("population", 100.0);
    near.set("jobs", 40.0);
    near.set("au", 140.0);
    near.set("au_per_acre", 50.0);
    au.push(near);
    let mut far = Feature::new(rect(20_000.0, 0.0, 20_100.0, 100.0));
    far.set("population", 60.0);
    far.set("jobs", 10.0);
    far.set("au", 70.0);
    far.set("au_per_acre", 50.0);
    au.push(far);
    let mut sparse = Feature::new(rect(0.0, 200.0, 100.0, 300.0));
    sparse.set("population", 999.0);
    sparse.set("jobs", 999.0);
    sparse.set("au", 999.0);
    sparse.set("au_per_acre", 5.0);
    au.push(sparse);

    write_container(&dir.path().join("transit"), &[("transit_stops", &stops)]);
    write_container(&dir.path().join("au"), &[("activity_units_2050", &au)]);
    config
        .sources
        .insert("transit_network".to_string(), dir.path().join("transit"));
    config
        .sources
        .insert("activity_units".to_string(), dir.path().join("au"));

    analysis::transit_service::run(&config).unwrap();

    let table = read_csv(config.output_file("transit_stops_density_intersect.csv")).unwrap();
    // five tiers, two buffer distances
    assert_eq!(table.len(), 10);

    let local_half = table
        .rows()
        .iter()
        .position(|r| r[0] == "local_half_mi")
        .unwrap();
    let people_with: f64 = table
        .cell(local_half, "people with service")
        .unwrap()
        .parse()
        .unwrap();
    let people_without: f64 = table
        .cell(local_half, "people w/o service")
        .unwrap()
        .parse()
        .unwrap();
    assert!((people_with - 100.0).abs() < 1e-6);
    assert!((people_without - 60.0).abs() < 1e-6);
    assert_eq!(
        table.cell(local_half, "% people with service"),
        Some("62.5%")
    );

    // a tier with no service: everything is without service
    let brt_half = table
        .rows()
        .iter()
        .position(|r| r[0] == "brt_half_mi")
        .unwrap();
    let brt_with: f64 = table
        .cell(brt_half, "people with service")
        .unwrap()
        .parse()
        .unwrap();
    assert!(brt_with.abs() < 1e-9);
}

/// Stops-in-cities flagging plus the orchestrator's continue-past-failure
/// policy: a misconfigured analysis fails, the next one still runs.
#[test]
fn orchestrator_continues_past_failure() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(dir.path());
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let mut stops = Layer::new("transit_stops", Crs::from_epsg(EPSG));
    let mut near = Feature::new(Geometry::Point(Point::new(1050.0, 0.0)));
    near.set("stop_id", "near");
    stops.push(near);
    let mut far = Feature::new(Geometry::Point(Point::new(5000.0, 0.0)));
    far.set("stop_id", "far");
    stops.push(far);

    let mut cities = Layer::new("cities", Crs::from_epsg(EPSG));
    cities.push(Feature::new(rect(0.0, -500.0, 1000.0, 500.0)));

    write_container(&dir.path().join("transit"), &[("transit_stops", &stops)]);
    write_container(&dir.path().join("cities"), &[("cities", &cities)]);
    config
        .sources
        .insert("transit_network".to_string(), dir.path().join("transit"));
    config
        .sources
        .insert("cities".to_string(), dir.path().join("cities"));

    // freight_density is enabled but its sources are not configured
    config.analyses.freight_density = true;
    config.analyses.stops_in_cities = true;

    let outcomes = analysis::run_enabled(&config);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].name, "freight_density");
    assert!(outcomes[0].result.is_err());
    assert_eq!(outcomes[1].name, "stops_in_cities");
    assert!(outcomes[1].result.is_ok());

    // the failed analysis produced nothing
    assert!(!config.output_file("density_and_freight.csv").exists());

    // the flag layer landed in the output container: the near stop is
    // within 100 ft of the city polygon, the far one is not
    let out = Container::open(config.output_container_path()).unwrap();
    let flagged = out.read_layer("transit_stops_city_flag").unwrap();
    let by_id: HashMap<&str, bool> = flagged
        .iter()
        .map(|f| {
            let hit = matches!(
                f.get("in_city_100ft"),
                Some(rtplan_core::layer::AttributeValue::Bool(true))
            );
            (f.text("stop_id").unwrap(), hit)
        })
        .collect();
    assert_eq!(by_id["near"], true);
    assert_eq!(by_id["far"], false);

    let counts = read_csv(config.output_file("transit_stops_city_counts.csv")).unwrap();
    assert_eq!(counts.len(), 2);
}

/// Two segments crossing at the origin, buffered and intersected with a
/// square centered there: a single region that is neither empty nor the
/// whole square.
#[test]
fn buffered_crossing_intersects_unit_square() {
    let cross_a = Geometry::LineString(LineString::from(vec![(-2.0, -2.0), (2.0, 2.0)]));
    let cross_b = Geometry::LineString(LineString::from(vec![(-2.0, 2.0), (2.0, -2.0)]));

    let buffered: MultiPolygon<f64> =
        buffer_geometry(&cross_a, 0.25, 32).union(&buffer_geometry(&cross_b, 0.25, 32));

    let square = Polygon::new(
        LineString::from(vec![
            (-0.5, -0.5),
            (0.5, -0.5),
            (0.5, 0.5),
            (-0.5, 0.5),
            (-0.5, -0.5),
        ]),
        vec![],
    );
    let clipped = MultiPolygon::new(vec![square]).intersection(&buffered);

    assert_eq!(clipped.0.len(), 1, "expected one connected region");
    let area = clipped.unsigned_area();
    assert!(area > 0.0, "intersection must not be empty");
    assert!(area < 1.0 - 1e-6, "intersection must not fill the square");
}
