//! Run configuration
//!
//! A [`Config`] is resolved once at process start from a TOML file and is
//! read-only afterwards; every analysis receives it by reference. Source
//! locations are an opaque key -> path mapping so the core never hardcodes
//! any agency's storage layout.

use crate::crs::Crs;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How null density/area values are treated during weighted sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Treat nulls as zero before multiplying (the historical behavior)
    #[default]
    ZeroFill,
    /// Fail on the first null value encountered
    Strict,
}

/// Per-analysis enable flags; everything defaults to off
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisFlags {
    pub freight_density: bool,
    pub transit_service: bool,
    pub transit_signals: bool,
    pub signal_density: bool,
    pub equity: bool,
    pub congestion: bool,
    pub stops_in_cities: bool,
}

/// Immutable run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory all tabular outputs and the output container live under
    pub output_dir: PathBuf,
    /// Name of the layer container created under `output_dir`
    pub output_container: String,
    /// Working CRS every source layer is reprojected into
    pub epsg: u32,
    #[serde(default = "default_feet_per_mile")]
    pub feet_per_mile: f64,
    #[serde(default = "default_sqft_per_acre")]
    pub sqft_per_acre: f64,
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
    /// Named input source locations (layer containers and tabular files)
    #[serde(default)]
    pub sources: HashMap<String, PathBuf>,
    #[serde(default)]
    pub analyses: AnalysisFlags,
}

fn default_feet_per_mile() -> f64 {
    5280.0
}

fn default_sqft_per_acre() -> f64 {
    43_560.0
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Config> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }

    /// Working CRS for the run
    pub fn crs(&self) -> Crs {
        Crs::from_epsg(self.epsg)
    }

    /// Resolve a named source location
    pub fn source(&self, key: &str) -> Result<&Path> {
        self.sources
            .get(key)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::MissingConfigKey(format!("sources.{}", key)))
    }

    /// Path of the output layer container
    pub fn output_container_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_container)
    }

    /// Path for a tabular output file
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        output_dir = "out"
        output_container = "rtp_outputs"
        epsg = 2285

        [sources]
        transit_network = "data/transit_network"
        activity_units = "data/activity_units"

        [analyses]
        freight_density = true
    "#;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.epsg, 2285);
        assert_eq!(config.feet_per_mile, 5280.0);
        assert_eq!(config.sqft_per_acre, 43_560.0);
        assert_eq!(config.missing_values, MissingValuePolicy::ZeroFill);
        assert!(config.analyses.freight_density);
        assert!(!config.analyses.equity);
    }

    #[test]
    fn test_source_lookup() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert!(config.source("transit_network").is_ok());
        let err = config.source("parcels").unwrap_err();
        assert!(matches!(err, Error::MissingConfigKey(key) if key == "sources.parcels"));
    }

    #[test]
    fn test_output_paths() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(
            config.output_container_path(),
            PathBuf::from("out/rtp_outputs")
        );
        assert_eq!(config.output_file("a.csv"), PathBuf::from("out/a.csv"));
    }

    #[test]
    fn test_strict_policy_parse() {
        let config: Config = toml::from_str(
            r#"
            output_dir = "out"
            output_container = "c"
            epsg = 2285
            missing_values = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.missing_values, MissingValuePolicy::Strict);
    }
}
