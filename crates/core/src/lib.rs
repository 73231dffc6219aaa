//! # rtplan core
//!
//! Core types, configuration and I/O for the rtplan transportation-planning
//! spatial metrics toolkit.
//!
//! This crate provides:
//! - `Layer` / `Feature`: vector layer data model with typed attributes
//! - `Crs`: coordinate reference system handling and reprojection
//! - `Container`: named-layer geographic container I/O
//! - `Table` and CSV export with presentation-only percent formatting
//! - `Config`: immutable run configuration

pub mod config;
pub mod crs;
pub mod error;
pub mod io;
pub mod layer;

pub use config::{AnalysisFlags, Config, MissingValuePolicy};
pub use crs::{reproject_layer, Crs};
pub use error::{Error, Result};
pub use layer::{AttributeValue, Feature, GeometryFamily, Layer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{Config, MissingValuePolicy};
    pub use crate::crs::{reproject_layer, Crs};
    pub use crate::error::{Error, Result};
    pub use crate::io::{load_layer, write_csv, Container, Table};
    pub use crate::layer::{AttributeValue, Feature, GeometryFamily, Layer};
}
