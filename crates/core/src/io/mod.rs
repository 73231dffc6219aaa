//! Layer container and tabular I/O

mod container;
pub mod csv_io;

#[cfg(feature = "gdal")]
pub mod gdal_io;

pub use container::{load_layer, Container};
pub use csv_io::{percent_string, read_csv, write_csv, Table};
