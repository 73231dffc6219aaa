//! Error types for rtplan

use thiserror::Error;

/// Main error type for rtplan operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("layer '{layer}' not found in container '{container}'")]
    LayerNotFound { container: String, layer: String },

    #[error("invalid geometry in {op} (record {index}): {reason}")]
    InvalidGeometry {
        op: &'static str,
        index: usize,
        reason: String,
    },

    #[error("no transform defined from {from} to {to}")]
    Reprojection { from: String, to: String },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("column '{column}' not present in layer '{layer}'")]
    MissingColumn { layer: String, column: String },

    #[error("null value in column '{column}' of layer '{layer}' (record {index})")]
    NullValue {
        layer: String,
        column: String,
        index: usize,
    },

    #[error("mixed geometry types in layer '{layer}': {found} alongside {expected}")]
    MixedGeometry {
        layer: String,
        expected: String,
        found: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type alias for rtplan operations
pub type Result<T> = std::result::Result<T, Error>;
