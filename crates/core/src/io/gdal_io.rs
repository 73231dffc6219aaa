//! GDAL-backed container access (OpenFileGDB, GeoPackage)
//!
//! Mirrors the native container API for sources that live in an Esri file
//! geodatabase or GeoPackage. Requires the `gdal` feature and a system
//! GDAL installation.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::layer::{AttributeValue, Feature, Layer};
use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use std::path::Path;

/// Names of all vector layers in a GDAL dataset
pub fn list_layers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let dataset = Dataset::open(path.as_ref())?;
    let mut names: Vec<String> = dataset.layers().map(|l| l.name()).collect();
    names.sort();
    Ok(names)
}

/// Read a named vector layer from a GDAL dataset
pub fn read_layer(path: impl AsRef<Path>, name: &str) -> Result<Layer> {
    let dataset = Dataset::open(path.as_ref())?;
    let mut gdal_layer = dataset.layer_by_name(name).map_err(|_| Error::LayerNotFound {
        container: path.as_ref().display().to_string(),
        layer: name.to_string(),
    })?;

    let crs = gdal_layer
        .spatial_ref()
        .and_then(|srs| srs.auth_code().ok())
        .map(|code| Crs::from_epsg(code as u32))
        .unwrap_or_else(Crs::undefined);

    let mut layer = Layer::new(name, crs);
    for gdal_feature in gdal_layer.features() {
        let geometry = gdal_feature
            .geometry()
            .and_then(|g| g.to_geo().ok());
        let mut feature = match geometry {
            Some(g) => Feature::new(g),
            None => Feature::empty(),
        };
        for (field_name, value) in gdal_feature.fields() {
            feature
                .properties
                .insert(field_name, attribute_from_field(value));
        }
        layer.push(feature);
    }

    layer.validate_homogeneous()?;
    Ok(layer)
}

fn attribute_from_field(value: Option<FieldValue>) -> AttributeValue {
    match value {
        None => AttributeValue::Null,
        Some(FieldValue::IntegerValue(v)) => AttributeValue::Int(v as i64),
        Some(FieldValue::Integer64Value(v)) => AttributeValue::Int(v),
        Some(FieldValue::RealValue(v)) => AttributeValue::Float(v),
        Some(FieldValue::StringValue(v)) => AttributeValue::String(v),
        Some(other) => AttributeValue::String(format!("{:?}", other)),
    }
}
