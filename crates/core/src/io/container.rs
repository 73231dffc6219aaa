//! Native layer container
//!
//! A container is a directory holding one or more named GeoJSON layers,
//! one `<name>.geojson` file per layer. The layer CRS travels in the
//! feature collection's foreign `crs` member (legacy named-CRS form);
//! a file without it yields a layer with an undefined CRS, which fails
//! later only if reprojection is actually required.
//!
//! For OpenFileGDB / GeoPackage sources, enable the `gdal` feature and use
//! [`crate::io::gdal_io`].

use crate::crs::{reproject_layer, Crs};
use crate::error::{Error, Result};
use crate::layer::{AttributeValue, Feature, Layer};
use geojson::{feature::Id, FeatureCollection, GeoJson, JsonObject, JsonValue};
use std::fs;
use std::path::{Path, PathBuf};

const LAYER_EXT: &str = "geojson";

/// A directory of named geographic layers
#[derive(Debug, Clone)]
pub struct Container {
    path: PathBuf,
}

impl Container {
    /// Open an existing container directory
    pub fn open(path: impl AsRef<Path>) -> Result<Container> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("container directory not found: {}", path.display()),
            )));
        }
        Ok(Container {
            path: path.to_path_buf(),
        })
    }

    /// Create the container directory if needed and open it
    pub fn create(path: impl AsRef<Path>) -> Result<Container> {
        fs::create_dir_all(path.as_ref())?;
        Self::open(path)
    }

    /// Container name used in error context
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn layer_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{}.{}", name, LAYER_EXT))
    }

    /// Names of all layers in the container, sorted
    pub fn list_layers(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(LAYER_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read a named layer.
    ///
    /// Fails with [`Error::LayerNotFound`] when the name is absent and
    /// [`Error::MixedGeometry`] when records do not share one geometry
    /// family.
    pub fn read_layer(&self, name: &str) -> Result<Layer> {
        let path = self.layer_path(name);
        if !path.is_file() {
            return Err(Error::LayerNotFound {
                container: self.name(),
                layer: name.to_string(),
            });
        }

        let text = fs::read_to_string(&path)?;
        let geojson: GeoJson = text.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;

        let crs = collection
            .foreign_members
            .as_ref()
            .and_then(parse_crs_member)
            .unwrap_or_else(Crs::undefined);

        let mut layer = Layer::with_capacity(name, crs, collection.features.len());
        for gj in collection.features {
            let geometry = match gj.geometry {
                Some(g) => Some(geo_types::Geometry::<f64>::try_from(g.value)?),
                None => None,
            };
            let mut feature = match geometry {
                Some(g) => Feature::new(g),
                None => Feature::empty(),
            };
            if let Some(properties) = gj.properties {
                for (key, value) in properties {
                    feature.properties.insert(key, attribute_from_json(value));
                }
            }
            layer.push(feature);
        }

        layer.validate_homogeneous()?;
        Ok(layer)
    }

    /// Write a layer under `name`, replacing any existing layer of that name
    pub fn write_layer(&self, name: &str, layer: &Layer) -> Result<()> {
        let mut features = Vec::with_capacity(layer.len());
        for (index, feature) in layer.iter().enumerate() {
            let geometry = feature
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g)));
            let mut properties = JsonObject::new();
            for (key, value) in &feature.properties {
                properties.insert(key.clone(), attribute_to_json(value));
            }
            features.push(geojson::Feature {
                bbox: None,
                geometry,
                id: Some(Id::Number(index.into())),
                properties: Some(properties),
                foreign_members: None,
            });
        }

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(crs_member(layer.crs())),
        };

        let path = self.layer_path(name);
        let file = fs::File::create(&path)?;
        serde_json::to_writer(file, &GeoJson::FeatureCollection(collection))?;
        Ok(())
    }
}

/// Read a named layer from a container and reproject it to `target`.
///
/// The adapter every analysis loads its sources through: one call opens
/// the layer, normalizes its geometry family, and brings it into the
/// working CRS.
pub fn load_layer(container: &Container, name: &str, target: &Crs) -> Result<Layer> {
    let layer = container.read_layer(name)?;
    reproject_layer(&layer, target)
}

fn crs_member(crs: &Crs) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::from(crs.identifier()));
    let mut member = JsonObject::new();
    member.insert("type".to_string(), JsonValue::from("name"));
    member.insert("properties".to_string(), JsonValue::from(properties));
    let mut out = JsonObject::new();
    out.insert("crs".to_string(), JsonValue::from(member));
    out
}

fn parse_crs_member(foreign: &JsonObject) -> Option<Crs> {
    let name = foreign
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    Crs::parse(name)
}

fn attribute_from_json(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(v) => AttributeValue::Bool(v),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Int(i)
            } else {
                AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => AttributeValue::String(s),
        // Nested arrays/objects are not part of the attribute model
        _ => AttributeValue::Null,
    }
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(v) => JsonValue::from(*v),
        AttributeValue::Int(v) => JsonValue::from(*v),
        AttributeValue::Float(v) => {
            if v.is_finite() {
                JsonValue::from(*v)
            } else {
                JsonValue::Null
            }
        }
        AttributeValue::String(v) => JsonValue::from(v.clone()),
    }
}
