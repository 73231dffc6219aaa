//! Spatial layer data model
//!
//! A [`Layer`] is an ordered collection of [`Feature`]s sharing one
//! coordinate reference system and one geometry family. Attributes are
//! scalar [`AttributeValue`]s keyed by column name.

use crate::crs::Crs;
use crate::error::{Error, Result};
use geo_types::Geometry;
use std::collections::HashMap;
use std::fmt;

/// Attribute value types
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value; `Null`, booleans and strings are `None`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(v) => write!(f, "{}", v),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// Broad geometry family of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFamily {
    Point,
    Line,
    Polygon,
}

impl GeometryFamily {
    pub fn of(geometry: &Geometry<f64>) -> Option<GeometryFamily> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(GeometryFamily::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(GeometryFamily::Line)
            }
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(GeometryFamily::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }
}

impl fmt::Display for GeometryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryFamily::Point => write!(f, "point"),
            GeometryFamily::Line => write!(f, "line"),
            GeometryFamily::Polygon => write!(f, "polygon"),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
        }
    }

    /// Set an attribute
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Numeric view of an attribute; absent and null values are `None`
    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(AttributeValue::as_f64)
    }

    /// String view of an attribute
    pub fn text(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(AttributeValue::as_str)
    }
}

/// An ordered collection of features sharing a CRS and geometry family
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    crs: Crs,
    features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>, crs: Crs) -> Self {
        Self {
            name: name.into(),
            crs,
            features: Vec::new(),
        }
    }

    pub fn with_capacity(name: impl Into<String>, crs: Crs, capacity: usize) -> Self {
        Self {
            name: name.into(),
            crs,
            features: Vec::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn set_crs(&mut self, crs: Crs) {
        self.crs = crs;
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Geometry family of the layer, from the first non-empty geometry
    pub fn geometry_family(&self) -> Option<GeometryFamily> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .find_map(GeometryFamily::of)
    }

    /// Verify that every record shares one geometry family.
    ///
    /// Records with no geometry are ignored. Geometry collections and
    /// mixed families fail with [`Error::MixedGeometry`].
    pub fn validate_homogeneous(&self) -> Result<()> {
        let mut expected: Option<GeometryFamily> = None;
        for feature in &self.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let family = GeometryFamily::of(geometry).ok_or_else(|| Error::MixedGeometry {
                layer: self.name.clone(),
                expected: expected.map(|f| f.to_string()).unwrap_or_default(),
                found: "geometry collection".to_string(),
            })?;
            match expected {
                None => expected = Some(family),
                Some(e) if e != family => {
                    return Err(Error::MixedGeometry {
                        layer: self.name.clone(),
                        expected: e.to_string(),
                        found: family.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// New layer keeping only the features matching `predicate`
    pub fn filter(&self, predicate: impl Fn(&Feature) -> bool) -> Layer {
        Layer {
            name: self.name.clone(),
            crs: self.crs.clone(),
            features: self.features.iter().filter(|f| predicate(f)).cloned().collect(),
        }
    }

    /// Sum a numeric column; absent and null values contribute zero.
    ///
    /// Fails with [`Error::MissingColumn`] when no record carries the
    /// column at all.
    pub fn column_sum(&self, column: &str) -> Result<f64> {
        if !self.features.is_empty() && !self.features.iter().any(|f| f.get(column).is_some()) {
            return Err(Error::MissingColumn {
                layer: self.name.clone(),
                column: column.to_string(),
            });
        }
        Ok(self
            .features
            .iter()
            .filter_map(|f| f.number(column))
            .filter(|v| v.is_finite())
            .sum())
    }
}

impl IntoIterator for Layer {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Point, Polygon};

    fn square() -> Geometry<f64> {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        ))
    }

    #[test]
    fn test_feature_attributes() {
        let mut f = Feature::new(Geometry::Point(Point::new(1.0, 2.0)));
        f.set("population", 120.0);
        f.set("name", "Downtown");
        f.set("served", true);

        assert_eq!(f.number("population"), Some(120.0));
        assert_eq!(f.text("name"), Some("Downtown"));
        assert_eq!(f.get("served"), Some(&AttributeValue::Bool(true)));
        assert_eq!(f.number("missing"), None);
    }

    #[test]
    fn test_column_sum_nulls_are_zero() {
        let mut layer = Layer::new("hex", Crs::from_epsg(2285));
        for value in [
            AttributeValue::Float(10.0),
            AttributeValue::Null,
            AttributeValue::Int(5),
        ] {
            let mut f = Feature::new(square());
            f.properties.insert("au".to_string(), value);
            layer.push(f);
        }
        assert_eq!(layer.column_sum("au").unwrap(), 15.0);
    }

    #[test]
    fn test_column_sum_missing_column() {
        let mut layer = Layer::new("hex", Crs::from_epsg(2285));
        layer.push(Feature::new(square()));
        assert!(matches!(
            layer.column_sum("nope"),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_homogeneous_validation() {
        let mut layer = Layer::new("mixed", Crs::from_epsg(2285));
        layer.push(Feature::new(square()));
        layer.push(Feature::new(Geometry::Point(Point::new(0.0, 0.0))));
        assert!(matches!(
            layer.validate_homogeneous(),
            Err(Error::MixedGeometry { .. })
        ));

        let polys = layer.filter(|f| {
            matches!(
                f.geometry.as_ref().and_then(GeometryFamily::of),
                Some(GeometryFamily::Polygon)
            )
        });
        assert_eq!(polys.len(), 1);
        assert!(polys.validate_homogeneous().is_ok());
    }

    #[test]
    fn test_filter_keeps_crs_and_name() {
        let mut layer = Layer::new("stops", Crs::from_epsg(2285));
        let mut f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)));
        f.set("frequent", 1.0);
        layer.push(f);
        layer.push(Feature::new(Geometry::Point(Point::new(1.0, 1.0))));

        let frequent = layer.filter(|f| f.number("frequent").unwrap_or(0.0) > 0.0);
        assert_eq!(frequent.len(), 1);
        assert_eq!(frequent.name(), "stops");
        assert!(frequent.crs().is_equivalent(&Crs::from_epsg(2285)));
    }
}
