//! Coordinate Reference System handling

mod reproject;

pub use reproject::reproject_layer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear unit of a projected CRS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinearUnit {
    Meter,
    UsFoot,
    Degree,
}

/// Coordinate Reference System representation
///
/// EPSG-code based. A layer read from a container whose CRS metadata is
/// absent carries an undefined CRS; reprojecting such a layer is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    epsg: Option<u32>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: Some(code) }
    }

    /// A CRS with no known identification
    pub fn undefined() -> Self {
        Self { epsg: None }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Spherical Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Washington State Plane North, US survey feet (EPSG:2285)
    pub fn state_plane_wa_north() -> Self {
        Self::from_epsg(2285)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn is_defined(&self) -> bool {
        self.epsg.is_some()
    }

    /// Linear unit of the CRS, when known
    pub fn unit(&self) -> Option<LinearUnit> {
        match self.epsg? {
            4326 => Some(LinearUnit::Degree),
            3857 => Some(LinearUnit::Meter),
            // Washington State Plane North/South, US survey feet
            2285 | 2286 => Some(LinearUnit::UsFoot),
            _ => None,
        }
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        match self.epsg {
            Some(code) => format!("EPSG:{}", code),
            None => "Unknown".to_string(),
        }
    }

    /// Parse an identifier of the form `EPSG:<code>`
    pub fn parse(s: &str) -> Option<Self> {
        let code = s.strip_prefix("EPSG:").or_else(|| s.strip_prefix("epsg:"))?;
        code.trim().parse().ok().map(Self::from_epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = Crs::from_epsg(2285);
        assert_eq!(crs.epsg(), Some(2285));
        assert_eq!(crs.identifier(), "EPSG:2285");
        assert_eq!(crs.unit(), Some(LinearUnit::UsFoot));
    }

    #[test]
    fn test_crs_equivalence() {
        let a = Crs::from_epsg(4326);
        let b = Crs::wgs84();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&Crs::web_mercator()));
        assert!(!Crs::undefined().is_equivalent(&Crs::undefined()));
    }

    #[test]
    fn test_crs_parse() {
        assert_eq!(Crs::parse("EPSG:2285"), Some(Crs::from_epsg(2285)));
        assert_eq!(Crs::parse("epsg:4326"), Some(Crs::wgs84()));
        assert_eq!(Crs::parse("nonsense"), None);
    }

    #[test]
    fn test_undefined_identifier() {
        assert_eq!(Crs::undefined().identifier(), "Unknown");
    }
}
