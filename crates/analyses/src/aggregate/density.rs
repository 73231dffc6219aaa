//! Density-weighted sums
//!
//! Total activity units over a polygon layer: each record contributes its
//! per-acre density times its acreage, acreage being the geometry area
//! divided by a unit-conversion constant.

use crate::vector::measurements::area;
use rtplan_core::config::MissingValuePolicy;
use rtplan_core::error::{Error, Result};
use rtplan_core::layer::Layer;

/// Compute the density-weighted sum over a layer:
/// `sum(density_i * area_i / conversion)`.
///
/// `conversion` converts squared CRS units to the density's area unit
/// (square feet per acre for acre-based densities). Null or absent density
/// values follow `policy`: `ZeroFill` treats them as zero, `Strict` fails
/// on the first one. A column carried by no record at all is always a
/// [`Error::MissingColumn`] failure.
pub fn weighted_density_sum(
    layer: &Layer,
    density_column: &str,
    conversion: f64,
    policy: MissingValuePolicy,
) -> Result<f64> {
    if !layer.is_empty() && !layer.iter().any(|f| f.get(density_column).is_some()) {
        return Err(Error::MissingColumn {
            layer: layer.name().to_string(),
            column: density_column.to_string(),
        });
    }

    let mut sum = 0.0;
    for (index, feature) in layer.iter().enumerate() {
        let density = match feature.number(density_column) {
            Some(v) if v.is_finite() => v,
            _ => match policy {
                MissingValuePolicy::ZeroFill => 0.0,
                MissingValuePolicy::Strict => {
                    return Err(Error::NullValue {
                        layer: layer.name().to_string(),
                        column: density_column.to_string(),
                        index,
                    })
                }
            },
        };
        let acreage = feature
            .geometry
            .as_ref()
            .map(|g| area(g) / conversion)
            .unwrap_or(0.0);
        sum += density * acreage;
    }
    Ok(sum)
}
