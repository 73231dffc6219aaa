//! Vector geometry utilities: buffer, overlay, spatial predicates,
//! measurements

pub mod buffer;
pub mod measurements;
pub mod overlay;
pub mod spatial;
pub mod validity;

pub use buffer::{buffer_layer, BufferParams};
pub use measurements::{area, length};
pub use overlay::{overlay, OverlayMode};
pub use spatial::{clip, dissolve, points_in_polygon, spatial_join, JoinPredicate};
