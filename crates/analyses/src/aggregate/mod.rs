//! Aggregation engine: service-area summaries, weighted density sums,
//! categorical tabulations
//!
//! Every function here is a pure function of its inputs and returns
//! numeric results; percent rendering belongs to the export boundary.

pub mod density;
pub mod service;
pub mod tabulate;

pub use density::weighted_density_sum;
pub use service::{service_area_summary, ServiceSummaryRow};
pub use tabulate::{crosstab, value_counts, Crosstab};
