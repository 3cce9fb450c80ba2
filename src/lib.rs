//! Post-processing for probabilistic seismic hazard outputs: probability
//! conversions, curve interpolation, uniform hazard spectra and
//! disaggregation reductions ready for stacked-bar rendering.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod hazard;
pub mod report;

pub use config::Config;
pub use error::{HazardError, HazardResult};
pub use report::DisaggregationReport;
