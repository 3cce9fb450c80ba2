/// Numeric core: reductions and interpolations over materialized hazard
/// outputs. Everything here is synchronous and pure; inputs are borrowed,
/// results are newly allocated.
///
/// ```text
///   HazardTable ──► disagg ──► ContributionGrid ──► stack ──► StackRecord[]
///
///   UHS rows ──► spectrum::UhsSpectrumTable ──► SpectrumAccessor ─┐
///   curve rows ──► curve::HazardCurve ──────────────────────────┼─► interpolate
///                                  metric (poe → annual rate) ───┘
/// ```

pub mod curve;
pub mod disagg;
pub mod interpolate;
pub mod metric;
pub mod source;
pub mod spectrum;
pub mod stack;

pub use curve::HazardCurve;
pub use disagg::{ContributionGrid, DisaggregationReducer, ReducedDisaggregation};
pub use interpolate::interpolate;
pub use metric::{to_annual_rate, to_annual_rates};
pub use spectrum::{SpectrumAccessor, UhsSpectrumTable, UhsSummary};
pub use stack::{StackLayout, StackedLayoutBuilder};
