use serde::Serialize;

use crate::config::Config;
use crate::data::filter::{select_target, DisaggregationTarget};
use crate::data::model::HazardTable;
use crate::error::{HazardError, HazardResult};
use crate::hazard::disagg::{ContributionGrid, DisaggregationReducer, ReducedDisaggregation};
use crate::hazard::stack::{StackLayout, StackedLayoutBuilder};

// ---------------------------------------------------------------------------
// Disaggregation report
// ---------------------------------------------------------------------------

/// Epsilon reduction with its stacked layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpsilonSummary {
    #[serde(flatten)]
    pub reduced: ReducedDisaggregation,
    pub layout: StackLayout,
}

/// A categorical grid (tectonic region) with its stacked layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub grid: ContributionGrid,
    pub layout: StackLayout,
}

/// Everything the presentation layer needs for one (poe, imt) target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisaggregationReport {
    pub target: DisaggregationTarget,
    pub epsilon: EpsilonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tectonic_region: Option<CategorySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<CategorySummary>,
}

/// Input tables for a report; only the magnitude/distance/epsilon table is
/// required.
#[derive(Debug, Clone, Copy)]
pub struct DisaggregationInputs<'a> {
    pub mag_dist_eps: &'a HazardTable,
    pub tectonic_region: Option<&'a HazardTable>,
    pub location: Option<&'a HazardTable>,
}

impl DisaggregationReport {
    /// Filter each table to `target` and reduce it.
    pub fn build(
        config: &Config,
        target: &DisaggregationTarget,
        inputs: DisaggregationInputs<'_>,
    ) -> HazardResult<Self> {
        let columns = &config.columns;
        let reducer = DisaggregationReducer::new(columns);

        let filtered = select_target(inputs.mag_dist_eps, target, columns)?;
        let reduced = reducer.reduce_table(&filtered)?;
        let layout = StackedLayoutBuilder::new(config.epsilon_palette).build(&reduced.grid);

        let categories = StackedLayoutBuilder::new(config.category_palette);
        let tectonic_region = inputs
            .tectonic_region
            .map(|table| {
                let grid = reducer.reduce_tectonic(&select_target(table, target, columns)?)?;
                Ok::<_, HazardError>(CategorySummary {
                    layout: categories.build(&grid),
                    grid,
                })
            })
            .transpose()?;
        let location = inputs
            .location
            .map(|table| {
                let grid = reducer.reduce_location(&select_target(table, target, columns)?)?;
                Ok::<_, HazardError>(CategorySummary {
                    layout: categories.build(&grid),
                    grid,
                })
            })
            .transpose()?;

        log::info!(
            "disaggregation report for poe={} imt={}: {} epsilon layers{}{}",
            target.poe,
            target.imt,
            layout.layers.len(),
            if tectonic_region.is_some() { ", tectonic regions" } else { "" },
            if location.is_some() { ", locations" } else { "" },
        );

        Ok(Self {
            target: target.clone(),
            epsilon: EpsilonSummary { reduced, layout },
            tectonic_region,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn table(header: &[&str], rows: &[&[&str]]) -> HazardTable {
        HazardTable::new(
            header.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| CellValue::parse(c)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn mag_dist_eps() -> HazardTable {
        table(
            &["imt", "poe", "mag", "dist", "eps", "mean"],
            &[
                &["PGA", "0.1", "5.5", "10", "0.5", "2.0"],
                &["PGA", "0.1", "6.5", "30", "-0.5", "6.0"],
                &["PGA", "0.02", "7.5", "90", "0.5", "9.0"],
            ],
        )
    }

    fn trt_lon_lat() -> HazardTable {
        table(
            &["trt", "imt", "poe", "lon", "lat", "mean"],
            &[
                &["Active Shallow Crust", "PGA", "0.1", "-78.5", "-0.2", "1.0"],
                &["Subduction Interface", "PGA", "0.1", "-80.5", "-1.2", "3.0"],
            ],
        )
    }

    #[test]
    fn builds_filtered_report() {
        let report = DisaggregationReport::build(
            &Config::default(),
            &DisaggregationTarget::new(0.1, "PGA"),
            DisaggregationInputs {
                mag_dist_eps: &mag_dist_eps(),
                tectonic_region: None,
                location: Some(&trt_lon_lat()),
            },
        )
        .unwrap();
        assert_eq!(report.epsilon.reduced.contributions.len(), 2);
        assert_eq!(report.epsilon.reduced.modal_magnitude, 6.5);
        assert!(report.tectonic_region.is_none());
        let location = report.location.unwrap();
        assert_eq!(location.layout.layers.len(), 2);
        assert_eq!(location.grid.values[0], vec![0.0, 0.75]);
    }

    #[test]
    fn missing_target_in_optional_table_fails() {
        let trt = table(
            &["trt", "imt", "poe", "mag", "dist", "mean"],
            &[&["Active Shallow Crust", "SA(1.0)", "0.1", "5.5", "10", "1.0"]],
        );
        let err = DisaggregationReport::build(
            &Config::default(),
            &DisaggregationTarget::new(0.1, "PGA"),
            DisaggregationInputs {
                mag_dist_eps: &mag_dist_eps(),
                tectonic_region: Some(&trt),
                location: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, HazardError::EmptySelection { .. }));
    }

    #[test]
    fn serializes_nan_as_null() {
        let zero = table(
            &["imt", "poe", "mag", "dist", "eps", "mean"],
            &[&["PGA", "0.1", "5.5", "10", "0.5", "0.0"]],
        );
        let report = DisaggregationReport::build(
            &Config::default(),
            &DisaggregationTarget::new(0.1, "PGA"),
            DisaggregationInputs {
                mag_dist_eps: &zero,
                tectonic_region: None,
                location: None,
            },
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["epsilon"]["mean_magnitude"].is_null());
        assert!(json.get("location").is_none());
    }
}
