use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{CellValue, HazardTable};
use crate::config::ColumnNames;
use crate::error::{HazardError, HazardResult};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of accepted values.
/// Columns absent from the map are unconstrained.
pub type FilterState = BTreeMap<String, BTreeSet<CellValue>>;

/// Return indices of rows that pass all filters, in row order.
///
/// A row passes a column filter when its cell [`matches`](CellValue::matches)
/// any accepted value. An empty accepted set rejects every row. Filtering on
/// a column the table does not have is a structural error.
pub fn filtered_indices(table: &HazardTable, filters: &FilterState) -> HazardResult<Vec<usize>> {
    let constraints: Vec<(usize, &BTreeSet<CellValue>)> = filters
        .iter()
        .map(|(col, accepted)| table.column_index(col).map(|idx| (idx, accepted)))
        .collect::<HazardResult<_>>()?;

    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            constraints
                .iter()
                .all(|(idx, accepted)| accepted.iter().any(|v| v.matches(&row[*idx])))
        })
        .map(|(i, _)| i)
        .collect())
}

// ---------------------------------------------------------------------------
// (poe, imt) target selection
// ---------------------------------------------------------------------------

/// One disaggregation target: a probability of exceedance and an intensity
/// measure type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisaggregationTarget {
    pub poe: f64,
    pub imt: String,
}

impl DisaggregationTarget {
    pub fn new(poe: f64, imt: impl Into<String>) -> Self {
        Self {
            poe,
            imt: imt.into(),
        }
    }

    fn filter_state(&self, columns: &ColumnNames) -> FilterState {
        let mut filters = FilterState::new();
        filters.insert(
            columns.poe.clone(),
            BTreeSet::from([CellValue::Float(self.poe)]),
        );
        filters.insert(
            columns.imt.clone(),
            BTreeSet::from([CellValue::String(self.imt.clone())]),
        );
        filters
    }
}

/// Rows matching `target` exactly (poe compared by value, imt by text).
/// No matching row is an error: nothing downstream can be reduced.
pub fn select_target(
    table: &HazardTable,
    target: &DisaggregationTarget,
    columns: &ColumnNames,
) -> HazardResult<HazardTable> {
    let indices = filtered_indices(table, &target.filter_state(columns))?;
    if indices.is_empty() {
        return Err(HazardError::EmptySelection {
            poe: target.poe,
            imt: target.imt.clone(),
        });
    }
    log::debug!(
        "selected {} of {} rows for poe={} imt={}",
        indices.len(),
        table.len(),
        target.poe,
        target.imt
    );
    Ok(table.select(&indices))
}

/// Distinct (poe, imt) pairs in first-seen order.
pub fn available_targets(
    table: &HazardTable,
    columns: &ColumnNames,
) -> HazardResult<Vec<DisaggregationTarget>> {
    let poes = table.numeric_column(&columns.poe)?;
    let imts = table.value_column(&columns.imt)?;

    let mut seen = BTreeSet::new();
    Ok(poes
        .into_iter()
        .zip(imts)
        .filter(|(poe, imt)| seen.insert((CellValue::Float(*poe), imt.clone())))
        .map(|(poe, imt)| DisaggregationTarget::new(poe, imt.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HazardTable {
        let rows = [
            ("PGA", "0.1", "1.0"),
            ("PGA", "0.02", "2.0"),
            ("SA(1.0)", "0.1", "3.0"),
            ("PGA", "0.1", "4.0"),
        ];
        HazardTable::new(
            vec!["imt".into(), "poe".into(), "mean".into()],
            rows.iter()
                .map(|(imt, poe, mean)| {
                    vec![CellValue::parse(imt), CellValue::parse(poe), CellValue::parse(mean)]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn selects_matching_rows_in_order() {
        let selected = select_target(
            &table(),
            &DisaggregationTarget::new(0.1, "PGA"),
            &ColumnNames::default(),
        )
        .unwrap();
        assert_eq!(selected.numeric_column("mean").unwrap(), vec![1.0, 4.0]);
    }

    #[test]
    fn absent_target_is_empty_selection() {
        let err = select_target(
            &table(),
            &DisaggregationTarget::new(0.5, "PGA"),
            &ColumnNames::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HazardError::EmptySelection { .. }));
    }

    #[test]
    fn filtering_unknown_column_fails() {
        let mut filters = FilterState::new();
        filters.insert("eps".into(), BTreeSet::from([CellValue::Integer(0)]));
        assert_eq!(
            filtered_indices(&table(), &filters),
            Err(HazardError::MissingColumn("eps".into()))
        );
    }

    #[test]
    fn empty_accepted_set_rejects_everything() {
        let mut filters = FilterState::new();
        filters.insert("imt".into(), BTreeSet::new());
        assert!(filtered_indices(&table(), &filters).unwrap().is_empty());
    }

    #[test]
    fn lists_targets_first_seen() {
        let targets = available_targets(&table(), &ColumnNames::default()).unwrap();
        assert_eq!(
            targets,
            vec![
                DisaggregationTarget::new(0.1, "PGA"),
                DisaggregationTarget::new(0.02, "PGA"),
                DisaggregationTarget::new(0.1, "SA(1.0)"),
            ]
        );
    }
}
