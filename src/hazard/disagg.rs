//! Weighted reduction of disaggregation tables.
//!
//! A table filtered to one (poe, imt) target is normalized into a
//! probability distribution over its bins, marginalized onto
//! (magnitude, distance) for the modal and mean statistics, and pivoted into a
//! dense cell × category grid for stacked display.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ColumnNames;
use crate::data::columns::{hazard_value_column, require_columns};
use crate::data::model::{CellValue, HazardTable};
use crate::error::{HazardError, HazardResult};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One disaggregation bin with its raw (unnormalized) hazard weight.
#[derive(Debug, Clone, PartialEq)]
pub struct DisaggregationRecord {
    pub magnitude: f64,
    pub distance: f64,
    pub epsilon: CellValue,
    pub tectonic_region: Option<CellValue>,
    pub poe: f64,
    pub imt: String,
    pub weight: f64,
}

/// Extract typed records from a magnitude/distance/epsilon table. The
/// tectonic region column is optional; all others are required.
pub fn records_from_table(
    table: &HazardTable,
    columns: &ColumnNames,
) -> HazardResult<Vec<DisaggregationRecord>> {
    require_columns(
        &table.columns,
        &[
            columns.magnitude.as_str(),
            columns.distance.as_str(),
            columns.epsilon.as_str(),
            columns.poe.as_str(),
            columns.imt.as_str(),
        ],
    )?;
    let value_column = hazard_value_column(&table.columns)?;
    log::debug!("using hazard column '{value_column}'");

    let magnitudes = table.numeric_column(&columns.magnitude)?;
    let distances = table.numeric_column(&columns.distance)?;
    let epsilons = table.value_column(&columns.epsilon)?;
    let poes = table.numeric_column(&columns.poe)?;
    let imts = table.value_column(&columns.imt)?;
    let weights = table.numeric_column(value_column)?;
    let regions = table.value_column(&columns.tectonic_region).ok();

    Ok((0..table.len())
        .map(|i| DisaggregationRecord {
            magnitude: magnitudes[i],
            distance: distances[i],
            epsilon: epsilons[i].clone(),
            tectonic_region: regions.as_ref().map(|r| r[i].clone()),
            poe: poes[i],
            imt: imts[i].to_string(),
            weight: weights[i],
        })
        .collect())
}

/// Divide each weight by the total. A zero total yields all `NaN`.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        log::warn!("hazard contributions sum to zero; normalized values are undefined");
        return vec![f64::NAN; weights.len()];
    }
    weights.iter().map(|w| w / total).collect()
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Position of a grid cell. For magnitude/distance grids the abscissa is the
/// distance and the ordinate the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    pub abscissa: f64,
    pub ordinate: f64,
}

/// Orders cells by ordinate, then abscissa.
#[derive(Debug, Clone, Copy)]
struct CellKey(GridCell);

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellKey {}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .ordinate
            .total_cmp(&other.0.ordinate)
            .then(self.0.abscissa.total_cmp(&other.0.abscissa))
    }
}

/// Dense cell × category contribution table; missing combinations are zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionGrid {
    /// Ordered by ordinate, then abscissa.
    pub cells: Vec<GridCell>,
    /// First-seen order.
    pub categories: Vec<CellValue>,
    /// `values[cell][category]`.
    pub values: Vec<Vec<f64>>,
}

impl ContributionGrid {
    /// Sum contributions per (cell, category).
    pub fn pivot<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (GridCell, CellValue, f64)>,
    {
        let mut categories: Vec<CellValue> = Vec::new();
        let mut rows: BTreeMap<CellKey, Vec<f64>> = BTreeMap::new();

        for (cell, category, fraction) in entries {
            let cat = match categories.iter().position(|c| *c == category) {
                Some(idx) => idx,
                None => {
                    categories.push(category);
                    categories.len() - 1
                }
            };
            let row = rows.entry(CellKey(cell)).or_default();
            if row.len() <= cat {
                row.resize(cat + 1, 0.0);
            }
            row[cat] += fraction;
        }

        let (cells, values): (Vec<GridCell>, Vec<Vec<f64>>) = rows
            .into_iter()
            .map(|(key, mut row)| {
                row.resize(categories.len(), 0.0);
                (key.0, row)
            })
            .unzip();

        ContributionGrid {
            cells,
            categories,
            values,
        }
    }

    /// Total contribution of one cell, summed in category order.
    pub fn cell_total(&self, cell: usize) -> f64 {
        self.values[cell].iter().sum()
    }

    /// One category's contribution across all cells.
    pub fn category_column(&self, category: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[category]).collect()
    }
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Normalized contribution of one input record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinContribution {
    pub magnitude: f64,
    pub distance: f64,
    pub epsilon: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tectonic_region: Option<CellValue>,
    pub fraction: f64,
}

/// Contribution of one (magnitude, distance) pair summed over the other
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarginalCell {
    pub magnitude: f64,
    pub distance: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReducedDisaggregation {
    pub modal_magnitude: f64,
    pub modal_distance: f64,
    pub mean_magnitude: f64,
    pub mean_distance: f64,
    pub contributions: Vec<BinContribution>,
    /// Ordered by magnitude, then distance.
    pub marginal: Vec<MarginalCell>,
    /// Distance × magnitude cells, one category per epsilon bin.
    pub grid: ContributionGrid,
}

/// Reduce records of a single (poe, imt) target.
pub fn reduce(records: &[DisaggregationRecord]) -> HazardResult<ReducedDisaggregation> {
    let Some(first) = records.first() else {
        return Err(HazardError::MalformedTable(
            "disaggregation table has no rows".into(),
        ));
    };
    if let Some(other) = records
        .iter()
        .find(|r| r.poe != first.poe || r.imt != first.imt)
    {
        return Err(HazardError::MalformedTable(format!(
            "rows span several targets: (poe={}, imt={}) and (poe={}, imt={})",
            first.poe, first.imt, other.poe, other.imt
        )));
    }

    let weights: Vec<f64> = records.iter().map(|r| r.weight).collect();
    let fractions = normalize(&weights);

    let contributions: Vec<BinContribution> = records
        .iter()
        .zip(&fractions)
        .map(|(r, &fraction)| BinContribution {
            magnitude: r.magnitude,
            distance: r.distance,
            epsilon: r.epsilon.clone(),
            tectonic_region: r.tectonic_region.clone(),
            fraction,
        })
        .collect();

    let mut grouped: BTreeMap<CellKey, f64> = BTreeMap::new();
    for c in &contributions {
        *grouped
            .entry(CellKey(GridCell {
                abscissa: c.distance,
                ordinate: c.magnitude,
            }))
            .or_insert(0.0) += c.fraction;
    }
    let marginal: Vec<MarginalCell> = grouped
        .into_iter()
        .map(|(key, contribution)| MarginalCell {
            magnitude: key.0.ordinate,
            distance: key.0.abscissa,
            contribution,
        })
        .collect();

    // First maximum in magnitude/distance order wins.
    let mut modal = marginal[0];
    for cell in &marginal[1..] {
        if cell.contribution > modal.contribution {
            modal = *cell;
        }
    }

    let mean_magnitude: f64 = marginal.iter().map(|c| c.magnitude * c.contribution).sum();
    let mean_distance: f64 = marginal.iter().map(|c| c.distance * c.contribution).sum();

    let grid = ContributionGrid::pivot(contributions.iter().map(|c| {
        (
            GridCell {
                abscissa: c.distance,
                ordinate: c.magnitude,
            },
            c.epsilon.clone(),
            c.fraction,
        )
    }));

    log::info!(
        "reduced {} bins: modal M{:.2} R{:.1} km, mean M{:.2} R{:.1} km",
        records.len(),
        modal.magnitude,
        modal.distance,
        mean_magnitude,
        mean_distance
    );

    Ok(ReducedDisaggregation {
        modal_magnitude: modal.magnitude,
        modal_distance: modal.distance,
        mean_magnitude,
        mean_distance,
        contributions,
        marginal,
        grid,
    })
}

/// Reductions parameterized by the table's column names.
#[derive(Debug, Clone, Copy)]
pub struct DisaggregationReducer<'a> {
    columns: &'a ColumnNames,
}

impl<'a> DisaggregationReducer<'a> {
    pub fn new(columns: &'a ColumnNames) -> Self {
        Self { columns }
    }

    /// Magnitude/distance/epsilon reduction of a filtered table.
    pub fn reduce_table(&self, table: &HazardTable) -> HazardResult<ReducedDisaggregation> {
        reduce(&records_from_table(table, self.columns)?)
    }

    /// Normalize the hazard column and pivot it over two numeric axes and a
    /// categorical column (tectonic region by magnitude/distance, or by
    /// location).
    pub fn reduce_categories(
        &self,
        table: &HazardTable,
        abscissa: &str,
        ordinate: &str,
        category: &str,
    ) -> HazardResult<ContributionGrid> {
        require_columns(&table.columns, &[abscissa, ordinate, category])?;
        if table.is_empty() {
            return Err(HazardError::MalformedTable(
                "disaggregation table has no rows".into(),
            ));
        }
        let value_column = hazard_value_column(&table.columns)?;

        let xs = table.numeric_column(abscissa)?;
        let ys = table.numeric_column(ordinate)?;
        let cats = table.value_column(category)?;
        let fractions = normalize(&table.numeric_column(value_column)?);

        log::debug!(
            "pivoting {} rows over {} '{category}' categories",
            table.len(),
            table.unique_values(category)?.len()
        );

        Ok(ContributionGrid::pivot(
            xs.into_iter()
                .zip(ys)
                .zip(cats)
                .zip(fractions)
                .map(|(((x, y), cat), fraction)| {
                    (
                        GridCell {
                            abscissa: x,
                            ordinate: y,
                        },
                        cat,
                        fraction,
                    )
                }),
        ))
    }

    /// Tectonic region grid over distance (abscissa) and magnitude (ordinate).
    pub fn reduce_tectonic(&self, table: &HazardTable) -> HazardResult<ContributionGrid> {
        self.reduce_categories(
            table,
            &self.columns.distance,
            &self.columns.magnitude,
            &self.columns.tectonic_region,
        )
    }

    /// Tectonic region grid over longitude (abscissa) and latitude (ordinate).
    pub fn reduce_location(&self, table: &HazardTable) -> HazardResult<ContributionGrid> {
        self.reduce_categories(
            table,
            &self.columns.longitude,
            &self.columns.latitude,
            &self.columns.tectonic_region,
        )
    }
}
