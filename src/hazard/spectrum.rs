//! Uniform hazard spectra: parsing, per-period queries and mean/quantile
//! summary tables.

use std::collections::BTreeMap;

use serde::Serialize;

use super::interpolate::interpolate;
use super::source::{parse_number, split_rows, IntensityMeasure, Site};
use crate::error::{HazardError, HazardResult};

/// Exceedance probabilities and spectral accelerations of one period, in
/// the column order of the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodCurve {
    pub imt: IntensityMeasure,
    pub period: f64,
    pub poes: Vec<f64>,
    pub accelerations: Vec<f64>,
}

/// One parsed UHS export. Immutable once built; curves are ordered by period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UhsSpectrumTable {
    pub site: Site,
    pub investigation_time: Option<f64>,
    curves: Vec<PeriodCurve>,
}

impl UhsSpectrumTable {
    pub fn new(site: Site, investigation_time: Option<f64>, mut curves: Vec<PeriodCurve>) -> Self {
        curves.sort_by(|a, b| a.period.total_cmp(&b.period));
        Self {
            site,
            investigation_time,
            curves,
        }
    }

    /// Parse raw records of a UHS export whose curve columns are labelled
    /// `<poe>~<IMT>` (e.g. `0.100000~SA(0.2)`).
    pub fn from_rows(rows: &[Vec<String>], pga_period: f64) -> HazardResult<Self> {
        let layout = split_rows(rows)?;
        let header_row = layout.values_row - 1;

        let mut curves: Vec<PeriodCurve> = Vec::new();
        for (col, label) in layout.header.iter().enumerate() {
            let Some((poe_label, imt_label)) = label.split_once('~') else {
                continue;
            };
            let imt = IntensityMeasure::parse(imt_label);
            let Some(period) = imt.period(pga_period) else {
                log::warn!("skipping non-spectral UHS column '{label}'");
                continue;
            };
            let poe = parse_number(poe_label, header_row, label)?;
            let sa = layout.number(col)?;

            match curves.iter_mut().find(|c| c.imt == imt) {
                Some(curve) => {
                    curve.poes.push(poe);
                    curve.accelerations.push(sa);
                }
                None => curves.push(PeriodCurve {
                    imt,
                    period,
                    poes: vec![poe],
                    accelerations: vec![sa],
                }),
            }
        }

        if curves.is_empty() {
            return Err(HazardError::MalformedTable(
                "no '<poe>~<IMT>' columns in UHS header".into(),
            ));
        }
        log::debug!("parsed UHS with {} periods", curves.len());

        Ok(Self::new(
            layout.site()?,
            layout.investigation_time(),
            curves,
        ))
    }

    pub fn curves(&self) -> &[PeriodCurve] {
        &self.curves
    }

    pub fn accessor(&self) -> SpectrumAccessor<'_> {
        SpectrumAccessor::new(self)
    }
}

/// Spectral acceleration as a continuous function of exceedance probability.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumAccessor<'a> {
    table: &'a UhsSpectrumTable,
}

impl<'a> SpectrumAccessor<'a> {
    pub fn new(table: &'a UhsSpectrumTable) -> Self {
        Self { table }
    }

    /// Ascending periods, PGA included at its pseudo-period.
    pub fn periods(&self) -> Vec<f64> {
        self.table.curves.iter().map(|c| c.period).collect()
    }

    /// Sa for every period at `poe`. Each period is interpolated on its own;
    /// a period whose curve does not bracket `poe` is `NaN`.
    pub fn spectral_acceleration(&self, poe: f64) -> Vec<f64> {
        self.table
            .curves
            .iter()
            .map(|c| interpolate(&c.poes, &c.accelerations, poe))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Mean + quantile summary
// ---------------------------------------------------------------------------

/// Spectral accelerations of a mean spectrum and its quantiles at one PoE.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UhsSummary {
    pub poe: f64,
    pub periods: Vec<f64>,
    pub mean: Vec<f64>,
    pub quantiles: BTreeMap<String, Vec<f64>>,
}

impl UhsSummary {
    pub fn build(
        mean: &UhsSpectrumTable,
        quantiles: &[(String, &UhsSpectrumTable)],
        poe: f64,
    ) -> HazardResult<Self> {
        let accessor = mean.accessor();
        let periods = accessor.periods();
        let mut columns = BTreeMap::new();
        for (label, table) in quantiles {
            let values = table.accessor().spectral_acceleration(poe);
            if values.len() != periods.len() {
                return Err(HazardError::LengthMismatch {
                    left: periods.len(),
                    right: values.len(),
                });
            }
            columns.insert(label.clone(), values);
        }
        Ok(Self {
            poe,
            mean: accessor.spectral_acceleration(poe),
            periods,
            quantiles: columns,
        })
    }
}

/// `q16` for names such as `quantile_uhs-0.16_1.csv`: the first `-0.dd` or
/// `_0.dd` in the name, scaled to a percentage.
pub fn quantile_label(name: &str) -> Option<String> {
    name.char_indices()
        .filter(|(_, c)| *c == '-' || *c == '_')
        .find_map(|(i, _)| {
            let rest = &name[i + 1..];
            let digits = rest.strip_prefix("0.")?;
            let len = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            if len == 0 {
                return None;
            }
            let value: f64 = rest[..2 + len].parse().ok()?;
            Some(format!("q{}", (value * 100.0).round() as i64))
        })
}

/// Summary label for a spectrum file: its quantile level when the name
/// carries one, the file name itself otherwise.
pub fn spectrum_label(file_name: &str) -> String {
    quantile_label(file_name).unwrap_or_else(|| file_name.to_string())
}
