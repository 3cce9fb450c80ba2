//! Single-site hazard curves: PoE (or annual rate) against intensity level.

use serde::Serialize;

use super::interpolate::{interpolate, CurveSample};
use super::metric::{to_annual_rate, to_annual_rates};
use super::source::{parse_number, split_rows, IntensityMeasure, Site};
use crate::error::{HazardError, HazardResult};

/// Header prefix of curve columns; the suffix is the intensity level.
const LEVEL_PREFIX: &str = "poe-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardCurve {
    pub imt: Option<IntensityMeasure>,
    pub site: Site,
    pub investigation_time: Option<f64>,
    /// Intensity measure levels (spectral acceleration, g).
    pub levels: Vec<f64>,
    /// Probability of exceedance of each level.
    pub poes: Vec<f64>,
}

/// Sa read off a curve at a reference PoE and at the equivalent annual rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceReading {
    pub imt: Option<IntensityMeasure>,
    pub reference_poe: f64,
    pub reference_rate: f64,
    pub sa_at_poe: f64,
    pub sa_at_rate: f64,
}

impl HazardCurve {
    /// Parse raw records of a hazard-curve export. Curve columns start at the
    /// first header cell prefixed `poe-`; everything before it describes the
    /// site (longitude and latitude first).
    pub fn from_rows(rows: &[Vec<String>]) -> HazardResult<Self> {
        let layout = split_rows(rows)?;
        let header_row = layout.values_row - 1;

        let first = layout
            .header
            .iter()
            .position(|h| h.starts_with(LEVEL_PREFIX))
            .ok_or_else(|| {
                HazardError::MalformedTable(format!("no '{LEVEL_PREFIX}' columns in header"))
            })?;
        if first < 2 {
            return Err(HazardError::MalformedTable(
                "hazard curve header must start with longitude and latitude".into(),
            ));
        }

        let mut levels = Vec::new();
        let mut poes = Vec::new();
        for (col, label) in layout.header.iter().enumerate().skip(first) {
            let level = label.strip_prefix(LEVEL_PREFIX).ok_or_else(|| {
                HazardError::MalformedTable(format!("unexpected column '{label}' among curve levels"))
            })?;
            levels.push(parse_number(level, header_row, label)?);
            poes.push(layout.number(col)?);
        }

        let (levels, poes) = CurveSample::new(levels, poes)?.into_parts();

        Ok(Self {
            imt: layout.metadata.get("imt").map(|s| IntensityMeasure::parse(s)),
            site: layout.site()?,
            investigation_time: layout.investigation_time(),
            levels,
            poes,
        })
    }

    /// Intensity level whose PoE equals `reference`.
    pub fn sa_at_poe(&self, reference: f64) -> f64 {
        interpolate(&self.poes, &self.levels, reference)
    }

    /// Annual rate of exceedance of each level.
    pub fn annual_rates(&self, exposure_years: u32) -> Vec<f64> {
        to_annual_rates(&self.poes, exposure_years)
    }

    /// Intensity level at the annual rate equivalent to `reference_poe`.
    pub fn sa_at_annual_rate(&self, reference_poe: f64, exposure_years: u32) -> f64 {
        interpolate(
            &self.annual_rates(exposure_years),
            &self.levels,
            to_annual_rate(reference_poe, exposure_years),
        )
    }

    pub fn reading(&self, reference_poe: f64, exposure_years: u32) -> ReferenceReading {
        ReferenceReading {
            imt: self.imt.clone(),
            reference_poe,
            reference_rate: to_annual_rate(reference_poe, exposure_years),
            sa_at_poe: self.sa_at_poe(reference_poe),
            sa_at_rate: self.sa_at_annual_rate(reference_poe, exposure_years),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn rows() -> Vec<Vec<String>> {
        vec![
            record(&[
                "#",
                "",
                "",
                "generated_by='OpenQuake engine 3.16', investigation_time=50.0, imt='SA(0.2)'",
            ]),
            record(&["lon", "lat", "depth", "poe-0.1", "poe-0.4", "poe-1.0"]),
            record(&["-78.5", "-0.2", "0.0", "0.6", "0.2", "0.01"]),
        ]
    }

    #[test]
    fn parses_levels_and_poes() {
        let curve = HazardCurve::from_rows(&rows()).unwrap();
        assert_eq!(curve.imt, Some(IntensityMeasure::Sa(0.2)));
        assert_eq!(curve.investigation_time, Some(50.0));
        assert_eq!(curve.levels, vec![0.1, 0.4, 1.0]);
        assert_eq!(curve.poes, vec![0.6, 0.2, 0.01]);
        assert_eq!(curve.site.longitude, -78.5);
    }

    #[test]
    fn sa_at_reference_poe() {
        let curve = HazardCurve::from_rows(&rows()).unwrap();
        let expected = 0.1 + (0.4 - 0.6) * (0.4 - 0.1) / (0.2 - 0.6);
        assert!((curve.sa_at_poe(0.4) - expected).abs() < 1e-12);
        assert!(curve.sa_at_poe(0.9).is_nan());
    }

    #[test]
    fn rate_reading_matches_converted_curve() {
        let curve = HazardCurve::from_rows(&rows()).unwrap();
        let rates = curve.annual_rates(50);
        let reference = to_annual_rate(0.1, 50);
        let expected = 0.4 + (reference - rates[1]) * (1.0 - 0.4) / (rates[2] - rates[1]);
        let reading = curve.reading(0.1, 50);
        assert!((reading.sa_at_rate - expected).abs() < 1e-12);
        assert!(reading.sa_at_poe > 0.4 && reading.sa_at_poe < 1.0);
    }

    #[test]
    fn missing_level_columns_is_malformed() {
        let rows = vec![record(&["lon", "lat", "depth"]), record(&["1", "2", "0"])];
        assert!(matches!(
            HazardCurve::from_rows(&rows),
            Err(HazardError::MalformedTable(_))
        ));
    }

    #[test]
    fn bad_level_label_is_invalid_cell() {
        let rows = vec![
            record(&["lon", "lat", "poe-x"]),
            record(&["1", "2", "0.5"]),
        ];
        assert!(matches!(
            HazardCurve::from_rows(&rows),
            Err(HazardError::InvalidCell { row: 0, .. })
        ));
    }
}
