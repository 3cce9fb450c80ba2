//! Shared layout of single-site hazard exports (hazard curves and UHS).
//!
//! ```text
//! #,,,,"generated_by='OpenQuake engine', investigation_time=50.0, imt='PGA'"   ← optional
//! lon,lat,...,<curve column labels>                                           ← header
//! -78.5,-0.2,...,<curve values>                                               ← values
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{HazardError, HazardResult};

/// Intensity measure type of a curve or spectrum column.
#[derive(Debug, Clone, PartialEq)]
pub enum IntensityMeasure {
    Pga,
    Sa(f64),
    Other(String),
}

impl IntensityMeasure {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("PGA") {
            return IntensityMeasure::Pga;
        }
        label
            .strip_prefix("SA(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|period| period.trim().parse::<f64>().ok())
            .map(IntensityMeasure::Sa)
            .unwrap_or_else(|| IntensityMeasure::Other(label.to_string()))
    }

    /// Structural period; PGA sits at `pga_period`. Non-spectral measures have none.
    pub fn period(&self, pga_period: f64) -> Option<f64> {
        match self {
            IntensityMeasure::Pga => Some(pga_period),
            IntensityMeasure::Sa(period) => Some(*period),
            IntensityMeasure::Other(_) => None,
        }
    }
}

impl fmt::Display for IntensityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityMeasure::Pga => write!(f, "PGA"),
            IntensityMeasure::Sa(period) => write!(f, "SA({period:?})"),
            IntensityMeasure::Other(label) => write!(f, "{label}"),
        }
    }
}

impl Serialize for IntensityMeasure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Site coordinate of a single-site export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Site {
    pub longitude: f64,
    pub latitude: f64,
}

/// The three logical rows of an export, borrowed from the raw record list.
#[derive(Debug)]
pub struct SourceLayout<'a> {
    pub metadata: BTreeMap<String, String>,
    pub header: &'a [String],
    pub values: &'a [String],
    /// File row number of `values`, for error messages.
    pub values_row: usize,
}

impl SourceLayout<'_> {
    pub fn investigation_time(&self) -> Option<f64> {
        self.metadata
            .get("investigation_time")
            .and_then(|v| v.parse().ok())
    }

    /// Longitude and latitude from the first two value cells.
    pub fn site(&self) -> HazardResult<Site> {
        Ok(Site {
            longitude: self.number(0)?,
            latitude: self.number(1)?,
        })
    }

    /// Value cell `col` as a number.
    pub fn number(&self, col: usize) -> HazardResult<f64> {
        let column = self
            .header
            .get(col)
            .cloned()
            .unwrap_or_else(|| format!("#{col}"));
        let cell = self.values.get(col).ok_or_else(|| HazardError::InvalidCell {
            row: self.values_row,
            column: column.clone(),
            reason: "missing value".into(),
        })?;
        parse_number(cell, self.values_row, &column)
    }
}

pub fn parse_number(cell: &str, row: usize, column: &str) -> HazardResult<f64> {
    cell.trim().parse().map_err(|_| HazardError::InvalidCell {
        row,
        column: column.to_string(),
        reason: format!("'{cell}' is not a number"),
    })
}

/// Split raw records into metadata, header and value rows.
/// A first record whose first cell starts with `#` is metadata.
pub fn split_rows(rows: &[Vec<String>]) -> HazardResult<SourceLayout<'_>> {
    let has_metadata = rows
        .first()
        .and_then(|row| row.first())
        .is_some_and(|cell| cell.trim_start().starts_with('#'));
    let header_row = usize::from(has_metadata);

    let header = rows
        .get(header_row)
        .ok_or_else(|| HazardError::MalformedTable("missing header row".into()))?;
    let values = rows
        .get(header_row + 1)
        .ok_or_else(|| HazardError::MalformedTable("missing value row".into()))?;
    if rows.len() > header_row + 2 {
        log::warn!(
            "{} extra site rows ignored; only the first site is read",
            rows.len() - header_row - 2
        );
    }

    let metadata = if has_metadata {
        parse_metadata(&rows[0])
    } else {
        BTreeMap::new()
    };

    Ok(SourceLayout {
        metadata,
        header,
        values,
        values_row: header_row + 1,
    })
}

/// `key=value` pairs scattered over the metadata record, quotes stripped.
fn parse_metadata(row: &[String]) -> BTreeMap<String, String> {
    row.iter()
        .flat_map(|cell| cell.split(','))
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().trim_start_matches('#').trim().to_string(),
                value.trim().trim_matches(|c| c == '\'' || c == '"').to_string(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn parses_imt_labels() {
        assert_eq!(IntensityMeasure::parse("PGA"), IntensityMeasure::Pga);
        assert_eq!(IntensityMeasure::parse("SA(0.2)"), IntensityMeasure::Sa(0.2));
        assert_eq!(
            IntensityMeasure::parse("PGV"),
            IntensityMeasure::Other("PGV".into())
        );
        assert_eq!(IntensityMeasure::Sa(1.0).to_string(), "SA(1.0)");
        assert_eq!(IntensityMeasure::Pga.period(0.01), Some(0.01));
        assert_eq!(IntensityMeasure::Other("PGV".into()).period(0.0), None);
    }

    #[test]
    fn splits_rows_with_metadata() {
        let rows = vec![
            record(&["#", "", "generated_by='OpenQuake engine 3.16', investigation_time=50.0, imt='SA(0.2)'"]),
            record(&["lon", "lat", "poe-0.1"]),
            record(&["-78.5", "-0.2", "0.3"]),
        ];
        let layout = split_rows(&rows).unwrap();
        assert_eq!(layout.investigation_time(), Some(50.0));
        assert_eq!(layout.metadata.get("imt").map(String::as_str), Some("SA(0.2)"));
        assert_eq!(
            layout.site().unwrap(),
            Site {
                longitude: -78.5,
                latitude: -0.2
            }
        );
        assert_eq!(layout.values_row, 2);
    }

    #[test]
    fn splits_rows_without_metadata() {
        let rows = vec![record(&["lon", "lat"]), record(&["1", "2"])];
        let layout = split_rows(&rows).unwrap();
        assert!(layout.metadata.is_empty());
        assert_eq!(layout.values_row, 1);
    }

    #[test]
    fn missing_value_row_is_malformed() {
        let rows = vec![record(&["#meta"]), record(&["lon", "lat"])];
        assert!(matches!(
            split_rows(&rows),
            Err(HazardError::MalformedTable(_))
        ));
    }

    #[test]
    fn bad_coordinate_is_invalid_cell() {
        let rows = vec![record(&["lon", "lat"]), record(&["east", "2"])];
        let err = split_rows(&rows).unwrap().site().unwrap_err();
        assert!(matches!(err, HazardError::InvalidCell { row: 1, .. }));
    }
}
