use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::{HazardError, HazardResult};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a hazard table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell.
/// Categories (epsilon bins, tectonic regions) are keyed by `CellValue`
/// downstream, so it must be `Ord` and `Hash`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Equality used for row selection: numbers compare by value, so a
    /// `poe` cell parsed as `Integer(1)` still matches `Float(1.0)`.
    pub fn matches(&self, other: &CellValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Guess the type of a raw text cell.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// HazardTable – one materialized tabular output
// ---------------------------------------------------------------------------

/// A row-oriented table with a named header, as produced by the loader.
/// Row order is the source order and is significant (tie-breaks, first-seen
/// category order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HazardTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl HazardTable {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> HazardResult<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(HazardError::MalformedTable(format!(
                "row {i} has {} cells but the header has {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(HazardTable { columns, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> HazardResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| HazardError::MissingColumn(name.to_string()))
    }

    /// Cells of one column, in row order.
    pub fn value_column(&self, name: &str) -> HazardResult<Vec<CellValue>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Cells of one column converted to `f64`; any non-numeric cell is an error.
    pub fn numeric_column(&self, name: &str) -> HazardResult<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_no, row)| {
                row[idx].as_f64().ok_or_else(|| HazardError::InvalidCell {
                    row: row_no,
                    column: name.to_string(),
                    reason: format!("expected a number, got '{}'", row[idx]),
                })
            })
            .collect()
    }

    /// Distinct values of a column in first-seen order.
    pub fn unique_values(&self, name: &str) -> HazardResult<Vec<CellValue>> {
        let idx = self.column_index(name)?;
        let mut seen = BTreeSet::new();
        Ok(self
            .rows
            .iter()
            .filter(|row| seen.insert(row[idx].clone()))
            .map(|row| row[idx].clone())
            .collect())
    }

    /// A new table holding only the given rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> HazardTable {
        HazardTable {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HazardTable {
        HazardTable::new(
            vec!["trt".into(), "mag".into()],
            vec![
                vec![CellValue::parse("Active Shallow Crust"), CellValue::parse("5.5")],
                vec![CellValue::parse("Subduction Interface"), CellValue::parse("7")],
                vec![CellValue::parse("Active Shallow Crust"), CellValue::parse("6.5")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn parse_guesses_types() {
        assert_eq!(CellValue::parse("3"), CellValue::Integer(3));
        assert_eq!(CellValue::parse(" 0.1 "), CellValue::Float(0.1));
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("SA(0.2)"), CellValue::String("SA(0.2)".into()));
    }

    #[test]
    fn matches_is_numeric_aware() {
        assert!(CellValue::Integer(1).matches(&CellValue::Float(1.0)));
        assert!(!CellValue::Float(0.1).matches(&CellValue::Float(0.02)));
        assert!(CellValue::String("PGA".into()).matches(&CellValue::String("PGA".into())));
    }

    #[test]
    fn numeric_column_converts_integers() {
        assert_eq!(table().numeric_column("mag").unwrap(), vec![5.5, 7.0, 6.5]);
    }

    #[test]
    fn numeric_column_rejects_text() {
        let err = table().numeric_column("trt").unwrap_err();
        assert!(matches!(err, HazardError::InvalidCell { row: 0, .. }));
    }

    #[test]
    fn missing_column_is_an_error() {
        assert_eq!(
            table().column_index("eps"),
            Err(HazardError::MissingColumn("eps".into()))
        );
    }

    #[test]
    fn unique_values_keep_first_seen_order() {
        let values = table().unique_values("trt").unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::String("Active Shallow Crust".into()),
                CellValue::String("Subduction Interface".into()),
            ]
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = HazardTable::new(vec!["a".into()], vec![vec![CellValue::Null, CellValue::Null]]);
        assert!(matches!(result, Err(HazardError::MalformedTable(_))));
    }
}
