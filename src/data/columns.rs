use crate::error::{HazardError, HazardResult};

// ---------------------------------------------------------------------------
// Column resolver
// ---------------------------------------------------------------------------

/// Hazard value columns are named by convention (`mean`, `rlz-000`, ...), not
/// by a fixed schema. Rules are tried in order; the first rule with any
/// matching column wins, and within a rule the leftmost column wins.
pub const HAZARD_VALUE_PREFIXES: [&str; 2] = ["mean", "rlz"];

/// Return the first column whose name starts with one of `prefixes`,
/// honouring the precedence of `prefixes` over column order.
pub fn resolve_by_prefix<'a>(columns: &'a [String], prefixes: &[&str]) -> HazardResult<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| columns.iter().find(|c| c.starts_with(prefix)))
        .map(|c| c.as_str())
        .ok_or_else(|| HazardError::NoMatchingColumn {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        })
}

/// The raw hazard-contribution column: a `mean` column if there is one,
/// otherwise the first single-realization (`rlz`) column.
pub fn hazard_value_column(columns: &[String]) -> HazardResult<&str> {
    resolve_by_prefix(columns, &HAZARD_VALUE_PREFIXES)
}

/// Every column name in `required` must be present.
pub fn require_columns(columns: &[String], required: &[&str]) -> HazardResult<()> {
    match required.iter().find(|name| !columns.iter().any(|c| c == *name)) {
        Some(missing) => Err(HazardError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn mean_is_preferred_over_earlier_rlz() {
        let cols = names(&["imt", "poe", "rlz-003", "mean"]);
        assert_eq!(hazard_value_column(&cols).unwrap(), "mean");
    }

    #[test]
    fn falls_back_to_first_rlz() {
        let cols = names(&["mag", "rlz-001", "rlz-000"]);
        assert_eq!(hazard_value_column(&cols).unwrap(), "rlz-001");
    }

    #[test]
    fn no_candidate_is_an_error() {
        let cols = names(&["mag", "dist", "eps"]);
        assert_eq!(
            hazard_value_column(&cols),
            Err(HazardError::NoMatchingColumn {
                prefixes: vec!["mean".into(), "rlz".into()]
            })
        );
    }

    #[test]
    fn require_reports_first_missing() {
        let cols = names(&["mag", "dist"]);
        assert!(require_columns(&cols, &["mag", "dist"]).is_ok());
        assert_eq!(
            require_columns(&cols, &["mag", "eps", "trt"]),
            Err(HazardError::MissingColumn("eps".into()))
        );
    }
}
