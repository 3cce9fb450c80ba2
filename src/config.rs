use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::PaletteKind;
use crate::error::{HazardError, HazardResult};

// ---------------------------------------------------------------------------
// Column naming
// ---------------------------------------------------------------------------

/// Names of the structural columns in disaggregation tables.
/// Defaults follow the OpenQuake CSV exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub magnitude: String,
    pub distance: String,
    pub epsilon: String,
    pub tectonic_region: String,
    pub poe: String,
    pub imt: String,
    pub longitude: String,
    pub latitude: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            magnitude: "mag".into(),
            distance: "dist".into(),
            epsilon: "eps".into(),
            tectonic_region: "trt".into(),
            poe: "poe".into(),
            imt: "imt".into(),
            longitude: "lon".into(),
            latitude: "lat".into(),
        }
    }
}

impl ColumnNames {
    fn all(&self) -> [(&'static str, &str); 8] {
        [
            ("magnitude", &self.magnitude),
            ("distance", &self.distance),
            ("epsilon", &self.epsilon),
            ("tectonic_region", &self.tectonic_region),
            ("poe", &self.poe),
            ("imt", &self.imt),
            ("longitude", &self.longitude),
            ("latitude", &self.latitude),
        ]
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime configuration. Every field has a default, so an empty JSON
/// object is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Investigation time the PoEs refer to, in years.
    /// Default: 50.
    pub exposure_years: u32,

    /// Pseudo-period assigned to PGA when ordering spectra.
    /// Default: 0.0.
    pub pga_period: f64,

    pub columns: ColumnNames,

    /// Palette for epsilon layers. Default: evenly spaced spectrum.
    pub epsilon_palette: PaletteKind,

    /// Palette for tectonic-region layers. Default: tableau.
    pub category_palette: PaletteKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exposure_years: 50,
            pga_period: 0.0,
            columns: ColumnNames::default(),
            epsilon_palette: PaletteKind::Spectrum,
            category_palette: PaletteKind::Tableau,
        }
    }
}

impl Config {
    /// Read a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HazardResult<()> {
        if self.exposure_years == 0 {
            return Err(HazardError::InvalidConfig(
                "exposure_years must be at least 1".into(),
            ));
        }
        if !self.pga_period.is_finite() || self.pga_period < 0.0 {
            return Err(HazardError::InvalidConfig(format!(
                "pga_period must be a finite, non-negative period, got {}",
                self.pga_period
            )));
        }
        if let Some((field, _)) = self.columns.all().iter().find(|(_, name)| name.is_empty()) {
            return Err(HazardError::InvalidConfig(format!(
                "column name '{field}' is empty"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_column_override() {
        let config: Config =
            serde_json::from_str(r#"{"exposure_years": 100, "columns": {"epsilon": "eps_bin"}}"#)
                .unwrap();
        assert_eq!(config.exposure_years, 100);
        assert_eq!(config.columns.epsilon, "eps_bin");
        assert_eq!(config.columns.magnitude, "mag");
    }

    #[test]
    fn zero_exposure_is_rejected() {
        let config = Config {
            exposure_years: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(HazardError::InvalidConfig(_))));
    }

    #[test]
    fn empty_column_name_is_rejected() {
        let mut config = Config::default();
        config.columns.imt.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            HazardError::InvalidConfig("column name 'imt' is empty".into())
        );
    }

    #[test]
    fn load_reads_palette_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"epsilon_palette": "tableau"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.epsilon_palette, PaletteKind::Tableau);
    }
}
