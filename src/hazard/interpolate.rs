//! Bracketing linear interpolation across a tabulated curve.

use serde::Serialize;

use crate::error::{HazardError, HazardResult};

/// Abscissa at which the curve `abscissa = f(ordinate)` crosses `target`.
///
/// Consecutive samples `(i, i + 1)` bracket the target when
/// `(y_i - target) * (y_{i+1} - target) <= 0` and `y_i != y_{i+1}`. The
/// first bracketing pair in input order is interpolated linearly; later
/// crossings of a non-monotonic curve are never considered. Flat segments are
/// skipped by exact comparison, even when they lie on the target.
///
/// Returns `NaN` when nothing brackets the target or fewer than two samples
/// are given. Unequal lengths are scanned over the common prefix; use
/// [`CurveSample::new`] to reject them instead.
pub fn interpolate(ordinates: &[f64], abscissas: &[f64], target: f64) -> f64 {
    ordinates
        .windows(2)
        .zip(abscissas.windows(2))
        .find(|(y, _)| (y[0] - target) * (y[1] - target) <= 0.0 && y[0] != y[1])
        .map(|(y, x)| x[0] + (target - y[0]) * (x[1] - x[0]) / (y[1] - y[0]))
        .unwrap_or(f64::NAN)
}

/// A validated discretized curve: parallel `x` and `y` of equal length ≥ 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSample {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl CurveSample {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> HazardResult<Self> {
        if x.len() != y.len() {
            return Err(HazardError::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(HazardError::MalformedTable(format!(
                "a curve needs at least 2 samples, got {}",
                x.len()
            )));
        }
        Ok(Self { x, y })
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.x, self.y)
    }
}
