//! Exceedance probability ↔ annual rate of exceedance.

/// Annual rate of exceedance equivalent to `poe` over `exposure_years`:
/// `1 - (1 - poe)^(1 / exposure_years)`.
///
/// Probabilities outside the open interval `(0, 1)` come from degenerate
/// rows in upstream tables and map to `NaN` instead of failing. A zero
/// exposure has no defined rate and also maps to `NaN`.
pub fn to_annual_rate(poe: f64, exposure_years: u32) -> f64 {
    if !(poe > 0.0 && poe < 1.0) || exposure_years == 0 {
        return f64::NAN;
    }
    1.0 - (1.0 - poe).powf(1.0 / f64::from(exposure_years))
}

/// Element-wise [`to_annual_rate`]; same order and length as `poes`.
pub fn to_annual_rates(poes: &[f64], exposure_years: u32) -> Vec<f64> {
    poes.iter()
        .map(|&poe| to_annual_rate(poe, exposure_years))
        .collect()
}

/// Mean return period in years, `1 / rate`.
pub fn return_period(poe: f64, exposure_years: u32) -> f64 {
    1.0 / to_annual_rate(poe, exposure_years)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_in_fifty_years() {
        let rate = to_annual_rate(0.1, 50);
        assert!((rate - 0.002105).abs() < 1e-6, "rate = {rate}");
        assert!((return_period(0.1, 50) - 475.06).abs() < 0.1);
    }

    #[test]
    fn one_year_exposure_is_identity() {
        assert!((to_annual_rate(0.3, 1) - 0.3).abs() < 1e-15);
    }

    #[test]
    fn monotonic_and_bounded() {
        let poes: Vec<f64> = (1..100).map(|i| i as f64 / 100.0).collect();
        let rates = to_annual_rates(&poes, 50);
        for pair in rates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(rates.iter().all(|&r| r > 0.0 && r < 1.0));
    }

    #[test]
    fn out_of_domain_is_nan() {
        for poe in [0.0, -0.2, 1.0, 1.5, f64::NAN] {
            assert!(to_annual_rate(poe, 50).is_nan(), "poe = {poe}");
        }
        assert!(to_annual_rate(0.1, 0).is_nan());
    }

    #[test]
    fn sequence_keeps_order_and_length() {
        let rates = to_annual_rates(&[0.5, 0.0, 0.02], 50);
        assert_eq!(rates.len(), 3);
        assert!(rates[1].is_nan());
        assert!(rates[0] > rates[2]);
    }
}
