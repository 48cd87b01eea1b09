//! Approximate significance threshold for delta plots.
//!
//! The threshold is a visual reference line, `1.96 * sqrt(sd_base²/n_base +
//! median(sd_cat²/n_cat))`. It is advisory only; the backend's p- and
//! q-values remain the actual test results.

use crate::models::DeltaRow;

const Z_95: f64 = 1.96;

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Threshold from explicit baseline statistics.
///
/// Returns `None` when the baseline is degenerate, no row has a usable
/// category variance, or the result is not a positive finite number.
pub fn significance_threshold(base_n: Option<u64>, base_sd: Option<f64>, rows: &[DeltaRow]) -> Option<f64> {
    let n_base = base_n.filter(|&n| n > 0)? as f64;
    let sd_base = base_sd.filter(|sd| sd.is_finite() && *sd > 0.0)?;

    let mut category_vars: Vec<f64> = rows
        .iter()
        .filter_map(|row| {
            let n = row.n_category.filter(|&n| n > 0)? as f64;
            let sd = row.sd_category.filter(|sd| sd.is_finite() && *sd >= 0.0)?;
            Some(sd * sd / n)
        })
        .collect();
    let category_var = median(&mut category_vars)?;

    let threshold = Z_95 * (sd_base * sd_base / n_base + category_var).sqrt();
    (threshold.is_finite() && threshold > 0.0).then_some(threshold)
}

/// Threshold using the baseline statistics carried on the rows themselves.
///
/// Every row of one response shares the same baseline; the first row that
/// reports both `n_base` and `sd_base` supplies them.
pub fn threshold_from_rows(rows: &[DeltaRow]) -> Option<f64> {
    let base = rows
        .iter()
        .find(|r| r.n_base.is_some() && r.sd_base.is_some())?;
    significance_threshold(base.n_base, base.sd_base, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: u64, sd: f64) -> DeltaRow {
        DeltaRow {
            category: format!("c{}", n),
            n_base: Some(100),
            sd_base: Some(1.0),
            n_category: Some(n),
            sd_category: Some(sd),
            ..Default::default()
        }
    }

    #[test]
    fn test_uses_median_category_variance() {
        let rows = vec![row(50, 1.0), row(60, 1.0), row(70, 1.0)];
        let expected = 1.96 * (1.0f64 / 100.0 + 1.0 / 60.0).sqrt();
        let got = significance_threshold(Some(100), Some(1.0), &rows).unwrap();
        assert!((got - expected).abs() < 1e-12);
        assert_eq!(threshold_from_rows(&rows), Some(got));
    }

    #[test]
    fn test_even_count_averages_middle() {
        let rows = vec![row(50, 1.0), row(100, 1.0)];
        let expected = 1.96 * (0.01f64 + (0.02 + 0.01) / 2.0).sqrt();
        let got = significance_threshold(Some(100), Some(1.0), &rows).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_yield_none() {
        let rows = vec![row(50, 1.0)];
        assert_eq!(significance_threshold(Some(100), Some(1.0), &[]), None);
        assert_eq!(significance_threshold(None, Some(1.0), &rows), None);
        assert_eq!(significance_threshold(Some(0), Some(1.0), &rows), None);
        assert_eq!(significance_threshold(Some(100), Some(0.0), &rows), None);
        assert_eq!(significance_threshold(Some(100), Some(f64::NAN), &rows), None);
        assert_eq!(significance_threshold(Some(100), None, &rows), None);
        assert_eq!(threshold_from_rows(&[]), None);
    }

    #[test]
    fn test_negative_standard_deviations_are_rejected() {
        let rows = vec![row(50, 1.0)];
        assert_eq!(significance_threshold(Some(100), Some(-1.0), &rows), None);
        assert_eq!(significance_threshold(Some(100), Some(1.0), &[row(50, -1.0)]), None);

        // A negative category sd is dropped, the remaining rows still count.
        let mixed = vec![row(50, -1.0), row(60, 1.0)];
        let expected = 1.96 * (0.01f64 + 1.0 / 60.0).sqrt();
        let got = significance_threshold(Some(100), Some(1.0), &mixed).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unusable_rows_are_skipped() {
        let mut bad = row(0, 1.0);
        bad.n_category = Some(0);
        let mut nan = row(40, f64::NAN);
        nan.sd_category = Some(f64::NAN);
        assert_eq!(significance_threshold(Some(100), Some(1.0), &[bad.clone(), nan.clone()]), None);

        let rows = vec![bad, nan, row(60, 1.0)];
        let expected = 1.96 * (1.0f64 / 100.0 + 1.0 / 60.0).sqrt();
        let got = significance_threshold(Some(100), Some(1.0), &rows).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }
}
