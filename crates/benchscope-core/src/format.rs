//! Display formatting for optional statistics.
//!
//! Absent or non-finite values render as [`GAP`], never as `0`.

pub const GAP: &str = "–";

pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Fixed-precision number or the display gap.
pub fn num(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(v) => format!("{:.*}", decimals, v),
        None => GAP.to_string(),
    }
}

/// Number with an explicit sign, used for deltas.
pub fn signed(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(v) => format!("{:+.*}", decimals, v),
        None => GAP.to_string(),
    }
}

/// Share in `[0, 1]` rendered as a whole percentage: `0.4 -> "40%"`.
pub fn percent(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{}%", (v * 100.0).round() as i64),
        None => GAP.to_string(),
    }
}

/// Share rendered with one decimal, e.g. `"81.3%"`.
pub fn percent1(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => GAP.to_string(),
    }
}

/// p-values below 0.001 collapse to `<0.001`.
pub fn p_value(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) if v < 0.001 => "<0.001".to_string(),
        Some(v) => format!("{:.3}", v),
        None => GAP.to_string(),
    }
}

pub fn count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| GAP.to_string())
}

/// `[low, high]` interval, or the gap if either bound is missing.
pub fn interval(low: Option<f64>, high: Option<f64>, decimals: usize) -> String {
    match (finite(low), finite(high)) {
        (Some(l), Some(h)) => format!("[{:.*}, {:.*}]", decimals, l, decimals, h),
        _ => GAP.to_string(),
    }
}

pub fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => GAP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_renders_gap_not_zero() {
        assert_eq!(num(None, 2), GAP);
        assert_eq!(num(Some(f64::NAN), 2), GAP);
        assert_eq!(percent(None), GAP);
        assert_eq!(count(None), GAP);
        assert_eq!(interval(Some(0.1), None, 2), GAP);
    }

    #[test]
    fn test_formats() {
        assert_eq!(num(Some(0.12345), 3), "0.123");
        assert_eq!(signed(Some(0.25), 2), "+0.25");
        assert_eq!(signed(Some(-0.25), 2), "-0.25");
        assert_eq!(percent(Some(0.4)), "40%");
        assert_eq!(percent1(Some(0.8126)), "81.3%");
        assert_eq!(p_value(Some(0.0004)), "<0.001");
        assert_eq!(p_value(Some(0.0321)), "0.032");
        assert_eq!(interval(Some(-0.1), Some(0.3), 2), "[-0.10, 0.30]");
        assert_eq!(flag(Some(true)), "yes");
    }
}
