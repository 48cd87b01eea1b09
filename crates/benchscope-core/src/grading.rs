//! Threshold-based grading of single statistics.
//!
//! Each [`MetricKind`] carries fixed cut points. Grading is total: absent or
//! non-finite input yields [`Grade::NotApplicable`] instead of an error.

use serde::{Deserialize, Serialize};

use crate::format;
use crate::models::OrderMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Good,
    Warning,
    Bad,
    NotApplicable,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::Good => "good",
            Grade::Warning => "warning",
            Grade::Bad => "bad",
            Grade::NotApplicable => "n/a",
        }
    }

    /// Severity tier, higher is worse. `NotApplicable` sits outside the scale.
    pub fn severity(self) -> Option<u8> {
        match self {
            Grade::Good => Some(0),
            Grade::Warning => Some(1),
            Grade::Bad => Some(2),
            Grade::NotApplicable => None,
        }
    }
}

/// Most severe graded entry; `NotApplicable` when nothing could be graded.
pub fn worst(grades: impl IntoIterator<Item = Grade>) -> Grade {
    grades
        .into_iter()
        .filter(|g| g.severity().is_some())
        .max_by_key(|g| g.severity())
        .unwrap_or(Grade::NotApplicable)
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of a cut-point table.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cuts {
    /// Good when `v >= good`, warning when `v >= warning`.
    AtLeast { good: f64, warning: f64 },
    /// Good when `|v| <= good`, warning when `|v| <= warning`.
    AbsAtMost { good: f64, warning: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Share of identical ratings between original and reversed order.
    ExactMatchRate,
    CliffsDelta,
    MeanAbsError,
    /// Spearman, Pearson or Kendall agreement between paired responses.
    Correlation,
    Within1Rate,
    OrderBias,
    /// Signed per-trait deviation from the expected rating.
    RmaDeviation,
}

impl MetricKind {
    fn cuts(self) -> Cuts {
        match self {
            MetricKind::ExactMatchRate => Cuts::AtLeast { good: 0.8, warning: 0.6 },
            MetricKind::CliffsDelta => Cuts::AbsAtMost { good: 0.147, warning: 0.33 },
            MetricKind::MeanAbsError => Cuts::AbsAtMost { good: 0.3, warning: 0.6 },
            MetricKind::Correlation => Cuts::AtLeast { good: 0.8, warning: 0.6 },
            MetricKind::Within1Rate => Cuts::AtLeast { good: 0.9, warning: 0.75 },
            MetricKind::OrderBias => Cuts::AbsAtMost { good: 0.1, warning: 0.25 },
            MetricKind::RmaDeviation => Cuts::AbsAtMost { good: 0.1, warning: 0.2 },
        }
    }

    /// Short description of the cut points, shown as a tooltip.
    pub fn describe(self) -> String {
        match self.cuts() {
            Cuts::AtLeast { good, warning } => {
                format!("good ≥ {}, warning ≥ {}, otherwise bad", good, warning)
            }
            Cuts::AbsAtMost { good, warning } => {
                format!("good |x| ≤ {}, warning |x| ≤ {}, otherwise bad", good, warning)
            }
        }
    }
}

pub fn grade(kind: MetricKind, value: Option<f64>) -> Grade {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return Grade::NotApplicable;
    };
    match kind.cuts() {
        Cuts::AtLeast { good, warning } => {
            if v >= good {
                Grade::Good
            } else if v >= warning {
                Grade::Warning
            } else {
                Grade::Bad
            }
        }
        Cuts::AbsAtMost { good, warning } => {
            let a = v.abs();
            if a <= good {
                Grade::Good
            } else if a <= warning {
                Grade::Warning
            } else {
                Grade::Bad
            }
        }
    }
}

/// Conventional magnitude label for an effect size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSize {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSize {
    pub fn label(self) -> &'static str {
        match self {
            EffectSize::Negligible => "negligible",
            EffectSize::Small => "small",
            EffectSize::Medium => "medium",
            EffectSize::Large => "large",
        }
    }

    fn from_cuts(v: f64, small: f64, medium: f64, large: f64) -> Self {
        if v < small {
            EffectSize::Negligible
        } else if v < medium {
            EffectSize::Small
        } else if v < large {
            EffectSize::Medium
        } else {
            EffectSize::Large
        }
    }

    /// Romano et al. thresholds on |δ|.
    pub fn from_cliffs_delta(value: Option<f64>) -> Option<Self> {
        value
            .filter(|v| v.is_finite())
            .map(|v| Self::from_cuts(v.abs(), 0.147, 0.33, 0.474))
    }

    pub fn from_eta_squared(value: Option<f64>) -> Option<Self> {
        value
            .filter(|v| v.is_finite())
            .map(|v| Self::from_cuts(v, 0.01, 0.06, 0.14))
    }
}

impl std::fmt::Display for EffectSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One headline statistic of the order-consistency summary, graded.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedMetric {
    pub label: &'static str,
    pub kind: MetricKind,
    pub value: Option<f64>,
    pub display: String,
    pub grade: Grade,
}

impl GradedMetric {
    fn new(label: &'static str, kind: MetricKind, value: Option<f64>, display: String) -> Self {
        Self {
            label,
            kind,
            value,
            display,
            grade: grade(kind, value),
        }
    }
}

/// Headline cards for the order-consistency view, in display order.
pub fn order_summary(m: &OrderMetrics) -> Vec<GradedMetric> {
    vec![
        GradedMetric::new(
            "Exact match rate",
            MetricKind::ExactMatchRate,
            m.exact_match_rate,
            format::percent1(m.exact_match_rate),
        ),
        GradedMetric::new("Mean absolute error", MetricKind::MeanAbsError, m.mae, format::num(m.mae, 3)),
        GradedMetric::new("Cliff's delta", MetricKind::CliffsDelta, m.cliffs_delta, format::signed(m.cliffs_delta, 3)),
        GradedMetric::new(
            "Order bias",
            MetricKind::OrderBias,
            m.order_bias.mean,
            format::signed(m.order_bias.mean, 3),
        ),
        GradedMetric::new(
            "Within ±1",
            MetricKind::Within1Rate,
            m.test_retest.within1_rate,
            format::percent1(m.test_retest.within1_rate),
        ),
        GradedMetric::new(
            "Spearman ρ",
            MetricKind::Correlation,
            m.correlation.spearman,
            format::num(m.correlation.spearman, 3),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_is_not_applicable() {
        for kind in [
            MetricKind::ExactMatchRate,
            MetricKind::CliffsDelta,
            MetricKind::MeanAbsError,
            MetricKind::Correlation,
            MetricKind::Within1Rate,
            MetricKind::OrderBias,
            MetricKind::RmaDeviation,
        ] {
            assert_eq!(grade(kind, Some(f64::NAN)), Grade::NotApplicable);
            assert_eq!(grade(kind, Some(f64::INFINITY)), Grade::NotApplicable);
            assert_eq!(grade(kind, None), Grade::NotApplicable);
        }
    }

    #[test]
    fn test_exact_match_rate_cut_points() {
        let g = |v| grade(MetricKind::ExactMatchRate, Some(v));
        assert_eq!(g(0.81), Grade::Good);
        assert_eq!(g(0.8), Grade::Good);
        assert_eq!(g(0.79), Grade::Warning);
        assert_eq!(g(0.6), Grade::Warning);
        assert_eq!(g(0.59), Grade::Bad);
    }

    #[test]
    fn test_cliffs_delta_uses_magnitude() {
        let g = |v| grade(MetricKind::CliffsDelta, Some(v));
        assert_eq!(g(0.147), Grade::Good);
        assert_eq!(g(-0.147), Grade::Good);
        assert_eq!(g(0.2), Grade::Warning);
        assert_eq!(g(-0.33), Grade::Warning);
        assert_eq!(g(0.331), Grade::Bad);
    }

    #[test]
    fn test_grading_is_monotonic() {
        let mut last = 0u8;
        for i in (0..=100).rev() {
            let sev = grade(MetricKind::ExactMatchRate, Some(i as f64 / 100.0))
                .severity()
                .unwrap();
            assert!(sev >= last);
            last = sev;
        }
    }

    #[test]
    fn test_worst_grade_skips_not_applicable() {
        assert_eq!(worst([Grade::Good, Grade::NotApplicable, Grade::Warning]), Grade::Warning);
        assert_eq!(worst([Grade::Bad, Grade::Good]), Grade::Bad);
        assert_eq!(worst([Grade::NotApplicable]), Grade::NotApplicable);
        assert_eq!(worst(Vec::new()), Grade::NotApplicable);

        let summary = order_summary(&OrderMetrics::default());
        assert_eq!(worst(summary.iter().map(|c| c.grade)), Grade::NotApplicable);
    }

    #[test]
    fn test_effect_size_labels() {
        assert_eq!(EffectSize::from_cliffs_delta(Some(-0.5)), Some(EffectSize::Large));
        assert_eq!(EffectSize::from_cliffs_delta(Some(0.1)), Some(EffectSize::Negligible));
        assert_eq!(EffectSize::from_eta_squared(Some(0.07)), Some(EffectSize::Medium));
        assert_eq!(EffectSize::from_eta_squared(Some(f64::NAN)), None);
    }

    #[test]
    fn test_order_summary_grades_each_card() {
        let m = OrderMetrics {
            exact_match_rate: Some(0.82),
            mae: Some(0.45),
            cliffs_delta: Some(-0.4),
            ..Default::default()
        };
        let cards = order_summary(&m);
        assert_eq!(cards.len(), 6);
        assert_eq!(cards[0].display, "82.0%");
        assert_eq!(cards[0].grade, Grade::Good);
        assert_eq!(cards[1].grade, Grade::Warning);
        assert_eq!(cards[2].grade, Grade::Bad);
        assert_eq!(cards[3].grade, Grade::NotApplicable);
        assert_eq!(cards[3].display, format::GAP);
    }
}
