//! Bias-intensity bands for 0–100 scores.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityBand {
    Minimal,
    Low,
    Moderate,
    High,
}

impl IntensityBand {
    /// Upper (inclusive) bounds of every band but the last.
    pub const CUTS: [(f64, IntensityBand); 3] = [
        (10.0, IntensityBand::Minimal),
        (25.0, IntensityBand::Low),
        (45.0, IntensityBand::Moderate),
    ];

    /// Total over the reals: anything above the last cut is `High`, NaN is `Minimal`.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return IntensityBand::Minimal;
        }
        Self::CUTS
            .iter()
            .find(|(upper, _)| score <= *upper)
            .map(|(_, band)| *band)
            .unwrap_or(IntensityBand::High)
    }

    pub fn label(self) -> &'static str {
        match self {
            IntensityBand::Minimal => "minimal",
            IntensityBand::Low => "low",
            IntensityBand::Moderate => "moderate",
            IntensityBand::High => "high",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            IntensityBand::Minimal => "#22c55e",
            IntensityBand::Low => "#eab308",
            IntensityBand::Moderate => "#f97316",
            IntensityBand::High => "#ef4444",
        }
    }
}

impl std::fmt::Display for IntensityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
