//! Colors shared by charts and badges.

use crate::grading::Grade;

/// Series colors for overlaid comparison targets, cycled in order.
pub const SERIES_PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#84cc16",
];

pub const OVERALL_COLOR: &str = "#f8fafc";
pub const THRESHOLD_COLOR: &str = "#f87171";
pub const AXIS_TEXT: &str = "#94a3b8";
pub const GRID_COLOR: &str = "#1e293b";
pub const HISTOGRAM_COLOR: &str = "#3b82f6";

pub fn series_color(index: usize) -> &'static str {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Tailwind classes for a grade badge.
pub fn grade_classes(grade: Grade) -> &'static str {
    match grade {
        Grade::Good => "bg-emerald-500/10 text-emerald-400 border-emerald-500/30",
        Grade::Warning => "bg-amber-500/10 text-amber-400 border-amber-500/30",
        Grade::Bad => "bg-red-500/10 text-red-400 border-red-500/30",
        Grade::NotApplicable => "bg-slate-800 text-slate-500 border-slate-700",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_color_cycles() {
        assert_eq!(series_color(0), series_color(SERIES_PALETTE.len()));
        assert_ne!(series_color(0), series_color(1));
    }
}
