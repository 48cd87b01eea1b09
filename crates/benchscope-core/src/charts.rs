//! Chart assembly: turns fetched rows into chart-ready series and Plotly figures.
//!
//! Series structs are plain data so they can be inspected without a browser;
//! the `*_figure` builders wrap them into `plotly::Plot`s that the dashboard
//! hands to Plotly.js as JSON.

use plotly::common::{DashType, ErrorData, ErrorType, Font, HoverInfo, Marker, MarkerSymbol, Mode, Title};
use plotly::layout::{Axis, BarMode, Margin, Shape, ShapeLine, ShapeType};
use plotly::{Bar, Layout, Plot, Scatter};

use crate::format;
use crate::models::{DeltaRow, ForestOverall, ForestRow, Histogram, MeansResponse};
use crate::theme;

// ─── Error bars ──────────────────────────────────────────────────────────────

/// Asymmetric error-bar lengths, parallel to the series points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBars {
    pub plus: Vec<f64>,
    pub minus: Vec<f64>,
}

/// `(plus, minus)` lengths for one point.
///
/// Bounds that sit on the wrong side of the estimate clamp to zero; a missing
/// estimate or bound draws no bar.
pub fn error_extent(delta: Option<f64>, ci_low: Option<f64>, ci_high: Option<f64>) -> (f64, f64) {
    let Some(d) = format::finite(delta) else {
        return (0.0, 0.0);
    };
    let plus = format::finite(ci_high).map(|h| (h - d).max(0.0)).unwrap_or(0.0);
    let minus = format::finite(ci_low).map(|l| (d - l).max(0.0)).unwrap_or(0.0);
    (plus, minus)
}

impl ErrorBars {
    fn push(&mut self, delta: Option<f64>, ci_low: Option<f64>, ci_high: Option<f64>) {
        let (plus, minus) = error_extent(delta, ci_low, ci_high);
        self.plus.push(plus);
        self.minus.push(minus);
    }

    fn to_error_data(&self, color: &'static str) -> ErrorData {
        ErrorData::new(ErrorType::Data)
            .symmetric(false)
            .array(self.plus.clone())
            .array_minus(self.minus.clone())
            .color(color)
            .thickness(1.5)
            .width(4)
    }
}

// ─── Delta series ────────────────────────────────────────────────────────────

/// Per-category deltas against the baseline for one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaSeries {
    pub name: String,
    pub color: &'static str,
    pub categories: Vec<String>,
    /// `None` entries render as gaps.
    pub deltas: Vec<Option<f64>>,
    pub errors: ErrorBars,
    pub hover: Vec<String>,
}

pub fn delta_hover(row: &DeltaRow) -> String {
    format!(
        "<b>{}</b><br>Δ = {}<br>95% CI {}<br>p = {}, q = {}<br>Cliff's δ = {}<br>n = {} vs {} (base)<br>sd = {} vs {} (base)",
        row.category,
        format::signed(row.delta, 3),
        format::interval(row.ci_low, row.ci_high, 3),
        format::p_value(row.p_value),
        format::p_value(row.q_value),
        format::num(row.cliffs_delta, 3),
        format::count(row.n_category),
        format::count(row.n_base),
        format::num(row.sd_category, 2),
        format::num(row.sd_base, 2),
    )
}

pub fn delta_series(name: impl Into<String>, index: usize, rows: &[DeltaRow]) -> DeltaSeries {
    let mut series = DeltaSeries {
        name: name.into(),
        color: theme::series_color(index),
        categories: Vec::with_capacity(rows.len()),
        deltas: Vec::with_capacity(rows.len()),
        errors: ErrorBars::default(),
        hover: Vec::with_capacity(rows.len()),
    };
    for row in rows {
        series.categories.push(row.category.clone());
        series.deltas.push(format::finite(row.delta));
        series.errors.push(row.delta, row.ci_low, row.ci_high);
        series.hover.push(delta_hover(row));
    }
    series
}

// ─── Forest series ───────────────────────────────────────────────────────────

/// Per-case effects for one target category.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestSeries {
    pub target: String,
    pub color: &'static str,
    pub labels: Vec<String>,
    pub deltas: Vec<Option<f64>>,
    pub errors: ErrorBars,
    pub hover: Vec<String>,
}

pub fn forest_series(target: impl Into<String>, index: usize, rows: &[ForestRow]) -> ForestSeries {
    let target = target.into();
    let mut series = ForestSeries {
        target,
        color: theme::series_color(index),
        labels: Vec::with_capacity(rows.len()),
        deltas: Vec::with_capacity(rows.len()),
        errors: ErrorBars::default(),
        hover: Vec::with_capacity(rows.len()),
    };
    for row in rows {
        series.labels.push(row.display_label().to_string());
        series.deltas.push(format::finite(row.delta));
        series.errors.push(row.delta, row.ci_low, row.ci_high);
        series.hover.push(format!(
            "<b>{}</b> ({})<br>Δ = {}<br>95% CI {}<br>SE = {}",
            row.display_label(),
            series.target,
            format::signed(row.delta, 3),
            format::interval(row.ci_low, row.ci_high, 3),
            format::num(row.se, 3),
        ));
    }
    series
}

/// Aggregate marker drawn below the per-case rows.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallMarker {
    pub label: String,
    pub mean: f64,
    pub plus: f64,
    pub minus: f64,
    pub hover: String,
}

pub const OVERALL_LABEL: &str = "Overall";

pub fn overall_marker(overall: &ForestOverall) -> Option<OverallMarker> {
    let mean = format::finite(overall.mean)?;
    let (plus, minus) = error_extent(overall.mean, overall.ci_low, overall.ci_high);
    Some(OverallMarker {
        label: OVERALL_LABEL.to_string(),
        mean,
        plus,
        minus,
        hover: format!(
            "<b>{}</b><br>mean Δ = {}<br>95% CI {}",
            OVERALL_LABEL,
            format::signed(Some(mean), 3),
            format::interval(overall.ci_low, overall.ci_high, 3),
        ),
    })
}

// ─── Histogram / means ───────────────────────────────────────────────────────

/// Null or non-finite values stay `None` and draw as gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
    pub hover: Vec<String>,
}

pub fn histogram_series(hist: &Histogram) -> HistogramSeries {
    let len = hist.bins.len().min(hist.shares.len());
    if hist.bins.len() != hist.shares.len() {
        #[cfg(not(target_arch = "wasm32"))]
        tracing::warn!(
            "histogram has {} bins but {} shares; keeping the first {}",
            hist.bins.len(),
            hist.shares.len(),
            len
        );
    }
    let x: Vec<Option<f64>> = hist.bins[..len].iter().map(|b| format::finite(*b)).collect();
    let y: Vec<Option<f64>> = hist.shares[..len].iter().map(|s| format::finite(*s)).collect();
    let hover = y.iter().map(|s| format::percent(*s)).collect();
    HistogramSeries { x, y, hover }
}

// ─── Figures ─────────────────────────────────────────────────────────────────

fn base_layout(x_title: &str, y_title: &str) -> Layout {
    Layout::new()
        .margin(Margin::new().left(60).right(30).top(30).bottom(50))
        .show_legend(true)
        .paper_background_color("rgba(0,0,0,0)")
        .plot_background_color("rgba(0,0,0,0)")
        .font(Font::new().color(theme::AXIS_TEXT))
        .x_axis(
            Axis::new()
                .title(Title::from(x_title))
                .show_grid(true)
                .grid_color(theme::GRID_COLOR),
        )
        .y_axis(
            Axis::new()
                .title(Title::from(y_title))
                .show_grid(true)
                .grid_color(theme::GRID_COLOR),
        )
}

fn horizontal_line(y: f64, color: &'static str, dash: DashType) -> Shape {
    Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("paper")
        .y_ref("y")
        .x0(0.0)
        .x1(1.0)
        .y0(y)
        .y1(y)
        .line(ShapeLine::new().color(color).width(1.0).dash(dash))
}

fn vertical_line(x: f64, color: &'static str, dash: DashType) -> Shape {
    Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("x")
        .y_ref("paper")
        .x0(x)
        .x1(x)
        .y0(0.0)
        .y1(1.0)
        .line(ShapeLine::new().color(color).width(1.0).dash(dash))
}

pub fn histogram_figure(hist: &Histogram) -> Plot {
    let series = histogram_series(hist);
    let mut plot = Plot::new();
    plot.set_layout(base_layout("Rating", "Share").show_legend(false));
    plot.add_trace(
        Bar::new(series.x, series.y)
            .name("ratings")
            .marker(Marker::new().color(theme::HISTOGRAM_COLOR))
            .hover_text_array(series.hover)
            .hover_info(HoverInfo::Text),
    );
    plot
}

/// Rating histograms of several runs on shared axes.
pub fn histogram_overlay_figure(runs: &[(String, Histogram)]) -> Plot {
    let mut plot = Plot::new();
    plot.set_layout(base_layout("Rating", "Share").bar_mode(BarMode::Group));
    for (i, (name, hist)) in runs.iter().enumerate() {
        let series = histogram_series(hist);
        plot.add_trace(
            Bar::new(series.x, series.y)
                .name(name.as_str())
                .marker(Marker::new().color(theme::series_color(i)))
                .hover_text_array(series.hover)
                .hover_info(HoverInfo::Text),
        );
    }
    plot
}

/// Category deltas with CI bars, a zero line and ±threshold reference lines.
pub fn delta_figure(series: &[DeltaSeries], threshold: Option<f64>) -> Plot {
    let mut shapes = vec![horizontal_line(0.0, theme::AXIS_TEXT, DashType::Solid)];
    if let Some(t) = threshold {
        shapes.push(horizontal_line(t, theme::THRESHOLD_COLOR, DashType::Dash));
        shapes.push(horizontal_line(-t, theme::THRESHOLD_COLOR, DashType::Dash));
    }

    let mut plot = Plot::new();
    plot.set_layout(base_layout("Category", "Δ vs baseline").shapes(shapes));
    for s in series {
        plot.add_trace(
            Scatter::new(s.categories.clone(), s.deltas.clone())
                .name(s.name.as_str())
                .mode(Mode::Markers)
                .marker(Marker::new().color(s.color).size(10))
                .error_y(s.errors.to_error_data(s.color))
                .hover_text_array(s.hover.clone())
                .hover_info(HoverInfo::Text),
        );
    }
    plot
}

/// Forest plot: one row per case, one colored series per target, plus the
/// overall diamond.
pub fn forest_figure(series: &[ForestSeries], overall: Option<&OverallMarker>) -> Plot {
    let mut plot = Plot::new();
    plot.set_layout(
        base_layout("Δ vs baseline", "")
            .shapes(vec![vertical_line(0.0, theme::AXIS_TEXT, DashType::Dash)]),
    );
    for s in series {
        plot.add_trace(
            Scatter::new(s.deltas.clone(), s.labels.clone())
                .name(s.target.as_str())
                .mode(Mode::Markers)
                .marker(Marker::new().color(s.color).size(8))
                .error_x(s.errors.to_error_data(s.color))
                .hover_text_array(s.hover.clone())
                .hover_info(HoverInfo::Text),
        );
    }
    if let Some(o) = overall {
        let bars = ErrorBars {
            plus: vec![o.plus],
            minus: vec![o.minus],
        };
        plot.add_trace(
            Scatter::new(vec![o.mean], vec![o.label.clone()])
                .name(o.label.as_str())
                .mode(Mode::Markers)
                .marker(
                    Marker::new()
                        .color(theme::OVERALL_COLOR)
                        .size(14)
                        .symbol(MarkerSymbol::Diamond),
                )
                .error_x(bars.to_error_data(theme::OVERALL_COLOR))
                .hover_text_array(vec![o.hover.clone()])
                .hover_info(HoverInfo::Text),
        );
    }
    plot
}

/// Mean rating per category with ±sd bars.
pub fn means_figure(means: &MeansResponse) -> Plot {
    let categories: Vec<String> = means.rows.iter().map(|r| r.category.clone()).collect();
    let values: Vec<Option<f64>> = means.rows.iter().map(|r| format::finite(r.mean)).collect();
    let sd: Vec<f64> = means
        .rows
        .iter()
        .map(|r| format::finite(r.sd).unwrap_or(0.0))
        .collect();
    let hover: Vec<String> = means
        .rows
        .iter()
        .map(|r| {
            format!(
                "<b>{}</b><br>mean = {}<br>sd = {}<br>n = {}",
                r.category,
                format::num(r.mean, 3),
                format::num(r.sd, 3),
                format::count(r.count)
            )
        })
        .collect();

    let mut plot = Plot::new();
    plot.set_layout(base_layout(&means.attribute, "Mean rating").show_legend(false));
    plot.add_trace(
        Bar::new(categories, values)
            .name(means.attribute.as_str())
            .marker(Marker::new().color(theme::HISTOGRAM_COLOR))
            .error_y(ErrorData::new(ErrorType::Data).array(sd).color(theme::AXIS_TEXT))
            .hover_text_array(hover)
            .hover_info(HoverInfo::Text),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeanRow;

    fn delta(category: &str, d: Option<f64>, lo: Option<f64>, hi: Option<f64>) -> DeltaRow {
        DeltaRow {
            category: category.to_string(),
            delta: d,
            ci_low: lo,
            ci_high: hi,
            ..Default::default()
        }
    }

    #[test]
    fn test_error_bars_never_negative() {
        assert_eq!(error_extent(Some(0.5), Some(0.3), Some(0.4)), (0.0, 0.2));
        assert_eq!(error_extent(Some(0.5), Some(0.6), Some(0.9)), (0.4, 0.0));
        assert_eq!(error_extent(Some(0.5), Some(0.2), Some(0.9)).0, 0.4);
        assert_eq!(error_extent(None, Some(0.2), Some(0.9)), (0.0, 0.0));
        assert_eq!(error_extent(Some(0.5), None, None), (0.0, 0.0));

        let rows = vec![
            delta("a", Some(0.1), Some(0.2), Some(0.05)),
            delta("b", Some(-0.3), Some(-0.5), Some(-0.1)),
            delta("c", Some(f64::NAN), Some(0.0), Some(1.0)),
        ];
        let s = delta_series("gender", 0, &rows);
        assert!(s.errors.plus.iter().chain(&s.errors.minus).all(|v| *v >= 0.0));
        assert_eq!(s.deltas[2], None);
        assert_eq!(s.categories, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delta_hover_mentions_statistics() {
        let mut row = delta("female", Some(0.12), Some(0.02), Some(0.22));
        row.p_value = Some(0.01);
        row.q_value = None;
        row.n_category = Some(40);
        row.n_base = Some(100);
        let hover = delta_hover(&row);
        assert!(hover.contains("female"));
        assert!(hover.contains("+0.120"));
        assert!(hover.contains("[0.020, 0.220]"));
        assert!(hover.contains("p = 0.010"));
        assert!(hover.contains("q = –"));
        assert!(hover.contains("n = 40 vs 100"));
    }

    #[test]
    fn test_forest_series_get_distinct_colors() {
        let rows = vec![ForestRow {
            case_id: "c1".into(),
            label: None,
            delta: Some(0.1),
            ci_low: Some(0.0),
            ci_high: Some(0.2),
            se: Some(0.05),
        }];
        let a = forest_series("female", 0, &rows);
        let b = forest_series("diverse", 1, &rows);
        assert_ne!(a.color, b.color);
        assert_eq!(a.labels, vec!["c1"]);

        let plot = forest_figure(&[a, b], None);
        let json: serde_json::Value = serde_json::from_str(&plot.to_json()).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_overall_marker() {
        let overall = ForestOverall {
            mean: Some(0.2),
            ci_low: Some(0.1),
            ci_high: Some(0.25),
        };
        let m = overall_marker(&overall).unwrap();
        assert_eq!(m.label, OVERALL_LABEL);
        assert!((m.plus - 0.05).abs() < 1e-12);
        assert!((m.minus - 0.1).abs() < 1e-12);
        assert!(overall_marker(&ForestOverall::default()).is_none());

        let plot = forest_figure(&[], Some(&m));
        let json: serde_json::Value = serde_json::from_str(&plot.to_json()).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_histogram_carries_exact_arrays() {
        let hist = Histogram {
            bins: [1.0, 2.0, 3.0, 4.0, 5.0].map(Some).to_vec(),
            shares: [0.1, 0.2, 0.4, 0.2, 0.1].map(Some).to_vec(),
            counts: vec![],
        };
        let s = histogram_series(&hist);
        assert_eq!(s.x, [1.0, 2.0, 3.0, 4.0, 5.0].map(Some).to_vec());
        assert_eq!(s.y, [0.1, 0.2, 0.4, 0.2, 0.1].map(Some).to_vec());
        assert_eq!(s.hover[2], "40%");
        assert_eq!(s.hover, vec!["10%", "20%", "40%", "20%", "10%"]);

        let json: serde_json::Value =
            serde_json::from_str(&histogram_figure(&hist).to_json()).unwrap();
        assert_eq!(json["data"][0]["x"], serde_json::json!([1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(json["data"][0]["y"], serde_json::json!([0.1, 0.2, 0.4, 0.2, 0.1]));
        assert!(json["data"][0].to_string().contains("\"40%\""));
    }

    #[test]
    fn test_histogram_truncates_ragged_arrays() {
        let hist = Histogram {
            bins: vec![Some(1.0), Some(2.0), Some(3.0)],
            shares: vec![Some(0.5), Some(0.5)],
            counts: vec![],
        };
        assert_eq!(histogram_series(&hist).x, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_histogram_null_share_is_a_gap() {
        let snapshot: crate::models::MetricsSnapshot = serde_json::from_str(
            r#"{"n":10,"hist":{"bins":[1,2,3],"shares":[0.5,null,0.5],"counts":[5,null,5]}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.hist.counts, vec![Some(5), None, Some(5)]);

        let s = histogram_series(&snapshot.hist);
        assert_eq!(s.y, vec![Some(0.5), None, Some(0.5)]);
        assert_eq!(s.hover, vec!["50%".to_string(), format::GAP.to_string(), "50%".to_string()]);

        let json: serde_json::Value =
            serde_json::from_str(&histogram_figure(&snapshot.hist).to_json()).unwrap();
        assert_eq!(json["data"][0]["y"], serde_json::json!([0.5, null, 0.5]));
    }

    #[test]
    fn test_delta_figure_threshold_lines() {
        let rows = vec![delta("female", Some(0.1), Some(0.0), Some(0.2))];
        let with = delta_figure(&[delta_series("gender", 0, &rows)], Some(0.3));
        let without = delta_figure(&[delta_series("gender", 0, &rows)], None);
        let shapes = |p: &Plot| {
            let json: serde_json::Value = serde_json::from_str(&p.to_json()).unwrap();
            json["layout"]["shapes"].as_array().map(|a| a.len()).unwrap_or(0)
        };
        assert_eq!(shapes(&with), 3);
        assert_eq!(shapes(&without), 1);
    }

    #[test]
    fn test_means_figure_keeps_gaps() {
        let means = MeansResponse {
            attribute: "gender".into(),
            rows: vec![
                MeanRow {
                    category: "male".into(),
                    count: Some(10),
                    mean: Some(3.2),
                    sd: Some(1.0),
                },
                MeanRow {
                    category: "female".into(),
                    count: None,
                    mean: None,
                    sd: None,
                },
            ],
        };
        let json: serde_json::Value =
            serde_json::from_str(&means_figure(&means).to_json()).unwrap();
        assert_eq!(json["data"][0]["y"], serde_json::json!([3.2, null]));
    }
}
