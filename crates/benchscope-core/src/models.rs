//! Data models for benchscope.
//!
//! Everything here is a read-only projection of results computed by the
//! statistics backend. Numeric fields are optional throughout: a value may be
//! pending or not applicable, and consumers render absence as a gap.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a benchmark run as reported by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Done,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Pending | RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "PENDING"),
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Done => write!(f, "DONE"),
            RunStatus::Failed => write!(f, "FAILED"),
            RunStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A benchmark run. The list endpoint fills a subset of these fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub n_results: Option<u64>,
    #[serde(default)]
    pub include_rationale: bool,
    /// Custom system prompt, if the run used one.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: RunStatus,
}

impl Run {
    pub fn has_custom_system_prompt(&self) -> bool {
        self.system_prompt
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }

    pub fn display_name(&self) -> String {
        match &self.model {
            Some(model) => format!("#{} · {}", self.id, model),
            None => format!("#{}", self.id),
        }
    }
}

/// Rating histogram. `bins`, `shares` and `counts` are parallel arrays;
/// any element may be null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Histogram {
    #[serde(default)]
    pub bins: Vec<Option<f64>>,
    #[serde(default)]
    pub shares: Vec<Option<f64>>,
    #[serde(default)]
    pub counts: Vec<Option<u64>>,
}

/// Categories of one demographic attribute plus its default baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AttributeMeta {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub baseline: Option<String>,
}

/// Per-run metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsSnapshot {
    #[serde(default)]
    pub n: Option<u64>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub median: Option<f64>,
    #[serde(default)]
    pub hist: Histogram,
    /// Ordered by attribute name so default selection is deterministic.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeMeta>,
    #[serde(default)]
    pub trait_categories: Vec<String>,
    /// Aggregate bias intensity on a 0–100 scale.
    #[serde(default)]
    pub bias_intensity: Option<f64>,
}

/// One category compared against the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeltaRow {
    pub category: String,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub ci_low: Option<f64>,
    #[serde(default)]
    pub ci_high: Option<f64>,
    #[serde(default)]
    pub p_value: Option<f64>,
    /// FDR-corrected p-value.
    #[serde(default)]
    pub q_value: Option<f64>,
    #[serde(default)]
    pub cliffs_delta: Option<f64>,
    #[serde(default)]
    pub significant: Option<bool>,
    #[serde(default)]
    pub n_base: Option<u64>,
    #[serde(default)]
    pub n_category: Option<u64>,
    #[serde(default)]
    pub sd_base: Option<f64>,
    #[serde(default)]
    pub sd_category: Option<f64>,
    #[serde(default)]
    pub mean_base: Option<f64>,
    #[serde(default)]
    pub mean_category: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeltaResponse {
    pub attribute: String,
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default)]
    pub rows: Vec<DeltaRow>,
}

/// Per-case (or per-trait) effect for one target category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForestRow {
    pub case_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub ci_low: Option<f64>,
    #[serde(default)]
    pub ci_high: Option<f64>,
    #[serde(default)]
    pub se: Option<f64>,
}

impl ForestRow {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.case_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForestOverall {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub ci_low: Option<f64>,
    #[serde(default)]
    pub ci_high: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForestResponse {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub rows: Vec<ForestRow>,
    #[serde(default)]
    pub overall: Option<ForestOverall>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderBias {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub ci_low: Option<f64>,
    #[serde(default)]
    pub ci_high: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TestRetest {
    #[serde(default)]
    pub within1_rate: Option<f64>,
    #[serde(default)]
    pub mean_abs_diff: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Correlations {
    #[serde(default)]
    pub spearman: Option<f64>,
    #[serde(default)]
    pub pearson: Option<f64>,
    #[serde(default)]
    pub kendall: Option<f64>,
}

/// Response-scale usage indices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScaleUsage {
    /// Extreme-endpoint index.
    #[serde(default)]
    pub eei: Option<f64>,
    /// Mid-point index.
    #[serde(default)]
    pub mni: Option<f64>,
    /// Spread/variance index.
    #[serde(default)]
    pub sv: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderCaseRow {
    pub case_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub n_pairs: Option<u64>,
    #[serde(default, alias = "rma")]
    pub exact_match_rate: Option<f64>,
    #[serde(default)]
    pub mae: Option<f64>,
}

/// Order-consistency breakdown for one trait category.
///
/// `rma_deviation` is a signed deviation-from-expectation score and is not
/// the same statistic as the run-level exact-match rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TraitCategoryOrderRow {
    pub trait_category: String,
    #[serde(default)]
    pub n_pairs: Option<u64>,
    #[serde(default)]
    pub rma_deviation: Option<f64>,
    #[serde(default)]
    pub mae: Option<f64>,
    #[serde(default)]
    pub cliffs_delta: Option<f64>,
}

/// Order-consistency (test-retest) summary for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderMetrics {
    #[serde(default)]
    pub n_pairs: Option<u64>,
    /// Exact-match rate between original and reversed-order responses.
    #[serde(default, alias = "rma")]
    pub exact_match_rate: Option<f64>,
    #[serde(default)]
    pub mae: Option<f64>,
    #[serde(default)]
    pub cliffs_delta: Option<f64>,
    #[serde(default)]
    pub order_bias: OrderBias,
    #[serde(default)]
    pub test_retest: TestRetest,
    #[serde(default)]
    pub correlation: Correlations,
    #[serde(default)]
    pub scale_usage: ScaleUsage,
    #[serde(default)]
    pub per_case: Vec<OrderCaseRow>,
    #[serde(default)]
    pub by_trait_category: Vec<TraitCategoryOrderRow>,
}

/// One Kruskal-Wallis omnibus result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KruskalRow {
    pub attribute: String,
    #[serde(default)]
    pub h: Option<f64>,
    #[serde(default)]
    pub p_value: Option<f64>,
    #[serde(default)]
    pub eta_squared: Option<f64>,
    #[serde(default)]
    pub groups: Option<u64>,
    #[serde(default)]
    pub n: Option<u64>,
    #[serde(default)]
    pub significant: Option<bool>,
    #[serde(default)]
    pub effect_size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KruskalResponse {
    #[serde(default)]
    pub overall: Vec<KruskalRow>,
    #[serde(default)]
    pub by_category: BTreeMap<String, Vec<KruskalRow>>,
}

impl KruskalResponse {
    /// Rows for a category tab; `None` selects the omnibus set.
    pub fn rows_for(&self, category: Option<&str>) -> &[KruskalRow] {
        match category {
            Some(c) => self.by_category.get(c).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.overall,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MeanRow {
    pub category: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub sd: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MeansResponse {
    pub attribute: String,
    #[serde(default)]
    pub rows: Vec<MeanRow>,
}

/// Progress of a (re)started benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RunProgress {
    #[serde(default)]
    pub done: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub status: RunStatus,
}

impl RunProgress {
    pub fn fraction(&self) -> Option<f64> {
        (self.total > 0).then(|| self.done as f64 / self.total as f64)
    }
}

/// Deeper asynchronous analysis job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisJob {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Settings the dashboard server hands to the frontend at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardInfo {
    pub version: String,
    pub stale_time_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for DashboardInfo {
    fn default() -> Self {
        Self {
            version: String::new(),
            stale_time_secs: 300,
            poll_interval_secs: 5,
        }
    }
}
