//! Per-query load state and the keyed read-through cache.
//!
//! Every logical query (metrics, deltas, forest rows, ...) is identified by a
//! [`QueryKey`]. Results are cached for a freshness window; list-type queries
//! additionally poll on a short interval.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{
    DashboardInfo, DeltaResponse, ForestResponse, KruskalResponse, MeansResponse, MetricsSnapshot, OrderMetrics,
    Run, RunProgress,
};

// ─── Load state ──────────────────────────────────────────────────────────────

/// Whether a successfully fetched payload actually carries data.
pub trait Availability {
    fn is_available(&self) -> bool;
}

/// A batch has data when at least one of its members does.
impl<T: Availability> Availability for Vec<T> {
    fn is_available(&self) -> bool {
        self.iter().any(Availability::is_available)
    }
}

/// Labelled payload, e.g. one forest response per target category.
impl<K, T: Availability> Availability for (K, T) {
    fn is_available(&self) -> bool {
        self.1.is_available()
    }
}

impl Availability for Run {
    fn is_available(&self) -> bool {
        true
    }
}

impl Availability for DashboardInfo {
    fn is_available(&self) -> bool {
        true
    }
}

impl Availability for RunProgress {
    fn is_available(&self) -> bool {
        true
    }
}

impl Availability for MetricsSnapshot {
    fn is_available(&self) -> bool {
        self.n.is_some_and(|n| n > 0) || !self.hist.bins.is_empty()
    }
}

impl Availability for DeltaResponse {
    fn is_available(&self) -> bool {
        !self.rows.is_empty()
    }
}

impl Availability for ForestResponse {
    fn is_available(&self) -> bool {
        !self.rows.is_empty() || self.overall.as_ref().is_some_and(|o| o.mean.is_some())
    }
}

impl Availability for OrderMetrics {
    fn is_available(&self) -> bool {
        self.n_pairs.is_some_and(|n| n > 0)
            || self.exact_match_rate.is_some()
            || self.mae.is_some()
            || !self.per_case.is_empty()
    }
}

impl Availability for KruskalResponse {
    fn is_available(&self) -> bool {
        !self.overall.is_empty() || self.by_category.values().any(|rows| !rows.is_empty())
    }
}

impl Availability for MeansResponse {
    fn is_available(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// What a fetch-scoped region shows. Exactly one variant renders.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    /// Upstream error message, shown verbatim.
    Failed(String),
    /// Fetched fine but nothing has been computed yet.
    Empty,
    Ready(T),
}

impl<T: Availability> LoadState<T> {
    /// `None` means the fetch is still in flight.
    pub fn resolve<E: std::fmt::Display>(result: Option<Result<T, E>>) -> Self {
        match result {
            None => LoadState::Loading,
            Some(Err(e)) => LoadState::Failed(e.to_string()),
            Some(Ok(v)) if !v.is_available() => LoadState::Empty,
            Some(Ok(v)) => LoadState::Ready(v),
        }
    }
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            LoadState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

// ─── Query keys ──────────────────────────────────────────────────────────────

/// Percent-encodes a query-string or path component (RFC 3986 unreserved set kept).
pub fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Cache key and request target of one logical query.
///
/// The key is the API path relative to `/api` plus the query string; two
/// keys are equal exactly when they would issue the same request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    fn build(path: String, params: &[(&str, Option<&str>)]) -> Self {
        let query: Vec<String> = params
            .iter()
            .filter_map(|(k, v)| v.map(|v| format!("{}={}", k, encode_component(v))))
            .collect();
        if query.is_empty() {
            QueryKey(path)
        } else {
            QueryKey(format!("{}?{}", path, query.join("&")))
        }
    }

    fn run_path(run_id: &str, tail: &str) -> String {
        format!("/runs/{}{}", encode_component(run_id), tail)
    }

    pub fn runs() -> Self {
        QueryKey("/runs".to_string())
    }

    pub fn run(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, ""))
    }

    pub fn metrics(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/metrics"))
    }

    pub fn deltas(run_id: &str, attribute: &str, baseline: Option<&str>, trait_category: Option<&str>) -> Self {
        Self::build(
            Self::run_path(run_id, "/deltas"),
            &[
                ("attribute", Some(attribute)),
                ("baseline", baseline),
                ("trait_category", trait_category),
            ],
        )
    }

    pub fn forest(run_id: &str, attribute: &str, baseline: &str, target: &str) -> Self {
        Self::build(
            Self::run_path(run_id, "/forest"),
            &[
                ("attribute", Some(attribute)),
                ("baseline", Some(baseline)),
                ("target", Some(target)),
            ],
        )
    }

    pub fn order_metrics(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/order-metrics"))
    }

    pub fn means(run_id: &str, attribute: &str) -> Self {
        Self::build(Self::run_path(run_id, "/means"), &[("attribute", Some(attribute))])
    }

    pub fn kruskal(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/kruskal"))
    }

    pub fn kruskal_export(run_id: &str, format: &str) -> Self {
        Self::build(Self::run_path(run_id, "/kruskal/export"), &[("format", Some(format))])
    }

    pub fn progress(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/progress"))
    }

    pub fn start(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/start"))
    }

    pub fn resume(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/resume"))
    }

    pub fn analysis(run_id: &str) -> Self {
        QueryKey(Self::run_path(run_id, "/analysis"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full request path, e.g. `/api/runs/7/metrics`.
    pub fn api_path(&self) -> String {
        format!("/api{}", self.0)
    }

    /// List-type queries reflect in-progress backend work and are polled.
    pub fn is_list(&self) -> bool {
        self.0 == "/runs" || self.0.ends_with("/progress")
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Freshness policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub poll_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(300),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl CachePolicy {
    /// List queries go stale after one poll interval, everything else after `stale_time`.
    pub fn max_age(&self, key: &QueryKey) -> Duration {
        if key.is_list() {
            self.poll_interval
        } else {
            self.stale_time
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Keyed read-through cache. Time is passed in so callers control the clock.
#[derive(Debug, Clone)]
pub struct QueryCache<V> {
    policy: CachePolicy,
    entries: HashMap<QueryKey, Entry<V>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Entries are kept; their freshness is judged by the new policy.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy;
    }

    /// Fresh value for `key` at `now`, if any.
    pub fn get_fresh(&self, key: &QueryKey, now: DateTime<Utc>) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = now.signed_duration_since(entry.fetched_at).to_std().unwrap_or_default();
        (age < self.policy.max_age(key)).then(|| entry.value.clone())
    }

    pub fn insert(&mut self, key: QueryKey, value: V, now: DateTime<Utc>) {
        self.entries.insert(key, Entry { value, fetched_at: now });
    }

    pub fn invalidate(&mut self, key: &QueryKey) {
        self.entries.remove(key);
    }

    /// Drops every entry whose key starts with `prefix`, e.g. all queries of one run.
    pub fn invalidate_prefix(&mut self, prefix: &str) {
        self.entries.retain(|k, _| !k.as_str().starts_with(prefix));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeltaRow, ForestOverall, Histogram};

    #[test]
    fn test_resolve_distinguishes_empty_from_error() {
        let loading: LoadState<DeltaResponse> = LoadState::resolve::<String>(None);
        assert!(loading.is_loading());

        let failed: LoadState<DeltaResponse> =
            LoadState::resolve(Some(Err("HTTP 500: boom".to_string())));
        assert_eq!(failed, LoadState::Failed("HTTP 500: boom".into()));

        let empty: LoadState<DeltaResponse> =
            LoadState::resolve::<String>(Some(Ok(DeltaResponse::default())));
        assert_eq!(empty, LoadState::Empty);

        let resp = DeltaResponse {
            attribute: "gender".into(),
            baseline: None,
            rows: vec![DeltaRow {
                category: "female".into(),
                ..Default::default()
            }],
        };
        let ready = LoadState::resolve::<String>(Some(Ok(resp.clone())));
        assert_eq!(ready.ready(), Some(resp));
    }

    #[test]
    fn test_forest_batch_without_data_is_empty() {
        let blank = vec![("female".to_string(), ForestResponse::default())];
        let state = LoadState::resolve::<String>(Some(Ok(blank)));
        assert_eq!(state, LoadState::Empty);

        let with_overall = vec![
            ("female".to_string(), ForestResponse::default()),
            (
                "nonbinary".to_string(),
                ForestResponse {
                    overall: Some(ForestOverall {
                        mean: Some(0.1),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ),
        ];
        assert!(LoadState::resolve::<String>(Some(Ok(with_overall))).ready().is_some());

        let none: Vec<(String, ForestResponse)> = Vec::new();
        assert_eq!(LoadState::resolve::<String>(Some(Ok(none))), LoadState::Empty);
    }

    #[test]
    fn test_metrics_availability() {
        assert!(!MetricsSnapshot::default().is_available());
        let m = MetricsSnapshot {
            hist: Histogram {
                bins: vec![Some(1.0)],
                shares: vec![Some(1.0)],
                counts: vec![Some(3)],
            },
            ..Default::default()
        };
        assert!(m.is_available());
    }

    #[test]
    fn test_keys_encode_parameters() {
        assert_eq!(QueryKey::metrics("42").as_str(), "/runs/42/metrics");
        assert_eq!(
            QueryKey::deltas("42", "gender", Some("non binary"), None).as_str(),
            "/runs/42/deltas?attribute=gender&baseline=non%20binary"
        );
        assert_eq!(
            QueryKey::forest("42", "age", "a&b", "c").api_path(),
            "/api/runs/42/forest?attribute=age&baseline=a%26b&target=c"
        );
        assert_ne!(
            QueryKey::deltas("1", "gender", Some("male"), None),
            QueryKey::deltas("1", "gender", Some("female"), None)
        );
        assert!(QueryKey::runs().is_list());
        assert!(QueryKey::progress("3").is_list());
        assert!(!QueryKey::kruskal("3").is_list());
    }

    #[test]
    fn test_cache_freshness_window() {
        let mut cache: QueryCache<String> = QueryCache::default();
        let t0 = Utc::now();
        let key = QueryKey::metrics("1");
        cache.insert(key.clone(), "payload".into(), t0);

        assert_eq!(cache.get_fresh(&key, t0 + chrono::Duration::seconds(60)), Some("payload".into()));
        assert_eq!(cache.get_fresh(&key, t0 + chrono::Duration::seconds(301)), None);
    }

    #[test]
    fn test_list_queries_expire_after_poll_interval() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let t0 = Utc::now();
        cache.insert(QueryKey::runs(), 1, t0);
        assert_eq!(cache.get_fresh(&QueryKey::runs(), t0 + chrono::Duration::seconds(2)), Some(1));
        assert_eq!(cache.get_fresh(&QueryKey::runs(), t0 + chrono::Duration::seconds(6)), None);
    }

    #[test]
    fn test_invalidate_prefix() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let now = Utc::now();
        cache.insert(QueryKey::metrics("1"), 1, now);
        cache.insert(QueryKey::kruskal("1"), 2, now);
        cache.insert(QueryKey::metrics("2"), 3, now);
        cache.invalidate_prefix("/runs/1/");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh(&QueryKey::metrics("2"), now), Some(3));
    }

    #[test]
    fn test_set_policy_keeps_entries() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let t0 = Utc::now();
        cache.insert(QueryKey::kruskal("4"), 9, t0);
        cache.set_policy(CachePolicy {
            stale_time: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
        });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh(&QueryKey::kruskal("4"), t0 + chrono::Duration::seconds(20)), Some(9));
        assert_eq!(cache.get_fresh(&QueryKey::kruskal("4"), t0 + chrono::Duration::seconds(40)), None);
    }
}
