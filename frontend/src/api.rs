//! Fetch helpers with a shared query cache.
//!
//! Responses are kept as raw JSON text keyed by [`QueryKey`]. Concurrent
//! requests for the same key share one in-flight future.

use std::cell::RefCell;
use std::collections::HashMap;

use benchscope_core::models::{
    AnalysisJob, DashboardInfo, DeltaResponse, ForestResponse, KruskalResponse, MeansResponse,
    MetricsSnapshot, OrderMetrics, Run, RunProgress,
};
use benchscope_core::query::{CachePolicy, QueryCache, QueryKey};
use benchscope_core::error::error_message;
use benchscope_core::ExportFormat;
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use serde::de::DeserializeOwned;

type InFlight = Shared<LocalBoxFuture<'static, Result<String, String>>>;

thread_local! {
    static CACHE: RefCell<QueryCache<String>> = RefCell::new(QueryCache::default());
    static IN_FLIGHT: RefCell<HashMap<QueryKey, InFlight>> = RefCell::new(HashMap::new());
}

/// Replaces the cache policy with the one the server reports.
pub fn set_policy(policy: CachePolicy) {
    CACHE.with(|c| c.borrow_mut().set_policy(policy));
}

pub fn policy() -> CachePolicy {
    CACHE.with(|c| c.borrow().policy())
}

/// Drops one cached entry so the next read goes to the network.
pub fn invalidate(key: &QueryKey) {
    CACHE.with(|c| c.borrow_mut().invalidate(key));
}

pub fn invalidate_run(run_id: &str) {
    CACHE.with(|c| {
        let mut cache = c.borrow_mut();
        let run = QueryKey::run(run_id);
        cache.invalidate(&QueryKey::runs());
        cache.invalidate_prefix(&format!("{}/", run));
        cache.invalidate(&run);
    });
}

async fn send_get(url: String) -> Result<String, String> {
    log::debug!("GET {}", url);
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = resp.status();
    let text = resp.text().await.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(error_text(status, &text));
    }
    Ok(text)
}

fn error_text(status: u16, body: &str) -> String {
    format!("HTTP {}: {}", status, error_message(body, "request failed"))
}

/// Cached GET returning the raw body.
pub async fn get_text(key: QueryKey) -> Result<String, String> {
    let now = chrono::Utc::now();
    if let Some(hit) = CACHE.with(|c| c.borrow().get_fresh(&key, now)) {
        return Ok(hit);
    }

    let pending = IN_FLIGHT.with(|f| {
        f.borrow_mut()
            .entry(key.clone())
            .or_insert_with(|| send_get(key.api_path()).boxed_local().shared())
            .clone()
    });
    let result = pending.await;

    IN_FLIGHT.with(|f| f.borrow_mut().remove(&key));
    if let Ok(body) = &result {
        CACHE.with(|c| c.borrow_mut().insert(key, body.clone(), chrono::Utc::now()));
    }
    result
}

async fn get_json<T: DeserializeOwned>(key: QueryKey) -> Result<T, String> {
    let text = get_text(key).await?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

async fn post(key: QueryKey) -> Result<String, String> {
    let url = key.api_path();
    log::debug!("POST {}", url);
    let resp = gloo_net::http::Request::post(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    let text = resp.text().await.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(error_text(status, &text));
    }
    Ok(text)
}

pub async fn fetch_dashboard_info() -> Result<DashboardInfo, String> {
    let resp = gloo_net::http::Request::get("/_dashboard/config")
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(format!("Error fetching dashboard config: {}", resp.status()));
    }
    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

pub async fn fetch_runs() -> Result<Vec<Run>, String> {
    get_json(QueryKey::runs()).await
}

pub async fn fetch_run(run_id: String) -> Result<Run, String> {
    get_json(QueryKey::run(&run_id)).await
}

pub async fn fetch_metrics(run_id: String) -> Result<MetricsSnapshot, String> {
    get_json(QueryKey::metrics(&run_id)).await
}

pub async fn fetch_deltas(
    run_id: String,
    attribute: String,
    baseline: Option<String>,
    trait_category: Option<String>,
) -> Result<DeltaResponse, String> {
    get_json(QueryKey::deltas(
        &run_id,
        &attribute,
        baseline.as_deref(),
        trait_category.as_deref(),
    ))
    .await
}

pub async fn fetch_forest(
    run_id: String,
    attribute: String,
    baseline: String,
    target: String,
) -> Result<ForestResponse, String> {
    get_json(QueryKey::forest(&run_id, &attribute, &baseline, &target)).await
}

pub async fn fetch_order_metrics(run_id: String) -> Result<OrderMetrics, String> {
    get_json(QueryKey::order_metrics(&run_id)).await
}

pub async fn fetch_means(run_id: String, attribute: String) -> Result<MeansResponse, String> {
    get_json(QueryKey::means(&run_id, &attribute)).await
}

pub async fn fetch_kruskal(run_id: String) -> Result<KruskalResponse, String> {
    get_json(QueryKey::kruskal(&run_id)).await
}

pub async fn fetch_kruskal_export(run_id: String, format: ExportFormat) -> Result<String, String> {
    get_text(QueryKey::kruskal_export(&run_id, format.as_str())).await
}

pub async fn fetch_progress(run_id: String) -> Result<RunProgress, String> {
    get_json(QueryKey::progress(&run_id)).await
}

pub async fn start_run(run_id: String, resume: bool) -> Result<(), String> {
    let key = if resume {
        QueryKey::resume(&run_id)
    } else {
        QueryKey::start(&run_id)
    };
    post(key).await?;
    invalidate_run(&run_id);
    Ok(())
}

pub async fn start_analysis(run_id: String) -> Result<AnalysisJob, String> {
    let text = post(QueryKey::analysis(&run_id)).await?;
    invalidate_run(&run_id);
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

pub async fn fetch_analysis(run_id: String) -> Result<AnalysisJob, String> {
    let key = QueryKey::analysis(&run_id);
    invalidate(&key);
    get_json(key).await
}
