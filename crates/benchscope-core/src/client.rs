//! Native HTTP client for the evaluation backend.
//!
//! GET responses are kept as raw JSON text in a shared [`QueryCache`], so
//! repeated reads of the same query inside one process hit the backend once
//! per freshness window. Concurrent reads of one key share a single request.
//! Mutations invalidate everything cached for the run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::DashConfig;
use crate::error::{error_message, DashError, Result};
use crate::export::ExportFormat;
use crate::models::{
    AnalysisJob, DeltaResponse, ForestResponse, KruskalResponse, MeansResponse, MetricsSnapshot,
    OrderMetrics, Run, RunProgress,
};
use crate::query::{CachePolicy, QueryCache, QueryKey};

type InFlight = Shared<BoxFuture<'static, std::result::Result<String, Arc<DashError>>>>;

pub struct ApiClient {
    base_url: String,
    client: Client,
    cache: Mutex<QueryCache<String>>,
    in_flight: Mutex<HashMap<QueryKey, InFlight>>,
}

/// Rebuilds a shared fetch failure for each waiting caller.
fn detach(e: &DashError) -> DashError {
    match e {
        DashError::Http { status, message } => DashError::Http {
            status: *status,
            message: message.clone(),
        },
        DashError::Network(message) => DashError::Network(message.clone()),
        other => DashError::Other(other.to_string()),
    }
}

impl ApiClient {
    /// `base_url` is the backend root; `/api` is appended per request.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, Duration::from_secs(30), CachePolicy::default())
    }

    pub fn from_config(config: &DashConfig) -> Result<Self> {
        Self::with_options(config.api_base(), config.request_timeout(), config.cache_policy())
    }

    pub fn with_options(base_url: &str, timeout: Duration, policy: CachePolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            cache: Mutex::new(QueryCache::new(policy)),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache<String>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<QueryKey, InFlight>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn url(&self, key: &QueryKey) -> String {
        format!("{}{}", self.base_url, key.api_path())
    }

    async fn check(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }
        Err(DashError::Http {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason().unwrap_or("request failed")),
        })
    }

    async fn fetch(client: Client, url: String) -> Result<String> {
        debug!("GET {}", url);
        let response = client.get(&url).send().await.map_err(|e| {
            warn!("GET {} failed: {}", url, e);
            DashError::from(e)
        })?;
        Self::check(response).await
    }

    /// Raw response text for a GET, served from cache while fresh.
    pub async fn get_text(&self, key: &QueryKey) -> Result<String> {
        let cached = self.cache().get_fresh(key, Utc::now());
        if let Some(hit) = cached {
            debug!("cache hit {}", key);
            return Ok(hit);
        }

        let pending = self
            .in_flight()
            .entry(key.clone())
            .or_insert_with(|| {
                let (client, url) = (self.client.clone(), self.url(key));
                async move { Self::fetch(client, url).await.map_err(Arc::new) }
                    .boxed()
                    .shared()
            })
            .clone();
        let result = pending.clone().await;

        if let Ok(body) = &result {
            self.cache().insert(key.clone(), body.clone(), Utc::now());
        }
        let mut in_flight = self.in_flight();
        if in_flight.get(key).is_some_and(|f| f.ptr_eq(&pending)) {
            in_flight.remove(key);
        }
        drop(in_flight);

        result.map_err(|e| detach(&e))
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<T> {
        let body = self.get_text(key).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post(&self, key: &QueryKey) -> Result<String> {
        let url = self.url(key);
        debug!("POST {}", url);
        let response = self.client.post(&url).send().await.map_err(|e| {
            warn!("POST {} failed: {}", url, e);
            DashError::from(e)
        })?;
        Self::check(response).await
    }

    /// Forgets every cached query of `run_id` plus the run list.
    pub fn invalidate_run(&self, run_id: &str) {
        let mut cache = self.cache();
        let run = QueryKey::run(run_id);
        cache.invalidate(&QueryKey::runs());
        cache.invalidate_prefix(&format!("{}/", run));
        cache.invalidate(&run);
    }

    pub async fn list_runs(&self) -> Result<Vec<Run>> {
        self.get_json(&QueryKey::runs()).await
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Run> {
        self.get_json(&QueryKey::run(run_id)).await
    }

    pub async fn metrics(&self, run_id: &str) -> Result<MetricsSnapshot> {
        self.get_json(&QueryKey::metrics(run_id)).await
    }

    pub async fn deltas(
        &self,
        run_id: &str,
        attribute: &str,
        baseline: Option<&str>,
        trait_category: Option<&str>,
    ) -> Result<DeltaResponse> {
        self.get_json(&QueryKey::deltas(run_id, attribute, baseline, trait_category))
            .await
    }

    pub async fn forest(&self, run_id: &str, attribute: &str, baseline: &str, target: &str) -> Result<ForestResponse> {
        self.get_json(&QueryKey::forest(run_id, attribute, baseline, target)).await
    }

    pub async fn order_metrics(&self, run_id: &str) -> Result<OrderMetrics> {
        self.get_json(&QueryKey::order_metrics(run_id)).await
    }

    pub async fn means(&self, run_id: &str, attribute: &str) -> Result<MeansResponse> {
        self.get_json(&QueryKey::means(run_id, attribute)).await
    }

    pub async fn kruskal(&self, run_id: &str) -> Result<KruskalResponse> {
        self.get_json(&QueryKey::kruskal(run_id)).await
    }

    /// Server-rendered export document, returned verbatim.
    pub async fn kruskal_export(&self, run_id: &str, format: ExportFormat) -> Result<String> {
        self.get_text(&QueryKey::kruskal_export(run_id, format.as_str())).await
    }

    pub async fn progress(&self, run_id: &str) -> Result<RunProgress> {
        self.get_json(&QueryKey::progress(run_id)).await
    }

    pub async fn start_run(&self, run_id: &str) -> Result<()> {
        self.post(&QueryKey::start(run_id)).await?;
        self.invalidate_run(run_id);
        Ok(())
    }

    pub async fn resume_run(&self, run_id: &str) -> Result<()> {
        self.post(&QueryKey::resume(run_id)).await?;
        self.invalidate_run(run_id);
        Ok(())
    }

    pub async fn start_analysis(&self, run_id: &str) -> Result<AnalysisJob> {
        let body = self.post(&QueryKey::analysis(run_id)).await?;
        self.invalidate_run(run_id);
        Ok(serde_json::from_str(&body)?)
    }

    /// Analysis status is never cached.
    pub async fn analysis_status(&self, run_id: &str) -> Result<AnalysisJob> {
        let key = QueryKey::analysis(run_id);
        self.cache().invalidate(&key);
        self.get_json(&key).await
    }
}
