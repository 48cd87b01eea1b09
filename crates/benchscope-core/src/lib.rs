//! benchscope-core: data model and client-side derivations for benchscope.
//!
//! Everything here except [`client`] is plain computation over backend
//! payloads and compiles for both native targets and `wasm32`, so the
//! dashboard frontend and the CLI grade, format, chart and export results
//! with the same code.

pub mod charts;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod grading;
pub mod intensity;
pub mod models;
pub mod query;
pub mod selection;
pub mod table;
pub mod theme;
pub mod threshold;

#[cfg(not(target_arch = "wasm32"))]
pub mod client;

#[cfg(not(target_arch = "wasm32"))]
pub use client::ApiClient;
pub use config::DashConfig;
pub use error::{DashError, Result};
pub use export::ExportFormat;
pub use grading::{grade, EffectSize, Grade, MetricKind};
pub use intensity::IntensityBand;
pub use models::{
    DeltaResponse, DeltaRow, ForestResponse, KruskalResponse, MetricsSnapshot, OrderMetrics, Run,
    RunStatus,
};
pub use query::{LoadState, QueryCache, QueryKey};
pub use selection::Selection;
