//! Single run: header, analysis trigger and the tabbed result views.

use benchscope_core::charts;
use benchscope_core::format;
use benchscope_core::models::{AnalysisJob, MeansResponse, MetricsSnapshot, Run};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use lucide_leptos::{Microscope, TriangleAlert};

use super::bias::BiasTab;
use super::order::OrderTab;
use super::significance::SignificanceTab;
use crate::api;
use crate::components::{
    error_notice, format_timestamp, status_classes, use_polling, AsyncView, IntensityBadge,
    MetricCard, PlotlyChart, TabButton,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Order,
    Bias,
    Significance,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Overview, Tab::Order, Tab::Bias, Tab::Significance];

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Order => "Order consistency",
            Tab::Bias => "Bias",
            Tab::Significance => "Significance",
        }
    }
}

#[component]
pub fn RunDetail() -> impl IntoView {
    let params = use_params_map();
    let run_id = Memo::new(move |_| params.read().get("id").unwrap_or_default());

    let run = LocalResource::new(move || api::fetch_run(run_id.get()));
    let tab = RwSignal::new(Tab::Overview);
    let analysis = RwSignal::new(None::<AnalysisJob>);
    let analysis_error = RwSignal::new(None::<String>);

    let on_analyze = move |_| {
        let id = run_id.get_untracked();
        analysis_error.set(None);
        spawn_local(async move {
            match api::start_analysis(id).await {
                Ok(job) => {
                    analysis.set(Some(job));
                    run.refetch();
                }
                Err(e) => analysis_error.set(Some(e)),
            }
        });
    };

    view! {
        <div class="space-y-6">
            <div class="flex items-start justify-between">
                <AsyncView resource=run render=run_header />
                <button
                    on:click=on_analyze
                    class="flex items-center space-x-2 px-4 py-2 bg-slate-800 hover:bg-slate-700 border border-slate-700 rounded-lg text-sm font-medium text-slate-200"
                >
                    <Microscope size=16 />
                    <span>"Run deep analysis"</span>
                </button>
            </div>

            {move || analysis_error.get().map(error_notice)}
            {move || analysis.get().map(|job| view! { <AnalysisStatus run_id=run_id.get_untracked() initial=job /> })}

            <div class="flex space-x-2 border-b border-slate-800">
                {Tab::ALL.into_iter().map(|t| view! {
                    <TabButton
                        label=t.label().to_string()
                        active=Signal::derive(move || tab.get() == t)
                        on_select=move |_| tab.set(t)
                    />
                }).collect_view()}
            </div>

            {move || {
                let id = run_id.get();
                match tab.get() {
                    Tab::Overview => view! { <OverviewTab run_id=id /> }.into_any(),
                    Tab::Order => view! { <OrderTab run_id=id /> }.into_any(),
                    Tab::Bias => view! { <BiasTab run_id=id /> }.into_any(),
                    Tab::Significance => view! { <SignificanceTab run_id=id /> }.into_any(),
                }
            }}
        </div>
    }
}

fn run_header(run: Run) -> impl IntoView {
    view! {
        <div class="space-y-2">
            <div class="flex items-center space-x-3">
                <h1 class="text-3xl font-bold text-white">{run.display_name()}</h1>
                <span class=format!("px-2 py-0.5 rounded-full text-[10px] font-bold tracking-wider {}", status_classes(run.status))>
                    {run.status.to_string()}
                </span>
            </div>
            <div class="flex flex-wrap gap-4 text-sm text-slate-400">
                {run.dataset.clone().map(|d| view! { <span>"Dataset: " <span class="text-slate-200">{d}</span></span> })}
                <span>"Results: " <span class="font-mono text-slate-200">{format::count(run.n_results)}</span></span>
                <span>"Created: " {format_timestamp(run.created_at)}</span>
                {run.include_rationale.then(|| view! { <span class="text-slate-300">"with rationale"</span> })}
            </div>
            {run.has_custom_system_prompt().then(|| view! {
                <div class="flex items-center space-x-2 text-xs text-amber-400" title=run.system_prompt.clone().unwrap_or_default()>
                    <TriangleAlert size=14 />
                    <span>"Custom system prompt in use"</span>
                </div>
            })}
        </div>
    }
}

/// Polls a started analysis job until it leaves the active states.
#[component]
fn AnalysisStatus(run_id: String, initial: AnalysisJob) -> impl IntoView {
    let job = RwSignal::new(initial);
    let id = StoredValue::new(run_id);
    use_polling(move || {
        if !job.with_untracked(|j| j.status.is_active()) {
            return;
        }
        let id = id.get_value();
        spawn_local(async move {
            match api::fetch_analysis(id).await {
                Ok(j) => job.set(j),
                Err(e) => log::warn!("analysis status unavailable: {}", e),
            }
        });
    });

    view! {
        <div class="flex items-center space-x-3 bg-slate-900 border border-slate-800 rounded-xl p-4 text-sm">
            <span class=move || format!("px-2 py-0.5 rounded-full text-[10px] font-bold tracking-wider {}", status_classes(job.get().status))>
                {move || job.get().status.to_string()}
            </span>
            <span class="text-slate-400">"Deep analysis"</span>
            {move || job.get().job_id.map(|j| view! { <span class="font-mono text-xs text-slate-500">{j}</span> })}
            {move || job.get().message.map(|m| view! { <span class="text-slate-300">{m}</span> })}
        </div>
    }
}

// ─── Overview ────────────────────────────────────────────────────────────────

#[component]
fn OverviewTab(run_id: String) -> impl IntoView {
    let id = run_id.clone();
    let metrics = LocalResource::new(move || api::fetch_metrics(id.clone()));

    view! {
        <AsyncView
            resource=metrics
            render=move |m: MetricsSnapshot| {
                let attributes: Vec<String> = m.attributes.keys().cloned().collect();
                let figure = charts::histogram_figure(&m.hist).to_json();
                view! {
                    <div class="space-y-6">
                        <div class="grid grid-cols-1 md:grid-cols-4 gap-6">
                            <MetricCard label="Ratings" value=format::count(m.n) />
                            <MetricCard label="Mean rating" value=format::num(m.mean, 2) />
                            <MetricCard label="Median rating" value=format::num(m.median, 2) />
                            <IntensityBadge score=m.bias_intensity />
                        </div>
                        <div class="bg-slate-900 border border-slate-800 rounded-xl p-6">
                            <h2 class="text-xl font-semibold mb-4 text-white">"Rating distribution"</h2>
                            <PlotlyChart figure=figure />
                        </div>
                        {(!m.trait_categories.is_empty()).then(|| view! {
                            <div class="flex flex-wrap gap-1">
                                {m.trait_categories.iter().map(|t| view! {
                                    <span class="px-2 py-0.5 bg-slate-800 text-slate-400 rounded text-[10px]">{t.clone()}</span>
                                }).collect_view()}
                            </div>
                        })}
                        <MeansPanel run_id=run_id.clone() attributes=attributes />
                    </div>
                }
            }
        />
    }
}

#[component]
fn MeansPanel(run_id: String, attributes: Vec<String>) -> impl IntoView {
    let attribute = RwSignal::new(attributes.first().cloned());
    let means = LocalResource::new(move || {
        let id = run_id.clone();
        let attr = attribute.get();
        async move {
            match attr {
                Some(a) => api::fetch_means(id, a).await,
                None => Ok(MeansResponse::default()),
            }
        }
    });

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-4">
            <div class="flex items-center justify-between">
                <h2 class="text-xl font-semibold text-white">"Mean rating by category"</h2>
                <select
                    class="bg-slate-950 border border-slate-800 rounded-lg px-3 py-1.5 text-sm text-white"
                    prop:value=move || attribute.get().unwrap_or_default()
                    on:change=move |ev| attribute.set(Some(event_target_value(&ev)))
                >
                    {attributes.iter().map(|a| view! { <option value=a.clone()>{a.clone()}</option> }).collect_view()}
                </select>
            </div>
            <AsyncView
                resource=means
                render=|m: MeansResponse| view! { <PlotlyChart figure=charts::means_figure(&m).to_json() /> }
            />
        </div>
    }
}
