//! Side-by-side summary of several runs.

use benchscope_core::charts;
use benchscope_core::format;
use benchscope_core::intensity::IntensityBand;
use benchscope_core::models::{MetricsSnapshot, Run};
use futures_util::future::join_all;
use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_query_map;

use crate::api;
use crate::components::{empty_notice, AsyncView, PlotlyChart};

async fn load_run(id: String) -> Result<(Run, MetricsSnapshot), String> {
    let run = api::fetch_run(id.clone()).await?;
    let metrics = api::fetch_metrics(id).await?;
    Ok((run, metrics))
}

#[component]
pub fn ComparePage() -> impl IntoView {
    let query = use_query_map();
    let ids = Memo::new(move |_| {
        query
            .read()
            .get("ids")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    });

    let runs = LocalResource::new(move || {
        let ids = ids.get();
        async move {
            join_all(ids.into_iter().map(load_run))
                .await
                .into_iter()
                .collect::<Result<Vec<_>, String>>()
        }
    });

    view! {
        <div class="space-y-6">
            <h1 class="text-3xl font-bold text-white">"Compare runs"</h1>
            {move || if ids.with(|i| i.is_empty()) {
                empty_notice()
            } else {
                view! { <AsyncView resource=runs render=compare_view /> }.into_any()
            }}
        </div>
    }
}

fn compare_view(runs: Vec<(Run, MetricsSnapshot)>) -> impl IntoView {
    let overlay: Vec<(String, _)> = runs
        .iter()
        .map(|(run, m)| (run.display_name(), m.hist.clone()))
        .collect();
    let figure = charts::histogram_overlay_figure(&overlay).to_json();

    view! {
        <div class="space-y-6">
            <div class="bg-slate-900 border border-slate-800 rounded-xl overflow-hidden">
                <table class="w-full text-left border-collapse">
                    <thead>
                        <tr class="bg-slate-800/50">
                            <th class="px-6 py-4 font-semibold text-slate-300">"Run"</th>
                            <th class="px-6 py-4 font-semibold text-slate-300">"Dataset"</th>
                            <th class="px-6 py-4 font-semibold text-slate-300 text-right">"Ratings"</th>
                            <th class="px-6 py-4 font-semibold text-slate-300 text-right">"Mean"</th>
                            <th class="px-6 py-4 font-semibold text-slate-300 text-right">"Median"</th>
                            <th class="px-6 py-4 font-semibold text-slate-300">"Bias intensity"</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-slate-800">
                        {runs.into_iter().map(|(run, m)| {
                            let band = format::finite(m.bias_intensity).map(IntensityBand::from_score);
                            view! {
                                <tr class="hover:bg-slate-800/30">
                                    <td class="px-6 py-4 font-medium">
                                        <A href=format!("/runs/{}", run.id) attr:class="text-blue-400 hover:underline">{run.display_name()}</A>
                                    </td>
                                    <td class="px-6 py-4 text-slate-400 text-sm">{run.dataset.clone().unwrap_or_default()}</td>
                                    <td class="px-6 py-4 text-slate-300 text-sm font-mono text-right">{format::count(m.n)}</td>
                                    <td class="px-6 py-4 text-slate-300 text-sm font-mono text-right">{format::num(m.mean, 2)}</td>
                                    <td class="px-6 py-4 text-slate-300 text-sm font-mono text-right">{format::num(m.median, 2)}</td>
                                    <td class="px-6 py-4 text-sm">
                                        <span class="inline-flex items-center space-x-2">
                                            <span class="font-mono text-slate-300">{format::num(m.bias_intensity, 1)}</span>
                                            {band.map(|b| view! {
                                                <span class="px-2 py-0.5 rounded-full text-xs font-semibold text-slate-950" style=format!("background-color: {}", b.color())>
                                                    {b.label()}
                                                </span>
                                            })}
                                        </span>
                                    </td>
                                </tr>
                            }
                        }).collect_view()}
                    </tbody>
                </table>
            </div>
            <div class="bg-slate-900 border border-slate-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4 text-white">"Rating distributions"</h2>
                <PlotlyChart figure=figure />
            </div>
        </div>
    }
}
