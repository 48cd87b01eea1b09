//! Runs list with live progress and compare selection.

use benchscope_core::models::{Run, RunProgress};
use benchscope_core::query::QueryKey;
use benchscope_core::RunStatus;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use lucide_leptos::{ChevronRight, GitCompare, Play, RotateCcw};

use crate::api;
use crate::components::{error_notice, format_timestamp, status_classes, use_polling, AsyncView};

#[component]
pub fn RunsPage() -> impl IntoView {
    let runs = LocalResource::new(api::fetch_runs);
    use_polling(move || {
        api::invalidate(&QueryKey::runs());
        runs.refetch();
    });

    let selected = RwSignal::new(Vec::<String>::new());
    let action_error = RwSignal::new(None::<String>);

    let compare_href = move || format!("/compare?ids={}", selected.get().join(","));

    view! {
        <div class="space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-3xl font-bold text-white">"Runs"</h1>
                {move || (selected.with(|s| s.len()) >= 2).then(|| view! {
                    <A href=compare_href attr:class="flex items-center space-x-2 px-4 py-2 bg-blue-600 hover:bg-blue-500 rounded-lg text-sm font-medium text-white">
                        <GitCompare size=16 />
                        <span>{move || format!("Compare {} runs", selected.with(|s| s.len()))}</span>
                    </A>
                })}
            </div>

            {move || action_error.get().map(error_notice)}

            <AsyncView
                resource=runs
                render=move |list: Vec<Run>| runs_table(list, selected, action_error, runs)
            />
        </div>
    }
}

fn runs_table(
    list: Vec<Run>,
    selected: RwSignal<Vec<String>>,
    action_error: RwSignal<Option<String>>,
    runs: LocalResource<Result<Vec<Run>, String>>,
) -> impl IntoView {
    let toggle = move |id: String| {
        selected.update(|s| {
            if let Some(pos) = s.iter().position(|x| *x == id) {
                s.remove(pos);
            } else {
                s.push(id);
            }
        })
    };

    let launch = move |id: String, resume: bool| {
        action_error.set(None);
        spawn_local(async move {
            match api::start_run(id, resume).await {
                Ok(()) => runs.refetch(),
                Err(e) => action_error.set(Some(e)),
            }
        });
    };

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl overflow-hidden">
            <table class="w-full text-left border-collapse">
                <thead>
                    <tr class="bg-slate-800/50">
                        <th class="px-4 py-4"></th>
                        <th class="px-6 py-4 font-semibold text-slate-300">"Run"</th>
                        <th class="px-6 py-4 font-semibold text-slate-300">"Dataset"</th>
                        <th class="px-6 py-4 font-semibold text-slate-300">"Results"</th>
                        <th class="px-6 py-4 font-semibold text-slate-300">"Created"</th>
                        <th class="px-6 py-4 font-semibold text-slate-300">"Status"</th>
                        <th class="px-6 py-4"></th>
                    </tr>
                </thead>
                <tbody class="divide-y divide-slate-800">
                    {list.into_iter().map(|run| {
                        let id = run.id.clone();
                        let id_toggle = run.id.clone();
                        let id_checked = run.id.clone();
                        let id_start = run.id.clone();
                        let active = run.status.is_active();
                        let finished = matches!(run.status, RunStatus::Done | RunStatus::Failed);
                        view! {
                            <tr class="hover:bg-slate-800/30 transition-colors">
                                <td class="px-4 py-4">
                                    <input
                                        type="checkbox"
                                        class="accent-blue-500"
                                        prop:checked=move || selected.with(|s| s.contains(&id_checked))
                                        on:change=move |_| toggle(id_toggle.clone())
                                    />
                                </td>
                                <td class="px-6 py-4 font-medium">
                                    <A href=format!("/runs/{}", id) attr:class="text-blue-400 hover:underline">{run.display_name()}</A>
                                    {run.has_custom_system_prompt().then(|| view! {
                                        <span class="ml-2 px-2 py-0.5 bg-slate-800 text-slate-400 rounded text-[10px]">"custom prompt"</span>
                                    })}
                                </td>
                                <td class="px-6 py-4 text-slate-400 text-sm">{run.dataset.clone().unwrap_or_default()}</td>
                                <td class="px-6 py-4 text-slate-300 text-sm font-mono">{benchscope_core::format::count(run.n_results)}</td>
                                <td class="px-6 py-4 text-slate-500 text-sm">{format_timestamp(run.created_at)}</td>
                                <td class="px-6 py-4">
                                    <div class="space-y-2">
                                        <span class=format!("px-2 py-0.5 rounded-full text-[10px] font-bold tracking-wider {}", status_classes(run.status))>
                                            {run.status.to_string()}
                                        </span>
                                        {active.then(|| view! { <ProgressBar run_id=id.clone() /> })}
                                    </div>
                                </td>
                                <td class="px-6 py-4">
                                    <div class="flex items-center justify-end space-x-2 text-slate-500">
                                        {(!active).then(|| {
                                            let id_run = id_start.clone();
                                            let id_resume = id_start.clone();
                                            view! {
                                                <button title="Start" class="p-1 hover:text-green-400" on:click=move |_| launch(id_run.clone(), false)>
                                                    <Play size=16 />
                                                </button>
                                                {(!finished).then(|| view! {
                                                    <button title="Resume" class="p-1 hover:text-blue-400" on:click=move |_| launch(id_resume.clone(), true)>
                                                        <RotateCcw size=16 />
                                                    </button>
                                                })}
                                            }
                                        })}
                                        <A href=format!("/runs/{}", id) attr:class="p-1 hover:text-blue-400">
                                            <ChevronRight size=18 />
                                        </A>
                                    </div>
                                </td>
                            </tr>
                        }
                    }).collect_view()}
                </tbody>
            </table>
        </div>
    }
}

/// Polled completion bar for a run in progress.
#[component]
fn ProgressBar(run_id: String) -> impl IntoView {
    let key = QueryKey::progress(&run_id);
    let progress = LocalResource::new(move || api::fetch_progress(run_id.clone()));
    use_polling(move || {
        api::invalidate(&key);
        progress.refetch();
    });

    view! {
        <Transition fallback=|| ()>
            {move || Suspend::new(async move {
                match progress.await {
                    Ok(p) => progress_view(p).into_any(),
                    Err(e) => view! { <p class="text-[10px] text-red-400 font-mono">{e}</p> }.into_any(),
                }
            })}
        </Transition>
    }
}

fn progress_view(p: RunProgress) -> impl IntoView {
    let percent = p.fraction().map(|f| (f * 100.0).clamp(0.0, 100.0)).unwrap_or(0.0);
    view! {
        <div class="w-32 space-y-1">
            <div class="h-1.5 bg-slate-800 rounded-full overflow-hidden">
                <div class="h-full bg-green-500 transition-all" style=format!("width: {:.0}%", percent)></div>
            </div>
            <p class="text-[10px] text-slate-500 font-mono">{format!("{} / {}", p.done, p.total)}</p>
        </div>
    }
}
