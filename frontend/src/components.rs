//! Shared view building blocks.

use benchscope_core::grading::Grade;
use benchscope_core::RunStatus;
use chrono::{DateTime, Local, Utc};
use benchscope_core::intensity::IntensityBand;
use benchscope_core::query::{Availability, LoadState};
use benchscope_core::table::{ColumnSelection, SortDirection, TableColumn, TableRow};
use benchscope_core::theme;
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use lucide_leptos::{ArrowDown, ArrowUp, Inbox, TriangleAlert};
use wasm_bindgen::prelude::*;

// ─── Load states ─────────────────────────────────────────────────────────────

fn loading_placeholder() -> AnyView {
    view! {
        <div class="animate-pulse space-y-3">
            <div class="bg-slate-900 h-6 w-1/3 rounded"></div>
            <div class="bg-slate-900 h-32 rounded-xl"></div>
        </div>
    }
    .into_any()
}

pub fn error_notice(message: String) -> AnyView {
    view! {
        <div class="flex items-start space-x-3 bg-red-950/40 border border-red-900 text-red-300 rounded-xl p-4 text-sm">
            <TriangleAlert size=18 />
            <div>
                <p class="font-semibold">"Failed to load"</p>
                <p class="font-mono text-xs mt-1 break-all">{message}</p>
            </div>
        </div>
    }
    .into_any()
}

pub fn empty_notice() -> AnyView {
    view! {
        <div class="flex items-center space-x-3 bg-slate-900 border border-slate-800 text-slate-500 rounded-xl p-4 text-sm">
            <Inbox size=18 />
            <span>"No data available"</span>
        </div>
    }
    .into_any()
}

/// Renders exactly one of loading, error, empty or the content.
pub fn render_state<T, V>(state: LoadState<T>, render: impl FnOnce(T) -> V) -> AnyView
where
    V: IntoView + 'static,
{
    match state {
        LoadState::Loading => loading_placeholder(),
        LoadState::Failed(message) => error_notice(message),
        LoadState::Empty => empty_notice(),
        LoadState::Ready(value) => render(value).into_any(),
    }
}

/// One independently loading region of a page.
#[component]
pub fn AsyncView<T, F, V>(resource: LocalResource<Result<T, String>>, render: F) -> impl IntoView
where
    T: Availability + Clone + Send + Sync + 'static,
    F: Fn(T) -> V + Clone + Send + Sync + 'static,
    V: IntoView + 'static,
{
    view! {
        <Transition fallback=loading_placeholder>
            {move || {
                let render = render.clone();
                Suspend::new(async move {
                    let result = resource.await;
                    render_state(LoadState::resolve(Some(result)), render)
                })
            }}
        </Transition>
    }
}

/// Calls `tick` every poll interval while the calling view is mounted.
pub fn use_polling(tick: impl Fn() + 'static) {
    let millis = crate::api::policy().poll_interval.as_millis().max(1_000);
    let interval = Interval::new(u32::try_from(millis).unwrap_or(u32::MAX), tick);
    let handle = StoredValue::new_local(Some(interval));
    on_cleanup(move || {
        handle.update_value(|h| {
            h.take();
        })
    });
}

// ─── Badges & cards ──────────────────────────────────────────────────────────

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| benchscope_core::format::GAP.to_string())
}

pub fn status_classes(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "bg-green-500/10 text-green-400 animate-pulse",
        RunStatus::Pending => "bg-amber-500/10 text-amber-400",
        RunStatus::Done => "bg-blue-500/10 text-blue-400",
        RunStatus::Failed => "bg-red-500/10 text-red-400",
        RunStatus::Unknown => "bg-slate-800 text-slate-500",
    }
}

#[component]
pub fn GradeBadge(grade: Grade, #[prop(optional, into)] title: String) -> impl IntoView {
    view! {
        <span
            title=title
            class=format!("px-2 py-0.5 rounded-full text-[10px] font-bold uppercase tracking-wider border {}", theme::grade_classes(grade))
        >
            {grade.label()}
        </span>
    }
}

#[component]
pub fn MetricCard(
    label: &'static str,
    value: String,
    #[prop(optional)] grade: Option<Grade>,
    #[prop(optional, into)] hint: String,
) -> impl IntoView {
    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-5 space-y-2">
            <div class="flex items-center justify-between">
                <p class="text-xs font-semibold text-slate-500 uppercase tracking-wider">{label}</p>
                {grade.map(|g| view! { <GradeBadge grade=g title=hint.clone() /> })}
            </div>
            <p class="text-2xl font-bold text-white font-mono">{value}</p>
        </div>
    }
}

#[component]
pub fn IntensityBadge(score: Option<f64>) -> impl IntoView {
    let score = score.filter(|s| s.is_finite());
    let band = score.map(IntensityBand::from_score);
    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-5 space-y-2">
            <p class="text-xs font-semibold text-slate-500 uppercase tracking-wider">"Bias intensity"</p>
            {match (score, band) {
                (Some(s), Some(b)) => view! {
                    <div class="flex items-baseline space-x-3">
                        <span class="text-2xl font-bold text-white font-mono">{format!("{:.1}", s)}</span>
                        <span
                            class="px-2 py-0.5 rounded-full text-xs font-semibold text-slate-950"
                            style=format!("background-color: {}", b.color())
                        >
                            {b.label()}
                        </span>
                    </div>
                }.into_any(),
                _ => view! { <span class="text-2xl font-bold text-slate-600">{benchscope_core::format::GAP}</span> }.into_any(),
            }}
        </div>
    }
}

// ─── Plotly ──────────────────────────────────────────────────────────────────

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Plotly, js_name = newPlot)]
    fn new_plot(root: &JsValue, data: &JsValue, layout: &JsValue, config: &JsValue);
}

/// Mounts a serialized Plotly figure (`Plot::to_json`) into a div.
#[component]
pub fn PlotlyChart(figure: String, #[prop(default = "h-80")] height: &'static str) -> impl IntoView {
    let div_ref = NodeRef::<leptos::html::Div>::new();
    let json_str = figure;

    Effect::new(move |_| {
        if let Some(div) = div_ref.get() {
            if let Ok(js_value) = js_sys::JSON::parse(&json_str) {
                let data =
                    js_sys::Reflect::get(&js_value, &"data".into()).unwrap_or(JsValue::UNDEFINED);
                let layout =
                    js_sys::Reflect::get(&js_value, &"layout".into()).unwrap_or(JsValue::UNDEFINED);
                let config =
                    js_sys::Reflect::get(&js_value, &"config".into()).unwrap_or(JsValue::UNDEFINED);

                let div_element: &web_sys::HtmlElement = &div;
                new_plot(&div_element.into(), &data, &layout, &config);
            } else {
                leptos::logging::error!("Failed to parse Plotly JSON");
            }
        }
    });

    view! {
        <div class=format!("w-full {}", height)>
            <div node_ref=div_ref class="w-full h-full"></div>
        </div>
    }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Checkbox strip toggling visible columns.
pub fn column_toggles<C>(columns: RwSignal<ColumnSelection<C>>) -> impl IntoView
where
    C: TableColumn + Send + Sync,
{
    view! {
        <div class="flex flex-wrap gap-2">
            {C::all()
                .iter()
                .copied()
                .map(|c| {
                    view! {
                        <label class="flex items-center space-x-1 text-xs text-slate-400 cursor-pointer select-none">
                            <input
                                type="checkbox"
                                class="accent-blue-500"
                                prop:checked=move || columns.with(|sel| sel.is_visible(c))
                                on:change=move |_| columns.update(|sel| sel.toggle(c))
                            />
                            <span>{c.header()}</span>
                        </label>
                    }
                })
                .collect_view()}
        </div>
    }
}

/// Table with clickable headers; missing values always sort last.
pub fn sortable_table<R>(
    rows: Vec<R>,
    columns: RwSignal<ColumnSelection<R::Column>>,
    sort: RwSignal<Option<(R::Column, SortDirection)>>,
) -> impl IntoView
where
    R: TableRow + Clone + Send + Sync + 'static,
    R::Column: Send + Sync,
{
    let on_header = move |c: R::Column| {
        sort.update(|s| {
            *s = match *s {
                Some((current, dir)) if current == c => Some((c, dir.flip())),
                _ => Some((c, SortDirection::Ascending)),
            }
        })
    };

    view! {
        <div class="overflow-x-auto border border-slate-800 rounded-xl">
            <table class="w-full text-left border-collapse text-sm">
                <thead>
                    <tr class="bg-slate-800/50">
                        {move || columns.get().columns().iter().copied().map(|c| {
                            let arrow = move || match sort.get() {
                                Some((s, SortDirection::Ascending)) if s == c => view! { <ArrowUp size=12 /> }.into_any(),
                                Some((s, SortDirection::Descending)) if s == c => view! { <ArrowDown size=12 /> }.into_any(),
                                _ => ().into_any(),
                            };
                            view! {
                                <th
                                    class=format!(
                                        "px-4 py-3 font-semibold text-slate-300 cursor-pointer hover:text-white whitespace-nowrap {}",
                                        if c.is_numeric() { "text-right" } else { "" }
                                    )
                                    on:click=move |_| on_header(c)
                                >
                                    <span class="inline-flex items-center space-x-1">
                                        <span>{c.header()}</span>
                                        {arrow}
                                    </span>
                                </th>
                            }
                        }).collect_view()}
                    </tr>
                </thead>
                <tbody class="divide-y divide-slate-800">
                    {move || {
                        let mut rows = rows.clone();
                        if let Some((c, dir)) = sort.get() {
                            benchscope_core::table::sort_rows(&mut rows, c, dir);
                        }
                        let visible = columns.get();
                        rows.into_iter().map(|row| {
                            let highlight = row.is_significant();
                            view! {
                                <tr class=if highlight { "bg-blue-950/30" } else { "hover:bg-slate-800/30" }>
                                    {visible.columns().iter().copied().map(|c| view! {
                                        <td class=format!(
                                            "px-4 py-2 font-mono text-xs whitespace-nowrap {}",
                                            if c.is_numeric() { "text-right text-slate-300" } else { "text-slate-200" }
                                        )>
                                            {row.cell(c).display()}
                                        </td>
                                    }).collect_view()}
                                </tr>
                            }
                        }).collect_view()
                    }}
                </tbody>
            </table>
        </div>
    }
}

#[component]
pub fn TabButton(
    label: String,
    active: Signal<bool>,
    #[prop(into)] on_select: Callback<()>,
) -> impl IntoView {
    view! {
        <button
            class=move || format!(
                "px-4 py-2 text-sm font-medium border-b-2 transition-colors {}",
                if active.get() { "border-blue-500 text-white" } else { "border-transparent text-slate-500 hover:text-slate-300" }
            )
            on:click=move |_| on_select.run(())
        >
            {label}
        </button>
    }
}
