//! Bias tab: attribute/baseline/target selection, delta and forest plots,
//! and the exportable delta table.

use benchscope_core::charts::{self, overall_marker};
use benchscope_core::export::{self, ExportFormat};
use benchscope_core::models::{DeltaResponse, DeltaRow, ForestResponse, MetricsSnapshot};
use benchscope_core::selection::{Catalog, Selection};
use benchscope_core::table::{significant_only, ColumnSelection, DeltaColumn, SortDirection};
use benchscope_core::threshold::threshold_from_rows;
use futures_util::future::join_all;
use leptos::prelude::*;
use lucide_leptos::Download;

use crate::api;
use crate::components::{column_toggles, sortable_table, AsyncView, PlotlyChart};
use crate::download::download_table;

#[component]
pub fn BiasTab(run_id: String) -> impl IntoView {
    let id = run_id.clone();
    let metrics = LocalResource::new(move || api::fetch_metrics(id.clone()));
    view! {
        <AsyncView
            resource=metrics
            render=move |m: MetricsSnapshot| view! { <BiasPanel run_id=run_id.clone() catalog=m /> }
        />
    }
}

/// Applies a user edit, then re-resolves the selection against the catalog.
fn edit(
    selection: RwSignal<Selection>,
    catalog: StoredValue<MetricsSnapshot>,
    change: impl FnOnce(&mut Selection),
) {
    selection.update(|s| {
        change(s);
        catalog.with_value(|c| s.reconcile(c));
    });
}

const SELECT: &str = "bg-slate-950 border border-slate-800 rounded-lg px-3 py-1.5 text-sm text-white";
const LABEL: &str = "block text-xs font-semibold text-slate-500 uppercase mb-1";

#[component]
fn BiasPanel(run_id: String, catalog: MetricsSnapshot) -> impl IntoView {
    let mut initial = Selection::new();
    initial.reconcile(&catalog);
    let selection = RwSignal::new(initial);
    let trait_categories = catalog.trait_categories.clone();
    let catalog = StoredValue::new(catalog);
    let trait_category = RwSignal::new(None::<String>);

    let id = run_id.clone();
    let deltas = LocalResource::new(move || {
        let id = id.clone();
        let sel = selection.get();
        let tc = trait_category.get();
        async move {
            match sel.attribute {
                Some(attr) => api::fetch_deltas(id, attr, sel.baseline, tc).await,
                None => Ok(DeltaResponse::default()),
            }
        }
    });

    let id = run_id.clone();
    let forest = LocalResource::new(move || {
        let id = id.clone();
        let sel = selection.get();
        async move {
            if !sel.is_complete() {
                return Ok(Vec::new());
            }
            let (Some(attr), Some(base)) = (sel.attribute, sel.baseline) else {
                return Ok(Vec::new());
            };
            let requests = sel.targets.into_iter().map(|target| {
                let (id, attr, base) = (id.clone(), attr.clone(), base.clone());
                async move {
                    api::fetch_forest(id, attr, base, target.clone())
                        .await
                        .map(|r| (target, r))
                }
            });
            join_all(requests)
                .await
                .into_iter()
                .collect::<Result<Vec<(String, ForestResponse)>, String>>()
        }
    });

    let attribute_options = move || catalog.with_value(|c| c.attributes().into_iter().map(str::to_string).collect::<Vec<_>>());
    let baseline_options = move || {
        let attr = selection.with(|s| s.attribute.clone());
        catalog.with_value(|c| {
            attr.and_then(|a| c.meta(&a).map(|m| m.categories.clone()))
                .unwrap_or_default()
        })
    };
    let target_options = move || {
        let sel = selection.get();
        catalog.with_value(|c| sel.target_options(c).into_iter().map(str::to_string).collect::<Vec<_>>())
    };

    view! {
        <div class="space-y-6">
            <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 grid grid-cols-1 md:grid-cols-4 gap-6">
                <div>
                    <label class=LABEL>"Attribute"</label>
                    <select
                        class=SELECT
                        prop:value=move || selection.with(|s| s.attribute.clone().unwrap_or_default())
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            edit(selection, catalog, |s| s.set_attribute(value));
                        }
                    >
                        {move || attribute_options().into_iter().map(|a| view! { <option value=a.clone()>{a.clone()}</option> }).collect_view()}
                    </select>
                </div>
                <div>
                    <label class=LABEL>"Baseline"</label>
                    <select
                        class=SELECT
                        prop:value=move || selection.with(|s| s.baseline.clone().unwrap_or_default())
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            edit(selection, catalog, |s| s.set_baseline(value));
                        }
                    >
                        {move || baseline_options().into_iter().map(|c| view! { <option value=c.clone()>{c.clone()}</option> }).collect_view()}
                    </select>
                </div>
                <div>
                    <label class=LABEL>"Targets"</label>
                    <div class="flex flex-wrap gap-2">
                        {move || target_options().into_iter().map(|t| {
                            let checked = t.clone();
                            let toggled = t.clone();
                            view! {
                                <label class="flex items-center space-x-1 text-xs text-slate-300 cursor-pointer">
                                    <input
                                        type="checkbox"
                                        class="accent-blue-500"
                                        prop:checked=move || selection.with(|s| s.targets.contains(&checked))
                                        on:change=move |_| {
                                            let target = toggled.clone();
                                            edit(selection, catalog, |s| s.toggle_target(target));
                                        }
                                    />
                                    <span>{t}</span>
                                </label>
                            }
                        }).collect_view()}
                    </div>
                </div>
                <div>
                    <label class=LABEL>"Trait category"</label>
                    <select
                        class=SELECT
                        prop:value=move || trait_category.get().unwrap_or_default()
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            trait_category.set((!value.is_empty()).then_some(value));
                        }
                    >
                        <option value="">"All"</option>
                        {trait_categories.into_iter().map(|t| view! { <option value=t.clone()>{t.clone()}</option> }).collect_view()}
                    </select>
                </div>
            </div>

            <div class="grid grid-cols-1 xl:grid-cols-2 gap-6">
                <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-4">
                    <h2 class="text-lg font-semibold text-white">"Delta vs baseline"</h2>
                    <AsyncView resource=deltas render=delta_plot />
                </div>
                <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-4">
                    <h2 class="text-lg font-semibold text-white">"Per-case forest"</h2>
                    <AsyncView resource=forest render=forest_plot />
                </div>
            </div>

            <AsyncView
                resource=deltas
                render=move |d: DeltaResponse| view! { <DeltaTable run_id=run_id.clone() response=d /> }
            />
        </div>
    }
}

fn delta_plot(d: DeltaResponse) -> impl IntoView {
    let threshold = threshold_from_rows(&d.rows);
    let series = charts::delta_series(d.attribute.clone(), 0, &d.rows);
    let figure = charts::delta_figure(&[series], threshold).to_json();
    view! {
        <div class="space-y-2">
            <PlotlyChart figure=figure />
            {threshold.map(|t| view! {
                <p class="text-xs text-slate-500">{format!("Dashed lines: approximate significance threshold ±{:.3}", t)}</p>
            })}
        </div>
    }
}

fn forest_plot(results: Vec<(String, ForestResponse)>) -> impl IntoView {
    let series: Vec<_> = results
        .iter()
        .enumerate()
        .map(|(i, (target, r))| charts::forest_series(target.clone(), i, &r.rows))
        .collect();
    let overall = results
        .iter()
        .find_map(|(_, r)| r.overall.as_ref().and_then(overall_marker));
    let height = if series.iter().map(|s| s.labels.len()).max().unwrap_or(0) > 15 {
        "h-[36rem]"
    } else {
        "h-80"
    };
    view! { <PlotlyChart figure=charts::forest_figure(&series, overall.as_ref()).to_json() height=height /> }
}

#[component]
fn DeltaTable(run_id: String, response: DeltaResponse) -> impl IntoView {
    let columns = RwSignal::new(ColumnSelection::<DeltaColumn>::defaults());
    let sort = RwSignal::new(None::<(DeltaColumn, SortDirection)>);
    let only_significant = RwSignal::new(false);
    let rows = StoredValue::new(response.rows);
    let attribute = response.attribute;
    let baseline = response.baseline.unwrap_or_default();

    let visible_rows = move || -> Vec<DeltaRow> {
        rows.with_value(|r| if only_significant.get() { significant_only(r) } else { r.clone() })
    };

    let caption = format!("Rating deltas for {} vs {} (run {})", attribute, baseline, run_id);
    let file_stem = StoredValue::new((run_id, attribute, caption));
    let export = move |format: ExportFormat| {
        let mut data = visible_rows();
        if let Some((c, dir)) = sort.get_untracked() {
            benchscope_core::table::sort_rows(&mut data, c, dir);
        }
        file_stem.with_value(|(run, attr, caption)| {
            let name = export::file_name(run, "deltas", Some(attr.as_str()), format);
            download_table(format, &data, columns.get_untracked().columns(), &name, caption);
        });
    };

    view! {
        <div class="space-y-3">
            <div class="flex flex-wrap items-center justify-between gap-3">
                <h2 class="text-lg font-semibold text-white">"Delta table"</h2>
                <div class="flex items-center space-x-3">
                    <label class="flex items-center space-x-1 text-xs text-slate-400 cursor-pointer">
                        <input
                            type="checkbox"
                            class="accent-blue-500"
                            prop:checked=move || only_significant.get()
                            on:change=move |_| only_significant.update(|v| *v = !*v)
                        />
                        <span>"Significant only"</span>
                    </label>
                    {[ExportFormat::Csv, ExportFormat::Latex].into_iter().map(|f| view! {
                        <button
                            on:click=move |_| export(f)
                            class="flex items-center space-x-1 px-3 py-1.5 bg-slate-800 hover:bg-slate-700 rounded-lg text-xs text-slate-200"
                        >
                            <Download size=14 />
                            <span>{f.to_string()}</span>
                        </button>
                    }).collect_view()}
                </div>
            </div>
            {column_toggles(columns)}
            {move || sortable_table(visible_rows(), columns, sort)}
        </div>
    }
}
