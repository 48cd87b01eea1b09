//! Kruskal-Wallis tables per trait category with client and server export.

use benchscope_core::export::{self, ExportFormat};
use benchscope_core::models::{KruskalResponse, KruskalRow};
use benchscope_core::table::{significant_only, sort_rows, ColumnSelection, KruskalColumn, SortDirection};
use leptos::prelude::*;
use leptos::task::spawn_local;
use lucide_leptos::Download;

use crate::api;
use crate::components::{column_toggles, error_notice, sortable_table, AsyncView, TabButton};
use crate::download::{download_table, download_text};

#[component]
pub fn SignificanceTab(run_id: String) -> impl IntoView {
    let id = run_id.clone();
    let kruskal = LocalResource::new(move || api::fetch_kruskal(id.clone()));
    view! {
        <AsyncView
            resource=kruskal
            render=move |k: KruskalResponse| view! { <KruskalPanel run_id=run_id.clone() data=k /> }
        />
    }
}

#[component]
fn KruskalPanel(run_id: String, data: KruskalResponse) -> impl IntoView {
    let categories: Vec<String> = data.by_category.keys().cloned().collect();
    let data = StoredValue::new(data);
    let run_id = StoredValue::new(run_id);
    let category = RwSignal::new(None::<String>);
    let columns = RwSignal::new(ColumnSelection::<KruskalColumn>::defaults());
    let sort = RwSignal::new(None::<(KruskalColumn, SortDirection)>);
    let only_significant = RwSignal::new(false);
    let server_error = RwSignal::new(None::<String>);

    let visible_rows = move || -> Vec<KruskalRow> {
        let cat = category.get();
        data.with_value(|d| {
            let rows = d.rows_for(cat.as_deref());
            if only_significant.get() {
                significant_only(rows)
            } else {
                rows.to_vec()
            }
        })
    };

    let export_local = move |format: ExportFormat| {
        let mut rows = visible_rows();
        if let Some((c, dir)) = sort.get_untracked() {
            sort_rows(&mut rows, c, dir);
        }
        let cat = category.get_untracked();
        let run = run_id.get_value();
        let name = export::file_name(&run, "kruskal", cat.as_deref(), format);
        let caption = match &cat {
            Some(c) => format!("Kruskal-Wallis tests, {} (run {})", c, run),
            None => format!("Kruskal-Wallis tests (run {})", run),
        };
        download_table(format, &rows, columns.get_untracked().columns(), &name, &caption);
    };

    let export_server = move |format: ExportFormat| {
        let run = run_id.get_value();
        server_error.set(None);
        spawn_local(async move {
            match api::fetch_kruskal_export(run.clone(), format).await {
                Ok(text) => {
                    let name = export::file_name(&run, "kruskal_full", None, format);
                    if let Err(e) = download_text(&name, format.mime_type(), &text) {
                        log::error!("download of {} failed: {:?}", name, e);
                    }
                }
                Err(e) => server_error.set(Some(e)),
            }
        });
    };

    let tab = move |label: String, value: Option<String>| {
        let active_value = value.clone();
        view! {
            <TabButton
                label=label
                active=Signal::derive(move || category.get() == active_value)
                on_select=move |_| {
                    category.set(value.clone());
                    sort.set(None);
                }
            />
        }
    };

    view! {
        <div class="space-y-4">
            <div class="flex flex-wrap border-b border-slate-800">
                {tab("Overall".to_string(), None)}
                {categories.into_iter().map(|c| tab(c.clone(), Some(c))).collect_view()}
            </div>

            <div class="flex flex-wrap items-center justify-between gap-3">
                {column_toggles(columns)}
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
                            on:click=move |_| export_local(f)
                            class="flex items-center space-x-1 px-3 py-1.5 bg-slate-800 hover:bg-slate-700 rounded-lg text-xs text-slate-200"
                        >
                            <Download size=14 />
                            <span>{f.to_string()}</span>
                        </button>
                    }).collect_view()}
                    {[ExportFormat::Csv, ExportFormat::Latex].into_iter().map(|f| view! {
                        <button
                            on:click=move |_| export_server(f)
                            title="Full report rendered by the backend"
                            class="flex items-center space-x-1 px-3 py-1.5 border border-slate-700 hover:bg-slate-800 rounded-lg text-xs text-slate-400"
                        >
                            <Download size=14 />
                            <span>{format!("{} (server)", f)}</span>
                        </button>
                    }).collect_view()}
                </div>
            </div>

            {move || server_error.get().map(error_notice)}
            {move || sortable_table(visible_rows(), columns, sort)}
        </div>
    }
}
