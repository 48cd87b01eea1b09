use benchscope_core::models::DashboardInfo;
use leptos::prelude::*;

use crate::api;
use crate::components::AsyncView;

pub const DEBUG_KEY: &str = "debug_enabled";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub fn debug_enabled() -> bool {
    local_storage()
        .and_then(|s| s.get_item(DEBUG_KEY).ok().flatten())
        .is_some_and(|v| v == "true")
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let (debug, set_debug) = signal(debug_enabled());
    let info = LocalResource::new(api::fetch_dashboard_info);

    Effect::new(move |_| {
        let val = debug.get();
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(DEBUG_KEY, if val { "true" } else { "false" });
        }
    });

    view! {
        <div class="space-y-6">
            <h1 class="text-3xl font-bold text-white">"Settings"</h1>
            <div class="bg-slate-900 border border-slate-800 rounded-2xl p-6 space-y-6">
                <div class="flex items-center justify-between">
                    <div>
                        <h3 class="text-lg font-medium text-white">"Debug Logs"</h3>
                        <p class="text-sm text-slate-400">"Log every request and cache hit to the browser console. Requires page reload."</p>
                    </div>
                    <button
                        on:click=move |_| set_debug.update(|v| *v = !*v)
                        class=move || format!(
                            "w-12 h-6 rounded-full transition-colors relative {}",
                            if debug.get() { "bg-blue-600" } else { "bg-slate-700" }
                        )
                    >
                        <div class=move || format!(
                            "absolute top-1 left-1 w-4 h-4 bg-white rounded-full transition-transform {}",
                            if debug.get() { "translate-x-6" } else { "" }
                        )></div>
                    </button>
                </div>
            </div>

            <div class="bg-slate-900 border border-slate-800 rounded-2xl p-6 space-y-3">
                <h3 class="text-lg font-medium text-white">"Server"</h3>
                <AsyncView resource=info render=|i: DashboardInfo| view! {
                    <dl class="grid grid-cols-2 gap-2 text-sm">
                        <dt class="text-slate-500">"Version"</dt>
                        <dd class="font-mono text-slate-200">{i.version}</dd>
                        <dt class="text-slate-500">"Cache freshness"</dt>
                        <dd class="font-mono text-slate-200">{format!("{} s", i.stale_time_secs)}</dd>
                        <dt class="text-slate-500">"Poll interval"</dt>
                        <dd class="font-mono text-slate-200">{format!("{} s", i.poll_interval_secs)}</dd>
                    </dl>
                } />
            </div>
        </div>
    }
}
