mod api;
mod components;
mod download;
mod pages;

use benchscope_core::query::CachePolicy;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::{Route, Router, Routes, A};
use leptos_router::path;
use lucide_leptos::{FlaskConical, GitCompare, LayoutDashboard, Settings as SettingsIcon};
use std::time::Duration;

use pages::compare::ComparePage;
use pages::run_detail::RunDetail;
use pages::runs::RunsPage;
use pages::settings::{debug_enabled, SettingsPage};

const NAV_LINK: &str = "flex items-center space-x-3 px-4 py-3 rounded-xl hover:bg-slate-800 transition-all duration-200 text-slate-400 hover:text-white group";

#[component]
fn App() -> impl IntoView {
    view! {
        <Router>
            <div class="flex h-screen bg-slate-950 text-slate-100 font-sans">
                // Sidebar
                <nav class="w-64 border-r border-slate-800 flex flex-col p-4 bg-slate-900/50">
                    <div class="flex items-center space-x-3 px-2 py-6 mb-6">
                        <div class="p-2 bg-blue-600 rounded-lg shadow-lg shadow-blue-900/20">
                            <FlaskConical size=24 />
                        </div>
                        <span class="text-2xl font-bold tracking-tight text-white">"benchscope"</span>
                    </div>

                    <div class="space-y-1">
                        <A href="/" attr:class=NAV_LINK>
                            <div class="group-hover:text-blue-400 transition-colors">
                                <LayoutDashboard size=20 />
                            </div>
                            <span class="font-medium">"Runs"</span>
                        </A>
                        <A href="/compare" attr:class=NAV_LINK>
                            <div class="group-hover:text-blue-400 transition-colors">
                                <GitCompare size=20 />
                            </div>
                            <span class="font-medium">"Compare"</span>
                        </A>
                    </div>

                    <div class="mt-auto">
                        <A href="/settings" attr:class=NAV_LINK>
                            <div class="group-hover:text-blue-400 transition-colors">
                                <SettingsIcon size=20 />
                            </div>
                            <span class="font-medium">"Settings"</span>
                        </A>
                    </div>
                </nav>

                // Main Content
                <main class="flex-grow overflow-auto p-8">
                    <Routes fallback=|| view! { <NotFound /> }.into_any()>
                        <Route path=path!("/") view=RunsPage />
                        <Route path=path!("/runs/:id") view=RunDetail />
                        <Route path=path!("/compare") view=ComparePage />
                        <Route path=path!("/settings") view=SettingsPage />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center h-full space-y-4">
            <h1 class="text-4xl font-bold">"404"</h1>
            <p class="text-slate-400">"Page not found"</p>
            <A href="/" attr:class="text-blue-400 hover:underline">"Back to runs"</A>
        </div>
    }
}

fn main() {
    let level = if debug_enabled() {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    _ = console_log::init_with_level(level);
    console_error_panic_hook::set_once();
    mount_to_body(App);

    spawn_local(async {
        match api::fetch_dashboard_info().await {
            Ok(info) => {
                log::debug!("dashboard {} (stale {}s, poll {}s)", info.version, info.stale_time_secs, info.poll_interval_secs);
                api::set_policy(CachePolicy {
                    stale_time: Duration::from_secs(info.stale_time_secs),
                    poll_interval: Duration::from_secs(info.poll_interval_secs.max(1)),
                });
            }
            Err(e) => log::warn!("using default cache policy: {}", e),
        }
    });
}
