//! Order-consistency tab.

use benchscope_core::format;
use benchscope_core::grading::{self, order_summary, EffectSize, MetricKind};
use benchscope_core::models::{OrderCaseRow, OrderMetrics, TraitCategoryOrderRow};
use leptos::prelude::*;

use crate::api;
use crate::components::{AsyncView, GradeBadge, MetricCard};

#[component]
pub fn OrderTab(run_id: String) -> impl IntoView {
    let metrics = LocalResource::new(move || api::fetch_order_metrics(run_id.clone()));
    view! { <AsyncView resource=metrics render=order_view /> }
}

fn order_view(m: OrderMetrics) -> impl IntoView {
    let cards = order_summary(&m);
    let overall = grading::worst(cards.iter().map(|c| c.grade));
    let corr = m.correlation.clone();
    let usage = m.scale_usage.clone();

    view! {
        <div class="space-y-6">
            <div class="flex items-center space-x-3">
                <p class="text-sm text-slate-400">
                    {format!("{} paired responses (original vs reversed option order)", format::count(m.n_pairs))}
                </p>
                <GradeBadge grade=overall title="Worst grade across the summary metrics" />
            </div>
            <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                {cards.into_iter().map(|c| view! {
                    <MetricCard label=c.label value=c.display grade=c.grade hint=c.kind.describe() />
                }).collect_view()}
            </div>

            <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
                <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-3">
                    <h2 class="text-lg font-semibold text-white">"Correlations"</h2>
                    {stat_line("Spearman ρ", format::num(corr.spearman, 3), Some(grading::grade(MetricKind::Correlation, corr.spearman)))}
                    {stat_line("Pearson r", format::num(corr.pearson, 3), Some(grading::grade(MetricKind::Correlation, corr.pearson)))}
                    {stat_line("Kendall τ", format::num(corr.kendall, 3), Some(grading::grade(MetricKind::Correlation, corr.kendall)))}
                    {stat_line(
                        "Order bias 95% CI",
                        format::interval(m.order_bias.ci_low, m.order_bias.ci_high, 3),
                        None,
                    )}
                    {stat_line("Mean |Δ| test-retest", format::num(m.test_retest.mean_abs_diff, 3), None)}
                </div>
                <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-3">
                    <h2 class="text-lg font-semibold text-white">"Scale usage"</h2>
                    {stat_line("Extreme endpoints (EEI)", format::num(usage.eei, 3), None)}
                    {stat_line("Mid-point (MNI)", format::num(usage.mni, 3), None)}
                    {stat_line("Spread (SV)", format::num(usage.sv, 3), None)}
                </div>
            </div>

            {(!m.per_case.is_empty()).then(|| case_table(m.per_case.clone()))}
            {(!m.by_trait_category.is_empty()).then(|| trait_table(m.by_trait_category.clone()))}
        </div>
    }
}

fn stat_line(label: &'static str, value: String, grade: Option<grading::Grade>) -> impl IntoView {
    view! {
        <div class="flex items-center justify-between text-sm">
            <span class="text-slate-400">{label}</span>
            <span class="flex items-center space-x-2">
                <span class="font-mono text-slate-200">{value}</span>
                {grade.map(|g| view! { <GradeBadge grade=g /> })}
            </span>
        </div>
    }
}

const TH: &str = "px-4 py-3 font-semibold text-slate-300 whitespace-nowrap";
const TD_NUM: &str = "px-4 py-2 font-mono text-xs text-right text-slate-300";

fn case_table(rows: Vec<OrderCaseRow>) -> impl IntoView {
    view! {
        <div class="space-y-3">
            <h2 class="text-lg font-semibold text-white">"Per case"</h2>
            <div class="overflow-x-auto border border-slate-800 rounded-xl">
                <table class="w-full text-left border-collapse text-sm">
                    <thead>
                        <tr class="bg-slate-800/50">
                            <th class=TH>"Case"</th>
                            <th class=format!("{} text-right", TH)>"Pairs"</th>
                            <th class=format!("{} text-right", TH)>"Exact match"</th>
                            <th class=format!("{} text-right", TH)>"MAE"</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-slate-800">
                        {rows.into_iter().map(|r| {
                            let match_grade = grading::grade(MetricKind::ExactMatchRate, r.exact_match_rate);
                            let mae_grade = grading::grade(MetricKind::MeanAbsError, r.mae);
                            view! {
                                <tr class="hover:bg-slate-800/30">
                                    <td class="px-4 py-2 text-slate-200">{r.label.clone().unwrap_or_else(|| r.case_id.clone())}</td>
                                    <td class=TD_NUM>{format::count(r.n_pairs)}</td>
                                    <td class=TD_NUM>
                                        <span class="inline-flex items-center space-x-2">
                                            <span>{format::percent1(r.exact_match_rate)}</span>
                                            <GradeBadge grade=match_grade />
                                        </span>
                                    </td>
                                    <td class=TD_NUM>
                                        <span class="inline-flex items-center space-x-2">
                                            <span>{format::num(r.mae, 3)}</span>
                                            <GradeBadge grade=mae_grade />
                                        </span>
                                    </td>
                                </tr>
                            }
                        }).collect_view()}
                    </tbody>
                </table>
            </div>
        </div>
    }
}

fn trait_table(rows: Vec<TraitCategoryOrderRow>) -> impl IntoView {
    view! {
        <div class="space-y-3">
            <h2 class="text-lg font-semibold text-white">"By trait category"</h2>
            <div class="overflow-x-auto border border-slate-800 rounded-xl">
                <table class="w-full text-left border-collapse text-sm">
                    <thead>
                        <tr class="bg-slate-800/50">
                            <th class=TH>"Trait category"</th>
                            <th class=format!("{} text-right", TH)>"Pairs"</th>
                            <th class=format!("{} text-right", TH)>"RMA deviation"</th>
                            <th class=format!("{} text-right", TH)>"MAE"</th>
                            <th class=format!("{} text-right", TH)>"Cliff's δ"</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-slate-800">
                        {rows.into_iter().map(|r| {
                            let rma_grade = grading::grade(MetricKind::RmaDeviation, r.rma_deviation);
                            let effect = EffectSize::from_cliffs_delta(r.cliffs_delta)
                                .map(|e| e.label())
                                .unwrap_or(format::GAP);
                            view! {
                                <tr class="hover:bg-slate-800/30">
                                    <td class="px-4 py-2 text-slate-200">{r.trait_category.clone()}</td>
                                    <td class=TD_NUM>{format::count(r.n_pairs)}</td>
                                    <td class=TD_NUM>
                                        <span class="inline-flex items-center space-x-2">
                                            <span>{format::signed(r.rma_deviation, 3)}</span>
                                            <GradeBadge grade=rma_grade title=MetricKind::RmaDeviation.describe() />
                                        </span>
                                    </td>
                                    <td class=TD_NUM>{format::num(r.mae, 3)}</td>
                                    <td class=TD_NUM>{format!("{} ({})", format::signed(r.cliffs_delta, 3), effect)}</td>
                                </tr>
                            }
                        }).collect_view()}
                    </tbody>
                </table>
            </div>
        </div>
    }
}
