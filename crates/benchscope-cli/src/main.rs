//! bench: command-line companion to the benchscope dashboard.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use benchscope_core::export::{self, ExportFormat};
use benchscope_core::format;
use benchscope_core::grading::{self, order_summary};
use benchscope_core::intensity::IntensityBand;
use benchscope_core::models::{DeltaResponse, KruskalResponse, KruskalRow, Run};
use benchscope_core::table::{
    self, ColumnSelection, DeltaColumn, KruskalColumn, SortDirection, TableColumn, TableRow,
};
use benchscope_core::threshold::threshold_from_rows;
use benchscope_core::{ApiClient, DashConfig};
use benchscope_server::{serve, ServerConfig};

#[derive(Parser)]
#[command(
    name = "bench",
    about = "benchscope: inspect LLM bias benchmark runs",
    version,
    author
)]
struct Cli {
    /// Path to a benchscope.yaml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    api: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum TableKind {
    Deltas,
    Kruskal,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web dashboard server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// List benchmark runs
    Runs {
        /// Keep refreshing on the poll interval
        #[arg(long, short)]
        watch: bool,
    },
    /// Show metrics and the graded order-consistency summary of a run
    Inspect { run: String },
    /// Per-category deltas against a baseline
    Deltas {
        run: String,
        #[arg(long, short)]
        attribute: String,
        #[arg(long, short)]
        baseline: Option<String>,
        #[arg(long)]
        trait_category: Option<String>,
        /// Only rows flagged significant
        #[arg(long)]
        significant: bool,
        /// Column key to sort by
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        /// Comma-separated column keys
        #[arg(long)]
        columns: Option<String>,
    },
    /// Kruskal-Wallis tests across attributes
    Kruskal {
        run: String,
        /// Trait category tab (default: all traits)
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long)]
        significant: bool,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        columns: Option<String>,
    },
    /// Export a delta or Kruskal-Wallis table as CSV or LaTeX
    Export {
        /// Run to fetch from (omit with --input)
        #[arg(required_unless_present = "input")]
        run: Option<String>,
        /// Read a saved JSON response instead of calling the backend
        #[arg(long, short)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "deltas")]
        table: TableKind,
        #[arg(long, short)]
        attribute: Option<String>,
        #[arg(long, short)]
        baseline: Option<String>,
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short, default_value = "csv")]
        format: ExportFormat,
        #[arg(long)]
        columns: Option<String>,
        #[arg(long)]
        significant: bool,
        /// Use the backend's own Kruskal-Wallis export
        #[arg(long)]
        server_side: bool,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Start or resume a run
    Start {
        run: String,
        #[arg(long)]
        resume: bool,
        /// Show a progress bar until the run finishes
        #[arg(long, short)]
        follow: bool,
    },
    /// Launch the deeper analysis job for a run
    Analyze {
        run: String,
        /// Poll until the job leaves the running state
        #[arg(long, short)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = DashConfig::discover(cli.config.as_deref())?;
    if let Some(api) = cli.api {
        config.api_base_url = api;
        config.validate()?;
    }

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(config, host, port).await?;
        }
        Commands::Runs { watch } => {
            cmd_runs(&config, watch).await?;
        }
        Commands::Inspect { run } => {
            cmd_inspect(&config, &run).await?;
        }
        Commands::Deltas {
            run,
            attribute,
            baseline,
            trait_category,
            significant,
            sort,
            desc,
            columns,
        } => {
            let client = ApiClient::from_config(&config)?;
            let resp = client
                .deltas(&run, &attribute, baseline.as_deref(), trait_category.as_deref())
                .await?;
            let view = TableView::new(significant, sort, desc, columns);
            print_deltas(&resp, &view)?;
        }
        Commands::Kruskal {
            run,
            category,
            significant,
            sort,
            desc,
            columns,
        } => {
            let client = ApiClient::from_config(&config)?;
            let resp = client.kruskal(&run).await?;
            let view = TableView::new(significant, sort, desc, columns);
            print_kruskal(&resp, category.as_deref(), &view)?;
        }
        Commands::Export {
            run,
            input,
            table,
            attribute,
            baseline,
            category,
            format,
            columns,
            significant,
            server_side,
            output,
        } => {
            let req = ExportRequest {
                run,
                input,
                table,
                attribute,
                baseline,
                category,
                format,
                columns,
                significant,
                server_side,
            };
            let content = cmd_export(&config, req).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &content)?;
                    println!("Exported to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
        Commands::Start { run, resume, follow } => {
            cmd_start(&config, &run, resume, follow).await?;
        }
        Commands::Analyze { run, wait } => {
            cmd_analyze(&config, &run, wait).await?;
        }
    }

    Ok(())
}

// ─── Command implementations ──────────────────────────────────────────────────

async fn cmd_serve(config: DashConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut server = ServerConfig::from(&config);
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }

    println!("benchscope dashboard");
    println!("   Backend: {}", server.api_base_url);
    println!("   URL:     http://{}:{}", server.host, server.port);
    println!();

    serve(server).await?;
    Ok(())
}

fn runs_table(runs: &[Run]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Run", "Model", "Dataset", "Results", "Status", "Created", "Prompt"]);
    for run in runs {
        table.add_row([
            run.id.as_str(),
            run.model.as_deref().unwrap_or("-"),
            run.dataset.as_deref().unwrap_or("-"),
            &format::count(run.n_results),
            &run.status.to_string(),
            &run
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            if run.has_custom_system_prompt() { "custom" } else { "default" },
        ]);
    }
    table
}

async fn cmd_runs(config: &DashConfig, watch: bool) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    loop {
        let runs = client.list_runs().await?;
        if runs.is_empty() {
            println!("No runs found at {}", client.base_url());
        } else {
            println!("{}", runs_table(&runs));
        }
        if !watch {
            return Ok(());
        }

        let interval = Duration::from_secs(config.poll_interval_secs);
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
        println!("── {} ──", chrono::Local::now().format("%H:%M:%S"));
    }
}

async fn cmd_inspect(config: &DashConfig, run_id: &str) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let run = client.get_run(run_id).await?;
    println!("Run: {}", run.display_name());
    println!("Status: {}", run.status);
    if let Some(dataset) = &run.dataset {
        println!("Dataset: {}", dataset);
    }
    println!("Rationale: {}", if run.include_rationale { "included" } else { "omitted" });
    if run.has_custom_system_prompt() {
        println!("System prompt: custom");
    }
    println!();

    match client.metrics(run_id).await {
        Ok(metrics) => {
            println!("── Ratings ─────────────────────────────");
            println!(
                "n = {}   mean = {}   median = {}",
                format::count(metrics.n),
                format::num(metrics.mean, 2),
                format::num(metrics.median, 2)
            );
            if let Some(score) = format::finite(metrics.bias_intensity) {
                println!("Bias intensity: {:.1} ({})", score, IntensityBand::from_score(score));
            }
            for (name, meta) in &metrics.attributes {
                println!(
                    "  {}: {} (baseline {})",
                    name,
                    meta.categories.join(", "),
                    meta.baseline.as_deref().unwrap_or("-")
                );
            }
            println!();
        }
        Err(e) => println!("Metrics unavailable: {}\n", e),
    }

    match client.order_metrics(run_id).await {
        Ok(order) => {
            println!("── Order consistency ({} pairs) ─────────", format::count(order.n_pairs));
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(["Metric", "Value", "Grade", "Cut points"]);
            let cards = order_summary(&order);
            for card in &cards {
                table.add_row([
                    card.label,
                    card.display.as_str(),
                    card.grade.label(),
                    card.kind.describe().as_str(),
                ]);
            }
            println!("{}", table);
            println!("Overall grade: {}", grading::worst(cards.iter().map(|c| c.grade)));
        }
        Err(e) => println!("Order metrics unavailable: {}", e),
    }

    Ok(())
}

/// Sorting, filtering and column choice shared by the table commands.
struct TableView {
    significant: bool,
    sort: Option<String>,
    direction: SortDirection,
    columns: Option<String>,
}

impl TableView {
    fn new(significant: bool, sort: Option<String>, desc: bool, columns: Option<String>) -> Self {
        Self {
            significant,
            sort,
            direction: if desc { SortDirection::Descending } else { SortDirection::Ascending },
            columns,
        }
    }

    fn columns<C: TableColumn>(&self) -> Result<ColumnSelection<C>> {
        match &self.columns {
            Some(list) => ColumnSelection::parse(list).map_err(anyhow::Error::msg),
            None => Ok(ColumnSelection::defaults()),
        }
    }

    fn apply<R: TableRow + Clone>(&self, rows: &[R]) -> Result<Vec<R>> {
        let mut rows = if self.significant {
            table::significant_only(rows)
        } else {
            rows.to_vec()
        };
        if let Some(key) = &self.sort {
            let column = R::Column::from_key(key)
                .with_context(|| format!("unknown sort column '{}'", key))?;
            table::sort_rows(&mut rows, column, self.direction);
        }
        Ok(rows)
    }
}

fn render_table<R: TableRow>(rows: &[R], columns: &[R::Column]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(columns.iter().map(|c| c.header()));
    for row in rows {
        table.add_row(columns.iter().map(|c| row.cell(*c).display()));
    }
    table
}

fn print_deltas(resp: &DeltaResponse, view: &TableView) -> Result<()> {
    let rows = view.apply(&resp.rows)?;
    let columns = view.columns::<DeltaColumn>()?;
    println!(
        "Attribute: {}   Baseline: {}",
        resp.attribute,
        resp.baseline.as_deref().unwrap_or("-")
    );
    println!("{}", render_table(&rows, columns.columns()));
    match threshold_from_rows(&resp.rows) {
        Some(t) => println!("Approximate significance threshold: ±{:.3}", t),
        None => println!("Approximate significance threshold: {}", format::GAP),
    }
    Ok(())
}

/// Rows of one category tab; an unknown category is an error.
fn kruskal_rows<'a>(resp: &'a KruskalResponse, category: Option<&str>) -> Result<&'a [KruskalRow]> {
    if let Some(c) = category {
        if !resp.by_category.contains_key(c) {
            let known: Vec<&str> = resp.by_category.keys().map(String::as_str).collect();
            anyhow::bail!("unknown trait category '{}' (available: {})", c, known.join(", "));
        }
    }
    Ok(resp.rows_for(category))
}

fn print_kruskal(resp: &KruskalResponse, category: Option<&str>, view: &TableView) -> Result<()> {
    let rows = view.apply(kruskal_rows(resp, category)?)?;
    let columns = view.columns::<KruskalColumn>()?;
    println!("Kruskal-Wallis: {}", category.unwrap_or("all traits"));
    println!("{}", render_table(&rows, columns.columns()));
    Ok(())
}

struct ExportRequest {
    run: Option<String>,
    input: Option<PathBuf>,
    table: TableKind,
    attribute: Option<String>,
    baseline: Option<String>,
    category: Option<String>,
    format: ExportFormat,
    columns: Option<String>,
    significant: bool,
    server_side: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn export_columns<C: TableColumn>(list: Option<&str>) -> Result<Vec<C>> {
    let selection = match list {
        Some(list) => ColumnSelection::<C>::parse(list).map_err(anyhow::Error::msg)?,
        None => ColumnSelection::<C>::everything(),
    };
    if selection.columns().is_empty() {
        anyhow::bail!("no columns selected");
    }
    Ok(selection.columns().to_vec())
}

async fn cmd_export(config: &DashConfig, req: ExportRequest) -> Result<String> {
    let client = || ApiClient::from_config(config);
    let run = req.run.as_deref().unwrap_or("-");

    match req.table {
        TableKind::Deltas => {
            let resp: DeltaResponse = match &req.input {
                Some(path) => read_json(path)?,
                None => {
                    let attribute = req
                        .attribute
                        .as_deref()
                        .context("--attribute is required when exporting deltas from a run")?;
                    client()?
                        .deltas(run, attribute, req.baseline.as_deref(), req.category.as_deref())
                        .await?
                }
            };
            let rows = if req.significant {
                table::significant_only(&resp.rows)
            } else {
                resp.rows.clone()
            };
            let columns = export_columns::<DeltaColumn>(req.columns.as_deref())?;
            let caption = format!(
                "Deltas for {} against {}",
                resp.attribute,
                resp.baseline.as_deref().unwrap_or("baseline")
            );
            info!("exporting {} delta rows as {}", rows.len(), req.format);
            Ok(export::render(req.format, &rows, &columns, Some(&caption)))
        }
        TableKind::Kruskal => {
            if req.server_side && req.input.is_none() {
                return Ok(client()?.kruskal_export(run, req.format).await?);
            }
            let resp: KruskalResponse = match &req.input {
                Some(path) => read_json(path)?,
                None => client()?.kruskal(run).await?,
            };
            let all = kruskal_rows(&resp, req.category.as_deref())?;
            let rows = if req.significant {
                table::significant_only(all)
            } else {
                all.to_vec()
            };
            let columns = export_columns::<KruskalColumn>(req.columns.as_deref())?;
            let caption = format!(
                "Kruskal-Wallis tests ({})",
                req.category.as_deref().unwrap_or("all traits")
            );
            info!("exporting {} Kruskal-Wallis rows as {}", rows.len(), req.format);
            Ok(export::render(req.format, &rows, &columns, Some(&caption)))
        }
    }
}

async fn cmd_start(config: &DashConfig, run_id: &str, resume: bool, follow: bool) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    if resume {
        client.resume_run(run_id).await?;
        println!("Resumed run {}", run_id);
    } else {
        client.start_run(run_id).await?;
        println!("Started run {}", run_id);
    }
    if !follow {
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let interval = Duration::from_secs(config.poll_interval_secs);
    loop {
        let progress = client.progress(run_id).await?;
        bar.set_length(progress.total);
        bar.set_position(progress.done);
        bar.set_message(progress.status.to_string());
        if !progress.status.is_active() {
            bar.finish_with_message(progress.status.to_string());
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                bar.abandon_with_message("detached");
                return Ok(());
            }
        }
    }
}

async fn cmd_analyze(config: &DashConfig, run_id: &str, wait: bool) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let mut job = client.start_analysis(run_id).await?;
    println!(
        "Analysis {} for run {}: {}",
        job.job_id.as_deref().unwrap_or("-"),
        run_id,
        job.status
    );
    if !wait {
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    while job.status.is_active() {
        spinner.set_message(format!("analysis {}", job.status));
        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
        job = client.analysis_status(run_id).await?;
    }
    spinner.finish_with_message(format!("analysis {}", job.status));
    if let Some(message) = &job.message {
        println!("{}", message);
    }
    Ok(())
}
