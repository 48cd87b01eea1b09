//! Example of using benchscope-core directly from Rust.
//!
//! Usage: cargo run -p benchscope-core --example run_summary -- <run-id> [api-base-url]

use benchscope_core::format;
use benchscope_core::grading::{grade, MetricKind};
use benchscope_core::intensity::IntensityBand;
use benchscope_core::ApiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let run_id = args.next().ok_or("missing run id")?;
    let base = args.next().unwrap_or_else(|| "http://127.0.0.1:8080".to_string());

    let client = ApiClient::new(&base)?;
    let run = client.get_run(&run_id).await?;
    println!("{} [{}]", run.display_name(), run.status);

    let metrics = client.metrics(&run_id).await?;
    println!("n = {}, mean = {}", format::count(metrics.n), format::num(metrics.mean, 2));
    if let Some(score) = metrics.bias_intensity {
        println!("bias intensity: {:.1} ({})", score, IntensityBand::from_score(score));
    }

    let order = client.order_metrics(&run_id).await?;
    let rma = grade(MetricKind::ExactMatchRate, order.exact_match_rate);
    println!("exact match rate: {} ({})", format::percent1(order.exact_match_rate), rma);

    Ok(())
}
