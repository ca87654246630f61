//! One-off base fee read from a JSON-RPC node

use anyhow::{Context, Result};
use monitor_lib::{sampler::create_rpc_sampler, DecisionEngine, Sample, SampleWindow};
use std::time::Duration;

use super::evaluate::print_decision;
use crate::output::{format_fee, print_info, print_success, OutputFormat};

/// Read the current base fee, optionally evaluating it against `previous`
pub async fn sample(
    rpc_url: &str,
    timeout: Duration,
    previous: Option<Sample>,
    format: OutputFormat,
) -> Result<()> {
    let sampler = create_rpc_sampler(rpc_url, timeout)?;
    let current = sampler
        .collect()
        .await
        .with_context(|| format!("Failed to read base fee from {}", rpc_url))?;

    match previous {
        Some(previous) => {
            let window = SampleWindow::from_newest_first([current, previous]);
            let decision = DecisionEngine::new().evaluate(&window);
            print_decision(&decision, format)?;
        }
        None => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "base_fee": current }));
            }
            OutputFormat::Table => {
                print_success(&format!("Current base fee: {}", format_fee(&current)));
                print_info("Pass --previous to evaluate against an earlier sample");
            }
        },
    }

    Ok(())
}
