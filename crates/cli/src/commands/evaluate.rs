//! Offline evaluation of a sample pair

use anyhow::Result;
use colored::Colorize;
use monitor_lib::{Decision, DecisionEngine, Sample, SampleWindow};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{color_decision, format_change, format_fee, OutputFormat};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Serialize)]
struct EvaluationReport<'a> {
    decision: &'a Decision,
    should_respond: bool,
    payload: &'static str,
}

/// Evaluate `current` against `previous` and print the decision
///
/// Returns whether the pair triggers an alert.
pub fn evaluate(current: Sample, previous: Sample, format: OutputFormat) -> Result<bool> {
    let window = SampleWindow::from_newest_first([current, previous]);
    let decision = DecisionEngine::new().evaluate(&window);
    print_decision(&decision, format)?;
    Ok(decision.should_respond())
}

pub(crate) fn print_decision(decision: &Decision, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = EvaluationReport {
                decision,
                should_respond: decision.should_respond(),
                payload: decision.message(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{}", "Base Fee Evaluation".bold());

            let mut rows = Vec::new();
            if let Some(flux) = decision.flux() {
                rows.push(FieldRow {
                    field: "Current",
                    value: format_fee(&flux.current),
                });
                rows.push(FieldRow {
                    field: "Previous",
                    value: format_fee(&flux.previous),
                });
                rows.push(FieldRow {
                    field: "Delta",
                    value: flux.delta.to_string(),
                });
                rows.push(FieldRow {
                    field: "Threshold",
                    value: flux.threshold.to_string(),
                });
                rows.push(FieldRow {
                    field: "Change",
                    value: format_change(flux),
                });
            }
            rows.push(FieldRow {
                field: "Decision",
                value: color_decision(decision),
            });
            rows.push(FieldRow {
                field: "Payload",
                value: decision.message().to_string(),
            });

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }
    Ok(())
}
