//! Status of a running agent

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::AgentClient;
use crate::output::{color_decision, color_status, format_fee, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub async fn show_status(client: &AgentClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;
    let health = client.health().await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "status": status, "health": health });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            println!("{}", "Agent Status".bold());
            println!("{}", "=".repeat(50));
            println!("Health:            {}", color_status(health.status));
            println!("Cycles:            {}", status.cycles);
            println!("Alerts:            {}", status.alerts);
            println!("Skipped cycles:    {}", status.skipped);
            println!("Delivery failures: {}", status.delivery_failures);
            if let Some(sequence) = status.last_alert_sequence {
                println!("Last alert:        #{}", sequence);
            }
            println!();

            match (status.window.first(), status.window.get(1)) {
                (Some(current), previous) => {
                    println!("Current base fee:  {}", format_fee(current).cyan());
                    if let Some(previous) = previous {
                        println!("Previous base fee: {}", format_fee(previous));
                    }
                }
                (None, _) => print_warning("No samples collected yet"),
            }
            if let Some(decision) = &status.last_decision {
                println!("Last decision:     {}", color_decision(decision));
            }
            if let Some(error) = &status.last_error {
                print_warning(error);
            }
            println!();

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(component.status),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
