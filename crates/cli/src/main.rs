//! Base Fee Monitor CLI
//!
//! Evaluate fee pairs offline, sample a node once, or inspect a running
//! basefee-agent.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{evaluate, sample, status};
use monitor_lib::Sample;
use std::time::Duration;

/// Exit code when `evaluate --fail-on-trigger` sees a triggered pair
const TRIGGERED_EXIT_CODE: i32 = 3;

/// Base Fee Monitor CLI
#[derive(Parser)]
#[command(name = "bfm")]
#[command(author, version, about = "CLI for the Base Fee Monitor", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a current/previous base fee pair
    Evaluate {
        /// Newest sample (decimal or 0x-hex)
        current: Sample,

        /// Sample before it (decimal or 0x-hex)
        previous: Sample,

        /// Exit with code 3 when the pair triggers an alert
        #[arg(long)]
        fail_on_trigger: bool,
    },

    /// Read the current base fee from a JSON-RPC node
    Sample {
        /// JSON-RPC endpoint
        #[arg(long, env = "MONITOR_RPC_URL", default_value = "http://localhost:8545")]
        rpc_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,

        /// Earlier sample to evaluate the read against
        #[arg(long)]
        previous: Option<Sample>,
    },

    /// Show the status of a running agent
    Status {
        /// Agent API URL
        #[arg(long, env = "BFM_AGENT_URL", default_value = "http://localhost:8080")]
        agent_url: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Some(code)) => std::process::exit(code),
        Ok(None) => {}
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<Option<i32>> {
    match cli.command {
        Commands::Evaluate {
            current,
            previous,
            fail_on_trigger,
        } => {
            let triggered = evaluate::evaluate(current, previous, cli.format)?;
            if triggered && fail_on_trigger {
                return Ok(Some(TRIGGERED_EXIT_CODE));
            }
        }
        Commands::Sample {
            rpc_url,
            timeout,
            previous,
        } => {
            sample::sample(&rpc_url, Duration::from_secs(timeout), previous, cli.format).await?;
        }
        Commands::Status { agent_url } => {
            let client = client::AgentClient::new(&agent_url)?;
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(None)
}
