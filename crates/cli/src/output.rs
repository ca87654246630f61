//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use ethnum::U256;
use monitor_lib::{health::ComponentStatus, Decision, Flux};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a decision label by outcome
pub fn color_decision(decision: &Decision) -> String {
    let label = decision.label();
    match decision {
        Decision::NotEnoughData => label.dimmed().to_string(),
        Decision::Stable(_) => label.green().to_string(),
        Decision::Triggered(_) => label.red().bold().to_string(),
    }
}

pub fn color_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy".green().to_string(),
        ComponentStatus::Degraded => "degraded".yellow().to_string(),
        ComponentStatus::Unhealthy => "unhealthy".red().to_string(),
    }
}

/// Relative change as a percentage string, from basis points
pub fn format_change(flux: &Flux) -> String {
    let Some(bps) = flux.basis_points() else {
        return "n/a".to_string();
    };
    let sign = if bps == U256::ZERO {
        ""
    } else if flux.is_rising() {
        "+"
    } else {
        "-"
    };
    let hundred = U256::new(100);
    let frac = *(bps % hundred).low();
    format!("{}{}.{:02}%", sign, bps / hundred, frac)
}

/// Render a fee in gwei when it is a whole wei amount of reasonable size
pub fn format_fee(value: &monitor_lib::Sample) -> String {
    const WEI_PER_GWEI: u64 = 1_000_000_000;
    let raw = value.value();
    if *raw.high() != 0 || *raw.low() > u64::MAX as u128 {
        return format!("{} wei", value);
    }
    let wei = *raw.low() as u64;
    format!("{} wei ({}.{:09} gwei)", wei, wei / WEI_PER_GWEI, wei % WEI_PER_GWEI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_lib::{DecisionEngine, Sample};

    #[test]
    fn test_format_change() {
        let flux = DecisionEngine::measure(Sample::from(102u64), Sample::from(100u64));
        assert_eq!(format_change(&flux), "+2.00%");

        let flux = DecisionEngine::measure(Sample::from(9_850u64), Sample::from(10_000u64));
        assert_eq!(format_change(&flux), "-1.50%");

        let flux = DecisionEngine::measure(Sample::from(5u64), Sample::from(0u64));
        assert_eq!(format_change(&flux), "n/a");
    }

    #[test]
    fn test_format_fee() {
        assert_eq!(
            format_fee(&Sample::from(1_500_000_000u64)),
            "1500000000 wei (1.500000000 gwei)"
        );
        assert_eq!(format_fee(&Sample::MAX), format!("{} wei", Sample::MAX));
    }
}
