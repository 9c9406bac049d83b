//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table from a list of rows
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a fraction in [0, 1] as a percentage
pub fn format_percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

pub fn format_signal(dbm: i32) -> String {
    format!("{} dBm", dbm)
}

/// Trim an RFC 3339 timestamp to seconds for display
pub fn format_timestamp(ts: Option<&str>) -> String {
    match ts {
        None => "-".to_string(),
        Some(ts) => match chrono::DateTime::parse_from_rfc3339(ts) {
            Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => ts.to_string(),
        },
    }
}

/// Color mode: real attacks stand out
pub fn color_mode(mode: &str) -> String {
    match mode {
        "real" => mode.red().bold().to_string(),
        "simulation" => mode.cyan().to_string(),
        _ => mode.to_string(),
    }
}

/// Color a target score
pub fn color_score(score: f64) -> String {
    let formatted = format!("{:.3}", score);
    if score >= 0.7 {
        formatted.green().to_string()
    } else if score >= 0.4 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a success rate
pub fn color_rate(rate: f64) -> String {
    let formatted = format_percent(rate);
    if rate >= 0.5 {
        formatted.green().to_string()
    } else if rate >= 0.2 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
