//! Read-only views of the running agent

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, TargetSummary};
use crate::output::{
    color_mode, color_rate, color_score, format_percent, format_signal, format_timestamp,
    print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for the targets table
#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "Ch")]
    channel: u16,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Enc")]
    encryption: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Pwnd")]
    record: String,
    #[tabled(rename = "Last Attempt")]
    last_attempt: String,
    #[tabled(rename = "Eligible")]
    eligible: String,
}

/// Score terms behind one target
#[derive(Tabled)]
struct TermsRow {
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Enc")]
    encryption: String,
    #[tabled(rename = "History")]
    history: String,
    #[tabled(rename = "Hour")]
    time_of_day: String,
    #[tabled(rename = "Congestion")]
    congestion: String,
    #[tabled(rename = "Score")]
    total: String,
}

impl TermsRow {
    fn from_target(t: &TargetSummary) -> Option<Self> {
        let terms = t.terms?;
        let term = |v: f64| format!("{:.2}", v);
        Some(Self {
            bssid: t.bssid.clone(),
            signal: term(terms.signal),
            encryption: term(terms.encryption),
            history: term(terms.history),
            time_of_day: term(terms.time_of_day),
            congestion: term(terms.congestion),
            total: color_score(terms.total),
        })
    }
}

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Faults")]
    faults: u32,
    #[tabled(rename = "Since")]
    since: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

fn color_status(status: &str) -> String {
    match status {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        _ => status.red().bold().to_string(),
    }
}

impl From<&TargetSummary> for TargetRow {
    fn from(t: &TargetSummary) -> Self {
        Self {
            bssid: t.bssid.clone(),
            ssid: if t.ssid.is_empty() {
                "<hidden>".dimmed().to_string()
            } else {
                t.ssid.clone()
            },
            channel: t.channel,
            signal: format_signal(t.signal_dbm),
            encryption: t.encryption.to_uppercase(),
            score: color_score(t.score),
            record: format!("{}/{}", t.successes, t.attempts),
            last_attempt: format_timestamp(t.last_attempt_at.as_deref()),
            eligible: if t.eligible {
                "yes".green().to_string()
            } else {
                "no".dimmed().to_string()
            },
        }
    }
}

/// Show the agent's status snapshot
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            println!("{}  {}", status.face.bold(), status.mood);
            println!("{}", "=".repeat(50));
            println!("Mode:          {}", color_mode(&status.mode));
            println!("Cycle State:   {}", status.cycle_state);
            println!(
                "Target:        {}",
                status.current_target.as_deref().unwrap_or("-").cyan()
            );
            println!("Networks:      {}", status.networks_count);
            println!("Cycles:        {}", status.cycle_count);
            println!(
                "Last Cycle:    {}",
                format_timestamp(status.last_cycle_at.as_deref())
            );
            println!();
            println!("{}", "Session".bold());
            println!("{}", "-".repeat(50));
            println!("Attacks:       {}", status.attacks_count);
            println!("Handshakes:    {}", status.handshakes_count);
            println!("Success Rate:  {}", color_rate(status.success_rate));
            println!();
            println!("{}", "Learning".bold());
            println!("{}", "-".repeat(50));
            let learning = &status.learning;
            println!("Attacks:       {}", learning.total_attempts);
            println!("Handshakes:    {}", learning.total_successes);
            println!("Success Rate:  {}", color_rate(learning.success_rate));
            println!("Networks:      {}", learning.networks_learned);
            println!(
                "Best Channel:  {}",
                learning
                    .best_channel
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("Exploration:   {}", format_percent(learning.exploration_rate));

            if status.paused {
                println!();
                print_warning("Attack cycle is paused");
            }
            if status.learning_degraded {
                println!();
                print_warning("Learning store unavailable; history is kept in memory only");
            }
        }
    }

    Ok(())
}

/// Show ranked targets, optionally with the terms behind each score
pub async fn show_targets(
    client: &ApiClient,
    limit: Option<usize>,
    explain: bool,
    format: OutputFormat,
) -> Result<()> {
    let targets = client.targets(limit).await?;

    match format {
        OutputFormat::Json => print_json(&targets)?,
        OutputFormat::Table if explain => {
            print_table(targets.iter().filter_map(TermsRow::from_target).collect());
        }
        OutputFormat::Table => {
            let eligible = targets.iter().filter(|t| t.eligible).count();
            print_table(targets.iter().map(TargetRow::from).collect());
            if !targets.is_empty() {
                println!("\nTotal: {} networks, {} eligible", targets.len(), eligible);
            }
        }
    }

    Ok(())
}

/// Show component health as the dashboard reports it
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let rows = report
                .components
                .iter()
                .map(|(name, health)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&health.status),
                    faults: health.consecutive_faults,
                    since: format_timestamp(Some(health.since.as_str())),
                    reason: health.reason.clone().unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            print_table(rows);
            println!();
            match (&report.not_ready_reason, report.status.as_str()) {
                (Some(reason), _) => print_warning(&format!("Not ready: {}", reason)),
                (None, "healthy") => print_success("All components healthy"),
                (None, status) => print_warning(&format!("Agent is {}", status)),
            }
        }
    }

    Ok(())
}
