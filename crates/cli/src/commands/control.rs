//! Commands that steer the attack cycle

use anyhow::{bail, Result};

use crate::client::{ApiClient, CommandResponse};
use crate::output::{print_info, print_json, print_success, OutputFormat};

fn report(response: &CommandResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(response),
        OutputFormat::Table => {
            print_success(&response.message);
            Ok(())
        }
    }
}

/// Ask the agent to attack `bssid` on its next cycle
pub async fn override_target(
    client: &ApiClient,
    bssid: &str,
    format: OutputFormat,
) -> Result<()> {
    let response = client.override_target(bssid).await?;
    report(&response, format)?;
    if format == OutputFormat::Table {
        print_info("The override is dropped if the network is unknown or cooling down");
    }
    Ok(())
}

/// Force a mode preference
pub async fn set_mode(client: &ApiClient, mode: &str, format: OutputFormat) -> Result<()> {
    let response = client.set_mode(mode).await?;
    report(&response, format)?;
    if format == OutputFormat::Table && mode == "real" {
        print_info("REAL mode still requires a monitor-capable radio");
    }
    Ok(())
}

pub async fn pause(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response = client.pause().await?;
    report(&response, format)
}

pub async fn resume(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response = client.resume().await?;
    report(&response, format)
}

/// Discard every learned history on the agent
pub async fn reset_learning(
    client: &ApiClient,
    confirmed: bool,
    format: OutputFormat,
) -> Result<()> {
    if !confirmed {
        bail!("Resetting discards all learned attack history; pass --yes to confirm");
    }
    let response = client.reset_learning().await?;
    report(&response, format)
}
