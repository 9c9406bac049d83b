//! Display push loop
//!
//! The display refreshes on its own cadence from the latest published
//! status, independent of the attack cycle.

use crate::models::StatusSnapshot;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default refresh cadence for e-paper style displays
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(30);

/// Something that can show a status snapshot
#[async_trait]
pub trait DisplaySink: Send + Sync {
    async fn render(&self, status: &StatusSnapshot) -> Result<()>;

    fn name(&self) -> &str;
}

/// One-line summary used by headless displays
pub fn status_line(status: &StatusSnapshot) -> String {
    let target = status
        .current_target
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{} {} | mode={} target={} nets={} pwnd={}/{} ({:.0}%)",
        status.face,
        format!("{:?}", status.mood).to_lowercase(),
        status.mode,
        target,
        status.networks_count,
        status.handshakes_count,
        status.attacks_count,
        status.success_rate * 100.0,
    );
    if status.paused {
        line.push_str(" [paused]");
    }
    if status.learning_degraded {
        line.push_str(" [memory-only]");
    }
    line
}

/// Headless display that writes the status line to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

#[async_trait]
impl DisplaySink for LogDisplay {
    async fn render(&self, status: &StatusSnapshot) -> Result<()> {
        info!(
            mode = %status.mode,
            cycle_state = ?status.cycle_state,
            cycles = status.cycle_count,
            "{}",
            status_line(status)
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Periodically pushes the latest status to a display sink
pub struct DisplayLoop {
    sink: Arc<dyn DisplaySink>,
    status: watch::Receiver<StatusSnapshot>,
    refresh: Duration,
}

impl DisplayLoop {
    pub fn new(
        sink: Arc<dyn DisplaySink>,
        status: watch::Receiver<StatusSnapshot>,
        refresh: Duration,
    ) -> Self {
        Self {
            sink,
            status,
            refresh,
        }
    }

    /// Render the current snapshot once
    pub async fn push_once(&mut self) -> Result<()> {
        let snapshot = self.status.borrow_and_update().clone();
        self.sink.render(&snapshot).await
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            sink = self.sink.name(),
            refresh_secs = self.refresh.as_secs(),
            "Starting display loop"
        );

        let mut ticker = interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.push_once().await {
                        warn!(sink = self.sink.name(), error = %e, "Display refresh failed");
                    }
                }
                _ = shutdown.recv() => {
                    debug!("Shutting down display loop");
                    break;
                }
            }
        }
    }
}
