//! API client for the agent dashboard

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// API client for the dashboard API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach the agent")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to reach the agent")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Rejections carry a CommandResponse; surface its message
            let message = serde_json::from_str::<CommandResponse>(&body)
                .map(|r| r.message)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn status(&self) -> Result<StatusSnapshot> {
        self.get("api/status").await
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.get("api/health").await
    }

    pub async fn targets(&self, limit: Option<usize>) -> Result<Vec<TargetSummary>> {
        match limit {
            Some(limit) => self.get(&format!("api/targets?limit={}", limit)).await,
            None => self.get("api/targets").await,
        }
    }

    pub async fn override_target(&self, bssid: &str) -> Result<CommandResponse> {
        let request = OverrideRequest {
            bssid: bssid.to_string(),
        };
        self.post("api/override", &request).await
    }

    pub async fn set_mode(&self, mode: &str) -> Result<CommandResponse> {
        let request = ModeRequest {
            mode: mode.to_string(),
        };
        self.post("api/mode", &request).await
    }

    pub async fn pause(&self) -> Result<CommandResponse> {
        self.post("api/pause", &serde_json::json!({})).await
    }

    pub async fn resume(&self) -> Result<CommandResponse> {
        self.post("api/resume", &serde_json::json!({})).await
    }

    pub async fn reset_learning(&self) -> Result<CommandResponse> {
        self.post("api/learning/reset", &serde_json::json!({})).await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mode: String,
    pub cycle_state: String,
    pub current_target: Option<String>,
    pub networks_count: u64,
    pub attacks_count: u64,
    pub handshakes_count: u64,
    pub success_rate: f64,
    pub mood: String,
    pub face: String,
    pub cycle_count: u64,
    pub paused: bool,
    pub learning_degraded: bool,
    pub last_cycle_at: Option<String>,
    /// Absent on agents that predate the learning summary
    #[serde(default)]
    pub learning: LearningSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningSummary {
    pub total_attempts: u64,
    pub total_successes: u64,
    pub success_rate: f64,
    pub networks_learned: u64,
    pub best_channel: Option<u16>,
    pub exploration_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    pub reason: Option<String>,
    pub consecutive_faults: u32,
    pub since: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub ready: bool,
    pub not_ready_reason: Option<String>,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreTerms {
    pub signal: f64,
    pub encryption: f64,
    pub history: f64,
    pub time_of_day: f64,
    pub congestion: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSummary {
    pub bssid: String,
    pub ssid: String,
    pub channel: u16,
    pub signal_dbm: i32,
    pub encryption: String,
    pub score: f64,
    pub eligible: bool,
    pub attempts: u64,
    pub successes: u64,
    pub last_attempt_at: Option<String>,
    #[serde(default)]
    pub terms: Option<ScoreTerms>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub accepted: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub bssid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_BODY: &str = r#"{
        "mode": "simulation",
        "cycle_state": "idle",
        "current_target": null,
        "networks_count": 4,
        "attacks_count": 10,
        "handshakes_count": 3,
        "success_rate": 0.3,
        "mood": "thinking",
        "face": "(o_o)",
        "cycle_count": 12,
        "paused": false,
        "learning_degraded": false,
        "last_cycle_at": "2026-10-19T08:00:00Z",
        "learning": {
            "total_attempts": 41,
            "total_successes": 12,
            "success_rate": 0.2926829268292683,
            "networks_learned": 9,
            "best_channel": 11,
            "exploration_rate": 0.1
        }
    }"#;

    #[tokio::test]
    async fn test_status_parses_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(STATUS_BODY)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let status = client.status().await.unwrap();

        mock.assert_async().await;
        assert_eq!(status.mode, "simulation");
        assert_eq!(status.handshakes_count, 3);
        assert!(status.current_target.is_none());
        assert_eq!(status.learning.total_attempts, 41);
        assert_eq!(status.learning.best_channel, Some(11));
    }

    #[tokio::test]
    async fn test_health_parses_components() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(
                r#"{
                    "status": "degraded",
                    "ready": true,
                    "components": {
                        "learning_store": {
                            "status": "degraded",
                            "reason": "Permission denied",
                            "consecutive_faults": 2,
                            "since": "2026-10-19T08:00:00Z"
                        },
                        "radio": {
                            "status": "healthy",
                            "consecutive_faults": 0,
                            "since": "2026-10-19T07:00:00Z"
                        }
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let report = client.health().await.unwrap();

        assert!(report.ready);
        assert!(report.not_ready_reason.is_none());
        let store = &report.components["learning_store"];
        assert_eq!(store.reason.as_deref(), Some("Permission denied"));
        assert!(report.components["radio"].reason.is_none());
    }

    #[tokio::test]
    async fn test_reset_learning_posts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/learning/reset")
            .with_status(202)
            .with_body(r#"{"accepted": true, "message": "queued"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        assert!(client.reset_learning().await.unwrap().accepted);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_targets_passes_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/targets")
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let targets = client.targets(Some(5)).await.unwrap();

        mock.assert_async().await;
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn test_override_sends_bssid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/override")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"bssid": "aa:bb:cc:dd:ee:01"}),
            ))
            .with_status(202)
            .with_body(r#"{"accepted": true, "message": "queued"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response = client.override_target("aa:bb:cc:dd:ee:01").await.unwrap();

        mock.assert_async().await;
        assert!(response.accepted);
    }

    #[tokio::test]
    async fn test_rejection_surfaces_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/mode")
            .with_status(400)
            .with_body(r#"{"accepted": false, "message": "unknown mode 'turbo'"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.set_mode("turbo").await.unwrap_err();

        let text = err.to_string();
        assert!(text.contains("400"));
        assert!(text.contains("unknown mode 'turbo'"));
    }
}
