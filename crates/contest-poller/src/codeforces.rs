//! Client for the public Codeforces contest-listing API.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Public Codeforces API root.
pub const DEFAULT_BASE_URL: &str = "https://codeforces.com/api";

/// Lifecycle phase of a contest as reported by the listing API.
///
/// Values the API has not documented yet fold into `Unknown` instead of
/// failing the whole response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ContestPhase {
    Before,
    Coding,
    PendingSystemTest,
    SystemTest,
    Finished,
    Unknown,
}

impl From<String> for ContestPhase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "BEFORE" => ContestPhase::Before,
            "CODING" => ContestPhase::Coding,
            "PENDING_SYSTEM_TEST" => ContestPhase::PendingSystemTest,
            "SYSTEM_TEST" => ContestPhase::SystemTest,
            "FINISHED" => ContestPhase::Finished,
            _ => ContestPhase::Unknown,
        }
    }
}

/// One contest from the listing API.
///
/// Announced-but-unscheduled contests carry no start time or duration,
/// so both are optional on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: u64,
    pub name: String,
    pub phase: ContestPhase,
    pub start_time_seconds: Option<i64>,
    pub duration_seconds: Option<i64>,
}

/// Envelope every Codeforces API response is wrapped in. Failed calls
/// carry a comment instead of a result.
#[derive(Debug, Deserialize)]
struct ContestListResponse {
    status: String,
    comment: Option<String>,
    #[serde(default)]
    result: Vec<Contest>,
}

pub struct CodeforcesClient {
    http: reqwest::Client,
    base_url: String,
}

impl CodeforcesClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch every official contest that has not started yet, in the
    /// order the API returns them.
    ///
    /// Transport failures and non-OK envelopes are both errors, so the
    /// caller can tell a failed fetch apart from a quiet week with no
    /// scheduled rounds. Contests without a start time or duration are
    /// dropped with a warning.
    pub async fn upcoming_contests(&self) -> Result<Vec<Contest>> {
        let url = format!("{}/contest.list", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("gym", "false")])
            .send()
            .await
            .context("Contest list request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("Contest list request returned {}", status);
        }

        let envelope: ContestListResponse = res
            .json()
            .await
            .context("Failed to decode contest list response")?;

        if envelope.status != "OK" {
            anyhow::bail!(
                "Contest list returned status {}: {}",
                envelope.status,
                envelope.comment.unwrap_or_default()
            );
        }

        let upcoming = envelope
            .result
            .into_iter()
            .filter(|c| c.phase == ContestPhase::Before)
            .filter(|c| {
                if c.start_time_seconds.is_none() || c.duration_seconds.is_none() {
                    tracing::warn!("Contest {} ({}) has no schedule yet, skipping", c.id, c.name);
                    return false;
                }
                true
            })
            .collect();

        Ok(upcoming)
    }
}

impl Default for CodeforcesClient {
    fn default() -> Self {
        Self::new()
    }
}
