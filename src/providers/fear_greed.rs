// =============================================================================
// Fear & Greed Index Provider — alternative.me
// =============================================================================
//
// The index compresses market sentiment into a single 0-100 value with a
// classification label. We also keep a week of history for the dashboard's
// sentiment sparkline, ordered oldest-first.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Latest index reading plus a week of history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FearGreedSnapshot {
    /// Index value in [0, 100].
    pub value: u8,

    /// Upstream classification label (e.g. "Extreme Fear", "Greed").
    pub label: String,

    /// Daily readings, oldest first.
    pub history: Vec<FearGreedPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FearGreedPoint {
    pub value: u8,
    /// Short display date (e.g. "Aug 7").
    pub date: String,
}

/// Fetches the crypto Fear & Greed index from alternative.me.
pub struct FearGreedProvider {
    client: reqwest::Client,
}

impl FearGreedProvider {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<FearGreedSnapshot> {
        let url = "https://api.alternative.me/fng/?limit=7";

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET fear & greed index")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse fear & greed response body")?;

        if !status.is_success() {
            anyhow::bail!("fear & greed API returned {}: {}", status, body);
        }

        let data = body["data"]
            .as_array()
            .context("fear & greed response has no data array")?;
        let latest = data.first().context("fear & greed data array is empty")?;

        let value: u8 = latest["value"]
            .as_str()
            .unwrap_or("50")
            .parse()
            .unwrap_or(50);
        let label = latest["value_classification"]
            .as_str()
            .unwrap_or("Neutral")
            .to_string();

        // The API returns newest-first; flip to oldest-first for charting.
        let mut history: Vec<FearGreedPoint> = data
            .iter()
            .map(|d| {
                let v: u8 = d["value"].as_str().unwrap_or("50").parse().unwrap_or(50);
                let ts: i64 = d["timestamp"].as_str().unwrap_or("0").parse().unwrap_or(0);
                let date = Utc
                    .timestamp_opt(ts, 0)
                    .single()
                    .map(|t| t.format("%b %-d").to_string())
                    .unwrap_or_default();
                FearGreedPoint { value: v, date }
            })
            .collect();
        history.reverse();

        debug!(value, label, points = history.len(), "fear & greed fetched");

        Ok(FearGreedSnapshot {
            value,
            label,
            history,
        })
    }
}
