// =============================================================================
// TVL Provider — DefiLlama historical chain TVL
// =============================================================================
//
// The endpoint returns a daily series; we keep the last 30 days and compute
// the 7-day change from the point eight entries back (seven full days).

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvlSnapshot {
    /// Current total value locked across all chains, USD.
    pub total_tvl: f64,

    /// 7-day TVL change, percent.
    pub change_7d: f64,

    /// Daily TVL points, oldest first (up to 30 days).
    pub history: Vec<TvlPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvlPoint {
    /// Short display date (e.g. "Aug 7").
    pub date: String,
    pub tvl: f64,
}

/// Fetches total DeFi TVL history from DefiLlama.
pub struct TvlProvider {
    client: reqwest::Client,
}

impl TvlProvider {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<TvlSnapshot> {
        let url = "https://api.llama.fi/v2/historicalChainTvl";

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET historical chain TVL")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse TVL response body")?;

        if !status.is_success() {
            anyhow::bail!("TVL API returned {}: {}", status, body);
        }

        let series = body.as_array().context("TVL response is not an array")?;

        let recent: Vec<(i64, f64)> = series
            .iter()
            .rev()
            .take(30)
            .map(|d| {
                (
                    d["date"].as_i64().unwrap_or(0),
                    d["tvl"].as_f64().unwrap_or(0.0),
                )
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        let current = recent.last().map(|(_, tvl)| *tvl).unwrap_or(0.0);
        let week_ago = if recent.len() >= 8 {
            recent[recent.len() - 8].1
        } else {
            current
        };
        let change_7d = if week_ago > 0.0 {
            (current - week_ago) / week_ago * 100.0
        } else {
            0.0
        };

        let history = recent
            .iter()
            .map(|(ts, tvl)| TvlPoint {
                date: Utc
                    .timestamp_opt(*ts, 0)
                    .single()
                    .map(|t| t.format("%b %-d").to_string())
                    .unwrap_or_default(),
                tvl: *tvl,
            })
            .collect();

        debug!(
            total_tvl = current,
            change_7d = format!("{:.1}", change_7d),
            "TVL fetched"
        );

        Ok(TvlSnapshot {
            total_tvl: current,
            change_7d,
            history,
        })
    }
}
