// =============================================================================
// Stablecoin Supply Provider — DefiLlama pegged assets
// =============================================================================
//
// Totals are computed over the five largest stablecoins by circulating
// supply; the aggregate 24h change compares against each asset's previous-day
// circulation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StablecoinSnapshot {
    /// Combined circulating supply of the top five stablecoins, USD.
    pub total_circulating: f64,

    /// Aggregate 24h supply change, percent.
    pub change_24h: f64,

    pub top5: Vec<StablecoinAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StablecoinAsset {
    pub name: String,
    pub symbol: String,
    pub circulating: f64,

    /// Per-asset 24h supply change, percent.
    pub change_24h: f64,
}

/// Fetches stablecoin circulating supplies from DefiLlama.
pub struct StablecoinProvider {
    client: reqwest::Client,
}

impl StablecoinProvider {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<StablecoinSnapshot> {
        let url = "https://stablecoins.llama.fi/stablecoins?includePrices=false";

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET stablecoin supplies")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse stablecoin response body")?;

        if !status.is_success() {
            anyhow::bail!("stablecoin API returned {}: {}", status, body);
        }

        let assets = body["peggedAssets"]
            .as_array()
            .context("stablecoin response has no peggedAssets array")?;

        let mut ranked: Vec<&serde_json::Value> = assets
            .iter()
            .filter(|a| a["circulating"]["peggedUSD"].as_f64().unwrap_or(0.0) > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            let ca = a["circulating"]["peggedUSD"].as_f64().unwrap_or(0.0);
            let cb = b["circulating"]["peggedUSD"].as_f64().unwrap_or(0.0);
            cb.partial_cmp(&ca).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut total_circulating = 0.0;
        let mut total_prev_day = 0.0;

        let top5: Vec<StablecoinAsset> = ranked
            .iter()
            .take(5)
            .map(|a| {
                let circulating = a["circulating"]["peggedUSD"].as_f64().unwrap_or(0.0);
                let prev_day = a["circulatingPrevDay"]["peggedUSD"]
                    .as_f64()
                    .unwrap_or(circulating);

                total_circulating += circulating;
                total_prev_day += prev_day;

                StablecoinAsset {
                    name: a["name"].as_str().unwrap_or("").to_string(),
                    symbol: a["symbol"].as_str().unwrap_or("").to_string(),
                    circulating,
                    change_24h: if prev_day > 0.0 {
                        (circulating - prev_day) / prev_day * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        let change_24h = if total_prev_day > 0.0 {
            (total_circulating - total_prev_day) / total_prev_day * 100.0
        } else {
            0.0
        };

        debug!(
            total = total_circulating,
            change_24h = format!("{:.3}", change_24h),
            "stablecoin supplies fetched"
        );

        Ok(StablecoinSnapshot {
            total_circulating,
            change_24h,
            top5,
        })
    }
}
