// =============================================================================
// Global Market Stats Provider — CoinGecko
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Aggregate market statistics across all tracked assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalMarketSnapshot {
    pub total_market_cap: f64,
    pub total_volume_24h: f64,

    /// BTC share of total market cap, percent.
    pub btc_dominance: f64,

    /// ETH share of total market cap, percent.
    pub eth_dominance: f64,

    pub active_cryptos: u64,

    /// 24h market cap change, percent.
    pub market_cap_change_24h: f64,
}

/// Fetches global market statistics from the CoinGecko public API.
pub struct GlobalMarketProvider {
    client: reqwest::Client,
}

impl GlobalMarketProvider {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<GlobalMarketSnapshot> {
        let url = "https://api.coingecko.com/api/v3/global";

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET global market stats")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse global market response body")?;

        if !status.is_success() {
            anyhow::bail!("global market API returned {}: {}", status, body);
        }

        let d = &body["data"];
        if d.is_null() {
            anyhow::bail!("global market response has no data object");
        }

        let snapshot = GlobalMarketSnapshot {
            total_market_cap: d["total_market_cap"]["usd"].as_f64().unwrap_or(0.0),
            total_volume_24h: d["total_volume"]["usd"].as_f64().unwrap_or(0.0),
            btc_dominance: d["market_cap_percentage"]["btc"].as_f64().unwrap_or(0.0),
            eth_dominance: d["market_cap_percentage"]["eth"].as_f64().unwrap_or(0.0),
            active_cryptos: d["active_cryptocurrencies"].as_u64().unwrap_or(0),
            market_cap_change_24h: d["market_cap_change_percentage_24h_usd"]
                .as_f64()
                .unwrap_or(0.0),
        };

        debug!(
            market_cap = snapshot.total_market_cap,
            btc_dominance = format!("{:.1}", snapshot.btc_dominance),
            change_24h = format!("{:.2}", snapshot.market_cap_change_24h),
            "global market stats fetched"
        );

        Ok(snapshot)
    }
}
