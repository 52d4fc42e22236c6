// =============================================================================
// Yield Provider — DefiLlama pool yields
// =============================================================================
//
// Two leaderboards with different risk floors:
//   stable   — USDC/USDT/DAI symbols, TVL > $10M, APY > 0
//   volatile — everything else,       TVL > $5M,  APY > 10%
// Both sorted by APY descending, top five kept.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldsSnapshot {
    pub stable_yields: Vec<YieldPool>,
    pub volatile_yields: Vec<YieldPool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldPool {
    pub project: String,
    pub symbol: String,
    pub chain: String,
    pub apy: f64,
    pub tvl_usd: f64,
}

/// Fetches pool yields from the DefiLlama yields API.
pub struct YieldsProvider {
    client: reqwest::Client,
}

fn is_stable_symbol(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    upper.contains("USDC") || upper.contains("USDT") || upper.contains("DAI")
}

impl YieldsProvider {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<YieldsSnapshot> {
        let url = "https://yields.llama.fi/pools";

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET yield pools")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse yield pools response body")?;

        if !status.is_success() {
            anyhow::bail!("yields API returned {}: {}", status, body);
        }

        let pools: Vec<YieldPool> = body["data"]
            .as_array()
            .context("yields response has no data array")?
            .iter()
            .filter_map(|p| {
                let symbol = p["symbol"].as_str()?;
                Some(YieldPool {
                    project: p["project"].as_str().unwrap_or("").to_string(),
                    symbol: symbol.to_string(),
                    chain: p["chain"].as_str().unwrap_or("").to_string(),
                    apy: p["apy"].as_f64().unwrap_or(0.0),
                    tvl_usd: p["tvlUsd"].as_f64().unwrap_or(0.0),
                })
            })
            .collect();

        let mut stable_yields: Vec<YieldPool> = pools
            .iter()
            .filter(|p| is_stable_symbol(&p.symbol) && p.tvl_usd > 10_000_000.0 && p.apy > 0.0)
            .cloned()
            .collect();
        stable_yields.sort_by(|a, b| {
            b.apy.partial_cmp(&a.apy).unwrap_or(std::cmp::Ordering::Equal)
        });
        stable_yields.truncate(5);

        let mut volatile_yields: Vec<YieldPool> = pools
            .iter()
            .filter(|p| !is_stable_symbol(&p.symbol) && p.tvl_usd > 5_000_000.0 && p.apy > 10.0)
            .cloned()
            .collect();
        volatile_yields.sort_by(|a, b| {
            b.apy.partial_cmp(&a.apy).unwrap_or(std::cmp::Ordering::Equal)
        });
        volatile_yields.truncate(5);

        debug!(
            stable = stable_yields.len(),
            volatile = volatile_yields.len(),
            "yield pools fetched"
        );

        Ok(YieldsSnapshot {
            stable_yields,
            volatile_yields,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_symbol_detection() {
        assert!(is_stable_symbol("USDC"));
        assert!(is_stable_symbol("usdt-dai"));
        assert!(is_stable_symbol("WETH-USDC"));
        assert!(!is_stable_symbol("WETH-WBTC"));
        assert!(!is_stable_symbol("SOL"));
    }
}
