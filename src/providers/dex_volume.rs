// =============================================================================
// DEX Volume Provider — DefiLlama aggregate DEX overview
// =============================================================================
//
// Besides the headline 24h total and its 1d/7d/30d deltas, we derive a
// top-chains leaderboard: each protocol's 24h volume is split evenly across
// the chains it runs on, summed per chain, and the six largest are kept.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexVolumeSnapshot {
    pub total_24h: f64,

    /// 1-day volume change, percent.
    pub change_24h: f64,

    /// 7-day volume change, percent.
    pub change_7d: f64,

    /// 30-day volume change, percent.
    pub change_30d: f64,

    /// Largest chains by attributed volume, descending.
    pub top_chains: Vec<ChainVolume>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVolume {
    pub name: String,
    pub volume: f64,
}

/// Fetches aggregate DEX volumes from DefiLlama.
pub struct DexVolumeProvider {
    client: reqwest::Client,
}

impl DexVolumeProvider {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<DexVolumeSnapshot> {
        let url = "https://api.llama.fi/overview/dexs";

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET DEX volume overview")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse DEX volume response body")?;

        if !status.is_success() {
            anyhow::bail!("DEX volume API returned {}: {}", status, body);
        }

        // Attribute each protocol's 24h volume evenly across its chains.
        let mut chain_volumes: HashMap<String, f64> = HashMap::new();
        if let Some(protocols) = body["protocols"].as_array() {
            for p in protocols {
                let total = p["total24h"].as_f64().unwrap_or(0.0);
                if let Some(chains) = p["chains"].as_array() {
                    if chains.is_empty() {
                        continue;
                    }
                    let share = total / chains.len() as f64;
                    for chain in chains {
                        if let Some(name) = chain.as_str() {
                            *chain_volumes.entry(name.to_string()).or_insert(0.0) += share;
                        }
                    }
                }
            }
        }

        let mut top_chains: Vec<ChainVolume> = chain_volumes
            .into_iter()
            .map(|(name, volume)| ChainVolume { name, volume })
            .collect();
        top_chains.sort_by(|a, b| {
            b.volume
                .partial_cmp(&a.volume)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_chains.truncate(6);

        let snapshot = DexVolumeSnapshot {
            total_24h: body["total24h"].as_f64().unwrap_or(0.0),
            change_24h: body["change_1d"].as_f64().unwrap_or(0.0),
            change_7d: body["change_7d"].as_f64().unwrap_or(0.0),
            change_30d: body["change_1m"].as_f64().unwrap_or(0.0),
            top_chains,
        };

        debug!(
            total_24h = snapshot.total_24h,
            change_7d = format!("{:.1}", snapshot.change_7d),
            chains = snapshot.top_chains.len(),
            "DEX volumes fetched"
        );

        Ok(snapshot)
    }
}
