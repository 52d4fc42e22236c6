// =============================================================================
// Derivatives Provider — OKX v5 public API (no key required)
// =============================================================================
//
// Per asset we pull four independent endpoints: current funding rate, open
// interest + volume, the hourly long/short account ratio history, and taker
// buy/sell volume. Endpoint failures inside one asset degrade that field to
// its zero default; the fetch as a whole fails only when every endpoint for
// the primary asset is unreachable (the exchange is effectively down).
//
// BTC and ETH carry the full data set; a fixed alt list carries funding rate
// and open interest only.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Full derivatives data for one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDerivatives {
    /// Current funding rate, percent (0.01 = 0.01%).
    pub funding_rate: f64,

    /// Open interest, USD notional.
    pub open_interest: f64,

    /// 24h derivatives volume, USD.
    pub volume_24h: f64,

    /// Hourly long/short account ratio, most recent last (up to 24 points).
    pub long_short_ratio: Vec<f64>,

    pub taker_buy_vol: f64,
    pub taker_sell_vol: f64,

    /// Taker buy/sell ratio; 1.0 when sell volume is zero.
    pub taker_ratio: f64,
}

/// Funding and open interest context for a secondary asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltFunding {
    pub symbol: String,
    pub funding_rate: f64,
    pub open_interest: f64,
}

/// Combined derivatives snapshot for the scoring pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativesSnapshot {
    pub btc: AssetDerivatives,
    pub eth: AssetDerivatives,
    pub top_coins: Vec<AltFunding>,
}

/// Fetches derivatives market data from OKX.
pub struct DerivativesProvider {
    client: reqwest::Client,
    alt_instruments: Vec<String>,
}

impl DerivativesProvider {
    pub fn with_client(client: reqwest::Client, alt_instruments: Vec<String>) -> Self {
        Self {
            client,
            alt_instruments,
        }
    }

    pub async fn fetch(&self) -> Result<DerivativesSnapshot> {
        let (btc, eth) = tokio::join!(
            self.fetch_asset("BTC", "BTC-USDT-SWAP"),
            self.fetch_asset("ETH", "ETH-USDT-SWAP"),
        );
        let btc = btc.context("fetch BTC derivatives")?;
        let eth = eth.context("fetch ETH derivatives")?;

        // Secondary context assets settle independently; a dead alt endpoint
        // only drops that one symbol from the list.
        let alt_futures = self.alt_instruments.iter().map(|inst| self.fetch_alt(inst));
        let top_coins = join_all(alt_futures)
            .await
            .into_iter()
            .flatten()
            .collect();

        Ok(DerivativesSnapshot {
            btc,
            eth,
            top_coins,
        })
    }

    /// Fetch the full four-endpoint data set for a primary asset.
    async fn fetch_asset(&self, ccy: &str, inst_id: &str) -> Result<AssetDerivatives> {
        let funding_url = format!("/api/v5/public/funding-rate?instId={inst_id}");
        let oi_url =
            format!("/api/v5/rubik/stat/contracts/open-interest-volume?ccy={ccy}&period=1D");
        let ls_url =
            format!("/api/v5/rubik/stat/contracts/long-short-account-ratio?ccy={ccy}&period=1H");
        let taker_url =
            format!("/api/v5/rubik/stat/taker-volume?ccy={ccy}&instType=CONTRACTS&period=1H");
        let (funding_res, oi_res, ls_res, taker_res) = tokio::join!(
            self.fetch_okx(&funding_url),
            self.fetch_okx(&oi_url),
            self.fetch_okx(&ls_url),
            self.fetch_okx(&taker_url),
        );

        if funding_res.is_err() && oi_res.is_err() && ls_res.is_err() && taker_res.is_err() {
            anyhow::bail!("all OKX endpoints failed for {ccy}");
        }

        let funding_rate = funding_res
            .ok()
            .and_then(|v| {
                v["data"][0]["fundingRate"]
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
            })
            .map(|r| r * 100.0)
            .unwrap_or(0.0);

        let (open_interest, volume_24h) = oi_res
            .ok()
            .map(|v| {
                let oi = v["data"][0][1]
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0);
                let vol = v["data"][0][2]
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0);
                (oi, vol)
            })
            .unwrap_or((0.0, 0.0));

        // The API returns newest-first rows of [ts, ratio]; keep 24 hours,
        // most recent last.
        let long_short_ratio = ls_res
            .ok()
            .and_then(|v| {
                v["data"].as_array().map(|rows| {
                    let mut ratios: Vec<f64> = rows
                        .iter()
                        .take(24)
                        .filter_map(|row| row[1].as_str().and_then(|s| s.parse().ok()))
                        .collect();
                    ratios.reverse();
                    ratios
                })
            })
            .unwrap_or_default();

        let (taker_buy_vol, taker_sell_vol) = taker_res
            .ok()
            .map(|v| {
                let buy = v["data"][0][1]
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0);
                let sell = v["data"][0][2]
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0);
                (buy, sell)
            })
            .unwrap_or((0.0, 0.0));

        let taker_ratio = if taker_sell_vol > 0.0 {
            taker_buy_vol / taker_sell_vol
        } else {
            1.0
        };

        debug!(
            ccy,
            funding_rate = format!("{:.4}", funding_rate),
            open_interest,
            ls_points = long_short_ratio.len(),
            "derivatives fetched"
        );

        Ok(AssetDerivatives {
            funding_rate,
            open_interest,
            volume_24h,
            long_short_ratio,
            taker_buy_vol,
            taker_sell_vol,
            taker_ratio,
        })
    }

    /// Fetch funding + OI context for a secondary asset. Returns `None` when
    /// both endpoints fail.
    async fn fetch_alt(&self, inst_id: &str) -> Option<AltFunding> {
        let ccy = inst_id.split('-').next().unwrap_or(inst_id);

        let funding_url = format!("/api/v5/public/funding-rate?instId={inst_id}");
        let oi_url =
            format!("/api/v5/rubik/stat/contracts/open-interest-volume?ccy={ccy}&period=1D");
        let (funding_res, oi_res) = tokio::join!(
            self.fetch_okx(&funding_url),
            self.fetch_okx(&oi_url),
        );

        if funding_res.is_err() && oi_res.is_err() {
            warn!(symbol = ccy, "alt derivatives endpoints failed, skipping");
            return None;
        }

        let funding_rate = funding_res
            .ok()
            .and_then(|v| {
                v["data"][0]["fundingRate"]
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
            })
            .map(|r| r * 100.0)
            .unwrap_or(0.0);

        let open_interest = oi_res
            .ok()
            .and_then(|v| v["data"][0][1].as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0.0);

        Some(AltFunding {
            symbol: ccy.to_string(),
            funding_rate,
            open_interest,
        })
    }

    async fn fetch_okx(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("https://www.okx.com{path}");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse OKX response for {path}"))?;

        if !status.is_success() {
            anyhow::bail!("OKX API returned {} for {}: {}", status, path, body);
        }

        Ok(body)
    }
}
