// =============================================================================
// Provider Adapters — one fetcher per upstream data source
// =============================================================================
//
// Seven independent public APIs feed the scoring pipeline:
//
//   1. Fear & Greed index   — alternative.me
//   2. Global market stats  — CoinGecko
//   3. DEX volumes          — DefiLlama
//   4. DeFi TVL             — DefiLlama
//   5. Pool yields          — DefiLlama
//   6. Stablecoin supplies  — DefiLlama
//   7. Derivatives          — OKX
//
// Every adapter fails soft: an error is logged and surfaces downstream as an
// absent snapshot for that cycle, never as a pipeline failure. The fan-out
// awaits all seven regardless of individual outcomes.

pub mod derivatives;
pub mod dex_volume;
pub mod fear_greed;
pub mod global_market;
pub mod stablecoins;
pub mod tvl;
pub mod yields;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{Clock, TtlCell};

pub use derivatives::{AltFunding, AssetDerivatives, DerivativesProvider, DerivativesSnapshot};
pub use dex_volume::{ChainVolume, DexVolumeProvider, DexVolumeSnapshot};
pub use fear_greed::{FearGreedPoint, FearGreedProvider, FearGreedSnapshot};
pub use global_market::{GlobalMarketProvider, GlobalMarketSnapshot};
pub use stablecoins::{StablecoinAsset, StablecoinProvider, StablecoinSnapshot};
pub use tvl::{TvlProvider, TvlSnapshot};
pub use yields::{YieldPool, YieldsProvider, YieldsSnapshot};

/// Everything the current cycle managed to fetch. An absent field means that
/// source failed or timed out this cycle; scoring skips the categories that
/// depend on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalData {
    pub fear_greed: Option<FearGreedSnapshot>,
    pub global_market: Option<GlobalMarketSnapshot>,
    pub dex_volume: Option<DexVolumeSnapshot>,
    pub tvl: Option<TvlSnapshot>,
    pub yields: Option<YieldsSnapshot>,
    pub stablecoins: Option<StablecoinSnapshot>,
    pub derivatives: Option<DerivativesSnapshot>,
}

/// Per-source freshness cache. One typed cell per provider, all sharing the
/// injected TTL and clock.
pub struct AggregationCache {
    pub fear_greed: TtlCell<FearGreedSnapshot>,
    pub global_market: TtlCell<GlobalMarketSnapshot>,
    pub dex_volume: TtlCell<DexVolumeSnapshot>,
    pub tvl: TtlCell<TvlSnapshot>,
    pub yields: TtlCell<YieldsSnapshot>,
    pub stablecoins: TtlCell<StablecoinSnapshot>,
    pub derivatives: TtlCell<DerivativesSnapshot>,
}

impl AggregationCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            fear_greed: TtlCell::new(ttl, clock.clone()),
            global_market: TtlCell::new(ttl, clock.clone()),
            dex_volume: TtlCell::new(ttl, clock.clone()),
            tvl: TtlCell::new(ttl, clock.clone()),
            yields: TtlCell::new(ttl, clock.clone()),
            stablecoins: TtlCell::new(ttl, clock.clone()),
            derivatives: TtlCell::new(ttl, clock),
        }
    }
}

/// All upstream adapters behind a single handle, sharing one HTTP client.
pub struct MarketDataProviders {
    pub fear_greed: FearGreedProvider,
    pub global_market: GlobalMarketProvider,
    pub dex_volume: DexVolumeProvider,
    pub tvl: TvlProvider,
    pub yields: YieldsProvider,
    pub stablecoins: StablecoinProvider,
    pub derivatives: DerivativesProvider,
}

impl MarketDataProviders {
    pub fn new(alt_instruments: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            fear_greed: FearGreedProvider::with_client(client.clone()),
            global_market: GlobalMarketProvider::with_client(client.clone()),
            dex_volume: DexVolumeProvider::with_client(client.clone()),
            tvl: TvlProvider::with_client(client.clone()),
            yields: YieldsProvider::with_client(client.clone()),
            stablecoins: StablecoinProvider::with_client(client.clone()),
            derivatives: DerivativesProvider::with_client(client, alt_instruments),
        }
    }

    /// Fan out to all seven sources through the cache and settle every one.
    /// Returns the collected data plus human-readable error messages for the
    /// sources that failed this cycle.
    pub async fn fetch_all(&self, cache: &AggregationCache) -> (SignalData, Vec<String>) {
        let (fear_greed, global_market, dex_volume, tvl, yields, stablecoins, derivatives) = tokio::join!(
            cache.fear_greed.get_or_fetch(|| self.fear_greed.fetch()),
            cache.global_market.get_or_fetch(|| self.global_market.fetch()),
            cache.dex_volume.get_or_fetch(|| self.dex_volume.fetch()),
            cache.tvl.get_or_fetch(|| self.tvl.fetch()),
            cache.yields.get_or_fetch(|| self.yields.fetch()),
            cache.stablecoins.get_or_fetch(|| self.stablecoins.fetch()),
            cache.derivatives.get_or_fetch(|| self.derivatives.fetch()),
        );

        let mut errors = Vec::new();
        let data = SignalData {
            fear_greed: settle(&mut errors, "fear_greed", fear_greed),
            global_market: settle(&mut errors, "global_market", global_market),
            dex_volume: settle(&mut errors, "dex_volume", dex_volume),
            tvl: settle(&mut errors, "tvl", tvl),
            yields: settle(&mut errors, "yields", yields),
            stablecoins: settle(&mut errors, "stablecoins", stablecoins),
            derivatives: settle(&mut errors, "derivatives", derivatives),
        };

        (data, errors)
    }
}

/// Convert a fetch result into an optional snapshot, logging and recording
/// the failure.
fn settle<T>(errors: &mut Vec<String>, name: &str, result: anyhow::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(source = name, error = %e, "provider unavailable this cycle");
            errors.push(format!("{name}: {e:#}"));
            None
        }
    }
}
