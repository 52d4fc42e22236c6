// =============================================================================
// Scoring Engine — per-category signal scores from provider snapshots
// =============================================================================
//
// Each category has a fixed mapping from its dominant input to a 0-100 score:
//
//   Market Sentiment  =  fear & greed index, passthrough
//   Onchain Activity  =  clamp((dex_24h / $20B) * 100)
//   DeFi Yields       =  clamp(50 + tvl_change_7d * 5)
//   Macro Pulse       =  clamp(50 + market_cap_change_24h * 5)
//   Stablecoins       =  clamp(50 + supply_change_24h * 20)
//   Leverage          =  derivatives analyzer score (optional sixth category)
//
// The stablecoin multiplier is deliberately hotter: supply flow percentages
// run an order of magnitude smaller than the other deltas.
//
// A category whose required snapshots are missing is omitted from the map
// entirely; it is never zero-filled and never enters a composite denominator.

use std::collections::BTreeMap;

use crate::format::{format_count, format_usd, signed_pct};
use crate::providers::SignalData;
use crate::scoring::LeverageReport;
use crate::types::{clamp_score, Category, CategoryScore, Metric, Signal};

/// Score every category with available data. Pure and deterministic; map
/// iteration order is the fixed category order.
pub fn calculate_scores(
    data: &SignalData,
    leverage: Option<&LeverageReport>,
) -> BTreeMap<Category, CategoryScore> {
    let mut scores = BTreeMap::new();

    if let Some(fg) = &data.fear_greed {
        let signal = if fg.value > 60 {
            Signal::Bullish
        } else if fg.value < 40 {
            Signal::Bearish
        } else {
            Signal::Neutral
        };

        scores.insert(
            Category::MarketSentiment,
            CategoryScore {
                score: fg.value.min(100),
                metrics: vec![Metric::new(
                    "FEAR & GREED INDEX",
                    format!("{} — {}", fg.value, fg.label),
                    signal,
                )],
            },
        );
    }

    if let (Some(dex), Some(gm)) = (&data.dex_volume, &data.global_market) {
        // $20B of 24h DEX volume maps to a perfect score.
        let score = clamp_score(dex.total_24h / 20_000_000_000.0 * 100.0);

        scores.insert(
            Category::OnchainActivity,
            CategoryScore {
                score,
                metrics: vec![
                    Metric::new(
                        "TOTAL DEX VOLUME (24H)",
                        format_usd(dex.total_24h),
                        Signal::from_sign(dex.change_24h),
                    )
                    .with_change(dex.change_24h),
                    Metric::new(
                        "VOLUME CHANGE (7D)",
                        signed_pct(dex.change_7d, 1),
                        Signal::from_sign(dex.change_7d),
                    ),
                    Metric::new(
                        "TOTAL MARKET CAP",
                        format_usd(gm.total_market_cap),
                        Signal::from_sign(gm.market_cap_change_24h),
                    )
                    .with_change(gm.market_cap_change_24h),
                    Metric::new(
                        "ACTIVE CRYPTOCURRENCIES",
                        format_count(gm.active_cryptos),
                        Signal::Neutral,
                    ),
                ],
            },
        );
    }

    if let (Some(yields), Some(tvl)) = (&data.yields, &data.tvl) {
        let score = clamp_score(50.0 + tvl.change_7d * 5.0);

        let mut metrics = vec![Metric::new(
            "TOTAL DEFI TVL",
            format_usd(tvl.total_tvl),
            Signal::from_sign(tvl.change_7d),
        )
        .with_change(tvl.change_7d)];

        for pool in yields.stable_yields.iter().take(2) {
            metrics.push(Metric::new(
                format!("TOP STABLE: {}", pool.project.to_uppercase()),
                format!("{} — {:.1}% APY", pool.symbol, pool.apy),
                if pool.apy > 5.0 {
                    Signal::Bullish
                } else {
                    Signal::Neutral
                },
            ));
        }
        for pool in yields.volatile_yields.iter().take(2) {
            metrics.push(Metric::new(
                format!("TOP YIELD: {}", pool.project.to_uppercase()),
                format!("{} — {:.1}% APY", pool.symbol, pool.apy),
                Signal::Bullish,
            ));
        }

        scores.insert(Category::DefiYields, CategoryScore { score, metrics });
    }

    if let Some(gm) = &data.global_market {
        let mc_change = gm.market_cap_change_24h;
        let score = clamp_score(50.0 + mc_change * 5.0);

        scores.insert(
            Category::MacroPulse,
            CategoryScore {
                score,
                metrics: vec![
                    Metric::new(
                        "BTC DOMINANCE",
                        format!("{:.1}%", gm.btc_dominance),
                        Signal::Neutral,
                    ),
                    Metric::new(
                        "ETH DOMINANCE",
                        format!("{:.1}%", gm.eth_dominance),
                        Signal::Neutral,
                    ),
                    Metric::new(
                        "MARKET CAP (24H)",
                        signed_pct(mc_change, 2),
                        Signal::from_sign(mc_change),
                    ),
                    Metric::new(
                        "TOTAL VOLUME (24H)",
                        format_usd(gm.total_volume_24h),
                        Signal::Neutral,
                    ),
                ],
            },
        );
    }

    if let Some(sc) = &data.stablecoins {
        let score = clamp_score(50.0 + sc.change_24h * 20.0);

        let mut metrics = vec![Metric::new(
            "TOTAL STABLECOIN SUPPLY",
            format_usd(sc.total_circulating),
            Signal::from_sign(sc.change_24h),
        )
        .with_change(sc.change_24h)];

        for asset in sc.top5.iter().take(3) {
            metrics.push(
                Metric::new(
                    asset.symbol.clone(),
                    format_usd(asset.circulating),
                    Signal::from_change(asset.change_24h),
                )
                .with_change(asset.change_24h),
            );
        }

        scores.insert(Category::Stablecoins, CategoryScore { score, metrics });
    }

    if let Some(report) = leverage {
        scores.insert(
            Category::Leverage,
            CategoryScore {
                score: report.score,
                metrics: report.metrics.clone(),
            },
        );
    }

    scores
}

/// Unweighted arithmetic mean of all present category scores, rounded.
/// Falls back to a neutral 50 when no category has data. This is the
/// canonical composite used by the brief synthesizer.
pub fn composite_score(scores: &BTreeMap<Category, CategoryScore>) -> u8 {
    if scores.is_empty() {
        return 50;
    }
    let sum: u32 = scores.values().map(|s| s.score as u32).sum();
    (sum as f64 / scores.len() as f64).round() as u8
}

/// Hand-tuned weighted mean over the present categories, renormalized by the
/// sum of the weights actually used. Also falls back to 50 when empty. Kept
/// alongside the unweighted mean as a documented alternative, not a silent
/// replacement.
pub fn weighted_composite_score(scores: &BTreeMap<Category, CategoryScore>) -> u8 {
    if scores.is_empty() {
        return 50;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (category, score) in scores {
        let w = category.weight();
        weighted_sum += score.score as f64 * w;
        total_weight += w;
    }

    (weighted_sum / total_weight).round() as u8
}
