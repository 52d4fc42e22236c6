// =============================================================================
// Leverage Analyzer — positioning risk from derivatives data
// =============================================================================
//
// Produces a supplementary 0-100 leverage score from BTC perpetual-futures
// data. High funding and one-sided positioning both read as risk:
//
//   funding_score = max(0, 100 - |funding%| * 2000)   0.05% => 0
//   ls_score      = max(0, 100 - |ratio - 1| * 100)   1.0   => 100
//   taker_score   = 60 inside (0.9, 1.1), 70 above parity, else 40
//   score         = round(funding*0.4 + ls*0.3 + taker*0.3)
//
// Signal thresholds:
//   funding > +0.03%  =>  bearish   (longs paying too much)
//   funding < -0.01%  =>  bullish   (shorts paying, squeeze setup)
//   taker ratio > 1.1 =>  bullish,  < 0.9 => bearish

use serde::{Deserialize, Serialize};

use crate::format::format_usd_coarse;
use crate::providers::{AssetDerivatives, DerivativesSnapshot};
use crate::types::{Metric, PositioningBias, Signal};

/// Leverage score, positioning bias, and supporting narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageReport {
    /// Bounded leverage score in [0, 100]. Higher means healthier (less
    /// crowded) positioning.
    pub score: u8,

    pub bias: PositioningBias,
    pub funding_signal: Signal,
    pub taker_signal: Signal,

    /// Most recent hourly long/short ratio (1.0 when history is empty).
    pub latest_ls: f64,

    /// Concatenated funding / positioning / taker / OI narrative.
    pub narrative: String,

    pub metrics: Vec<Metric>,
}

/// Analyze a derivatives snapshot into a leverage report. Pure and
/// deterministic; BTC drives the score, ETH appears as context in the
/// metrics table.
pub fn analyze_leverage(data: &DerivativesSnapshot) -> LeverageReport {
    let btc = &data.btc;
    let latest_ls = btc.long_short_ratio.last().copied().unwrap_or(1.0);

    let funding = funding_score(btc.funding_rate);
    let ls = ls_score(latest_ls);
    let taker = taker_score(btc.taker_ratio);
    let score = (funding * 0.4 + ls * 0.3 + taker * 0.3).round() as u8;

    let bias = if latest_ls > 1.3 {
        PositioningBias::LongHeavy
    } else if latest_ls < 0.8 {
        PositioningBias::ShortHeavy
    } else {
        PositioningBias::Balanced
    };

    let funding_signal = if btc.funding_rate > 0.03 {
        Signal::Bearish
    } else if btc.funding_rate < -0.01 {
        Signal::Bullish
    } else {
        Signal::Neutral
    };

    let taker_signal = if btc.taker_ratio > 1.1 {
        Signal::Bullish
    } else if btc.taker_ratio < 0.9 {
        Signal::Bearish
    } else {
        Signal::Neutral
    };

    LeverageReport {
        score,
        bias,
        funding_signal,
        taker_signal,
        latest_ls,
        narrative: narrative(btc, latest_ls, bias),
        metrics: build_metrics(data, latest_ls, funding_signal, taker_signal, bias),
    }
}

fn funding_score(funding_rate_pct: f64) -> f64 {
    (100.0 - funding_rate_pct.abs() * 2000.0).max(0.0)
}

fn ls_score(latest_ls: f64) -> f64 {
    (100.0 - (latest_ls - 1.0).abs() * 100.0).max(0.0)
}

fn taker_score(taker_ratio: f64) -> f64 {
    if taker_ratio > 0.9 && taker_ratio < 1.1 {
        60.0
    } else if taker_ratio > 1.0 {
        70.0
    } else {
        40.0
    }
}

/// Assemble the narrative from four independent threshold trees: funding,
/// long/short positioning, taker flow, and open interest magnitude.
fn narrative(btc: &AssetDerivatives, latest_ls: f64, bias: PositioningBias) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    let rate = btc.funding_rate;
    if rate.abs() < 0.005 {
        parts.push(format!(
            "BTC funding rate at {rate:.4}% is neutral — no strong directional pressure from leveraged traders."
        ));
    } else if rate > 0.02 {
        parts.push(format!(
            "BTC funding rate at {rate:.4}% is elevated — longs are paying shorts, indicating bullish leverage is building. Historically, rates above 0.03% precede mean-reversion moves."
        ));
    } else if rate < -0.005 {
        parts.push(format!(
            "BTC funding rate is negative at {rate:.4}% — shorts are paying longs. This often precedes short squeezes as negative funding becomes expensive to maintain."
        ));
    } else {
        let lean = if rate > 0.0 { "positive" } else { "negative" };
        let side = if rate > 0.0 { "long" } else { "short" };
        parts.push(format!(
            "BTC funding rate at {rate:.4}% is slightly {lean} — mild {side} bias in the market."
        ));
    }

    if latest_ls > 1.4 {
        parts.push(format!(
            "The long/short ratio at {latest_ls:.2} shows heavy long positioning. When the crowd is this one-sided, a flush of overleveraged longs becomes likely."
        ));
    } else if latest_ls < 0.7 {
        parts.push(format!(
            "The long/short ratio at {latest_ls:.2} shows heavy short positioning — potential fuel for a short squeeze."
        ));
    } else {
        let posture = match bias {
            PositioningBias::Balanced => "balanced".to_string(),
            other => other.to_string().to_lowercase(),
        };
        parts.push(format!(
            "Long/short ratio at {latest_ls:.2} is relatively {posture} — no extreme positioning."
        ));
    }

    if btc.taker_ratio < 0.85 {
        parts.push(format!(
            "Sellers are dominating taker flow (buy/sell ratio: {:.2}). Market sells typically indicate conviction to the downside.",
            btc.taker_ratio
        ));
    } else if btc.taker_ratio > 1.15 {
        parts.push(format!(
            "Buyers are aggressively taking (buy/sell ratio: {:.2}). Strong taker buying often front-runs moves higher.",
            btc.taker_ratio
        ));
    }

    let oi_billions = btc.open_interest / 1e9;
    let oi_clause = if oi_billions > 5.0 {
        "Elevated OI means more leveraged positions at risk during volatility."
    } else {
        "OI levels are moderate."
    };
    parts.push(format!(
        "BTC open interest sits at ${oi_billions:.1}B on OKX. {oi_clause}"
    ));

    parts.join(" ")
}

fn build_metrics(
    data: &DerivativesSnapshot,
    latest_ls: f64,
    funding_signal: Signal,
    taker_signal: Signal,
    bias: PositioningBias,
) -> Vec<Metric> {
    let btc = &data.btc;
    let eth = &data.eth;

    let eth_funding_signal = if eth.funding_rate > 0.03 {
        Signal::Bearish
    } else if eth.funding_rate < -0.01 {
        Signal::Bullish
    } else {
        Signal::Neutral
    };

    // Display shows 0.00 on empty history, while the signal falls back to a
    // balanced 1.0.
    let ls_display = btc.long_short_ratio.last().copied().unwrap_or(0.0);
    let ls_signal = if latest_ls > 1.3 {
        Signal::Bearish
    } else {
        Signal::Neutral
    };

    let bias_signal = match bias {
        PositioningBias::LongHeavy => Signal::Bearish,
        PositioningBias::ShortHeavy => Signal::Bullish,
        PositioningBias::Balanced => Signal::Neutral,
    };

    vec![
        Metric::new(
            "BTC FUNDING RATE",
            format!("{:.4}%", btc.funding_rate),
            funding_signal,
        ),
        Metric::new(
            "ETH FUNDING RATE",
            format!("{:.4}%", eth.funding_rate),
            eth_funding_signal,
        ),
        Metric::new(
            "BTC OPEN INTEREST",
            format_usd_coarse(btc.open_interest),
            Signal::Neutral,
        ),
        Metric::new("BTC L/S RATIO", format!("{ls_display:.2}"), ls_signal),
        Metric::new(
            "TAKER BUY/SELL",
            format!("{:.2}", btc.taker_ratio),
            taker_signal,
        ),
        Metric::new(
            "BTC 24H VOLUME",
            format_usd_coarse(btc.volume_24h),
            Signal::Neutral,
        ),
        Metric::new("MARKET BIAS", bias.to_string(), bias_signal),
    ]
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn asset(
        funding_rate: f64,
        open_interest: f64,
        ls_history: Vec<f64>,
        taker_ratio: f64,
    ) -> AssetDerivatives {
        AssetDerivatives {
            funding_rate,
            open_interest,
            volume_24h: 1_000_000_000.0,
            long_short_ratio: ls_history,
            taker_buy_vol: taker_ratio,
            taker_sell_vol: 1.0,
            taker_ratio,
        }
    }

    fn snapshot(btc: AssetDerivatives) -> DerivativesSnapshot {
        DerivativesSnapshot {
            btc,
            eth: asset(0.01, 1e9, vec![1.0], 1.0),
            top_coins: Vec::new(),
        }
    }

    // ---- sub-score boundaries --------------------------------------------

    #[test]
    fn funding_score_zero_at_5bps() {
        // A funding rate magnitude of 0.05% drives the sub-score to exactly 0.
        assert_eq!(funding_score(0.05), 0.0);
        assert_eq!(funding_score(-0.05), 0.0);
        assert_eq!(funding_score(0.0), 100.0);
        assert_eq!(funding_score(0.06), 0.0);
    }

    #[test]
    fn ls_score_perfect_at_parity() {
        assert_eq!(ls_score(1.0), 100.0);
        assert_eq!(ls_score(1.5), 50.0);
        assert_eq!(ls_score(0.5), 50.0);
        assert_eq!(ls_score(3.0), 0.0);
    }

    #[test]
    fn taker_score_bands() {
        assert_eq!(taker_score(1.0), 60.0);
        assert_eq!(taker_score(0.95), 60.0);
        assert_eq!(taker_score(1.09), 60.0);
        assert_eq!(taker_score(1.2), 70.0);
        assert_eq!(taker_score(0.8), 40.0);
        assert_eq!(taker_score(0.9), 40.0);
    }

    // ---- full report ------------------------------------------------------

    #[test]
    fn long_heavy_scenario() {
        // funding 0.04% / LS 1.5 / taker 1.0:
        //   funding_score = 100 - 0.04*2000 = 20
        //   ls_score      = 100 - 0.5*100   = 50
        //   taker_score   = 60
        //   score = round(20*0.4 + 50*0.3 + 60*0.3) = 41
        let report = analyze_leverage(&snapshot(asset(0.04, 1e9, vec![1.2, 1.5], 1.0)));

        assert_eq!(report.bias, PositioningBias::LongHeavy);
        assert_eq!(report.funding_signal, Signal::Bearish);
        assert_eq!(report.taker_signal, Signal::Neutral);
        assert_eq!(report.score, 41);
        assert!((report.latest_ls - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn balanced_market_scores_high() {
        let report = analyze_leverage(&snapshot(asset(0.0, 1e9, vec![1.0], 1.0)));
        // 100*0.4 + 100*0.3 + 60*0.3 = 88
        assert_eq!(report.score, 88);
        assert_eq!(report.bias, PositioningBias::Balanced);
        assert_eq!(report.funding_signal, Signal::Neutral);
    }

    #[test]
    fn short_heavy_bias_and_squeeze_signal() {
        let report = analyze_leverage(&snapshot(asset(-0.02, 1e9, vec![0.75], 0.8)));
        assert_eq!(report.bias, PositioningBias::ShortHeavy);
        assert_eq!(report.funding_signal, Signal::Bullish);
        assert_eq!(report.taker_signal, Signal::Bearish);
    }

    #[test]
    fn empty_ls_history_falls_back_to_parity() {
        let report = analyze_leverage(&snapshot(asset(0.0, 1e9, Vec::new(), 1.0)));
        assert!((report.latest_ls - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.bias, PositioningBias::Balanced);
        // Display metric shows 0.00 when there is no history at all.
        let ls_metric = report
            .metrics
            .iter()
            .find(|m| m.label == "BTC L/S RATIO")
            .unwrap();
        assert_eq!(ls_metric.value, "0.00");
    }

    // ---- narrative decision trees ----------------------------------------

    #[test]
    fn narrative_flags_elevated_oi() {
        let report = analyze_leverage(&snapshot(asset(0.0, 6e9, vec![1.0], 1.0)));
        assert!(report.narrative.contains("Elevated OI"));

        let calm = analyze_leverage(&snapshot(asset(0.0, 2e9, vec![1.0], 1.0)));
        assert!(calm.narrative.contains("OI levels are moderate."));
    }

    #[test]
    fn narrative_covers_each_funding_branch() {
        let neutral = analyze_leverage(&snapshot(asset(0.001, 1e9, vec![1.0], 1.0)));
        assert!(neutral.narrative.contains("is neutral"));

        let elevated = analyze_leverage(&snapshot(asset(0.03, 1e9, vec![1.0], 1.0)));
        assert!(elevated.narrative.contains("is elevated"));

        let negative = analyze_leverage(&snapshot(asset(-0.01, 1e9, vec![1.0], 1.0)));
        assert!(negative.narrative.contains("is negative"));

        let mild = analyze_leverage(&snapshot(asset(0.01, 1e9, vec![1.0], 1.0)));
        assert!(mild.narrative.contains("slightly positive"));
    }

    #[test]
    fn narrative_mentions_taker_flow_only_at_extremes() {
        let quiet = analyze_leverage(&snapshot(asset(0.0, 1e9, vec![1.0], 1.0)));
        assert!(!quiet.narrative.contains("taker flow"));
        assert!(!quiet.narrative.contains("aggressively taking"));

        let selling = analyze_leverage(&snapshot(asset(0.0, 1e9, vec![1.0], 0.8)));
        assert!(selling.narrative.contains("Sellers are dominating taker flow"));

        let buying = analyze_leverage(&snapshot(asset(0.0, 1e9, vec![1.0], 1.2)));
        assert!(buying.narrative.contains("Buyers are aggressively taking"));
    }

    #[test]
    fn report_is_deterministic() {
        let snap = snapshot(asset(0.025, 4e9, vec![1.1, 1.45], 1.16));
        let a = serde_json::to_string(&analyze_leverage(&snap)).unwrap();
        let b = serde_json::to_string(&analyze_leverage(&snap)).unwrap();
        assert_eq!(a, b);
    }
}
