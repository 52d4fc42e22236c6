// =============================================================================
// Narrative Tables — threshold ladders producing analysis prose
// =============================================================================
//
// Every function here is a pure lookup: one numeric input band selects one
// fixed template. Headlines additionally take a secondary qualifier keyed on
// a different metric, which is what gives consecutive briefs their variety.
//
// Band boundaries are part of the product contract; tests pin each one.

use crate::format::format_usd_coarse;
use crate::providers::YieldPool;

/// Two-level headline: a Fear & Greed band picks the base sentence, a
/// secondary condition appends the qualifying clause.
pub fn headline(fg: u8, dex_change_7d: f64, tvl_change_7d: f64, mc_change_24h: f64) -> String {
    if fg < 25 {
        let mut h = format!("Extreme Fear grips the market at {fg}/100");
        if dex_change_7d > 0.0 {
            h.push_str(" — but DEX volume tells a different story");
        } else {
            h.push_str(" — volume confirms the weakness");
        }
        h
    } else if fg < 40 {
        let mut h = format!("Fear dominates with sentiment at {fg}/100");
        if tvl_change_7d > 0.0 {
            h.push_str(" while TVL quietly climbs");
        } else {
            h.push_str(" as capital exits DeFi");
        }
        h
    } else if fg < 60 {
        let mut h = format!("Market in neutral territory at {fg}/100");
        if mc_change_24h > 0.0 {
            h.push_str(" — slight bullish momentum building");
        } else {
            h.push_str(" — waiting for a catalyst");
        }
        h
    } else if fg < 75 {
        let mut h = format!("Greed rising with sentiment at {fg}/100");
        if dex_change_7d > 10.0 {
            h.push_str(" — volume surge confirms conviction");
        } else {
            h.push_str(" — but volume hasn't caught up yet");
        }
        h
    } else {
        format!("Extreme Greed at {fg}/100 — caution warranted as markets may be overheated")
    }
}

pub fn sentiment_analysis(fg: u8, label: &str) -> String {
    if fg < 20 {
        format!(
            "The Fear & Greed Index has plunged to {fg}, deep into Extreme Fear territory. Historically, these levels have marked significant buying opportunities — but they can also persist during extended downtrends. The market is pricing in maximum pessimism right now."
        )
    } else if fg < 40 {
        format!(
            "Sentiment sits at {fg} ({label}). The market is nervous but not panicking. This is often a transition zone — either fear deepens into capitulation or we see a sentiment reversal. Watch for volume confirmation."
        )
    } else if fg < 60 {
        format!(
            "The Fear & Greed Index reads {fg}, placing us in neutral territory. Neither bulls nor bears have conviction here. This is typically a consolidation zone where the market waits for a catalyst."
        )
    } else if fg < 80 {
        format!(
            "Greed is building at {fg}/100. Market participants are getting confident, which can fuel continued upside — but also sets the stage for a correction when positioning gets too one-sided."
        )
    } else {
        format!(
            "Extreme Greed at {fg}/100 is a warning sign. While momentum can carry prices higher in the short term, history shows these readings often precede sharp pullbacks. Risk management is critical here."
        )
    }
}

pub fn onchain_analysis(total_24h: f64, change_7d: f64) -> String {
    let vol = format_usd_coarse(total_24h);
    if change_7d > 15.0 {
        format!(
            "DEX volume is surging at {vol} in the last 24 hours, up {change_7d:.1}% over the past week. This kind of volume expansion typically signals growing conviction among onchain traders. When volume leads price, it's often a reliable bullish indicator."
        )
    } else if change_7d > 0.0 {
        format!(
            "DEX volume sits at {vol} over the last 24 hours with a modest {change_7d:.1}% increase week-over-week. Volume is trending slightly positive but hasn't reached levels that would signal a strong directional move. The market is active but not euphoric."
        )
    } else {
        format!(
            "DEX volume has contracted to {vol} in 24 hours, declining {:.1}% over the past week. Declining volume often signals reduced conviction and can precede further weakness — or simply reflect a quiet period before the next move.",
            change_7d.abs()
        )
    }
}

pub fn tvl_analysis(total_tvl: f64, change_7d: f64) -> String {
    let tvl = format_usd_coarse(total_tvl);
    if change_7d > 5.0 {
        format!(
            "Total DeFi TVL stands at {tvl}, growing {change_7d:.1}% over the past week. Capital is flowing into DeFi protocols at an accelerating pace — a clear sign of growing confidence in the ecosystem. This usually precedes broader market strength."
        )
    } else if change_7d > 0.0 {
        format!(
            "DeFi TVL is at {tvl} with a {change_7d:.1}% increase over 7 days. Steady capital inflows suggest the DeFi ecosystem remains healthy, though we're not seeing the explosive growth that characterizes bull market peaks."
        )
    } else {
        format!(
            "Total DeFi TVL has declined to {tvl}, shedding {:.1}% over the past week. Capital is leaving DeFi protocols — which could reflect broader risk-off sentiment, yield compression, or rotation into other asset classes.",
            change_7d.abs()
        )
    }
}

pub fn yield_analysis(top_stable: &YieldPool, top_volatile: Option<&YieldPool>) -> String {
    let mut parts = vec![format!(
        "The best stablecoin yield available right now is {:.1}% on {} ({}).",
        top_stable.apy, top_stable.symbol, top_stable.project
    )];

    if top_stable.apy > 8.0 {
        parts.push(
            "Stable yields above 8% are elevated — this typically reflects high demand for leverage in the system, which can be both an opportunity and a risk indicator.".to_string(),
        );
    } else if top_stable.apy > 5.0 {
        parts.push("Stable yields in the 5-8% range are healthy and sustainable.".to_string());
    } else {
        parts.push(
            "Stable yields below 5% suggest low demand for leverage — the market isn't paying much for capital right now.".to_string(),
        );
    }

    if let Some(volatile) = top_volatile {
        parts.push(format!(
            "For risk-tolerant capital, {} on {} is offering {:.0}% APY — high reward but comes with impermanent loss and smart contract risk.",
            volatile.symbol, volatile.project, volatile.apy
        ));
    }

    parts.join(" ")
}

pub fn stablecoin_analysis(total_circulating: f64, change_24h: f64) -> String {
    let mut analysis = format!(
        "Total stablecoin supply sits at {}",
        format_usd_coarse(total_circulating)
    );

    if change_24h > 0.01 {
        analysis.push_str(&format!(
            ", with {} minted in the last 24 hours. Fresh stablecoin minting is one of the most reliable bullish signals — it means new capital is entering the crypto ecosystem. This money needs to go somewhere.",
            format_usd_coarse(total_circulating * change_24h / 100.0)
        ));
    } else if change_24h < -0.01 {
        analysis.push_str(
            ", declining over the past 24 hours. Stablecoin redemptions suggest capital is leaving the ecosystem — a bearish signal for near-term price action.",
        );
    } else {
        analysis.push_str(
            ", holding steady over the last 24 hours. No significant minting or redemption activity suggests the market is in a wait-and-see mode.",
        );
    }

    analysis
}

pub fn macro_analysis(total_market_cap: f64, mc_change_24h: f64, btc_dominance: f64) -> String {
    let direction = if mc_change_24h > 0.0 { "up" } else { "down" };
    let mut analysis = format!(
        "The total crypto market cap is {}, {direction} {:.2}% in the last 24 hours. ",
        format_usd_coarse(total_market_cap),
        mc_change_24h.abs()
    );

    if btc_dominance > 55.0 {
        analysis.push_str(&format!(
            "BTC dominance at {btc_dominance:.1}% is elevated, suggesting capital is concentrated in Bitcoin rather than flowing into alts. This is typical of risk-off environments or early bull market phases where BTC leads. Alt season typically begins when dominance drops below 50%."
        ));
    } else if btc_dominance > 45.0 {
        analysis.push_str(&format!(
            "BTC dominance at {btc_dominance:.1}% is in the normal range. Capital is somewhat balanced between BTC and alts, with neither extreme concentration nor alt-season dynamics."
        ));
    } else {
        analysis.push_str(&format!(
            "BTC dominance at {btc_dominance:.1}% is low, suggesting capital is rotating heavily into altcoins. This is characteristic of alt season — but also the phase where risk is highest as speculative excess builds."
        ));
    }

    analysis
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- headline ---------------------------------------------------------

    #[test]
    fn headline_extreme_fear_band() {
        let h = headline(15, 3.0, 0.0, 0.0);
        assert!(h.starts_with("Extreme Fear grips the market at 15/100"));
        assert!(h.ends_with("but DEX volume tells a different story"));

        let h = headline(24, -3.0, 0.0, 0.0);
        assert!(h.ends_with("volume confirms the weakness"));
    }

    #[test]
    fn headline_fear_band_qualifier_is_tvl() {
        assert!(headline(25, 0.0, 1.0, 0.0).contains("while TVL quietly climbs"));
        assert!(headline(39, 0.0, -1.0, 0.0).contains("as capital exits DeFi"));
    }

    #[test]
    fn headline_neutral_band_qualifier_is_market_cap() {
        assert!(headline(40, 0.0, 0.0, 0.5).contains("slight bullish momentum building"));
        assert!(headline(59, 0.0, 0.0, -0.5).contains("waiting for a catalyst"));
    }

    #[test]
    fn headline_greed_band_needs_double_digit_volume() {
        assert!(headline(60, 10.1, 0.0, 0.0).contains("volume surge confirms conviction"));
        assert!(headline(74, 10.0, 0.0, 0.0).contains("volume hasn't caught up yet"));
    }

    #[test]
    fn headline_extreme_greed_band() {
        let h = headline(75, 50.0, 50.0, 50.0);
        assert_eq!(
            h,
            "Extreme Greed at 75/100 — caution warranted as markets may be overheated"
        );
    }

    // ---- section prose ----------------------------------------------------

    #[test]
    fn sentiment_bands() {
        assert!(sentiment_analysis(19, "Extreme Fear").contains("plunged to 19"));
        assert!(sentiment_analysis(20, "Fear").contains("nervous but not panicking"));
        assert!(sentiment_analysis(40, "Neutral").contains("neutral territory"));
        assert!(sentiment_analysis(60, "Greed").contains("Greed is building"));
        assert!(sentiment_analysis(80, "Extreme Greed").contains("warning sign"));
    }

    #[test]
    fn onchain_bands() {
        assert!(onchain_analysis(18e9, 15.1).contains("surging"));
        assert!(onchain_analysis(18e9, 15.0).contains("modest"));
        assert!(onchain_analysis(18e9, 0.0).contains("contracted"));
        // Contraction prose reports the magnitude, not the sign.
        assert!(onchain_analysis(18e9, -7.5).contains("declining 7.5%"));
    }

    #[test]
    fn tvl_bands() {
        assert!(tvl_analysis(95e9, 5.1).contains("accelerating pace"));
        assert!(tvl_analysis(95e9, 0.5).contains("Steady capital inflows"));
        assert!(tvl_analysis(95e9, -2.5).contains("shedding 2.5%"));
    }

    #[test]
    fn yield_bands() {
        let pool = |apy: f64| YieldPool {
            project: "aave-v3".to_string(),
            symbol: "USDC".to_string(),
            chain: "Ethereum".to_string(),
            apy,
            tvl_usd: 50e6,
        };
        assert!(yield_analysis(&pool(8.5), None).contains("above 8% are elevated"));
        assert!(yield_analysis(&pool(6.0), None).contains("5-8% range"));
        assert!(yield_analysis(&pool(3.0), None).contains("below 5%"));

        let with_volatile = yield_analysis(&pool(6.0), Some(&pool(42.0)));
        assert!(with_volatile.contains("risk-tolerant capital"));
        assert!(with_volatile.contains("42% APY"));
    }

    #[test]
    fn stablecoin_bands() {
        assert!(stablecoin_analysis(160e9, 0.5).contains("minted in the last 24 hours"));
        assert!(stablecoin_analysis(160e9, -0.5).contains("redemptions"));
        assert!(stablecoin_analysis(160e9, 0.0).contains("holding steady"));
        assert!(stablecoin_analysis(160e9, 0.01).contains("holding steady"));
    }

    #[test]
    fn stablecoin_minting_amount_is_derived_from_change() {
        // 0.5% of $160B = $800M
        assert!(stablecoin_analysis(160e9, 0.5).contains("$800M minted"));
    }

    #[test]
    fn macro_bands() {
        assert!(macro_analysis(2.4e12, 1.0, 55.1).contains("is elevated"));
        assert!(macro_analysis(2.4e12, 1.0, 50.0).contains("normal range"));
        assert!(macro_analysis(2.4e12, 1.0, 44.0).contains("is low"));
        assert!(macro_analysis(2.4e12, -1.25, 50.0).contains("down 1.25%"));
    }
}
