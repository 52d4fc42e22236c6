// =============================================================================
// Shared types used across the Signal Nexus intelligence engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Three-valued directional classification attached to a metric or category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

impl Signal {
    /// Two-way classification from a directional change: strictly positive is
    /// bullish, everything else (including exactly zero) is bearish.
    pub fn from_sign(change: f64) -> Self {
        if change > 0.0 {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }

    /// Three-way classification: positive bullish, negative bearish, zero
    /// neutral.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Self::Bullish
        } else if change < 0.0 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Four-tier sentiment label derived from a 0-100 score.
///
/// The ladder is the single source of truth for every place a score is turned
/// into a label (composite, leverage, ring displays):
///
///   score >= 70  =>  BULLISH
///   score >= 50  =>  NEUTRAL
///   score >= 30  =>  CAUTIOUS
///   otherwise    =>  BEARISH
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Neutral,
    Cautious,
    Bearish,
}

impl Sentiment {
    /// Classify a clamped 0-100 score on the four-tier ladder.
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            Self::Bullish
        } else if score >= 50 {
            Self::Neutral
        } else if score >= 30 {
            Self::Cautious
        } else {
            Self::Bearish
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Cautious => write!(f, "CAUTIOUS"),
            Self::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Crowd positioning classification from the long/short ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositioningBias {
    #[serde(rename = "LONG HEAVY")]
    LongHeavy,
    #[serde(rename = "SHORT HEAVY")]
    ShortHeavy,
    #[serde(rename = "BALANCED")]
    Balanced,
}

impl std::fmt::Display for PositioningBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LongHeavy => write!(f, "LONG HEAVY"),
            Self::ShortHeavy => write!(f, "SHORT HEAVY"),
            Self::Balanced => write!(f, "BALANCED"),
        }
    }
}

/// Closed set of signal categories.
///
/// The enum replaces the display-name strings that would otherwise be threaded
/// through the scoring engine and brief synthesizer as map keys. Ordering is
/// the fixed presentation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    #[serde(rename = "Market Sentiment")]
    MarketSentiment,
    #[serde(rename = "Onchain Activity")]
    OnchainActivity,
    #[serde(rename = "DeFi Yields")]
    DefiYields,
    #[serde(rename = "Macro Pulse")]
    MacroPulse,
    #[serde(rename = "Stablecoins")]
    Stablecoins,
    #[serde(rename = "Leverage")]
    Leverage,
}

impl Category {
    /// Display title, matching the serialized map key.
    pub fn title(&self) -> &'static str {
        match self {
            Self::MarketSentiment => "Market Sentiment",
            Self::OnchainActivity => "Onchain Activity",
            Self::DefiYields => "DeFi Yields",
            Self::MacroPulse => "Macro Pulse",
            Self::Stablecoins => "Stablecoins",
            Self::Leverage => "Leverage",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::MarketSentiment => "🌡️",
            Self::OnchainActivity => "📊",
            Self::DefiYields => "💰",
            Self::MacroPulse => "🔮",
            Self::Stablecoins => "💵",
            Self::Leverage => "⚖️",
        }
    }

    /// Fixed weight used by the hand-tuned weighted composite.
    ///
    /// Categories without an entry in the original weight table fall back to
    /// 0.15; those fallbacks are written out explicitly here.
    pub fn weight(&self) -> f64 {
        match self {
            Self::MarketSentiment => 0.20,
            Self::OnchainActivity => 0.18,
            Self::DefiYields => 0.10,
            Self::MacroPulse => 0.15,
            Self::Stablecoins => 0.15,
            Self::Leverage => 0.15,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// One labeled, display-ready data point inside a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,

    /// Pre-formatted for display (e.g. "$14.2B", "+1.2%").
    pub value: String,

    /// Percent change backing the value, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,

    pub signal: Signal,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>, signal: Signal) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            change: None,
            signal,
        }
    }

    pub fn with_change(mut self, change: f64) -> Self {
        self.change = Some(change);
        self
    }
}

/// Score and supporting metrics for a single category. Rebuilt from scratch on
/// every scoring pass; holds no reference back to the provider snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Bounded signal score in [0, 100].
    pub score: u8,
    pub metrics: Vec<Metric>,
}

/// Clamp a raw score into [0, 100] and round to the nearest integer.
pub fn clamp_score(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- Sentiment ladder ------------------------------------------------

    #[test]
    fn sentiment_ladder_boundaries() {
        assert_eq!(Sentiment::from_score(70), Sentiment::Bullish);
        assert_eq!(Sentiment::from_score(69), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(50), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(49), Sentiment::Cautious);
        assert_eq!(Sentiment::from_score(30), Sentiment::Cautious);
        assert_eq!(Sentiment::from_score(29), Sentiment::Bearish);
        assert_eq!(Sentiment::from_score(100), Sentiment::Bullish);
        assert_eq!(Sentiment::from_score(0), Sentiment::Bearish);
    }

    #[test]
    fn sentiment_ladder_monotonic() {
        // Rank each tier and verify the label never decreases as the score rises.
        fn rank(s: Sentiment) -> u8 {
            match s {
                Sentiment::Bearish => 0,
                Sentiment::Cautious => 1,
                Sentiment::Neutral => 2,
                Sentiment::Bullish => 3,
            }
        }
        let mut prev = rank(Sentiment::from_score(0));
        for score in 1..=100u8 {
            let cur = rank(Sentiment::from_score(score));
            assert!(cur >= prev, "ladder regressed at score {score}");
            prev = cur;
        }
    }

    // ---- Signal helpers --------------------------------------------------

    #[test]
    fn signal_from_sign_is_two_way() {
        assert_eq!(Signal::from_sign(0.1), Signal::Bullish);
        assert_eq!(Signal::from_sign(0.0), Signal::Bearish);
        assert_eq!(Signal::from_sign(-0.1), Signal::Bearish);
    }

    #[test]
    fn signal_from_change_is_three_way() {
        assert_eq!(Signal::from_change(0.1), Signal::Bullish);
        assert_eq!(Signal::from_change(0.0), Signal::Neutral);
        assert_eq!(Signal::from_change(-0.1), Signal::Bearish);
    }

    #[test]
    fn signal_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Signal::Bullish).unwrap(), "\"bullish\"");
        assert_eq!(
            serde_json::to_string(&Sentiment::Cautious).unwrap(),
            "\"CAUTIOUS\""
        );
        assert_eq!(
            serde_json::to_string(&PositioningBias::LongHeavy).unwrap(),
            "\"LONG HEAVY\""
        );
    }

    // ---- clamp_score -----------------------------------------------------

    #[test]
    fn clamp_score_bounds() {
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(0.0), 0);
        assert_eq!(clamp_score(49.5), 50);
        assert_eq!(clamp_score(100.0), 100);
        assert_eq!(clamp_score(250.0), 100);
    }

    #[test]
    fn category_serializes_as_display_title() {
        let json = serde_json::to_string(&Category::OnchainActivity).unwrap();
        assert_eq!(json, "\"Onchain Activity\"");
        assert_eq!(Category::DefiYields.title(), "DeFi Yields");
    }

    #[test]
    fn category_order_is_presentation_order() {
        let mut cats = vec![
            Category::Leverage,
            Category::MarketSentiment,
            Category::Stablecoins,
        ];
        cats.sort();
        assert_eq!(
            cats,
            vec![
                Category::MarketSentiment,
                Category::Stablecoins,
                Category::Leverage
            ]
        );
    }
}
