// =============================================================================
// Central Application State — Signal Nexus
// =============================================================================
//
// The single source of truth for the engine. The refresh loop writes one
// `IntelSnapshot` per cycle; the REST layer reads whatever is latest.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::brief::Brief;
use crate::cache::SystemClock;
use crate::providers::{AggregationCache, MarketDataProviders, SignalData};
use crate::runtime_config::RuntimeConfig;
use crate::scoring::LeverageReport;
use crate::types::{Category, CategoryScore, Sentiment};

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Everything one refresh cycle produced. Purely derived data; replaced
/// wholesale on the next cycle.
#[derive(Debug, Clone, Serialize)]
pub struct IntelSnapshot {
    /// Generation time, epoch milliseconds.
    pub generated_at: i64,

    pub raw: SignalData,
    pub scores: BTreeMap<Category, CategoryScore>,

    /// Unweighted mean of present category scores (canonical).
    pub composite_score: u8,

    /// Hand-tuned weighted mean, kept as a documented alternative.
    pub weighted_composite_score: u8,

    pub sentiment: Sentiment,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage: Option<LeverageReport>,

    pub brief: Brief,
}

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    pub providers: MarketDataProviders,
    pub cache: AggregationCache,

    pub latest: RwLock<Option<IntelSnapshot>>,
    pub brief_history: RwLock<Vec<Brief>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Instant when the engine was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration. The
    /// returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        let ttl = std::time::Duration::from_secs(config.cache_ttl_secs);
        let providers = MarketDataProviders::new(config.alt_instruments.clone());
        let cache = AggregationCache::new(ttl, Arc::new(SystemClock));

        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            providers,
            cache,
            latest: RwLock::new(None),
            brief_history: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted when the limit is
    /// reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Snapshot Storage ────────────────────────────────────────────────

    /// Store the result of a refresh cycle and append its brief to the
    /// bounded history ring (most recent last).
    pub fn store_snapshot(&self, snapshot: IntelSnapshot) {
        let cap = self.runtime_config.read().brief_history_cap;

        {
            let mut history = self.brief_history.write();
            history.push(snapshot.brief.clone());
            while history.len() > cap {
                history.remove(0);
            }
        }

        *self.latest.write() = Some(snapshot);
        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build the complete, serialisable payload for `GET /api/v1/state`.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let latest = self.latest.read().clone();

        let sources = latest.as_ref().map(|intel| SourceAvailability {
            fear_greed: intel.raw.fear_greed.is_some(),
            global_market: intel.raw.global_market.is_some(),
            dex_volume: intel.raw.dex_volume.is_some(),
            tvl: intel.raw.tvl.is_some(),
            yields: intel.raw.yields.is_some(),
            stablecoins: intel.raw.stablecoins.is_some(),
            derivatives: intel.raw.derivatives.is_some(),
        });

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            sources,
            intel: latest,
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable snapshot types for the dashboard
// =============================================================================

/// Full engine state snapshot sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,

    /// Which upstream sources delivered data in the latest cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourceAvailability>,

    /// Latest intelligence snapshot; absent until the first cycle completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intel: Option<IntelSnapshot>,

    pub recent_errors: Vec<ErrorRecord>,
}

/// Per-source success flags for the latest cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAvailability {
    pub fear_greed: bool,
    pub global_market: bool,
    pub dex_volume: bool,
    pub tvl: bool,
    pub yields: bool,
    pub stablecoins: bool,
    pub derivatives: bool,
}
