// =============================================================================
// Refresh Orchestrator — one full fetch / score / synthesize cycle
// =============================================================================
//
// Fetching goes through the per-source cache, so a forced refresh inside the
// TTL window recomputes from cached snapshots and produces identical output
// (modulo the timestamp). Scoring and synthesis are pure and run on whatever
// subset of sources delivered.

use chrono::Utc;
use tracing::info;

use crate::app_state::{AppState, IntelSnapshot};
use crate::brief::generate_brief;
use crate::scoring::{
    analyze_leverage, calculate_scores, composite_score, weighted_composite_score,
};
use crate::types::Sentiment;

/// Run one refresh cycle and store the result in `state`.
pub async fn run_refresh_cycle(state: &AppState) {
    let started = std::time::Instant::now();

    let (data, errors) = state.providers.fetch_all(&state.cache).await;
    for message in errors {
        state.push_error(message);
    }

    let leverage = data.derivatives.as_ref().map(analyze_leverage);
    let scores = calculate_scores(&data, leverage.as_ref());
    let composite = composite_score(&scores);
    let weighted = weighted_composite_score(&scores);

    let now = Utc::now();
    let brief = generate_brief(&data, &scores, now);

    info!(
        composite,
        weighted,
        sentiment = %Sentiment::from_score(composite),
        categories = scores.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "refresh cycle complete"
    );

    state.store_snapshot(IntelSnapshot {
        generated_at: now.timestamp_millis(),
        composite_score: composite,
        weighted_composite_score: weighted,
        sentiment: Sentiment::from_score(composite),
        brief,
        raw: data,
        scores,
        leverage,
    });
}
