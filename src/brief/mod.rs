// =============================================================================
// Brief Synthesis — structured natural-language market summaries
// =============================================================================
//
// `narrative` holds the per-category threshold ladders that turn raw numbers
// into prose; `synthesizer` assembles a full Brief (headline, TL;DR,
// sections, takeaways, risks) from the scores and snapshots.

pub mod narrative;
pub mod synthesizer;

pub use synthesizer::{generate_brief, Brief, Section};
