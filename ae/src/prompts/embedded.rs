//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Feasibility question, answered with "Yes" or "No"
pub const FEASIBILITY: &str = include_str!("../../prompts/feasibility.pmt");

/// Follow-up asking why an objective was rejected
pub const FEASIBILITY_REASON: &str = include_str!("../../prompts/feasibility-reason.pmt");

/// Initial task listing for an objective
pub const SPLIT: &str = include_str!("../../prompts/split.pmt");

/// Listing for a single subdividable task
pub const SUBDIVIDE: &str = include_str!("../../prompts/subdivide.pmt");

/// Single-digit classification
pub const CLASSIFY: &str = include_str!("../../prompts/classify.pmt");

/// Re-ask after an unreadable classification
pub const CLASSIFY_STRICT: &str = include_str!("../../prompts/classify-strict.pmt");

/// Memory compaction instruction
pub const COMPACT: &str = include_str!("../../prompts/compact.pmt");

/// Default capability document
pub const ABILITIES: &str = include_str!("../../prompts/abilities.txt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "feasibility" => Some(FEASIBILITY),
        "feasibility-reason" => Some(FEASIBILITY_REASON),
        "split" => Some(SPLIT),
        "subdivide" => Some(SUBDIVIDE),
        "classify" => Some(CLASSIFY),
        "classify-strict" => Some(CLASSIFY_STRICT),
        "compact" => Some(COMPACT),
        "abilities" => Some(ABILITIES),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
