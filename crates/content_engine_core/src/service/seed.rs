//! Rewrite seed selection from recent runs.
//!
//! # Invariants
//! - Records without a topic never become seeds.
//! - `QuietOnly` narrows the pool but falls back to every candidate when the
//!   narrowed pool is empty.
//! - The pick is `hash_to_index(seed_key, pool.len())`, so one day and one
//!   configuration always select the same position.

use crate::builtin::strategies::{QUIET_REWRITE_ID, QUIET_SPREAD_ID};
use crate::model::run_record::RunRecord;
use crate::select::hash_to_index;

/// How many recent runs are considered as rewrite candidates.
pub const REWRITE_SEED_POOL_LIMIT: u32 = 50;

const QUIET_STRATEGY_IDS: [&str; 2] = [QUIET_SPREAD_ID, QUIET_REWRITE_ID];

/// Candidate filter applied before picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    Any,
    /// Only runs written by a quiet strategy.
    QuietOnly,
}

impl SeedMode {
    /// `QuietOnly` for `quiet-rewrite`, `Any` otherwise.
    pub fn for_strategy(strategy_id: &str) -> Self {
        if strategy_id == QUIET_REWRITE_ID {
            Self::QuietOnly
        } else {
            Self::Any
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::QuietOnly => "quiet-only",
        }
    }
}

/// Past run reused as rewrite material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSeed {
    pub topic: String,
    /// Previous article body; becomes the draft.
    pub content: Option<String>,
    pub strategy_id: Option<String>,
    pub source_id: Option<String>,
    pub channel_id: Option<String>,
    pub saved_at: String,
}

impl RewriteSeed {
    fn from_record(record: &RunRecord) -> Option<Self> {
        let topic = record
            .topic
            .as_deref()
            .filter(|topic| !topic.trim().is_empty())?;
        Some(Self {
            topic: topic.to_string(),
            content: record.content.clone(),
            strategy_id: record.strategy_id.clone(),
            source_id: record.source_id.clone(),
            channel_id: record.channel_id.clone(),
            saved_at: record.saved_at.clone(),
        })
    }

    fn is_quiet(&self) -> bool {
        self.strategy_id
            .as_deref()
            .is_some_and(|id| QUIET_STRATEGY_IDS.contains(&id))
    }
}

/// Picks one seed from `records` (expected newest first).
///
/// Returns `None` when no record has a topic.
pub fn pick_rewrite_seed(records: &[RunRecord], mode: SeedMode, seed_key: &str) -> Option<RewriteSeed> {
    let all: Vec<RewriteSeed> = records.iter().filter_map(RewriteSeed::from_record).collect();
    if all.is_empty() {
        return None;
    }

    let filtered: Vec<&RewriteSeed> = match mode {
        SeedMode::Any => all.iter().collect(),
        SeedMode::QuietOnly => all.iter().filter(|seed| seed.is_quiet()).collect(),
    };
    let pool: Vec<&RewriteSeed> = if filtered.is_empty() {
        all.iter().collect()
    } else {
        filtered
    };

    pool.get(hash_to_index(seed_key, pool.len()))
        .map(|seed| (*seed).clone())
}
