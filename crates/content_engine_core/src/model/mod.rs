//! Domain model shared by the engine, store and report layers.
//!
//! # Responsibility
//! - Define the article shape produced by strategies and shaped by channels.
//! - Define the flat run record persisted per generation run.
//!
//! # Invariants
//! - `GeneratedArticle::ids` always echoes the capabilities used to build it.
//! - `RunRecord::run_key` is a pure function of day, ids and topic.

pub mod article;
pub mod run_record;
