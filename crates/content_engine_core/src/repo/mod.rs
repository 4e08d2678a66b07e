//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes are upserts keyed by a stable document key (run key, month).
//! - Repository APIs surface malformed stored data as `InvalidData`.

pub mod insight_repo;
pub mod run_repo;
