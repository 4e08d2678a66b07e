//! External text-generation provider boundary.
//!
//! # Responsibility
//! - Define the `TextProvider` contract strategies call into.
//! - Keep JSON extraction heuristics isolated and independently testable.
//!
//! # See also
//! - `builtin::openai_basic` for the strategy that consumes this module.

pub mod error;
pub mod json_extract;
pub mod openai;
