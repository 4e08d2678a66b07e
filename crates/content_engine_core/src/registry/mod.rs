//! Capability registries, presets and configuration resolution.
//!
//! # Responsibility
//! - Hold strategy/source/channel implementations by id.
//! - Resolve untrusted selection input into an always-runnable triple.
//!
//! # Invariants
//! - Registration completes before the first lookup; lookups never mutate.
//! - Unknown ids are warnings at resolve time and `NotFound` only at run time.

pub mod capability;
pub mod capability_registry;
pub mod presets;
pub mod resolve;
