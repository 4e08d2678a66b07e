//! In-process capability registries keyed by id.
//!
//! # Responsibility
//! - Map capability ids to shared implementations, one registry per kind.
//! - Report every known id when a lookup misses.
//!
//! # Invariants
//! - Listing order is first-registration order.
//! - Re-registering an id replaces the implementation but keeps its position.
//! - Registries are read-only once bootstrap finishes; lookups take `&self`.

use crate::registry::capability::{Capability, CapabilityKind, Channel, Source, Strategy};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Registry lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Requested id is not registered. `available` lists ids in listing order.
    NotFound {
        kind: CapabilityKind,
        id: String,
        available: Vec<String>,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                kind,
                id,
                available,
            } => {
                let available = if available.is_empty() {
                    "(none)".to_string()
                } else {
                    available.join(", ")
                };
                write!(
                    f,
                    "{} not found: \"{id}\". Available: {available}",
                    kind.as_str()
                )
            }
        }
    }
}

impl Error for RegistryError {}

/// Registry for one capability kind.
pub struct CapabilityRegistry<T: ?Sized + Capability> {
    kind: CapabilityKind,
    order: Vec<String>,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized + Capability> CapabilityRegistry<T> {
    pub fn new(kind: CapabilityKind) -> Self {
        Self {
            kind,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Registers one capability under its own id. Last registration wins.
    pub fn register(&mut self, capability: Arc<T>) {
        let id = capability.id().to_string();
        if !self.entries.contains_key(id.as_str()) {
            self.order.push(id.clone());
        }
        self.entries.insert(id, capability);
    }

    /// Returns one capability by exact (case-sensitive) id.
    pub fn get(&self, id: &str) -> Result<Arc<T>, RegistryError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: self.kind,
                id: id.to_string(),
                available: self.list(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns ids in registration order.
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Returns the first registered id, if any.
    pub fn first_id(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Available ids per capability kind, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    pub strategies: Vec<String>,
    pub sources: Vec<String>,
    pub channels: Vec<String>,
}

/// The three per-kind registries an engine run draws from.
pub struct EngineRegistry {
    pub strategies: CapabilityRegistry<dyn Strategy>,
    pub sources: CapabilityRegistry<dyn Source>,
    pub channels: CapabilityRegistry<dyn Channel>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineRegistry {
    /// Creates an empty registry set.
    pub fn new() -> Self {
        Self {
            strategies: CapabilityRegistry::new(CapabilityKind::Strategy),
            sources: CapabilityRegistry::new(CapabilityKind::Source),
            channels: CapabilityRegistry::new(CapabilityKind::Channel),
        }
    }

    pub fn register_strategy(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.register(strategy);
    }

    pub fn register_source(&mut self, source: Arc<dyn Source>) {
        self.sources.register(source);
    }

    pub fn register_channel(&mut self, channel: Arc<dyn Channel>) {
        self.channels.register(channel);
    }

    /// Returns whether `id` is registered for `kind`.
    pub fn contains(&self, kind: CapabilityKind, id: &str) -> bool {
        match kind {
            CapabilityKind::Strategy => self.strategies.contains(id),
            CapabilityKind::Source => self.sources.contains(id),
            CapabilityKind::Channel => self.channels.contains(id),
        }
    }

    /// Returns the first registered id for `kind`.
    pub fn first_id(&self, kind: CapabilityKind) -> Option<&str> {
        match kind {
            CapabilityKind::Strategy => self.strategies.first_id(),
            CapabilityKind::Source => self.sources.first_id(),
            CapabilityKind::Channel => self.channels.first_id(),
        }
    }

    /// Lists all ids, used to expose selectable options.
    pub fn options(&self) -> RegistryOptions {
        RegistryOptions {
            strategies: self.strategies.list(),
            sources: self.sources.list(),
            channels: self.channels.list(),
        }
    }
}
