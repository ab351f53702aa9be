//! Event kind registry
//!
//! Maps stable wire kinds to concrete event types. Registration is explicit
//! and happens once at startup; there is no runtime scanning.

use crate::error::{LookoutError, Result};
use crate::types::DomainEvent;
use std::any::TypeId;
use std::collections::HashMap;
use tracing::debug;

/// A registered event kind
#[derive(Debug, Clone)]
pub struct RegisteredKind {
    pub kind: &'static str,
    pub type_name: &'static str,
    type_id: TypeId,
}

/// Stable string kind <-> concrete event type map
///
/// Two different types claiming the same kind is a fatal startup error;
/// re-registering the same type is a no-op.
#[derive(Debug, Default)]
pub struct EventTypeRegistry {
    kinds: HashMap<&'static str, RegisteredKind>,
}

impl EventTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event type under its stable kind
    pub fn register<E: DomainEvent>(&mut self) -> Result<()> {
        let type_id = TypeId::of::<E>();
        if let Some(existing) = self.kinds.get(E::KIND) {
            if existing.type_id != type_id {
                return Err(LookoutError::Config(format!(
                    "event kind '{}' registered for both {} and {}",
                    E::KIND,
                    existing.type_name,
                    std::any::type_name::<E>()
                )));
            }
            return Ok(());
        }
        self.kinds.insert(
            E::KIND,
            RegisteredKind {
                kind: E::KIND,
                type_name: std::any::type_name::<E>(),
                type_id,
            },
        );
        debug!(kind = E::KIND, "event kind registered");
        Ok(())
    }

    /// Resolve a wire kind; `None` means the kind is unknown to this process
    pub fn resolve(&self, kind: &str) -> Option<&RegisteredKind> {
        self.kinds.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// All registered kinds
    pub fn kinds(&self) -> Vec<&'static str> {
        self.kinds.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventId, ScopeId};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct First {
        event_id: EventId,
        scope_id: ScopeId,
        occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Second {
        event_id: EventId,
        scope_id: ScopeId,
        occurred_at: DateTime<Utc>,
    }

    impl DomainEvent for First {
        const KIND: &'static str = "kind:v1";

        fn event_id(&self) -> EventId {
            self.event_id
        }

        fn scope_id(&self) -> &str {
            &self.scope_id
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }
    }

    impl DomainEvent for Second {
        const KIND: &'static str = "kind:v1";

        fn event_id(&self) -> EventId {
            self.event_id
        }

        fn scope_id(&self) -> &str {
            &self.scope_id
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }
    }

    #[test]
    fn resolve_and_reregister() {
        let mut registry = EventTypeRegistry::new();
        registry.register::<First>().unwrap();
        assert!(registry.resolve("kind:v1").is_some());
        assert!(registry.resolve("other:v1").is_none());

        // Same type again is benign
        registry.register::<First>().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_kind_for_different_type_is_fatal() {
        let mut registry = EventTypeRegistry::new();
        registry.register::<First>().unwrap();

        let err = registry.register::<Second>().unwrap_err();
        assert!(matches!(err, LookoutError::Config(_)));
    }
}
