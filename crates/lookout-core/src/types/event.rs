use crate::error::{LookoutError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event identifier - globally unique across instances
pub type EventId = Uuid;

/// Unit of detection/locking granularity (e.g. a member or application id)
pub type ScopeId = String;

/// Domain event contract
///
/// Concrete event types implement this and are immutable once created.
/// `KIND` is the stable wire identifier in `name:vN` form, independent of
/// the in-process type name.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable wire identifier (e.g. `"membership-category-changed:v1"`)
    const KIND: &'static str;

    fn event_id(&self) -> EventId;

    fn scope_id(&self) -> &str;

    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Durable, transport-agnostic wrapper around a serialized event payload
///
/// Immutable after it is appended to the event store. One envelope may be
/// delivered to zero or more subscriber queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event_id: EventId,
    pub scope_id: ScopeId,
    pub occurred_at: DateTime<Utc>,
    pub kind: String,
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Wrap a domain event for transport and storage
    pub fn from_event<E: DomainEvent>(event: &E) -> Result<Self> {
        let payload = serde_json::to_value(event)
            .map_err(|e| LookoutError::Serialization(e.to_string()))?;
        Ok(Self {
            event_id: event.event_id(),
            scope_id: event.scope_id().to_string(),
            occurred_at: event.occurred_at(),
            kind: E::KIND.to_string(),
            payload,
        })
    }

    /// Decode the payload back into a concrete event type
    ///
    /// A kind mismatch or undecodable payload is a malformed message, not a
    /// transient fault.
    pub fn open<E: DomainEvent>(&self) -> Result<E> {
        if self.kind != E::KIND {
            return Err(LookoutError::Malformed(format!(
                "envelope kind '{}' does not match expected '{}'",
                self.kind,
                E::KIND
            )));
        }
        serde_json::from_value(self.payload.clone())
            .map_err(|e| LookoutError::Malformed(format!("payload for '{}': {}", self.kind, e)))
    }

    /// Serialize for queue transport
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LookoutError::Serialization(e.to_string()))
    }

    /// Deserialize from queue transport
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| LookoutError::Malformed(format!("envelope: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ping {
        event_id: EventId,
        scope_id: ScopeId,
        occurred_at: DateTime<Utc>,
        note: String,
    }

    impl DomainEvent for Ping {
        const KIND: &'static str = "ping:v1";

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

    fn ping() -> Ping {
        Ping {
            event_id: Uuid::new_v4(),
            scope_id: "12345".to_string(),
            occurred_at: Utc::now(),
            note: "hello".to_string(),
        }
    }

    #[test]
    fn wrap_and_open_round_trips() {
        let event = ping();
        let envelope = Envelope::from_event(&event).unwrap();
        assert_eq!(envelope.kind, "ping:v1");
        assert_eq!(envelope.event_id, event.event_id);
        assert_eq!(envelope.scope_id, "12345");

        let opened: Ping = envelope.open().unwrap();
        assert_eq!(opened, event);
    }

    #[test]
    fn open_with_wrong_kind_is_malformed() {
        let mut envelope = Envelope::from_event(&ping()).unwrap();
        envelope.kind = "other:v1".to_string();

        let err = envelope.open::<Ping>().unwrap_err();
        assert!(matches!(err, LookoutError::Malformed(_)));
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = Envelope::from_json("not json").unwrap_err();
        assert!(matches!(err, LookoutError::Malformed(_)));
    }
}
