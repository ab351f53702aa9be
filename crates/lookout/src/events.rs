//! Shipped domain event types
//!
//! Events are immutable once created; `new` stamps a fresh `EventId` and
//! the current UTC time. The wire kind carries an explicit version suffix
//! so payload shape can evolve without breaking stored envelopes.

use chrono::{DateTime, Utc};
use lookout_core::types::{DomainEvent, EventId, ScopeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member moved between membership categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipCategoryChanged {
    pub event_id: EventId,
    pub scope_id: ScopeId,
    pub occurred_at: DateTime<Utc>,
    pub from_category: Option<String>,
    pub to_category: String,
}

impl MembershipCategoryChanged {
    pub fn new(
        scope_id: impl Into<ScopeId>,
        from_category: Option<String>,
        to_category: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            scope_id: scope_id.into(),
            occurred_at: Utc::now(),
            from_category,
            to_category: to_category.into(),
        }
    }
}

impl DomainEvent for MembershipCategoryChanged {
    const KIND: &'static str = "membership-category-changed:v1";

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

/// A junior member reached a new progress level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JuniorProgressChanged {
    pub event_id: EventId,
    pub scope_id: ScopeId,
    pub occurred_at: DateTime<Utc>,
    pub from_level: Option<u32>,
    pub to_level: u32,
}

impl JuniorProgressChanged {
    pub fn new(scope_id: impl Into<ScopeId>, from_level: Option<u32>, to_level: u32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            scope_id: scope_id.into(),
            occurred_at: Utc::now(),
            from_level,
            to_level,
        }
    }
}

impl DomainEvent for JuniorProgressChanged {
    const KIND: &'static str = "junior-progress-changed:v1";

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
