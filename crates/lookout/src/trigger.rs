//! Ad-hoc detector triggers
//!
//! An external surface (out of scope here) enqueues a [`TriggerMessage`]
//! naming a detector and a scope; the trigger processor resolves the
//! detector from the explicit registry and re-evaluates that single scope.
//! An unknown detector name is fatal for that trigger only.

use crate::detector::Detector;
use crate::worker::QueueHandler;
use async_trait::async_trait;
use lookout_core::error::{LookoutError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Name of the detector trigger queue
pub const TRIGGER_QUEUE: &str = "lookout-detector-trigger";

/// Request to re-evaluate one scope of one detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMessage {
    pub detector: String,
    pub scope: String,
}

impl TriggerMessage {
    pub fn new(detector: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            detector: detector.into(),
            scope: scope.into(),
        }
    }
}

/// Explicit name -> detector map, populated at startup
///
/// Replaces runtime name lookup by reflection: a name resolves to exactly
/// one registered detector or to nothing, and duplicate names fail at
/// startup rather than at trigger time.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: HashMap<String, Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, detector: Arc<dyn Detector>) -> Result<()> {
        let name = detector.name().to_string();
        if self.detectors.contains_key(&name) {
            return Err(LookoutError::Config(format!(
                "detector '{}' registered twice",
                name
            )));
        }
        self.detectors.insert(name, detector);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Detector>> {
        self.detectors.get(name).cloned()
    }

    /// All registered detectors (scheduler input)
    pub fn detectors(&self) -> Vec<Arc<dyn Detector>> {
        self.detectors.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

/// Trigger-queue handling for the generic worker loop
pub struct TriggerHandler {
    registry: Arc<DetectorRegistry>,
}

impl TriggerHandler {
    pub fn new(registry: Arc<DetectorRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl QueueHandler for TriggerHandler {
    fn name(&self) -> &str {
        "detector-trigger"
    }

    async fn handle(&self, payload: &str) -> Result<()> {
        let message: TriggerMessage = serde_json::from_str(payload)
            .map_err(|e| LookoutError::Malformed(format!("trigger: {}", e)))?;

        let Some(detector) = self.registry.get(&message.detector) else {
            return Err(LookoutError::Unroutable(format!(
                "unknown detector '{}'",
                message.detector
            )));
        };

        info!(detector = %message.detector, scope = %message.scope, "ad-hoc detector run");
        detector.run_for_scope(&message.scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorSchedule;

    struct Dummy(&'static str);

    #[async_trait]
    impl Detector for Dummy {
        fn name(&self) -> &str {
            self.0
        }

        fn schedule(&self) -> DetectorSchedule {
            DetectorSchedule {
                cron: "*/5 * * * *".to_string(),
                run_on_startup: false,
            }
        }

        async fn run_all(&self) -> Result<()> {
            Ok(())
        }

        async fn run_for_scope(&self, _scope_key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn duplicate_detector_name_is_fatal() {
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(Dummy("junior-progress"))).unwrap();

        let err = registry.register(Arc::new(Dummy("junior-progress"))).unwrap_err();
        assert!(matches!(err, LookoutError::Config(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(Dummy("junior-progress"))).unwrap();

        assert!(registry.get("junior-progress").is_some());
        assert!(registry.get("nope").is_none());
    }
}
