use std::time::Duration;

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upper bound on the tick sleep; due times closer than this wake sooner
    pub poll_interval: Duration,
    /// Safety delay applied when a cron expression fails to parse or has no
    /// next occurrence
    pub fallback_delay: Duration,
    /// Development environment flag; enables `cron_override`
    pub development: bool,
    /// Development-only global cron that takes precedence over every
    /// detector's own expression
    pub cron_override: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            fallback_delay: Duration::from_secs(60),
            development: false,
            cron_override: None,
        }
    }
}

impl SchedulerConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_fallback_delay(mut self, fallback_delay: Duration) -> Self {
        self.fallback_delay = fallback_delay;
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_cron_override(mut self, cron_override: impl Into<String>) -> Self {
        self.cron_override = Some(cron_override.into());
        self
    }

    /// The cron to actually schedule a detector with
    pub fn effective_cron<'a>(&'a self, detector_cron: &'a str) -> &'a str {
        if self.development {
            self.cron_override.as_deref().unwrap_or(detector_cron)
        } else {
            detector_cron
        }
    }
}
