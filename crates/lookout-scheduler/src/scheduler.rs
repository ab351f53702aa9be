//! Detector scheduler
//!
//! Maintains a next-due time per detector. Each tick fires every due
//! detector concurrently without awaiting completion and immediately
//! reschedules its next occurrence, so a slow run never delays the
//! cadence. A per-detector run gate skips (never queues) a tick while the
//! previous run of that detector is still in flight. Cron failures fall
//! back to a safety delay rather than crashing the loop.

use crate::config::SchedulerConfig;
use crate::schedule::next_occurrence;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use lookout::detector::Detector;
use lookout_core::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

struct Entry {
    detector: Arc<dyn Detector>,
    cron: String,
    next_due: DateTime<Utc>,
    /// Binary run gate; `try_acquire` failing means the previous run of
    /// this detector has not finished
    gate: Arc<Semaphore>,
}

/// Cron-driven, non-overlapping invocation of registered detectors
pub struct DetectorScheduler {
    entries: Vec<Entry>,
    config: SchedulerConfig,
    shutdown: Shutdown,
}

impl DetectorScheduler {
    pub fn new(
        detectors: Vec<Arc<dyn Detector>>,
        config: SchedulerConfig,
        shutdown: Shutdown,
    ) -> Self {
        let now = Utc::now();
        let entries = detectors
            .into_iter()
            .map(|detector| {
                let schedule = detector.schedule();
                let cron = config.effective_cron(&schedule.cron).to_string();
                let next_due = if schedule.run_on_startup {
                    now
                } else {
                    Self::occurrence_or_fallback(detector.name(), &cron, now, &config)
                };
                Entry {
                    detector,
                    cron,
                    next_due,
                    gate: Arc::new(Semaphore::new(1)),
                }
            })
            .collect();
        Self {
            entries,
            config,
            shutdown,
        }
    }

    /// Run until shutdown is signaled
    pub async fn run(&mut self) {
        info!(detectors = self.entries.len(), "detector scheduler started");

        while !self.shutdown.is_triggered() {
            self.tick(Utc::now());

            let sleep_for = self.until_next_due().min(self.config.poll_interval);
            if !self.shutdown.sleep(sleep_for.max(Duration::from_millis(10))).await {
                break;
            }
        }

        info!("detector scheduler stopped");
    }

    /// Fire every due detector and reschedule it
    fn tick(&mut self, now: DateTime<Utc>) {
        for entry in &mut self.entries {
            if entry.next_due > now {
                continue;
            }

            // Reschedule before firing; a slow run must not delay the cadence
            entry.next_due =
                Self::occurrence_or_fallback(entry.detector.name(), &entry.cron, now, &self.config);

            let Ok(permit) = entry.gate.clone().try_acquire_owned() else {
                debug!(
                    detector = entry.detector.name(),
                    "previous run still in flight, skipping tick"
                );
                continue;
            };

            let detector = entry.detector.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = detector.run_all().await {
                    error!(detector = detector.name(), error = %e, "detector run failed");
                }
            });
        }
    }

    fn until_next_due(&self) -> Duration {
        let now = Utc::now();
        self.entries
            .iter()
            .map(|e| (e.next_due - now).to_std().unwrap_or(Duration::ZERO))
            .min()
            .unwrap_or(self.config.poll_interval)
    }

    fn occurrence_or_fallback(
        name: &str,
        cron: &str,
        after: DateTime<Utc>,
        config: &SchedulerConfig,
    ) -> DateTime<Utc> {
        match next_occurrence(cron, after) {
            Ok(next) => next,
            Err(e) => {
                warn!(
                    detector = name,
                    cron,
                    error = %e,
                    "cron evaluation failed, applying safety delay"
                );
                after + ChronoDuration::seconds(config.fallback_delay.as_secs() as i64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lookout::detector::DetectorSchedule;
    use lookout_core::error::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDetector {
        name: &'static str,
        cron: &'static str,
        run_on_startup: bool,
        runs: AtomicUsize,
        run_for: Duration,
    }

    impl CountingDetector {
        fn new(name: &'static str, cron: &'static str, run_on_startup: bool) -> Self {
            Self {
                name,
                cron,
                run_on_startup,
                runs: AtomicUsize::new(0),
                run_for: Duration::ZERO,
            }
        }

        fn slow(mut self, run_for: Duration) -> Self {
            self.run_for = run_for;
            self
        }
    }

    #[async_trait::async_trait]
    impl Detector for CountingDetector {
        fn name(&self) -> &str {
            self.name
        }

        fn schedule(&self) -> DetectorSchedule {
            DetectorSchedule {
                cron: self.cron.to_string(),
                run_on_startup: self.run_on_startup,
            }
        }

        async fn run_all(&self) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.run_for > Duration::ZERO {
                tokio::time::sleep(self.run_for).await;
            }
            Ok(())
        }

        async fn run_for_scope(&self, _scope_key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_on_startup_fires_on_first_tick() {
        // Cron far in the future; only run_on_startup can fire it
        let detector = Arc::new(CountingDetector::new("startup", "0 0 1 1 *", true));
        let shutdown = Shutdown::new();
        let mut scheduler = DetectorScheduler::new(
            vec![detector.clone()],
            SchedulerConfig::default().with_poll_interval(Duration::from_millis(20)),
            shutdown.clone(),
        );

        let handle = tokio::spawn(async move { scheduler.run().await });
        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert_eq!(detector.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn detector_without_startup_flag_waits_for_cron() {
        let detector = Arc::new(CountingDetector::new("patient", "0 0 1 1 *", false));
        let shutdown = Shutdown::new();
        let mut scheduler = DetectorScheduler::new(
            vec![detector.clone()],
            SchedulerConfig::default().with_poll_interval(Duration::from_millis(20)),
            shutdown.clone(),
        );

        let handle = tokio::spawn(async move { scheduler.run().await });
        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert_eq!(detector.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn in_flight_run_skips_later_ticks() {
        // Every-second cron with a run that outlasts several ticks; the run
        // gate must collapse those ticks into skips, not queue them.
        let detector = Arc::new(
            CountingDetector::new("slow", "* * * * * *", true).slow(Duration::from_secs(3)),
        );
        let shutdown = Shutdown::new();
        let mut scheduler = DetectorScheduler::new(
            vec![detector.clone()],
            SchedulerConfig::default().with_poll_interval(Duration::from_millis(50)),
            shutdown.clone(),
        );

        let handle = tokio::spawn(async move { scheduler.run().await });
        tokio::time::sleep(Duration::from_millis(2500)).await;
        shutdown.trigger();
        handle.await.unwrap();

        assert_eq!(detector.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dev_override_replaces_detector_cron() {
        let detector = Arc::new(CountingDetector::new("overridden", "0 3 * * *", false));
        let config = SchedulerConfig::default()
            .with_development(true)
            .with_cron_override("* * * * * *");
        let scheduler =
            DetectorScheduler::new(vec![detector], config, Shutdown::new());

        // With the override active the next due time is within a second or
        // two, not at 03:00
        let due = scheduler.entries[0].next_due;
        assert!(due - Utc::now() < ChronoDuration::seconds(2));
    }

    #[test]
    fn bad_cron_falls_back_to_safety_delay() {
        let config = SchedulerConfig::default();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let due = DetectorScheduler::occurrence_or_fallback("broken", "nonsense", after, &config);
        assert_eq!(due, after + ChronoDuration::seconds(60));
    }
}
