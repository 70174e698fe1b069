//! Presence test engine — waits for a *new* device to be attached to the bus.
//!
//! A test captures a baseline snapshot, then polls for an identifier that is
//! not in it. A candidate must survive a debounce delay and show up again in
//! a fresh enumeration before it counts, which filters out contact bounce and
//! a device swapped for another one inside the debounce window.
//!
//! ```text
//! Baseline ──err──▶ Unreadable
//!    │
//!    ▼
//! Polling ──newcomer──▶ Debounce ──still present──▶ Confirmed
//!    │  ▲                  │
//!    │  └──── Waiting ◀────┘ vanished
//!    ▼
//! TimedOut
//! ```
//!
//! The timeout budget is measured from the baseline capture and is never
//! reset, not even by a candidate that vanishes during its debounce.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use ibtester_domain::device::{DeviceId, DeviceSet};
use ibtester_domain::outcome::{FailReason, Outcome};

use crate::ports::DeviceSource;
use crate::registry::DeviceRegistry;

/// Timing parameters for presence tests. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSettings {
    /// Budget used when a command carries no usable `timeout_ms`.
    pub default_timeout: Duration,
    /// Delay before a candidate is re-checked.
    pub debounce: Duration,
    /// Pause between polls while nothing new is on the bus.
    pub poll_interval: Duration,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(10_000),
            debounce: Duration::from_millis(100),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Runs presence tests against a shared [`DeviceRegistry`].
pub struct PresenceTest<S> {
    registry: Arc<DeviceRegistry<S>>,
    settings: TestSettings,
}

/// State owned by one in-flight test.
struct TestSession {
    baseline: DeviceSet,
    started: Instant,
    timeout: Duration,
}

impl TestSession {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }
}

enum Phase {
    Polling,
    Waiting,
    Debounce {
        candidate: DeviceId,
        others: VecDeque<DeviceId>,
    },
    Confirmed(DeviceId),
    TimedOut,
    Unreadable,
}

impl<S: DeviceSource> PresenceTest<S> {
    pub fn new(registry: Arc<DeviceRegistry<S>>, settings: TestSettings) -> Self {
        Self { registry, settings }
    }

    /// Run one test to completion.
    ///
    /// `timeout` overrides the configured default budget. Always resolves to
    /// exactly one [`Outcome`]; enumeration failures at any phase end the test
    /// with [`FailReason::W1ReadError`].
    pub async fn run(&self, timeout: Option<Duration>) -> Outcome {
        let timeout = timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(self.settings.default_timeout);

        tracing::info!(timeout_ms = timeout.as_millis(), "starting presence test");

        let baseline = match self.registry.enumerate().await {
            Ok(baseline) => baseline,
            Err(err) => {
                tracing::warn!(%err, "baseline scan failed");
                return Outcome::Fail {
                    reason: FailReason::W1ReadError,
                    elapsed: Duration::ZERO,
                };
            }
        };
        tracing::debug!(baseline = baseline.len(), "baseline captured");

        let session = TestSession {
            baseline,
            started: Instant::now(),
            timeout,
        };

        let mut phase = Phase::Polling;
        loop {
            phase = match phase {
                Phase::Polling => self.poll(&session).await,
                Phase::Waiting => {
                    tokio::time::sleep(self.settings.poll_interval).await;
                    Phase::Polling
                }
                Phase::Debounce { candidate, others } => {
                    self.debounce(&session, candidate, others).await
                }
                Phase::Confirmed(device) => {
                    let elapsed = session.elapsed();
                    tracing::info!(%device, elapsed_ms = elapsed.as_millis(), "presence test passed");
                    return Outcome::Pass { device, elapsed };
                }
                Phase::TimedOut => {
                    let elapsed = session.elapsed();
                    tracing::warn!(elapsed_ms = elapsed.as_millis(), "presence test timed out");
                    return Outcome::Fail {
                        reason: FailReason::Timeout,
                        elapsed,
                    };
                }
                Phase::Unreadable => {
                    return Outcome::Fail {
                        reason: FailReason::W1ReadError,
                        elapsed: session.elapsed(),
                    };
                }
            };
        }
    }

    async fn poll(&self, session: &TestSession) -> Phase {
        if session.expired() {
            return Phase::TimedOut;
        }
        let snapshot = match self.registry.enumerate().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%err, "w1 scan failed while polling");
                return Phase::Unreadable;
            }
        };

        let mut newcomers: VecDeque<DeviceId> =
            snapshot.newcomers(&session.baseline).cloned().collect();
        match newcomers.pop_front() {
            Some(candidate) => Phase::Debounce {
                candidate,
                others: newcomers,
            },
            None => Phase::Waiting,
        }
    }

    async fn debounce(
        &self,
        session: &TestSession,
        candidate: DeviceId,
        mut others: VecDeque<DeviceId>,
    ) -> Phase {
        tracing::debug!(%candidate, "new device seen, debouncing");
        tokio::time::sleep(self.settings.debounce).await;

        let confirm = match self.registry.enumerate().await {
            Ok(confirm) => confirm,
            Err(err) => {
                tracing::warn!(%err, %candidate, "w1 scan failed while debouncing");
                return Phase::Unreadable;
            }
        };
        if confirm.contains(&candidate) {
            return Phase::Confirmed(candidate);
        }

        tracing::debug!(%candidate, "device vanished during debounce");
        match others.pop_front() {
            Some(next) if !session.expired() => Phase::Debounce {
                candidate: next,
                others,
            },
            _ => Phase::Waiting,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use ibtester_domain::error::EnumerationError;
    use ibtester_domain::filter::FilterConfig;


    type Script = Box<dyn Fn(Duration) -> Option<Vec<&'static str>> + Send + Sync>;

    /// Bus whose contents are a function of time since creation; `None`
    /// from the script means the listing fails at that instant.
    struct TimelineSource {
        start: Instant,
        script: Script,
        calls: AtomicUsize,
    }

    impl TimelineSource {
        fn new(script: impl Fn(Duration) -> Option<Vec<&'static str>> + Send + Sync + 'static) -> Self {
            Self {
                start: Instant::now(),
                script: Box::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn fixed(ids: &[&'static str]) -> Self {
            let ids = ids.to_vec();
            Self::new(move |_| Some(ids.clone()))
        }

        fn unreadable() -> Self {
            Self::new(|_| None)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DeviceSource for TimelineSource {
        async fn list(&self) -> Result<Vec<String>, EnumerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (self.script)(self.start.elapsed()) {
                Some(ids) => Ok(ids.into_iter().map(ToString::to_string).collect()),
                None => Err(EnumerationError::new(
                    "/sys/bus/w1/devices",
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                )),
            }
        }
    }

    const POLL: Duration = Duration::from_millis(50);
    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn engine(source: TimelineSource) -> (PresenceTest<Arc<TimelineSource>>, Arc<TimelineSource>) {
        let source = Arc::new(source);
        let registry = DeviceRegistry::new(Arc::clone(&source), FilterConfig::default());
        let settings = TestSettings {
            default_timeout: Duration::from_millis(10_000),
            debounce: DEBOUNCE,
            poll_interval: POLL,
        };
        (PresenceTest::new(Arc::new(registry), settings), source)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Elapsed time of a timed-out outcome; panics on anything else.
    fn timed_out(outcome: &Outcome) -> Duration {
        match outcome {
            Outcome::Fail {
                reason: FailReason::Timeout,
                elapsed,
            } => *elapsed,
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_pass_when_device_attached_and_held() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t >= ms(300) {
                Some(vec!["01-aabbccddeeff"])
            } else {
                Some(vec![])
            }
        }));

        let outcome = engine.run(Some(ms(10_000))).await;

        let Outcome::Pass { device, elapsed } = outcome else {
            panic!("expected pass, got {outcome:?}");
        };
        assert_eq!(device.as_str(), "01-aabbccddeeff");
        assert!(elapsed >= ms(300) + DEBOUNCE);
        assert!(elapsed < ms(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_when_nothing_new_appears() {
        let (engine, _) = engine(TimelineSource::fixed(&["01-x"]));

        let outcome = engine.run(Some(ms(200))).await;

        assert!(timed_out(&outcome) >= ms(200));
    }

    #[tokio::test(start_paused = true)]
    async fn should_bound_timeout_overshoot() {
        for budget in [1, 49, 50, 51, 200, 1234] {
            let (engine, _) = engine(TimelineSource::fixed(&["01-x", "10-y"]));

            let outcome = engine.run(Some(ms(budget))).await;

            let elapsed = timed_out(&outcome);
            assert!(elapsed >= ms(budget), "budget {budget}");
            assert!(elapsed < ms(budget) + POLL + DEBOUNCE, "budget {budget}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_immediately_when_baseline_unreadable() {
        let (engine, source) = engine(TimelineSource::unreadable());

        let outcome = engine.run(None).await;

        assert_eq!(
            outcome,
            Outcome::Fail {
                reason: FailReason::W1ReadError,
                elapsed: Duration::ZERO,
            }
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_when_bus_becomes_unreadable_while_polling() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t >= ms(400) { None } else { Some(vec!["01-x"]) }
        }));

        let outcome = engine.run(Some(ms(5_000))).await;

        let Outcome::Fail { reason, elapsed } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(reason, FailReason::W1ReadError);
        assert!(elapsed >= ms(400));
        assert!(elapsed < ms(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_when_bus_becomes_unreadable_while_debouncing() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t < ms(200) {
                Some(vec![])
            } else if t < ms(250) {
                Some(vec!["01-a"])
            } else {
                None
            }
        }));

        let outcome = engine.run(Some(ms(5_000))).await;

        assert!(matches!(
            outcome,
            Outcome::Fail {
                reason: FailReason::W1ReadError,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_device_that_bounces_within_debounce_window() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t >= ms(300) && t < ms(350) {
                Some(vec!["01-flaky"])
            } else {
                Some(vec![])
            }
        }));

        let outcome = engine.run(Some(ms(500))).await;

        let Outcome::Fail { reason, elapsed } = outcome else {
            panic!("bouncing device must not pass, got {outcome:?}");
        };
        assert_eq!(reason, FailReason::Timeout);
        // A restarted budget would run until at least 900 ms.
        assert!(elapsed >= ms(500));
        assert!(elapsed < ms(500) + POLL + DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn should_measure_elapsed_from_baseline_after_a_bounce() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if (t >= ms(300) && t < ms(350)) || t >= ms(600) {
                Some(vec!["01-a"])
            } else {
                Some(vec![])
            }
        }));

        let outcome = engine.run(Some(ms(5_000))).await;

        let Outcome::Pass { device, elapsed } = outcome else {
            panic!("expected pass, got {outcome:?}");
        };
        assert_eq!(device.as_str(), "01-a");
        assert!(elapsed >= ms(600) + DEBOUNCE);
        assert!(elapsed < ms(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_confirm_device_swapped_during_debounce() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t < ms(300) {
                Some(vec![])
            } else if t < ms(350) {
                Some(vec!["01-first"])
            } else {
                Some(vec!["01-second"])
            }
        }));

        let outcome = engine.run(Some(ms(5_000))).await;

        let Outcome::Pass { device, .. } = outcome else {
            panic!("expected pass, got {outcome:?}");
        };
        assert_eq!(device.as_str(), "01-second");
    }

    #[tokio::test(start_paused = true)]
    async fn should_confirm_exactly_one_of_simultaneous_newcomers() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t >= ms(100) {
                Some(vec!["01-x", "01-b", "01-a"])
            } else {
                Some(vec!["01-x"])
            }
        }));

        let outcome = engine.run(Some(ms(5_000))).await;

        let Outcome::Pass { device, .. } = outcome else {
            panic!("expected pass, got {outcome:?}");
        };
        assert!(["01-a", "01-b"].contains(&device.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_devices_already_in_baseline() {
        let (engine, _) = engine(TimelineSource::new(|t| {
            if t >= ms(100) {
                Some(vec!["01-old", "01-new"])
            } else {
                Some(vec!["01-old"])
            }
        }));

        let outcome = engine.run(None).await;

        let Outcome::Pass { device, .. } = outcome else {
            panic!("expected pass, got {outcome:?}");
        };
        assert_eq!(device.as_str(), "01-new");
    }

    #[tokio::test(start_paused = true)]
    async fn should_use_default_timeout_when_none_given() {
        let (engine, _) = engine(TimelineSource::fixed(&[]));

        let outcome = engine.run(None).await;

        let elapsed = timed_out(&outcome);
        assert!(elapsed >= ms(10_000));
        assert!(elapsed < ms(10_000) + POLL);
    }
}
