//! Synthetic submission progress.
//!
//! The transport reports nothing while the service works on a document, so
//! the client fakes a ramp: a fixed increment on a fixed interval, capped
//! below 100 %, snapped to 100 % once the call resolves. It is a UI
//! affordance only and never feeds back into classification.
//!
//! Inject an [`Arc<dyn ProgressSink>`] to receive the ramp; the CLI drives an
//! `indicatif` bar from it.
//!
//! # Example
//!
//! ```rust
//! use docval::progress::{ProgressReporter, ProgressSink};
//! use docval::ValidatorConfig;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU8, Ordering};
//!
//! struct Latest(AtomicU8);
//!
//! impl ProgressSink for Latest {
//!     fn on_progress(&self, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sink = Arc::new(Latest(AtomicU8::new(0)));
//! let handle = ProgressReporter::start(&ValidatorConfig::default(), sink.clone());
//! // ... await the submission ...
//! handle.finish(true);
//! assert_eq!(sink.0.load(Ordering::SeqCst), 100);
//! # }
//! ```

use crate::config::ValidatorConfig;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Floor for the tick period; `tokio::time::interval` panics on zero.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Receives synthetic progress for one submission.
///
/// All methods default to no-ops. Calls may come from a tokio worker
/// thread, hence `Send + Sync`.
pub trait ProgressSink: Send + Sync {
    /// Called once when the submission starts, before the first `on_progress(0)`.
    fn on_submission_start(&self) {}

    /// Called with a strictly increasing percentage. The last call is
    /// always `100`, made after the network call resolved.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called once, after the final `on_progress(100)`.
    fn on_submission_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op sink for callers that don't display progress.
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {}

/// Convenience alias for the sink type stored by [`crate::Validator`].
pub type ProgressCallback = Arc<dyn ProgressSink>;

#[derive(Debug, Default)]
struct Ramp {
    percent: u8,
    stopped: bool,
}

fn lock(ramp: &Mutex<Ramp>) -> MutexGuard<'_, Ramp> {
    ramp.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Starts synthetic progress ramps.
pub struct ProgressReporter;

impl ProgressReporter {
    /// Begin a ramp for one submission. Must be called inside a tokio runtime.
    ///
    /// The returned handle owns the ticker; it stops on [`ProgressHandle::finish`]
    /// or when dropped, whichever comes first.
    pub fn start(config: &ValidatorConfig, sink: Arc<dyn ProgressSink>) -> ProgressHandle {
        let ramp = Arc::new(Mutex::new(Ramp::default()));
        sink.on_submission_start();
        sink.on_progress(0);

        let step = config.progress_step.max(1);
        let cap = config.progress_cap.min(99);
        let period = config.progress_interval().max(MIN_TICK);

        let task = {
            let ramp = Arc::clone(&ramp);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    let mut r = lock(&ramp);
                    if r.stopped {
                        break;
                    }
                    let next = r.percent.saturating_add(step).min(cap);
                    if next <= r.percent {
                        break;
                    }
                    r.percent = next;
                    // Emitted under the lock so `finish` cannot interleave.
                    sink.on_progress(next);
                }
            })
        };

        ProgressHandle {
            ramp,
            sink,
            task: Some(task),
        }
    }
}

/// Owner of a running ramp. Stops the ticker on every exit path.
pub struct ProgressHandle {
    ramp: Arc<Mutex<Ramp>>,
    sink: Arc<dyn ProgressSink>,
    task: Option<JoinHandle<()>>,
}

impl ProgressHandle {
    /// Last emitted percentage.
    pub fn current(&self) -> u8 {
        lock(&self.ramp).percent
    }

    /// Stop the ticker, emit `100`, then report completion.
    ///
    /// Call only after the network call has resolved.
    pub fn finish(mut self, success: bool) {
        self.stop();
        {
            let mut r = lock(&self.ramp);
            r.percent = 100;
        }
        self.sink.on_progress(100);
        self.sink.on_submission_complete(success);
    }

    fn stop(&mut self) {
        lock(&self.ramp).stopped = true;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Start,
        Progress(u8),
        Complete(bool),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn percents(&self) -> Vec<u8> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Progress(p) => Some(p),
                    _ => None,
                })
                .collect()
        }
    }

    impl ProgressSink for Recorder {
        fn on_submission_start(&self) {
            self.events.lock().unwrap().push(Event::Start);
        }
        fn on_progress(&self, percent: u8) {
            self.events.lock().unwrap().push(Event::Progress(percent));
        }
        fn on_submission_complete(&self, success: bool) {
            self.events.lock().unwrap().push(Event::Complete(success));
        }
    }

    fn config() -> ValidatorConfig {
        ValidatorConfig::builder()
            .progress_step(10)
            .progress_interval_ms(200)
            .progress_cap(90)
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn ramp_is_monotonic_and_capped() {
        let rec = Arc::new(Recorder::default());
        let handle = ProgressReporter::start(&config(), rec.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.current(), 90);
        handle.finish(true);

        assert_eq!(
            rec.percents(),
            vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
        let events = rec.events();
        assert_eq!(events.first(), Some(&Event::Start));
        assert_eq!(events.last(), Some(&Event::Complete(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_emitted_after_finish() {
        let rec = Arc::new(Recorder::default());
        let handle = ProgressReporter::start(&config(), rec.clone());

        tokio::time::sleep(Duration::from_millis(450)).await;
        handle.finish(false);
        let seen = rec.events().len();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rec.events().len(), seen);
        assert_eq!(rec.percents().last(), Some(&100));
        assert_eq!(rec.events().last(), Some(&Event::Complete(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_ticker() {
        let rec = Arc::new(Recorder::default());
        let handle = ProgressReporter::start(&config(), rec.clone());
        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(handle);
        let seen = rec.events().len();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rec.events().len(), seen);
        assert!(!rec.percents().contains(&100));
    }

    #[tokio::test(start_paused = true)]
    async fn uneven_step_stops_at_cap() {
        let cfg = ValidatorConfig::builder()
            .progress_step(40)
            .progress_cap(90)
            .build()
            .unwrap();
        let rec = Arc::new(Recorder::default());
        let handle = ProgressReporter::start(&cfg, rec.clone());
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.finish(true);
        assert_eq!(rec.percents(), vec![0, 40, 80, 90, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn unvalidated_zero_settings_still_ramp() {
        // Struct literal skips the builder's checks.
        let cfg = ValidatorConfig {
            progress_interval_ms: 0,
            progress_step: 0,
            ..ValidatorConfig::default()
        };
        let rec = Arc::new(Recorder::default());
        let handle = ProgressReporter::start(&cfg, rec.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.current(), 90);
        handle.finish(true);

        let percents = rec.percents();
        assert!(percents.windows(2).all(|w| w[0] < w[1]), "{percents:?}");
        assert_eq!(percents.last(), Some(&100));
        assert_eq!(rec.events().last(), Some(&Event::Complete(true)));
    }

    #[test]
    fn noop_sink_does_not_panic() {
        let s = NoopProgressSink;
        s.on_submission_start();
        s.on_progress(50);
        s.on_submission_complete(true);
    }
}
