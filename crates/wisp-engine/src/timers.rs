//! Named, cancellable timing primitives for the display pipeline.
//!
//! Each primitive owns a singleton slot per string key: rescheduling under a
//! key replaces whatever was pending there. Built on the tokio clock so tests
//! drive them deterministically with the paused virtual clock.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct ThrottleSlot {
    /// Latest job scheduled under this key; replaced on every call.
    pending: Option<Job>,
    /// A spawned task will fire the pending job.
    task_active: bool,
    last_fire: Option<Instant>,
}

/// Keyed debounce and throttle scheduler.
#[derive(Clone, Default)]
pub struct Timers {
    debounces: Arc<Mutex<HashMap<String, CancellationToken>>>,
    throttles: Arc<Mutex<HashMap<String, ThrottleSlot>>>,
}

impl Timers {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending invocation under `key` and run `job` after `delay`.
    pub fn debounce<F>(&self, key: &str, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut slots = self.debounces.lock();
            if let Some(old) = slots.insert(key.to_string(), token.clone()) {
                old.cancel();
            }
        }
        trace!(key, delay_ms = delay.as_millis() as u64, "debounce");
        let slots = self.debounces.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(delay) => {
                    {
                        let mut slots = slots.lock();
                        // A concurrent reschedule owns the slot now; back off.
                        if token.is_cancelled() {
                            return;
                        }
                        slots.remove(&key);
                    }
                    job();
                }
            }
        });
    }

    /// Run `job` under `key`, at most once per `delay` window. Repeated calls
    /// within the window coalesce: the window's single fire always runs the
    /// most recently scheduled job (trailing edge).
    pub fn throttle<F>(&self, key: &str, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let wait = {
            let mut slots = self.throttles.lock();
            let slot = slots.entry(key.to_string()).or_default();
            slot.pending = Some(Box::new(job));
            if slot.task_active {
                // The already-scheduled fire will pick up this job.
                return;
            }
            slot.task_active = true;
            match slot.last_fire {
                Some(last) => (last + delay).saturating_duration_since(Instant::now()),
                None => Duration::ZERO,
            }
        };
        trace!(key, wait_ms = wait.as_millis() as u64, "throttle");
        let slots = self.throttles.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            time::sleep(wait).await;
            let job = {
                let mut slots = slots.lock();
                match slots.get_mut(&key) {
                    Some(slot) => {
                        slot.task_active = false;
                        slot.last_fire = Some(Instant::now());
                        slot.pending.take()
                    }
                    None => None,
                }
            };
            if let Some(job) = job {
                job();
            }
        });
    }

    /// Replace whatever is pending under throttle `key` with a no-op. The
    /// window still closes on schedule; it just does nothing.
    pub fn flush(&self, key: &str) {
        let mut slots = self.throttles.lock();
        if let Some(slot) = slots.get_mut(key) {
            trace!(key, "throttle flush");
            if slot.task_active {
                slot.pending = Some(Box::new(|| {}));
            } else {
                slot.pending = None;
            }
        }
    }
}
