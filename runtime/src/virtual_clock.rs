//! Deterministic, manually advanced time.
//!
//! A [`VirtualClock`] never runs anything on its own. Work is queued with a
//! logical target time and runs only when a test calls
//! [`advance`](VirtualClock::advance). This makes debounced and throttled
//! pipelines fully deterministic under test.
//!
//! # Ordering
//!
//! Pending work is ordered by `(target time, insertion sequence)`: earlier
//! targets first, and work scheduled for the same instant runs in the order
//! it was scheduled.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use viewstore_runtime::VirtualClock;
//!
//! let clock = VirtualClock::new();
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&log);
//! clock.schedule_after(Duration::from_secs(2), move || sink.lock().unwrap().push("late"));
//! let sink = Arc::clone(&log);
//! clock.schedule_after(Duration::from_secs(1), move || sink.lock().unwrap().push("early"));
//!
//! clock.advance(Duration::from_secs(1));
//! assert_eq!(*log.lock().unwrap(), vec!["early"]);
//!
//! clock.run();
//! assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
//! ```

use crate::metrics::{SCHEDULER_WORK_EXECUTED, SCHEDULER_WORK_SCHEDULED};
use crate::scheduler::Work;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Stride used by [`VirtualClock::run`].
pub const DEFAULT_ADVANCE: Duration = Duration::from_secs(1_000_000);

const POLICY: &str = "virtual";

struct Entry {
    target: Duration,
    sequence: u64,
    work: Work,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.sequence == other.sequence
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.target, self.sequence).cmp(&(other.target, other.sequence))
    }
}

struct ClockState {
    now: Duration,
    next_sequence: u64,
    pending: BinaryHeap<Reverse<Entry>>,
}

/// A logical-time cursor plus a queue of pending work.
///
/// Cloning yields another handle to the same clock.
#[derive(Clone)]
pub struct VirtualClock {
    state: Arc<Mutex<ClockState>>,
}

impl VirtualClock {
    /// Create a clock at logical time zero with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                now: Duration::ZERO,
                next_sequence: 0,
                pending: BinaryHeap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current logical time, measured from the clock's creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of queued work items.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Queue `work` at the current logical time.
    ///
    /// It runs on the next [`advance`](Self::advance), including
    /// `advance(Duration::ZERO)`.
    pub fn schedule<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_after(Duration::ZERO, work);
    }

    /// Queue `work` to run `delay` after the current logical time.
    pub fn schedule_after<F>(&self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        let target = state.now.saturating_add(delay);
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.pending.push(Reverse(Entry {
            target,
            sequence,
            work: Box::new(work),
        }));
        drop(state);

        tracing::trace!(?target, sequence, "Queued virtual work");
        metrics::counter!(SCHEDULER_WORK_SCHEDULED, "policy" => POLICY).increment(1);
    }

    /// Move logical time forward by `by`, running every item that comes due.
    ///
    /// Items run in `(target, sequence)` order and the clock reads each
    /// item's target time while it runs. Work scheduled by running work is
    /// picked up by the same call if it falls due before the end of the
    /// stride. Afterwards the clock reads `now + by`.
    ///
    /// Returns the number of items that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let final_time = self.lock().now.saturating_add(by);
        let mut executed = 0;

        loop {
            let mut state = self.lock();
            let due = state
                .pending
                .peek()
                .is_some_and(|Reverse(entry)| entry.target <= final_time);
            if !due {
                state.now = final_time;
                break;
            }
            let Some(Reverse(entry)) = state.pending.pop() else {
                state.now = final_time;
                break;
            };
            state.now = state.now.max(entry.target);
            drop(state);

            tracing::trace!(target = ?entry.target, sequence = entry.sequence, "Running virtual work");
            (entry.work)();
            executed += 1;
            metrics::counter!(SCHEDULER_WORK_EXECUTED, "policy" => POLICY).increment(1);
        }

        tracing::debug!(?by, executed, now = ?final_time, "Advanced virtual clock");
        executed
    }

    /// Advance by [`DEFAULT_ADVANCE`], which drains everything that does not
    /// keep rescheduling itself.
    pub fn run(&self) -> usize {
        self.advance(DEFAULT_ADVANCE)
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("VirtualClock")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}
