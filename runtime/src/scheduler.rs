//! "When does work run" policies.
//!
//! Every time-dependent operator in a pipeline ([`debounce`], [`throttle`],
//! [`receive_on`]) takes a [`Scheduler`]. Production code passes a real-time
//! scheduler, tests pass a [`VirtualClock`] and drive time by hand, and
//! previews pass [`Scheduler::Immediate`] to make every pipeline synchronous.
//!
//! [`debounce`]: crate::operators::StreamSchedulingExt::debounce
//! [`throttle`]: crate::operators::StreamSchedulingExt::throttle
//! [`receive_on`]: crate::operators::StreamSchedulingExt::receive_on

use crate::error::SchedulerError;
use crate::metrics::{SCHEDULER_WORK_EXECUTED, SCHEDULER_WORK_SCHEDULED};
use crate::virtual_clock::VirtualClock;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// A unit of scheduled work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling policy.
///
/// Cloning a scheduler yields another handle to the same queue (or clock).
#[derive(Clone, Debug, Default)]
pub enum Scheduler {
    /// Run work on the calling thread before returning. Delays are ignored.
    #[default]
    Immediate,

    /// Run work on a tokio runtime, in submission order.
    RealTime(RealTimeScheduler),

    /// Queue work on a [`VirtualClock`]; nothing runs until it is advanced.
    Virtual(VirtualClock),
}

impl Scheduler {
    /// A real-time scheduler on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn real_time() -> Result<Self, SchedulerError> {
        RealTimeScheduler::current().map(Self::RealTime)
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn policy(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::RealTime(_) => "real_time",
            Self::Virtual(_) => "virtual",
        }
    }

    /// Run `work` as soon as the policy allows.
    pub fn schedule<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Immediate => run_immediately(work),
            Self::RealTime(scheduler) => scheduler.schedule(work),
            Self::Virtual(clock) => clock.schedule(work),
        }
    }

    /// Run `work` once `delay` has passed.
    ///
    /// [`Scheduler::Immediate`] ignores the delay.
    pub fn schedule_after<F>(&self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Immediate => run_immediately(work),
            Self::RealTime(scheduler) => scheduler.schedule_after(delay, work),
            Self::Virtual(clock) => clock.schedule_after(delay, work),
        }
    }

    /// The virtual clock behind this scheduler, if any.
    #[must_use]
    pub const fn as_virtual(&self) -> Option<&VirtualClock> {
        match self {
            Self::Virtual(clock) => Some(clock),
            Self::Immediate | Self::RealTime(_) => None,
        }
    }
}

impl From<VirtualClock> for Scheduler {
    fn from(clock: VirtualClock) -> Self {
        Self::Virtual(clock)
    }
}

impl From<RealTimeScheduler> for Scheduler {
    fn from(scheduler: RealTimeScheduler) -> Self {
        Self::RealTime(scheduler)
    }
}

fn run_immediately<F>(work: F)
where
    F: FnOnce() + Send + 'static,
{
    metrics::counter!(SCHEDULER_WORK_SCHEDULED, "policy" => "immediate").increment(1);
    work();
    metrics::counter!(SCHEDULER_WORK_EXECUTED, "policy" => "immediate").increment(1);
}

/// Serial work queue on a tokio runtime.
///
/// A single worker task drains the queue, so work runs one item at a time in
/// submission order. Delayed work sleeps on its own task and then joins the
/// same queue.
#[derive(Clone)]
pub struct RealTimeScheduler {
    sender: mpsc::UnboundedSender<Work>,
    handle: Handle,
}

impl RealTimeScheduler {
    const POLICY: &'static str = "real_time";

    /// Spawn the worker on `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Work>();

        handle.spawn(async move {
            tracing::debug!("Real-time scheduler worker started");
            while let Some(work) = receiver.recv().await {
                work();
                metrics::counter!(SCHEDULER_WORK_EXECUTED, "policy" => Self::POLICY).increment(1);
            }
            tracing::debug!("Real-time scheduler worker stopped");
        });

        Self { sender, handle }
    }

    /// Spawn the worker on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| SchedulerError::NoRuntime)
    }

    /// Queue `work` behind everything already submitted.
    pub fn schedule<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        metrics::counter!(SCHEDULER_WORK_SCHEDULED, "policy" => Self::POLICY).increment(1);
        if self.sender.send(Box::new(work)).is_err() {
            tracing::warn!("Real-time scheduler worker is gone, dropping work");
        }
    }

    /// Queue `work` once `delay` has elapsed.
    pub fn schedule_after<F>(&self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if delay.is_zero() {
            self.schedule(work);
            return;
        }

        metrics::counter!(SCHEDULER_WORK_SCHEDULED, "policy" => Self::POLICY).increment(1);
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(Box::new(work)).is_err() {
                tracing::warn!("Real-time scheduler worker is gone, dropping delayed work");
            }
        });
    }
}

impl std::fmt::Debug for RealTimeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealTimeScheduler")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn immediate_runs_before_returning() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let scheduler = Scheduler::Immediate;

        let sink = Arc::clone(&ran);
        scheduler.schedule_after(Duration::from_secs(60), move || sink.lock().unwrap().push(1));

        assert_eq!(*ran.lock().unwrap(), vec![1]);
        assert_eq!(scheduler.policy(), "immediate");
    }

    #[test]
    fn real_time_requires_a_runtime() {
        let error = Scheduler::real_time().unwrap_err();
        assert!(matches!(error, SchedulerError::NoRuntime));
    }

    #[test]
    fn virtual_scheduler_exposes_its_clock() {
        let clock = VirtualClock::new();
        let scheduler = Scheduler::from(clock.clone());

        scheduler.schedule(|| {});

        assert_eq!(scheduler.as_virtual().map(VirtualClock::pending), Some(1));
        assert_eq!(clock.pending(), 1);
        assert!(Scheduler::Immediate.as_virtual().is_none());
    }

    #[tokio::test]
    async fn real_time_runs_in_submission_order() {
        let scheduler = Scheduler::real_time().unwrap();
        let ran = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        for value in 0..10 {
            let sink = Arc::clone(&ran);
            scheduler.schedule(move || sink.lock().unwrap().push(value));
        }
        scheduler.schedule(move || {
            let _ = done_tx.send(());
        });

        done_rx.await.unwrap();
        assert_eq!(*ran.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn real_time_delayed_work_waits() {
        let scheduler = Scheduler::real_time().unwrap();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let started = tokio::time::Instant::now();

        scheduler.schedule_after(Duration::from_millis(50), move || {
            let _ = done_tx.send(());
        });

        done_rx.await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
