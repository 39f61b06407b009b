//! Time-aware stream operators.
//!
//! These extend [`StateStream`] with operators that need a [`Scheduler`]:
//!
//! - [`debounce`](StreamSchedulingExt::debounce): emit once input settles
//! - [`throttle`](StreamSchedulingExt::throttle): at most one value per window
//! - [`receive_on`](StreamSchedulingExt::receive_on): deliver through a scheduler
//!
//! Every operator seeds its output with the upstream's current value and only
//! applies timing to later values. Like every derived stream, the output keeps
//! its upstream alive and dropping it releases the upstream subscription.
//! Scheduled deliveries hold the output weakly and do nothing once it is gone.

use crate::scheduler::Scheduler;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use viewstore_core::stream::{StateStream, WeakRelay};

/// Scheduling operators for [`StateStream`].
pub trait StreamSchedulingExt<T> {
    /// Emit a value only after `interval` passes without a newer one.
    ///
    /// With [`Scheduler::Immediate`] every value passes straight through.
    #[must_use]
    fn debounce(&self, interval: Duration, scheduler: &Scheduler) -> StateStream<T>;

    /// Emit at most one value per `interval`.
    ///
    /// The first value after a quiet period opens a window; when the window
    /// closes the newest value seen in it (`latest = true`) or the first one
    /// (`latest = false`) is emitted. There is no leading emission.
    #[must_use]
    fn throttle(&self, interval: Duration, scheduler: &Scheduler, latest: bool) -> StateStream<T>;

    /// Deliver every later value through `scheduler`.
    #[must_use]
    fn receive_on(&self, scheduler: &Scheduler) -> StateStream<T>;
}

struct ThrottleWindow<T> {
    open: bool,
    pending: Option<T>,
}

impl<T> StreamSchedulingExt<T> for StateStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn debounce(&self, interval: Duration, scheduler: &Scheduler) -> StateStream<T> {
        let scheduler = scheduler.clone();
        let generation = Arc::new(AtomicU64::new(0));

        self.derive(T::clone, move |value, relay| {
            let ticket = generation.fetch_add(1, Ordering::AcqRel) + 1;
            let latest = Arc::clone(&generation);
            let target = relay.downgrade();
            let value = value.clone();

            scheduler.schedule_after(interval, move || {
                if latest.load(Ordering::Acquire) == ticket {
                    target.send(value);
                } else {
                    tracing::trace!(ticket, "Debounced value superseded");
                }
            });
        })
    }

    fn throttle(&self, interval: Duration, scheduler: &Scheduler, latest: bool) -> StateStream<T> {
        let scheduler = scheduler.clone();
        let window = Arc::new(Mutex::new(ThrottleWindow::<T> {
            open: false,
            pending: None,
        }));

        self.derive(T::clone, move |value, relay| {
            let opens_window = {
                let mut window = window.lock().unwrap_or_else(PoisonError::into_inner);
                if window.open {
                    if latest || window.pending.is_none() {
                        window.pending = Some(value.clone());
                    }
                    false
                } else {
                    window.open = true;
                    window.pending = Some(value.clone());
                    true
                }
            };

            if !opens_window {
                return;
            }

            let window = Arc::clone(&window);
            let target: WeakRelay<T> = relay.downgrade();
            scheduler.schedule_after(interval, move || {
                let flushed = {
                    let mut window = window.lock().unwrap_or_else(PoisonError::into_inner);
                    window.open = false;
                    window.pending.take()
                };
                if let Some(value) = flushed {
                    target.send(value);
                }
            });
        })
    }

    fn receive_on(&self, scheduler: &Scheduler) -> StateStream<T> {
        let scheduler = scheduler.clone();

        self.derive(T::clone, move |value, relay| {
            let target = relay.downgrade();
            let value = value.clone();
            scheduler.schedule(move || {
                target.send(value);
            });
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use crate::virtual_clock::VirtualClock;
    use viewstore_core::stream::{Relay, Subscription};

    fn record<T: Clone + Send + Sync + 'static>(stream: &StateStream<T>) -> (Arc<Mutex<Vec<T>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = stream.subscribe(move |value: &T| sink.lock().unwrap().push(value.clone()));
        (seen, subscription)
    }

    mod debounce_tests {
        use super::*;

        #[test]
        fn emits_after_quiet_interval() {
            let clock = VirtualClock::new();
            let input = Relay::new(String::new());
            let debounced = input.stream().debounce(Duration::from_secs(1), &clock.clone().into());
            let (seen, _subscription) = record(&debounced);

            input.send("2".to_string());
            clock.advance(Duration::from_millis(999));
            assert_eq!(*seen.lock().unwrap(), vec![String::new()]);

            clock.advance(Duration::from_millis(1));
            assert_eq!(*seen.lock().unwrap(), vec![String::new(), "2".to_string()]);
        }

        #[test]
        fn newer_value_restarts_the_interval() {
            let clock = VirtualClock::new();
            let input = Relay::new(0);
            let debounced = input.stream().debounce(Duration::from_secs(1), &clock.clone().into());
            let (seen, _subscription) = record(&debounced);

            input.send(1);
            clock.advance(Duration::from_millis(500));
            input.send(2);
            clock.advance(Duration::from_millis(900));
            assert_eq!(*seen.lock().unwrap(), vec![0]);

            clock.advance(Duration::from_millis(100));
            assert_eq!(*seen.lock().unwrap(), vec![0, 2]);
        }

        #[test]
        fn immediate_scheduler_passes_through() {
            let input = Relay::new(0);
            let debounced = input.stream().debounce(Duration::from_secs(1), &Scheduler::Immediate);

            input.send(5);

            assert_eq!(debounced.current(), 5);
        }

        #[test]
        fn dropped_output_ignores_pending_work() {
            let clock = VirtualClock::new();
            let input = Relay::new(0);
            let debounced = input.stream().debounce(Duration::from_secs(1), &clock.clone().into());

            input.send(1);
            drop(debounced);

            assert_eq!(clock.run(), 1);
            assert_eq!(input.stream().subscriber_count(), 0);
        }
    }

    mod throttle_tests {
        use super::*;

        #[test]
        fn emits_latest_value_at_end_of_window() {
            let clock = VirtualClock::new();
            let input = Relay::new(0);
            let throttled = input.stream().throttle(Duration::from_secs(1), &clock.clone().into(), true);
            let (seen, _subscription) = record(&throttled);

            input.send(1);
            input.send(2);
            input.send(3);
            assert_eq!(*seen.lock().unwrap(), vec![0]);

            clock.advance(Duration::from_secs(1));
            assert_eq!(*seen.lock().unwrap(), vec![0, 3]);
        }

        #[test]
        fn emits_first_value_when_not_latest() {
            let clock = VirtualClock::new();
            let input = Relay::new(0);
            let throttled = input.stream().throttle(Duration::from_secs(1), &clock.clone().into(), false);
            let (seen, _subscription) = record(&throttled);

            input.send(1);
            input.send(2);
            clock.advance(Duration::from_secs(1));

            assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
        }

        #[test]
        fn next_value_opens_a_new_window() {
            let clock = VirtualClock::new();
            let input = Relay::new(0);
            let throttled = input.stream().throttle(Duration::from_secs(1), &clock.clone().into(), true);
            let (seen, _subscription) = record(&throttled);

            input.send(1);
            clock.advance(Duration::from_secs(1));
            input.send(2);
            clock.advance(Duration::from_millis(500));
            assert_eq!(*seen.lock().unwrap(), vec![0, 1]);

            clock.advance(Duration::from_millis(500));
            assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        }

        #[test]
        fn immediate_scheduler_passes_every_value() {
            let input = Relay::new(0);
            let throttled = input.stream().throttle(Duration::from_secs(1), &Scheduler::Immediate, true);
            let (seen, _subscription) = record(&throttled);

            input.send(1);
            input.send(2);

            assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        }
    }

    mod receive_on_tests {
        use super::*;

        #[test]
        fn seed_is_immediate_and_later_values_wait_for_the_clock() {
            let clock = VirtualClock::new();
            let input = Relay::new(1);
            let received = input.stream().receive_on(&clock.clone().into());

            input.send(2);
            input.send(3);
            assert_eq!(received.current(), 1);

            clock.advance(Duration::ZERO);
            assert_eq!(received.current(), 3);
        }

        #[test]
        fn preserves_order() {
            let clock = VirtualClock::new();
            let input = Relay::new(0);
            let received = input.stream().receive_on(&clock.clone().into());
            let (seen, _subscription) = record(&received);

            for value in 1..=4 {
                input.send(value);
            }
            clock.run();

            assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        }
    }
}
