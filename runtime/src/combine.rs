//! Combine-latest over tuples of state streams.
//!
//! `combine_latest` turns N seeded input streams into one stream of tuples.
//! The first tuple holds every input's current value; afterwards each input
//! emission produces a new tuple with that slot replaced.
//!
//! This is the heart of a store's derived-state pipeline: every independent
//! input (fetched items, a toggle, a search field, a nested store) is a
//! stream, and a pure function maps the latest tuple to the store's State.
//!
//! # Example
//!
//! ```
//! use viewstore_core::Relay;
//! use viewstore_runtime::combine_latest;
//!
//! let count = Relay::new(1);
//! let label = Relay::new("items".to_string());
//!
//! let title = combine_latest((count.stream(), label.stream()))
//!     .map(|(count, label): &(i32, String)| format!("{count} {label}"));
//!
//! count.send(3);
//! assert_eq!(title.current(), "3 items");
//! ```

use crate::metrics::PIPELINE_COMBINED_EMITTED;
use std::sync::{Arc, OnceLock};
use viewstore_core::stream::{Relay, StateStream, WeakRelay};

/// Tuples of streams that can be combined.
///
/// Implemented for tuples of 2 to 6 [`StateStream`]s.
pub trait CombineLatest {
    /// Tuple of the input value types.
    type Output: Clone + Send + Sync + 'static;

    /// Combine the inputs into one stream of tuples.
    fn combine_latest(self) -> StateStream<Self::Output>;
}

/// Combine a tuple of streams into one stream of their latest values.
pub fn combine_latest<C>(streams: C) -> StateStream<C::Output>
where
    C: CombineLatest,
{
    streams.combine_latest()
}

/// Slot for the output relay, filled once the seed tuple is known.
type OutputSlot<T> = Arc<OnceLock<WeakRelay<T>>>;

/// Replace one slot of the output tuple.
///
/// The slot is patched inside [`Relay::update`], so ticks arriving on
/// different threads are applied to the latest tuple and published in the
/// order they were applied. Ticks before the output exists are dropped; the
/// seed already holds every input's current value.
fn update<T, F>(slot: &OutputSlot<T>, arity: &'static str, apply: F)
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(&mut T),
{
    let Some(relay) = slot.get().and_then(WeakRelay::upgrade) else {
        return;
    };
    relay.update(apply);
    metrics::counter!(PIPELINE_COMBINED_EMITTED, "arity" => arity).increment(1);
}

macro_rules! impl_combine_latest {
    ($arity:literal => $( ($T:ident, $value:ident, $idx:tt) ),+) => {
        impl<$($T),+> CombineLatest for ($(StateStream<$T>,)+)
        where
            $($T: Clone + Send + Sync + 'static,)+
        {
            type Output = ($($T,)+);

            fn combine_latest(self) -> StateStream<Self::Output> {
                let slot: OutputSlot<Self::Output> = Arc::new(OnceLock::new());
                let mut subscriptions = Vec::with_capacity($arity);

                $(
                    let $value = {
                        let slot = Arc::clone(&slot);
                        let (current, subscription) = self.$idx.subscribe_from_current(move |value: &$T| {
                            update(&slot, stringify!($arity), |values| values.$idx = value.clone());
                        });
                        subscriptions.push(subscription);
                        current
                    };
                )+

                let relay = Relay::new(($($value,)+));
                let _ = slot.set(relay.downgrade());
                for subscription in subscriptions {
                    relay.retain(subscription);
                }

                tracing::trace!(arity = $arity, "Combined streams");
                relay.stream()
            }
        }
    };
}

impl_combine_latest!(2 => (A, a, 0), (B, b, 1));
impl_combine_latest!(3 => (A, a, 0), (B, b, 1), (C, c, 2));
impl_combine_latest!(4 => (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3));
impl_combine_latest!(5 => (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4));
impl_combine_latest!(6 => (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5));

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use std::sync::{Barrier, Mutex};
    use std::thread;

    #[test]
    fn seed_is_every_current_value() {
        let a = Relay::new(1);
        let b = Relay::new("b");
        let c = Relay::new(false);

        let combined = combine_latest((a.stream(), b.stream(), c.stream()));

        assert_eq!(combined.current(), (1, "b", false));
    }

    #[test]
    fn each_input_emission_replaces_its_slot() {
        let a = Relay::new(0);
        let b = Relay::new(0);
        let combined = combine_latest((a.stream(), b.stream()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = combined.subscribe(move |value: &(i32, i32)| sink.lock().unwrap().push(*value));

        a.send(1);
        b.send(2);
        a.send(3);

        assert_eq!(*seen.lock().unwrap(), vec![(0, 0), (1, 0), (1, 2), (3, 2)]);
    }

    #[test]
    fn six_inputs() {
        let relays: Vec<Relay<u8>> = (0..6).map(Relay::new).collect();
        let combined = combine_latest((
            relays[0].stream(),
            relays[1].stream(),
            relays[2].stream(),
            relays[3].stream(),
            relays[4].stream(),
            relays[5].stream(),
        ));

        relays[5].send(50);

        assert_eq!(combined.current(), (0, 1, 2, 3, 4, 50));
    }

    #[test]
    fn dropping_output_releases_inputs() {
        let a = Relay::new(0);
        let b = Relay::new(0);
        let combined = combine_latest((a.stream(), b.stream()));
        assert_eq!(a.stream().subscriber_count(), 1);

        drop(combined);

        assert_eq!(a.stream().subscriber_count(), 0);
        assert_eq!(b.stream().subscriber_count(), 0);
    }

    #[test]
    fn same_stream_twice_updates_both_slots_in_order() {
        let a = Relay::new(0);
        let combined = combine_latest((a.stream(), a.stream().map(|v: &i32| v * 10)));

        a.send(2);

        assert_eq!(combined.current(), (2, 20));
    }

    #[test]
    fn concurrent_inputs_settle_on_latest_tuple() {
        for _ in 0..2_000 {
            let a = Relay::new(0_u32);
            let b = Relay::new(0_u32);
            let combined = combine_latest((a.stream(), b.stream()));
            let start = Arc::new(Barrier::new(2));

            let workers: Vec<_> = [a.clone(), b.clone()]
                .into_iter()
                .map(|relay| {
                    let start = Arc::clone(&start);
                    thread::spawn(move || {
                        start.wait();
                        for value in 1..=20 {
                            relay.send(value);
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }

            assert_eq!(combined.current(), (20, 20));
        }
    }

    #[test]
    fn concurrent_inputs_never_publish_a_regressed_slot() {
        let a = Relay::new(0_u32);
        let b = Relay::new(0_u32);
        let combined = combine_latest((a.stream(), b.stream()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = combined.subscribe(move |value: &(u32, u32)| sink.lock().unwrap().push(*value));

        let start = Arc::new(Barrier::new(2));
        let workers: Vec<_> = [a.clone(), b.clone()]
            .into_iter()
            .map(|relay| {
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    for value in 1..=500 {
                        relay.send(value);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1_001);
        for pair in seen.windows(2) {
            assert!(pair[1].0 >= pair[0].0 && pair[1].1 >= pair[0].1, "regressed: {pair:?}");
        }
        assert_eq!(seen.last(), Some(&(500, 500)));
    }
}
