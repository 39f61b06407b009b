//! Replay-latest state streams.
//!
//! This module defines the publishing primitive every store exposes:
//!
//! - [`Relay`]: the write side. Owned by whoever produces values (a store, an
//!   operator, a fake network controller). Always holds a current value.
//! - [`StateStream`]: the read side. Cheap to clone, hands out
//!   [`Subscription`]s.
//! - [`Subscription`]: RAII guard. Dropping it stops delivery.
//!
//! # Delivery Semantics
//!
//! - A new subscriber is called with the current value first, then with every
//!   later value.
//! - Values are delivered one at a time. A value sent while another one is
//!   being delivered (from a callback, or from another thread) is queued and
//!   delivered afterwards, so all subscribers observe the same total order.
//! - Only the latest value is kept for replay; the queue only holds values
//!   that are still in flight.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use viewstore_core::stream::Relay;
//!
//! let relay = Relay::new(0);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let _subscription = relay.stream().subscribe(move |value: &i32| {
//!     sink.lock().unwrap().push(*value);
//! });
//!
//! relay.send(1);
//! relay.send(2);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
//! ```

use futures::Stream;
use futures::channel::mpsc;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::task::{Context, Poll};

/// Callback invoked for every delivered value.
type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A registered subscriber.
struct Subscriber<T> {
    id: u64,
    /// Version of the value that was current when this subscriber attached.
    /// Only values with a newer version are delivered to it.
    since: u64,
    active: Arc<AtomicBool>,
    callback: Callback<T>,
}

/// Work waiting in the delivery queue.
enum Pending<T> {
    /// A newly sent value, delivered to every subscriber attached before it.
    Emit { version: u64, value: T },
    /// The replay of the current value to a single new subscriber.
    Replay { id: u64, value: T },
}

struct Shared<T> {
    current: T,
    version: u64,
    next_id: u64,
    delivering: bool,
    subscribers: Vec<Subscriber<T>>,
    queue: VecDeque<Pending<T>>,
    /// Upstream subscriptions feeding this stream (operators, pipelines).
    upstream: Vec<Subscription>,
}

struct Inner<T> {
    shared: Mutex<Shared<T>>,
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().subscribers.retain(|subscriber| subscriber.id != id);
    }
}

/// Resets the delivery flag if a callback unwinds mid-delivery.
///
/// Without it a panicking subscriber would leave the stream believing a
/// delivery is still in progress, and every later value would be queued
/// forever.
struct DeliveryGuard<'a, T> {
    inner: &'a Inner<T>,
    armed: bool,
}

impl<T> DeliveryGuard<'_, T> {
    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T> Drop for DeliveryGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut shared = self.inner.lock();
            shared.delivering = false;
            shared.queue.clear();
        }
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Delivers queued values until the queue is empty.
    ///
    /// Must be entered with `delivering` already set by the caller. The lock
    /// is released around every callback so callbacks may send, subscribe or
    /// unsubscribe freely.
    fn drain<'a>(&'a self, mut shared: MutexGuard<'a, Shared<T>>) {
        let mut guard = DeliveryGuard { inner: self, armed: true };

        loop {
            let Some(pending) = shared.queue.pop_front() else {
                shared.delivering = false;
                break;
            };

            let (targets, value): (Vec<(Arc<AtomicBool>, Callback<T>)>, T) = match pending {
                Pending::Emit { version, value } => (
                    shared
                        .subscribers
                        .iter()
                        .filter(|subscriber| subscriber.since < version)
                        .map(|subscriber| {
                            (Arc::clone(&subscriber.active), Arc::clone(&subscriber.callback))
                        })
                        .collect(),
                    value,
                ),
                Pending::Replay { id, value } => (
                    shared
                        .subscribers
                        .iter()
                        .filter(|subscriber| subscriber.id == id)
                        .map(|subscriber| {
                            (Arc::clone(&subscriber.active), Arc::clone(&subscriber.callback))
                        })
                        .collect(),
                    value,
                ),
            };
            drop(shared);

            for (active, callback) in targets {
                if active.load(Ordering::Acquire) {
                    callback(&value);
                }
            }

            shared = self.lock();
        }

        drop(shared);
        guard.disarm();
    }

    fn send(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Mutates the current value and queues the result as one step, so
    /// concurrent updates are applied and emitted in the same order.
    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut T),
    {
        let mut shared = self.lock();
        apply(&mut shared.current);
        shared.version += 1;
        let version = shared.version;
        let value = shared.current.clone();
        shared.queue.push_back(Pending::Emit { version, value });

        if shared.delivering {
            // The active deliverer picks this value up after the one in flight.
            return;
        }

        shared.delivering = true;
        self.drain(shared);
    }

    /// Registers a subscriber and returns the current value, read under the
    /// same lock so no emission can slip between the two.
    fn attach(&self, callback: Callback<T>, replay: bool) -> (u64, Arc<AtomicBool>, T) {
        let mut shared = self.lock();
        let id = shared.next_id;
        shared.next_id += 1;

        let active = Arc::new(AtomicBool::new(true));
        let since = shared.version;
        shared.subscribers.push(Subscriber {
            id,
            since,
            active: Arc::clone(&active),
            callback,
        });

        let current = shared.current.clone();

        if replay {
            shared.queue.push_back(Pending::Replay {
                id,
                value: current.clone(),
            });
            if !shared.delivering {
                shared.delivering = true;
                self.drain(shared);
            }
        }

        (id, active, current)
    }
}

/// The write side of a state stream.
///
/// A `Relay` always holds a value. Sending replaces it and delivers the new
/// value to every subscriber of [`Relay::stream`].
///
/// Relays are the instance-owned input subjects of a store: a store keeps one
/// relay per independent input (a toggle, a text field, a network result) and
/// combines their streams into its state.
pub struct Relay<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Relay<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Relay<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.lock();
        f.debug_struct("Relay")
            .field("current", &shared.current)
            .field("version", &shared.version)
            .field("subscribers", &shared.subscribers.len())
            .finish()
    }
}

impl<T> Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a relay seeded with `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    current: initial,
                    version: 0,
                    next_id: 0,
                    delivering: false,
                    subscribers: Vec::new(),
                    queue: VecDeque::new(),
                    upstream: Vec::new(),
                }),
            }),
        }
    }

    /// Replace the current value and deliver it to every subscriber.
    pub fn send(&self, value: T) {
        self.inner.send(value);
    }

    /// Modify the current value in place and deliver the result.
    ///
    /// The read, the modification and the queueing of the new value happen
    /// under one lock. Producers on different threads that each change part
    /// of a value therefore never overwrite each other's changes, and the
    /// delivered sequence matches the order the updates were applied in.
    pub fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut T),
    {
        self.inner.update(apply);
    }

    /// The latest value sent (or the seed).
    #[must_use]
    pub fn current(&self) -> T {
        self.inner.lock().current.clone()
    }

    /// The read side of this relay.
    #[must_use]
    pub fn stream(&self) -> StateStream<T> {
        StateStream {
            inner: Arc::clone(&self.inner),
        }
    }

    /// A non-owning handle, for work that must not keep the relay alive
    /// (scheduled completions, upstream callbacks).
    #[must_use]
    pub fn downgrade(&self) -> WeakRelay<T> {
        WeakRelay {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Keep `subscription` alive for as long as this relay's stream exists.
    ///
    /// Operators use this to tie the lifetime of their upstream subscription
    /// to the derived stream.
    pub fn retain(&self, subscription: Subscription) {
        self.inner.lock().upstream.push(subscription);
    }
}

/// A weak handle to a [`Relay`].
pub struct WeakRelay<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for WeakRelay<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakRelay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Upgrade to a [`Relay`] if any stream or relay handle is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Relay<T>> {
        self.inner.upgrade().map(|inner| Relay { inner })
    }

    /// Send `value` if the relay is still alive; otherwise do nothing.
    ///
    /// Returns whether the value was delivered.
    pub fn send(&self, value: T) -> bool {
        match self.upgrade() {
            Some(relay) => {
                relay.send(value);
                true
            },
            None => {
                tracing::trace!("Relay dropped, discarding value");
                false
            },
        }
    }
}

/// The read side of a replay-latest, multicast stream of values.
///
/// Every store exposes its state changes as a `StateStream`. Subscribing
/// yields the current value immediately and then every later value, in
/// emission order.
pub struct StateStream<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for StateStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for StateStream<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.lock();
        f.debug_struct("StateStream")
            .field("current", &shared.current)
            .field("subscribers", &shared.subscribers.len())
            .finish()
    }
}

impl<T> StateStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A stream that only ever holds `value`.
    #[must_use]
    pub fn just(value: T) -> Self {
        Relay::new(value).stream()
    }

    /// The latest value.
    #[must_use]
    pub fn current(&self) -> T {
        self.inner.lock().current.clone()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Subscribe to the current value and every later value.
    ///
    /// When no delivery is in progress the callback is invoked with the
    /// current value before this method returns. When called from inside
    /// another callback of the same stream, the replay is queued behind the
    /// value in flight.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let (id, active, _) = self.inner.attach(Arc::new(callback), true);
        self.subscription(id, active)
    }

    /// Subscribe to later values only, returning the current value alongside
    /// the subscription.
    ///
    /// The current value is read atomically with the registration, so the
    /// caller sees every value exactly once: the returned one, then each
    /// delivery.
    pub fn subscribe_from_current<F>(&self, callback: F) -> (T, Subscription)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let (id, active, current) = self.inner.attach(Arc::new(callback), false);
        (current, self.subscription(id, active))
    }

    fn subscription(&self, id: u64, active: Arc<AtomicBool>) -> Subscription {
        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            active.store(false, Ordering::Release);
            inner.unsubscribe(id);
        })
    }

    /// Build a derived stream.
    ///
    /// `seed` computes the derived stream's initial value from this stream's
    /// current value. `forward` is called with every later value and the
    /// derived relay; it decides what (if anything) to send downstream.
    ///
    /// The derived stream keeps this stream alive; dropping every handle to
    /// the derived stream unsubscribes it.
    pub fn derive<U, S, F>(&self, seed: S, forward: F) -> StateStream<U>
    where
        U: Clone + Send + Sync + 'static,
        S: FnOnce(&T) -> U,
        F: Fn(&T, &Relay<U>) + Send + Sync + 'static,
    {
        let slot: Arc<OnceLock<WeakRelay<U>>> = Arc::new(OnceLock::new());
        let target = Arc::clone(&slot);

        let (current, subscription) = self.subscribe_from_current(move |value: &T| {
            if let Some(relay) = target.get().and_then(WeakRelay::upgrade) {
                forward(value, &relay);
            }
        });

        let relay = Relay::new(seed(&current));
        let _ = slot.set(relay.downgrade());
        relay.retain(subscription);
        relay.stream()
    }

    /// Transform every value with `transform`.
    pub fn map<U, F>(&self, transform: F) -> StateStream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let transform = Arc::new(transform);
        let seed = Arc::clone(&transform);
        self.derive(
            move |value| seed(value),
            move |value, relay| relay.send(transform(value)),
        )
    }

    /// Skip values equal to the previously delivered one.
    #[must_use]
    pub fn remove_duplicates(&self) -> Self
    where
        T: PartialEq,
    {
        self.derive(T::clone, |value, relay| {
            if relay.current() != *value {
                relay.send(value.clone());
            }
        })
    }

    /// Adapt this stream into a [`futures::Stream`] for async consumers.
    ///
    /// The first item is the current value. Values are buffered without
    /// coalescing until polled.
    #[must_use]
    pub fn into_stream(self) -> StateChanges<T> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.subscribe(move |value: &T| {
            // Receiver gone means the consumer stopped listening.
            let _ = sender.unbounded_send(value.clone());
        });

        StateChanges {
            receiver,
            _subscription: subscription,
        }
    }
}

/// Async adapter returned by [`StateStream::into_stream`].
pub struct StateChanges<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    _subscription: Subscription,
}

impl<T> Stream for StateChanges<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

/// RAII handle for a subscription.
///
/// Dropping the handle stops delivery: no callback fires for values sent
/// after the drop.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when dropped.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    #[must_use]
    pub const fn empty() -> Self {
        Self { cancel: None }
    }

    /// Cancel now instead of on drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
