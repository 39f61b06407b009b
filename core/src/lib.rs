//! # ViewStore Core
//!
//! Core traits and types for the ViewStore architecture.
//!
//! This crate provides the fundamental abstractions for separating business
//! and view logic from rendering using unidirectional data flow.
//!
//! ## Core Concepts
//!
//! - **State**: Immutable snapshot of everything a view needs to render
//! - **Action**: Closed set of commands a store accepts
//! - **Store**: Owner of one State, exposing read / subscribe / send
//! - **`StateStream`**: Replay-latest multicast stream of state snapshots
//! - **Scoping**: Deriving a child store bound to a slice of parent state
//!
//! ## Architecture Principles
//!
//! - Single source of truth per store
//! - Unidirectional data flow: Action → State → View
//! - Errors are folded into State, never thrown out of a store
//! - Stores are polymorphic through the [`Store`] trait, not inheritance
//!
//! ## Example
//!
//! ```
//! use viewstore_core::stream::{Relay, StateStream};
//! use viewstore_core::Store;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! enum CounterAction {
//!     Increment,
//!     Reset,
//! }
//!
//! #[derive(Clone)]
//! struct CounterStore {
//!     state: Relay<CounterState>,
//! }
//!
//! impl Store for CounterStore {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!
//!     fn state(&self) -> CounterState {
//!         self.state.current()
//!     }
//!
//!     fn state_changes(&self) -> StateStream<CounterState> {
//!         self.state.stream()
//!     }
//!
//!     fn send(&self, action: CounterAction) {
//!         let count = match action {
//!             CounterAction::Increment => self.state().count + 1,
//!             CounterAction::Reset => 0,
//!         };
//!         self.state.send(CounterState { count });
//!     }
//! }
//!
//! let store = CounterStore { state: Relay::new(CounterState { count: 0 }) };
//! store.send(CounterAction::Increment);
//! assert_eq!(store.state().count, 1);
//! ```

/// Replay-latest state streams, relays and subscriptions
pub mod stream;

/// Store composition (scoping)
pub mod composition;

pub use composition::ScopedStore;
pub use store::{Binding, Store, StoreExt};
pub use stream::{Relay, StateStream, Subscription, WeakRelay};

/// Store module - The core trait mediating between logic and views
///
/// A view (or any other collaborator) only ever:
/// 1. Constructs a store with some initial configuration
/// 2. Reads the current state snapshot
/// 3. Subscribes to the state-change stream
/// 4. Sends actions
pub mod store {
    use super::composition::ScopedStore;
    use super::stream::StateStream;
    use std::sync::Arc;

    /// The Store trait - single source of truth for a feature
    ///
    /// # Type Parameters
    ///
    /// - `State`: Immutable snapshot of the feature, replaced on every change
    /// - `Action`: Closed command vocabulary, usually an `enum`
    ///
    /// # Contract
    ///
    /// - [`state`](Store::state) never blocks on I/O and is always defined.
    /// - [`state_changes`](Store::state_changes) yields the current state
    ///   first, then every change in order.
    /// - [`send`](Store::send) is synchronous and cannot fail; side effects it
    ///   starts report back through the store's own input streams.
    pub trait Store: Send + Sync {
        /// The state type this store publishes
        type State: Clone + Send + Sync + 'static;

        /// The action type this store accepts
        type Action: Send + 'static;

        /// Latest state snapshot
        fn state(&self) -> Self::State;

        /// Stream of state snapshots, replaying the latest on subscribe
        fn state_changes(&self) -> StateStream<Self::State>;

        /// Perform an action, usually resulting in updated state
        fn send(&self, action: Self::Action);
    }

    impl<S> Store for Arc<S>
    where
        S: Store + ?Sized,
    {
        type State = S::State;
        type Action = S::Action;

        fn state(&self) -> Self::State {
            (**self).state()
        }

        fn state_changes(&self) -> StateStream<Self::State> {
            (**self).state_changes()
        }

        fn send(&self, action: Self::Action) {
            (**self).send(action);
        }
    }

    impl<S> Store for Box<S>
    where
        S: Store + ?Sized,
    {
        type State = S::State;
        type Action = S::Action;

        fn state(&self) -> Self::State {
            (**self).state()
        }

        fn state_changes(&self) -> StateStream<Self::State> {
            (**self).state_changes()
        }

        fn send(&self, action: Self::Action) {
            (**self).send(action);
        }
    }

    /// Two-way accessor pair over a store.
    ///
    /// `get` reads a value out of the latest state, `set` turns a new value
    /// into an action and sends it. This is the plain-function replacement
    /// for UI-framework bindings: a text field reads through `get` and writes
    /// through `set`.
    pub struct Binding<V> {
        get: Arc<dyn Fn() -> V + Send + Sync>,
        set: Arc<dyn Fn(V) + Send + Sync>,
    }

    impl<V> Clone for Binding<V> {
        fn clone(&self) -> Self {
            Self {
                get: Arc::clone(&self.get),
                set: Arc::clone(&self.set),
            }
        }
    }

    impl<V> std::fmt::Debug for Binding<V> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Binding(<get>, <set>)")
        }
    }

    impl<V> Binding<V> {
        /// Create a binding from a getter and a setter
        pub fn new<G, S>(get: G, set: S) -> Self
        where
            G: Fn() -> V + Send + Sync + 'static,
            S: Fn(V) + Send + Sync + 'static,
        {
            Self {
                get: Arc::new(get),
                set: Arc::new(set),
            }
        }

        /// Read the current value
        #[must_use]
        pub fn get(&self) -> V {
            (self.get)()
        }

        /// Write a new value
        pub fn set(&self, value: V) {
            (self.set)(value);
        }
    }

    impl<V> Binding<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        /// A binding that always reads `value` and ignores writes (previews)
        #[must_use]
        pub fn constant(value: V) -> Self {
            Self::new(move || value.clone(), |_| {})
        }
    }

    /// Conveniences available on every cloneable store handle
    pub trait StoreExt: Store + Clone + 'static {
        /// Derive a store scoped to a slice of this store's state.
        ///
        /// The scoped store's state is `get(parent_state)` at every instant;
        /// its actions are wrapped with `embed` and sent to this store.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let banner = photo_list.scope(
        ///     |state: &PhotoListState| state.banner_state.clone(),
        ///     PhotoListAction::Banner,
        /// );
        /// banner.send(BannerDataAction::ClearNetworkingState);
        /// ```
        fn scope<SubState, SubAction, G, E>(&self, get: G, embed: E) -> ScopedStore<SubState, SubAction>
        where
            SubState: Clone + Send + Sync + 'static,
            SubAction: Send + 'static,
            G: Fn(&Self::State) -> SubState + Send + Sync + 'static,
            E: Fn(SubAction) -> Self::Action + Send + Sync + 'static,
        {
            let slices = self.state_changes().map(get);
            let parent = self.clone();
            ScopedStore::new(slices, move |action| parent.send(embed(action)))
        }

        /// Create a [`Binding`] reading `get` from the latest state and sending
        /// `set(value)` on write.
        fn binding<V, G, S>(&self, get: G, set: S) -> Binding<V>
        where
            G: Fn(&Self::State) -> V + Send + Sync + 'static,
            S: Fn(V) -> Self::Action + Send + Sync + 'static,
        {
            let reader = self.clone();
            let writer = self.clone();
            Binding::new(move || get(&reader.state()), move |value| writer.send(set(value)))
        }

        /// Create a `Binding<bool>` that is `true` while `get` returns `Some`.
        ///
        /// Writing `false` sends `clear`. Writing `true` is a programmer error:
        /// presence can only be produced by the store itself.
        fn presence_binding<V, G>(&self, get: G, clear: Self::Action) -> Binding<bool>
        where
            G: Fn(&Self::State) -> Option<V> + Send + Sync + 'static,
            Self::Action: Clone + Sync,
        {
            let reader = self.clone();
            let writer = self.clone();
            Binding::new(
                move || get(&reader.state()).is_some(),
                move |present| {
                    if present {
                        tracing::warn!("presence binding received `true`; ignoring");
                        debug_assert!(!present, "presence binding can only be cleared");
                        return;
                    }
                    writer.send(clear.clone());
                },
            )
        }
    }

    impl<S> StoreExt for S where S: Store + Clone + 'static {}
}
