//! # ViewStore Testing
//!
//! Testing utilities and helpers for the ViewStore architecture.
//!
//! This crate provides:
//! - [`MockStore`]: a static store for previews and view tests
//! - [`StateRecorder`]: collects every emission of a state stream
//! - [`StoreTest`]: fluent Given-When-Then harness driving a virtual clock
//! - Assertion helpers for stores and recorded emissions
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use viewstore_runtime::VirtualClock;
//! use viewstore_testing::StoreTest;
//!
//! #[test]
//! fn search_filters_after_debounce() {
//!     let clock = VirtualClock::new();
//!     let store = PhotoListStore::new(MockItemProvider::with_count(3), clock.clone().into());
//!
//!     StoreTest::given_store(store)
//!         .with_clock(clock)
//!         .when_action(PhotoListAction::Search("2".to_string()))
//!         .advance(Duration::from_secs(1))
//!         .then_state(|state| assert_eq!(state.photos().len(), 1))
//!         .run();
//! }
//! ```


pub use store_test::{StoreTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use std::sync::{Arc, Mutex, PoisonError};
    use viewstore_core::{Relay, StateStream, Store};

    /// A store with a fixed state that records every action sent to it.
    ///
    /// Useful for previews and for testing views or child stores in
    /// isolation: the state only changes when the test calls
    /// [`set_state`](MockStore::set_state).
    ///
    /// # Example
    ///
    /// ```
    /// use viewstore_core::Store;
    /// use viewstore_testing::MockStore;
    ///
    /// let store = MockStore::<i32, &str>::new(3);
    /// store.send("tap");
    ///
    /// assert_eq!(store.state(), 3);
    /// assert_eq!(store.sent_actions(), vec!["tap"]);
    /// ```
    pub struct MockStore<S, A> {
        state: Relay<S>,
        sent: Arc<Mutex<Vec<A>>>,
    }

    impl<S, A> Clone for MockStore<S, A> {
        fn clone(&self) -> Self {
            Self {
                state: self.state.clone(),
                sent: Arc::clone(&self.sent),
            }
        }
    }

    impl<S, A> MockStore<S, A>
    where
        S: Clone + Send + Sync + 'static,
        A: Send + 'static,
    {
        /// Create a mock store holding `state`
        #[must_use]
        pub fn new(state: S) -> Self {
            Self {
                state: Relay::new(state),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Replace the state, emitting it to subscribers
        pub fn set_state(&self, state: S) {
            self.state.send(state);
        }

        /// Actions received so far, in order
        #[must_use]
        pub fn sent_actions(&self) -> Vec<A>
        where
            A: Clone,
        {
            self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Forget recorded actions
        pub fn clear_actions(&self) {
            self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    impl<S, A> Store for MockStore<S, A>
    where
        S: Clone + Send + Sync + 'static,
        A: Send + 'static,
    {
        type State = S;
        type Action = A;

        fn state(&self) -> S {
            self.state.current()
        }

        fn state_changes(&self) -> StateStream<S> {
            self.state.stream()
        }

        fn send(&self, action: A) {
            tracing::trace!("MockStore recorded action");
            self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(action);
        }
    }

    impl<S, A> std::fmt::Debug for MockStore<S, A>
    where
        S: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockStore").field("state", &self.state).finish()
        }
    }
}

/// Recording of stream emissions.
pub mod recorder {
    use std::sync::{Arc, Mutex, PoisonError};
    use viewstore_core::{StateStream, Subscription};

    /// Collects every value a [`StateStream`] delivers while it is alive.
    ///
    /// The first recorded value is the replayed current value.
    pub struct StateRecorder<T> {
        values: Arc<Mutex<Vec<T>>>,
        _subscription: Subscription,
    }

    impl<T> StateRecorder<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        /// Subscribe to `stream` and start recording
        #[must_use]
        pub fn record(stream: &StateStream<T>) -> Self {
            let values = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&values);
            let subscription = stream.subscribe(move |value: &T| {
                sink.lock().unwrap_or_else(PoisonError::into_inner).push(value.clone());
            });

            Self {
                values,
                _subscription: subscription,
            }
        }

        /// Everything recorded so far
        #[must_use]
        pub fn values(&self) -> Vec<T> {
            self.values.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Number of recorded values
        #[must_use]
        pub fn len(&self) -> usize {
            self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        /// Whether nothing has been recorded
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// The most recent value
        #[must_use]
        pub fn last(&self) -> Option<T> {
            self.values.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
        }

        /// Drop everything recorded so far
        pub fn clear(&self) {
            self.values.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();

    /// Install a `tracing` subscriber writing through the test harness.
    ///
    /// Honors `RUST_LOG`; defaults to `warn`. Safe to call from every test.
    pub fn init_test_tracing() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::MockStore;
pub use recorder::StateRecorder;
