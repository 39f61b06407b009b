//! # ViewStore Runtime
//!
//! Runtime implementation for the ViewStore architecture.
//!
//! This crate provides the time-aware pieces that turn a set of input
//! streams into a store's state: schedulers, a deterministic virtual clock,
//! timing operators and combine-latest.
//!
//! ## Core Components
//!
//! - **Scheduler**: Decides when work runs (immediate, real-time, virtual)
//! - **`VirtualClock`**: Manually advanced logical time for tests
//! - **Operators**: `debounce`, `throttle`, `receive_on`
//! - **`combine_latest`**: Combines 2 to 6 seeded streams into one
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use viewstore_core::Relay;
//! use viewstore_runtime::{combine_latest, Scheduler, StreamSchedulingExt, VirtualClock};
//!
//! let clock = VirtualClock::new();
//! let scheduler = Scheduler::from(clock.clone());
//!
//! let search = Relay::new(String::new());
//! let items = Relay::new(vec!["apple".to_string(), "pear".to_string()]);
//!
//! let visible = combine_latest((
//!     items.stream(),
//!     search.stream().debounce(Duration::from_secs(1), &scheduler),
//! ))
//! .map(|(items, query): &(Vec<String>, String)| {
//!     items.iter().filter(|item| item.contains(query.as_str())).count()
//! });
//!
//! search.send("pe".to_string());
//! assert_eq!(visible.current(), 2);
//!
//! clock.advance(Duration::from_secs(1));
//! assert_eq!(visible.current(), 1);
//! ```

/// Scheduling policies
pub mod scheduler;

/// Deterministic virtual time
pub mod virtual_clock;

/// Time-aware stream operators
pub mod operators;

/// Combine-latest pipelines
pub mod combine;

/// Metric names for observability
pub mod metrics;

/// Error types for the runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur while setting up a scheduler
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum SchedulerError {
        /// A real-time scheduler needs a running tokio runtime
        ///
        /// Returned when [`Scheduler::real_time`](crate::Scheduler::real_time)
        /// is called outside of a tokio context.
        #[error("No tokio runtime is running on this thread")]
        NoRuntime,
    }
}

pub use combine::{CombineLatest, combine_latest};
pub use error::SchedulerError;
pub use operators::StreamSchedulingExt;
pub use scheduler::{RealTimeScheduler, Scheduler, Work};
pub use virtual_clock::{DEFAULT_ADVANCE, VirtualClock};
