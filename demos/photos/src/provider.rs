//! Item provider collaborator.
//!
//! A provider fetches photos (from the network, a cache, or a fixture) and
//! reports the outcome through a completion handler. Stores never await a
//! provider: they seed their photo input with [`FetchState::Loading`] and let
//! the completion push [`FetchState::Finished`] into it.

use crate::photo::{Photo, PhotoRequest};
use std::time::Duration;
use thiserror::Error;
use viewstore_runtime::Scheduler;

/// Errors a provider can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request succeeded but carried no items
    #[error("No data was returned")]
    NoData,

    /// The request failed
    #[error("Network error: {0}")]
    Network(String),
}

/// Completion handler for [`ItemProvider::provide_items`]
pub type ItemsHandler = Box<dyn FnOnce(Result<Vec<Photo>, ProviderError>) + Send>;

/// Progress of a fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchState<T> {
    /// No result yet
    Loading,
    /// The provider answered
    Finished(Result<T, ProviderError>),
}

/// Capability to fetch photos.
pub trait ItemProvider: Send + Sync {
    /// Fetch the items for `request` and call `handler` exactly once.
    ///
    /// `allow_expired_items` lets a caching provider answer with stale data.
    /// The handler may run before this method returns.
    fn provide_items(&self, request: PhotoRequest, allow_expired_items: bool, handler: ItemsHandler);
}

/// Provider answering with a fixed outcome, for previews and tests.
///
/// Answers synchronously unless a latency is configured.
#[derive(Clone, Debug)]
pub struct MockItemProvider {
    outcome: Result<Vec<Photo>, ProviderError>,
    latency: Option<(Scheduler, Duration)>,
}

impl MockItemProvider {
    /// Provide `photos`
    #[must_use]
    pub const fn with_photos(photos: Vec<Photo>) -> Self {
        Self {
            outcome: Ok(photos),
            latency: None,
        }
    }

    /// Provide `count` placeholder photos titled `Hello-1` to `Hello-{count}`
    #[must_use]
    pub fn with_count(count: u64) -> Self {
        Self::with_photos((1..=count).map(Photo::placeholder).collect())
    }

    /// Always fail with `error`
    #[must_use]
    pub const fn failing(error: ProviderError) -> Self {
        Self {
            outcome: Err(error),
            latency: None,
        }
    }

    /// Provide the photos in a JSON array fixture
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an array of photos.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::with_photos)
    }

    /// Answer `delay` later through `scheduler` instead of synchronously
    #[must_use]
    pub fn with_latency(mut self, scheduler: Scheduler, delay: Duration) -> Self {
        self.latency = Some((scheduler, delay));
        self
    }
}

impl ItemProvider for MockItemProvider {
    fn provide_items(&self, request: PhotoRequest, allow_expired_items: bool, handler: ItemsHandler) {
        tracing::debug!(
            url = %request.url(),
            allow_expired_items,
            success = self.outcome.is_ok(),
            "Providing mock items"
        );

        let outcome = self.outcome.clone();
        match &self.latency {
            Some((scheduler, delay)) => scheduler.schedule_after(*delay, move || handler(outcome)),
            None => handler(outcome),
        }
    }
}
