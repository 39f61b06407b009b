//! Fake network controller for uploading banners.
//!
//! There is no server: an upload flips the state to
//! [`NetworkState::InProgress`] and, after the configured latency, finishes
//! with the configured outcome.

use crate::banner::Banner;
use std::time::Duration;
use thiserror::Error;
use viewstore_core::{Relay, StateStream};
use viewstore_runtime::Scheduler;

/// Errors the fake banner endpoint can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BannerNetworkError {
    /// A deliberate failure used to exercise error handling
    #[error("This is an expected error used for testing error handling.")]
    IntentionalFailure,
}

/// State of a banner upload request
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum NetworkState {
    /// Nothing has been sent yet
    #[default]
    NotStarted,
    /// The request is in flight
    InProgress,
    /// The request finished
    Finished(Result<Banner, BannerNetworkError>),
}

impl NetworkState {
    /// The uploaded banner, if the request succeeded
    #[must_use]
    pub fn banner(&self) -> Option<&Banner> {
        match self {
            Self::NotStarted | Self::InProgress | Self::Finished(Err(_)) => None,
            Self::Finished(Ok(banner)) => Some(banner),
        }
    }

    /// The failure, if the request failed
    #[must_use]
    pub fn error(&self) -> Option<&BannerNetworkError> {
        match self {
            Self::NotStarted | Self::InProgress | Self::Finished(Ok(_)) => None,
            Self::Finished(Err(error)) => Some(error),
        }
    }
}

/// How a fake upload ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UploadOutcome {
    /// Echo the uploaded banner back
    Success,
    /// Fail with [`BannerNetworkError::IntentionalFailure`]
    #[default]
    Failure,
}

/// Configuration for [`MockBannerNetworkController`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BannerNetworkConfig {
    /// Time between starting an upload and finishing it
    pub latency: Duration,
    /// How every upload ends
    pub outcome: UploadOutcome,
}

impl BannerNetworkConfig {
    /// Set the upload latency
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set the upload outcome
    #[must_use]
    pub const fn with_outcome(mut self, outcome: UploadOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

impl Default for BannerNetworkConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(2),
            outcome: UploadOutcome::Failure,
        }
    }
}

/// A contrived stand-in for a networking state controller.
#[derive(Clone)]
pub struct MockBannerNetworkController {
    state: Relay<NetworkState>,
    scheduler: Scheduler,
    config: BannerNetworkConfig,
}

impl MockBannerNetworkController {
    /// Create a controller whose uploads complete through `scheduler`
    #[must_use]
    pub fn new(scheduler: Scheduler, config: BannerNetworkConfig) -> Self {
        Self {
            state: Relay::new(NetworkState::NotStarted),
            scheduler,
            config,
        }
    }

    /// Stream of request states, starting at [`NetworkState::NotStarted`]
    #[must_use]
    pub fn state_changes(&self) -> StateStream<NetworkState> {
        self.state.stream()
    }

    /// Start uploading `banner`
    ///
    /// The completion holds the controller weakly, so it is dropped silently
    /// if nobody is listening any more.
    pub fn upload(&self, banner: Banner) {
        tracing::debug!(title = %banner.title, latency = ?self.config.latency, "Uploading banner");
        self.state.send(NetworkState::InProgress);

        let outcome = match self.config.outcome {
            UploadOutcome::Success => Ok(banner),
            UploadOutcome::Failure => Err(BannerNetworkError::IntentionalFailure),
        };
        let target = self.state.downgrade();
        self.scheduler.schedule_after(self.config.latency, move || {
            if !target.send(NetworkState::Finished(outcome)) {
                tracing::debug!("Banner upload finished after its controller was dropped");
            }
        });
    }

    /// Return to [`NetworkState::NotStarted`]
    pub fn reset(&self) {
        self.state.send(NetworkState::NotStarted);
    }
}

impl std::fmt::Debug for MockBannerNetworkController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBannerNetworkController")
            .field("state", &self.state.current())
            .field("config", &self.config)
            .finish()
    }
}
