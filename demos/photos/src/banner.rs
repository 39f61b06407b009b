//! Banner feature: the source of truth for the banner shown above the list.
//!
//! [`BannerDataStore`] is not meant to drive a view directly. It is composed
//! into other stores: the photo list embeds its state, and the banner update
//! screen talks to it through a scoped store.

use crate::network::{BannerNetworkConfig, MockBannerNetworkController, NetworkState};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use viewstore_core::{Relay, StateStream, Store, Subscription};
use viewstore_runtime::{Scheduler, combine_latest};

/// Text displayed at the top of a screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// The text to display
    pub title: String,
}

impl Banner {
    /// Create a banner with `title`
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// State of [`BannerDataStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BannerDataState {
    /// The source of truth for the banner
    pub banner: Banner,
    /// Progress of the latest upload
    pub network_state: NetworkState,
}

impl BannerDataState {
    /// Declared initial state: a banner titled "Banner", nothing uploaded
    #[must_use]
    pub fn initial() -> Self {
        Self {
            banner: Banner::new("Banner"),
            network_state: NetworkState::NotStarted,
        }
    }
}

impl Default for BannerDataState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Actions accepted by [`BannerDataStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BannerDataAction {
    /// Replace the local banner synchronously
    UpdateBannerLocally(Banner),
    /// Upload the banner, then update it locally if the upload succeeds
    UploadBanner(Banner),
    /// Return the upload state to `NotStarted`
    ClearNetworkingState,
}

struct BannerDataInner {
    banner: Relay<Banner>,
    network: MockBannerNetworkController,
    state: StateStream<BannerDataState>,
    _uploaded: Subscription,
}

/// Store owning the banner and its upload state.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct BannerDataStore {
    inner: Arc<BannerDataInner>,
}

impl BannerDataStore {
    /// Create a store whose uploads complete through `scheduler`
    #[must_use]
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_config(scheduler, BannerNetworkConfig::default())
    }

    /// Create a store with a custom fake-network configuration
    #[must_use]
    pub fn with_config(scheduler: Scheduler, config: BannerNetworkConfig) -> Self {
        let inner = Arc::new_cyclic(|this: &Weak<BannerDataInner>| {
            let initial = BannerDataState::initial();
            let banner = Relay::new(initial.banner);
            let network = MockBannerNetworkController::new(scheduler, config);

            let state = combine_latest((banner.stream(), network.state_changes())).map(
                |(banner, network_state): &(Banner, NetworkState)| BannerDataState {
                    banner: banner.clone(),
                    network_state: network_state.clone(),
                },
            );

            // Successful uploads come back as local updates.
            let this = this.clone();
            let (_, uploaded) = network.state_changes().subscribe_from_current(move |network_state| {
                let Some(banner) = network_state.banner() else {
                    return;
                };
                if let Some(inner) = this.upgrade() {
                    BannerDataStore { inner }.send(BannerDataAction::UpdateBannerLocally(banner.clone()));
                }
            });

            BannerDataInner {
                banner,
                network,
                state,
                _uploaded: uploaded,
            }
        });

        Self { inner }
    }
}

impl Store for BannerDataStore {
    type State = BannerDataState;
    type Action = BannerDataAction;

    fn state(&self) -> BannerDataState {
        self.inner.state.current()
    }

    fn state_changes(&self) -> StateStream<BannerDataState> {
        self.inner.state.clone()
    }

    #[tracing::instrument(skip(self), fields(store = "banner_data"))]
    fn send(&self, action: BannerDataAction) {
        match action {
            BannerDataAction::UpdateBannerLocally(banner) => self.inner.banner.send(banner),
            BannerDataAction::UploadBanner(banner) => self.inner.network.upload(banner),
            BannerDataAction::ClearNetworkingState => self.inner.network.reset(),
        }
    }
}

impl std::fmt::Debug for BannerDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BannerDataStore")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{BannerNetworkError, UploadOutcome};
    use std::time::Duration;
    use viewstore_runtime::VirtualClock;

    fn store(outcome: UploadOutcome) -> (VirtualClock, BannerDataStore) {
        let clock = VirtualClock::new();
        let config = BannerNetworkConfig::default().with_outcome(outcome);
        (clock.clone(), BannerDataStore::with_config(clock.into(), config))
    }

    #[test]
    fn test_initial_state() {
        let (_, store) = store(UploadOutcome::Failure);
        assert_eq!(store.state(), BannerDataState::initial());
        assert_eq!(store.state().banner.title, "Banner");
    }

    #[test]
    fn test_update_locally_is_synchronous() {
        let (_, store) = store(UploadOutcome::Failure);

        store.send(BannerDataAction::UpdateBannerLocally(Banner::new("Sale")));

        assert_eq!(store.state().banner, Banner::new("Sale"));
        assert_eq!(store.state().network_state, NetworkState::NotStarted);
    }

    #[test]
    fn test_successful_upload_updates_banner() {
        let (clock, store) = store(UploadOutcome::Success);

        store.send(BannerDataAction::UploadBanner(Banner::new("Uploaded")));
        assert_eq!(store.state().network_state, NetworkState::InProgress);
        assert_eq!(store.state().banner.title, "Banner");

        clock.advance(Duration::from_secs(2));

        let state = store.state();
        assert_eq!(state.banner.title, "Uploaded");
        assert_eq!(state.network_state, NetworkState::Finished(Ok(Banner::new("Uploaded"))));
    }

    #[test]
    fn test_failed_upload_keeps_banner_and_clears() {
        let (clock, store) = store(UploadOutcome::Failure);

        store.send(BannerDataAction::UploadBanner(Banner::new("Rejected")));
        clock.run();

        assert_eq!(store.state().banner.title, "Banner");
        assert_eq!(
            store.state().network_state.error(),
            Some(&BannerNetworkError::IntentionalFailure)
        );

        store.send(BannerDataAction::ClearNetworkingState);
        assert_eq!(store.state(), BannerDataState::initial());
    }

    #[test]
    fn test_dropped_store_ignores_late_completion() {
        let (clock, store) = store(UploadOutcome::Success);
        store.send(BannerDataAction::UploadBanner(Banner::new("late")));
        drop(store);

        assert_eq!(clock.run(), 1);
    }
}
