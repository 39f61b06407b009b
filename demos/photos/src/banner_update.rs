//! Banner editing screen.
//!
//! Keeps a local working copy of the banner while the user types, and talks
//! to the banner data store (usually through a scoped store) to upload it.

use crate::banner::{Banner, BannerDataAction, BannerDataState};
use crate::network::{BannerNetworkError, NetworkState};
use viewstore_core::{Binding, Relay, StateStream, Store, StoreExt};
use viewstore_runtime::combine_latest;

/// State of [`BannerUpdateStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BannerUpdateState {
    /// Latest state of the underlying banner data store
    pub banner_state: BannerDataState,
    /// The banner being edited
    pub working_copy: Banner,
}

impl BannerUpdateState {
    /// Whether the screen may be dismissed (no upload in flight)
    #[must_use]
    pub const fn dismissable(&self) -> bool {
        match self.banner_state.network_state {
            NetworkState::NotStarted | NetworkState::Finished(_) => true,
            NetworkState::InProgress => false,
        }
    }

    /// Whether the last upload succeeded
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.banner_state.network_state, NetworkState::Finished(Ok(_)))
    }

    /// The last upload's failure, if any
    #[must_use]
    pub fn error(&self) -> Option<BannerNetworkError> {
        self.banner_state.network_state.error().cloned()
    }
}

/// Actions accepted by [`BannerUpdateStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BannerUpdateAction {
    /// Replace the working copy's title
    UpdateTitle(String),
    /// Clear a failed upload
    DismissError,
    /// Upload the working copy
    Submit,
}

/// Store for the banner editing screen.
///
/// Generic over the banner data store so it works with the real store, a
/// scoped store, or a `MockStore` in tests.
#[derive(Clone)]
pub struct BannerUpdateStore<D> {
    banner_data: D,
    working_copy: Relay<Banner>,
    state: StateStream<BannerUpdateState>,
}

impl<D> BannerUpdateStore<D>
where
    D: Store<State = BannerDataState, Action = BannerDataAction>,
{
    /// Create an editor whose working copy starts from the current banner
    #[must_use]
    pub fn new(banner_data: D) -> Self {
        let working_copy = Relay::new(banner_data.state().banner);

        let state = combine_latest((banner_data.state_changes(), working_copy.stream())).map(
            |(banner_state, working_copy): &(BannerDataState, Banner)| BannerUpdateState {
                banner_state: banner_state.clone(),
                working_copy: working_copy.clone(),
            },
        );

        Self {
            banner_data,
            working_copy,
            state,
        }
    }
}

impl<D> BannerUpdateStore<D>
where
    D: Store<State = BannerDataState, Action = BannerDataAction> + Clone + 'static,
{
    /// Binding for the title text field
    #[must_use]
    pub fn working_title(&self) -> Binding<String> {
        self.binding(
            |state: &BannerUpdateState| state.working_copy.title.clone(),
            BannerUpdateAction::UpdateTitle,
        )
    }

    /// Binding driving the error alert; clearing it dismisses the error
    #[must_use]
    pub fn is_error_presented(&self) -> Binding<bool> {
        self.presence_binding(BannerUpdateState::error, BannerUpdateAction::DismissError)
    }
}

impl<D> Store for BannerUpdateStore<D>
where
    D: Store<State = BannerDataState, Action = BannerDataAction>,
{
    type State = BannerUpdateState;
    type Action = BannerUpdateAction;

    fn state(&self) -> BannerUpdateState {
        self.state.current()
    }

    fn state_changes(&self) -> StateStream<BannerUpdateState> {
        self.state.clone()
    }

    #[tracing::instrument(skip(self), fields(store = "banner_update"))]
    fn send(&self, action: BannerUpdateAction) {
        match action {
            BannerUpdateAction::UpdateTitle(title) => self.working_copy.send(Banner::new(title)),
            BannerUpdateAction::Submit => {
                let working_copy = self.state().working_copy;
                self.banner_data.send(BannerDataAction::UploadBanner(working_copy));
            },
            BannerUpdateAction::DismissError => self.banner_data.send(BannerDataAction::ClearNetworkingState),
        }
    }
}
