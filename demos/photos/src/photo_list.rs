//! Photo list feature.
//!
//! [`PhotoListStore`] combines six independent inputs into one
//! [`PhotoListState`]:
//!
//! 1. Fetched photos (seeded with `Loading`)
//! 2. The "show photo count" toggle
//! 3. The search text, debounced, used for filtering
//! 4. The raw search text, shown in the search field
//! 5. The nested banner data store's state
//! 6. Whether the banner update screen is presented
//!
//! Every input starts at the declared initial value, so the first combined
//! state equals [`PhotoListState::initial`]. Combined states are delivered
//! through the store's scheduler.

use crate::banner::{Banner, BannerDataAction, BannerDataState, BannerDataStore};
use crate::banner_update::BannerUpdateStore;
use crate::network::BannerNetworkConfig;
use crate::photo::{Photo, PhotoRequest, filter_by_title};
use crate::provider::{FetchState, ItemProvider, ProviderError};
use std::sync::Arc;
use std::time::Duration;
use viewstore_core::{Binding, Relay, ScopedStore, StateStream, Store, StoreExt};
use viewstore_runtime::{Scheduler, StreamSchedulingExt, combine_latest};

const DEFAULT_NAVIGATION_TITLE: &str = "Photos";

/// What the list shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoStatus {
    /// Waiting for the provider
    Loading,
    /// Photos matching the current search
    Content(Vec<Photo>),
    /// The provider failed
    Error(ProviderError),
}

/// State of [`PhotoListStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoListState {
    /// What the list shows
    pub status: PhotoStatus,
    /// Whether the title includes the photo count
    pub shows_photo_count: bool,
    /// Title shown in the navigation bar
    pub navigation_title: String,
    /// Search field text (not debounced)
    pub search_text: String,
    /// State of the nested banner data store
    pub banner_state: BannerDataState,
    /// Whether the banner update screen is presented
    pub show_update_view: bool,
}

impl PhotoListState {
    /// Declared initial state
    #[must_use]
    pub fn initial() -> Self {
        Self {
            status: PhotoStatus::Loading,
            shows_photo_count: false,
            navigation_title: DEFAULT_NAVIGATION_TITLE.to_string(),
            search_text: String::new(),
            banner_state: BannerDataState::initial(),
            show_update_view: false,
        }
    }

    /// The banner shown above the list
    #[must_use]
    pub const fn banner(&self) -> &Banner {
        &self.banner_state.banner
    }

    /// Photos currently shown; empty while loading or on error
    #[must_use]
    pub fn photos(&self) -> &[Photo] {
        match &self.status {
            PhotoStatus::Content(photos) => photos,
            PhotoStatus::Loading | PhotoStatus::Error(_) => &[],
        }
    }
}

impl Default for PhotoListState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Actions accepted by [`PhotoListStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoListAction {
    /// Show or hide the photo count in the title
    ToggleShowsPhotoCount(bool),
    /// Update the search text
    Search(String),
    /// Present or dismiss the banner update screen
    ShowUpdateView(bool),
    /// Forward an action to the nested banner data store
    Banner(BannerDataAction),
}

/// Configuration for [`PhotoListStore`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhotoListConfig {
    /// Quiet period before a search is applied to the list
    pub search_debounce: Duration,
    /// Whether the provider may answer with stale cached items
    pub allow_expired_items: bool,
    /// What to fetch
    pub request: PhotoRequest,
    /// Fake network used by the nested banner store
    pub banner_network: BannerNetworkConfig,
}

impl PhotoListConfig {
    /// Set the search debounce interval
    #[must_use]
    pub const fn with_search_debounce(mut self, interval: Duration) -> Self {
        self.search_debounce = interval;
        self
    }

    /// Allow or refuse expired cached items
    #[must_use]
    pub const fn with_allow_expired_items(mut self, allow: bool) -> Self {
        self.allow_expired_items = allow;
        self
    }

    /// Set the request to fetch
    #[must_use]
    pub const fn with_request(mut self, request: PhotoRequest) -> Self {
        self.request = request;
        self
    }

    /// Set the banner network configuration
    #[must_use]
    pub const fn with_banner_network(mut self, config: BannerNetworkConfig) -> Self {
        self.banner_network = config;
        self
    }
}

impl Default for PhotoListConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_secs(1),
            allow_expired_items: true,
            request: PhotoRequest::All,
            banner_network: BannerNetworkConfig::default(),
        }
    }
}

/// Pure mapping from the latest inputs to a state.
fn derive_state(
    photos: &FetchState<Vec<Photo>>,
    shows_photo_count: bool,
    filter_text: &str,
    search_text: &str,
    banner_state: &BannerDataState,
    show_update_view: bool,
) -> PhotoListState {
    let (status, shows_photo_count, navigation_title) = match photos {
        FetchState::Loading => (
            PhotoStatus::Loading,
            shows_photo_count,
            DEFAULT_NAVIGATION_TITLE.to_string(),
        ),
        FetchState::Finished(Ok(photos)) => {
            let filtered = filter_by_title(photos, filter_text);
            let navigation_title = if shows_photo_count {
                format!("{DEFAULT_NAVIGATION_TITLE} {}", filtered.len())
            } else {
                DEFAULT_NAVIGATION_TITLE.to_string()
            };
            (PhotoStatus::Content(filtered), shows_photo_count, navigation_title)
        },
        FetchState::Finished(Err(error)) => (
            PhotoStatus::Error(error.clone()),
            false,
            DEFAULT_NAVIGATION_TITLE.to_string(),
        ),
    };

    PhotoListState {
        status,
        shows_photo_count,
        navigation_title,
        search_text: search_text.to_string(),
        banner_state: banner_state.clone(),
        show_update_view,
    }
}

type PipelineInputs = (
    FetchState<Vec<Photo>>,
    bool,
    String,
    String,
    BannerDataState,
    bool,
);

struct PhotoListInner {
    shows_photo_count: Relay<bool>,
    search_text: Relay<String>,
    show_update_view: Relay<bool>,
    banner: BannerDataStore,
    state: StateStream<PhotoListState>,
}

/// Store coordinating the photo list screen.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct PhotoListStore {
    inner: Arc<PhotoListInner>,
}

impl PhotoListStore {
    /// Create a store with the default configuration
    #[must_use]
    pub fn new(provider: &dyn ItemProvider, scheduler: Scheduler) -> Self {
        Self::with_config(provider, scheduler, PhotoListConfig::default())
    }

    /// Create a store with a custom configuration
    ///
    /// The provider is asked for photos once, after the pipeline is in place;
    /// its answer arrives as a later input tick.
    #[must_use]
    pub fn with_config(provider: &dyn ItemProvider, scheduler: Scheduler, config: PhotoListConfig) -> Self {
        let initial = PhotoListState::initial();

        let photos = Relay::new(FetchState::<Vec<Photo>>::Loading);
        let shows_photo_count = Relay::new(initial.shows_photo_count);
        let search_text = Relay::new(initial.search_text.clone());
        let show_update_view = Relay::new(initial.show_update_view);
        let banner = BannerDataStore::with_config(scheduler.clone(), config.banner_network);

        let state = combine_latest((
            photos.stream(),
            shows_photo_count.stream(),
            search_text.stream().debounce(config.search_debounce, &scheduler),
            search_text.stream(),
            banner.state_changes(),
            show_update_view.stream(),
        ))
        .map(
            |(photos, shows_photo_count, filter_text, search_text, banner_state, show_update_view): &PipelineInputs| {
                derive_state(
                    photos,
                    *shows_photo_count,
                    filter_text,
                    search_text,
                    banner_state,
                    *show_update_view,
                )
            },
        )
        .receive_on(&scheduler);

        let delivery = photos.downgrade();
        provider.provide_items(
            config.request,
            config.allow_expired_items,
            Box::new(move |result| {
                match &result {
                    Ok(photos) => tracing::debug!(count = photos.len(), "Photos loaded"),
                    Err(error) => tracing::warn!(%error, "Photos failed to load"),
                }
                delivery.send(FetchState::Finished(result));
            }),
        );

        tracing::debug!(policy = scheduler.policy(), "Created photo list store");

        Self {
            inner: Arc::new(PhotoListInner {
                shows_photo_count,
                search_text,
                show_update_view,
                banner,
                state,
            }),
        }
    }

    /// Store for the nested banner, scoped out of this store's state
    #[must_use]
    pub fn banner_store(&self) -> ScopedStore<BannerDataState, BannerDataAction> {
        self.scope(
            |state: &PhotoListState| state.banner_state.clone(),
            PhotoListAction::Banner,
        )
    }

    /// Editor store for the banner update screen
    #[must_use]
    pub fn banner_update_store(&self) -> BannerUpdateStore<ScopedStore<BannerDataState, BannerDataAction>> {
        BannerUpdateStore::new(self.banner_store())
    }

    /// Binding for the "show photo count" toggle
    #[must_use]
    pub fn shows_photo_count(&self) -> Binding<bool> {
        self.binding(
            |state: &PhotoListState| state.shows_photo_count,
            PhotoListAction::ToggleShowsPhotoCount,
        )
    }

    /// Binding for the search field
    #[must_use]
    pub fn search_text(&self) -> Binding<String> {
        self.binding(|state: &PhotoListState| state.search_text.clone(), PhotoListAction::Search)
    }

    /// Binding presenting the banner update screen
    #[must_use]
    pub fn show_update_view(&self) -> Binding<bool> {
        self.binding(
            |state: &PhotoListState| state.show_update_view,
            PhotoListAction::ShowUpdateView,
        )
    }
}

impl Store for PhotoListStore {
    type State = PhotoListState;
    type Action = PhotoListAction;

    fn state(&self) -> PhotoListState {
        self.inner.state.current()
    }

    fn state_changes(&self) -> StateStream<PhotoListState> {
        self.inner.state.clone()
    }

    #[tracing::instrument(skip(self), fields(store = "photo_list"))]
    fn send(&self, action: PhotoListAction) {
        match action {
            PhotoListAction::ToggleShowsPhotoCount(shows) => self.inner.shows_photo_count.send(shows),
            PhotoListAction::Search(text) => self.inner.search_text.send(text),
            PhotoListAction::ShowUpdateView(shown) => self.inner.show_update_view.send(shown),
            PhotoListAction::Banner(action) => self.inner.banner.send(action),
        }
    }
}

impl std::fmt::Debug for PhotoListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoListStore")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photos(count: u64) -> Vec<Photo> {
        (1..=count).map(Photo::placeholder).collect()
    }

    #[test]
    fn test_loading_keeps_toggle_and_default_title() {
        let state = derive_state(&FetchState::Loading, true, "", "", &BannerDataState::initial(), false);

        assert_eq!(state.status, PhotoStatus::Loading);
        assert!(state.shows_photo_count);
        assert_eq!(state.navigation_title, "Photos");
    }

    #[test]
    fn test_content_title_counts_filtered_photos() {
        let state = derive_state(
            &FetchState::Finished(Ok(photos(3))),
            true,
            "2",
            "2",
            &BannerDataState::initial(),
            false,
        );

        assert_eq!(state.photos().len(), 1);
        assert_eq!(state.navigation_title, "Photos 1");
    }

    #[test]
    fn test_filter_uses_debounced_text_but_shows_raw_text() {
        let state = derive_state(
            &FetchState::Finished(Ok(photos(3))),
            false,
            "",
            "Hello-3",
            &BannerDataState::initial(),
            false,
        );

        assert_eq!(state.photos().len(), 3);
        assert_eq!(state.search_text, "Hello-3");
        assert_eq!(state.navigation_title, "Photos");
    }

    #[test]
    fn test_error_hides_count() {
        let state = derive_state(
            &FetchState::Finished(Err(ProviderError::NoData)),
            true,
            "",
            "",
            &BannerDataState::initial(),
            true,
        );

        assert_eq!(state.status, PhotoStatus::Error(ProviderError::NoData));
        assert!(!state.shows_photo_count);
        assert_eq!(state.navigation_title, "Photos");
        assert!(state.photos().is_empty());
        assert!(state.show_update_view);
    }

    #[test]
    fn test_initial_equals_default() {
        assert_eq!(PhotoListState::initial(), PhotoListState::default());
        assert_eq!(PhotoListState::initial().banner().title, "Banner");
    }
}
