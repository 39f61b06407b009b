//! # Photos Example
//!
//! A photo list screen built from composed stores.
//!
//! This example showcases:
//! - Deriving state from several independent inputs with `combine_latest`
//! - Debouncing a search field
//! - Delivering states through a scheduler (virtual in tests, real-time in
//!   the binary)
//! - Embedding one store's state in another and scoping it back out
//! - Two-way bindings for text fields, toggles and alerts
//!
//! ## Architecture
//!
//! - [`BannerDataStore`] owns the banner and uploads it through a fake
//!   network controller.
//! - [`PhotoListStore`] combines fetched photos, a toggle, the search text and
//!   the banner state into [`PhotoListState`].
//! - [`BannerUpdateStore`] edits a working copy of the banner and submits it
//!   through a store scoped out of the photo list.
//!
//! ## Example
//!
//! ```
//! use photos::{MockItemProvider, PhotoListAction, PhotoListStore, PhotoStatus};
//! use std::time::Duration;
//! use viewstore_core::Store;
//! use viewstore_runtime::VirtualClock;
//!
//! let clock = VirtualClock::new();
//! let store = PhotoListStore::new(&MockItemProvider::with_count(3), clock.clone().into());
//! assert_eq!(store.state().status, PhotoStatus::Loading);
//!
//! clock.advance(Duration::ZERO);
//! assert_eq!(store.state().photos().len(), 3);
//!
//! store.send(PhotoListAction::ToggleShowsPhotoCount(true));
//! clock.advance(Duration::ZERO);
//! assert_eq!(store.state().navigation_title, "Photos 3");
//! ```

pub mod banner;
pub mod banner_update;
pub mod network;
pub mod photo;
pub mod photo_list;
pub mod provider;

pub use banner::{Banner, BannerDataAction, BannerDataState, BannerDataStore};
pub use banner_update::{BannerUpdateAction, BannerUpdateState, BannerUpdateStore};
pub use network::{BannerNetworkConfig, BannerNetworkError, MockBannerNetworkController, NetworkState, UploadOutcome};
pub use photo::{Photo, PhotoRequest, filter_by_title};
pub use photo_list::{PhotoListAction, PhotoListConfig, PhotoListState, PhotoListStore, PhotoStatus};
pub use provider::{FetchState, ItemProvider, ItemsHandler, MockItemProvider, ProviderError};
