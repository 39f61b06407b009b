//! Photo domain types.

use serde::{Deserialize, Serialize};

/// A remote image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Album this photo belongs to
    pub album_id: u64,
    /// Unique identifier of this photo
    pub id: u64,
    /// Descriptive text shown with the image
    pub title: String,
    /// Full-size image location
    pub url: String,
    /// Lower-resolution image location
    pub thumbnail_url: String,
}

impl Photo {
    /// Placeholder photo titled `Hello-{index}`, as used by previews and tests
    #[must_use]
    pub fn placeholder(index: u64) -> Self {
        Self {
            album_id: 0,
            id: index,
            title: format!("Hello-{index}"),
            url: format!("https://example.invalid/photos/{index}.png"),
            thumbnail_url: format!("https://example.invalid/thumbnails/{index}.png"),
        }
    }

    /// Whether the title contains `search_text`, ignoring case
    #[must_use]
    pub fn matches(&self, search_text: &str) -> bool {
        self.title.to_lowercase().contains(&search_text.to_lowercase())
    }
}

/// Keep the photos whose title contains `search_text` (case-insensitive).
///
/// An empty search keeps everything.
#[must_use]
pub fn filter_by_title(photos: &[Photo], search_text: &str) -> Vec<Photo> {
    if search_text.is_empty() {
        return photos.to_vec();
    }

    photos
        .iter()
        .filter(|photo| photo.matches(search_text))
        .cloned()
        .collect()
}

/// Requests for content shown in the app.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PhotoRequest {
    /// The first page of placeholder photos
    #[default]
    All,
}

impl PhotoRequest {
    const BASE_URL: &'static str = "https://jsonplaceholder.typicode.com";

    /// Key under which results are cached
    #[must_use]
    pub const fn persistence_key(self) -> &'static str {
        match self {
            Self::All => "Photos",
        }
    }

    /// Request path
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::All => "/photos",
        }
    }

    /// Full request URL including the page limit
    #[must_use]
    pub fn url(self) -> String {
        format!("{}{}?_limit=5", Self::BASE_URL, self.path())
    }
}
