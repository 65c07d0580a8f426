//! Post record produced by fetchers.

use serde::{Deserialize, Serialize};

/// Public permalink prefix for posts.
pub const POST_URL_PREFIX: &str = "https://www.instagram.com/p/";

// == Post ==
/// One public post of a profile feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Upstream shortcode
    pub id: String,
    /// Permalink to the post
    pub url: String,
    /// First caption text, empty when absent
    pub caption: String,
    /// Best available image URL, empty when absent
    pub image_url: String,
    /// Unix seconds, when upstream provided one
    pub timestamp: Option<i64>,
}

impl Post {
    /// Builds a post from its shortcode, deriving the permalink.
    pub fn new(
        shortcode: impl Into<String>,
        caption: impl Into<String>,
        image_url: impl Into<String>,
        timestamp: Option<i64>,
    ) -> Self {
        let id = shortcode.into();
        Self {
            url: format!("{}{}/", POST_URL_PREFIX, id),
            id,
            caption: caption.into(),
            image_url: image_url.into(),
            timestamp,
        }
    }
}
