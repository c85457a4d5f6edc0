//! Release-related models.
//!
//! A [`ReleaseRecord`] is built once from a release page and never changes
//! afterwards. Its track list only holds tracks that have a stream.

use serde::{Deserialize, Serialize};

/// A single streamable track of a release.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackRecord {
    /// Platform track ID.
    pub id: u64,

    /// Track title, not yet safe for use as a file name.
    pub title: String,

    /// Track number as printed on the release, if the page carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,

    /// Encoding label of the selected stream (e.g. `mp3-128`).
    pub format: String,

    /// Absolute URL of the selected stream.
    pub file_url: String,
}

impl TrackRecord {
    /// File extension for the selected encoding, without the dot.
    pub fn extension(&self) -> &'static str {
        if self.format.starts_with("flac") {
            "flac"
        } else {
            "mp3"
        }
    }
}

/// A release (album) with its streamable tracks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Platform release ID.
    pub id: u64,

    /// Last URL path segment of the release page.
    pub slug: String,

    /// Release title, not yet safe for use as a directory name.
    pub title: String,

    /// Artist name as rendered by the platform.
    pub author: String,

    /// Absolute URL of the cover image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    /// Tracks in release order.
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
}

impl ReleaseRecord {
    /// Number of assets a download of this release will fetch.
    pub fn asset_count(&self) -> usize {
        self.tracks.len() + usize::from(self.cover_url.is_some())
    }
}
