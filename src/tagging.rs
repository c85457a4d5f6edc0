//! Audio metadata tagging.
//!
//! Release pages only give us titles, the artist name, track numbers and
//! the cover, so that is all that gets written.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt};
use tracing::{debug, warn};

use crate::error::Result;

/// Metadata to embed in audio files.
#[derive(Debug, Clone, Default)]
pub struct AudioMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
    /// Cover image bytes (JPEG or PNG).
    pub cover_art: Option<Vec<u8>>,
}

impl AudioMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist<S: Into<String>>(mut self, artist: S) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album<S: Into<String>>(mut self, album: S) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set track number and total.
    pub fn with_track(mut self, number: u32, total: Option<u32>) -> Self {
        self.track_number = Some(number);
        self.total_tracks = total;
        self
    }

    pub fn with_cover_art(mut self, cover: Vec<u8>) -> Self {
        self.cover_art = Some(cover);
        self
    }
}

fn cover_mime(data: &[u8]) -> MimeType {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        MimeType::Png
    } else {
        MimeType::Jpeg
    }
}

/// Write metadata into an audio file.
///
/// Files lofty cannot read (unknown or damaged streams) are left untouched;
/// that is logged, not returned as an error.
pub fn write_metadata<P: AsRef<Path>>(path: P, metadata: &AudioMetadata) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing metadata to: {}", path.display());

    let mut tagged_file = match lofty::read_from_path(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Could not read {} for tagging: {}", path.display(), e);
            return Ok(());
        }
    };

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.primary_tag_mut() else {
        return Ok(());
    };

    if let Some(title) = &metadata.title {
        tag.set_title(title.clone());
    }
    if let Some(artist) = &metadata.artist {
        tag.set_artist(artist.clone());
    }
    if let Some(album) = &metadata.album {
        tag.set_album(album.clone());
    }
    if let Some(track) = metadata.track_number {
        tag.set_track(track);
    }
    if let Some(total) = metadata.total_tracks {
        tag.set_track_total(total);
    }
    if let Some(cover) = &metadata.cover_art {
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(cover_mime(cover)),
            None,
            cover.clone(),
        ));
    }

    if let Err(e) = tag.save_to_path(path, WriteOptions::default()) {
        warn!("Failed to save tags to {}: {}", path.display(), e);
    } else {
        debug!("Tagged {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let meta = AudioMetadata::new()
            .with_title("Intro")
            .with_artist("Slowed & Reverb")
            .with_album("The Abstractrooms")
            .with_track(1, Some(7));

        assert_eq!(meta.title.as_deref(), Some("Intro"));
        assert_eq!(meta.artist.as_deref(), Some("Slowed & Reverb"));
        assert_eq!(meta.album.as_deref(), Some("The Abstractrooms"));
        assert_eq!(meta.track_number, Some(1));
        assert_eq!(meta.total_tracks, Some(7));
        assert_eq!(meta.cover_art, None);
    }

    #[test]
    fn test_cover_mime() {
        assert_eq!(cover_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), MimeType::Png);
        assert_eq!(cover_mime(&[0xFF, 0xD8, 0xFF]), MimeType::Jpeg);
    }

    #[test]
    fn test_unreadable_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.txt");
        std::fs::write(&path, b"definitely not an mp3 stream").unwrap();

        write_metadata(&path, &AudioMetadata::new().with_title("x")).unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"definitely not an mp3 stream"
        );
    }
}
