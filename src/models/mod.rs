//! Data models for scraped Bandcamp pages.
//!
//! This module contains the release and track records produced from release
//! pages and the slug list produced from catalog pages.

pub mod catalog;
pub mod release;

// Re-exports for convenience
pub use catalog::CatalogPage;
pub use release::{ReleaseRecord, TrackRecord};
