//! HTML scraping for Bandcamp pages.
//!
//! Everything in here is synchronous and works on bytes that were already
//! fetched. The DOM never outlives a single function call.
//!
//! - [`catalog`]: release grid and author name of a catalog page
//! - [`release`]: embedded `data-tralbum` payload and cover of a release page

pub mod catalog;
pub mod release;

pub use catalog::parse_catalog;
pub use release::{cover_url, embedded_payload, extract_release};
