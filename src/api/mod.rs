//! Network access.
//!
//! - [`PageFetcher`]: shared GET client with a fixed timeout and user agent

pub mod fetcher;

pub use fetcher::{FetcherConfig, PageFetcher};
