//! # Tralbum
//!
//! A Rust library for scraping release metadata from Bandcamp pages and
//! downloading the streams and covers they reference.
//!
//! ## Quick Start
//!
//! The easiest way to use this library is through the [`Tralbum`] struct:
//!
//! ```rust,no_run
//! use tralbum::Tralbum;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tralbum = Tralbum::new()?;
//!
//!     // One release
//!     let release = tralbum.collect_one("slowedandreverb", "the-abstractrooms").await?;
//!     println!("{} ({} tracks)", release.title, release.tracks.len());
//!
//!     // Everything an author lists, written below the working directory
//!     let releases = tralbum.collect_all("slowedandreverb").await?;
//!     let report = tralbum.download_all(releases).await?;
//!     println!("Downloaded {} file(s)", report.total_written());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Layout
//!
//! Each release goes to `{output}/{release title}/` with `cover.jpg` (when
//! the page has a cover) and one `{track title}.mp3` per streamable track.
//!
//! ## Low-Level APIs
//!
//! - [`urls`] - URL and log label builders
//! - [`PageFetcher`] - shared HTTP client
//! - [`scrape`] - catalog and release page parsers
//! - [`converters`] - embedded payload to [`ReleaseRecord`]
//! - [`CatalogCollector`] / [`DownloadOrchestrator`] - the two halves of
//!   the pipeline

pub mod api;
pub mod collector;
pub mod converters;
pub mod download;
pub mod error;
pub mod models;
pub mod scrape;
pub mod tagging;
mod tralbum;
pub mod urls;

// Main interface (recommended)
pub use tralbum::{Config, Tralbum};

// Pipeline components
pub use api::{FetcherConfig, PageFetcher};
pub use collector::{CatalogCollector, CollectorConfig};
pub use download::{
    DirNaming, DownloadOptions, DownloadOrchestrator, DownloadReport, FailurePolicy,
    ReleaseOutcome,
};
pub use error::{FetchError, ParseError, TralbumError};
pub use models::{CatalogPage, ReleaseRecord, TrackRecord};
