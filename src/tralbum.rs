//! Unified Tralbum interface.
//!
//! This module ties release discovery and downloading together behind one
//! struct that also keeps a queue of releases waiting to be downloaded.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::api::{FetcherConfig, PageFetcher};
use crate::collector::{CatalogCollector, CollectorConfig};
use crate::download::{DirNaming, DownloadOptions, DownloadOrchestrator, DownloadReport, FailurePolicy};
use crate::error::Result;
use crate::models::{CatalogPage, ReleaseRecord};
use crate::urls;

/// All settings, grouped by component.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub collector: CollectorConfig,
    pub download: DownloadOptions,
}

/// Main Tralbum interface.
///
/// # Example
///
/// ```rust,no_run
/// use tralbum::Tralbum;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut tralbum = Tralbum::new()?;
///     tralbum.set_output_dir("downloads");
///
///     // Queue one release, then download everything queued
///     tralbum.add_release("slowedandreverb", "the-abstractrooms").await?;
///     let report = tralbum.download_queued().await?;
///     println!("{} file(s) written", report.total_written());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Tralbum {
    collector: CatalogCollector,
    downloader: DownloadOrchestrator,
    queue: Vec<ReleaseRecord>,
}

impl Tralbum {
    /// Create an instance with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create an instance from explicit settings.
    pub fn with_config(config: Config) -> Result<Self> {
        let fetcher = PageFetcher::with_config(&config.fetcher)?;
        Ok(Self {
            collector: CatalogCollector::new(fetcher.clone(), config.collector),
            downloader: DownloadOrchestrator::new(fetcher, config.download),
            queue: Vec::new(),
        })
    }

    /// Set the directory release directories are created in.
    ///
    /// Default is the current working directory.
    pub fn set_output_dir<P: AsRef<Path>>(&mut self, path: P) {
        self.downloader.options_mut().output_dir = path.as_ref().to_path_buf();
    }

    /// Get the current output directory.
    pub fn output_dir(&self) -> &Path {
        &self.downloader.options().output_dir
    }

    pub fn set_dir_naming(&mut self, naming: DirNaming) {
        self.downloader.options_mut().dir_naming = naming;
    }

    pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
        self.downloader.options_mut().failure_policy = policy;
    }

    /// Enable or disable embedding tags in downloaded tracks.
    pub fn set_embed_tags(&mut self, embed: bool) {
        self.downloader.options_mut().embed_tags = embed;
    }

    /// Set how many pages or assets may be fetched at the same time.
    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.collector.config_mut().concurrency = concurrency;
        self.downloader.options_mut().concurrency = concurrency;
    }

    // ==================
    // COLLECTION
    // ==================

    /// Fetch an author's catalog page.
    pub async fn catalog(&self, author: &str) -> Result<CatalogPage> {
        self.collector.catalog(author).await
    }

    /// Fetch one release.
    pub async fn collect_one(&self, author: &str, slug: &str) -> Result<ReleaseRecord> {
        self.collector.collect_one(author, slug).await
    }

    /// Fetch every release of an author.
    pub async fn collect_all(&self, author: &str) -> Result<Vec<ReleaseRecord>> {
        self.collector.collect_all(author).await
    }

    // ==================
    // QUEUE
    // ==================

    /// Fetch one release and queue it for download.
    pub async fn add_release(&mut self, author: &str, slug: &str) -> Result<&ReleaseRecord> {
        let release = self.collector.collect_one(author, slug).await?;
        info!(
            "Queued {}",
            urls::release_label(&release.author, &release.title)
        );
        self.queue.push(release);
        Ok(&self.queue[self.queue.len() - 1])
    }

    /// Fetch every release of an author and queue them for download.
    pub async fn add_author(&mut self, author: &str) -> Result<&[ReleaseRecord]> {
        let releases = self.collector.collect_all(author).await?;
        info!("Queued {} release(s) of {}", releases.len(), author);
        let start = self.queue.len();
        self.queue.extend(releases);
        Ok(&self.queue[start..])
    }

    /// Releases waiting to be downloaded.
    pub fn queued(&self) -> &[ReleaseRecord] {
        &self.queue
    }

    // ==================
    // DOWNLOADING
    // ==================

    /// Download the given releases.
    pub async fn download_all(&self, releases: Vec<ReleaseRecord>) -> Result<DownloadReport> {
        self.downloader.download_all(releases).await
    }

    /// Download everything queued. The queue is emptied even if the run fails.
    pub async fn download_queued(&mut self) -> Result<DownloadReport> {
        let releases = std::mem::take(&mut self.queue);
        self.downloader.download_all(releases).await
    }

    /// Directory a release would be written to, before collision handling.
    pub fn release_dir(&self, release: &ReleaseRecord) -> PathBuf {
        self.output_dir()
            .join(self.downloader.release_dir_name(release))
    }
}
