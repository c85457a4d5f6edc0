//! Release discovery.
//!
//! [`CatalogCollector`] turns an author name (and optionally a slug) into
//! [`ReleaseRecord`]s by fetching pages and handing them to the scrapers.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::api::PageFetcher;
use crate::error::{Result, TralbumError};
use crate::models::{CatalogPage, ReleaseRecord};
use crate::scrape;
use crate::urls;

/// Upper bound for any configured concurrency.
pub const MAX_CONCURRENCY: usize = 8;

/// Settings for release discovery.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Release pages fetched at the same time by [`CatalogCollector::collect_all`].
    pub concurrency: usize,
    /// Author root used instead of `https://{author}.bandcamp.com`.
    pub root_override: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            root_override: None,
        }
    }
}

/// Fetches and parses catalog and release pages.
#[derive(Debug, Clone)]
pub struct CatalogCollector {
    fetcher: PageFetcher,
    config: CollectorConfig,
}

impl CatalogCollector {
    pub fn new(fetcher: PageFetcher, config: CollectorConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CollectorConfig {
        &mut self.config
    }

    /// Root URL of an author's pages.
    pub fn author_root(&self, author: &str) -> String {
        match &self.config.root_override {
            Some(root) => root.trim_end_matches('/').to_string(),
            None => urls::author_url(author),
        }
    }

    fn concurrency(&self) -> usize {
        self.config.concurrency.clamp(1, MAX_CONCURRENCY)
    }

    /// Fetch and parse an author's catalog page.
    pub async fn catalog(&self, author: &str) -> Result<CatalogPage> {
        let url = self.author_root(author);
        let html = self.fetcher.fetch(&url).await?;
        let page = scrape::parse_catalog(&html).map_err(|e| TralbumError::parse(&url, e))?;

        info!(
            "Catalog of {} lists {} release(s)",
            page.author_name.as_deref().unwrap_or(author),
            page.slugs.len()
        );
        Ok(page)
    }

    /// Fetch a single release by slug.
    pub async fn collect_one(&self, author: &str, slug: &str) -> Result<ReleaseRecord> {
        let url = urls::release_url_at(&self.author_root(author), slug);
        let html = self.fetcher.fetch(&url).await?;
        scrape::extract_release(&html, slug).map_err(|e| TralbumError::parse(&url, e))
    }

    /// Fetch every release in an author's catalog, in catalog order.
    ///
    /// Fails as a whole if any release fails.
    pub async fn collect_all(&self, author: &str) -> Result<Vec<ReleaseRecord>> {
        let page = self.catalog(author).await?;
        debug!(
            "Collecting {} release(s) with {} in flight",
            page.slugs.len(),
            self.concurrency()
        );

        stream::iter(page.slugs.iter())
            .map(|slug| self.collect_one(author, slug))
            .buffered(self.concurrency())
            .try_collect()
            .await
    }
}
