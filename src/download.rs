//! Release downloading.
//!
//! Each release is first fetched into its own directory below
//! `{output}/.tralbum-staging/`. Release directory names never start with a
//! dot, so staging can never overlap a release. Once all assets of a release
//! are staged (or, with [`FailurePolicy::Continue`], the failing ones are
//! recorded) the files are moved into `{output}/{release}/`. A release whose
//! fetches fail under [`FailurePolicy::Abort`] never touches its final
//! directory, and no file there is ever written partially. Staging is
//! removed whether the release succeeds or not.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{self, StreamExt};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::api::PageFetcher;
use crate::collector::MAX_CONCURRENCY;
use crate::error::{Result, TralbumError};
use crate::models::ReleaseRecord;
use crate::tagging::{self, AudioMetadata};
use crate::urls;

/// File name of the cover image inside a release directory.
pub const COVER_FILE: &str = "cover.jpg";

/// Directory below the output directory that holds in-progress releases.
pub const STAGING_DIR: &str = ".tralbum-staging";

/// Longest file or directory name produced, in bytes.
pub const MAX_NAME_BYTES: usize = 200;

/// How release directories are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirNaming {
    /// Sanitized release title, falling back to the slug.
    #[default]
    Title,
    /// Release slug.
    Slug,
}

/// What happens when a single asset cannot be fetched or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run with the error.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Continue,
}

/// Settings for [`DownloadOrchestrator`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Directory under which release directories are created.
    pub output_dir: PathBuf,
    pub dir_naming: DirNaming,
    pub failure_policy: FailurePolicy,
    /// Assets of one release fetched at the same time.
    pub concurrency: usize,
    /// Embed title/artist/album/cover tags into audio files.
    pub embed_tags: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            dir_naming: DirNaming::default(),
            failure_policy: FailurePolicy::default(),
            concurrency: 1,
            embed_tags: false,
        }
    }
}

/// Result of downloading one release.
#[derive(Debug)]
pub struct ReleaseOutcome {
    /// Release ID.
    pub release_id: u64,
    /// Release title.
    pub title: String,
    /// Release directory.
    pub directory: PathBuf,
    /// Files written, cover first, then tracks in release order.
    pub written: Vec<PathBuf>,
    /// Failed assets with error messages.
    pub failed: Vec<(String, String)>,
}

/// Result of a whole download run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub releases: Vec<ReleaseOutcome>,
}

impl DownloadReport {
    /// Number of files written across all releases.
    pub fn total_written(&self) -> usize {
        self.releases.iter().map(|r| r.written.len()).sum()
    }

    /// Number of assets that failed across all releases.
    pub fn total_failed(&self) -> usize {
        self.releases.iter().map(|r| r.failed.len()).sum()
    }

    /// Check if every asset was downloaded.
    pub fn all_successful(&self) -> bool {
        self.total_failed() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetKind {
    Cover,
    Track(usize),
}

#[derive(Debug)]
struct Asset {
    kind: AssetKind,
    label: String,
    url: String,
    file_name: String,
}

/// Writes releases to disk.
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    fetcher: PageFetcher,
    options: DownloadOptions,
}

impl DownloadOrchestrator {
    pub fn new(fetcher: PageFetcher, options: DownloadOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DownloadOptions {
        &mut self.options
    }

    /// Directory name for a release, before collision handling.
    pub fn release_dir_name(&self, release: &ReleaseRecord) -> String {
        let name = match self.options.dir_naming {
            DirNaming::Title => sanitize_filename(&release.title),
            DirNaming::Slug => String::new(),
        };
        if name.is_empty() {
            sanitize_filename(&release.slug)
        } else {
            name
        }
    }

    /// Download every release, in order.
    ///
    /// With [`FailurePolicy::Abort`] the first failing asset ends the run;
    /// releases finished before it stay on disk.
    pub async fn download_all(&self, releases: Vec<ReleaseRecord>) -> Result<DownloadReport> {
        fs::create_dir_all(&self.options.output_dir)
            .await
            .map_err(|e| TralbumError::io(&self.options.output_dir, e))?;

        let staging_root = self.options.output_dir.join(STAGING_DIR);
        let mut used_names = HashSet::new();
        let mut report = DownloadReport::default();

        for (n, release) in releases.iter().enumerate() {
            let mut dir_name = self.release_dir_name(release);
            if !used_names.insert(dir_name.to_lowercase()) {
                let suffix = format!(" ({})", sanitize_filename(&release.slug));
                let base = truncate_bytes(&dir_name, MAX_NAME_BYTES.saturating_sub(suffix.len()));
                dir_name = format!("{}{}", base, suffix);
                used_names.insert(dir_name.to_lowercase());
            }

            let staging = staging_root.join(n.to_string());
            match self.download_release(release, &dir_name, &staging).await {
                Ok(outcome) => report.releases.push(outcome),
                Err(e) => {
                    remove_staging_root(&staging_root).await;
                    return Err(e);
                }
            }
        }
        remove_staging_root(&staging_root).await;

        info!(
            "Downloaded {} release(s): {} file(s) written, {} failed",
            report.releases.len(),
            report.total_written(),
            report.total_failed()
        );
        Ok(report)
    }

    async fn download_release(
        &self,
        release: &ReleaseRecord,
        dir_name: &str,
        staging: &Path,
    ) -> Result<ReleaseOutcome> {
        info!(
            "Downloading {}",
            urls::release_label(&release.author, &release.title)
        );

        let directory = self.options.output_dir.join(dir_name);
        remove_dir_if_present(staging).await?;
        fs::create_dir_all(staging)
            .await
            .map_err(|e| TralbumError::io(staging, e))?;

        let assets = plan_assets(release);
        let abort_on_error = self.options.failure_policy == FailurePolicy::Abort;
        let aborted = AtomicBool::new(false);

        // Every started asset runs to completion so nothing still writes
        // into the staging directory once it is removed.
        let mut results: Vec<(Asset, Option<Result<u64>>)> = stream::iter(assets)
            .map(|asset| {
                let aborted = &aborted;
                async move {
                    if aborted.load(Ordering::Relaxed) {
                        return (asset, None);
                    }
                    let result = self.stage_asset(&asset, staging).await;
                    if result.is_err() && abort_on_error {
                        aborted.store(true, Ordering::Relaxed);
                    }
                    (asset, Some(result))
                }
            })
            .buffer_unordered(self.options.concurrency.clamp(1, MAX_CONCURRENCY))
            .collect()
            .await;
        results.sort_by_key(|(asset, _)| match asset.kind {
            AssetKind::Cover => 0,
            AssetKind::Track(i) => i + 1,
        });

        let mut staged = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for (asset, result) in results {
            match result {
                Some(Ok(_)) => staged.push(asset),
                Some(Err(e)) => {
                    warn!("Failed to download {}: {}", asset.label, e);
                    failed.push((asset.label.clone(), e.to_string()));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                None => {}
            }
        }

        if abort_on_error {
            if let Some(e) = first_error {
                remove_dir_if_present(staging).await?;
                return Err(e);
            }
        }

        if self.options.embed_tags {
            self.tag_staged(release, &staged, staging).await;
        }

        if let Err(e) = fs::create_dir_all(&directory).await {
            remove_dir_if_present(staging).await?;
            return Err(TralbumError::io(&directory, e));
        }

        let mut written = Vec::with_capacity(staged.len());
        let mut commit_error = None;
        for asset in &staged {
            let from = staging.join(&asset.file_name);
            let to = directory.join(&asset.file_name);
            match fs::rename(&from, &to).await {
                Ok(()) => {
                    debug!("Saved {}", to.display());
                    written.push(to);
                }
                Err(e) => {
                    let e = TralbumError::io(&to, e);
                    warn!("Failed to save {}: {}", asset.label, e);
                    if abort_on_error {
                        commit_error = Some(e);
                        break;
                    }
                    failed.push((asset.label.clone(), e.to_string()));
                }
            }
        }
        remove_dir_if_present(staging).await?;
        if let Some(e) = commit_error {
            return Err(e);
        }

        info!(
            "Finished {}: {} file(s) in {}",
            urls::release_label(&release.author, &release.title),
            written.len(),
            directory.display()
        );

        Ok(ReleaseOutcome {
            release_id: release.id,
            title: release.title.clone(),
            directory,
            written,
            failed,
        })
    }

    async fn stage_asset(&self, asset: &Asset, staging: &Path) -> Result<u64> {
        debug!("Fetching {}", asset.label);
        self.fetcher
            .fetch_to_file(&asset.url, &staging.join(&asset.file_name))
            .await
    }

    async fn tag_staged(&self, release: &ReleaseRecord, staged: &[Asset], staging: &Path) {
        let cover = if staged.iter().any(|asset| asset.kind == AssetKind::Cover) {
            match fs::read(staging.join(COVER_FILE)).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Could not read staged cover: {}", e);
                    None
                }
            }
        } else {
            None
        };

        for asset in staged {
            let AssetKind::Track(index) = asset.kind else {
                continue;
            };
            let track = &release.tracks[index];
            let mut metadata = AudioMetadata::new()
                .with_title(&track.title)
                .with_artist(&release.author)
                .with_album(&release.title)
                .with_track(
                    track.number.unwrap_or(index as u32 + 1),
                    u32::try_from(release.tracks.len()).ok(),
                );
            if let Some(cover) = &cover {
                metadata = metadata.with_cover_art(cover.clone());
            }

            let path = staging.join(&asset.file_name);
            let joined =
                tokio::task::spawn_blocking(move || tagging::write_metadata(&path, &metadata))
                    .await;
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Tagging {} failed: {}", asset.label, e),
                Err(e) => warn!("Tagging {} panicked: {}", asset.label, e),
            }
        }
    }
}

fn plan_assets(release: &ReleaseRecord) -> Vec<Asset> {
    let mut assets = Vec::with_capacity(release.asset_count());

    if let Some(url) = &release.cover_url {
        assets.push(Asset {
            kind: AssetKind::Cover,
            label: format!("cover of {}", urls::release_label(&release.author, &release.title)),
            url: url.clone(),
            file_name: COVER_FILE.to_string(),
        });
    }

    let mut used = HashSet::new();
    used.insert(COVER_FILE.to_string());
    for (index, track) in release.tracks.iter().enumerate() {
        let mut stem = sanitize_filename(&track.title);
        if stem.is_empty() {
            stem = format!("Track {}", index + 1);
        }
        let mut file_name = format!("{}.{}", stem, track.extension());
        let mut n = 2;
        while !used.insert(file_name.to_lowercase()) {
            file_name = format!("{} ({}).{}", stem, n, track.extension());
            n += 1;
        }

        assets.push(Asset {
            kind: AssetKind::Track(index),
            label: urls::track_label(&release.author, &release.title, &track.title),
            url: track.file_url.clone(),
            file_name,
        });
    }

    assets
}

async fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TralbumError::io(path, e)),
    }
}

/// Remove the staging root if nothing is left in it.
async fn remove_staging_root(path: &Path) {
    if let Err(e) = fs::remove_dir(path).await {
        if e.kind() != ErrorKind::NotFound {
            debug!("Leaving {} in place: {}", path.display(), e);
        }
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Sanitize a string for use as a file or directory name.
///
/// The result never starts with a dot and is at most [`MAX_NAME_BYTES`] long.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced
        .trim()
        .trim_start_matches(['.', ' '])
        .trim_end_matches(['.', ' ']);
    truncate_bytes(trimmed, MAX_NAME_BYTES)
        .trim_end_matches(['.', ' '])
        .to_string()
}
