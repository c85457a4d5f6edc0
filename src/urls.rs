//! URL and log label builders.
//!
//! Everything here is a pure function over its inputs. Inputs are assumed to
//! be valid subdomains and slugs already.

/// Host under which every author gets a subdomain.
pub const PLATFORM_HOST: &str = "bandcamp.com";

/// Catalog page of an author: `https://{author}.bandcamp.com`.
pub fn author_url(author: &str) -> String {
    format!("https://{}.{}", author, PLATFORM_HOST)
}

/// Release page of an author: `https://{author}.bandcamp.com/album/{slug}`.
pub fn release_url(author: &str, slug: &str) -> String {
    release_url_at(&author_url(author), slug)
}

/// Release page below an arbitrary author root.
pub fn release_url_at(root: &str, slug: &str) -> String {
    format!("{}/album/{}", root.trim_end_matches('/'), slug)
}

/// Platform-relative path (`/track/...`) resolved against the author root.
pub fn track_url(author: &str, path: &str) -> String {
    format!("{}{}", author_url(author), path)
}

/// Log label identifying a release.
pub fn release_label(author: &str, release: &str) -> String {
    format!("[ Author: {} Release: {} ]", author, release)
}

/// Log label identifying a track of a release.
pub fn track_label(author: &str, release: &str, track: &str) -> String {
    format!(
        "[ Author: {} Release: {} Track: {} ]",
        author, release, track
    )
}
