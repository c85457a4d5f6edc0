//! Catalog page parsing.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ParseError;
use crate::models::CatalogPage;

static MUSIC_GRID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ol#music-grid").expect("valid selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static AUTHOR_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#band-name-location .title").expect("valid selector"));

/// Parse an author's catalog page.
///
/// Returns [`ParseError::MissingGrid`] when the page has no release grid at
/// all. A grid without items is an empty catalog, not an error.
pub fn parse_catalog(html: &[u8]) -> Result<CatalogPage, ParseError> {
    let document = Html::parse_document(&String::from_utf8_lossy(html));

    let grid = document
        .select(&MUSIC_GRID)
        .next()
        .ok_or(ParseError::MissingGrid)?;

    let mut slugs = Vec::new();
    for item in grid.children().filter_map(ElementRef::wrap) {
        if item.value().name() != "li" {
            continue;
        }
        let href = item
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"));
        match href.and_then(slug_from_href) {
            Some(slug) => slugs.push(slug.to_string()),
            None => debug!("Skipping grid item without a release link: {:?}", href),
        }
    }

    let author_name = document
        .select(&AUTHOR_NAME)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(CatalogPage { author_name, slugs })
}

/// Final path segment of a release link, ignoring query and fragment.
pub fn slug_from_href(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|slug| !slug.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<!DOCTYPE html>
<html><body>
  <p id="band-name-location">
    <span class="title">Slowed &amp; Reverb</span>
    <span class="location">Internet</span>
  </p>
  <ol id="music-grid" class="editable-grid music-grid columns-4">
    <li data-item-id="album-1" class="music-grid-item square">
      <a href="/album/the-abstractrooms"><p class="title">The Abstractrooms</p></a>
    </li>
    <li data-item-id="track-2" class="music-grid-item square">
      <a href="/track/lonely-single?from=grid"><p class="title">Lonely Single</p></a>
    </li>
    <li data-item-id="album-3" class="music-grid-item square">
      <a href="https://other.bandcamp.com/album/split-ep/"><p class="title">Split</p></a>
    </li>
  </ol>
</body></html>"#;

    #[test]
    fn test_parse_catalog_slugs_in_document_order() {
        let page = parse_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(
            page.slugs,
            vec!["the-abstractrooms", "lonely-single", "split-ep"]
        );
    }

    #[test]
    fn test_parse_catalog_author_name() {
        let page = parse_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(page.author_name.as_deref(), Some("Slowed & Reverb"));
    }

    #[test]
    fn test_empty_grid_is_empty_catalog() {
        let html = r#"<html><body><ol id="music-grid"></ol></body></html>"#;
        let page = parse_catalog(html.as_bytes()).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.author_name, None);
    }

    #[test]
    fn test_missing_grid_is_error() {
        let html = r#"<html><body><div id="discography"></div></body></html>"#;
        assert!(matches!(
            parse_catalog(html.as_bytes()),
            Err(ParseError::MissingGrid)
        ));
    }

    #[test]
    fn test_items_without_links_are_skipped() {
        let html = r#"<ol id="music-grid">
            <li><p>coming soon</p></li>
            <li><a href="/album/real">x</a></li>
        </ol>"#;
        let page = parse_catalog(html.as_bytes()).unwrap();
        assert_eq!(page.slugs, vec!["real"]);
    }

    #[test]
    fn test_slug_from_href() {
        assert_eq!(slug_from_href("/album/a-b"), Some("a-b"));
        assert_eq!(slug_from_href("/album/a-b/"), Some("a-b"));
        assert_eq!(slug_from_href("/album/a-b#tracks"), Some("a-b"));
        assert_eq!(slug_from_href("/"), None);
        assert_eq!(slug_from_href(""), None);
    }
}
