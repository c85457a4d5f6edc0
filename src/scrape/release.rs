//! Release page parsing.
//!
//! Extraction runs in two stages: the DOM is only used to pull the raw
//! `data-tralbum` attribute and the cover link out of the page, then
//! [`converters::parse_release`] turns the decoded JSON into a record.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::info;

use crate::converters;
use crate::error::ParseError;
use crate::models::ReleaseRecord;
use crate::urls;

/// Script attribute carrying the release payload.
pub const PAYLOAD_ATTRIBUTE: &str = "data-tralbum";

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));
static IMAGE_SRC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="image_src"]"#).expect("valid selector"));

fn parse_document(html: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(html))
}

fn payload_in(document: &Html) -> Option<String> {
    document
        .select(&SCRIPT)
        .find_map(|script| script.value().attr(PAYLOAD_ATTRIBUTE))
        .map(str::to_string)
}

fn cover_in(document: &Html) -> Option<String> {
    document
        .select(&IMAGE_SRC)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Raw (entity-decoded) payload of the first script carrying it.
pub fn embedded_payload(html: &[u8]) -> Result<String, ParseError> {
    payload_in(&parse_document(html)).ok_or(ParseError::NoEmbeddedData)
}

/// Cover image URL advertised by the page, if any.
pub fn cover_url(html: &[u8]) -> Option<String> {
    cover_in(&parse_document(html))
}

/// Extract a full release record from a release page.
///
/// `slug` is the path segment the page was fetched with.
pub fn extract_release(html: &[u8], slug: &str) -> Result<ReleaseRecord, ParseError> {
    let (payload, cover) = {
        let document = parse_document(html);
        let payload = payload_in(&document).ok_or(ParseError::NoEmbeddedData)?;
        (payload, cover_in(&document))
    };

    let json: Value = serde_json::from_str(&payload)?;
    let track_entries = json
        .get("trackinfo")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let release = converters::parse_release(&json, slug, cover)?;

    info!(
        "Fetched release info {}",
        urls::release_label(&release.author, &release.title)
    );
    info!(
        "The release lists {} track(s), {} streamable:",
        track_entries,
        release.tracks.len()
    );
    for (i, track) in release.tracks.iter().enumerate() {
        info!(
            "{}: {}",
            i + 1,
            urls::track_label(&release.author, &release.title, &track.title)
        );
    }

    Ok(release)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_page(payload: &str, cover: Option<&str>) -> String {
        let escaped = payload.replace('&', "&amp;").replace('"', "&quot;");
        let cover = cover
            .map(|c| format!(r#"<link rel="image_src" href="{}">"#, c))
            .unwrap_or_default();
        format!(
            r#"<!DOCTYPE html><html><head>{cover}
<script src="/player.js"></script>
<script type="text/javascript" data-band="{{}}" data-tralbum="{escaped}"></script>
<script data-tralbum="{{&quot;id&quot;: 999}}"></script>
</head><body></body></html>"#
        )
    }

    const PAYLOAD: &str = r#"{
        "id": 123,
        "artist": "Slowed & Reverb",
        "current": {"title": "The \"Abstract\" Rooms"},
        "trackinfo": [
            {"id": 1, "track_num": 1, "title": "Intro", "file": {"mp3-128": "https://t4.bcbits.com/stream/1"}},
            {"id": 2, "track_num": 2, "title": "Hidden", "file": null},
            {"id": 3, "track_num": 3, "title": "Outro", "file": {"mp3-128": "https://t4.bcbits.com/stream/3"}}
        ]
    }"#;

    #[test]
    fn test_embedded_payload_first_match_and_entities_decoded() {
        let html = release_page(PAYLOAD, None);
        let payload = embedded_payload(html.as_bytes()).unwrap();
        let json: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(json["id"], 123);
        assert_eq!(json["artist"], "Slowed & Reverb");
    }

    #[test]
    fn test_missing_payload_is_error() {
        let html = "<html><head><script>var x = 1;</script></head></html>";
        assert!(matches!(
            embedded_payload(html.as_bytes()),
            Err(ParseError::NoEmbeddedData)
        ));
        assert!(matches!(
            extract_release(html.as_bytes(), "x"),
            Err(ParseError::NoEmbeddedData)
        ));
    }

    #[test]
    fn test_cover_url() {
        let html = release_page(PAYLOAD, Some("https://f4.bcbits.com/img/a123_10.jpg"));
        assert_eq!(
            cover_url(html.as_bytes()).as_deref(),
            Some("https://f4.bcbits.com/img/a123_10.jpg")
        );
        assert_eq!(cover_url(release_page(PAYLOAD, None).as_bytes()), None);
    }

    #[test]
    fn test_extract_release_drops_unstreamable_tracks_in_order() {
        let html = release_page(PAYLOAD, Some("https://f4.bcbits.com/img/a123_10.jpg"));
        let release = extract_release(html.as_bytes(), "the-abstractrooms").unwrap();

        assert_eq!(release.id, 123);
        assert_eq!(release.slug, "the-abstractrooms");
        assert_eq!(release.title, "The \"Abstract\" Rooms");
        assert_eq!(release.author, "Slowed & Reverb");
        assert_eq!(
            release.cover_url.as_deref(),
            Some("https://f4.bcbits.com/img/a123_10.jpg")
        );
        let titles: Vec<_> = release.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Outro"]);
        assert_eq!(release.tracks[1].file_url, "https://t4.bcbits.com/stream/3");
    }

    #[test]
    fn test_invalid_json_is_error() {
        let html = r#"<script data-tralbum="{not json"></script>"#;
        assert!(matches!(
            extract_release(html.as_bytes(), "x"),
            Err(ParseError::Json(_))
        ));
    }
}
