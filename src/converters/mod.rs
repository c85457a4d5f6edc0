//! JSON to model converters.
//!
//! Turns the decoded `data-tralbum` payload of a release page into a
//! [`ReleaseRecord`].

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::models::{ReleaseRecord, TrackRecord};

/// Encoding labels in order of preference. Labels not listed here rank
/// after all of these, alphabetically.
pub const FORMAT_PREFERENCE: &[&str] = &["flac", "mp3-320", "mp3-v0", "mp3-128"];

fn required<'a>(
    value: Option<&'a Value>,
    field: &'static str,
) -> Result<&'a Value, ParseError> {
    value
        .filter(|v| !v.is_null())
        .ok_or(ParseError::MalformedPayload { field })
}

fn required_u64(json: &Value, key: &str, field: &'static str) -> Result<u64, ParseError> {
    required(json.get(key), field)?
        .as_u64()
        .ok_or(ParseError::MalformedPayload { field })
}

fn required_str(value: Option<&Value>, field: &'static str) -> Result<String, ParseError> {
    required(value, field)?
        .as_str()
        .map(str::to_string)
        .ok_or(ParseError::MalformedPayload { field })
}

/// Protocol-relative URLs (`//host/path`) get an `https:` scheme.
fn absolute(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Pick one stream out of a track's format map.
///
/// Returns `(format, url)`, or `None` when no entry carries a URL.
pub fn select_format(files: &Map<String, Value>) -> Option<(&str, &str)> {
    let mut keys: Vec<&str> = files.keys().map(String::as_str).collect();
    keys.sort_by_key(|key| {
        let rank = FORMAT_PREFERENCE
            .iter()
            .position(|preferred| preferred == key)
            .unwrap_or(FORMAT_PREFERENCE.len());
        (rank, *key)
    });

    keys.into_iter().find_map(|key| {
        files
            .get(key)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(|url| (key, url))
    })
}

/// Parse one `trackinfo` entry. `Ok(None)` means the track has no stream.
pub fn parse_track(json: &Value) -> Result<Option<TrackRecord>, ParseError> {
    let id = required_u64(json, "id", "trackinfo.id")?;

    let Some(files) = json.get("file").and_then(Value::as_object) else {
        return Ok(None);
    };
    let Some((format, url)) = select_format(files) else {
        return Ok(None);
    };

    Ok(Some(TrackRecord {
        id,
        title: json
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        number: json
            .get("track_num")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        format: format.to_string(),
        file_url: absolute(url),
    }))
}

/// Parse a release payload.
///
/// `id`, `current.title`, `artist` and `trackinfo` are required. Tracks
/// without any stream are left out; the others keep payload order.
pub fn parse_release(
    json: &Value,
    slug: &str,
    cover_url: Option<String>,
) -> Result<ReleaseRecord, ParseError> {
    let id = required_u64(json, "id", "id")?;
    let title = required_str(
        json.get("current").and_then(|c| c.get("title")),
        "current.title",
    )?;
    let author = required_str(json.get("artist"), "artist")?;
    let trackinfo = required(json.get("trackinfo"), "trackinfo")?
        .as_array()
        .ok_or(ParseError::MalformedPayload { field: "trackinfo" })?;

    let mut tracks = Vec::with_capacity(trackinfo.len());
    for entry in trackinfo {
        if let Some(track) = parse_track(entry)? {
            tracks.push(track);
        }
    }

    Ok(ReleaseRecord {
        id,
        slug: slug.to_string(),
        title,
        author,
        cover_url: cover_url.map(|url| absolute(&url)),
        tracks,
    })
}
