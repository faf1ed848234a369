//! Metadata extraction.
//!
//! Turns the JSON files under the activity root into [`PostInfo`] records.
//! The files have no fixed schema: an item list may be the whole document
//! or hang off one of several keys, and each item names its caption, media
//! reference and timestamp with whichever field its producer preferred.
//! Every lookup is therefore an ordered probe over candidate field names
//! taken from [`ParserConfig`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::archive::{ArchiveTable, is_hidden_path};
use crate::config::ParserConfig;
use crate::error::MetadataFileParseError;

/// One metadata item reduced to what matching needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PostInfo {
    pub caption: String,
    pub media_uri: String,
    /// Epoch milliseconds
    pub timestamp: Option<i64>,
    pub original_payload: Value,
}

/// Everything one extraction pass produced.
#[derive(Debug, Default)]
pub struct Extraction {
    pub posts: Vec<PostInfo>,
    /// Candidate files in the order they were read
    pub files: Vec<String>,
    pub skipped: Vec<MetadataFileParseError>,
}

/// Extract post records from every JSON file under `activity_root`.
///
/// A file that is not valid UTF-8 or not valid JSON is skipped and
/// recorded in [`Extraction::skipped`]; it never fails the call.
pub fn extract(table: &ArchiveTable, activity_root: &str, config: &ParserConfig) -> Extraction {
    let files = candidate_files(table, activity_root, config);
    let mut extraction = Extraction::default();

    for path in &files {
        let Some(data) = table.get(path) else {
            continue;
        };

        let value = match parse_json(data) {
            Ok(value) => value,
            Err(reason) => {
                warn!(%path, %reason, "skipping unreadable metadata file");
                extraction.skipped.push(MetadataFileParseError {
                    path: path.clone(),
                    reason,
                });
                continue;
            }
        };

        let before = extraction.posts.len();
        extraction.posts.extend(
            normalize_items(value, config)
                .iter()
                .filter_map(|item| item.as_object())
                .filter_map(|item| extract_post(item, config)),
        );
        debug!(%path, posts = extraction.posts.len() - before, "extracted metadata file");
    }

    extraction.files = files;
    extraction
}

/// JSON files under `activity_root`, priority files first.
pub fn candidate_files(
    table: &ArchiveTable,
    activity_root: &str,
    config: &ParserConfig,
) -> Vec<String> {
    let mut files: Vec<String> = table
        .paths()
        .filter(|path| path.starts_with(activity_root) && path.ends_with(".json"))
        .filter(|path| !is_hidden_path(path))
        .map(str::to_string)
        .collect();
    // Stable: unlisted files keep table order
    files.sort_by_key(|path| config.metadata_priority(file_name(path)));
    files
}

fn parse_json(data: &[u8]) -> Result<Value, String> {
    let text = std::str::from_utf8(data).map_err(|e| format!("not UTF-8 text: {}", e))?;
    serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))
}

/// Flatten a parsed document into the items to extract from.
pub fn normalize_items(value: Value, config: &ParserConfig) -> Vec<Value> {
    let items = match &value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => config
            .item_container_keys
            .iter()
            .find_map(|key| map.get(key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    if items.is_empty() && !value.is_array() {
        vec![value]
    } else {
        items
    }
}

/// Build a [`PostInfo`] from one item, or `None` when it has no media reference.
pub fn extract_post(item: &Map<String, Value>, config: &ParserConfig) -> Option<PostInfo> {
    let scopes = lookup_scopes(item, config);

    let media_uri = first_text(&scopes, &config.media_uri_fields, false)?;
    let caption = first_text(&scopes, &config.caption_fields, true)
        .map(|caption| {
            if config.repair_text_encoding {
                repair_latin1_escapes(&caption)
            } else {
                caption
            }
        })
        .unwrap_or_else(|| config.default_caption.clone());
    let timestamp = first_present(&scopes, &config.timestamp_fields).and_then(timestamp_millis);

    Some(PostInfo {
        caption,
        media_uri,
        timestamp,
        original_payload: Value::Object(item.clone()),
    })
}

/// The item itself, then the first entry of its nested media list.
fn lookup_scopes<'a>(
    item: &'a Map<String, Value>,
    config: &ParserConfig,
) -> Vec<&'a Map<String, Value>> {
    let mut scopes = vec![item];
    let nested = config
        .nested_media_keys
        .iter()
        .filter_map(|key| item.get(key).and_then(Value::as_array))
        .find_map(|media| media.first().and_then(Value::as_object));
    scopes.extend(nested);
    scopes
}

/// First non-blank text value among `fields`, probing each scope in turn.
fn first_text(scopes: &[&Map<String, Value>], fields: &[String], allow_numbers: bool) -> Option<String> {
    scopes.iter().find_map(|scope| {
        fields.iter().find_map(|field| match scope.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) if allow_numbers => Some(n.to_string()),
            _ => None,
        })
    })
}

/// First non-null value among `fields`, probing each scope in turn.
fn first_present<'a>(scopes: &[&'a Map<String, Value>], fields: &[String]) -> Option<&'a Value> {
    scopes.iter().find_map(|scope| {
        fields
            .iter()
            .find_map(|field| scope.get(field).filter(|v| !v.is_null()))
    })
}

fn timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_date_millis(s),
        _ => None,
    }
}

/// Shortest all-digit string read as epoch milliseconds.
pub const MIN_EPOCH_DIGITS: usize = 10;

/// Parse a textual date into epoch milliseconds.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD[ T]HH:MM:SS` and `YYYY-MM-DD`
/// (naive values are taken as UTC). An all-digit string is epoch
/// milliseconds when it has at least [`MIN_EPOCH_DIGITS`] digits, a bare
/// year (midnight UTC on January 1) when it has four, and rejected
/// otherwise.
pub fn parse_date_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return match text.len() {
            4 => text
                .parse()
                .ok()
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp_millis()),
            n if n >= MIN_EPOCH_DIGITS => text.parse().ok(),
            _ => None,
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Undo UTF-8 that was written out as one Latin-1 code point per byte.
///
/// Exports escape captions this way (`"cafÃ©"` for `"café"`). Text with
/// any char above U+00FF, or whose bytes do not form valid UTF-8, is
/// returned unchanged.
pub fn repair_latin1_escapes(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let bytes: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(c).ok()).collect();
    bytes
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| text.to_string())
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
