//! Raw extractor output → canonical record
//!
//! Source documents are yt-dlp style `info.json` objects whose keys vary by
//! platform. Each canonical field is filled from an ordered chain of source
//! keys; the first non-empty candidate wins. Text, zero counts, empty lists
//! and nulls all count as empty when choosing a candidate.
//!
//! ## Usage
//!
//! ```
//! use core_metadata::{CanonicalField, MetadataNormalizer};
//! use serde_json::json;
//!
//! let raw = json!({"title": "Clip", "channel": "Studio", "duration": 3725});
//! let record = MetadataNormalizer::new().normalize(&raw).unwrap();
//!
//! assert_eq!(record.get(CanonicalField::Uploader).unwrap().as_text(), Some("Studio"));
//! assert_eq!(record.get(CanonicalField::Duration).unwrap().as_text(), Some("1:02:05"));
//! ```

use crate::error::{MetadataError, Result};
use crate::fields::CanonicalField;
use crate::record::{CanonicalRecord, FieldValue};
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

static VIEWS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([KMB]?)\s*views?").expect("views pattern is valid")
});

static LIKES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([KMB]?)\s*(?:reactions?|likes?)")
        .expect("likes pattern is valid")
});

/// Builds [`CanonicalRecord`]s from raw metadata documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataNormalizer;

impl MetadataNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes `raw` into a record with every selectable field populated.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::MissingSourceData`] if `raw` is null or not an
    /// object. Missing keys never fail; they produce present-empty fields.
    pub fn normalize(&self, raw: &Value) -> Result<CanonicalRecord> {
        let source = match raw {
            Value::Object(map) => map,
            Value::Null => return Err(MetadataError::MissingSourceData),
            other => {
                debug!(kind = value_kind(other), "Source metadata is not an object");
                return Err(MetadataError::MissingSourceData);
            }
        };

        let mut record = CanonicalRecord::new();
        let uploader_text = source.get("uploader").and_then(Value::as_str);

        record.insert(CanonicalField::Title, text_or_empty(source, &["title"]));
        record.insert(
            CanonicalField::Description,
            text_or_empty(source, &["description"]),
        );
        record.insert(
            CanonicalField::Uploader,
            text_or_empty(source, &["uploader", "channel", "webpage_url_domain"]),
        );
        record.insert(
            CanonicalField::UploaderId,
            text_or_empty(source, &["uploader_id", "channel_id"]),
        );
        record.insert(
            CanonicalField::UploaderUrl,
            text_or_empty(source, &["uploader_url", "channel_url", "webpage_url"]),
        );
        record.insert(
            CanonicalField::Channel,
            text_or_empty(source, &["channel", "uploader"]),
        );
        record.insert(
            CanonicalField::ChannelId,
            text_or_empty(source, &["channel_id", "uploader_id"]),
        );
        record.insert(
            CanonicalField::ChannelUrl,
            text_or_empty(source, &["channel_url", "uploader_url", "webpage_url"]),
        );
        record.insert(
            CanonicalField::Duration,
            source
                .get("duration")
                .map(format_duration)
                .unwrap_or_default(),
        );

        let views = first_count(source, &["view_count"])
            .or_else(|| uploader_text.and_then(views_from_text))
            .unwrap_or(0);
        record.insert(CanonicalField::Views, views);

        let likes = first_count(source, &["like_count", "repost_count"])
            .or_else(|| uploader_text.and_then(likes_from_text))
            .unwrap_or(0);
        record.insert(CanonicalField::Likes, likes);

        record.insert(
            CanonicalField::Comments,
            first_count(source, &["comment_count"]).unwrap_or(0),
        );

        record.insert(
            CanonicalField::Tags,
            first_list(source, &["tags"]).unwrap_or_default(),
        );
        record.insert(
            CanonicalField::Categories,
            source
                .get("categories")
                .and_then(Value::as_array)
                .cloned()
                .or_else(|| first_list(source, &["tags"]))
                .unwrap_or_default(),
        );
        record.insert(CanonicalField::Thumbnails, thumbnails(source));
        record.insert(CanonicalField::UploadDate, upload_date(source));
        record.insert(
            CanonicalField::Format,
            text_or_empty(source, &["format", "ext"]),
        );

        record.insert(CanonicalField::Id, text_or_empty(source, &["id"]));
        record.insert(
            CanonicalField::SourceUrl,
            text_or_empty(source, &["webpage_url", "original_url"]),
        );
        record.insert(
            CanonicalField::ExtractorName,
            text_or_empty(source, &["extractor", "extractor_key"]),
        );
        record.insert(
            CanonicalField::FileSize,
            first_count(source, &["filesize", "filesize_approx"])
                .map(FieldValue::Count)
                .unwrap_or_else(|| CanonicalField::FileSize.empty_value()),
        );
        record.insert(
            CanonicalField::FrameRate,
            first_number(source, "fps")
                .map(FieldValue::Number)
                .unwrap_or_else(|| CanonicalField::FrameRate.empty_value()),
        );
        record.insert(
            CanonicalField::Width,
            first_count(source, &["width"])
                .map(FieldValue::Count)
                .unwrap_or_else(|| CanonicalField::Width.empty_value()),
        );
        record.insert(
            CanonicalField::Height,
            first_count(source, &["height"])
                .map(FieldValue::Count)
                .unwrap_or_else(|| CanonicalField::Height.empty_value()),
        );

        debug!(fields = record.len(), "Normalized source metadata");
        Ok(record.with_raw(raw.clone()))
    }
}

/// Formats seconds as `H:MM:SS` (one hour or more) or `MM:SS`.
///
/// Accepts numbers and numeric strings; fractions are floored. Zero,
/// negative and non-numeric input yields an empty string.
pub fn format_duration(value: &Value) -> String {
    let seconds = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    let total = match seconds {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => seconds.floor() as u64,
        _ => return String::new(),
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let remaining = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, remaining)
    } else {
        format!("{:02}:{:02}", minutes, remaining)
    }
}

/// Parses a view count such as "12.3K views" out of free text.
pub fn views_from_text(text: &str) -> Option<u64> {
    count_from_text(&VIEWS_PATTERN, text)
}

/// Parses a like count such as "2M reactions" out of free text.
pub fn likes_from_text(text: &str) -> Option<u64> {
    count_from_text(&LIKES_PATTERN, text)
}

fn count_from_text(pattern: &Regex, text: &str) -> Option<u64> {
    let captures = pattern.captures(text)?;
    let number: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier = match captures.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(suffix) if suffix == "K" => 1e3,
        Some(suffix) if suffix == "M" => 1e6,
        Some(suffix) if suffix == "B" => 1e9,
        _ => 1.0,
    };

    let count = (number * multiplier).round() as u64;
    (count > 0).then_some(count)
}

fn text_or_empty(source: &Map<String, Value>, keys: &[&str]) -> FieldValue {
    for key in keys {
        match source.get(*key) {
            Some(Value::String(text)) if !text.is_empty() => {
                return FieldValue::Text(text.clone());
            }
            Some(Value::Number(number)) if number.as_f64() != Some(0.0) => {
                return FieldValue::Text(number.to_string());
            }
            Some(value @ (Value::Object(_) | Value::Array(_))) if !is_empty_json(value) => {
                return FieldValue::Structured(value.clone());
            }
            Some(Value::Bool(true)) => return FieldValue::Text("true".to_string()),
            _ => {}
        }
    }
    FieldValue::Text(String::new())
}

fn first_count(source: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .filter_map(|key| source.get(*key))
        .filter_map(count_of)
        .find(|count| *count > 0)
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(|n| n.round() as u64)
        }),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n > 0.0)
            .map(|n| n.round() as u64),
        _ => None,
    }
}

fn first_number(source: &Map<String, Value>, key: &str) -> Option<serde_json::Number> {
    match source.get(key) {
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => Some(number.clone()),
        _ => None,
    }
}

fn first_list(source: &Map<String, Value>, keys: &[&str]) -> Option<Vec<Value>> {
    keys.iter()
        .filter_map(|key| source.get(*key))
        .filter_map(Value::as_array)
        .find(|items| !items.is_empty())
        .cloned()
}

fn thumbnails(source: &Map<String, Value>) -> Vec<Value> {
    if let Some(list) = source.get("thumbnails").and_then(Value::as_array) {
        return list.clone();
    }

    match source.get("thumbnail") {
        Some(Value::String(url)) if !url.is_empty() => vec![Value::String(url.clone())],
        _ => Vec::new(),
    }
}

fn upload_date(source: &Map<String, Value>) -> FieldValue {
    if let FieldValue::Text(date) = text_or_empty(source, &["upload_date"]) {
        if !date.is_empty() {
            return FieldValue::Text(date);
        }
    }

    let from_timestamp = source
        .get("timestamp")
        .and_then(Value::as_f64)
        .filter(|seconds| *seconds != 0.0 && seconds.is_finite())
        .and_then(|seconds| DateTime::from_timestamp(seconds.floor() as i64, 0))
        .map(|date| date.format("%Y-%m-%d").to_string());

    match from_timestamp {
        Some(date) => FieldValue::Text(date),
        None => text_or_empty(source, &["modified_date"]),
    }
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(raw: Value) -> CanonicalRecord {
        MetadataNormalizer::new().normalize(&raw).unwrap()
    }

    fn text(record: &CanonicalRecord, field: CanonicalField) -> &str {
        record.get(field).and_then(FieldValue::as_text).unwrap()
    }

    fn count(record: &CanonicalRecord, field: CanonicalField) -> u64 {
        record.get(field).and_then(FieldValue::as_count).unwrap()
    }

    #[test]
    fn test_null_source_is_rejected() {
        let result = MetadataNormalizer::new().normalize(&Value::Null);
        assert!(matches!(result, Err(MetadataError::MissingSourceData)));
    }

    #[test]
    fn test_non_object_source_is_rejected() {
        let result = MetadataNormalizer::new().normalize(&json!("title"));
        assert!(matches!(result, Err(MetadataError::MissingSourceData)));
    }

    #[test]
    fn test_every_selectable_field_is_populated() {
        let record = normalize(json!({}));
        for field in CanonicalField::ALL {
            assert!(record.contains(field), "{} missing", field);
        }
        assert!(!record.contains(CanonicalField::Note));
    }

    #[test]
    fn test_uploader_fallback_chain() {
        let record = normalize(json!({"uploader": "U", "channel": "C"}));
        assert_eq!(text(&record, CanonicalField::Uploader), "U");

        let record = normalize(json!({"uploader": "", "channel": "C"}));
        assert_eq!(text(&record, CanonicalField::Uploader), "C");

        let record = normalize(json!({"webpage_url_domain": "example.com"}));
        assert_eq!(text(&record, CanonicalField::Uploader), "example.com");
    }

    #[test]
    fn test_id_and_url_chains_are_mirrored() {
        let record = normalize(json!({
            "uploader_id": "@u",
            "channel_url": "https://c",
            "webpage_url": "https://w"
        }));

        assert_eq!(text(&record, CanonicalField::UploaderId), "@u");
        assert_eq!(text(&record, CanonicalField::ChannelId), "@u");
        assert_eq!(text(&record, CanonicalField::UploaderUrl), "https://c");
        assert_eq!(text(&record, CanonicalField::ChannelUrl), "https://c");
        assert_eq!(text(&record, CanonicalField::SourceUrl), "https://w");
    }

    #[test]
    fn test_channel_falls_back_to_uploader() {
        let record = normalize(json!({"uploader": "U"}));
        assert_eq!(text(&record, CanonicalField::Channel), "U");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&json!(65)), "01:05");
        assert_eq!(format_duration(&json!(3725.9)), "1:02:05");
        assert_eq!(format_duration(&json!("90")), "01:30");
        assert_eq!(format_duration(&json!(0.4)), "00:00");
        assert_eq!(format_duration(&json!("0.9")), "00:00");
        assert_eq!(format_duration(&json!(0)), "");
        assert_eq!(format_duration(&json!(-4)), "");
        assert_eq!(format_duration(&json!("abc")), "");
        assert_eq!(format_duration(&Value::Null), "");
    }

    #[test]
    fn test_views_from_text() {
        assert_eq!(views_from_text("12.3K views"), Some(12_300));
        assert_eq!(views_from_text("2M views"), Some(2_000_000));
        assert_eq!(views_from_text("1.5b VIEWS"), Some(1_500_000_000));
        assert_eq!(views_from_text("431 view"), Some(431));
        assert_eq!(views_from_text("no numbers here"), None);
    }

    #[test]
    fn test_likes_from_text() {
        assert_eq!(likes_from_text("Page · 4.2K reactions"), Some(4_200));
        assert_eq!(likes_from_text("17 likes"), Some(17));
        assert_eq!(likes_from_text("3 views"), None);
    }

    #[test]
    fn test_views_prefer_view_count() {
        let record = normalize(json!({"view_count": 5000, "uploader": "12K views"}));
        assert_eq!(count(&record, CanonicalField::Views), 5000);
    }

    #[test]
    fn test_views_parsed_from_uploader_text() {
        let record = normalize(json!({"uploader": "Some Page | 12.3K views"}));
        assert_eq!(count(&record, CanonicalField::Views), 12_300);
    }

    #[test]
    fn test_views_without_any_source_are_zero() {
        let record = normalize(json!({"uploader": "Someone"}));
        assert_eq!(count(&record, CanonicalField::Views), 0);
    }

    #[test]
    fn test_likes_fallback_chain() {
        let record = normalize(json!({"repost_count": 9}));
        assert_eq!(count(&record, CanonicalField::Likes), 9);

        let record = normalize(json!({"like_count": 0, "uploader": "2M likes"}));
        assert_eq!(count(&record, CanonicalField::Likes), 2_000_000);
    }

    #[test]
    fn test_categories_fall_back_to_tags() {
        let record = normalize(json!({"tags": ["a", "b"]}));
        assert_eq!(
            record.get(CanonicalField::Categories),
            Some(&FieldValue::List(vec![json!("a"), json!("b")]))
        );
    }

    #[test]
    fn test_empty_categories_do_not_fall_back() {
        let record = normalize(json!({"categories": [], "tags": ["a"]}));
        assert_eq!(
            record.get(CanonicalField::Categories),
            Some(&FieldValue::List(Vec::new()))
        );
    }

    #[test]
    fn test_empty_thumbnails_do_not_fall_back() {
        let record = normalize(json!({"thumbnails": [], "thumbnail": "https://t/1.jpg"}));
        assert_eq!(
            record.get(CanonicalField::Thumbnails),
            Some(&FieldValue::List(Vec::new()))
        );
    }

    #[test]
    fn test_single_thumbnail_becomes_list() {
        let record = normalize(json!({"thumbnail": "https://t/1.jpg"}));
        assert_eq!(
            record.get(CanonicalField::Thumbnails),
            Some(&FieldValue::List(vec![json!("https://t/1.jpg")]))
        );
    }

    #[test]
    fn test_upload_date_chain() {
        let record = normalize(json!({"upload_date": "20240102", "timestamp": 0}));
        assert_eq!(text(&record, CanonicalField::UploadDate), "20240102");

        let record = normalize(json!({"timestamp": 1_700_000_000}));
        assert_eq!(text(&record, CanonicalField::UploadDate), "2023-11-14");

        let record = normalize(json!({"modified_date": "20230101"}));
        assert_eq!(text(&record, CanonicalField::UploadDate), "20230101");

        let record = normalize(json!({}));
        assert_eq!(text(&record, CanonicalField::UploadDate), "");
    }

    #[test]
    fn test_format_falls_back_to_ext() {
        let record = normalize(json!({"ext": "mp4"}));
        assert_eq!(text(&record, CanonicalField::Format), "mp4");
    }

    #[test]
    fn test_technical_fields() {
        let record = normalize(json!({
            "id": "abc123",
            "extractor_key": "Youtube",
            "filesize_approx": 1048576,
            "fps": 29.97,
            "width": 1920,
            "height": 1080
        }));

        assert_eq!(text(&record, CanonicalField::Id), "abc123");
        assert_eq!(text(&record, CanonicalField::ExtractorName), "Youtube");
        assert_eq!(count(&record, CanonicalField::FileSize), 1_048_576);
        assert_eq!(
            record.get(CanonicalField::FrameRate).unwrap().to_json(),
            json!(29.97)
        );
        assert_eq!(count(&record, CanonicalField::Width), 1920);
        assert_eq!(count(&record, CanonicalField::Height), 1080);
    }

    #[test]
    fn test_missing_technical_fields_are_present_empty() {
        let record = normalize(json!({"title": "T"}));
        assert!(record.get(CanonicalField::Width).unwrap().is_empty());
        assert!(record.get(CanonicalField::FrameRate).unwrap().is_empty());
    }

    #[test]
    fn test_raw_is_retained() {
        let raw = json!({"title": "T", "_type": "video"});
        let record = normalize(raw.clone());
        assert_eq!(record.raw(), Some(&raw));
    }
}
