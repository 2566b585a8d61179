//! JSON and plain-text renderings of a projected record.
//!
//! Both renderings are deterministic for a given record and clock: fields are
//! written in canonical order and the text footer takes its timestamp from
//! the injected [`Clock`].

use crate::error::{MetadataError, Result};
use crate::fields::CanonicalField;
use crate::record::{CanonicalRecord, FieldValue};
use bridge_traits::{Clock, FileFilter, SystemClock};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

const TEXT_HEADER: &str = "Video Metadata";
const TEXT_RULE: &str = "===============";
const NOT_AVAILABLE: &str = "Not available";
const NONE: &str = "None";

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Txt,
}

impl ExportFormat {
    /// Parses a format name, falling back to JSON for unknown names.
    pub fn from_name_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(format = name, "Unknown export format, using JSON");
            ExportFormat::Json
        })
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
        }
    }

    /// Uppercase label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Txt => "TXT",
        }
    }

    /// Save-dialog filter for this format.
    pub fn file_filter(self) -> FileFilter {
        match self {
            ExportFormat::Json => FileFilter::new("JSON Files", &["json"]),
            ExportFormat::Txt => FileFilter::new("Text Files", &["txt"]),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "txt" | "text" => Ok(ExportFormat::Txt),
            _ => Err(MetadataError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Renders records in an [`ExportFormat`].
#[derive(Clone)]
pub struct Serializer {
    clock: Arc<dyn Clock>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer").finish_non_exhaustive()
    }
}

impl Serializer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn serialize(&self, record: &CanonicalRecord, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => to_json(record),
            ExportFormat::Txt => Ok(to_text(record, self.clock.now())),
        }
    }
}

/// Pretty-printed JSON with two-space indent, present fields only.
pub fn to_json(record: &CanonicalRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Labelled plain text with a `Generated on` footer.
pub fn to_text(record: &CanonicalRecord, generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![TEXT_HEADER.to_string(), TEXT_RULE.to_string(), String::new()];

    for (field, value) in record.iter() {
        lines.push(format!("{}: {}", field.label(), render_value(field, value)));
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated on: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    lines.join("\n")
}

fn render_value(field: CanonicalField, value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) if text.is_empty() => NOT_AVAILABLE.to_string(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::Count(count) => count.to_string(),
        FieldValue::Number(number) => number.to_string(),
        FieldValue::List(items) if items.is_empty() => NONE.to_string(),
        FieldValue::List(items) if field == CanonicalField::Thumbnails => {
            format!("{} thumbnail(s) available", items.len())
        }
        FieldValue::List(items) => items
            .iter()
            .map(render_item)
            .collect::<Vec<_>>()
            .join(", "),
        FieldValue::Structured(Value::Null) => NOT_AVAILABLE.to_string(),
        FieldValue::Structured(Value::String(text)) if text.is_empty() => {
            NOT_AVAILABLE.to_string()
        }
        FieldValue::Structured(value) => render_item(value),
    }
}

fn render_item(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::FixedClock;
    use serde_json::json;

    fn fixed_serializer() -> Serializer {
        Serializer::new(Arc::new(FixedClock::from_unix(1_700_000_000)))
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(" TXT ".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(MetadataError::UnsupportedFormat(_))
        ));
        assert_eq!(ExportFormat::from_name_lenient("xml"), ExportFormat::Json);
    }

    #[test]
    fn test_format_properties() {
        assert_eq!(ExportFormat::Txt.extension(), "txt");
        assert_eq!(ExportFormat::Json.label(), "JSON");
        assert_eq!(ExportFormat::Txt.file_filter().name, "Text Files");
        assert_eq!(ExportFormat::Json.file_filter().extensions, vec!["json"]);
    }

    #[test]
    fn test_json_keeps_canonical_order_and_empty_forms() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Tags, Vec::<Value>::new())
            .with(CanonicalField::Views, 0u64)
            .with(CanonicalField::Title, "");

        let rendered = to_json(&record).unwrap();
        assert_eq!(
            rendered,
            "{\n  \"title\": \"\",\n  \"views\": 0,\n  \"tags\": []\n}"
        );
    }

    #[test]
    fn test_text_rendering() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Title, "Clip")
            .with(CanonicalField::Description, "")
            .with(CanonicalField::Views, 12_300u64)
            .with(CanonicalField::Tags, Vec::<Value>::new())
            .with(CanonicalField::Categories, vec![json!("Music"), json!(7)])
            .with(
                CanonicalField::Thumbnails,
                vec![json!({"url": "a"}), json!({"url": "b"}), json!({"url": "c"})],
            );

        let rendered = fixed_serializer()
            .serialize(&record, ExportFormat::Txt)
            .unwrap();

        let expected = "Video Metadata\n\
                        ===============\n\
                        \n\
                        Title: Clip\n\
                        Description: Not available\n\
                        Views: 12300\n\
                        Tags: None\n\
                        Categories: Music, 7\n\
                        Thumbnails: 3 thumbnail(s) available\n\
                        \n\
                        Generated on: 2023-11-14 22:13:20 UTC";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_text_renders_structured_values_as_compact_json() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Format, FieldValue::Structured(json!({"id": 22})))
            .with(CanonicalField::Width, FieldValue::Structured(Value::Null));

        let rendered = to_text(&record, Utc::now());
        assert!(rendered.contains("Format: {\"id\":22}"));
        assert!(rendered.contains("Width: Not available"));
    }

    #[test]
    fn test_text_uses_note_label() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Title, "Unknown")
            .with(CanonicalField::Note, "No additional metadata available for selected fields");

        let rendered = to_text(&record, Utc::now());
        assert!(rendered.contains("\nNote: No additional metadata available for selected fields\n"));
    }

    #[test]
    fn test_serialization_is_stable_for_fixed_clock() {
        let record = CanonicalRecord::new().with(CanonicalField::Title, "T");
        let serializer = fixed_serializer();

        for format in [ExportFormat::Json, ExportFormat::Txt] {
            assert_eq!(
                serializer.serialize(&record, format).unwrap(),
                serializer.serialize(&record, format).unwrap()
            );
        }
    }
}
