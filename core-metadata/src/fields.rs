//! Canonical field names, their display labels and their empty forms.

use crate::record::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pseudo-field sent by "select all" checkboxes; never a real field.
pub const SELECT_ALL: &str = "selectAll";

/// A field of the canonical metadata record.
///
/// Variant order is the canonical output order; `Ord` follows it, so a
/// `BTreeMap<CanonicalField, _>` iterates in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Title,
    Description,
    Uploader,
    UploaderId,
    UploaderUrl,
    Channel,
    ChannelId,
    ChannelUrl,
    Duration,
    Views,
    Likes,
    Comments,
    Tags,
    Categories,
    Thumbnails,
    UploadDate,
    Format,
    Id,
    SourceUrl,
    ExtractorName,
    FileSize,
    FrameRate,
    Width,
    Height,
    /// Only present in fallback records; not selectable.
    Note,
}

impl CanonicalField {
    /// Every selectable field in canonical order.
    pub const ALL: [CanonicalField; 24] = [
        CanonicalField::Title,
        CanonicalField::Description,
        CanonicalField::Uploader,
        CanonicalField::UploaderId,
        CanonicalField::UploaderUrl,
        CanonicalField::Channel,
        CanonicalField::ChannelId,
        CanonicalField::ChannelUrl,
        CanonicalField::Duration,
        CanonicalField::Views,
        CanonicalField::Likes,
        CanonicalField::Comments,
        CanonicalField::Tags,
        CanonicalField::Categories,
        CanonicalField::Thumbnails,
        CanonicalField::UploadDate,
        CanonicalField::Format,
        CanonicalField::Id,
        CanonicalField::SourceUrl,
        CanonicalField::ExtractorName,
        CanonicalField::FileSize,
        CanonicalField::FrameRate,
        CanonicalField::Width,
        CanonicalField::Height,
    ];

    /// Name used in selections and JSON keys.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Title => "title",
            CanonicalField::Description => "description",
            CanonicalField::Uploader => "uploader",
            CanonicalField::UploaderId => "uploaderId",
            CanonicalField::UploaderUrl => "uploaderUrl",
            CanonicalField::Channel => "channel",
            CanonicalField::ChannelId => "channelId",
            CanonicalField::ChannelUrl => "channelUrl",
            CanonicalField::Duration => "duration",
            CanonicalField::Views => "views",
            CanonicalField::Likes => "likes",
            CanonicalField::Comments => "comments",
            CanonicalField::Tags => "tags",
            CanonicalField::Categories => "categories",
            CanonicalField::Thumbnails => "thumbnails",
            CanonicalField::UploadDate => "uploadDate",
            CanonicalField::Format => "format",
            CanonicalField::Id => "id",
            CanonicalField::SourceUrl => "sourceUrl",
            CanonicalField::ExtractorName => "extractorName",
            CanonicalField::FileSize => "fileSize",
            CanonicalField::FrameRate => "frameRate",
            CanonicalField::Width => "width",
            CanonicalField::Height => "height",
            CanonicalField::Note => "note",
        }
    }

    /// Human-readable label used by the text format.
    pub fn label(self) -> &'static str {
        match self {
            CanonicalField::Title => "Title",
            CanonicalField::Description => "Description",
            CanonicalField::Uploader => "Uploader",
            CanonicalField::UploaderId => "Uploader ID",
            CanonicalField::UploaderUrl => "Uploader URL",
            CanonicalField::Channel => "Channel",
            CanonicalField::ChannelId => "Channel ID",
            CanonicalField::ChannelUrl => "Channel URL",
            CanonicalField::Duration => "Duration",
            CanonicalField::Views => "Views",
            CanonicalField::Likes => "Likes",
            CanonicalField::Comments => "Comments",
            CanonicalField::Tags => "Tags",
            CanonicalField::Categories => "Categories",
            CanonicalField::Thumbnails => "Thumbnails",
            CanonicalField::UploadDate => "Upload Date",
            CanonicalField::Format => "Format",
            CanonicalField::Id => "ID",
            CanonicalField::SourceUrl => "Source URL",
            CanonicalField::ExtractorName => "Extractor",
            CanonicalField::FileSize => "File Size",
            CanonicalField::FrameRate => "Frame Rate",
            CanonicalField::Width => "Width",
            CanonicalField::Height => "Height",
            CanonicalField::Note => "Note",
        }
    }

    /// Looks up a selectable field by its canonical name.
    ///
    /// Returns `None` for unknown names, `selectAll` and `note`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }

    pub fn is_selectable(self) -> bool {
        self != CanonicalField::Note
    }

    /// Fields describing the media file rather than its publication.
    pub fn is_technical(self) -> bool {
        matches!(
            self,
            CanonicalField::Id
                | CanonicalField::SourceUrl
                | CanonicalField::ExtractorName
                | CanonicalField::FileSize
                | CanonicalField::FrameRate
                | CanonicalField::Width
                | CanonicalField::Height
        )
    }

    /// The present-empty value for this field.
    pub fn empty_value(self) -> FieldValue {
        match self {
            CanonicalField::Views | CanonicalField::Likes | CanonicalField::Comments => {
                FieldValue::Count(0)
            }
            CanonicalField::Tags | CanonicalField::Categories | CanonicalField::Thumbnails => {
                FieldValue::List(Vec::new())
            }
            _ => FieldValue::Text(String::new()),
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown metadata field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for field in CanonicalField::ALL {
            assert_eq!(CanonicalField::from_name(field.name()), Some(field));
        }
    }

    #[test]
    fn test_order_is_canonical() {
        let mut sorted = CanonicalField::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, CanonicalField::ALL.to_vec());
        assert!(CanonicalField::Height < CanonicalField::Note);
    }

    #[test]
    fn test_note_and_select_all_are_not_selectable() {
        assert_eq!(CanonicalField::from_name("note"), None);
        assert_eq!(CanonicalField::from_name(SELECT_ALL), None);
        assert!(!CanonicalField::Note.is_selectable());
    }

    #[test]
    fn test_labels() {
        assert_eq!(CanonicalField::UploaderUrl.label(), "Uploader URL");
        assert_eq!(CanonicalField::UploadDate.label(), "Upload Date");
        assert_eq!(CanonicalField::ExtractorName.label(), "Extractor");
        assert_eq!(CanonicalField::Id.label(), "ID");
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&CanonicalField::FrameRate).unwrap();
        assert_eq!(json, "\"frameRate\"");
        let parsed: CanonicalField = serde_json::from_str("\"uploaderId\"").unwrap();
        assert_eq!(parsed, CanonicalField::UploaderId);
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(CanonicalField::Views.empty_value(), FieldValue::Count(0));
        assert_eq!(CanonicalField::Tags.empty_value(), FieldValue::List(vec![]));
        assert_eq!(
            CanonicalField::Width.empty_value(),
            FieldValue::Text(String::new())
        );
    }
}
