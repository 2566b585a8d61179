//! Per-platform field catalog.
//!
//! Maps a normalized platform key to the ordered list of fields that make
//! sense for that platform. The catalog is immutable and built on first use.

use crate::fields::CanonicalField;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Catalog key used when a platform has no entry of its own.
pub const DEFAULT_PLATFORM_KEY: &str = "default";

/// Lowercase substrings and the platform key they resolve to, in match order.
const PLATFORM_PATTERNS: &[(&str, &str)] = &[
    ("youtube", "YouTube"),
    ("facebook", "Facebook"),
    ("instagram", "Instagram"),
    ("twitter", "Twitter"),
    ("twitch", "Twitch"),
    ("dailymotion", "Dailymotion"),
    ("cnn", "CNN"),
];

/// Fields every platform starts from.
const FULL: &[CanonicalField] = &[
    CanonicalField::Title,
    CanonicalField::Description,
    CanonicalField::Uploader,
    CanonicalField::UploaderId,
    CanonicalField::UploaderUrl,
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
];

static CATALOG: Lazy<FieldCatalog> = Lazy::new(FieldCatalog::build);

/// Immutable platform key → field list mapping.
#[derive(Debug)]
pub struct FieldCatalog {
    entries: HashMap<&'static str, Vec<CanonicalField>>,
}

impl FieldCatalog {
    /// The process-wide catalog.
    pub fn global() -> &'static FieldCatalog {
        &CATALOG
    }

    fn build() -> Self {
        use CanonicalField::{Comments, Likes, Views};

        let without = |excluded: &[CanonicalField]| -> Vec<CanonicalField> {
            FULL.iter()
                .copied()
                .filter(|field| !excluded.contains(field))
                .collect()
        };

        let mut entries = HashMap::new();
        entries.insert("YouTube", FULL.to_vec());
        entries.insert("Facebook", FULL.to_vec());
        entries.insert("Dailymotion", without(&[Comments]));
        entries.insert("Twitch", without(&[Likes, Comments]));
        entries.insert("Instagram", without(&[Views]));
        entries.insert("Twitter", without(&[Views]));
        entries.insert("CNN", without(&[Views, Likes, Comments]));
        entries.insert(DEFAULT_PLATFORM_KEY, without(&[Views, Likes, Comments]));

        Self { entries }
    }

    /// Fields for an exact key, else the default entry.
    pub fn fields_for(&self, normalized_key: &str) -> &[CanonicalField] {
        self.entries
            .get(normalized_key)
            .or_else(|| self.entries.get(DEFAULT_PLATFORM_KEY))
            .map(Vec::as_slice)
            .unwrap_or(FULL)
    }

    /// Resolves `raw_identifier` and looks up its fields.
    pub fn available_fields(&self, raw_identifier: &str) -> &[CanonicalField] {
        self.fields_for(&resolve_platform_key(raw_identifier))
    }

    /// Keys with their own entry, sorted.
    pub fn platform_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

/// Normalizes an extractor identifier such as `youtube:tab` to a catalog key.
///
/// Anything after the first colon is dropped, then the remainder is matched
/// case-insensitively against known platform names. Unknown identifiers are
/// returned trimmed; they miss the catalog and fall back to the default.
pub fn resolve_platform_key(raw_identifier: &str) -> String {
    let base = raw_identifier.split(':').next().unwrap_or_default().trim();
    let lowered = base.to_lowercase();

    PLATFORM_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, key)| (*key).to_string())
        .unwrap_or_else(|| base.to_string())
}

/// Shorthand for [`FieldCatalog::fields_for`] on the global catalog.
pub fn fields_for(normalized_key: &str) -> &'static [CanonicalField] {
    FieldCatalog::global().fields_for(normalized_key)
}

/// Shorthand for [`FieldCatalog::available_fields`] on the global catalog.
pub fn available_fields(raw_identifier: &str) -> &'static [CanonicalField] {
    FieldCatalog::global().available_fields(raw_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_platforms() {
        assert_eq!(resolve_platform_key("youtube"), "YouTube");
        assert_eq!(resolve_platform_key("YoutubeTab"), "YouTube");
        assert_eq!(resolve_platform_key("youtube:tab"), "YouTube");
        assert_eq!(resolve_platform_key("facebook:reel"), "Facebook");
        assert_eq!(resolve_platform_key("TwitchVod"), "Twitch");
        assert_eq!(resolve_platform_key("CNNArticle"), "CNN");
    }

    #[test]
    fn test_colon_suffix_is_ignored_for_matching() {
        // "cnn" only appears after the colon
        assert_eq!(resolve_platform_key("generic:cnn"), "generic");
    }

    #[test]
    fn test_unknown_identifier_is_trimmed() {
        assert_eq!(resolve_platform_key("  Vimeo "), "Vimeo");
        assert_eq!(resolve_platform_key(""), "");
    }

    #[test]
    fn test_fields_for_unknown_key_uses_default() {
        let catalog = FieldCatalog::global();
        assert_eq!(catalog.fields_for("Vimeo"), catalog.fields_for("default"));
        assert_eq!(catalog.fields_for(""), catalog.fields_for("default"));
    }

    #[test]
    fn test_platform_specific_entries() {
        let youtube = fields_for("YouTube");
        assert_eq!(youtube.len(), FULL.len());

        let twitch = fields_for("Twitch");
        assert!(twitch.contains(&CanonicalField::Views));
        assert!(!twitch.contains(&CanonicalField::Likes));
        assert!(!twitch.contains(&CanonicalField::Comments));

        let instagram = fields_for("Instagram");
        assert!(!instagram.contains(&CanonicalField::Views));
        assert!(instagram.contains(&CanonicalField::Likes));

        let dailymotion = fields_for("Dailymotion");
        assert!(!dailymotion.contains(&CanonicalField::Comments));
    }

    #[test]
    fn test_entries_keep_canonical_order() {
        for key in FieldCatalog::global().platform_keys() {
            let fields = fields_for(key);
            assert!(fields.windows(2).all(|pair| pair[0] < pair[1]), "{}", key);
        }
    }

    #[test]
    fn test_available_fields_composes_resolution() {
        assert_eq!(available_fields("twitter:broadcast"), fields_for("Twitter"));
        assert_eq!(available_fields("Unknown"), fields_for("default"));
    }
}
