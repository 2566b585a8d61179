//! Destination path cleanup.
//!
//! Paths arrive from the UI or from a save dialog and may mix separator
//! styles, carry characters Windows refuses in file names, or contain the
//! duplicated stem left behind when a media file name was used as the base
//! of an export name (`video.mp4video.json`).

use crate::error::{ExportError, Result};
use core_metadata::ExportFormat;
use serde::Serialize;
use std::path::PathBuf;

const WINDOWS_SEPARATOR: char = '\\';
const POSIX_SEPARATOR: char = '/';
const RESERVED_CHARS: &[char] = &['<', '>', '"', '|', '?', '*'];
const REPLACEMENT: char = '_';

/// A cleaned-up export destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Full destination path
    pub path: String,
    /// Everything up to and including the last separator; empty for a bare file name
    pub directory: String,
    pub file_name: String,
    pub separator: char,
}

impl Destination {
    pub fn as_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    /// Directory as a path, `None` when the destination is a bare file name.
    pub fn directory_path(&self) -> Option<PathBuf> {
        (!self.directory.is_empty()).then(|| PathBuf::from(&self.directory))
    }
}

/// Cleans up `raw` for writing an export in `format`.
pub fn normalize_destination(raw: &str, format: ExportFormat) -> Result<Destination> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExportError::InvalidDestinationPath(
            "Destination path is empty".to_string(),
        ));
    }

    let has_drive = has_drive_prefix(trimmed);
    let separator = dominant_separator(trimmed, has_drive);

    let cleaned: String = trimmed
        .char_indices()
        .map(|(index, ch)| match ch {
            ':' if index == 1 && has_drive => ch,
            ':' => REPLACEMENT,
            WINDOWS_SEPARATOR | POSIX_SEPARATOR => separator,
            ch if RESERVED_CHARS.contains(&ch) => REPLACEMENT,
            ch => ch,
        })
        .collect();

    let (directory, file_name) = match cleaned.rfind(separator) {
        Some(index) => cleaned.split_at(index + separator.len_utf8()),
        None => ("", cleaned.as_str()),
    };

    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(ExportError::InvalidDestinationPath(format!(
            "No file name in destination: {}",
            raw
        )));
    }

    let file_name = collapse_duplicated_stem(file_name, format.extension());

    Ok(Destination {
        path: format!("{}{}", directory, file_name),
        directory: directory.to_string(),
        file_name,
        separator,
    })
}

/// Collapses `<name>.<ext><name>.<target>` into `<name>.<target>`.
///
/// The middle extension must be non-empty and dot-free. Longer stems are
/// tried first. Names that don't match are returned unchanged.
pub fn collapse_duplicated_stem(file_name: &str, target_extension: &str) -> String {
    let suffix = format!(".{}", target_extension);
    let Some(body) = file_name.strip_suffix(suffix.as_str()) else {
        return file_name.to_string();
    };

    for len in (1..=body.len()).rev() {
        if !body.is_char_boundary(len) {
            continue;
        }

        let (stem, rest) = body.split_at(len);
        let Some(rest) = rest.strip_prefix('.') else {
            continue;
        };
        let Some(middle) = rest.strip_suffix(stem) else {
            continue;
        };

        if !middle.is_empty() && !middle.contains('.') {
            return format!("{}{}", stem, suffix);
        }
    }

    file_name.to_string()
}

fn has_drive_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

fn dominant_separator(path: &str, has_drive: bool) -> char {
    if has_drive {
        return WINDOWS_SEPARATOR;
    }

    let backslashes = path.matches(WINDOWS_SEPARATOR).count();
    let slashes = path.matches(POSIX_SEPARATOR).count();
    if backslashes > slashes {
        WINDOWS_SEPARATOR
    } else {
        POSIX_SEPARATOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_path_is_unchanged() {
        let dest = normalize_destination("/home/ana/Downloads/clip.json", ExportFormat::Json)
            .unwrap();
        assert_eq!(dest.path, "/home/ana/Downloads/clip.json");
        assert_eq!(dest.directory, "/home/ana/Downloads/");
        assert_eq!(dest.file_name, "clip.json");
        assert_eq!(dest.separator, '/');
    }

    #[test]
    fn test_drive_colon_is_kept() {
        let dest = normalize_destination(r"C:\out\clip.txt", ExportFormat::Txt).unwrap();
        assert_eq!(dest.path, r"C:\out\clip.txt");
        assert_eq!(dest.directory, r"C:\out\");
    }

    #[test]
    fn test_other_colons_are_replaced() {
        let dest =
            normalize_destination("/tmp/Part 1: The Start.json", ExportFormat::Json).unwrap();
        assert_eq!(dest.file_name, "Part 1_ The Start.json");

        let dest = normalize_destination(r"C:\a:b\c.json", ExportFormat::Json).unwrap();
        assert_eq!(dest.path, r"C:\a_b\c.json");
    }

    #[test]
    fn test_reserved_characters_are_replaced() {
        let dest =
            normalize_destination("/tmp/what? <really> \"now\" | *.json", ExportFormat::Json)
                .unwrap();
        assert_eq!(dest.file_name, "what_ _really_ _now_ _ _.json");
    }

    #[test]
    fn test_mixed_separators_follow_dominant_style() {
        let dest = normalize_destination(r"C:/Users\ana/clip.json", ExportFormat::Json).unwrap();
        assert_eq!(dest.path, r"C:\Users\ana\clip.json");

        let dest = normalize_destination(r"/srv/exports\clip.json", ExportFormat::Json).unwrap();
        assert_eq!(dest.path, "/srv/exports/clip.json");
    }

    #[test]
    fn test_duplicated_stem_collapses() {
        let dest =
            normalize_destination(r"C:\out\video.mp4video.json", ExportFormat::Json).unwrap();
        assert_eq!(dest.path, r"C:\out\video.json");

        let dest =
            normalize_destination("/tmp/my.clip.webmmy.clip.txt", ExportFormat::Txt).unwrap();
        assert_eq!(dest.file_name, "my.clip.txt");
    }

    #[test]
    fn test_collapse_requires_target_extension() {
        assert_eq!(
            collapse_duplicated_stem("video.mp4video.json", "txt"),
            "video.mp4video.json"
        );
        assert_eq!(collapse_duplicated_stem("video.json", "json"), "video.json");
        assert_eq!(collapse_duplicated_stem("a.b.cb.json", "json"), "a.b.cb.json");
    }

    #[test]
    fn test_collapse_handles_multibyte_names() {
        assert_eq!(
            collapse_duplicated_stem("ビデオ.mp4ビデオ.json", "json"),
            "ビデオ.json"
        );
    }

    #[test]
    fn test_bare_file_name() {
        let dest = normalize_destination("  clip.json ", ExportFormat::Json).unwrap();
        assert_eq!(dest.path, "clip.json");
        assert!(dest.directory_path().is_none());
    }

    #[test]
    fn test_invalid_destinations() {
        for raw in ["", "   ", "/tmp/", r"C:\out\", "/tmp/..", "."] {
            assert!(
                matches!(
                    normalize_destination(raw, ExportFormat::Json),
                    Err(ExportError::InvalidDestinationPath(_))
                ),
                "{:?}",
                raw
            );
        }
    }
}
