//! Projection of a record onto the user's field selection.

use crate::fields::{CanonicalField, SELECT_ALL};
use crate::record::CanonicalRecord;
use tracing::debug;

/// Title used by the fallback record when nothing better is known.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Note attached to the fallback record.
pub const FALLBACK_NOTE: &str = "No additional metadata available for selected fields";

/// Narrows records to a selected field set.
#[derive(Debug, Clone, Default)]
pub struct FieldSelector {
    display_name: Option<String>,
}

impl FieldSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used for the fallback title when the record has none.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Returns a record containing exactly the recognized selected fields.
    ///
    /// `selectAll` and unknown names are skipped. A recognized field missing
    /// from `record` is added present-empty. If nothing is selected, the
    /// result is a fallback record holding only a title and a note.
    pub fn project<S: AsRef<str>>(&self, record: &CanonicalRecord, selected: &[S]) -> CanonicalRecord {
        let mut projected = CanonicalRecord::new();

        for name in selected.iter().map(AsRef::as_ref) {
            if name == SELECT_ALL {
                continue;
            }

            let Some(field) = CanonicalField::from_name(name) else {
                debug!(field = name, "Skipping unrecognized field");
                continue;
            };

            let value = record
                .get(field)
                .cloned()
                .unwrap_or_else(|| field.empty_value());
            projected.insert(field, value);
        }

        if projected.is_empty() {
            debug!("No recognized fields selected, using fallback record");
            return self.fallback(record);
        }

        projected
    }

    fn fallback(&self, record: &CanonicalRecord) -> CanonicalRecord {
        let title = record
            .title()
            .or(self.display_name.as_deref())
            .unwrap_or(UNKNOWN_TITLE);

        CanonicalRecord::new()
            .with(CanonicalField::Title, title)
            .with(CanonicalField::Note, FALLBACK_NOTE)
    }
}
