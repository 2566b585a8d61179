//! The canonical metadata record and its three-state field presence.

use crate::fields::CanonicalField;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Value held by a present field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Non-negative count (views, likes, sizes). Zero is a real value.
    Count(u64),
    /// JSON number kept as supplied (frame rate).
    Number(Number),
    List(Vec<Value>),
    Structured(Value),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// True for empty text, an empty list and a structured null.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Structured(value) => value.is_null(),
            FieldValue::Count(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            FieldValue::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Count(count) => Value::from(*count),
            FieldValue::Number(number) => Value::Number(number.clone()),
            FieldValue::List(items) => Value::Array(items.clone()),
            FieldValue::Structured(value) => value.clone(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Count(count) => serializer.serialize_u64(*count),
            FieldValue::Number(number) => number.serialize(serializer),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Structured(value) => value.serialize(serializer),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Count(value)
    }
}

impl From<Vec<Value>> for FieldValue {
    fn from(value: Vec<Value>) -> Self {
        FieldValue::List(value)
    }
}

/// How a field appears in a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence<'a> {
    /// Never populated; omitted from output.
    Absent,
    /// Populated but empty; rendered as a "not available" marker.
    Empty,
    Value(&'a FieldValue),
}

/// Mapping from canonical fields to values.
///
/// Fields iterate in canonical order. The untransformed source document is
/// kept alongside but never serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecord {
    fields: BTreeMap<CanonicalField, FieldValue>,
    raw: Option<Value>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// The source document this record was normalized from.
    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    pub fn insert(&mut self, field: CanonicalField, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn with(mut self, field: CanonicalField, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn remove(&mut self, field: CanonicalField) -> Option<FieldValue> {
        self.fields.remove(&field)
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn presence(&self, field: CanonicalField) -> Presence<'_> {
        match self.fields.get(&field) {
            None => Presence::Absent,
            Some(value) if value.is_empty() => Presence::Empty,
            Some(value) => Presence::Value(value),
        }
    }

    /// Non-empty title text, if any.
    pub fn title(&self) -> Option<&str> {
        self.get(CanonicalField::Title)
            .and_then(FieldValue::as_text)
            .filter(|title| !title.trim().is_empty())
    }

    /// Present fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.fields.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence_states() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Title, "Clip")
            .with(CanonicalField::Description, "")
            .with(CanonicalField::Views, 0u64);

        assert_eq!(
            record.presence(CanonicalField::Title),
            Presence::Value(&FieldValue::text("Clip"))
        );
        assert_eq!(record.presence(CanonicalField::Description), Presence::Empty);
        assert_eq!(record.presence(CanonicalField::Uploader), Presence::Absent);
        // zero is a value, not "unknown"
        assert!(matches!(
            record.presence(CanonicalField::Views),
            Presence::Value(FieldValue::Count(0))
        ));
    }

    #[test]
    fn test_structured_null_is_empty() {
        assert!(FieldValue::Structured(Value::Null).is_empty());
        assert!(!FieldValue::Structured(json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_iteration_follows_canonical_order() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Tags, vec![json!("a")])
            .with(CanonicalField::Title, "T")
            .with(CanonicalField::Views, 5u64);

        let order: Vec<_> = record.fields().collect();
        assert_eq!(
            order,
            vec![
                CanonicalField::Title,
                CanonicalField::Views,
                CanonicalField::Tags
            ]
        );
    }

    #[test]
    fn test_serialize_omits_raw() {
        let record = CanonicalRecord::new()
            .with(CanonicalField::Title, "T")
            .with_raw(json!({"title": "T", "secret": true}));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"title": "T"}));
        assert!(record.raw().is_some());
    }

    #[test]
    fn test_title_ignores_blank_text() {
        let record = CanonicalRecord::new().with(CanonicalField::Title, "  ");
        assert_eq!(record.title(), None);
    }
}
