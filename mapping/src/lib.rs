use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

pub mod slug;

pub use slug::{is_valid_slug, slugify};

/// The canonical, platform-facing field vocabulary.
///
/// The order is normative: `map_to_storage` walks this list, so when two
/// canonical fields are declared against the same storage column, the field
/// that appears later here wins. That precedence is fixed and independent of
/// payload key order.
pub const CANONICAL_FIELDS: &[&str] = &[
    "title",
    "content",
    "excerpt",
    "slug",
    "meta_title",
    "meta_description",
    "focus_keyword",
    "canonical_url",
    "published_at",
    "custom_fields",
    "status",
    "banner_url",
];

/// Check whether a field name belongs to the canonical vocabulary
pub fn is_canonical_field(name: &str) -> bool {
    CANONICAL_FIELDS.contains(&name)
}

/// A set of field values keyed by name, either canonical or storage-side
pub type FieldMap = HashMap<String, JsonValue>;

/// Declared translation table between canonical field names and storage
/// column names.
///
/// An entry mapped to an empty string disables the field: it is dropped on
/// the way in and never surfaced on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: BTreeMap<String, String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::defaults()
    }
}

impl FieldMapping {
    /// The identity mapping: every canonical field stored under its own name.
    ///
    /// `banner_url` is excluded; profiles that store a plain URL declare it
    /// explicitly when resolving the mapping.
    pub fn defaults() -> Self {
        let entries = CANONICAL_FIELDS
            .iter()
            .filter(|f| **f != "banner_url")
            .map(|f| (f.to_string(), f.to_string()))
            .collect();
        Self { entries }
    }

    /// An empty mapping, useful as an override layer
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build a mapping from explicit canonical -> storage pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Layer another mapping's entries over this one, returning the result
    pub fn merged(&self, overrides: &FieldMapping) -> Self {
        let mut entries = self.entries.clone();
        for (canonical, storage) in &overrides.entries {
            entries.insert(canonical.clone(), storage.clone());
        }
        Self { entries }
    }

    /// Add or replace a single entry
    pub fn set(&mut self, canonical: impl Into<String>, storage: impl Into<String>) {
        self.entries.insert(canonical.into(), storage.into());
    }

    /// Resolve the storage column for a canonical field, if mapped and enabled
    pub fn storage_field(&self, canonical: &str) -> Option<&str> {
        match self.entries.get(canonical) {
            Some(storage) if !storage.is_empty() => Some(storage.as_str()),
            _ => None,
        }
    }

    /// Whether a canonical field is declared in this mapping
    pub fn contains(&self, canonical: &str) -> bool {
        self.storage_field(canonical).is_some()
    }

    /// Iterate every declared entry, including disabled ones, in no
    /// particular precedence order
    pub fn iter_all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate enabled entries in canonical vocabulary order
    pub fn iter_canonical(&self) -> impl Iterator<Item = (&str, &str)> {
        CANONICAL_FIELDS
            .iter()
            .filter_map(move |canonical| self.storage_field(canonical).map(|s| (*canonical, s)))
    }

    /// Every distinct storage column this mapping writes to
    pub fn storage_columns(&self) -> Vec<&str> {
        let mut columns = Vec::new();
        for (_, storage) in self.iter_canonical() {
            if !columns.contains(&storage) {
                columns.push(storage);
            }
        }
        columns
    }

    /// Translate canonical data into storage-column data.
    ///
    /// Unmapped canonical keys are dropped silently. Fields are applied in
    /// canonical order, so a later canonical field overwrites an earlier one
    /// that targets the same storage column.
    pub fn map_to_storage(&self, canonical_data: &FieldMap) -> FieldMap {
        let mut storage_data = FieldMap::new();
        for (canonical, storage) in self.iter_canonical() {
            if let Some(value) = canonical_data.get(canonical) {
                storage_data.insert(storage.to_string(), value.clone());
            }
        }
        storage_data
    }

    /// Translate a storage record back into canonical data.
    ///
    /// Storage columns with no canonical counterpart stay invisible; missing
    /// optional fields are not an error.
    pub fn map_to_canonical(&self, storage_record: &FieldMap) -> FieldMap {
        let mut canonical_data = FieldMap::new();
        for (canonical, storage) in self.iter_canonical() {
            if let Some(value) = storage_record.get(storage) {
                canonical_data.insert(canonical.to_string(), value.clone());
            }
        }
        canonical_data
    }
}
