//! Ordered, case-insensitive key-value store backing every configuration.
//!
//! Keys compare equal when they differ only in ASCII case. The casing used by
//! the first insertion of a key is the one reported by iteration and
//! serialisation; overwriting through a differently cased key replaces the
//! value in place without renaming the entry or moving it.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use uncased::{Uncased, UncasedStr};

use crate::{Settings, StrataError, StrataResult};

/// Insertion-ordered map with case-insensitive keys.
///
/// # Examples
///
/// ```
/// use strata_config::CaseInsensitiveMap;
/// use serde_json::json;
///
/// let mut map = CaseInsensitiveMap::new();
/// map.insert("Item", 1);
/// map.insert("ITEM", 2);
/// assert_eq!(map.get("item").ok(), Some(&json!(2)));
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Item"]);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CaseInsensitiveMap {
    entries: IndexMap<Uncased<'static>, Value>,
}

type OwnedEntry = (Uncased<'static>, Value);

fn into_owned_entry((key, value): OwnedEntry) -> (String, Value) {
    (key.as_str().to_owned(), value)
}

impl CaseInsensitiveMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct (case-folded) keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is present under any casing.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(UncasedStr::new(key))
    }

    /// Look up `key`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingKey`] when no casing of `key` is present.
    pub fn get(&self, key: &str) -> StrataResult<&Value> {
        self.find(key).ok_or_else(|| StrataError::missing_key(key))
    }

    /// Look up `key`, returning `None` when it is absent.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Value> {
        self.entries.get(UncasedStr::new(key))
    }

    /// Mutable lookup of `key`, ignoring case.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(UncasedStr::new(key))
    }

    /// The stored casing of `key`, if present.
    #[must_use]
    pub fn stored_key(&self, key: &str) -> Option<&str> {
        self.entries
            .get_key_value(UncasedStr::new(key))
            .map(|(stored, _)| stored.as_str())
    }

    /// Insert or overwrite `key`, returning the previous value.
    ///
    /// When a differently cased form of `key` already exists, its casing and
    /// position are kept and only the value is replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(Uncased::from(key.into()), value.into())
    }

    /// Remove `key`, returning its value when present.
    ///
    /// The relative order of the remaining entries is preserved.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(UncasedStr::new(key))
    }

    /// Remove `key` and return its value.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingKey`] when no casing of `key` is present.
    pub fn pop(&mut self, key: &str) -> StrataResult<Value> {
        self.remove(key).ok_or_else(|| StrataError::missing_key(key))
    }

    /// Apply [`insert`](Self::insert) to every entry in iteration order.
    ///
    /// This is a shallow merge: nested objects replace existing values
    /// wholesale.
    pub fn update<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Iterate over entries in insertion order using the stored casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterate over keys in insertion order using the stored casing.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|key| key.as_str())
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy the entries into a plain JSON object map.
    #[must_use]
    pub fn to_settings(&self) -> Settings {
        self.iter()
            .map(|(key, value)| (key.to_owned(), value.clone()))
            .collect()
    }
}

impl fmt::Debug for CaseInsensitiveMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl From<Settings> for CaseInsensitiveMap {
    fn from(settings: Settings) -> Self {
        settings.into_iter().collect()
    }
}

impl From<CaseInsensitiveMap> for Settings {
    fn from(map: CaseInsensitiveMap) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for CaseInsensitiveMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.update(iter);
        map
    }
}

impl<K: Into<String>> Extend<(K, Value)> for CaseInsensitiveMap {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

impl IntoIterator for CaseInsensitiveMap {
    type Item = (String, Value);
    type IntoIter =
        std::iter::Map<indexmap::map::IntoIter<Uncased<'static>, Value>, fn(OwnedEntry) -> (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(into_owned_entry as fn(OwnedEntry) -> (String, Value))
    }
}

impl Serialize for CaseInsensitiveMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CaseInsensitiveMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Settings::deserialize(deserializer).map(Self::from)
    }
}
