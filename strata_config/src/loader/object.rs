//! In-memory loaders: plain maps and serialisable values.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use super::{Loader, Settings};
use crate::{StrataError, StrataResult, StrataResultExt};

/// Field-name prefix skipped by [`load_object_settings`] unless overridden.
pub const DEFAULT_IGNORE_PREFIX: &str = "_";

/// Copy `settings` into a fresh map.
///
/// The returned map shares nothing with the input, so later mutation of the
/// caller's map does not leak into a loaded configuration.
#[must_use]
pub fn load_dict_settings(settings: &Settings) -> Settings {
    settings.clone()
}

/// Materialise the public fields of a serialisable value as settings.
///
/// Serde serialisation stands in for attribute introspection: every
/// top-level field becomes a key, except those whose name starts with
/// `ignore_prefix`. An empty prefix keeps every field.
///
/// ```
/// use serde::Serialize;
/// use serde_json::json;
/// use strata_config::load_object_settings;
///
/// #[derive(Serialize)]
/// struct Defaults {
///     x: u8,
///     y: u8,
///     _internal: bool,
/// }
///
/// let settings = load_object_settings(&Defaults { x: 1, y: 2, _internal: true }, "_")
///     .expect("serialisable");
/// assert_eq!(settings.get("x"), Some(&json!(1)));
/// assert!(!settings.contains_key("_internal"));
/// ```
///
/// # Errors
///
/// Returns [`StrataError::Serialization`] when serialisation fails and
/// [`StrataError::Loader`] when the value does not serialise to an object.
pub fn load_object_settings<T>(value: &T, ignore_prefix: &str) -> StrataResult<Settings>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value).into_strata()? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .filter(|(name, _)| ignore_prefix.is_empty() || !name.starts_with(ignore_prefix))
            .collect()),
        other => Err(StrataError::loader(
            "object settings",
            format!("expected a struct or map, found {other}"),
        )),
    }
}

/// Descriptor wrapping an already materialised map.
///
/// Used for both defaults and explicit overrides; the map is copied on each
/// load.
#[derive(Clone, Debug)]
pub struct DictLoader {
    label: &'static str,
    settings: Settings,
}

impl DictLoader {
    /// Wrap `settings` under a generic label.
    #[must_use]
    pub const fn new(settings: Settings) -> Self {
        Self::labelled("dict", settings)
    }

    /// Wrap `settings` under `label`, reported in diagnostics.
    #[must_use]
    pub const fn labelled(label: &'static str, settings: Settings) -> Self {
        Self { label, settings }
    }

    /// Materialise `value` with [`load_object_settings`] and wrap the result.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`load_object_settings`].
    pub fn from_object<T>(value: &T, ignore_prefix: &str) -> StrataResult<Self>
    where
        T: Serialize + ?Sized,
    {
        load_object_settings(value, ignore_prefix).map(|settings| Self::labelled("object", settings))
    }
}

impl Loader for DictLoader {
    fn load(&self) -> StrataResult<Settings> {
        Ok(load_dict_settings(&self.settings))
    }

    fn describe(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.label)
    }
}
