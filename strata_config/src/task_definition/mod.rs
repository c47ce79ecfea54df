//! Container task definition environments as a configuration source.
//!
//! A task definition is a JSON array of containers, each carrying an
//! `environment` array of `{"name": .., "value": ..}` entries. Loading reads
//! one container's environment the way [`crate::loader::EnvLoader`] reads the
//! process environment; dumping writes configuration back so the deployed
//! environment matches a local store.

use std::borrow::{Borrow, Cow};
use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::loader::decode_value;
use crate::{Loader, Settings, StrataError, StrataResult, StrataResultExt};

/// One environment variable of a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    /// Variable name.
    pub name: String,
    /// Variable value; a string unless written without JSON encoding.
    pub value: Value,
}

/// Where and how to read or write a task definition environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskDefinitionOptions {
    /// Only names starting with `PREFIX_` are read, with the prefix removed.
    /// Written names gain the same prefix.
    pub prefix: Option<String>,
    /// Index of the container in the task definition array.
    pub container: usize,
    /// Decode string values as JSON when reading.
    pub load_as_json: bool,
    /// Encode non-string values as JSON text when writing.
    pub dump_as_json: bool,
}

impl Default for TaskDefinitionOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            container: 0,
            load_as_json: true,
            dump_as_json: true,
        }
    }
}

/// Remove `PREFIX_` from `key`.
///
/// Without a prefix (or with an empty one) the key is returned unchanged.
/// Returns `None` when the key does not carry the prefix. Matching is case
/// sensitive.
///
/// ```
/// use strata_config::task_definition::strip_prefix;
///
/// assert_eq!(strip_prefix("PREFIX_BLAH", Some("PREFIX")), Some("BLAH"));
/// assert_eq!(strip_prefix("blah", Some("PREFIX")), None);
/// assert_eq!(strip_prefix("blah", None), Some("blah"));
/// ```
#[must_use]
pub fn strip_prefix<'a>(key: &'a str, prefix: Option<&str>) -> Option<&'a str> {
    match prefix.filter(|p| !p.is_empty()) {
        Some(p) => key.strip_prefix(p)?.strip_prefix('_'),
        None => Some(key),
    }
}

fn container_environment<'a>(
    document: &'a Value,
    container: usize,
) -> StrataResult<&'a [Value]> {
    let containers = document
        .as_array()
        .ok_or_else(|| StrataError::task_definition("expected an array of containers"))?;
    let entry = containers.get(container).ok_or_else(|| {
        StrataError::task_definition(format!(
            "container index {container} is out of range for {} containers",
            containers.len()
        ))
    })?;
    entry
        .get("environment")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            StrataError::task_definition(format!(
                "container {container} has no environment array"
            ))
        })
}

fn parse_entry(raw: &Value) -> StrataResult<EnvironmentEntry> {
    EnvironmentEntry::deserialize(raw).map_err(|e| {
        StrataError::task_definition(format!("malformed environment entry {raw}: {e}"))
    })
}

/// Read one container's environment as settings.
///
/// Entries whose names lack the prefix are skipped, as are entries whose
/// name is empty once the prefix is removed. With `load_as_json` string
/// values are decoded like environment variables (`"1"` becomes `1`).
///
/// # Errors
///
/// Returns [`StrataError::TaskDefinition`] when the document is not an array
/// of containers, the container index is out of range, or an entry is not a
/// `{name, value}` object.
pub fn load_task_definition_settings(
    document: &Value,
    options: &TaskDefinitionOptions,
) -> StrataResult<Settings> {
    let mut settings = Settings::new();
    for raw in container_environment(document, options.container)? {
        let entry = parse_entry(raw)?;
        let Some(key) = strip_prefix(&entry.name, options.prefix.as_deref()) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let value = match (&entry.value, options.load_as_json) {
            (Value::String(text), true) => decode_value(text),
            (other, _) => other.clone(),
        };
        settings.insert(key.to_owned(), value);
    }
    Ok(settings)
}

/// Convert settings into environment entries.
///
/// With `dump_as_json` non-string values are written as JSON text; strings
/// are written as is. A prefix is joined to each name with `_`.
///
/// # Errors
///
/// Returns [`StrataError::Serialization`] when a value cannot be encoded.
pub fn to_task_definition_environment<I, K, V>(
    settings: I,
    prefix: Option<&str>,
    dump_as_json: bool,
) -> StrataResult<Vec<EnvironmentEntry>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<Value>,
{
    settings
        .into_iter()
        .map(|(key, value)| {
            let name = match prefix {
                Some(p) => format!("{p}_{}", key.as_ref()),
                None => key.as_ref().to_owned(),
            };
            let rendered = match value.borrow() {
                Value::String(text) => Value::String(text.clone()),
                other if dump_as_json => {
                    Value::String(serde_json::to_string(other).into_strata()?)
                }
                other => other.clone(),
            };
            Ok(EnvironmentEntry {
                name,
                value: rendered,
            })
        })
        .collect()
}

/// Newest entry per name (ignoring case), sorted by name.
fn merge_entries(entries: Vec<EnvironmentEntry>) -> Vec<EnvironmentEntry> {
    let mut seen = HashSet::new();
    let mut merged: Vec<EnvironmentEntry> = entries
        .into_iter()
        .rev()
        .filter(|entry| seen.insert(entry.name.to_uppercase()))
        .collect();
    merged.sort_by(|a, b| a.name.cmp(&b.name));
    merged
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), sort_keys(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn to_pretty_json(value: &Value) -> StrataResult<String> {
    let mut out = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    sort_keys(value).serialize(&mut serializer).into_strata()?;
    String::from_utf8(out).map_err(|e| StrataError::task_definition(e.to_string()))
}

/// Write `settings` into one container's environment and render the whole
/// document.
///
/// New entries are appended after the existing ones, then names are
/// de-duplicated ignoring case (the newest entry wins) and sorted. The
/// document is updated in place and returned as JSON indented by four
/// spaces with object keys sorted.
///
/// # Errors
///
/// Returns [`StrataError::TaskDefinition`] for a malformed document and
/// [`StrataError::Serialization`] when a value cannot be encoded.
pub fn dump_task_definition_settings<I, K, V>(
    settings: I,
    document: &mut Value,
    options: &TaskDefinitionOptions,
) -> StrataResult<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<Value>,
{
    let additions =
        to_task_definition_environment(settings, options.prefix.as_deref(), options.dump_as_json)?;
    let mut entries = container_environment(document, options.container)?
        .iter()
        .map(parse_entry)
        .collect::<StrataResult<Vec<_>>>()?;
    entries.extend(additions);
    let merged = serde_json::to_value(merge_entries(entries)).into_strata()?;

    let slot = document
        .get_mut(options.container)
        .and_then(|container| container.get_mut("environment"))
        .ok_or_else(|| StrataError::task_definition("container environment disappeared"))?;
    *slot = merged;
    to_pretty_json(document)
}

/// Loader reading a container environment from a task definition.
#[derive(Clone, Debug)]
pub struct TaskDefinitionLoader {
    document: Value,
    options: TaskDefinitionOptions,
    origin: Option<Utf8PathBuf>,
}

impl TaskDefinitionLoader {
    /// Wrap an already parsed task definition.
    #[must_use]
    pub const fn new(document: Value, options: TaskDefinitionOptions) -> Self {
        Self {
            document,
            options,
            origin: None,
        }
    }

    /// Parse the task definition stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::File`] when the file cannot be read and
    /// [`StrataError::Format`] when it is not valid JSON.
    pub fn from_file(
        path: impl AsRef<Utf8Path>,
        options: TaskDefinitionOptions,
    ) -> StrataResult<Self> {
        let source = path.as_ref();
        let text = std::fs::read_to_string(source).map_err(|e| StrataError::file(source, e))?;
        let document = serde_json::from_str(&text).map_err(|e| StrataError::format(source, e))?;
        Ok(Self {
            document,
            options,
            origin: Some(source.to_path_buf()),
        })
    }
}

impl Loader for TaskDefinitionLoader {
    fn load(&self) -> StrataResult<Settings> {
        load_task_definition_settings(&self.document, &self.options)
    }

    fn describe(&self) -> Cow<'_, str> {
        let container = self.options.container;
        match &self.origin {
            Some(path) => Cow::Owned(format!("task definition {path} container {container}")),
            None => Cow::Owned(format!("task definition container {container}")),
        }
    }
}
