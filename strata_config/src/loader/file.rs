//! JSON and INI file loaders.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ini::{Ini, ParseOption, Properties};
use serde_json::Value;

use super::{Loader, Settings};
use crate::{StrataError, StrataResult};

/// Read `path` into memory.
///
/// The file handle lives only for the duration of this call, so it is
/// released before parsing starts, on success and failure alike.
fn read_source(path: &Utf8Path) -> StrataResult<String> {
    std::fs::read_to_string(path).map_err(|e| StrataError::file(path, e))
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Load a JSON file whose top-level value is an object.
///
/// # Errors
///
/// Returns [`StrataError::File`] when the file cannot be read and
/// [`StrataError::Format`] when it is not valid JSON or the top-level value
/// is not an object.
pub fn load_json_file_settings(path: impl AsRef<Utf8Path>) -> StrataResult<Settings> {
    let source = path.as_ref();
    let data = read_source(source)?;
    match serde_json::from_str::<Value>(&data).map_err(|e| StrataError::format(source, e))? {
        Value::Object(settings) => Ok(settings),
        other => Err(StrataError::format(
            source,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "expected a JSON object at the top level, found {}",
                    value_kind(&other)
                ),
            ),
        )),
    }
}

const DEFAULT_SECTION: &str = "DEFAULT";

/// Values are kept verbatim: no quote stripping and no backslash escapes.
/// Indented lines continue the previous value, joined with a newline.
const INI_PARSE: ParseOption = ParseOption {
    enabled_quote: false,
    enabled_escape: false,
    enabled_indented_mutiline_value: true,
    enabled_preserve_key_leading_whitespace: false,
};

fn orphan_option(source: &Utf8Path, option: &str) -> Arc<StrataError> {
    StrataError::format(
        source,
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("option '{option}' appears before any section header"),
        ),
    )
}

fn insert_options(target: &mut Settings, properties: &Properties) {
    for (option, value) in properties {
        target.insert(option.to_lowercase(), Value::String(value.to_owned()));
    }
}

/// Load an INI file as one object per section.
///
/// Values are always the raw strings from the file. Option names are
/// lower-cased while section names keep their spelling. Repeated sections
/// are merged, later options winning. Options in `[DEFAULT]` are copied into
/// every other section unless that section sets them itself; `DEFAULT` is
/// not reported as a section.
///
/// # Errors
///
/// Returns [`StrataError::File`] when the file cannot be read and
/// [`StrataError::Format`] when it cannot be parsed or declares options
/// before the first section header.
pub fn load_ini_file_settings(path: impl AsRef<Utf8Path>) -> StrataResult<Settings> {
    let source = path.as_ref();
    let data = read_source(source)?;
    let document =
        Ini::load_from_str_opt(&data, INI_PARSE).map_err(|e| StrataError::format(source, e))?;

    let mut defaults = Settings::new();
    let mut sections: Vec<(&str, Settings)> = Vec::new();
    for (section, properties) in &document {
        let Some(name) = section else {
            if let Some((option, _)) = properties.iter().next() {
                return Err(orphan_option(source, option));
            }
            continue;
        };
        if name == DEFAULT_SECTION {
            insert_options(&mut defaults, properties);
            continue;
        }
        if let Some((_, options)) = sections.iter_mut().find(|(known, _)| *known == name) {
            insert_options(options, properties);
        } else {
            let mut options = Settings::new();
            insert_options(&mut options, properties);
            sections.push((name, options));
        }
    }

    Ok(sections
        .into_iter()
        .map(|(name, mut options)| {
            for (option, value) in &defaults {
                options
                    .entry(option.clone())
                    .or_insert_with(|| value.clone());
            }
            (name.to_owned(), Value::Object(options))
        })
        .collect())
}

/// Descriptor for [`load_json_file_settings`].
#[derive(Clone, Debug)]
pub struct JsonFileLoader {
    path: Utf8PathBuf,
}

impl JsonFileLoader {
    /// Create a loader reading `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Loader for JsonFileLoader {
    fn load(&self) -> StrataResult<Settings> {
        load_json_file_settings(&self.path)
    }

    fn describe(&self) -> Cow<'_, str> {
        Cow::Owned(format!("json file {}", self.path))
    }
}

/// Descriptor for [`load_ini_file_settings`].
#[derive(Clone, Debug)]
pub struct IniFileLoader {
    path: Utf8PathBuf,
}

impl IniFileLoader {
    /// Create a loader reading `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Loader for IniFileLoader {
    fn load(&self) -> StrataResult<Settings> {
        load_ini_file_settings(&self.path)
    }

    fn describe(&self) -> Cow<'_, str> {
        Cow::Owned(format!("ini file {}", self.path))
    }
}
