//! Environment variable loader.
//!
//! Scans the process environment through [`figment::providers::Env`],
//! keeping variables named `PREFIX_<KEY>` (prefix matched without regard to
//! case) and stripping the prefix. The remaining key keeps its spelling.

use std::borrow::Cow;

use figment::providers::Env;
use serde_json::Value;

use super::{Loader, Settings};
use crate::StrataResult;

/// Decode a raw environment value.
///
/// Values that parse as JSON (`2`, `true`, `[1, 2]`, `{"a": 1}`, `"quoted"`)
/// become the corresponding JSON value; anything else is kept as a string.
///
/// ```
/// use serde_json::json;
/// use strata_config::loader::decode_value;
///
/// assert_eq!(decode_value("2"), json!(2));
/// assert_eq!(decode_value("plain text"), json!("plain text"));
/// ```
#[must_use]
pub fn decode_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn scanner(prefix: &str) -> Env {
    Env::prefixed(&format!("{prefix}_")).lowercase(false)
}

/// Collect every environment variable starting with `prefix` and `_`.
///
/// # Errors
///
/// Scanning itself cannot fail; the `Result` keeps the loader signature
/// uniform with the other sources.
pub fn load_env_settings(prefix: &str) -> StrataResult<Settings> {
    let mut settings = Settings::new();
    for (key, raw) in scanner(prefix).iter() {
        let name = key.as_str();
        if name.is_empty() {
            continue;
        }
        settings.insert(name.to_owned(), decode_value(&raw));
    }
    Ok(settings)
}

/// Descriptor for [`load_env_settings`].
#[derive(Clone, Debug)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a loader for variables named `PREFIX_<KEY>`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Loader for EnvLoader {
    fn load(&self) -> StrataResult<Settings> {
        load_env_settings(&self.prefix)
    }

    fn describe(&self) -> Cow<'_, str> {
        Cow::Owned(format!("environment prefix {}_", self.prefix))
    }
}
