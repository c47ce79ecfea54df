//! Convenience builder loading the conventional stack of sources.

use camino::Utf8PathBuf;
use serde::Serialize;

use super::StrataConfig;
use crate::loader::{DictLoader, EnvLoader, IniFileLoader, JsonFileLoader, Loader};
use crate::{Settings, StrataResult, load_object_settings};

/// Sources for [`simple_config`], applied in a fixed precedence order:
///
/// 1. defaults
/// 2. JSON file
/// 3. INI file
/// 4. environment variables starting with the prefix
/// 5. explicit overrides
///
/// Unset sources are skipped. An empty environment prefix counts as unset.
#[derive(Clone, Debug, Default)]
pub struct SimpleConfig {
    /// Lowest-precedence values.
    pub defaults: Option<Settings>,
    /// JSON file whose top level is an object.
    pub json_file: Option<Utf8PathBuf>,
    /// INI file; each section becomes an object-valued key.
    pub ini_file: Option<Utf8PathBuf>,
    /// Prefix selecting `PREFIX_<KEY>` environment variables.
    pub env_var_prefix: Option<String>,
    /// Highest-precedence values.
    pub overrides: Option<Settings>,
    /// Keys that must be present after loading.
    pub required: Vec<String>,
}

impl SimpleConfig {
    /// Start with every source unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the defaults map.
    #[must_use]
    pub fn defaults(mut self, defaults: Settings) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Use the public fields of `value` as defaults, skipping fields whose
    /// name starts with `_`.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`load_object_settings`].
    pub fn defaults_from<T: Serialize + ?Sized>(self, value: &T) -> StrataResult<Self> {
        let defaults = load_object_settings(value, crate::loader::DEFAULT_IGNORE_PREFIX)?;
        Ok(self.defaults(defaults))
    }

    /// Set the JSON file.
    #[must_use]
    pub fn json_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.json_file = Some(path.into());
        self
    }

    /// Set the INI file.
    #[must_use]
    pub fn ini_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.ini_file = Some(path.into());
        self
    }

    /// Set the environment variable prefix.
    #[must_use]
    pub fn env_var_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_var_prefix = Some(prefix.into());
        self
    }

    /// Set the overrides map.
    #[must_use]
    pub fn overrides(mut self, overrides: Settings) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Add required keys.
    #[must_use]
    pub fn required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }

    /// The loaders these options describe, in precedence order.
    #[must_use]
    pub fn loaders(&self) -> Vec<Box<dyn Loader>> {
        let mut loaders: Vec<Box<dyn Loader>> = Vec::new();
        if let Some(defaults) = &self.defaults {
            loaders.push(Box::new(DictLoader::labelled("defaults", defaults.clone())));
        }
        if let Some(path) = &self.json_file {
            loaders.push(Box::new(JsonFileLoader::new(path.clone())));
        }
        if let Some(path) = &self.ini_file {
            loaders.push(Box::new(IniFileLoader::new(path.clone())));
        }
        if let Some(prefix) = self.env_var_prefix.as_deref().filter(|p| !p.is_empty()) {
            loaders.push(Box::new(EnvLoader::new(prefix)));
        }
        if let Some(overrides) = &self.overrides {
            loaders.push(Box::new(DictLoader::labelled("overrides", overrides.clone())));
        }
        loaders
    }

    /// Build, load and validate the configuration.
    ///
    /// # Errors
    ///
    /// See [`simple_config`].
    pub fn load(self) -> StrataResult<StrataConfig> {
        simple_config(self)
    }
}

/// Load configuration from the conventional stack of sources.
///
/// Later sources override earlier ones; see [`SimpleConfig`] for the order.
/// Required keys are validated once every source has been merged.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use strata_config::{SimpleConfig, simple_config};
///
/// # fn run() -> strata_config::StrataResult<()> {
/// let mut defaults = strata_config::Settings::new();
/// defaults.insert("SOMETHING".into(), json!("x"));
/// let mut overrides = strata_config::Settings::new();
/// overrides.insert("SOMETHING".into(), json!("y"));
///
/// let config = simple_config(SimpleConfig::new().defaults(defaults).overrides(overrides))?;
/// assert_eq!(config.get("something")?, &json!("y"));
/// # Ok(())
/// # }
/// # run().expect("load");
/// ```
///
/// # Errors
///
/// Returns the first loader error unchanged, or
/// [`crate::StrataError::MissingConfiguration`] when required keys are
/// absent.
pub fn simple_config(options: SimpleConfig) -> StrataResult<StrataConfig> {
    let mut config = StrataConfig::builder()
        .loaders(options.loaders())
        .required(options.required)
        .build();
    config.load()?;
    config.validate()?;
    Ok(config)
}
