//! Configuration sources consumed by the merge engine.
//!
//! A [`Loader`] is a descriptor that already carries its arguments (a path,
//! an environment prefix, an in-memory map) and produces a [`Settings`] map
//! when invoked. Flat loaders return scalar values per key; sectioned
//! loaders such as the INI reader return an object per section.

use std::borrow::Cow;

mod env;
mod file;
mod object;

pub use env::{EnvLoader, decode_value, load_env_settings};
pub use file::{IniFileLoader, JsonFileLoader, load_ini_file_settings, load_json_file_settings};
pub use object::{DEFAULT_IGNORE_PREFIX, DictLoader, load_dict_settings, load_object_settings};

use crate::StrataResult;

/// Mapping produced by a single loader.
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// A source of configuration values.
///
/// Closures returning [`StrataResult<Settings>`] implement this trait, so ad
/// hoc sources can be registered without a dedicated type:
///
/// ```
/// use strata_config::{StrataConfig, loader};
/// use serde_json::json;
///
/// # fn run() -> strata_config::StrataResult<()> {
/// let mut config = StrataConfig::builder()
///     .loader(loader::from_fn(|| {
///         let mut settings = strata_config::Settings::new();
///         settings.insert("x".into(), json!(1));
///         Ok(settings)
///     }))
///     .build();
/// config.load()?;
/// assert_eq!(config.get("X")?, &json!(1));
/// # Ok(())
/// # }
/// # run().expect("load");
/// ```
pub trait Loader: Send + Sync {
    /// Produce this source's settings.
    ///
    /// # Errors
    ///
    /// Returns the source's own error (for example [`crate::StrataError::File`]
    /// or [`crate::StrataError::Format`]); the merge engine propagates it
    /// unchanged.
    fn load(&self) -> StrataResult<Settings>;

    /// Short description used in diagnostics.
    fn describe(&self) -> Cow<'_, str> {
        Cow::Borrowed("custom loader")
    }
}

impl<F> Loader for F
where
    F: Fn() -> StrataResult<Settings> + Send + Sync,
{
    fn load(&self) -> StrataResult<Settings> {
        self()
    }
}

/// Pin a closure to the [`Loader`] call signature.
///
/// Passing a closure through this function lets the compiler infer its
/// return type, which a bare `impl Loader` bound cannot do.
#[must_use]
pub const fn from_fn<F>(f: F) -> F
where
    F: Fn() -> StrataResult<Settings> + Send + Sync,
{
    f
}
