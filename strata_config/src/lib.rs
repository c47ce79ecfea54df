//! Core crate for the `strata_config` configuration aggregator.
//!
//! Configuration is gathered from an ordered list of [`Loader`]s (defaults,
//! JSON files, INI files, environment variables, explicit overrides) and
//! shallow-merged into a single [`CaseInsensitiveMap`]. Later loaders win on
//! key collisions. The merged [`StrataConfig`] can validate required keys and
//! carries an optional secrets overlay that encrypts or decrypts the values
//! listed under a designated secrets key.
//!
//! ```rust,no_run
//! use strata_config::{SimpleConfig, simple_config};
//!
//! # fn run() -> strata_config::StrataResult<()> {
//! let config = simple_config(
//!     SimpleConfig::new()
//!         .json_file("settings.json")
//!         .env_var_prefix("MY_APP")
//!         .required(["DATABASE_URL"]),
//! )?;
//! let url = config.get("database_url")?;
//! # let _ = url;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod global;
pub mod loader;
mod result_ext;
pub mod secrets;
mod store;
pub mod task_definition;

pub use config::{
    DEFAULT_SECRETS_KEY, SimpleConfig, StrataConfig, StrataConfigBuilder, simple_config,
};
pub use error::{StrataError, StrataResult};
pub use global::{CallArgs, GlobalConfig, Injection};
pub use loader::{
    Loader, Settings, load_dict_settings, load_env_settings, load_ini_file_settings,
    load_json_file_settings, load_object_settings,
};
pub use result_ext::StrataResultExt;
pub use secrets::{BoxError, SecretTransform, SecretsState, decrypt};
pub use store::CaseInsensitiveMap;

/// Re-export of `serde_json` so callers can build values without adding the
/// dependency themselves.
pub use serde_json;
