//! Primary error enum for configuration loading flows.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::secrets::{BoxError, SecretsState};

/// Errors that can occur while assembling or using configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StrataError {
    /// One or more required keys were absent after every loader ran.
    #[error("Missing required items: {}", quote_keys(.missing))]
    MissingConfiguration {
        /// Every missing key, in declaration order.
        missing: Vec<String>,
    },

    /// Lookup of a key that is absent under any casing.
    #[error("configuration key '{key}' not found")]
    MissingKey {
        /// Key as supplied by the caller.
        key: String,
    },

    /// Bulk encryption or decryption requested from the wrong state.
    #[error("the configuration is already {actual}; expected it to be {expected}")]
    InvalidState {
        /// State the operation requires.
        expected: SecretsState,
        /// State the configuration is in.
        actual: SecretsState,
    },

    /// A secrets operation was requested without the matching function.
    #[error("no {operation} function configured")]
    MissingTransformer {
        /// Either `encrypter` or `decrypter`.
        operation: &'static str,
    },

    /// The secrets list entry holds something other than an array of strings.
    #[error("secrets list '{key}' must be an array of key names")]
    InvalidSecretsList {
        /// Key holding the malformed list.
        key: String,
    },

    /// The encrypter or decrypter failed for a specific key.
    #[error("failed to transform secret '{key}': {source}")]
    Secret {
        /// Configuration key whose value was being transformed.
        key: String,
        /// Error reported by the transform function.
        #[source]
        source: BoxError,
    },

    /// A configuration source could not be read.
    #[error("Configuration file error in '{path}': {source}")]
    File {
        /// Path that triggered the failure.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: BoxError,
    },

    /// A configuration source was read but its contents are malformed.
    #[error("Malformed configuration in '{path}': {source}")]
    Format {
        /// Path of the malformed source.
        path: Utf8PathBuf,
        /// Parser error or shape violation.
        #[source]
        source: BoxError,
    },

    /// A caller-supplied loader failed.
    #[error("loader '{name}' failed: {source}")]
    Loader {
        /// Human-readable loader description.
        name: String,
        /// Error raised by the loader.
        #[source]
        source: BoxError,
    },

    /// A task definition document does not have the expected shape.
    #[error("invalid task definition: {message}")]
    TaskDefinition {
        /// Description of the structural problem.
        message: String,
    },

    /// Serialising or deserialising a value failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The process-wide configuration was used before it was loaded.
    #[error("global configuration has not been loaded")]
    Uninitialized,
}

fn quote_keys(keys: &[String]) -> String {
    keys.iter()
        .map(|key| format!("\"{key}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
