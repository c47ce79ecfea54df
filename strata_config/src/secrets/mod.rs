//! Secret handling for configuration values.
//!
//! Keys whose values are secret are listed under a designated secrets key
//! (by default `SECRETS`). The stateless [`decrypt`] function rewrites those
//! values once; [`crate::StrataConfig`] layers an encrypted/decrypted state
//! machine on top of the same routine so secrets can be round-tripped.

use std::fmt;

use serde_json::Value;
use tracing::{trace, warn};
use uncased::UncasedStr;

use crate::{CaseInsensitiveMap, StrataError, StrataResult};

mod envelope;

pub use envelope::{
    CipherClient, EnvelopeDecrypter, EnvelopeEncrypter, envelope_decrypter, envelope_encrypter,
};

/// Boxed error type returned by transforms and cipher clients.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Whether the tracked secrets currently hold plaintext or ciphertext.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SecretsState {
    /// Secret values are plaintext.
    #[default]
    Decrypted,
    /// Secret values are ciphertext.
    Encrypted,
}

impl fmt::Display for SecretsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Decrypted => "decrypted",
            Self::Encrypted => "encrypted",
        })
    }
}

/// A function mapping one configuration value to another: an encrypter or a
/// decrypter.
///
/// Transforms are only ever applied under the state machine of
/// [`crate::StrataConfig`] (or once via [`decrypt`]), so they never see the
/// same logical value twice in a row.
pub trait SecretTransform: Send + Sync {
    /// Transform `value`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying cipher reports.
    fn transform(&self, value: &Value) -> Result<Value, BoxError>;
}

impl<F> SecretTransform for F
where
    F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync,
{
    fn transform(&self, value: &Value) -> Result<Value, BoxError> {
        self(value)
    }
}

/// Pin a closure to the [`SecretTransform`] call signature so its argument
/// and error types can be inferred.
///
/// ```
/// use serde_json::{Value, json};
/// use strata_config::secrets::{self, SecretTransform};
///
/// let shout = secrets::from_fn(|value| {
///     Ok(Value::String(value.as_str().unwrap_or_default().to_uppercase()))
/// });
/// assert_eq!(shout.transform(&json!("quiet")).ok(), Some(json!("QUIET")));
/// ```
#[must_use]
pub const fn from_fn<F>(f: F) -> F
where
    F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync,
{
    f
}

/// Read the key names listed under `list_key`.
///
/// Returns `Ok(None)` when `list_key` is absent.
///
/// # Errors
///
/// Returns [`StrataError::InvalidSecretsList`] when the entry is not an
/// array of strings.
pub fn secret_keys(store: &CaseInsensitiveMap, list_key: &str) -> StrataResult<Option<Vec<String>>> {
    let Some(value) = store.find(list_key) else {
        return Ok(None);
    };
    let invalid = || {
        std::sync::Arc::new(StrataError::InvalidSecretsList {
            key: list_key.to_owned(),
        })
    };
    let items = value.as_array().ok_or_else(invalid)?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(invalid))
        .collect::<StrataResult<Vec<_>>>()
        .map(Some)
}

/// Append `key` to the list under `list_key` unless an equal key (ignoring
/// case) is already listed. The list is created when absent.
///
/// # Errors
///
/// Returns [`StrataError::InvalidSecretsList`] when the existing entry is not
/// an array of strings.
pub fn track_secret(store: &mut CaseInsensitiveMap, list_key: &str, key: &str) -> StrataResult<()> {
    let mut keys = secret_keys(store, list_key)?.unwrap_or_default();
    if keys
        .iter()
        .any(|listed| UncasedStr::new(listed) == UncasedStr::new(key))
    {
        return Ok(());
    }
    keys.push(key.to_owned());
    store.insert(
        list_key,
        Value::Array(keys.into_iter().map(Value::String).collect()),
    );
    Ok(())
}

fn union_keys<I, S>(listed: Vec<String>, extra: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<String> = Vec::with_capacity(listed.len());
    for key in listed
        .into_iter()
        .chain(extra.into_iter().map(|key| key.as_ref().to_owned()))
    {
        if !keys
            .iter()
            .any(|seen| UncasedStr::new(seen) == UncasedStr::new(&key))
        {
            keys.push(key);
        }
    }
    keys
}

/// Rewrite every listed secret with `transform`.
///
/// Keys come from the array under `secrets_config_key` (when given) unioned
/// with `secrets_list`. When `secrets_config_key` names an absent entry a
/// warning is logged and the entry is treated as an empty list. All new
/// values are computed before any is written, so a failing transform leaves
/// `store` untouched.
///
/// The function keeps no state: calling it twice transforms twice.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use strata_config::{CaseInsensitiveMap, secrets};
///
/// let mut store = CaseInsensitiveMap::new();
/// store.insert("API_KEY", "ciphertext");
/// store.insert("SECRETS", json!(["api_key"]));
/// secrets::decrypt(
///     &mut store,
///     &secrets::from_fn(|_| Ok(json!("plaintext"))),
///     Some("SECRETS"),
///     std::iter::empty::<&str>(),
/// )
/// .expect("decrypt");
/// assert_eq!(store.get("API_KEY").ok(), Some(&json!("plaintext")));
/// ```
///
/// # Errors
///
/// Returns [`StrataError::InvalidSecretsList`] for a malformed list,
/// [`StrataError::MissingKey`] when a listed key is absent and
/// [`StrataError::Secret`] when `transform` fails.
pub fn decrypt<T, I, S>(
    store: &mut CaseInsensitiveMap,
    transform: &T,
    secrets_config_key: Option<&str>,
    secrets_list: I,
) -> StrataResult<()>
where
    T: SecretTransform + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let listed = match secrets_config_key {
        Some(list_key) => secret_keys(store, list_key)?.unwrap_or_else(|| {
            warn!(
                secrets_key = list_key,
                "no secrets list found in configuration; set it to an empty list or \
                 disable the secrets key to choose the keys explicitly"
            );
            Vec::new()
        }),
        None => Vec::new(),
    };
    let keys = union_keys(listed, secrets_list);

    let mut rewritten = Vec::with_capacity(keys.len());
    for key in keys {
        let current = store.get(&key)?;
        let next = transform
            .transform(current)
            .map_err(|source| StrataError::secret(key.as_str(), source))?;
        trace!(key = %key, "transformed secret");
        rewritten.push((key, next));
    }
    store.update(rewritten);
    Ok(())
}
