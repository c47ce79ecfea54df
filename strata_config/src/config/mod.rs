//! The merged configuration: loaders, validation and the secrets overlay.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::secrets::{self, SecretTransform, SecretsState};
use crate::{CaseInsensitiveMap, Loader, StrataError, StrataResult};

mod simple;

pub use simple::{SimpleConfig, simple_config};

/// Key holding the list of secret keys unless configured otherwise.
pub const DEFAULT_SECRETS_KEY: &str = "SECRETS";

/// A case-insensitive configuration assembled from ordered loaders.
///
/// The configuration dereferences to its [`CaseInsensitiveMap`], so lookups
/// and direct mutation use the store's API:
///
/// ```
/// use serde_json::json;
/// use strata_config::{StrataConfig, loader::DictLoader};
///
/// # fn run() -> strata_config::StrataResult<()> {
/// let mut first = strata_config::Settings::new();
/// first.insert("x".into(), json!(1));
/// first.insert("y".into(), json!(2));
/// let mut second = strata_config::Settings::new();
/// second.insert("X".into(), json!(3));
///
/// let mut config = StrataConfig::builder()
///     .loader(DictLoader::new(first))
///     .loader(DictLoader::new(second))
///     .build();
/// config.load()?;
/// assert_eq!(config.get("x")?, &json!(3));
/// assert_eq!(config.get("y")?, &json!(2));
/// # Ok(())
/// # }
/// # run().expect("load");
/// ```
pub struct StrataConfig {
    store: CaseInsensitiveMap,
    loaders: Vec<Box<dyn Loader>>,
    required: Vec<String>,
    encrypter: Option<Arc<dyn SecretTransform>>,
    decrypter: Option<Arc<dyn SecretTransform>>,
    secrets_config_key: String,
    state: SecretsState,
}

impl StrataConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> StrataConfigBuilder {
        StrataConfigBuilder::default()
    }

    /// Run every loader in registration order, merging each result over the
    /// store.
    ///
    /// Loaders run sequentially; later loaders override earlier ones. The
    /// first failure stops the sequence and is returned unchanged. Keys
    /// merged by loaders that already ran stay in the store.
    ///
    /// # Errors
    ///
    /// Returns the first loader error.
    pub fn load(&mut self) -> StrataResult<()> {
        for loader in &self.loaders {
            let settings = loader.load()?;
            debug!(
                loader = %loader.describe(),
                keys = settings.len(),
                "merged configuration source"
            );
            self.store.update(settings);
        }
        Ok(())
    }

    /// Check that every required key is present.
    ///
    /// All keys are checked before failing so the error names every missing
    /// one. The store is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingConfiguration`] listing each absent key.
    pub fn validate(&self) -> StrataResult<()> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|key| !self.store.contains_key(key))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Arc::new(StrataError::MissingConfiguration { missing }))
        }
    }

    /// Keys checked by [`validate`](Self::validate).
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Key whose value lists the secret keys.
    #[must_use]
    pub fn secrets_config_key(&self) -> &str {
        &self.secrets_config_key
    }

    /// Current state of the tracked secrets.
    #[must_use]
    pub const fn secrets_state(&self) -> SecretsState {
        self.state
    }

    /// Whether the tracked secrets currently hold plaintext.
    #[must_use]
    pub fn is_decrypted(&self) -> bool {
        self.state == SecretsState::Decrypted
    }

    /// Record that the store already holds ciphertext, for example after
    /// loading an encrypted file. No value is transformed.
    pub const fn mark_encrypted(&mut self) {
        self.state = SecretsState::Encrypted;
    }

    /// Record that the store already holds plaintext. No value is
    /// transformed.
    pub const fn mark_decrypted(&mut self) {
        self.state = SecretsState::Decrypted;
    }

    fn ensure_state(&self, expected: SecretsState) -> StrataResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Arc::new(StrataError::InvalidState {
                expected,
                actual: self.state,
            }))
        }
    }

    fn encrypter(&self) -> StrataResult<Arc<dyn SecretTransform>> {
        self.encrypter
            .clone()
            .ok_or_else(|| Arc::new(StrataError::MissingTransformer { operation: "encrypter" }))
    }

    fn decrypter(&self) -> StrataResult<Arc<dyn SecretTransform>> {
        self.decrypter
            .clone()
            .ok_or_else(|| Arc::new(StrataError::MissingTransformer { operation: "decrypter" }))
    }

    /// Encrypt every listed secret and switch to the encrypted state.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidState`] when already encrypted,
    /// [`StrataError::MissingTransformer`] without an encrypter, and the
    /// errors of [`secrets::decrypt`] otherwise. On error the state is
    /// unchanged.
    pub fn encrypt(&mut self) -> StrataResult<()> {
        self.ensure_state(SecretsState::Decrypted)?;
        let encrypter = self.encrypter()?;
        secrets::decrypt(
            &mut self.store,
            encrypter.as_ref(),
            Some(self.secrets_config_key.as_str()),
            std::iter::empty::<&str>(),
        )?;
        self.state = SecretsState::Encrypted;
        Ok(())
    }

    /// Decrypt every listed secret and switch to the decrypted state.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidState`] when already decrypted,
    /// [`StrataError::MissingTransformer`] without a decrypter, and the
    /// errors of [`secrets::decrypt`] otherwise. On error the state is
    /// unchanged.
    pub fn decrypt(&mut self) -> StrataResult<()> {
        self.ensure_state(SecretsState::Encrypted)?;
        let decrypter = self.decrypter()?;
        secrets::decrypt(
            &mut self.store,
            decrypter.as_ref(),
            Some(self.secrets_config_key.as_str()),
            std::iter::empty::<&str>(),
        )?;
        self.state = SecretsState::Decrypted;
        Ok(())
    }

    /// Read `key` as plaintext regardless of the current state.
    ///
    /// In the encrypted state the stored value is passed through the
    /// decrypter; nothing is written back.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingKey`] for an absent key,
    /// [`StrataError::MissingTransformer`] when encrypted without a
    /// decrypter and [`StrataError::Secret`] when decryption fails.
    pub fn get_encrypted(&self, key: &str) -> StrataResult<Value> {
        let stored = self.store.get(key)?;
        match self.state {
            SecretsState::Decrypted => Ok(stored.clone()),
            SecretsState::Encrypted => self
                .decrypter()?
                .transform(stored)
                .map_err(|source| StrataError::secret(key, source)),
        }
    }

    /// Store `value` for `key`, encrypting it when the configuration is in
    /// the encrypted state.
    ///
    /// In the encrypted state the key is also recorded in the secrets list
    /// (once, ignoring case), creating the list when absent. In the
    /// decrypted state the value is stored as is and the list is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingTransformer`] when encrypted without an
    /// encrypter, [`StrataError::Secret`] when encryption fails and
    /// [`StrataError::InvalidSecretsList`] when the list is malformed.
    pub fn set_encrypted(&mut self, key: &str, value: impl Into<Value>) -> StrataResult<()> {
        let plaintext = value.into();
        match self.state {
            SecretsState::Decrypted => {
                self.store.insert(key, plaintext);
            }
            SecretsState::Encrypted => {
                let ciphertext = self
                    .encrypter()?
                    .transform(&plaintext)
                    .map_err(|source| StrataError::secret(key, source))?;
                secrets::track_secret(&mut self.store, &self.secrets_config_key, key)?;
                self.store.insert(key, ciphertext);
            }
        }
        Ok(())
    }

    /// Borrow the underlying store.
    #[must_use]
    pub const fn store(&self) -> &CaseInsensitiveMap {
        &self.store
    }

    /// Mutably borrow the underlying store.
    pub const fn store_mut(&mut self) -> &mut CaseInsensitiveMap {
        &mut self.store
    }

    /// Consume the configuration, keeping only its values.
    #[must_use]
    pub fn into_store(self) -> CaseInsensitiveMap {
        self.store
    }
}

impl Default for StrataConfig {
    fn default() -> Self {
        StrataConfigBuilder::default().build()
    }
}

impl Deref for StrataConfig {
    type Target = CaseInsensitiveMap;

    fn deref(&self) -> &CaseInsensitiveMap {
        &self.store
    }
}

impl DerefMut for StrataConfig {
    fn deref_mut(&mut self) -> &mut CaseInsensitiveMap {
        &mut self.store
    }
}

impl fmt::Debug for StrataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrataConfig")
            .field("store", &self.store)
            .field(
                "loaders",
                &self
                    .loaders
                    .iter()
                    .map(|loader| loader.describe().into_owned())
                    .collect::<Vec<_>>(),
            )
            .field("required", &self.required)
            .field("encrypter", &self.encrypter.as_ref().map(|_| "<function>"))
            .field("decrypter", &self.decrypter.as_ref().map(|_| "<function>"))
            .field("secrets_config_key", &self.secrets_config_key)
            .field("state", &self.state)
            .finish()
    }
}

/// Builder for [`StrataConfig`].
pub struct StrataConfigBuilder {
    loaders: Vec<Box<dyn Loader>>,
    required: Vec<String>,
    encrypter: Option<Arc<dyn SecretTransform>>,
    decrypter: Option<Arc<dyn SecretTransform>>,
    secrets_config_key: String,
    state: SecretsState,
}

impl Default for StrataConfigBuilder {
    fn default() -> Self {
        Self {
            loaders: Vec::new(),
            required: Vec::new(),
            encrypter: None,
            decrypter: None,
            secrets_config_key: DEFAULT_SECRETS_KEY.to_owned(),
            state: SecretsState::Decrypted,
        }
    }
}

impl StrataConfigBuilder {
    /// Append a loader; loaders run in the order they are added.
    #[must_use]
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Append already boxed loaders.
    #[must_use]
    pub fn loaders<I>(mut self, loaders: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Loader>>,
    {
        self.loaders.extend(loaders);
        self
    }

    /// Add keys that must be present after loading.
    #[must_use]
    pub fn required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Function used by [`StrataConfig::encrypt`] and
    /// [`StrataConfig::set_encrypted`].
    #[must_use]
    pub fn encrypter(mut self, encrypter: impl SecretTransform + 'static) -> Self {
        self.encrypter = Some(Arc::new(encrypter));
        self
    }

    /// Function used by [`StrataConfig::decrypt`] and
    /// [`StrataConfig::get_encrypted`].
    #[must_use]
    pub fn decrypter(mut self, decrypter: impl SecretTransform + 'static) -> Self {
        self.decrypter = Some(Arc::new(decrypter));
        self
    }

    /// Override the key holding the secrets list.
    #[must_use]
    pub fn secrets_config_key(mut self, key: impl Into<String>) -> Self {
        self.secrets_config_key = key.into();
        self
    }

    /// State the secrets start in; [`SecretsState::Decrypted`] by default.
    #[must_use]
    pub fn initial_state(mut self, state: SecretsState) -> Self {
        self.state = state;
        self
    }

    /// Finish building. The store starts empty; call
    /// [`StrataConfig::load`] to run the loaders.
    #[must_use]
    pub fn build(self) -> StrataConfig {
        StrataConfig {
            store: CaseInsensitiveMap::new(),
            loaders: self.loaders,
            required: self.required,
            encrypter: self.encrypter,
            decrypter: self.decrypter,
            secrets_config_key: self.secrets_config_key,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests;
