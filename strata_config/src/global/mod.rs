//! Process-wide configuration slot and call-time argument injection.
//!
//! [`GlobalConfig`] holds at most one [`StrataConfig`]. Each load builds a
//! fresh configuration and swaps it in; readers take an [`Arc`] snapshot so a
//! concurrent reload never invalidates a value already handed out.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::{CaseInsensitiveMap, Settings, SimpleConfig, StrataConfig, StrataError, StrataResult};

static GLOBAL: LazyLock<RwLock<Option<Arc<StrataConfig>>>> = LazyLock::new(RwLock::default);

/// Facade over the process-wide configuration slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalConfig;

impl GlobalConfig {
    /// Load a configuration with [`crate::simple_config`] and publish it,
    /// replacing any previous one.
    ///
    /// Loading happens before the lock is taken; when two loads race, the
    /// last one to publish wins.
    ///
    /// # Errors
    ///
    /// Propagates loader and validation errors. The current configuration is
    /// left in place on failure.
    pub fn load(options: SimpleConfig) -> StrataResult<Arc<StrataConfig>> {
        let shared = Arc::new(crate::simple_config(options)?);
        Self::publish(Arc::clone(&shared));
        Ok(shared)
    }

    /// Publish an already built configuration, replacing any previous one.
    pub fn install(config: StrataConfig) {
        Self::publish(Arc::new(config));
    }

    fn publish(shared: Arc<StrataConfig>) {
        debug!(keys = shared.len(), "publishing global configuration");
        *GLOBAL.write() = Some(shared);
    }

    /// Clear the slot. Readers holding a snapshot keep it.
    pub fn reset() {
        GLOBAL.write().take();
    }

    /// Snapshot of the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Uninitialized`] before the first load.
    pub fn config() -> StrataResult<Arc<StrataConfig>> {
        Self::try_config().ok_or_else(|| Arc::new(StrataError::Uninitialized))
    }

    /// Snapshot of the current configuration, if any.
    #[must_use]
    pub fn try_config() -> Option<Arc<StrataConfig>> {
        GLOBAL.read().clone()
    }

    /// Whether a configuration has been published.
    #[must_use]
    pub fn is_loaded() -> bool {
        GLOBAL.read().is_some()
    }

    /// Look up `key` in the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Uninitialized`] before the first load and
    /// [`StrataError::MissingKey`] when the key is absent.
    pub fn get(key: &str) -> StrataResult<Value> {
        Self::config()?.get(key).cloned()
    }

    /// Wrap `target` so the values named by `injection` are resolved from the
    /// current configuration on every call.
    ///
    /// The lookup happens when the wrapper is called, not when it is built,
    /// so a wrapper created before [`GlobalConfig::load`] sees the
    /// configuration published later.
    ///
    /// ```
    /// use serde_json::json;
    /// use strata_config::{CallArgs, GlobalConfig, Injection, StrataConfig};
    ///
    /// # fn run() -> strata_config::StrataResult<()> {
    /// let mut config = StrataConfig::default();
    /// config.insert("SETTING1", 1);
    /// config.insert("SETTING2", 2);
    /// GlobalConfig::install(config);
    ///
    /// let show = GlobalConfig::inject(
    ///     Injection::new().arg("SETTING1").kwarg("keyword", "SETTING2"),
    ///     |args: CallArgs| (args.positional, args.keyword.get("keyword").cloned()),
    /// );
    /// assert_eq!(show(CallArgs::new())?, (vec![json!(1)], Some(json!(2))));
    ///
    /// let explicit = CallArgs::new().kwarg("keyword", "don't inject");
    /// assert_eq!(show(explicit)?.1, Some(json!("don't inject")));
    /// # GlobalConfig::reset();
    /// # Ok(())
    /// # }
    /// # run().expect("inject");
    /// ```
    #[must_use]
    pub fn inject<F, R>(injection: Injection, target: F) -> impl Fn(CallArgs) -> StrataResult<R>
    where
        F: Fn(CallArgs) -> R,
    {
        move |mut args| {
            let config = Self::config()?;
            injection.apply(&config, &mut args)?;
            Ok(target(args))
        }
    }
}

/// Arguments of a wrapped call: positional values followed by keyword values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments, in order.
    pub positional: Vec<Value>,
    /// Keyword arguments by parameter name.
    pub keyword: Settings,
}

impl CallArgs {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }
}

/// Configuration keys to inject into a call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Injection {
    positional: Vec<String>,
    keyword: Vec<(String, String)>,
}

impl Injection {
    /// Inject nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the value of `key` after the caller's positional arguments.
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>) -> Self {
        self.positional.push(key.into());
        self
    }

    /// Supply keyword `name` from `key` unless the caller passes it.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.keyword.push((name.into(), key.into()));
        self
    }

    /// Resolve the injected values from `store` into `args`.
    ///
    /// Nothing is written unless every lookup succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingKey`] for the first absent key.
    pub fn apply(&self, store: &CaseInsensitiveMap, args: &mut CallArgs) -> StrataResult<()> {
        let positional = self
            .positional
            .iter()
            .map(|key| store.get(key).cloned())
            .collect::<StrataResult<Vec<_>>>()?;
        let keyword = self
            .keyword
            .iter()
            .filter(|(name, _)| !args.keyword.contains_key(name))
            .map(|(name, key)| Ok((name.clone(), store.get(key)?.clone())))
            .collect::<StrataResult<Vec<_>>>()?;
        args.positional.extend(positional);
        args.keyword.extend(keyword);
        Ok(())
    }
}
