//! Toy transforms standing in for real encrypters and decrypters.
//!
//! The closures returned here match the `Fn(&Value) -> Result<Value, _>`
//! shape accepted by `strata_config` secret transforms.

use std::error::Error;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

/// Error type returned by the helper transforms.
pub type TransformError = Box<dyn Error + Send + Sync>;

fn reversed(value: &Value) -> Result<Value, TransformError> {
    let text = value
        .as_str()
        .ok_or_else(|| TransformError::from(format!("expected a string, got {value}")))?;
    Ok(Value::String(text.chars().rev().collect()))
}

/// A transform reversing string values; it is its own inverse.
#[must_use]
pub fn reverse() -> impl Fn(&Value) -> Result<Value, TransformError> + Send + Sync + Clone {
    reversed
}

/// A transform replacing every value with `fixed`.
#[must_use]
pub fn constant(
    fixed: Value,
) -> impl Fn(&Value) -> Result<Value, TransformError> + Send + Sync {
    move |_| Ok(fixed.clone())
}

/// A transform that always fails with `message`.
#[must_use]
pub fn failing(
    message: &'static str,
) -> impl Fn(&Value) -> Result<Value, TransformError> + Send + Sync {
    move |_| Err(TransformError::from(message))
}

/// Records the values a transform was called with.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `inner`, recording each input before delegating.
    #[must_use]
    pub fn wrap<F>(
        &self,
        inner: F,
    ) -> impl Fn(&Value) -> Result<Value, TransformError> + Send + Sync + use<F>
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync,
    {
        let seen = Arc::clone(&self.seen);
        move |value| {
            seen.lock().push(value.clone());
            inner(value)
        }
    }

    /// Inputs seen so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Value> {
        self.seen.lock().clone()
    }
}
