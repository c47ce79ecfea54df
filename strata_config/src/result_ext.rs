//! Extension for mapping foreign errors to `StrataResult` concisely.
//!
//! Replaces repetitive `.map_err(|e| Arc::new(StrataError::from(e)))` chains
//! when an external error type already converts into [`StrataError`].
//!
//! # Examples
//!
//! ```
//! use strata_config::{StrataResult, StrataResultExt};
//!
//! fn to_json() -> StrataResult<serde_json::Value> {
//!     // serde_json::Error implements Into<StrataError>
//!     serde_json::to_value(42).into_strata()
//! }
//! # assert_eq!(to_json().ok(), Some(serde_json::json!(42)));
//! ```

use std::sync::Arc;

use crate::{StrataError, StrataResult};

/// Generic extension for mapping `Result<T, E>` with `E: Into<StrataError>`
/// into a [`StrataResult<T>`].
pub trait StrataResultExt<T, E> {
    /// Convert `Result<T, E>` into `StrataResult<T>` using `Into<StrataError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<StrataError>`.
    fn into_strata(self) -> StrataResult<T>;
}

impl<T, E> StrataResultExt<T, E> for Result<T, E>
where
    E: Into<StrataError>,
{
    fn into_strata(self) -> StrataResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}
