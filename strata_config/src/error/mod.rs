//! Error types produced while loading, validating and decrypting configuration.

mod constructors;
mod types;

pub use types::StrataError;

/// Result alias used throughout the crate.
///
/// Errors are shared through an [`Arc`](std::sync::Arc) so they can be cloned
/// into diagnostics without losing their source chain.
pub type StrataResult<T> = Result<T, std::sync::Arc<StrataError>>;
