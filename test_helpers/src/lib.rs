//! Test helpers shared across crates in the workspace.
//!
//! - [`jail`] wraps `figment::Jail` for tests that write configuration files
//!   or set environment variables.
//! - [`cipher`] provides reversible toy transforms and a call recorder for
//!   exercising secrets handling without a real key service.
//! - [`logs`] captures `tracing` output so tests can assert on diagnostics.

pub mod cipher;
pub mod jail;
pub mod logs;
