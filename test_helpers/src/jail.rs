//! Helpers for running tests inside a `figment::Jail`.
//!
//! A jail gives each test a scratch working directory and restores every
//! environment variable it touches on exit. These helpers let the closure
//! use `anyhow` errors and hand back a value, which `Jail::try_with` does not
//! allow on its own.

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;

/// Executes `f` inside a [`figment::Jail`], returning the closure's output.
///
/// The jail is torn down once the closure completes, even when it fails.
///
/// # Errors
///
/// Returns an error if the jail cannot be created or the closure fails.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|j| {
        output = Some(f(j).map_err(|err| figment::Error::from(format!("{err:#}")))?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure did not return a value"))
}

/// Writes `contents` to `name` inside the jail and returns its absolute
/// path.
///
/// # Errors
///
/// Returns an error if the file cannot be written or the jail directory is
/// not valid UTF-8.
pub fn write_file(jail: &mut figment::Jail, name: &str, contents: &str) -> Result<Utf8PathBuf> {
    jail.create_file(name, contents)
        .map_err(|err| anyhow!(err.to_string()))
        .with_context(|| format!("write {name}"))?;
    let path = jail.directory().join(name);
    Utf8PathBuf::from_path_buf(path)
        .map_err(|non_utf8| anyhow!("jail path is not valid UTF-8: {}", non_utf8.display()))
}
