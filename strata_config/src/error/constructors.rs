//! Constructors for the [`StrataError`] variants raised across the crate.

use std::error::Error;
use std::sync::Arc;

use camino::Utf8Path;

use super::StrataError;

impl StrataError {
    /// Construct a missing-key error wrapped in an [`Arc`].
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_config::StrataError;
    /// let err = StrataError::missing_key("port");
    /// assert!(matches!(&*err, StrataError::MissingKey { key } if key == "port"));
    /// ```
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::MissingKey { key: key.into() })
    }

    /// Wrap an error raised by a caller-supplied loader.
    ///
    /// Custom loaders use this to report failures without defining their own
    /// variant:
    ///
    /// ```
    /// use strata_config::StrataError;
    /// let io = std::io::Error::other("vault unreachable");
    /// let err = StrataError::loader("vault", io);
    /// assert_eq!(err.to_string(), "loader 'vault' failed: vault unreachable");
    /// ```
    #[must_use]
    pub fn loader(
        name: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::Loader {
            name: name.into(),
            source: source.into(),
        })
    }

    /// Construct a task definition shape error.
    #[must_use]
    pub fn task_definition(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::TaskDefinition {
            message: message.into(),
        })
    }

    pub(crate) fn file(
        path: &Utf8Path,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::File {
            path: path.to_path_buf(),
            source: source.into(),
        })
    }

    pub(crate) fn format(
        path: &Utf8Path,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::Format {
            path: path.to_path_buf(),
            source: source.into(),
        })
    }

    pub(crate) fn secret(
        key: impl Into<String>,
        source: Box<dyn Error + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new(Self::Secret {
            key: key.into(),
            source,
        })
    }
}
