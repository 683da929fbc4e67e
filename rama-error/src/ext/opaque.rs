use std::fmt;

use crate::BoxError;

/// Rarely will you need [`OpaqueError`],
/// it can however be a useful last-resort in case you
/// get weird higher-rank Lifetime issues...
pub struct OpaqueError(BoxError);

impl OpaqueError {
    #[inline(always)]
    pub(super) fn from_box_error(e: impl Into<BoxError>) -> Self {
        Self(e.into())
    }

    /// Create a new [`OpaqueError`] from anything that can be displayed,
    /// e.g. a `&str`, a `String` or the result of a `format!` call.
    pub fn from_display(msg: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(format!("{msg}").into())
    }

    /// Create a new [`OpaqueError`] from any error-like value.
    pub fn from_std(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// Turn this [`OpaqueError`] into a [`BoxError`].
    pub fn into_boxed(self) -> BoxError {
        Box::new(self)
    }
}

impl fmt::Debug for OpaqueError {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for OpaqueError {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for OpaqueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

impl From<BoxError> for OpaqueError {
    #[inline(always)]
    fn from(err: BoxError) -> Self {
        Self(err)
    }
}
