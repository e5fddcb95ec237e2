//! Error handling.
//!
//! All fallible operations of this crate return a [`ResourceError`]. Its
//! [`ErrorKind`] tells whether an address bit-string was unusable, whether
//! the extension structure itself was broken, or whether a set of blocks for
//! an unknown address family could not be brought onto a common width.

use std::{error, fmt};
use std::borrow::Cow;
use bcder::decode::{ContentError, DecodeError};


//------------ ErrorKind -----------------------------------------------------

/// The kind of a resource error.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// An address bit-string does not fit the raw width of its family.
    ///
    /// This is also used for prefixes with non-zero unused bits.
    MalformedAddress,

    /// The encoded extension is structurally broken.
    ///
    /// This covers truncated or mistagged input, duplicate address
    /// families, and ranges whose minimum is larger than their maximum.
    MalformedExtension,

    /// Blocks of an unknown address family disagree on their raw width.
    UnsupportedFamily,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedAddress => "malformed address",
            ErrorKind::MalformedExtension => "malformed extension",
            ErrorKind::UnsupportedFamily => "unsupported address family",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


//------------ ResourceError -------------------------------------------------

/// An error happened while processing IP address resources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceError {
    kind: ErrorKind,
    detail: Cow<'static, str>,
}

impl ResourceError {
    fn new(kind: ErrorKind, detail: impl Into<Cow<'static, str>>) -> Self {
        ResourceError { kind, detail: detail.into() }
    }

    pub(crate) fn malformed_address(
        detail: impl Into<Cow<'static, str>>
    ) -> Self {
        Self::new(ErrorKind::MalformedAddress, detail)
    }

    pub(crate) fn malformed_extension(
        detail: impl Into<Cow<'static, str>>
    ) -> Self {
        Self::new(ErrorKind::MalformedExtension, detail)
    }

    pub(crate) fn unsupported_family(
        detail: impl Into<Cow<'static, str>>
    ) -> Self {
        Self::new(ErrorKind::UnsupportedFamily, detail)
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns a description of what exactly went wrong.
    pub fn detail(&self) -> &str {
        self.detail.as_ref()
    }
}


//--- From

impl<S: fmt::Display> From<DecodeError<S>> for ResourceError {
    fn from(err: DecodeError<S>) -> Self {
        ResourceError::malformed_extension(err.to_string())
    }
}

impl From<ResourceError> for ContentError {
    fn from(err: ResourceError) -> Self {
        ContentError::from_boxed(Box::new(err))
    }
}


//--- Display and Error

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl error::Error for ResourceError { }


//============ Tests =========================================================
