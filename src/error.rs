use std::io;

use bstr::BString;

use crate::digest::Digest;
use crate::object::ObjectKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A missing object, key or head. Callers are expected to branch on this one.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed id {id:?}: {source}")]
    MalformedId {
        id: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("bad {expected} prefix: {found:?}")]
    BadPrefix {
        expected: &'static str,
        found: BString,
    },

    #[error("bad entry kind: {0:?}")]
    BadKind(BString),

    #[error("truncated tree entry: missing {0}")]
    TruncatedEntry(&'static str),

    #[error("malformed tree entry: {0}")]
    MalformedEntry(String),

    #[error("malformed commit: {0}")]
    MalformedCommit(String),

    /// The bytes on disk do not hash to the id they are stored under.
    #[error("corrupt object: want={expected} got={actual}")]
    CorruptObject { expected: Digest, actual: Digest },

    #[error("corrupt tree: {0}")]
    CorruptTree(String),

    #[error("unexpected kind for {id}: want {expected}, found {found}")]
    UnexpectedKind {
        id: Digest,
        expected: ObjectKind,
        found: ObjectKind,
    },

    /// A key tried to descend through a blob.
    #[error("path collision at {0:?}")]
    PathCollision(Vec<String>),

    #[error("empty key")]
    EmptyKey,

    #[error(transparent)]
    Io(io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::CorruptObject { .. } | Error::CorruptTree(_))
    }

    /// Wrap this error so it can travel through an `io::Read` implementation.
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }
}

impl From<io::Error> for Error {
    /// Errors raised inside our own readers come back as `io::Error` with an `Error` payload.
    /// Unwrap those so callers see e.g. `CorruptObject` rather than an opaque I/O failure.
    fn from(err: io::Error) -> Self {
        match err.get_ref().map(|inner| inner.is::<Error>()) {
            Some(true) => match err.into_inner().map(|inner| inner.downcast::<Error>()) {
                Some(Ok(inner)) => *inner,
                _ => unreachable!("payload was checked to be an Error"),
            },
            _ => Error::Io(err),
        }
    }
}

pub trait OptionalExt<T> {
    /// Turn `NotFound` into `Ok(None)`, leaving every other error alone.
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for Result<T> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
