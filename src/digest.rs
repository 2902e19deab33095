use std::{
    fmt::{Debug, Display, LowerHex},
    ops::Deref,
    str::FromStr,
};

use sha1::{Digest as _, Sha1};
use tap::Tap;

use crate::error::Error;

/// An object id: the hash of an object's canonical encoding.
///
/// The length is not fixed, so that ids written by a different hash function can still be parsed
/// and compared. Everything this crate writes is SHA-1 (20 bytes).
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// The null digest, i.e. the empty byte string.
    ///
    /// This is used for "no object", e.g. the tree of an unset commit.
    pub const NULL: Self = Digest(Vec::new());
}

impl Digest {
    /// Hash the input bytes and return the resulting digest.
    pub fn new(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        Self::from_hasher(hasher)
    }

    pub(crate) fn from_hasher(hasher: Sha1) -> Self {
        Digest(hasher.finalize().to_vec())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Digest(bytes.into())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Format the digest as a hex string.
    ///
    /// Identical to `format!("{:x}", self)`.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Shorten a Digest, usually for display purposes.
    ///
    /// Note: This doesn't check for collisions.
    pub fn short(&self) -> String {
        self.to_hex().tap_mut(|x| x.truncate(7))
    }
}

impl Deref for Digest {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl LowerHex for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = Error;

    /// Parse a hex string of any even length. The empty string is `Digest::NULL`.
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        hex::decode(s).map(Digest).map_err(|source| Error::MalformedId {
            id: s.to_owned(),
            source,
        })
    }
}
