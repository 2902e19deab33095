use std::fmt::Display;
use std::io::{self, BufRead, Read, Write};

use bstr::BString;

use crate::blob::Blob;
use crate::commit::Commit;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::hashing::HashingWriter;
use crate::tree::Tree;

pub(crate) const BLOB_PREFIX: &[u8] = b"blob\n";
pub(crate) const TREE_PREFIX: &[u8] = b"tree\n";
pub(crate) const COMMIT_PREFIX: &[u8] = b"commit\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    pub(crate) fn prefix(self) -> &'static [u8] {
        match self {
            ObjectKind::Blob => BLOB_PREFIX,
            ObjectKind::Tree => TREE_PREFIX,
            ObjectKind::Commit => COMMIT_PREFIX,
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the prefix line of an encoded object and report which kind it is.
///
/// At most `"commit\n".len()` bytes are consumed.
pub fn read_kind<R: BufRead>(r: &mut R) -> Result<ObjectKind> {
    let mut prefix = Vec::with_capacity(COMMIT_PREFIX.len());
    r.by_ref()
        .take(COMMIT_PREFIX.len() as u64)
        .read_until(b'\n', &mut prefix)?;

    match &prefix[..] {
        BLOB_PREFIX => Ok(ObjectKind::Blob),
        TREE_PREFIX => Ok(ObjectKind::Tree),
        COMMIT_PREFIX => Ok(ObjectKind::Commit),
        _ => Err(Error::BadPrefix {
            expected: "object",
            found: BString::from(prefix),
        }),
    }
}

/// Like [`read_kind`], but fail with `BadPrefix` unless the object is of `kind`.
pub(crate) fn expect_prefix<R: BufRead>(r: &mut R, kind: ObjectKind) -> Result<()> {
    let mut prefix = Vec::with_capacity(kind.prefix().len());
    r.by_ref()
        .take(kind.prefix().len() as u64)
        .read_to_end(&mut prefix)?;
    if prefix != kind.prefix() {
        return Err(Error::BadPrefix {
            expected: kind.as_str(),
            found: BString::from(prefix),
        });
    }
    Ok(())
}

/// An object that has a canonical encoding, and therefore an id.
pub trait Storable {
    /// Write the canonical encoding, prefix included.
    fn encode(&self, w: &mut dyn Write) -> io::Result<()>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out).expect("writing to a Vec cannot fail");
        out
    }

    /// The id this object is (or would be) stored under.
    fn oid(&self) -> Digest {
        let mut w = HashingWriter::new(io::sink());
        self.encode(&mut w).expect("writing to a sink cannot fail");
        w.finish().1
    }
}

/// An object loaded from the database, of whatever kind it turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Decode an object of any kind from its canonical encoding.
    pub fn decode<R: BufRead>(mut r: R) -> Result<Self> {
        match read_kind(&mut r)? {
            ObjectKind::Blob => {
                let mut data = Vec::new();
                r.read_to_end(&mut data)?;
                Ok(Object::Blob(Blob::new(data)))
            }
            ObjectKind::Tree => Ok(Object::Tree(Tree::decode_body(r)?)),
            ObjectKind::Commit => Ok(Object::Commit(Commit::decode_body(r)?)),
        }
    }

    pub fn into_commit(self) -> Option<Commit> {
        if let Self::Commit(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        if let Self::Tree(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        if let Self::Blob(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        if let Self::Tree(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        if let Self::Commit(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        if let Self::Blob(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Human readable rendering, used by `can show`.
    pub fn pretty_print(&self, w: &mut dyn Write) -> io::Result<()> {
        match self {
            Object::Blob(blob) => blob.pretty_print(w),
            Object::Tree(tree) => tree.pretty_print(w),
            Object::Commit(commit) => commit.pretty_print(w),
        }
    }
}

impl Storable for Object {
    fn encode(&self, w: &mut dyn Write) -> io::Result<()> {
        match self {
            Object::Blob(blob) => blob.encode(w),
            Object::Tree(tree) => tree.encode(w),
            Object::Commit(commit) => commit.encode(w),
        }
    }
}
