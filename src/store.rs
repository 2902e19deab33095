use std::io::Read;

use crate::commit::Commit;
use crate::digest::Digest;
use crate::error::Result;
use crate::tree::Tree;

/// Everything the key-value layer needs from storage.
///
/// [`crate::Database`] is the on-disk implementation. Reads must verify that the bytes hash to
/// the requested id, and writes must return the id of exactly the bytes stored.
pub trait ObjectStore {
    type BlobReader: Read;

    /// The id of the tip commit. Fails with `NotFound` in an empty repository.
    fn head(&self) -> Result<Digest>;

    fn write_head(&self, id: &Digest) -> Result<()>;

    /// A stream over the blob's value. Verification happens when the stream reaches its end.
    fn blob(&self, id: &Digest) -> Result<Self::BlobReader>;

    fn write_blob<R: Read>(&self, value: R) -> Result<Digest>;

    fn tree(&self, id: &Digest) -> Result<Tree>;

    fn write_tree(&self, tree: &Tree) -> Result<Digest>;

    fn commit(&self, id: &Digest) -> Result<Commit>;

    fn write_commit(&self, commit: &Commit) -> Result<Digest>;
}

impl<S: ObjectStore> ObjectStore for &S {
    type BlobReader = S::BlobReader;

    fn head(&self) -> Result<Digest> {
        (**self).head()
    }

    fn write_head(&self, id: &Digest) -> Result<()> {
        (**self).write_head(id)
    }

    fn blob(&self, id: &Digest) -> Result<Self::BlobReader> {
        (**self).blob(id)
    }

    fn write_blob<R: Read>(&self, value: R) -> Result<Digest> {
        (**self).write_blob(value)
    }

    fn tree(&self, id: &Digest) -> Result<Tree> {
        (**self).tree(id)
    }

    fn write_tree(&self, tree: &Tree) -> Result<Digest> {
        (**self).write_tree(tree)
    }

    fn commit(&self, id: &Digest) -> Result<Commit> {
        (**self).commit(id)
    }

    fn write_commit(&self, commit: &Commit) -> Result<Digest> {
        (**self).write_commit(commit)
    }
}
