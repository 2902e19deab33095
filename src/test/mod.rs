mod sugar;

use std::cell::Cell;
use std::io::Read;

use camino::Utf8PathBuf;
use tempdir::TempDir;

use crate::*;

/// A time that is not the zero time, so stored commits have something to show for it.
pub const COMMIT_TIME: Timestamp = Timestamp {
    unix: 1424434473,
    offset: 3600,
};

pub fn template(message: &str) -> Commit {
    Commit::new(COMMIT_TIME, message)
}

/// An initialised database in a fresh temporary directory. Keep the `TempDir` alive for as long
/// as the database is used.
pub fn test_database() -> Result<(TempDir, Database)> {
    let dir = TempDir::new("can")?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
    let database = Database::init(root)?;
    Ok((dir, database))
}

pub fn read_all(mut reader: impl Read) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Flip the bits of one byte of a stored object, as a failing disk might.
pub fn corrupt_object(database: &Database, oid: &Digest, index_from_end: usize) -> Result<()> {
    let hex = oid.to_hex();
    let path = database.root().join("obj").join(&hex[..2]).join(&hex[2..]);
    let mut bytes = std::fs::read(&path)?;
    let index = bytes.len() - 1 - index_from_end;
    bytes[index] ^= 0xff;
    std::fs::write(&path, bytes)?;
    Ok(())
}

/// Counts the writes that pass through to `inner`.
pub struct CountingStore<S> {
    inner: S,
    blobs: Cell<usize>,
    trees: Cell<usize>,
    commits: Cell<usize>,
}

impl<S: ObjectStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            blobs: Cell::new(0),
            trees: Cell::new(0),
            commits: Cell::new(0),
        }
    }

    pub fn blobs(&self) -> usize {
        self.blobs.get()
    }

    pub fn trees(&self) -> usize {
        self.trees.get()
    }

    pub fn commits(&self) -> usize {
        self.commits.get()
    }
}

impl<S: ObjectStore> ObjectStore for CountingStore<S> {
    type BlobReader = S::BlobReader;

    fn head(&self) -> Result<Digest> {
        self.inner.head()
    }

    fn write_head(&self, id: &Digest) -> Result<()> {
        self.inner.write_head(id)
    }

    fn blob(&self, id: &Digest) -> Result<Self::BlobReader> {
        self.inner.blob(id)
    }

    fn write_blob<R: Read>(&self, value: R) -> Result<Digest> {
        self.blobs.set(self.blobs.get() + 1);
        self.inner.write_blob(value)
    }

    fn tree(&self, id: &Digest) -> Result<Tree> {
        self.inner.tree(id)
    }

    fn write_tree(&self, tree: &Tree) -> Result<Digest> {
        self.trees.set(self.trees.get() + 1);
        self.inner.write_tree(tree)
    }

    fn commit(&self, id: &Digest) -> Result<Commit> {
        self.inner.commit(id)
    }

    fn write_commit(&self, commit: &Commit) -> Result<Digest> {
        self.commits.set(self.commits.get() + 1);
        self.inner.write_commit(commit)
    }
}
