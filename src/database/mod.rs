mod head;

use std::fs::File;
use std::io::{self, BufReader, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::*;
use walkdir::WalkDir;

use crate::blob;
use crate::commit::Commit;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::hashing::{HashingWriter, Verifier};
use crate::object::{read_kind, Object, ObjectKind, Storable};
use crate::staging::StagedFile;
use crate::store::ObjectStore;
use crate::tree::Tree;

type ObjectReader = BufReader<Verifier<File>>;

/// A content-addressed object database in a directory:
///
/// ```text
/// <root>/obj/<first 2 hex chars>/<remaining hex chars>
/// <root>/head
/// <root>/tmp/
/// ```
///
/// Objects are stored uncompressed in their canonical encoding, so the file named by an id
/// always hashes to that id. Every read checks this.
#[derive(Debug, Clone)]
pub struct Database {
    root: Utf8PathBuf,
    objects_dir: Utf8PathBuf,
    tmp_dir: Utf8PathBuf,
    head_path: Utf8PathBuf,
}

impl Database {
    fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            objects_dir: root.join("obj"),
            tmp_dir: root.join("tmp"),
            head_path: root.join("head"),
        }
    }

    /// Create the directory layout at `root` (if needed) and open it.
    pub fn init(root: impl AsRef<Utf8Path>) -> Result<Self> {
        let database = Self::new(root.as_ref());
        trace!(path=%database.root, "Initialising database");
        if database.objects_dir.is_dir() {
            warn!(path=%database.root, "Database already exists, init will only fill in gaps");
        }
        for dir in [&database.objects_dir, &database.tmp_dir] {
            trace!(path=%dir, "Creating directory");
            std::fs::create_dir_all(dir)?;
        }
        Ok(database)
    }

    /// Open an existing database. Fails with `NotFound` if `root` was never initialised.
    pub fn open(root: impl AsRef<Utf8Path>) -> Result<Self> {
        let database = Self::new(root.as_ref());
        if !database.objects_dir.is_dir() {
            return Err(Error::NotFound(format!("database at {}", database.root)));
        }
        trace!(path=%database.root, "Opened database");
        Ok(database)
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `obj/ab/cdef...`. `None` for ids too short to shard, which no stored object has.
    fn object_path(&self, oid: &Digest) -> Option<Utf8PathBuf> {
        let oid = oid.to_hex();
        if oid.len() <= 2 {
            return None;
        }
        let (prefix, suffix) = oid.split_at(2);
        let mut x = self.objects_dir.to_owned();
        x.push(prefix);
        x.push(suffix);
        Some(x)
    }

    pub fn exists(&self, oid: &Digest) -> bool {
        self.object_path(oid).map_or(false, |path| path.is_file())
    }

    /// Encode `obj` into the database and return its id.
    pub fn store<T: Storable + ?Sized>(&self, obj: &T) -> Result<Digest> {
        self.write_with(|w| obj.encode(w))
    }

    /// Stream an encoding into a staged file, hashing it on the way, then move it into place
    /// under the resulting id.
    fn write_with<F>(&self, encode: F) -> Result<Digest>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut staged = StagedFile::create(&self.tmp_dir, "obj")?;
        let mut writer = HashingWriter::new(&mut *staged);
        encode(&mut writer)?;
        let (_, oid) = writer.finish();

        let object_path = self
            .object_path(&oid)
            .ok_or_else(|| Error::MalformedId {
                id: oid.to_hex(),
                source: hex::FromHexError::InvalidStringLength,
            })?;

        if object_path.exists() {
            // Same path, same bytes: nothing to do.
            trace!(%oid, "Object already in database");
            staged.discard();
            return Ok(oid);
        }

        if let Some(dirname) = object_path.parent() {
            std::fs::create_dir_all(dirname)?;
        }
        staged.persist(&object_path)?;
        debug!(%oid, "Wrote object to database");

        Ok(oid)
    }

    fn open_object(&self, oid: &Digest) -> Result<ObjectReader> {
        trace!(%oid, "Reading object from database");
        let not_found = || Error::NotFound(format!("object {oid}"));

        let object_path = self.object_path(oid).ok_or_else(not_found)?;
        let file = match File::open(&object_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        Ok(BufReader::new(Verifier::new(file, oid.clone())))
    }

    /// Open an object and check its prefix, leaving the reader at the start of the body.
    fn open_kind(&self, oid: &Digest, expected: ObjectKind) -> Result<ObjectReader> {
        let mut reader = self.open_object(oid)?;
        let found = match read_kind(&mut reader) {
            Ok(found) => found,
            Err(e) => return Err(explain_failure(&mut reader, e)),
        };
        if found != expected {
            let e = Error::UnexpectedKind {
                id: oid.clone(),
                expected,
                found,
            };
            return Err(explain_failure(&mut reader, e));
        }
        Ok(reader)
    }

    /// Load an object of any kind. Blobs are read into memory; use [`Database::blob`] to stream
    /// them instead.
    pub fn read(&self, oid: &Digest) -> Result<Object> {
        let mut reader = self.open_object(oid)?;
        Object::decode(&mut reader).map_err(|e| explain_failure(&mut reader, e))
    }

    /// Read a whole object, checking both its id and its structure.
    pub fn verify(&self, oid: &Digest) -> Result<ObjectKind> {
        self.read(oid).map(|object| object.kind())
    }

    pub fn blob(&self, oid: &Digest) -> Result<BlobReader> {
        let inner = self.open_kind(oid, ObjectKind::Blob)?;
        Ok(BlobReader { inner })
    }

    /// Read a whole blob into memory.
    pub fn blob_to_vec(&self, oid: &Digest) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.blob(oid)?.read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn write_blob<R: Read>(&self, mut value: R) -> Result<Digest> {
        self.write_with(|w| blob::encode(w, &mut value).map(drop))
    }

    pub fn tree(&self, oid: &Digest) -> Result<Tree> {
        let mut reader = self.open_kind(oid, ObjectKind::Tree)?;
        Tree::decode_body(&mut reader).map_err(|e| explain_failure(&mut reader, e))
    }

    pub fn write_tree(&self, tree: &Tree) -> Result<Digest> {
        self.store(tree)
    }

    pub fn commit(&self, oid: &Digest) -> Result<Commit> {
        let mut reader = self.open_kind(oid, ObjectKind::Commit)?;
        Commit::decode_body(&mut reader).map_err(|e| explain_failure(&mut reader, e))
    }

    pub fn write_commit(&self, commit: &Commit) -> Result<Digest> {
        self.store(commit)
    }

    /// Every object id in the database, in ascending order. Files that are not named like an
    /// object are skipped.
    pub fn objects(&self) -> impl Iterator<Item = Result<Digest>> {
        WalkDir::new(&self.objects_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(Error::from(io::Error::from(e)))),
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.path();
                let prefix = path.parent()?.file_name()?.to_str()?;
                let suffix = entry.file_name().to_str()?;
                match format!("{prefix}{suffix}").parse::<Digest>() {
                    Ok(oid) => Some(Ok(oid)),
                    Err(_) => {
                        warn!(path=%path.display(), "Skipping stray file in object directory");
                        None
                    }
                }
            })
    }
}

/// Decoding failed. If the file is also corrupt, that is the real cause, so read through the
/// rest of it to let the verifier have its say.
fn explain_failure(reader: &mut ObjectReader, err: Error) -> Error {
    if matches!(err, Error::CorruptObject { .. } | Error::Io(_)) {
        return err;
    }
    match reader.get_mut().drain().map_err(Error::from) {
        Err(corrupt @ Error::CorruptObject { .. }) => corrupt,
        _ => err,
    }
}

/// The value of a blob, streamed from disk.
///
/// The id is checked once the end of the value is reached: a read that hits a mismatch fails
/// with an `io::Error` that converts back into [`Error::CorruptObject`].
pub struct BlobReader {
    inner: ObjectReader,
}

impl BlobReader {
    pub fn id(&self) -> &Digest {
        self.inner.get_ref().expected()
    }
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ObjectStore for Database {
    type BlobReader = BlobReader;

    fn head(&self) -> Result<Digest> {
        Database::head(self)
    }

    fn write_head(&self, id: &Digest) -> Result<()> {
        Database::write_head(self, id)
    }

    fn blob(&self, id: &Digest) -> Result<BlobReader> {
        Database::blob(self, id)
    }

    fn write_blob<R: Read>(&self, value: R) -> Result<Digest> {
        Database::write_blob(self, value)
    }

    fn tree(&self, id: &Digest) -> Result<Tree> {
        Database::tree(self, id)
    }

    fn write_tree(&self, tree: &Tree) -> Result<Digest> {
        Database::write_tree(self, tree)
    }

    fn commit(&self, id: &Digest) -> Result<Commit> {
        Database::commit(self, id)
    }

    fn write_commit(&self, commit: &Commit) -> Result<Digest> {
        Database::write_commit(self, commit)
    }
}
