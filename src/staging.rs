use std::{
    fs::File,
    io::{self, BufWriter, Write},
    ops::{Deref, DerefMut},
};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::*;

use crate::util;

/// A file being written in the staging directory, to be atomically renamed into place.
///
/// Readers never observe a partially written file at the final path: the bytes go to
/// `tmp/<random>` first, and only a completed, synced file is renamed. A staged file that is
/// dropped without being persisted is removed.
pub struct StagedFile {
    path: Utf8PathBuf,
    file: Option<BufWriter<File>>,
}

impl Deref for StagedFile {
    type Target = BufWriter<File>;

    fn deref(&self) -> &Self::Target {
        self.file.as_ref().expect("staged file used after persist")
    }
}

impl DerefMut for StagedFile {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.file.as_mut().expect("staged file used after persist")
    }
}

impl StagedFile {
    pub fn create(tmp_dir: &Utf8Path, prefix: &str) -> io::Result<Self> {
        let path = tmp_dir.join(util::tmp_file_name(prefix));
        let file = File::options().write(true).create_new(true).open(&path)?;
        trace!(%path, "Staging file");
        Ok(Self {
            path,
            file: Some(BufWriter::new(file)),
        })
    }

    /// Flush, sync and rename onto `target`, replacing whatever is there.
    pub fn persist(mut self, target: &Utf8Path) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            let file = file.into_inner().map_err(io::IntoInnerError::into_error)?;
            file.sync_all()?;
        }
        std::fs::rename(&self.path, target)?;
        trace!(from=%self.path, to=%target, "Persisted staged file");
        // Renamed away, so there is nothing left for drop to clean up.
        self.path = Utf8PathBuf::new();
        Ok(())
    }

    /// Give up on this file.
    pub fn discard(self) {
        drop(self)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.path.as_str().is_empty() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path=%self.path, error=%e, "Could not remove staged file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_persist_and_discard() -> crate::Result<()> {
        let dir = TempDir::new("")?;
        let dir = Utf8Path::from_path(dir.path()).unwrap();

        let mut staged = StagedFile::create(dir, "obj")?;
        staged.write_all(b"hello")?;
        let target = dir.join("final");
        staged.persist(&target)?;
        assert_eq!(std::fs::read(&target)?, b"hello");

        let mut staged = StagedFile::create(dir, "obj")?;
        staged.write_all(b"never")?;
        staged.discard();

        let names = std::fs::read_dir(dir)?
            .map(|e| e.map(|e| e.file_name()))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(names, vec![std::ffi::OsString::from("final")]);

        Ok(())
    }
}
