use std::io::{self, Write};
use std::str::FromStr;

use tracing::*;

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::staging::StagedFile;

impl super::Database {
    /// The id of the tip commit.
    ///
    /// Fails with `NotFound` if no head has been written yet, which is the normal state of an
    /// empty repository.
    pub fn head(&self) -> Result<Digest> {
        let contents = match std::fs::read_to_string(&self.head_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound("head".into()))
            }
            Err(e) => return Err(e.into()),
        };
        Digest::from_str(contents.trim())
    }

    /// Point head at `oid`.
    ///
    /// The new value is staged and renamed over the old one, so a crash leaves either the old
    /// head or the new one, never a torn write.
    pub fn write_head(&self, oid: &Digest) -> Result<()> {
        let mut staged = StagedFile::create(&self.tmp_dir, "head")?;
        write!(staged, "{oid:x}")?;
        staged.persist(&self.head_path)?;
        debug!(%oid, "Updated head");
        Ok(())
    }
}
