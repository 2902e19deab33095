use std::io::{self, BufRead, Read, Write};

use bstr::ByteSlice;

use crate::error::Result;
use crate::object::{expect_prefix, ObjectKind, Storable, BLOB_PREFIX};

/// Stream the canonical encoding of a blob: the prefix, then `value` verbatim.
///
/// There is no length field and no terminator; the value is everything after the prefix.
pub fn encode<R: Read + ?Sized>(w: &mut dyn Write, value: &mut R) -> io::Result<u64> {
    w.write_all(BLOB_PREFIX)?;
    io::copy(value, w)
}

/// Check the blob prefix and hand back the reader, positioned at the start of the value.
pub fn decode<R: BufRead>(mut r: R) -> Result<R> {
    expect_prefix(&mut r, ObjectKind::Blob)?;
    Ok(r)
}

/// A blob held in memory. Large values should go through [`encode`] and
/// [`crate::Database::blob`] instead.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Storable for Blob {
    fn encode(&self, w: &mut dyn Write) -> io::Result<()> {
        encode(w, &mut &self.data[..]).map(drop)
    }
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pretty-printing a blob is simple - just dump the contents
    pub fn pretty_print(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&self.data)?;
        w.flush()
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Blob").field(&self.data.as_bstr()).finish()
    }
}
