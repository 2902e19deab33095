//! Stream decorators that hash bytes as they pass through.
//!
//! Objects are hashed over exactly the bytes that hit (or come off) the disk, in the same pass
//! that copies them, so a large blob is never buffered just to be fingerprinted.

use std::io::{self, Read, Write};

use sha1::{Digest as _, Sha1};

use crate::digest::Digest;
use crate::error::Error;

/// Forwards writes to `inner` while feeding a running digest.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha1,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
        }
    }

    /// The digest of everything written so far, and the wrapped writer.
    pub fn finish(self) -> (W, Digest) {
        (self.inner, Digest::from_hasher(self.hasher))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        // Only the bytes the inner writer accepted count towards the digest.
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Forwards reads from `inner` while feeding a running digest. When `inner` reports end of
/// stream the digest is compared with the expected id, and a mismatch is returned as an
/// `io::Error` carrying [`Error::CorruptObject`].
pub struct Verifier<R> {
    inner: R,
    hasher: Option<Sha1>,
    expected: Digest,
}

impl<R: Read> Verifier<R> {
    pub fn new(inner: R, expected: Digest) -> Self {
        Self {
            inner,
            hasher: Some(Sha1::new()),
            expected,
        }
    }

    pub fn expected(&self) -> &Digest {
        &self.expected
    }

    /// Read (and discard) whatever is left, which forces verification.
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read> Read for Verifier<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        match (n, self.hasher.take()) {
            (0, Some(hasher)) => {
                let actual = Digest::from_hasher(hasher);
                if actual != self.expected {
                    return Err(Error::CorruptObject {
                        expected: self.expected.clone(),
                        actual,
                    }
                    .into_io());
                }
            }
            (_, Some(mut hasher)) => {
                hasher.update(&buf[..n]);
                self.hasher = Some(hasher);
            }
            // Already verified; anything after end of stream is not our business.
            (_, None) => {}
        }
        Ok(n)
    }
}
