use std::io::{BufRead, Read};
use std::str::{self, FromStr};

use bstr::BString;

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::object::{expect_prefix, ObjectKind};

use super::{Entry, EntryKind, Tree};

impl Tree {
    /// Parse an encoded tree, prefix included.
    pub fn decode<R: BufRead>(mut r: R) -> Result<Self> {
        expect_prefix(&mut r, ObjectKind::Tree)?;
        Self::decode_body(r)
    }

    /// Parse the entries of a tree whose prefix has already been consumed. Entries are lines of
    /// the form `<kind> <hex id> <name length> <name>\n`; the stream ends after the last one.
    pub fn decode_body<R: BufRead>(mut r: R) -> Result<Self> {
        let mut entries: Vec<Entry> = Vec::new();

        while let Some(entry) = Entry::parse(&mut r)? {
            if let Some(prev) = entries.last() {
                if prev.name.as_bytes() >= entry.name.as_bytes() {
                    return Err(Error::MalformedEntry(format!(
                        "entry {:?} does not sort after {:?}",
                        entry.name, prev.name
                    )));
                }
            }
            entries.push(entry);
        }

        Ok(Self { entries })
    }
}

/// Read up to and including `delim`, leaving the bytes before it in `buf`. Returns `false` if the
/// stream ended before `delim` was seen.
fn read_field<R: BufRead>(r: &mut R, delim: u8, buf: &mut Vec<u8>) -> Result<bool> {
    buf.clear();
    r.read_until(delim, buf)?;
    if buf.last() == Some(&delim) {
        buf.pop();
        Ok(true)
    } else {
        Ok(false)
    }
}

impl Entry {
    /// Parse one entry, or `Ok(None)` at a clean end of stream.
    fn parse<R: BufRead>(r: &mut R) -> Result<Option<Self>> {
        let mut field = Vec::new();

        if !read_field(r, b' ', &mut field)? {
            return if field.is_empty() {
                Ok(None)
            } else {
                Err(Error::TruncatedEntry("kind"))
            };
        }
        let kind = match &field[..] {
            b"blob" => EntryKind::Blob,
            b"tree" => EntryKind::Tree,
            other => return Err(Error::BadKind(BString::from(other))),
        };

        if !read_field(r, b' ', &mut field)? {
            return Err(Error::TruncatedEntry("id"));
        }
        let id = str::from_utf8(&field)
            .map_err(|_| {
                Error::MalformedEntry(format!("non-ascii id {:?}", BString::from(&field[..])))
            })
            .and_then(Digest::from_str)?;

        if !read_field(r, b' ', &mut field)? {
            return Err(Error::TruncatedEntry("name length"));
        }
        let name_len: u64 = str::from_utf8(&field)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                Error::MalformedEntry(format!("bad name length {:?}", BString::from(&field[..])))
            })?;

        // The name and its trailing newline.
        let line_len = name_len.checked_add(1).ok_or_else(|| {
            Error::MalformedEntry(format!("name length {name_len} is out of range"))
        })?;
        let mut name = Vec::new();
        r.by_ref().take(line_len).read_to_end(&mut name)?;
        if name.len() as u64 != line_len {
            return Err(Error::TruncatedEntry("name"));
        }
        if name.pop() != Some(b'\n') {
            return Err(Error::MalformedEntry(format!(
                "name {:?} is not followed by a newline",
                BString::from(name)
            )));
        }
        let name = String::from_utf8(name)
            .map_err(|e| Error::MalformedEntry(format!("name is not utf-8: {e}")))?;

        Ok(Some(Self { kind, name, id }))
    }
}
