use std::io::{BufRead, Read};
use std::str::{self, FromStr};

use bstr::ByteSlice;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::object::{expect_prefix, ObjectKind};
use crate::timestamp::Timestamp;

use super::*;

static TREE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^tree ([[:xdigit:]]*)$").unwrap());
static PARENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^parent ([[:xdigit:]]*)$").unwrap());
static TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^time (-?[0-9]+) ([+-][0-9]+)$").unwrap());

fn malformed(line: &[u8], what: &str) -> Error {
    Error::MalformedCommit(format!("{what}: {:?}", line.as_bstr()))
}

/// Read one `\n` terminated header line, without the terminator.
fn header_line<R: BufRead>(r: &mut R, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    r.read_until(b'\n', buf)?;
    if buf.pop() != Some(b'\n') {
        return Err(Error::MalformedCommit(
            "unexpectedly reached end of commit".into(),
        ));
    }
    Ok(())
}

fn parse_id(bytes: &[u8]) -> Result<Digest> {
    // The regexes only let hex digits through, so this is ascii.
    Digest::from_str(str::from_utf8(bytes).unwrap_or_default())
}

impl Commit {
    /// Parse an encoded commit, prefix included.
    pub fn decode<R: BufRead>(mut r: R) -> Result<Self> {
        expect_prefix(&mut r, ObjectKind::Commit)?;
        Self::decode_body(r)
    }

    /// Parse a commit whose prefix has already been consumed.
    ///
    /// ## Example
    /// ```text
    /// tree 0123456789
    /// parent 0123
    /// parent 45
    /// time 1424434473 +3600
    ///
    /// hi,
    ///
    /// how are you?
    /// ```
    ///
    /// Header lines must appear in exactly this order. Everything after the blank line is the
    /// message, byte for byte.
    pub fn decode_body<R: BufRead>(mut r: R) -> Result<Self> {
        let mut line = Vec::new();

        header_line(&mut r, &mut line)?;
        let tree = match TREE_REGEX.captures(&line) {
            Some(groups) => parse_id(&groups[1])?,
            None => return Err(malformed(&line, "expected tree")),
        };

        let mut parents = Vec::new();
        let time = loop {
            header_line(&mut r, &mut line)?;
            if let Some(groups) = PARENT_REGEX.captures(&line) {
                parents.push(parse_id(&groups[1])?);
            } else if let Some(groups) = TIME_REGEX.captures(&line) {
                let unix = str::from_utf8(&groups[1])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| malformed(&line, "bad time"))?;
                let offset = str::from_utf8(&groups[2])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| malformed(&line, "bad time offset"))?;
                // The zero instant is the unset time, whatever offset it was written with.
                let time = Timestamp { unix, offset };
                if time.unix == Timestamp::ZERO.unix {
                    break Timestamp::ZERO;
                }
                break time;
            } else {
                return Err(malformed(&line, "expected parent or time"));
            }
        };

        header_line(&mut r, &mut line)?;
        if !line.is_empty() {
            return Err(malformed(&line, "expected blank line after headers"));
        }

        let mut message = Vec::new();
        r.read_to_end(&mut message)?;

        Ok(Self {
            tree,
            parents,
            time,
            // An empty message decodes as no message, so the zero commit round trips.
            message: (!message.is_empty()).then_some(message),
        })
    }
}
