mod parse;
mod write;

use std::io::{self, Write};

use crate::digest::Digest;
use crate::timestamp::Timestamp;

/// A snapshot: a root tree, the commits it follows, when it was made and why.
///
/// `Commit::default()` is a valid commit (null tree, no parents, zero time, no message) and
/// survives an encode/decode round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    pub tree: Digest,
    pub parents: Vec<Digest>,
    pub time: Timestamp,
    /// `None` and an empty message encode identically; decoding always yields `None`.
    pub message: Option<Vec<u8>>,
}

impl Commit {
    /// A commit template for the key-value layer, which fills in the tree and parents.
    pub fn new(time: Timestamp, message: impl Into<Vec<u8>>) -> Self {
        let message = message.into();
        Self {
            time,
            message: (!message.is_empty()).then_some(message),
            ..Default::default()
        }
    }

    pub fn tree_id(&self) -> &Digest {
        &self.tree
    }

    pub fn parents(&self) -> &[Digest] {
        self.parents.as_ref()
    }

    /// The first parent, which is the previous head for commits made by this crate.
    pub fn parent(&self) -> Option<&Digest> {
        self.parents.first()
    }

    pub fn message(&self) -> &[u8] {
        self.message.as_deref().unwrap_or_default()
    }

    pub fn pretty_print(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "tree {:x}", self.tree)?;
        for parent in &self.parents {
            writeln!(w, "parent {parent:x}")?;
        }
        writeln!(w, "time {}", self.time)?;
        writeln!(w)?;
        w.write_all(self.message())?;
        if !self.message().ends_with(b"\n") {
            writeln!(w)?;
        }
        w.flush()
    }
}
