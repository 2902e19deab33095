mod parse;
mod write;

use std::fmt::Display;
use std::io::{self, Write};

use crate::digest::Digest;

/// What a tree entry points at. Commits are never referenced from trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
        }
    }
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named edge from a tree to a blob or another tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub id: Digest,
}

impl Entry {
    pub fn blob(name: impl Into<String>, id: Digest) -> Self {
        Self {
            kind: EntryKind::Blob,
            name: name.into(),
            id,
        }
    }

    pub fn tree(name: impl Into<String>, id: Digest) -> Self {
        Self {
            kind: EntryKind::Tree,
            name: name.into(),
            id,
        }
    }

    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// A directory-like object: entries sorted strictly ascending by name, compared byte-wise.
///
/// Every way of building a `Tree` keeps that order, so [`Tree::get`] can binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<Entry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from entries in any order. Later entries win when names repeat.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut tree = Tree::new();
        for entry in entries {
            tree.insert(entry);
        }
        tree
    }

    fn index(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|e| e.name.as_bytes().cmp(name.as_bytes()))
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.index(name).ok().map(|i| &self.entries[i])
    }

    /// Add `entry`, replacing any entry with the same name. New names go in at their sorted
    /// position. Returns the replaced entry, if any.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        match self.index(&entry.name) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i], entry)),
            Err(i) => {
                self.entries.insert(i, entry);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.index(name).ok().map(|i| self.entries.remove(i))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pretty_print(&self, w: &mut dyn Write) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(w, "{} {:x}\t{}", entry.kind, entry.id, entry.name)?;
        }
        w.flush()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
