use std::iter::FusedIterator;
use std::vec;

use crate::digest::Digest;
use crate::error::Result;
use crate::store::ObjectStore;
use crate::tree::{Entry, EntryKind, Tree};

use super::Sugar;

/// Depth-first walk over the values below a key prefix.
///
/// Yields `(key, blob id)` pairs in ascending key order, where keys compare segment by segment.
/// After the first error the iterator yields nothing more.
pub struct Keys<'a, S> {
    sugar: &'a Sugar<S>,
    // `path` holds the prefix plus the names of every tree on `stack` but the bottom one.
    path: Vec<String>,
    stack: Vec<vec::IntoIter<Entry>>,
}

impl<'a, S: ObjectStore> Keys<'a, S> {
    pub(super) fn new(sugar: &'a Sugar<S>, prefix: Vec<String>, tree: Tree) -> Self {
        Self {
            sugar,
            path: prefix,
            stack: vec![tree.into_entries().into_iter()],
        }
    }
}

impl<S: ObjectStore> Iterator for Keys<'_, S> {
    type Item = Result<(Vec<String>, Digest)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(entry) = self.stack.last_mut()?.next() else {
                self.stack.pop();
                if !self.stack.is_empty() {
                    self.path.pop();
                }
                continue;
            };

            match entry.kind {
                EntryKind::Blob => {
                    let mut key = self.path.clone();
                    key.push(entry.name);
                    return Some(Ok((key, entry.id)));
                }
                EntryKind::Tree => match self.sugar.subtree(&entry.id) {
                    Ok(tree) => {
                        self.path.push(entry.name);
                        self.stack.push(tree.into_entries().into_iter());
                    }
                    Err(e) => {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                },
            }
        }
    }
}

impl<S: ObjectStore> FusedIterator for Keys<'_, S> {}
