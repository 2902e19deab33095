//! A key-value layer over the object store.
//!
//! A key is a non-empty list of string segments. The root tree of the head commit holds an entry
//! for the first segment of every key; tree entries lead one segment deeper and blob entries hold
//! values. Updates copy the trees along the key and leave every other tree shared with the
//! previous commit.

mod keys;
mod log;

use std::io::Read;

use tracing::*;

use crate::commit::Commit;
use crate::digest::Digest;
use crate::error::{Error, OptionalExt, Result};
use crate::store::ObjectStore;
use crate::tree::{Entry, Tree};
use crate::util::display_key;

pub use keys::Keys;
pub use log::Log;

pub struct Sugar<S> {
    store: S,
}

impl<S: ObjectStore> Sugar<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The tip commit, or `None` in an empty repository.
    pub fn head(&self) -> Result<Option<Digest>> {
        self.store.head().optional()
    }

    /// Load a tree that a tree entry (or commit) points at. The null id is the empty tree.
    fn subtree(&self, id: &Digest) -> Result<Tree> {
        if id.is_null() {
            return Ok(Tree::new());
        }
        self.store.tree(id).map_err(|e| match e {
            Error::UnexpectedKind { id, found, .. } => {
                Error::CorruptTree(format!("tree entry points at {found} {id}"))
            }
            e => e,
        })
    }

    fn root_tree_id(&self, head: &Digest) -> Result<Digest> {
        Ok(self.store.commit(head)?.tree)
    }

    /// Follow `segments` down from `root` and return the entry at the end of them. Every segment
    /// but the last must name a tree.
    fn resolve<K: AsRef<str>>(&self, root: &Digest, segments: &[K]) -> Result<Entry> {
        let not_found = || Error::NotFound(format!("key {:?}", display_key(segments)));

        let mut entry = Entry::tree("", root.clone());
        for segment in segments {
            if !entry.is_tree() {
                return Err(not_found());
            }
            entry = self
                .subtree(&entry.id)?
                .get(segment.as_ref())
                .cloned()
                .ok_or_else(not_found)?;
        }
        Ok(entry)
    }

    /// The value stored under `key` at head.
    pub fn get<K: AsRef<str>>(&self, key: &[K]) -> Result<S::BlobReader> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let head = self.store.head()?;
        let entry = self.resolve(&self.root_tree_id(&head)?, key)?;
        if !entry.is_blob() {
            return Err(Error::NotFound(format!("key {:?}", display_key(key))));
        }
        self.store.blob(&entry.id)
    }

    /// Store `value` under `key` and move head to the resulting commit.
    ///
    /// `template` supplies the commit time and message; its tree and parents are replaced.
    /// Returns `Ok(None)` without writing a commit when the key already holds exactly `value`.
    pub fn set<K: AsRef<str>, R: Read>(
        &self,
        key: &[K],
        value: R,
        template: Commit,
    ) -> Result<Option<Digest>> {
        let head = self.head()?;
        let commit = self.commit_set(head.as_ref(), key, value, template)?;
        if let Some(commit) = &commit {
            self.store.write_head(commit)?;
        }
        Ok(commit)
    }

    /// Remove `key` (a value or a whole subtree) and move head to the resulting commit.
    pub fn remove<K: AsRef<str>>(&self, key: &[K], template: Commit) -> Result<Digest> {
        let head = self.head()?;
        let commit = self.commit_remove(head.as_ref(), key, template)?;
        self.store.write_head(&commit)?;
        Ok(commit)
    }

    /// Collect the trees along `key` below `head`'s root, stopping at the first segment that does
    /// not lead to another tree. `trees[i]` is the tree holding `key[i]`.
    fn descend<K: AsRef<str>>(&self, head: Option<&Digest>, key: &[K]) -> Result<Vec<Tree>> {
        let mut trees = Vec::with_capacity(key.len());
        let mut tree_id = match head {
            Some(head) => self.root_tree_id(head)?,
            None => return Ok(trees),
        };

        for segment in key {
            let tree = self.subtree(&tree_id)?;
            let next = tree.get(segment.as_ref()).filter(|e| e.is_tree()).map(|e| e.id.clone());
            trees.push(tree);
            match next {
                Some(id) => tree_id = id,
                None => break,
            }
        }
        Ok(trees)
    }

    /// Build (but do not publish) the commit that stores `value` under `key` on top of `head`.
    ///
    /// Head is taken as an argument rather than read, so the caller decides what this commit
    /// follows. Two transactions built on the same head each produce a valid commit, and
    /// whichever is written to head last wins.
    pub fn commit_set<K: AsRef<str>, R: Read>(
        &self,
        head: Option<&Digest>,
        key: &[K],
        value: R,
        mut template: Commit,
    ) -> Result<Option<Digest>> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let key: Vec<&str> = key.iter().map(AsRef::as_ref).collect();
        trace!(key=%display_key(&key), ?head, "Setting key");

        let mut trees = self.descend(head, &key)?;

        // A value cannot hold other keys. The leaf itself may be anything: a subtree there is
        // replaced by the new value.
        for (depth, tree) in trees.iter().enumerate().take(key.len() - 1) {
            if tree.get(key[depth]).map_or(false, Entry::is_blob) {
                return Err(Error::PathCollision(owned_key(&key[..=depth])));
            }
        }

        let blob_id = self.store.write_blob(value)?;

        // Walk back up, rewriting each tree that now points somewhere new.
        let mut child: Option<Digest> = None;
        for depth in (0..key.len()).rev() {
            let name = key[depth];
            let candidate = match child.take() {
                None => Entry::blob(name, blob_id.clone()),
                Some(id) => Entry::tree(name, id),
            };
            let is_leaf = candidate.is_blob();

            let mut tree = if trees.len() > depth {
                trees.pop().unwrap_or_default()
            } else {
                Tree::new()
            };

            if tree.get(name) == Some(&candidate) {
                if is_leaf {
                    trace!(key=%display_key(&key), "Value unchanged, nothing to commit");
                    return Ok(None);
                }
                // The child changed but its parent already points at the new child: the
                // trees on disk must have been inconsistent before we started.
                let parent = match depth {
                    0 => "root tree".to_owned(),
                    _ => format!("tree {:?}", display_key(&key[..depth])),
                };
                return Err(Error::CorruptTree(format!(
                    "{parent} already references updated child {}",
                    candidate.id
                )));
            }

            tree.insert(candidate);
            child = Some(self.store.write_tree(&tree)?);
        }

        let root = child.ok_or_else(|| Error::CorruptTree("no root tree written".into()))?;
        self.finish_commit(head, root, &mut template).map(Some)
    }

    /// Build (but do not publish) the commit that removes `key` from `head`. Trees left empty
    /// by the removal are removed from their parents too; the root tree may end up empty.
    pub fn commit_remove<K: AsRef<str>>(
        &self,
        head: Option<&Digest>,
        key: &[K],
        mut template: Commit,
    ) -> Result<Digest> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let key: Vec<&str> = key.iter().map(AsRef::as_ref).collect();
        trace!(key=%display_key(&key), ?head, "Removing key");

        let not_found = || Error::NotFound(format!("key {:?}", display_key(&key)));
        let head = head.ok_or_else(not_found)?;
        let mut trees = self.descend(Some(head), &key)?;
        let present = trees.len() == key.len()
            && trees
                .last()
                .map_or(false, |tree| tree.get(key[key.len() - 1]).is_some());
        if !present {
            return Err(not_found());
        }

        // `child` is what the entry at this depth becomes: `None` removes it.
        let mut child: Option<Digest> = None;
        for depth in (0..key.len()).rev() {
            let name = key[depth];
            let mut tree = trees.pop().unwrap_or_default();
            match child.take() {
                None => {
                    tree.remove(name);
                }
                Some(id) => {
                    tree.insert(Entry::tree(name, id));
                }
            }
            if tree.is_empty() && depth > 0 {
                continue;
            }
            child = Some(self.store.write_tree(&tree)?);
        }

        let root = child.ok_or_else(|| Error::CorruptTree("no root tree written".into()))?;
        self.finish_commit(Some(head), root, &mut template)
    }

    fn finish_commit(
        &self,
        head: Option<&Digest>,
        root: Digest,
        template: &mut Commit,
    ) -> Result<Digest> {
        template.tree = root;
        template.parents = head.into_iter().cloned().collect();
        let commit = self.store.write_commit(template)?;
        debug!(%commit, tree=%template.tree, "Created commit");
        Ok(commit)
    }

    /// Every `(key, blob id)` under `prefix` in the tree `root`, in ascending key order.
    pub fn keys<K: AsRef<str>>(&self, root: &Digest, prefix: &[K]) -> Result<Keys<'_, S>> {
        let entry = self.resolve(root, prefix)?;
        if !entry.is_tree() {
            return Err(Error::NotFound(format!(
                "{:?} is not a key prefix",
                display_key(prefix)
            )));
        }
        let tree = self.subtree(&entry.id)?;
        let prefix = prefix.iter().map(|s| s.as_ref().to_owned()).collect();
        Ok(Keys::new(self, prefix, tree))
    }

    /// [`Sugar::keys`] at head. An empty repository has no keys under any prefix.
    pub fn head_keys<K: AsRef<str>>(&self, prefix: &[K]) -> Result<Keys<'_, S>> {
        match self.head()? {
            Some(head) => self.keys(&self.root_tree_id(&head)?, prefix),
            None => {
                let prefix = prefix.iter().map(|s| s.as_ref().to_owned()).collect();
                Ok(Keys::new(self, prefix, Tree::new()))
            }
        }
    }

    /// Commits from head back through first parents.
    pub fn log(&self) -> Result<Log<'_, S>> {
        Ok(Log::new(self, self.head()?))
    }

    pub fn log_from(&self, commit: Digest) -> Log<'_, S> {
        Log::new(self, Some(commit))
    }
}

fn owned_key(key: &[&str]) -> Vec<String> {
    key.iter().map(|s| (*s).to_owned()).collect()
}
