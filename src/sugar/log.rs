use std::iter::FusedIterator;

use crate::commit::Commit;
use crate::digest::Digest;
use crate::error::Result;
use crate::store::ObjectStore;

use super::Sugar;

/// Walks commits back through their first parents. Stops after the root commit or the first
/// error.
pub struct Log<'a, S> {
    sugar: &'a Sugar<S>,
    next: Option<Digest>,
}

impl<'a, S: ObjectStore> Log<'a, S> {
    pub(super) fn new(sugar: &'a Sugar<S>, start: Option<Digest>) -> Self {
        Self { sugar, next: start }
    }
}

impl<S: ObjectStore> Iterator for Log<'_, S> {
    type Item = Result<(Digest, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.sugar.store().commit(&id) {
            Ok(commit) => {
                self.next = commit.parent().cloned();
                Some(Ok((id, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<S: ObjectStore> FusedIterator for Log<'_, S> {}
