//! A content-addressed key-value store laid out like a git object database.
//!
//! Values are stored as blobs, key hierarchies as trees, and every change as a commit whose id
//! is recorded in a single head file. [`Sugar`] is the key-value API; [`Database`] is the store
//! it runs on.

#[cfg(test)]
mod test;

mod blob;
mod commit;
mod database;
mod digest;
mod error;
mod hashing;
mod object;
mod staging;
mod store;
mod sugar;
mod timestamp;
mod tree;
mod util;

pub use crate::blob::{decode as decode_blob, encode as encode_blob, Blob};
pub use crate::commit::Commit;
pub use crate::database::{BlobReader, Database};
pub use crate::digest::Digest;
pub use crate::error::{Error, OptionalExt, Result};
pub use crate::object::{Object, ObjectKind, Storable};
pub use crate::store::ObjectStore;
pub use crate::sugar::{Keys, Log, Sugar};
pub use crate::timestamp::Timestamp;
pub use crate::tree::{Entry, EntryKind, Tree};
pub use crate::util::display_key;
