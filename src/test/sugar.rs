use pretty_assertions::assert_eq;

use crate::test::*;
use crate::*;

fn get(sugar: &Sugar<impl ObjectStore>, key: &[&str]) -> Result<Vec<u8>> {
    read_all(sugar.get(key)?)
}

fn keys(sugar: &Sugar<impl ObjectStore>, prefix: &[&str]) -> Result<Vec<String>> {
    sugar
        .head_keys(prefix)?
        .map(|item| item.map(|(key, _)| display_key(&key)))
        .collect()
}

#[test]
/// Every set rewrites exactly the trees along its key, and nothing when the value is unchanged.
fn set_writes_only_the_path() -> Result<()> {
    let (_dir, database) = test_database()?;
    let store = CountingStore::new(&database);
    let sugar = Sugar::new(&store);

    assert!(sugar.set(&["foo"], &b"a"[..], template("1"))?.is_some());
    assert_eq!(store.trees(), 1);

    assert!(sugar.set(&["dir", "bar"], &b"b"[..], template("2"))?.is_some());
    assert_eq!(store.trees(), 3);

    assert!(sugar.set(&["fubar"], &b"c"[..], template("3"))?.is_some());
    assert_eq!(store.trees(), 4);

    assert_eq!(get(&sugar, &["foo"])?, b"a");
    assert_eq!(get(&sugar, &["dir", "bar"])?, b"b");
    assert_eq!(get(&sugar, &["fubar"])?, b"c");

    let head = database.head()?;
    assert_eq!(sugar.set(&["dir", "bar"], &b"b"[..], template("4"))?, None);
    assert_eq!(store.trees(), 4);
    assert_eq!(store.commits(), 3);
    assert_eq!(database.head()?, head);

    assert!(sugar.set(&["dir", "bar"], &b"d"[..], template("5"))?.is_some());
    assert_eq!(store.trees(), 6);
    assert_eq!(store.commits(), 4);
    assert_eq!(get(&sugar, &["dir", "bar"])?, b"d");
    Ok(())
}

#[test]
fn set_records_commit() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    let first = sugar.set(&["a"], &b"1"[..], template("first"))?.unwrap();
    let second = sugar.set(&["b"], &b"2"[..], template("second"))?.unwrap();
    assert_eq!(database.head()?, second);

    let commit = database.commit(&second)?;
    assert_eq!(commit.parents, vec![first.clone()]);
    assert_eq!(commit.time, COMMIT_TIME);
    assert_eq!(commit.message(), b"second");

    let root = database.tree(&commit.tree)?;
    assert_eq!(
        root.entries(),
        &[
            Entry::blob("a", Digest::new(b"blob\n1")),
            Entry::blob("b", Digest::new(b"blob\n2")),
        ]
    );

    // The first commit has no parent.
    assert_eq!(database.commit(&first)?.parents, vec![]);
    Ok(())
}

#[test]
/// A set leaves every other key, and every earlier snapshot, untouched.
fn isolation() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    sugar.set(&["dir", "x"], &b"1"[..], template(""))?;
    sugar.set(&["dir", "y"], &b"2"[..], template(""))?;
    let before = database.commit(&database.head()?)?.tree;
    sugar.set(&["dir", "x"], &b"3"[..], template(""))?;
    sugar.set(&["other"], &b"4"[..], template(""))?;

    assert_eq!(get(&sugar, &["dir", "x"])?, b"3");
    assert_eq!(get(&sugar, &["dir", "y"])?, b"2");

    let old = sugar
        .keys(&before, &[] as &[&str])?
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(
        old,
        vec![
            (vec!["dir".to_owned(), "x".to_owned()], Digest::new(b"blob\n1")),
            (vec!["dir".to_owned(), "y".to_owned()], Digest::new(b"blob\n2")),
        ]
    );
    Ok(())
}

#[test]
fn get_missing() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    // Nothing at all, not even a head.
    assert!(sugar.get(&["foo"]).map(drop).unwrap_err().is_not_found());

    sugar.set(&["dir", "bar"], &b"b"[..], template(""))?;
    sugar.set(&["foo"], &b"a"[..], template(""))?;

    let cases: [&[&str]; 4] = [&["nope"], &["dir"], &["dir", "nope"], &["foo", "bar"]];
    for key in cases {
        let err = sugar.get(key).map(drop).unwrap_err();
        assert!(err.is_not_found(), "{key:?}: {err:?}");
    }
    Ok(())
}

#[test]
fn empty_key() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);
    let key: &[&str] = &[];

    assert!(matches!(sugar.get(key).map(drop), Err(Error::EmptyKey)));
    assert!(matches!(
        sugar.set(key, &b"a"[..], template("")),
        Err(Error::EmptyKey)
    ));
    assert!(matches!(
        sugar.remove(key, template("")),
        Err(Error::EmptyKey)
    ));
    Ok(())
}

#[test]
/// Values cannot be nested under values.
fn path_collision() -> Result<()> {
    let (_dir, database) = test_database()?;
    let store = CountingStore::new(&database);
    let sugar = Sugar::new(&store);

    sugar.set(&["foo"], &b"a"[..], template(""))?;
    sugar.set(&["dir", "bar"], &b"b"[..], template(""))?;
    let head = database.head()?;
    let (blobs, trees, commits) = (store.blobs(), store.trees(), store.commits());

    match sugar.set(&["foo", "bar", "baz"], &b"x"[..], template("")) {
        Err(Error::PathCollision(key)) => assert_eq!(key, vec!["foo".to_owned()]),
        other => panic!("expected PathCollision, got {other:?}"),
    }
    match sugar.set(&["foo", "bar"], &b"x"[..], template("")) {
        Err(Error::PathCollision(key)) => assert_eq!(key, vec!["foo".to_owned()]),
        other => panic!("expected PathCollision, got {other:?}"),
    }

    // Nothing was written.
    assert_eq!(store.blobs(), blobs);
    assert_eq!(store.trees(), trees);
    assert_eq!(store.commits(), commits);
    assert_eq!(database.head()?, head);
    assert_eq!(get(&sugar, &["foo"])?, b"a");
    Ok(())
}

#[test]
/// A value set where a subtree used to be replaces the whole subtree.
fn set_over_subtree() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    sugar.set(&["dir", "x"], &b"1"[..], template(""))?;
    sugar.set(&["dir", "sub", "y"], &b"2"[..], template(""))?;
    sugar.set(&["other"], &b"3"[..], template(""))?;
    let before = database.head()?;

    let commit = sugar.set(&["dir"], &b"v"[..], template("flatten"))?.unwrap();
    assert_eq!(database.head()?, commit);
    assert_eq!(database.commit(&commit)?.parents, vec![before]);
    assert_eq!(get(&sugar, &["dir"])?, b"v");
    assert_eq!(keys(&sugar, &[])?, vec!["dir", "other"]);
    assert!(sugar.get(&["dir", "x"]).map(drop).unwrap_err().is_not_found());

    let root = database.tree(&database.commit(&commit)?.tree)?;
    assert_eq!(root.get("dir"), Some(&Entry::blob("dir", Digest::new(b"blob\nv"))));
    Ok(())
}

/// Serves one tree id with the contents of another, like a store whose trees disagree with
/// each other.
struct StaleTreeStore<'a> {
    inner: &'a Database,
    current: Digest,
    stale: Digest,
}

impl ObjectStore for StaleTreeStore<'_> {
    type BlobReader = BlobReader;

    fn head(&self) -> Result<Digest> {
        self.inner.head()
    }

    fn write_head(&self, id: &Digest) -> Result<()> {
        self.inner.write_head(id)
    }

    fn blob(&self, id: &Digest) -> Result<BlobReader> {
        self.inner.blob(id)
    }

    fn write_blob<R: std::io::Read>(&self, value: R) -> Result<Digest> {
        self.inner.write_blob(value)
    }

    fn tree(&self, id: &Digest) -> Result<Tree> {
        if *id == self.current {
            self.inner.tree(&self.stale)
        } else {
            self.inner.tree(id)
        }
    }

    fn write_tree(&self, tree: &Tree) -> Result<Digest> {
        self.inner.write_tree(tree)
    }

    fn commit(&self, id: &Digest) -> Result<Commit> {
        self.inner.commit(id)
    }

    fn write_commit(&self, commit: &Commit) -> Result<Digest> {
        self.inner.write_commit(commit)
    }
}

#[test]
/// The root already points at the tree the update produces, although the tree it was read
/// from did not hold the new value yet.
fn set_detects_inconsistent_parent() -> Result<()> {
    let (_dir, database) = test_database()?;

    let sugar = Sugar::new(&database);
    let old = sugar.set(&["a", "b"], &b"old"[..], template(""))?.unwrap();
    let new = sugar.set(&["a", "b"], &b"new"[..], template(""))?.unwrap();
    let subtree = |commit: &Digest| -> Result<Digest> {
        let root = database.tree(&database.commit(commit)?.tree)?;
        Ok(root.get("a").unwrap().id.clone())
    };

    let store = StaleTreeStore {
        inner: &database,
        current: subtree(&new)?,
        stale: subtree(&old)?,
    };
    let sugar = Sugar::new(&store);

    match sugar.set(&["a", "b"], &b"new"[..], template("")) {
        Err(Error::CorruptTree(message)) => {
            assert!(message.contains("root tree"), "{message}")
        }
        other => panic!("expected CorruptTree, got {other:?}"),
    }
    assert_eq!(database.head()?, new);
    Ok(())
}

#[test]
fn remove_prunes_empty_trees() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    sugar.set(&["a", "b", "c"], &b"1"[..], template(""))?;
    sugar.set(&["a", "d"], &b"2"[..], template(""))?;
    sugar.set(&["e"], &b"3"[..], template(""))?;

    let before = database.head()?;
    let commit = sugar.remove(&["a", "b", "c"], template("rm"))?;
    assert_eq!(database.head()?, commit);
    assert_eq!(database.commit(&commit)?.parents, vec![before]);
    assert_eq!(keys(&sugar, &[])?, vec!["a/d", "e"]);

    let root = database.tree(&database.commit(&commit)?.tree)?;
    let a = database.tree(&root.get("a").unwrap().id)?;
    assert_eq!(a.entries(), &[Entry::blob("d", Digest::new(b"blob\n2"))]);

    sugar.remove(&["a", "d"], template(""))?;
    assert_eq!(keys(&sugar, &[])?, vec!["e"]);

    // Removing the last key leaves an empty root tree.
    let commit = sugar.remove(&["e"], template(""))?;
    assert_eq!(database.commit(&commit)?.tree, Digest::new(b"tree\n"));
    assert_eq!(keys(&sugar, &[])?, Vec::<String>::new());
    Ok(())
}

#[test]
fn remove_subtree() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    sugar.set(&["dir", "x"], &b"1"[..], template(""))?;
    sugar.set(&["dir", "sub", "y"], &b"2"[..], template(""))?;
    sugar.set(&["z"], &b"3"[..], template(""))?;

    sugar.remove(&["dir"], template(""))?;
    assert_eq!(keys(&sugar, &[])?, vec!["z"]);
    Ok(())
}

#[test]
fn remove_missing() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    assert!(sugar.remove(&["foo"], template("")).unwrap_err().is_not_found());

    sugar.set(&["foo"], &b"a"[..], template(""))?;
    let head = database.head()?;
    let cases: [&[&str]; 3] = [&["nope"], &["foo", "bar"], &["nope", "bar"]];
    for key in cases {
        let err = sugar.remove(key, template("")).unwrap_err();
        assert!(err.is_not_found(), "{key:?}: {err:?}");
    }
    assert_eq!(database.head()?, head);
    Ok(())
}

#[test]
fn keys_in_order() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    assert_eq!(keys(&sugar, &[])?, Vec::<String>::new());
    assert_eq!(keys(&sugar, &["anything"])?, Vec::<String>::new());

    let cases: [&[&str]; 5] = [&["b"], &["a", "z"], &["a b"], &["a", "b", "c"], &["a", "b", "a"]];
    for key in cases {
        sugar.set(key, &b"v"[..], template(""))?;
    }

    assert_eq!(
        keys(&sugar, &[])?,
        vec!["a/b/a", "a/b/c", "a/z", "a b", "b"]
    );
    assert_eq!(keys(&sugar, &["a"])?, vec!["a/b/a", "a/b/c", "a/z"]);
    assert_eq!(keys(&sugar, &["a", "b"])?, vec!["a/b/a", "a/b/c"]);

    // A prefix must name a tree.
    assert!(sugar.head_keys(&["b"]).map(drop).unwrap_err().is_not_found());
    assert!(sugar.head_keys(&["c"]).map(drop).unwrap_err().is_not_found());
    assert!(sugar.head_keys(&["b", "c"]).map(drop).unwrap_err().is_not_found());
    Ok(())
}

#[test]
/// A tree entry that points at something other than a tree is reported once, then iteration
/// stops.
fn keys_stop_at_corrupt_tree() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    let blob = database.write_blob(&b"v"[..])?;
    let root = database.write_tree(&Tree::from_entries([
        Entry::blob("a", blob.clone()),
        Entry::tree("b", blob.clone()),
        Entry::blob("c", blob.clone()),
    ]))?;

    let mut keys = sugar.keys(&root, &[] as &[&str])?;
    assert_eq!(keys.next().unwrap()?, (vec!["a".to_owned()], blob));
    assert!(matches!(keys.next(), Some(Err(Error::CorruptTree(_)))));
    assert!(keys.next().is_none());
    assert!(keys.next().is_none());
    Ok(())
}

#[test]
/// Two transactions built on the same head both succeed; whichever is published last wins and
/// the other's change is lost from head.
fn explicit_head_race() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    let base = sugar.set(&["x"], &b"1"[..], template(""))?.unwrap();

    let left = sugar
        .commit_set(Some(&base), &["y"], &b"2"[..], template("left"))?
        .unwrap();
    let right = sugar
        .commit_set(Some(&base), &["z"], &b"3"[..], template("right"))?
        .unwrap();

    // Building a commit does not publish it.
    assert_eq!(database.head()?, base);
    assert_eq!(database.commit(&left)?.parents, vec![base.clone()]);
    assert_eq!(database.commit(&right)?.parents, vec![base.clone()]);

    database.write_head(&left)?;
    database.write_head(&right)?;
    assert_eq!(keys(&sugar, &[])?, vec!["x", "z"]);
    assert!(sugar.get(&["y"]).map(drop).unwrap_err().is_not_found());

    // The losing commit is still intact, just unreachable from head.
    let lost = sugar
        .keys(&database.commit(&left)?.tree, &[] as &[&str])?
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(lost.len(), 2);

    // Starting from no head at all gives a root commit.
    let orphan = sugar
        .commit_set(None, &["only"], &b"4"[..], template(""))?
        .unwrap();
    assert!(database.commit(&orphan)?.parents.is_empty());
    Ok(())
}

#[test]
fn log_follows_first_parents() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    assert_eq!(sugar.log()?.count(), 0);

    let first = sugar.set(&["a"], &b"1"[..], template("first"))?.unwrap();
    let second = sugar.set(&["a"], &b"2"[..], template("second"))?.unwrap();
    let third = sugar.remove(&["a"], template("third"))?;

    let log = sugar.log()?.collect::<Result<Vec<_>>>()?;
    let ids: Vec<_> = log.iter().map(|(id, _)| id.clone()).collect();
    let messages: Vec<_> = log.iter().map(|(_, commit)| commit.message().to_vec()).collect();
    assert_eq!(ids, vec![third, second.clone(), first.clone()]);
    assert_eq!(
        messages,
        vec![b"third".to_vec(), b"second".to_vec(), b"first".to_vec()]
    );

    let ids = sugar
        .log_from(second)
        .map(|item| item.map(|(id, _)| id))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[1], first);
    Ok(())
}

#[test]
fn log_reports_missing_commit() -> Result<()> {
    let (_dir, database) = test_database()?;
    let sugar = Sugar::new(&database);

    let mut log = sugar.log_from(Digest::new(b"commit\nnever written"));
    assert!(log.next().unwrap().unwrap_err().is_not_found());
    assert!(log.next().is_none());
    Ok(())
}
