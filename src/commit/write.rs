use std::io::{self, Write};

use crate::object::{Storable, COMMIT_PREFIX};

impl Storable for super::Commit {
    fn encode(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(COMMIT_PREFIX)?;
        writeln!(w, "tree {:x}", self.tree)?;
        for parent in &self.parents {
            writeln!(w, "parent {parent:x}")?;
        }
        // The offset is always signed: `+0`, `+3600`, `-1234`.
        writeln!(w, "time {} {:+}", self.time.unix, self.time.offset)?;
        w.write_all(b"\n")?;
        w.write_all(self.message())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use crate::commit::Commit;
    use crate::digest::Digest;
    use crate::object::Storable;
    use crate::timestamp::Timestamp;

    fn id(s: &str) -> Digest {
        Digest::from_str(s).unwrap()
    }

    fn sample() -> Commit {
        Commit {
            tree: id("0123456789"),
            parents: vec![id("0123"), id("45"), id("6789")],
            time: Timestamp::new(1424434473, 3600),
            message: Some(b"hi,\n\nhow are you?".to_vec()),
        }
    }

    #[test]
    fn test_commit_format() {
        let cases = [
            (
                Commit::default(),
                "commit\ntree \ntime -62135596800 +0\n\n",
            ),
            (
                sample(),
                "commit\ntree 0123456789\nparent 0123\nparent 45\nparent 6789\ntime 1424434473 +3600\n\nhi,\n\nhow are you?",
            ),
            (
                Commit {
                    parents: vec![id("6789"), id("45")],
                    time: Timestamp::new(1424434473, -1234),
                    ..sample()
                },
                "commit\ntree 0123456789\nparent 6789\nparent 45\ntime 1424434473 -1234\n\nhi,\n\nhow are you?",
            ),
        ];

        for (commit, want) in cases {
            assert_eq!(String::from_utf8(commit.to_bytes()).unwrap(), want);
            assert_eq!(Commit::decode(want.as_bytes()).unwrap(), commit);
        }
    }

    #[test]
    fn test_commit_oid() {
        assert_eq!(
            sample().oid().to_hex(),
            "04f81807bae3f1091ef8c7feb475430432cfd7e3"
        );
        let other_tree = Commit {
            tree: id("23456789"),
            ..sample()
        };
        assert_eq!(
            other_tree.oid().to_hex(),
            "54623d8bce90c016793a6c759484a4aa4044d6a0"
        );
    }
}
