use std::io::{self, Write};

use crate::object::{Storable, TREE_PREFIX};

impl Storable for super::Tree {
    /// `tree\n` followed by one `<kind> <hex id> <name length> <name>\n` line per entry, in name
    /// order.
    fn encode(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(TREE_PREFIX)?;
        for entry in &self.entries {
            write!(w, "{} {:x} {} ", entry.kind, entry.id, entry.name.len())?;
            w.write_all(entry.name.as_bytes())?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }
}
