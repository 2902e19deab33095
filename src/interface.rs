use std::convert::Infallible;
use std::str::FromStr;

use camino::Utf8PathBuf;
use clap::Parser;
use clap::Subcommand;

use can::Digest;

/// A `/` separated key, e.g. `users/alice/email`.
#[derive(Clone, Debug, Default)]
pub struct Key(pub Vec<String>);

impl FromStr for Key {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            s.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Create an empty store
    Init,

    /// Write the value stored under `key` to stdout
    Get {
        #[arg(value_name = "key")]
        key: Key,
    },

    /// Store a value under `key` and commit it
    Set {
        #[arg(short, long, env = "CAN_MESSAGE")]
        message: Option<String>,

        #[arg(value_name = "key")]
        key: Key,

        /// Read from stdin if not given
        #[arg(value_name = "value")]
        value: Option<String>,
    },

    /// Remove `key`, or everything below it, and commit
    Rm {
        #[arg(short, long, env = "CAN_MESSAGE")]
        message: Option<String>,

        #[arg(value_name = "key")]
        key: Key,
    },

    /// List every key below `prefix` with the id of its value
    Ls {
        #[arg(value_name = "prefix")]
        prefix: Option<Key>,
    },

    /// Show the commit history from head
    Log,

    /// Pretty-print any object
    Show {
        #[arg(value_name = "object")]
        object: Digest,
    },

    /// Check that every object in the store hashes to its id and decodes
    Fsck,
}

#[derive(Debug, Parser)]
#[command(name = "can")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,

    /// The directory holding the store.
    #[arg(short, long, env = "CAN_DIR", default_value = "./can")]
    pub dir: Utf8PathBuf,
}
