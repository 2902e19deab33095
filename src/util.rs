use rand::distributions::Alphanumeric;
use rand::prelude::*;

/// A random name for a file in the staging area.
pub fn tmp_file_name(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();

    format!("{prefix}_{suffix}")
}

/// Join key segments for display, e.g. in log lines and the CLI.
pub fn display_key<S: AsRef<str>>(key: &[S]) -> String {
    key.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}
