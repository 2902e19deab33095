mod interface;

use std::io::{self, Write};

use color_eyre::eyre::{eyre, Context};
pub use color_eyre::Result;

use can::{display_key, Commit, Database, Sugar, Timestamp};
use clap::Parser;
use once_cell::sync::Lazy;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::prelude::*;

use crate::interface::*;

static ARGS: Lazy<Opt> = Lazy::new(Opt::parse);

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Lazy::force(&ARGS);

    if matches!(ARGS.command, Command::Init) {
        Database::init(&ARGS.dir)
            .wrap_err(format!("Could not create store at '{}'", ARGS.dir))?;
        return Ok(());
    }

    let database = Database::open(&ARGS.dir)?;
    let sugar = Sugar::new(&database);

    match &ARGS.command {
        Command::Init => unreachable!(),
        Command::Get { key } => {
            let mut value = sugar
                .get(&key.0)
                .wrap_err(format!("Could not read '{}'", display_key(&key.0)))?;
            let mut stdout = io::stdout().lock();
            io::copy(&mut value, &mut stdout).map_err(can::Error::from)?;
            stdout.flush()?;
        }
        Command::Set {
            message,
            key,
            value,
        } => {
            let template = Commit::new(Timestamp::now(), message.as_deref().unwrap_or_default());
            let commit = match value {
                Some(value) => sugar.set(&key.0, value.as_bytes(), template),
                None => sugar.set(&key.0, io::stdin().lock(), template),
            }
            .wrap_err(format!("Could not set '{}'", display_key(&key.0)))?;
            match commit {
                Some(commit) => println!("Created commit {}", commit.to_hex()),
                None => println!("Value unchanged, nothing to commit"),
            }
        }
        Command::Rm { message, key } => {
            let template = Commit::new(Timestamp::now(), message.as_deref().unwrap_or_default());
            let commit = sugar
                .remove(&key.0, template)
                .wrap_err(format!("Could not remove '{}'", display_key(&key.0)))?;
            println!("Created commit {}", commit.to_hex())
        }
        Command::Ls { prefix } => {
            let prefix = prefix.clone().unwrap_or_default();
            let mut stdout = io::stdout().lock();
            for item in sugar.head_keys(&prefix.0)? {
                let (key, id) = item?;
                writeln!(stdout, "{id:x}\t{}", display_key(&key))?;
            }
        }
        Command::Log => log(&sugar)?,
        Command::Show { object } => {
            let object = database.read(object)?;
            object.pretty_print(&mut io::stdout().lock())?;
        }
        Command::Fsck => fsck(&database)?,
    }
    Ok(())
}

fn log(sugar: &Sugar<&Database>) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for item in sugar.log()? {
        let (id, commit) = item?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(stdout, "commit {id:x}")?;
        stdout.reset()?;
        writeln!(stdout, "Date:   {}", commit.time)?;
        writeln!(stdout)?;
        for line in commit.message().split(|&b| b == b'\n') {
            write!(stdout, "    ")?;
            stdout.write_all(line)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn fsck(database: &Database) -> Result<()> {
    let mut checked = 0;
    let mut bad = 0;
    for oid in database.objects() {
        let oid = oid?;
        checked += 1;
        if let Err(e) = database.verify(&oid) {
            bad += 1;
            eprintln!("{oid:x}: {e}");
        }
    }

    // Everything reachable from head must also be present.
    let sugar = Sugar::new(database);
    for item in sugar.log()? {
        let (id, commit) = item.wrap_err("Broken history")?;
        for key in sugar.keys(&commit.tree, &[] as &[&str])? {
            key.wrap_err(format!("Broken tree in commit {id:x}"))?;
        }
    }

    if bad > 0 {
        return Err(eyre!("{bad} of {checked} objects are corrupt"));
    }
    println!("Checked {checked} objects");
    Ok(())
}
