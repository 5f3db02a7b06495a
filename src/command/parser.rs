use chumsky::{prelude::*, regex::regex};

use crate::btree::TreeKey;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // INSERT key [,] key ...
    Insert(Vec<TreeKey>),

    // CONTAINS key
    Contains(TreeKey),

    // SEARCH key
    Search(TreeKey),

    // DUMP
    Dump,

    // LEVELS
    Levels,

    // STATS
    Stats,

    // CHECK
    Check,

    // NEW degree key
    New { degree: usize, key: TreeKey },

    // SAVE 'path'
    Save(String),

    // LOAD 'path'
    Load(String),

    // IMPORT 'path'
    Import(String),

    // HELP
    Help,

    // EXIT | QUIT
    Exit,
}

/// Spaces and tabs; newlines separate commands
pub(crate) fn blank<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> + Clone {
    one_of(" \t\r").repeated()
}

fn key<'a>() -> impl Parser<'a, &'a str, TreeKey, extra::Err<Rich<'a, char>>> {
    regex(r"-?\d+")
        .try_map(|s: &str, span| {
            s.parse::<TreeKey>()
                .map_err(|e| Rich::custom(span, format!("invalid key {}: {}", s, e)))
        })
        .padded_by(blank())
}

fn degree<'a>() -> impl Parser<'a, &'a str, usize, extra::Err<Rich<'a, char>>> {
    regex(r"\d+")
        .try_map(|s: &str, span| {
            s.parse::<usize>()
                .map_err(|e| Rich::custom(span, format!("invalid degree {}: {}", s, e)))
        })
        .padded_by(blank())
}

fn path<'a>() -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> {
    // Quoted verbatim: backslashes are kept and a path cannot contain `'`
    regex(r"'[^'\n]*'")
        .map(|s: &str| s[1..s.len() - 1].to_string())
        .padded_by(blank())
}

/// A single command, without its terminator
pub fn command<'a>() -> impl Parser<'a, &'a str, Command, extra::Err<Rich<'a, char>>> {
    let insert = regex(r"(?i)INSERT\b")
        .padded_by(blank())
        .ignore_then(
            key()
                .separated_by(just(',').padded_by(blank()).or_not())
                .at_least(1)
                .collect::<Vec<TreeKey>>(),
        )
        .map(Command::Insert);

    let contains = regex(r"(?i)CONTAINS\b")
        .padded_by(blank())
        .ignore_then(key())
        .map(Command::Contains);

    let search = regex(r"(?i)SEARCH\b")
        .padded_by(blank())
        .ignore_then(key())
        .map(Command::Search);

    let new_tree = regex(r"(?i)NEW\b")
        .padded_by(blank())
        .ignore_then(degree())
        .then(key())
        .map(|(degree, key)| Command::New { degree, key });

    let save = regex(r"(?i)SAVE\b")
        .padded_by(blank())
        .ignore_then(path())
        .map(Command::Save);

    let load = regex(r"(?i)LOAD\b")
        .padded_by(blank())
        .ignore_then(path())
        .map(Command::Load);

    let import = regex(r"(?i)IMPORT\b")
        .padded_by(blank())
        .ignore_then(path())
        .map(Command::Import);

    let dump = regex(r"(?i)DUMP\b").to(Command::Dump).padded_by(blank());
    let levels = regex(r"(?i)LEVELS\b").to(Command::Levels).padded_by(blank());
    let stats = regex(r"(?i)STATS\b").to(Command::Stats).padded_by(blank());
    let check = regex(r"(?i)CHECK\b").to(Command::Check).padded_by(blank());
    let help = regex(r"(?i)HELP\b").to(Command::Help).padded_by(blank());
    let exit = regex(r"(?i)(?:EXIT|QUIT)\b").to(Command::Exit).padded_by(blank());

    choice((
        insert, contains, search, new_tree, save, load, import, dump, levels, stats, check, help,
        exit,
    ))
}
