mod parser;

pub use parser::{command, Command};

use chumsky::prelude::*;

use parser::blank;

/// Commands separated by `;` or newlines. `--` starts a comment running to
/// the end of the line; inside a quoted path it is plain text.
pub fn script<'a>() -> impl Parser<'a, &'a str, Vec<Command>, extra::Err<Rich<'a, char>>> {
    let comment = just("--").then(none_of("\n").repeated()).ignored();
    let separator = choice((one_of(";\n").ignored(), comment)).padded_by(blank());

    command()
        .or_not()
        .separated_by(separator)
        .collect::<Vec<Option<Command>>>()
        .map(|commands| commands.into_iter().flatten().collect())
        .padded_by(blank())
}

/// Parse a script of commands
pub fn parse(input: &str) -> Result<Vec<Command>, String> {
    script().then_ignore(end()).parse(input).into_result().map_err(|errs| {
        let offset = errs.first().map_or(0, |e| e.span().start);
        let line = input[..offset].matches('\n').count() + 1;
        format!("Parser errors on line {}: {:?}", line, errs)
    })
}
