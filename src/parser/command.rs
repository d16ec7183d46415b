// Session command parser

use super::lexer::{number_literal, string_literal, ws};
use super::request::{request_syntax, unparsed};
use crate::error::{ChartError, ChartResult};
use crate::ir::ChartRequest;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace1},
    combinator::{eof, map, opt, peek, rest, value, verify},
    sequence::{pair, preceded, terminated},
    IResult,
};

pub const DEFAULT_HEAD_ROWS: usize = 5;

/// One line of an interactive session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Upload a CSV file, replacing the current dataset on success
    Load(String),
    Columns,
    Head(usize),
    Describe,
    /// Render a chart, to a file when a path is given
    Plot {
        request: ChartRequest,
        output: Option<String>,
    },
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  load <path>                 load a CSV file
  columns                     list column names
  head [n]                    show the first n rows (default 5)
  describe                    summary statistics
  plot <request> [> <path>]   render a chart, e.g. plot bar(x: day, y: sales) > sales.png
  help                        show this message
  quit | exit                 leave the session
chart kinds: scatter, line, bar, histogram, boxplot, heatmap";

/// A keyword followed by whitespace or the end of input
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), peek(alt((multispace1, eof))))
}

/// Quoted path, or the rest of the line
fn path(input: &str) -> IResult<&str, String> {
    alt((
        string_literal,
        map(verify(rest, |s: &str| !s.trim().is_empty()), |s: &str| s.trim().to_string()),
    ))(input)
}

fn command(input: &str) -> IResult<&str, ChartResult<SessionCommand>> {
    alt((
        map(preceded(keyword("load"), ws(path)), |p| Ok(SessionCommand::Load(p))),
        value(Ok(SessionCommand::Columns), keyword("columns")),
        map(preceded(keyword("head"), opt(ws(number_literal))), |n| {
            Ok(SessionCommand::Head(n.unwrap_or(DEFAULT_HEAD_ROWS)))
        }),
        value(Ok(SessionCommand::Describe), keyword("describe")),
        map(
            pair(
                preceded(keyword("plot"), request_syntax),
                opt(preceded(ws(char('>')), ws(path))),
            ),
            |(syntax, output)| {
                syntax
                    .into_request()
                    .map(|request| SessionCommand::Plot { request, output })
            },
        ),
        value(Ok(SessionCommand::Help), keyword("help")),
        value(Ok(SessionCommand::Quit), alt((keyword("quit"), keyword("exit")))),
    ))(input)
}

/// Parse one session line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> ChartResult<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    match ws(command)(line) {
        Ok((remaining, parsed)) if remaining.is_empty() => parsed.map(Some),
        Ok((remaining, _)) => Err(unparsed(remaining)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) if e.input == line => {
            let word = line.split_whitespace().next().unwrap_or(line);
            Err(ChartError::parse(format!("unknown command '{}' (try 'help')", word)))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unparsed(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ChartError::parse("incomplete command")),
    }
}
