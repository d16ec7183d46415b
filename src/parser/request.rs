// Chart request parser
// Format: kind(x: col, y: col), selections optional and in any order

use std::str::FromStr;

use super::lexer::{identifier, string_literal, ws};
use crate::error::{ChartError, ChartResult};
use crate::ir::{Axis, ChartKind, ChartRequest};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{opt, value},
    multi::separated_list0,
    sequence::{delimited, pair, preceded},
    IResult,
};

/// A request as written, before the kind name is checked
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSyntax {
    pub kind: String,
    pub selections: Vec<(Axis, String)>,
}

impl RequestSyntax {
    /// Check the kind name and fold selections into a request.
    /// A selection given twice is rejected.
    pub fn into_request(self) -> ChartResult<ChartRequest> {
        let kind = ChartKind::from_str(&self.kind)?;
        let mut request = ChartRequest::new(kind);

        for (axis, column) in self.selections {
            let slot = match axis {
                Axis::X => &mut request.x_column,
                Axis::Y => &mut request.y_column,
            };
            if slot.is_some() {
                return Err(ChartError::parse(format!("{} column given more than once", axis)));
            }
            *slot = Some(column);
        }

        Ok(request)
    }
}

/// Column reference: bare identifier or quoted string
pub fn column_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

fn selection(input: &str) -> IResult<&str, (Axis, String)> {
    pair(
        ws(alt((value(Axis::X, tag("x")), value(Axis::Y, tag("y"))))),
        preceded(ws(char(':')), ws(column_name)),
    )(input)
}

/// Parse `kind`, `kind()` or `kind(x: a, y: b)`
pub fn request_syntax(input: &str) -> IResult<&str, RequestSyntax> {
    let (input, kind) = ws(identifier)(input)?;
    let (input, selections) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), selection),
        ws(char(')')),
    ))(input)?;

    Ok((
        input,
        RequestSyntax {
            kind,
            selections: selections.unwrap_or_default(),
        },
    ))
}

/// Parse a complete chart request
pub fn parse_request(input: &str) -> ChartResult<ChartRequest> {
    match request_syntax(input) {
        Ok((remaining, syntax)) if remaining.trim().is_empty() => syntax.into_request(),
        Ok((remaining, _)) => Err(unparsed(remaining)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unparsed(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ChartError::parse("incomplete chart request")),
    }
}

pub(crate) fn unparsed(remaining: &str) -> ChartError {
    if remaining.trim().is_empty() {
        ChartError::parse("unexpected end of input")
    } else {
        ChartError::parse(format!("unexpected input at '{}'", remaining.trim()))
    }
}
