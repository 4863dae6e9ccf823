//! Textual route patterns.
//!
//! # Grammar
//! ```text
//! pattern  := ( path_part+ '/'? | '/' ) '$'? ( '?' query ( '&' query )* )?
//! path_part:= '/' ( ':' ident schema?     parameter
//!                 | '*' ident             wildcard
//!                 | '[' literal ']'       optional segment
//!                 | literal )             static segment
//! query    := '[' ident schema? ']'       optional query value
//!           | ident schema?               required query value
//! schema   := '<' ident '>'               any | string | number | integer | boolean
//! ```
//!
//! Example: `/users/:id<integer>/[edit]$?tab&[page<integer>]`

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{all_consuming, map, map_res, opt, value},
    multi::{many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    Finish, IResult,
};

use crate::routing::matcher::{self, Matcher};
use crate::routing::route::RouteError;
use crate::routing::schema::Schema;

/// Parse a textual pattern into its matcher sequence.
pub fn parse_pattern(source: &str) -> Result<Vec<Matcher>, RouteError> {
    all_consuming(pattern)(source.trim())
        .finish()
        .map(|(_, matchers)| matchers)
        .map_err(|e| RouteError::Pattern {
            pattern: source.to_string(),
            reason: if e.input.is_empty() {
                "unexpected end of pattern".to_string()
            } else {
                format!("unexpected input at {:?}", e.input)
            },
        })
}

fn pattern(input: &str) -> IResult<&str, Vec<Matcher>> {
    let (input, mut matchers) = alt((
        terminated(many1(path_part), opt(char('/'))),
        value(vec![matcher::path("")], char('/')),
    ))(input)?;
    let (input, end) = opt(char('$'))(input)?;
    let (input, queries) = opt(preceded(char('?'), separated_list1(char('&'), query_part)))(input)?;

    matchers.extend(queries.unwrap_or_default());
    if end.is_some() {
        matchers.push(matcher::end());
    }
    Ok((input, matchers))
}

fn path_part(input: &str) -> IResult<&str, Matcher> {
    preceded(
        char('/'),
        alt((
            map(preceded(char(':'), pair(ident, schema)), |(name, schema)| {
                matcher::param(name, schema)
            }),
            map(preceded(char('*'), ident), |name| matcher::wildcard(name)),
            map(delimited(char('['), literal, char(']')), |segment| {
                matcher::optional(segment)
            }),
            map(literal, |segment| matcher::path(segment)),
        )),
    )(input)
}

fn query_part(input: &str) -> IResult<&str, Matcher> {
    alt((
        map(
            delimited(char('['), pair(ident, schema), char(']')),
            |(name, schema)| matcher::query_optional(name, schema),
        ),
        map(pair(ident, schema), |(name, schema)| matcher::query(name, schema)),
    ))(input)
}

fn schema(input: &str) -> IResult<&str, Schema> {
    map_res(
        opt(delimited(char('<'), ident, char('>'))),
        |name: Option<&str>| match name {
            None => Ok(Schema::any()),
            Some(name) => Schema::from_name(name).ok_or_else(|| format!("unknown schema {:?}", name)),
        },
    )(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)
}

fn literal(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        !matches!(
            c,
            '/' | '?' | '#' | '$' | '[' | ']' | ':' | '*' | '<' | '>' | '&'
        )
    })(input)
}
