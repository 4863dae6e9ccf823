//! Matcher primitives.
//!
//! # Responsibilities
//! - Define the atomic URL grammar units (static, param, optional, wildcard,
//!   query, end)
//! - Parse one step of a pathname, yielding the remaining input and an
//!   optional capture
//! - Build the inverse URL fragment from a parameter bag
//!
//! # Design Decisions
//! - Token-level parsing uses `nom` combinators; each matcher is one step
//! - Static segments compare whole, percent-decoded segments (`/x` never
//!   matches `/xyz`, `/a!b` and `/a%21b` both match `a!b`)
//! - Parameter validation failure is a step error, never a panic
//! - Query matchers consume nothing; they are validated by the engine

use std::borrow::Cow;
use std::fmt;

use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    combinator::eof,
    multi::many1,
    sequence::preceded,
    IResult,
};
use thiserror::Error;

use crate::routing::params::{ParamValue, Params};
use crate::routing::schema::Schema;

/// A named value captured by one parse step.
pub type Capture = Option<(String, ParamValue)>;

/// Why a single parse step did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("path does not match")]
    NoMatch,
    #[error("parameter {name:?} rejected: {reason}")]
    Invalid { name: String, reason: String },
}

/// Discriminant of a [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    StaticPath,
    Parameter,
    OptionalPath,
    Wildcard,
    Query,
    Terminator,
}

/// One unit of URL grammar.
#[derive(Debug, Clone)]
pub enum Matcher {
    Static(String),
    Param { name: String, schema: Schema },
    Optional(String),
    Wildcard(String),
    Query { name: String, schema: Schema },
    End,
}

/// Literal segment. `path("")` is the root matcher.
pub fn path(segment: impl Into<String>) -> Matcher {
    Matcher::Static(segment.into().trim_matches('/').to_string())
}

pub fn param(name: impl Into<String>, schema: Schema) -> Matcher {
    Matcher::Param {
        name: name.into(),
        schema,
    }
}

/// Segment that may be present or not; captured as a flag under its own name.
pub fn optional(segment: impl Into<String>) -> Matcher {
    Matcher::Optional(segment.into().trim_matches('/').to_string())
}

/// One or more trailing segments, captured as a list.
pub fn wildcard(name: impl Into<String>) -> Matcher {
    Matcher::Wildcard(name.into())
}

/// Required query value.
pub fn query(name: impl Into<String>, schema: Schema) -> Matcher {
    Matcher::Query {
        name: name.into(),
        schema,
    }
}

pub fn query_optional(name: impl Into<String>, schema: Schema) -> Matcher {
    query(name, schema.optional())
}

/// Succeeds only when the whole path has been consumed.
pub fn end() -> Matcher {
    Matcher::End
}

impl Matcher {
    pub fn kind(&self) -> MatcherKind {
        match self {
            Matcher::Static(_) => MatcherKind::StaticPath,
            Matcher::Param { .. } => MatcherKind::Parameter,
            Matcher::Optional(_) => MatcherKind::OptionalPath,
            Matcher::Wildcard(_) => MatcherKind::Wildcard,
            Matcher::Query { .. } => MatcherKind::Query,
            Matcher::End => MatcherKind::Terminator,
        }
    }

    /// Name under which this matcher captures, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Matcher::Param { name, .. } | Matcher::Query { name, .. } => Some(name),
            Matcher::Optional(segment) => Some(segment),
            Matcher::Wildcard(name) => Some(name),
            Matcher::Static(_) | Matcher::End => None,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        match self {
            Matcher::Param { schema, .. } | Matcher::Query { schema, .. } => Some(schema),
            _ => None,
        }
    }

    /// Whether this matcher takes part in the path parser.
    pub fn consumes_path(&self) -> bool {
        !matches!(self, Matcher::Query { .. })
    }

    /// Run one parse step against the remaining pathname.
    pub fn parse<'a>(&self, input: &'a str) -> Result<(&'a str, Capture), StepError> {
        match self {
            Matcher::Static(segment) if segment.is_empty() => {
                let rest = if input == "/" { "" } else { input };
                Ok((rest, None))
            }
            Matcher::Static(segment) => literal(segment, input)
                .map(|rest| (rest, None))
                .ok_or(StepError::NoMatch),
            Matcher::Param { name, schema } => {
                let (rest, raw) = segment(input).map_err(|_| StepError::NoMatch)?;
                let token = decode_token(name, raw)?;
                match schema.validate(Some(ParamValue::coerce(&token))) {
                    Ok(Some(value)) => Ok((rest, Some((name.clone(), value)))),
                    Ok(None) => Ok((rest, None)),
                    Err(e) => Err(StepError::Invalid {
                        name: name.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
            Matcher::Optional(segment) => {
                let (rest, found) = match literal(segment, input) {
                    Some(rest) => (rest, true),
                    None => (input, false),
                };
                Ok((rest, Some((segment.clone(), ParamValue::Flag(found)))))
            }
            Matcher::Wildcard(name) => {
                let (rest, raw) = many1(segment)(input).map_err(|_| StepError::NoMatch)?;
                let tokens = raw
                    .into_iter()
                    .map(|token| decode_token(name, token))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((rest, Some((name.clone(), ParamValue::List(tokens)))))
            }
            Matcher::Query { .. } => Ok((input, None)),
            Matcher::End => eof::<_, nom::error::Error<&str>>(input)
                .map(|(rest, _)| (rest, None))
                .map_err(|_| StepError::NoMatch),
        }
    }

    /// Build this matcher's path fragment, or `None` if a required value is
    /// missing or invalid. Query matchers check their value the same way but
    /// contribute an empty fragment.
    pub fn build(&self, params: &Params) -> Option<String> {
        match self {
            Matcher::Static(segment) if segment.is_empty() => Some(String::new()),
            Matcher::Static(segment) => Some(format!("/{}", urlencoding::encode(segment))),
            Matcher::Param { name, schema } => {
                let value = schema.validate(params.get(name).cloned()).ok()??;
                let rendered = value.to_segment()?;
                if rendered.is_empty() {
                    return None;
                }
                Some(format!("/{}", urlencoding::encode(&rendered)))
            }
            Matcher::Optional(segment) => match params.get(segment) {
                Some(ParamValue::Flag(true)) => Some(format!("/{}", urlencoding::encode(segment))),
                _ => Some(String::new()),
            },
            Matcher::Wildcard(name) => {
                let tokens: Vec<Cow<'_, str>> = match params.get(name)? {
                    ParamValue::List(items) => items.iter().map(|s| Cow::Borrowed(s.as_str())).collect(),
                    ParamValue::Text(s) => s
                        .split('/')
                        .filter(|t| !t.is_empty())
                        .map(Cow::Borrowed)
                        .collect(),
                    other => vec![Cow::Owned(other.to_string())],
                };
                if tokens.is_empty() || tokens.iter().any(|t| t.is_empty()) {
                    return None;
                }
                Some(
                    tokens
                        .iter()
                        .map(|t| format!("/{}", urlencoding::encode(t)))
                        .collect(),
                )
            }
            Matcher::Query { name, schema } => {
                schema.validate(params.get(name).cloned()).ok()?;
                Some(String::new())
            }
            Matcher::End => Some(String::new()),
        }
    }

    /// Query pair contributed by a query matcher whose value is present.
    pub fn build_query(&self, params: &Params) -> Option<(String, String)> {
        match self {
            Matcher::Query { name, .. } => params.get(name).map(|value| {
                let rendered = match value {
                    ParamValue::List(items) => items.join(","),
                    other => other.to_string(),
                };
                (name.clone(), rendered)
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema_suffix = |schema: &Schema| {
            schema
                .name()
                .map(|name| format!("<{}>", name))
                .unwrap_or_default()
        };
        match self {
            Matcher::Static(segment) if segment.is_empty() => Ok(()),
            Matcher::Static(segment) => write!(f, "/{}", segment),
            Matcher::Param { name, schema } => write!(f, "/:{}{}", name, schema_suffix(schema)),
            Matcher::Optional(segment) => write!(f, "/[{}]", segment),
            Matcher::Wildcard(name) => write!(f, "/*{}", name),
            Matcher::Query { name, schema } if schema.is_optional() => {
                write!(f, "[{}{}]", name, schema_suffix(schema))
            }
            Matcher::Query { name, schema } => write!(f, "{}{}", name, schema_suffix(schema)),
            Matcher::End => f.write_str("$"),
        }
    }
}

/// `/` followed by one non-empty, non-separator token.
fn segment(input: &str) -> IResult<&str, &str> {
    preceded(char('/'), take_while1(|c: char| c != '/'))(input)
}

/// One whole segment equal to `expected` once percent-decoded. Returns the
/// remaining input.
fn literal<'a>(expected: &str, input: &'a str) -> Option<&'a str> {
    let (rest, raw) = segment(input).ok()?;
    let decoded = urlencoding::decode(raw).ok()?;
    (decoded == expected).then_some(rest)
}

fn decode_token(name: &str, raw: &str) -> Result<String, StepError> {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|e| StepError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn test_static_requires_boundary() {
        let m = path("users");
        assert_eq!(m.parse("/users/42").unwrap().0, "/42");
        assert_eq!(m.parse("/users").unwrap().0, "");
        assert_eq!(m.parse("/usersx"), Err(StepError::NoMatch));
        assert_eq!(m.parse("/other"), Err(StepError::NoMatch));
    }

    #[test]
    fn test_root_matcher() {
        let root = path("");
        assert_eq!(root.parse("/").unwrap().0, "");
        assert_eq!(root.parse("/users").unwrap().0, "/users");
        assert_eq!(root.build(&params! {}).as_deref(), Some(""));
    }

    #[test]
    fn test_param_coercion_and_validation() {
        let m = param("id", Schema::integer());
        let (rest, capture) = m.parse("/42/edit").unwrap();
        assert_eq!(rest, "/edit");
        assert_eq!(capture, Some(("id".to_string(), ParamValue::Number(42.0))));

        assert!(matches!(m.parse("/abc"), Err(StepError::Invalid { .. })));
        assert_eq!(m.parse("/"), Err(StepError::NoMatch));

        let slug = param("slug", Schema::any());
        let (_, capture) = slug.parse("/hello%20world").unwrap();
        assert_eq!(capture.unwrap().1, ParamValue::Text("hello world".into()));
    }

    #[test]
    fn test_optional_segment() {
        let m = optional("edit");
        let (rest, capture) = m.parse("/edit").unwrap();
        assert_eq!(rest, "");
        assert_eq!(capture.unwrap().1, ParamValue::Flag(true));

        let (rest, capture) = m.parse("/view").unwrap();
        assert_eq!(rest, "/view");
        assert_eq!(capture.unwrap().1, ParamValue::Flag(false));
    }

    #[test]
    fn test_wildcard_collects_segments() {
        let m = wildcard("segments");
        let (rest, capture) = m.parse("/a/b/c").unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            capture.unwrap().1,
            ParamValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(m.parse(""), Err(StepError::NoMatch));
    }

    #[test]
    fn test_end_and_query_steps() {
        assert!(end().parse("").is_ok());
        assert_eq!(end().parse("/more"), Err(StepError::NoMatch));
        assert_eq!(query("q", Schema::any()).parse("/x").unwrap().0, "/x");
    }

    #[test]
    fn test_build_fragments() {
        let bag = params! { "id" => 42, "rest" => vec!["a b", "c"], "edit" => true, "q" => "x" };
        assert_eq!(param("id", Schema::number()).build(&bag).as_deref(), Some("/42"));
        assert_eq!(param("missing", Schema::any()).build(&bag), None);
        assert_eq!(wildcard("rest").build(&bag).as_deref(), Some("/a%20b/c"));
        assert_eq!(optional("edit").build(&bag).as_deref(), Some("/edit"));
        assert_eq!(optional("view").build(&bag).as_deref(), Some(""));
        assert_eq!(
            query("q", Schema::any()).build_query(&bag),
            Some(("q".to_string(), "x".to_string()))
        );
    }

    #[test]
    fn test_static_segment_with_sub_delimiters() {
        for literal in ["a!b", "x:y", "k=v", "me@host", "c+d", "1,2"] {
            let m = path(literal);
            let raw = format!("/{}/rest", literal);
            assert_eq!(m.parse(&raw).unwrap().0, "/rest", "{}", literal);

            let built = m.build(&params! {}).unwrap();
            assert_eq!(m.parse(&built).unwrap().0, "", "{}", built);
        }
        assert_eq!(path("a!b").parse("/a!bc"), Err(StepError::NoMatch));

        let flag = optional("a!b");
        let (rest, capture) = flag.parse("/a!b").unwrap();
        assert_eq!(rest, "");
        assert_eq!(capture.unwrap().1, ParamValue::Flag(true));
    }

    #[test]
    fn test_query_build_checks_schema() {
        let page = query("page", Schema::integer());
        assert_eq!(page.build(&params! {}), None);
        assert_eq!(page.build(&params! { "page" => "two" }), None);
        assert_eq!(page.build(&params! { "page" => 2 }).as_deref(), Some(""));

        let sort = query_optional("sort", Schema::one_of(["asc", "desc"]));
        assert_eq!(sort.build(&params! {}).as_deref(), Some(""));
        assert_eq!(sort.build(&params! { "sort" => "sideways" }), None);
    }
}
