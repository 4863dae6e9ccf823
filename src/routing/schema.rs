//! Parameter validation schemas.
//!
//! # Responsibilities
//! - Validate and normalize a coerced parameter value
//! - Distinguish required from optional values
//!
//! # Design Decisions
//! - Closed set of built-in kinds plus a `custom` closure as escape hatch
//! - Validation never panics; failures are values (`SchemaError`)
//! - Schemas are cheap to clone (custom closures sit behind `Arc`)

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::routing::params::ParamValue;

/// Validation failure for a single value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("required value is missing")]
    Missing,
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },
    #[error("{0}")]
    Rejected(String),
}

type CustomCheck = Arc<dyn Fn(ParamValue) -> Result<ParamValue, String> + Send + Sync>;

#[derive(Clone)]
enum SchemaKind {
    Any,
    Text,
    Number,
    Integer,
    Boolean,
    OneOf(Arc<[String]>),
    Custom(CustomCheck),
}

/// Validation schema attached to `param` and `query` matchers.
#[derive(Clone)]
pub struct Schema {
    kind: SchemaKind,
    optional: bool,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    /// Accept any value unchanged.
    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    /// Accept scalars, normalizing them to text (`"42"` stays `"42"`).
    pub fn text() -> Self {
        Self::of(SchemaKind::Text)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    /// Numbers without a fractional part.
    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    /// `true`/`false` tokens, normalized to flags.
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// Accept only the listed tokens (compared on their rendered form).
    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(SchemaKind::OneOf(
            allowed.into_iter().map(Into::into).collect::<Vec<_>>().into(),
        ))
    }

    /// Arbitrary validation. The closure may also transform the value.
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(ParamValue) -> Result<ParamValue, String> + Send + Sync + 'static,
    {
        Self::of(SchemaKind::Custom(Arc::new(check)))
    }

    /// Allow the value to be absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Resolve a built-in schema by the name used in textual patterns.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "any" => Some(Self::any()),
            "string" | "text" => Some(Self::text()),
            "number" => Some(Self::number()),
            "int" | "integer" => Some(Self::integer()),
            "bool" | "boolean" => Some(Self::boolean()),
            _ => None,
        }
    }

    /// Name used when rendering patterns. `None` for `any`.
    pub fn name(&self) -> Option<&'static str> {
        match self.kind {
            SchemaKind::Any => None,
            SchemaKind::Text => Some("string"),
            SchemaKind::Number => Some("number"),
            SchemaKind::Integer => Some("integer"),
            SchemaKind::Boolean => Some("boolean"),
            SchemaKind::OneOf(_) => Some("one_of"),
            SchemaKind::Custom(_) => Some("custom"),
        }
    }

    /// Validate a possibly-absent value.
    ///
    /// Returns `Ok(None)` only when the value is absent and the schema is
    /// optional.
    pub fn validate(&self, value: Option<ParamValue>) -> Result<Option<ParamValue>, SchemaError> {
        match value {
            None if self.optional => Ok(None),
            None => Err(SchemaError::Missing),
            Some(value) => self.check(value).map(Some),
        }
    }

    fn check(&self, value: ParamValue) -> Result<ParamValue, SchemaError> {
        let mismatch = |expected: &'static str, value: &ParamValue| SchemaError::Mismatch {
            expected,
            found: value.type_name().to_string(),
        };

        match &self.kind {
            SchemaKind::Any => Ok(value),
            SchemaKind::Text => match value {
                ParamValue::List(_) => Err(mismatch("text", &value)),
                ParamValue::Text(_) => Ok(value),
                other => Ok(ParamValue::Text(other.to_string())),
            },
            SchemaKind::Number => match value {
                ParamValue::Number(_) => Ok(value),
                other => Err(mismatch("number", &other)),
            },
            SchemaKind::Integer => match value {
                ParamValue::Number(n) if n.fract() == 0.0 => Ok(value),
                other => Err(mismatch("integer", &other)),
            },
            SchemaKind::Boolean => match value {
                ParamValue::Flag(_) => Ok(value),
                ParamValue::Text(ref s) if s == "true" => Ok(ParamValue::Flag(true)),
                ParamValue::Text(ref s) if s == "false" => Ok(ParamValue::Flag(false)),
                other => Err(mismatch("boolean", &other)),
            },
            SchemaKind::OneOf(allowed) => {
                let rendered = value.to_string();
                if allowed.iter().any(|a| *a == rendered) {
                    Ok(value)
                } else {
                    Err(SchemaError::Rejected(format!(
                        "{:?} is not one of {:?}",
                        rendered,
                        allowed.as_ref()
                    )))
                }
            }
            SchemaKind::Custom(check) => check(value).map_err(SchemaError::Rejected),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.name().unwrap_or("any"))
            .field("optional", &self.optional)
            .finish()
    }
}
