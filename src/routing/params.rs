//! Parameter values captured from paths and query strings.
//!
//! # Responsibilities
//! - Represent a captured value (text, number, flag, segment list)
//! - Coerce raw tokens: purely numeric tokens become numbers
//! - Render values back into URL segments for building
//!
//! # Design Decisions
//! - Numbers are `f64` so integer and decimal tokens share one variant
//! - Ordered map (`BTreeMap`) keeps params deterministic in logs and JSON

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolved parameter bag, keyed by parameter name.
pub type Params = BTreeMap<String, ParamValue>;

/// A single captured parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Presence flag (optional segments, boolean schemas).
    Flag(bool),
    /// Purely numeric token.
    Number(f64),
    /// Any other token.
    Text(String),
    /// Ordered tokens captured by a wildcard.
    List(Vec<String>),
}

impl ParamValue {
    /// Coerce a raw (already decoded) token.
    ///
    /// A token made only of digits, with an optional `.digits` fraction,
    /// becomes a number. Everything else stays text.
    pub fn coerce(raw: &str) -> Self {
        if is_numeric(raw) {
            if let Ok(n) = raw.parse::<f64>() {
                return ParamValue::Number(n);
            }
        }
        ParamValue::Text(raw.to_string())
    }

    /// Render as a single URL segment (unencoded). Lists have no single form.
    pub fn to_segment(&self) -> Option<String> {
        match self {
            ParamValue::List(_) => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ParamValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short type label used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Flag(_) => "flag",
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "text",
            ParamValue::List(_) => "list",
        }
    }
}

fn is_numeric(raw: &str) -> bool {
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Flag(b) => write!(f, "{}", b),
            ParamValue::Number(n) => {
                // Integral values print without a trailing ".0" so they round-trip.
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(items) => f.write_str(&items.join("/")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Number(value as f64)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value as f64)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Number(value as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        ParamValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Build a [`Params`] bag inline.
///
/// ```
/// let params = waymark::params! { "id" => 42, "tab" => "posts" };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::routing::Params::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::routing::Params::new();
        $(
            params.insert(
                ::std::string::String::from($key),
                $crate::routing::ParamValue::from($value),
            );
        )+
        params
    }};
}
