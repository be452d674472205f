//! Predicates evaluated against values extracted from a response

use std::fmt;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Predicate over an optional JSON value (`None` = path did not resolve).
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// JSON equality; numbers compare by value, so `1` equals `1.0`
    Equals(Value),
    /// String starts with the prefix
    StartsWith(String),
    /// String contains the substring, or array contains the string element
    Contains(String),
    /// Empty string, array or object, or `null`
    IsEmpty,
    /// Present and not empty
    NotEmpty,
    /// Path resolves (any value, including `null`)
    Exists,
    /// RFC 3339 timestamp within `tolerance` of the current UTC instant
    Rfc3339Within(Duration),
    /// Value satisfies a JSON Schema
    MatchesSchema(Value),
}

impl Matcher {
    /// Equality against anything convertible to JSON.
    #[must_use]
    pub fn is(expected: impl Into<Value>) -> Self {
        Self::Equals(expected.into())
    }

    #[must_use]
    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Self::StartsWith(prefix.into())
    }

    #[must_use]
    pub fn contains(needle: impl Into<String>) -> Self {
        Self::Contains(needle.into())
    }

    /// Evaluate against the current clock.
    #[must_use]
    pub fn matches(&self, observed: Option<&Value>) -> bool {
        self.matches_at(observed, OffsetDateTime::now_utc())
    }

    /// Evaluate with an explicit "now" for time-dependent predicates.
    #[must_use]
    pub fn matches_at(&self, observed: Option<&Value>, now: OffsetDateTime) -> bool {
        let Some(value) = observed else {
            return false;
        };
        match self {
            Self::Equals(expected) => json_eq(expected, value),
            Self::StartsWith(prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::Contains(needle) => match value {
                Value::String(s) => s.contains(needle.as_str()),
                Value::Array(items) => items.iter().any(|i| i.as_str() == Some(needle.as_str())),
                _ => false,
            },
            Self::IsEmpty => is_empty(value),
            Self::NotEmpty => !is_empty(value),
            Self::Exists => true,
            Self::Rfc3339Within(tolerance) => value
                .as_str()
                .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
                .is_some_and(|ts| (now - ts).abs() <= *tolerance),
            Self::MatchesSchema(schema) => jsonschema::validator_for(schema)
                .map(|validator| validator.is_valid(value))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(v) => write!(f, "equal to {v}"),
            Self::StartsWith(p) => write!(f, "starting with {p:?}"),
            Self::Contains(n) => write!(f, "containing {n:?}"),
            Self::IsEmpty => f.write_str("empty"),
            Self::NotEmpty => f.write_str("not empty"),
            Self::Exists => f.write_str("present"),
            Self::Rfc3339Within(t) => {
                write!(f, "RFC 3339 timestamp within {}s of now", t.whole_seconds())
            }
            Self::MatchesSchema(s) => write!(f, "matching schema {s}"),
        }
    }
}

/// Render an observed value for failure messages.
#[must_use]
pub fn describe(observed: Option<&Value>) -> String {
    match observed {
        None => "<missing>".to_string(),
        Some(v) => {
            let rendered = v.to_string();
            if rendered.len() > 200 {
                let mut end = 200;
                while !rendered.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}…", &rendered[..end])
            } else {
                rendered
            }
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn json_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| json_eq(v, other)))
        }
        _ => expected == actual,
    }
}
