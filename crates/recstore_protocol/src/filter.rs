//! Query filters and their evaluation.
//!
//! A [`Filter`] travels on the wire as plain data. Before it is applied it
//! is compiled into a [`CompiledFilter`], which validates field paths and
//! builds the regular expressions once per query.

use crate::error::{ProtocolError, ProtocolResult};
use recstore_codec::{Record, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A predicate selecting records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Every record.
    MatchAll,
    /// Records whose field equals the value exactly (no coercion).
    FieldEquals {
        /// Field path.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// Records whose text field matches the pattern.
    FieldMatchesPattern {
        /// Field path.
        field: String,
        /// Pattern source, interpreted per [`PatternSyntax`].
        pattern: String,
    },
    /// Records matching every sub-filter.
    And(Vec<Filter>),
}

impl Filter {
    /// Shorthand for [`Filter::MatchAll`].
    pub fn all() -> Self {
        Filter::MatchAll
    }

    /// Shorthand for [`Filter::FieldEquals`].
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Shorthand for [`Filter::FieldMatchesPattern`].
    pub fn pattern(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::FieldMatchesPattern {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Combines two filters, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Filter::And(parts) => parts,
            Filter::MatchAll => vec![],
            f => vec![f],
        };
        match other {
            Filter::And(more) => parts.extend(more),
            Filter::MatchAll => {}
            f => parts.push(f),
        }
        Filter::And(parts)
    }

    /// Returns an equality condition usable for an index lookup.
    ///
    /// Only a top-level `FieldEquals`, or one directly inside `And`,
    /// qualifies.
    pub fn equality_lookup(&self) -> Option<(&str, &Value)> {
        match self {
            Filter::FieldEquals { field, value } => Some((field, value)),
            Filter::And(parts) => parts.iter().find_map(|f| match f {
                Filter::FieldEquals { field, value } => Some((field.as_str(), value)),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Validates field paths and compiles patterns.
    pub fn compile(&self, syntax: PatternSyntax) -> ProtocolResult<CompiledFilter> {
        Ok(CompiledFilter {
            root: Predicate::build(self, syntax)?,
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::MatchAll => f.write_str("*"),
            Filter::FieldEquals { field, value } => write!(f, "{} == {}", field, value),
            Filter::FieldMatchesPattern { field, pattern } => {
                write!(f, "{} ~ /{}/", field, pattern)
            }
            Filter::And(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// How `FieldMatchesPattern` interprets its pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatternSyntax {
    /// Regular expression, `regex` crate dialect (unanchored search).
    #[default]
    Regex,
    /// Literal substring containment.
    Literal,
}

impl FromStr for PatternSyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regex" => Ok(PatternSyntax::Regex),
            "literal" => Ok(PatternSyntax::Literal),
            other => Err(format!(
                "unknown pattern syntax {:?} (expected regex or literal)",
                other
            )),
        }
    }
}

impl fmt::Display for PatternSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSyntax::Regex => f.write_str("regex"),
            PatternSyntax::Literal => f.write_str("literal"),
        }
    }
}

/// Checks that a field path is acceptable for indexing and filtering.
///
/// Rejects empty names, empty path segments (`a..b`, `.a`) and names
/// starting with `$`.
pub fn validate_field_path(field: &str) -> ProtocolResult<()> {
    let reason = if field.is_empty() {
        Some("empty field name")
    } else if field.starts_with('$') {
        Some("field names may not start with '$'")
    } else if field.split('.').any(str::is_empty) {
        Some("empty path segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ProtocolError::InvalidField {
            field: field.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// A filter ready to be applied to records.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    root: Predicate,
}

impl CompiledFilter {
    /// Tests a record.
    ///
    /// A record lacking the filtered field does not match. A pattern
    /// applied to a non-text value is an error.
    pub fn matches(&self, record: &Record) -> ProtocolResult<bool> {
        self.root.matches(record)
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    All,
    Equals { field: String, value: Value },
    Pattern { field: String, regex: Regex },
    And(Vec<Predicate>),
}

impl Predicate {
    fn build(filter: &Filter, syntax: PatternSyntax) -> ProtocolResult<Self> {
        match filter {
            Filter::MatchAll => Ok(Predicate::All),
            Filter::FieldEquals { field, value } => {
                validate_field_path(field)?;
                Ok(Predicate::Equals {
                    field: field.clone(),
                    value: value.clone(),
                })
            }
            Filter::FieldMatchesPattern { field, pattern } => {
                validate_field_path(field)?;
                let source = match syntax {
                    PatternSyntax::Regex => pattern.clone(),
                    PatternSyntax::Literal => regex::escape(pattern),
                };
                let regex = Regex::new(&source).map_err(|e| ProtocolError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                Ok(Predicate::Pattern {
                    field: field.clone(),
                    regex,
                })
            }
            Filter::And(parts) => {
                let mut flat = Vec::with_capacity(parts.len());
                for part in parts {
                    match Predicate::build(part, syntax)? {
                        Predicate::And(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                // Equality parts run before any pattern, in whatever order
                // the conjunction was written.
                flat.sort_by_key(|p| matches!(p, Predicate::Pattern { .. }));
                Ok(Predicate::And(flat))
            }
        }
    }

    fn matches(&self, record: &Record) -> ProtocolResult<bool> {
        match self {
            Predicate::All => Ok(true),
            Predicate::Equals { field, value } => Ok(record.get_path(field) == Some(value)),
            Predicate::Pattern { field, regex } => match record.get_path(field) {
                None => Ok(false),
                Some(Value::Text(text)) => Ok(regex.is_match(text)),
                Some(other) => Err(ProtocolError::NotText {
                    field: field.clone(),
                    found: other.type_name(),
                }),
            },
            Predicate::And(parts) => {
                for part in parts {
                    if !part.matches(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}
