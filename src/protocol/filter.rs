//! Filter expressions
//!
//! Builds the daemon's parenthesized predicate syntax, e.g.
//! `((artist == "Nina Simone") AND (!(album contains "Live")))`.
//! Values are escaped here; the codec escapes the compiled expression again
//! when it becomes a command argument.

use std::fmt;
use std::ops;

use crate::error::{MpdError, Result};

use super::codec::escape;

/// Comparison operator of a tag predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    Matches,
    NotMatches,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::Matches => "=~",
            Operator::NotMatches => "!~",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate tree; sibling nodes are joined with AND
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `(tag op "value")`
    Tag {
        tag: String,
        op: Operator,
        value: String,
    },

    /// `(base "directory")`
    Base(String),

    /// `(modified-since "timestamp")`
    ModifiedSince(String),

    /// `(added-since "timestamp")`
    AddedSince(String),

    /// `(!expr)`
    Not(Box<Filter>),

    /// `(expr AND expr ...)`
    And(Vec<Filter>),
}

/// Partially built tag predicate, see [`Filter::tag`]
#[derive(Debug, Clone)]
pub struct TagFilter {
    tag: String,
}

impl TagFilter {
    fn with(self, op: Operator, value: impl Into<String>) -> Filter {
        Filter::Tag {
            tag: self.tag,
            op,
            value: value.into(),
        }
    }

    pub fn eq(self, value: impl Into<String>) -> Filter {
        self.with(Operator::Equals, value)
    }

    pub fn ne(self, value: impl Into<String>) -> Filter {
        self.with(Operator::NotEquals, value)
    }

    pub fn contains(self, value: impl Into<String>) -> Filter {
        self.with(Operator::Contains, value)
    }

    pub fn starts_with(self, value: impl Into<String>) -> Filter {
        self.with(Operator::StartsWith, value)
    }

    /// Perl-compatible regular expression match
    pub fn matches(self, pattern: impl Into<String>) -> Filter {
        self.with(Operator::Matches, pattern)
    }

    pub fn not_matches(self, pattern: impl Into<String>) -> Filter {
        self.with(Operator::NotMatches, pattern)
    }
}

impl Filter {
    /// Start a predicate on `tag` (`artist`, `album`, `file`, `any`, ...)
    pub fn tag(tag: impl Into<String>) -> TagFilter {
        TagFilter { tag: tag.into() }
    }

    pub fn base(directory: impl Into<String>) -> Self {
        Filter::Base(directory.into())
    }

    pub fn modified_since(timestamp: impl Into<String>) -> Self {
        Filter::ModifiedSince(timestamp.into())
    }

    pub fn added_since(timestamp: impl Into<String>) -> Self {
        Filter::AddedSince(timestamp.into())
    }

    /// Conjunction of every filter in `filters`
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Join with another filter, flattening nested conjunctions
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), right) => {
                left.push(right);
                Filter::And(left)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Compile into the textual expression the daemon parses
    pub fn compile(&self) -> Result<String> {
        let mut out = String::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    fn write_to(&self, out: &mut String) -> Result<()> {
        match self {
            Filter::Tag { tag, op, value } => {
                validate_tag(tag)?;
                out.push('(');
                out.push_str(tag);
                out.push(' ');
                out.push_str(op.as_str());
                push_quoted(out, value);
                out.push(')');
            }
            Filter::Base(path) => special(out, "base", path),
            Filter::ModifiedSince(stamp) => special(out, "modified-since", stamp),
            Filter::AddedSince(stamp) => special(out, "added-since", stamp),
            Filter::Not(inner) => {
                out.push_str("(!");
                inner.write_to(out)?;
                out.push(')');
            }
            Filter::And(children) => match children.as_slice() {
                [] => {
                    return Err(MpdError::InvalidArgument(
                        "empty filter conjunction".to_string(),
                    ))
                }
                [only] => only.write_to(out)?,
                [first, rest @ ..] => {
                    out.push('(');
                    first.write_to(out)?;
                    for child in rest {
                        out.push_str(" AND ");
                        child.write_to(out)?;
                    }
                    out.push(')');
                }
            },
        }
        Ok(())
    }
}

impl ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }
}

fn special(out: &mut String, keyword: &str, value: &str) {
    out.push('(');
    out.push_str(keyword);
    push_quoted(out, value);
    out.push(')');
}

fn push_quoted(out: &mut String, value: &str) {
    out.push_str(" \"");
    out.push_str(&escape(value));
    out.push('"');
}

fn validate_tag(tag: &str) -> Result<()> {
    let bad = tag.is_empty()
        || tag
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | '\\'));
    if bad {
        return Err(MpdError::InvalidArgument(format!(
            "invalid filter tag: {:?}",
            tag
        )));
    }
    Ok(())
}
