//! Command encoding
//!
//! Lowers a command name and its arguments into one newline-free line.
//!
//! ## Token Grammar
//! ```text
//! string   →  "O'Brien \"Song\".mp3"      (quoted, \ and " escaped)
//! integer  →  42                           (bare)
//! boolean  →  1 / 0                        (bare)
//! range    →  5:10  /  5:                   (bare, exclusive end)
//! filter   →  "(artist == \"Nina\")"       (compiled, then quoted)
//! options  →  key value key value           (keys bare, values encoded)
//! ```

use std::borrow::Cow;
use std::fmt::Write;

use crate::error::{MpdError, Result};

use super::{Filter, Range};

/// One command argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Range(Range),
    Filter(Filter),

    /// Flattened to ` key value` pairs in insertion order. Values must be
    /// scalar; nesting another option map is rejected.
    Options(Vec<(String, Arg)>),
}

impl Arg {
    /// Build an option map argument
    pub fn options<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Arg>,
    {
        Arg::Options(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(value.clone())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Int(i64::from(value))
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Int(i64::from(value))
    }
}

impl TryFrom<u64> for Arg {
    type Error = MpdError;

    fn try_from(value: u64) -> Result<Self> {
        i64::try_from(value)
            .map(Arg::Int)
            .map_err(|_| MpdError::InvalidArgument(format!("integer {} out of range", value)))
    }
}

impl TryFrom<usize> for Arg {
    type Error = MpdError;

    fn try_from(value: usize) -> Result<Self> {
        i64::try_from(value)
            .map(Arg::Int)
            .map_err(|_| MpdError::InvalidArgument(format!("integer {} out of range", value)))
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<Range> for Arg {
    fn from(value: Range) -> Self {
        Arg::Range(value)
    }
}

impl From<std::ops::Range<u32>> for Arg {
    fn from(value: std::ops::Range<u32>) -> Self {
        Arg::Range(value.into())
    }
}

impl From<std::ops::RangeInclusive<u32>> for Arg {
    fn from(value: std::ops::RangeInclusive<u32>) -> Self {
        Arg::Range(value.into())
    }
}

impl From<std::ops::RangeFrom<u32>> for Arg {
    fn from(value: std::ops::RangeFrom<u32>) -> Self {
        Arg::Range(value.into())
    }
}

impl From<Filter> for Arg {
    fn from(value: Filter) -> Self {
        Arg::Filter(value)
    }
}

// =============================================================================
// Escaping
// =============================================================================

/// Escape `\` and `"` with a backslash
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Escape and wrap in double quotes
pub fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a full command line (without the trailing newline)
pub fn encode_command(command: &str, args: &[Arg]) -> Result<String> {
    if command.is_empty() || command.contains(char::is_whitespace) {
        return Err(MpdError::InvalidArgument(format!(
            "invalid command name: {:?}",
            command
        )));
    }

    let mut line = String::with_capacity(command.len() + args.len() * 16);
    line.push_str(command);
    for arg in args {
        encode_arg(&mut line, arg, true)?;
    }
    Ok(line)
}

fn encode_arg(line: &mut String, arg: &Arg, allow_options: bool) -> Result<()> {
    match arg {
        Arg::Str(value) => {
            reject_newline(value)?;
            line.push(' ');
            line.push_str(&quote(value));
        }
        Arg::Int(value) => {
            let _ = write!(line, " {}", value);
        }
        Arg::Float(value) => {
            if !value.is_finite() {
                return Err(MpdError::InvalidArgument(format!(
                    "non-finite number: {}",
                    value
                )));
            }
            let _ = write!(line, " {}", value);
        }
        Arg::Bool(value) => {
            line.push_str(if *value { " 1" } else { " 0" });
        }
        Arg::Range(range) => {
            let _ = write!(line, " {}", range);
        }
        Arg::Filter(filter) => {
            let expr = filter.compile()?;
            reject_newline(&expr)?;
            line.push(' ');
            line.push_str(&quote(&expr));
        }
        Arg::Options(pairs) => {
            if !allow_options {
                return Err(MpdError::InvalidArgument(
                    "option maps cannot be nested".to_string(),
                ));
            }
            for (key, value) in pairs {
                if key.is_empty() || key.contains(char::is_whitespace) {
                    return Err(MpdError::InvalidArgument(format!(
                        "invalid option key: {:?}",
                        key
                    )));
                }
                line.push(' ');
                line.push_str(key);
                encode_arg(line, value, false)?;
            }
        }
    }
    Ok(())
}

fn reject_newline(value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(MpdError::InvalidArgument(format!(
            "argument contains a line break: {:?}",
            value
        )));
    }
    Ok(())
}
