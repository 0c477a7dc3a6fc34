//! Pairs, records and response shapes
//!
//! Groups the `key: value` lines of one reply into the structure a command
//! expects.

use std::fmt;
use std::str::FromStr;

use crate::error::{MpdError, Result};

/// One `key: value` line, key case preserved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Split a data line on its first `": "`
    ///
    /// A bare trailing colon (`key:`) is accepted as an empty value.
    pub fn parse(line: &str) -> Option<Self> {
        if let Some((key, value)) = line.split_once(": ") {
            return Some(Pair::new(key, value));
        }
        line.strip_suffix(':').map(|key| Pair::new(key, ""))
    }
}

/// Insertion-ordered fields of one logical object
///
/// Repeated keys (multi-valued tags) are kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<Pair>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: Pair) {
        self.fields.push(pair);
    }

    /// First value for `key` (exact match)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Every value for `key`, in order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Parse the first value for `key`
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
                MpdError::Framing(format!("field {} = {:?}: {}", key, raw, e))
            }),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|p| p.key == key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pair> {
        self.fields.iter()
    }

    /// Distinct keys in first-seen order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for pair in &self.fields {
            if !keys.contains(&pair.key.as_str()) {
                keys.push(&pair.key);
            }
        }
        keys
    }
}

impl FromIterator<Pair> for Record {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Pair;
    type IntoIter = std::slice::Iter<'a, Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for Record {
    type Item = Pair;
    type IntoIter = std::vec::IntoIter<Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

// =============================================================================
// Response Shapes
// =============================================================================

/// How a command's reply is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Terminator only; stray data is discarded
    Nothing,

    /// One repeated key, values only
    List,

    /// Raw pairs, untouched
    Pairs,

    /// First record of the reply, split where a key repeats; absent when
    /// the reply is empty
    Record,

    /// First record of the reply, split at boundary keys. Repeated
    /// non-boundary keys (multi-valued tags) stay in that record.
    First(&'static [&'static str]),

    /// A new record starts at every boundary key
    Records(&'static [&'static str]),

    /// A new record starts whenever a key repeats within the current one
    Grouped,
}

/// The resolved reply of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nothing,
    List(Vec<String>),
    Pairs(Vec<Pair>),
    Record(Option<Record>),
    Records(Vec<Record>),

    /// Queued inside a command list; resolved when the list ends
    Deferred,
}

impl Reply {
    pub fn into_list(self) -> Option<Vec<String>> {
        match self {
            Reply::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_pairs(self) -> Option<Vec<Pair>> {
        match self {
            Reply::Pairs(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Reply::Record(record) => record,
            Reply::Records(records) => records.into_iter().next(),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            Reply::Records(records) => Some(records),
            Reply::Record(record) => Some(record.into_iter().collect()),
            _ => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Reply::Deferred)
    }
}

// =============================================================================
// Assembly
// =============================================================================

/// Assemble the pairs of one complete reply according to `shape`
pub fn assemble(shape: ResponseShape, pairs: Vec<Pair>) -> Result<Reply> {
    Ok(match shape {
        ResponseShape::Nothing => Reply::Nothing,
        ResponseShape::List => Reply::List(into_list(pairs)?),
        ResponseShape::Pairs => Reply::Pairs(pairs),
        ResponseShape::Record => Reply::Record(into_grouped(pairs).into_iter().next()),
        ResponseShape::First(boundary) => {
            Reply::Record(into_records(pairs, boundary).into_iter().next())
        }
        ResponseShape::Records(boundary) => Reply::Records(into_records(pairs, boundary)),
        ResponseShape::Grouped => Reply::Records(into_grouped(pairs)),
    })
}

/// Values of a list reply; every pair must share the first key
pub fn into_list(pairs: Vec<Pair>) -> Result<Vec<String>> {
    let mut values = Vec::with_capacity(pairs.len());
    let mut first_key: Option<String> = None;

    for pair in pairs {
        match &first_key {
            None => first_key = Some(pair.key),
            Some(key) if *key != pair.key => {
                return Err(MpdError::Framing(format!(
                    "list reply changed key from {:?} to {:?}",
                    key, pair.key
                )));
            }
            Some(_) => {}
        }
        values.push(pair.value);
    }

    Ok(values)
}

/// Split at boundary keys (ASCII case-insensitive)
///
/// Pairs before the first boundary key form their own leading record.
pub fn into_records(pairs: Vec<Pair>, boundary: &[&str]) -> Vec<Record> {
    split(pairs, |current, pair| {
        boundary.iter().any(|b| b.eq_ignore_ascii_case(&pair.key)) && !current.is_empty()
    })
}

/// Split whenever a key already present in the current record reappears
pub fn into_grouped(pairs: Vec<Pair>) -> Vec<Record> {
    split(pairs, |current, pair| current.contains_key(&pair.key))
}

fn split(pairs: Vec<Pair>, starts_new: impl Fn(&Record, &Pair) -> bool) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = Record::new();

    for pair in pairs {
        if starts_new(&current, &pair) {
            records.push(std::mem::take(&mut current));
        }
        current.push(pair);
    }

    if !current.is_empty() {
        records.push(current);
    }
    records
}
