//! Range arguments
//!
//! A half-open `start:end` window over an ordered collection (usually the
//! queue). The wire form always carries an exclusive end; an open end
//! selects the rest of the list.

use std::fmt;
use std::ops;

/// Half-open range with an optional end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: u32,

    /// Exclusive end, `None` for "rest of the list"
    pub end: Option<u32>,
}

impl Range {
    /// Range with an exclusive end
    ///
    /// A non-positive end selects the rest of the list.
    pub fn new(start: u32, end: i64) -> Self {
        let end = if end <= 0 {
            None
        } else {
            Some(u32::try_from(end).unwrap_or(u32::MAX))
        };
        Self { start, end }
    }

    /// Range with an inclusive end, so `inclusive(0, -1)` is the whole list
    pub fn inclusive(start: u32, end: i64) -> Self {
        Self::new(start, end.saturating_add(1))
    }

    /// Everything from `start` to the end of the list
    pub fn starting_at(start: u32) -> Self {
        Self { start, end: None }
    }

    /// Encode as `start:end` or `start:`
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}:{}", self.start, end),
            None => write!(f, "{}:", self.start),
        }
    }
}

impl From<ops::Range<u32>> for Range {
    fn from(range: ops::Range<u32>) -> Self {
        Range::new(range.start, i64::from(range.end))
    }
}

impl From<ops::RangeInclusive<u32>> for Range {
    fn from(range: ops::RangeInclusive<u32>) -> Self {
        Range::inclusive(*range.start(), i64::from(*range.end()))
    }
}

impl From<ops::RangeFrom<u32>> for Range {
    fn from(range: ops::RangeFrom<u32>) -> Self {
        Range::starting_at(range.start)
    }
}
