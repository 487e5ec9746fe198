//! Payload version model.
//!
//! A version is the tuple `(build, branch, patch, timestamp)` written as
//! `"B.Br.P"` or `"B.Br.P+YYYY-MM-DD-HHMM"`. The derived ordering compares
//! the fields in declaration order, which is the only ordering used to pick
//! and list payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Text layout of the optional timestamp segment (`2015-01-01-0101`).
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d-%H%M";

const TIMESTAMP_LEN: usize = "YYYY-MM-DD-HHMM".len();

/// Errors produced while parsing version text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedVersion {
    #[error("extraneous '+' separators in version '{0}'")]
    ExtraneousSeparators(String),

    #[error("incorrect number of version segments ({count}) in '{input}'")]
    SegmentCount { input: String, count: usize },

    #[error("invalid {field} segment '{segment}'")]
    InvalidSegment {
        field: &'static str,
        segment: String,
    },

    #[error("invalid timestamp '{0}', expected YYYY-MM-DD-HHMM")]
    InvalidTimestamp(String),
}

/// Immutable payload version.
///
/// Equality and ordering include the timestamp. [`Version::is_zero`] does
/// not look at it, so `0.0.0+2015-01-01-0101` is zero but differs from
/// `0.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    build: i32,
    branch: i32,
    patch: i32,
    timestamp: DateTime<Utc>,
}

impl Version {
    /// Version without a timestamp (timestamp is the Unix epoch).
    pub fn new(build: i32, branch: i32, patch: i32) -> Self {
        Self {
            build,
            branch,
            patch,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Version with an explicit timestamp, truncated to whole seconds.
    pub fn with_timestamp(build: i32, branch: i32, patch: i32, timestamp: DateTime<Utc>) -> Self {
        Self {
            build,
            branch,
            patch,
            timestamp: timestamp.trunc_subsecs(0),
        }
    }

    /// Parse version text.
    pub fn parse(input: &str) -> Result<Self, MalformedVersion> {
        let mut parts = input.split('+');
        let numbers = parts.next().unwrap_or_default();
        let stamp = parts.next();
        if parts.next().is_some() {
            return Err(MalformedVersion::ExtraneousSeparators(input.to_string()));
        }

        let timestamp = match stamp {
            Some(text) => parse_timestamp(text)?,
            None => DateTime::<Utc>::UNIX_EPOCH,
        };

        let segments: Vec<&str> = numbers.split('.').collect();
        let [build, branch, patch] = segments.as_slice() else {
            return Err(MalformedVersion::SegmentCount {
                input: input.to_string(),
                count: segments.len(),
            });
        };

        Ok(Self {
            build: parse_segment("build", build)?,
            branch: parse_segment("branch", branch)?,
            patch: parse_segment("patch", patch)?,
            timestamp,
        })
    }

    pub fn build(&self) -> i32 {
        self.build
    }

    pub fn branch(&self) -> i32 {
        self.branch
    }

    pub fn patch(&self) -> i32 {
        self.patch
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True when the timestamp is the epoch, i.e. absent from the text form.
    pub fn has_timestamp(&self) -> bool {
        self.timestamp != DateTime::<Utc>::UNIX_EPOCH
    }

    /// True iff build, branch and patch are all zero. The timestamp is
    /// ignored here even though equality compares it.
    pub fn is_zero(&self) -> bool {
        self.build == 0 && self.branch == 0 && self.patch == 0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl FromStr for Version {
    type Err = MalformedVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.build, self.branch, self.patch)?;
        if self.has_timestamp() {
            write!(f, "+{}", self.timestamp.format(TIMESTAMP_LAYOUT))?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_segment(field: &'static str, segment: &str) -> Result<i32, MalformedVersion> {
    let invalid = || MalformedVersion::InvalidSegment {
        field,
        segment: segment.to_string(),
    };

    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    segment.parse::<i32>().map_err(|_| invalid())
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, MalformedVersion> {
    // chrono skips leading whitespace inside numeric fields, so the fixed
    // layout is checked byte by byte first.
    let well_formed = text.len() == TIMESTAMP_LEN
        && text.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 | 10 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(MalformedVersion::InvalidTimestamp(text.to_string()));
    }
    NaiveDateTime::parse_from_str(text, TIMESTAMP_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|_| MalformedVersion::InvalidTimestamp(text.to_string()))
}
