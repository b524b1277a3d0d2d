//! State paths - dot-delimited addresses into the state tree

use anyhow::{anyhow, Result};
use std::fmt;

/// Separator between path segments
pub const SEPARATOR: char = '.';

/// A parsed, non-empty path such as `program.stages` or `time`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StatePath {
    segments: Vec<String>,
}

impl StatePath {
    /// Parse a dotted path. Empty paths and empty segments (`a..b`, `.a`) are rejected.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(anyhow!("State path is empty"));
        }

        let segments: Vec<String> = path.split(SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(anyhow!("State path has an empty segment: {:?}", path));
        }

        Ok(StatePath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path made of the first `len` segments
    pub fn prefix(&self, len: usize) -> StatePath {
        StatePath {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Proper ancestors, nearest first (`a.b.c` -> `a.b`, `a`)
    pub fn ancestors(&self) -> impl Iterator<Item = StatePath> + '_ {
        (1..self.segments.len()).rev().map(move |len| self.prefix(len))
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for StatePath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        StatePath::parse(s)
    }
}
