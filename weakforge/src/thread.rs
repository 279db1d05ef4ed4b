//! Thread identifiers of execution graphs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The position of a thread in the graph's thread table, printed and serialized as `t<N>`.
///
/// Thread 0 always exists and holds the initializer event at index 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(u32);

/// Construct a ThreadId from its position in the graph's thread table.
pub const fn construct_thread_id(index: u32) -> ThreadId {
    ThreadId(index)
}

/// The thread holding the initializer.
pub fn main_thread_id() -> ThreadId {
    ThreadId(0)
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl From<ThreadId> for u32 {
    fn from(tid: ThreadId) -> Self {
        tid.0
    }
}

impl From<ThreadId> for usize {
    fn from(tid: ThreadId) -> Self {
        tid.0 as usize
    }
}

impl From<ThreadId> for String {
    fn from(tid: ThreadId) -> Self {
        tid.to_string()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseThreadIdError {
    MissingPrefix(String),
    BadIndex(String),
}

impl fmt::Display for ParseThreadIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseThreadIdError::MissingPrefix(s) => write!(f, "`{}` should begin with `t`", s),
            ParseThreadIdError::BadIndex(s) => write!(f, "`{}` has no thread index", s),
        }
    }
}

impl std::error::Error for ParseThreadIdError {}

impl TryFrom<String> for ThreadId {
    type Error = ParseThreadIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let Some(index) = s.strip_prefix('t') else {
            return Err(ParseThreadIdError::MissingPrefix(s));
        };
        index
            .parse()
            .map(ThreadId)
            .map_err(|_| ParseThreadIdError::BadIndex(s.clone()))
    }
}
