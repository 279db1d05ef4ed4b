//! Memory orderings of events.
use serde::{Deserialize, Serialize};

/// The ordering annotation of an event.
///
/// Strength forms a lattice: `NotAtomic < Unordered < Relaxed < {Acquire, Release} <
/// AcquireRelease < SequentiallyConsistent`, where `Acquire` and `Release` are incomparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemOrdering {
    #[default]
    NotAtomic,
    Unordered,
    Relaxed,
    Acquire,
    Release,
    AcquireRelease,
    SequentiallyConsistent,
}

use MemOrdering::*;

// STRONGER[a][b] is whether `a` is at least as strong as `b`
const STRONGER: [[bool; 7]; 7] = [
    //                NA     UN     RX     AC     RE     AR     SC
    /* NotAtomic */ [true, false, false, false, false, false, false],
    /* Unordered */ [true, true, false, false, false, false, false],
    /* Relaxed   */ [true, true, true, false, false, false, false],
    /* Acquire   */ [true, true, true, true, false, false, false],
    /* Release   */ [true, true, true, false, true, false, false],
    /* AcqRel    */ [true, true, true, true, true, true, false],
    /* SeqCst    */ [true, true, true, true, true, true, true],
];

impl MemOrdering {
    fn idx(self) -> usize {
        match self {
            NotAtomic => 0,
            Unordered => 1,
            Relaxed => 2,
            Acquire => 3,
            Release => 4,
            AcquireRelease => 5,
            SequentiallyConsistent => 6,
        }
    }

    pub fn is_at_least_or_stronger(self, other: MemOrdering) -> bool {
        STRONGER[self.idx()][other.idx()]
    }

    pub fn is_atomic(self) -> bool {
        self != NotAtomic
    }

    pub fn is_at_least_acquire(self) -> bool {
        self.is_at_least_or_stronger(Acquire)
    }

    pub fn is_at_least_release(self) -> bool {
        self.is_at_least_or_stronger(Release)
    }

    pub fn is_sc(self) -> bool {
        self == SequentiallyConsistent
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotAtomic => "na",
            Unordered => "un",
            Relaxed => "rlx",
            Acquire => "acq",
            Release => "rel",
            AcquireRelease => "ar",
            SequentiallyConsistent => "sc",
        }
    }
}

impl std::fmt::Display for MemOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
