//! Program positions of execution graph events
use crate::thread::{construct_thread_id, main_thread_id, ThreadId};
use serde::{Deserialize, Serialize};

/// A (thread, index) coordinate of an event in an execution graph.
///
/// Events of the same thread are totally ordered by index (program order);
/// events of different threads are unrelated.
#[derive(PartialEq, Copy, Clone, Debug, Hash, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Event {
    pub thread: ThreadId,
    pub index: u32,
}

const BOTTOM_COORD: u32 = u32::MAX - 41;

impl Event {
    /// Denotes "no such event".
    pub const BOTTOM: Event = Event {
        thread: construct_thread_id(BOTTOM_COORD),
        index: BOTTOM_COORD,
    };

    pub fn new(t: ThreadId, i: u32) -> Self {
        Self {
            thread: t,
            index: i,
        }
    }

    /// The initializer event `(0, 0)`.
    pub fn init() -> Self {
        Self::new(main_thread_id(), 0)
    }

    pub fn is_init(&self) -> bool {
        *self == Self::init()
    }

    pub fn is_bottom(&self) -> bool {
        *self == Self::BOTTOM
    }

    // No bounds checks: callers know the thread sizes
    pub fn next(&self) -> Self {
        Self {
            thread: self.thread,
            index: self.index + 1,
        }
    }

    pub fn prev(&self) -> Self {
        Self {
            thread: self.thread,
            index: self.index - 1,
        }
    }

    /// Whether `self` precedes `other` in program order.
    pub fn is_po_before(&self, other: Event) -> bool {
        self.thread == other.thread && self.index < other.index
    }
}

/// Shorthand for building events in tests and litmus harnesses.
pub fn ev(thread: u32, index: u32) -> Event {
    Event::new(construct_thread_id(thread), index)
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_bottom() {
            write!(f, "BOTTOM")
        } else {
            write!(f, "({}, {})", self.thread, self.index)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn po_adjacent_coordinates() {
        let e = ev(2, 3);
        assert_eq!(e.next(), ev(2, 4));
        assert_eq!(e.prev(), ev(2, 2));
        assert!(e.prev().is_po_before(e));
        assert!(!ev(1, 0).is_po_before(e));
    }

    #[test]
    fn sentinels() {
        assert!(Event::init().is_init());
        assert_eq!(Event::init(), ev(0, 0));
        assert!(Event::BOTTOM.is_bottom());
        assert!(!Event::init().is_bottom());
        assert_eq!(Event::BOTTOM.to_string(), "BOTTOM");
        assert_eq!(ev(1, 2).to_string(), "(t1, 2)");
    }
}
