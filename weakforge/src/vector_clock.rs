use crate::event::Event;
use crate::thread::{construct_thread_id, ThreadId};
use crate::vset::VSet;
use std::cmp;

use serde::{Deserialize, Serialize};

/// A per-thread prefix summary: the view contains `(t, i)` iff `i <= clock[t]`.
///
/// Threads without an entry contribute no events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    clock: Vec<Option<u32>>,
}

impl View {
    pub fn new() -> Self {
        Self { clock: vec![] }
    }

    pub fn entries(&self) -> impl Iterator<Item = (ThreadId, u32)> + '_ {
        self.clock
            .iter()
            .enumerate()
            .filter_map(|(tid, idx)| idx.map(|idx| (construct_thread_id(tid as u32), idx)))
    }

    pub fn get(&self, i: ThreadId) -> Option<u32> {
        self.clock.get(usize::from(i)).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.clock.iter().all(Option::is_none)
    }

    /// Sets the entry of `e.thread` to exactly `e.index`.
    pub fn set(&mut self, e: Event) {
        let tid = usize::from(e.thread);
        if tid >= self.clock.len() {
            self.clock.resize(tid + 1, None);
        }
        self.clock[tid] = Some(e.index);
    }

    pub fn contains(&self, e: Event) -> bool {
        self.get(e.thread).is_some_and(|i| e.index <= i)
    }

    // Update, populating the thread if it's missing
    pub fn update_or_set(&mut self, e: Event) {
        self.advance(usize::from(e.thread), e.index);
    }

    // Update with another vector
    pub fn update(&mut self, other: &Self) {
        for (tid, other_val) in other.clock.iter().enumerate() {
            if let Some(v) = other_val {
                self.advance(tid, *v);
            }
        }
    }

    /// Componentwise inclusion.
    pub fn is_subset_of(&self, other: &View) -> bool {
        self.entries()
            .all(|(tid, idx)| other.get(tid).is_some_and(|o| idx <= o))
    }

    // Advance tid to be at least ind, populating the tid entry if missing
    fn advance(&mut self, tid: usize, ind: u32) {
        let new_val = match self.clock.get(tid).copied().flatten() {
            Some(old) => cmp::max(old, ind),
            None => ind,
        };
        self.set(Event::new(construct_thread_id(tid as u32), new_val));
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .entries()
            .map(|(t, i)| format!("{}: {}", t, i))
            .collect::<Vec<_>>();
        write!(f, "[{}]", entries.join(", "))
    }
}

/// A view with holes, for models where events may be added out of program order.
///
/// Contains `(t, i)` iff `i <= max[t]` and `i` is not a hole of `t`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepView {
    view: View,
    holes: Vec<VSet<u32>>,
}

impl DepView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, i: ThreadId) -> Option<u32> {
        self.view.get(i)
    }

    pub fn entries(&self) -> impl Iterator<Item = (ThreadId, u32)> + '_ {
        self.view.entries()
    }

    pub fn holes(&self, t: ThreadId) -> impl Iterator<Item = u32> + '_ {
        self.holes
            .get(usize::from(t))
            .into_iter()
            .flat_map(|h| h.iter().copied())
    }

    fn is_hole(&self, e: Event) -> bool {
        self.holes
            .get(usize::from(e.thread))
            .is_some_and(|h| h.contains(&e.index))
    }

    fn holes_mut(&mut self, t: ThreadId) -> &mut VSet<u32> {
        let tid = usize::from(t);
        if tid >= self.holes.len() {
            self.holes.resize(tid + 1, VSet::new());
        }
        &mut self.holes[tid]
    }

    pub fn contains(&self, e: Event) -> bool {
        self.view.contains(e) && !self.is_hole(e)
    }

    pub fn add_hole(&mut self, e: Event) {
        assert!(
            self.view.contains(e),
            "hole {} beyond the maximum of its thread",
            e
        );
        self.holes_mut(e.thread).insert(e.index);
    }

    pub fn remove_hole(&mut self, e: Event) {
        self.holes_mut(e.thread).erase(&e.index);
    }

    /// Adds exactly `e`: indices skipped to reach it become holes.
    pub fn update_idx(&mut self, e: Event) {
        match self.view.get(e.thread) {
            Some(max) if e.index <= max => self.remove_hole(e),
            old => {
                let first_new = old.map_or(0, |m| m + 1);
                let holes = self.holes_mut(e.thread);
                for i in first_new..e.index {
                    holes.insert(i);
                }
                self.view.set(e);
            }
        }
    }

    /// Union with another dependency view.
    pub fn update(&mut self, other: &DepView) {
        let mut new_holes: Vec<(ThreadId, u32)> = vec![];
        for (tid, _) in self.view.entries().chain(other.view.entries()) {
            for idx in self.holes(tid).chain(other.holes(tid)) {
                let e = Event::new(tid, idx);
                if !self.contains(e) && !other.contains(e) {
                    new_holes.push((tid, idx));
                }
            }
        }
        // Indices beyond our maximum that `other` lacks are holes too; they are in other.holes.
        self.view.update(&other.view);
        self.holes.iter_mut().for_each(VSet::clear);
        for (tid, idx) in new_holes {
            self.holes_mut(tid).insert(idx);
        }
    }

    /// Union with a hole-free view.
    pub fn update_view(&mut self, other: &View) {
        for (tid, max) in other.entries() {
            self.holes_mut(tid).retain(|&i| i > max);
        }
        self.view.update(other);
    }
}

impl std::fmt::Display for DepView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .view
            .entries()
            .map(|(t, i)| {
                let holes = self.holes(t).map(|h| h.to_string()).collect::<Vec<_>>();
                if holes.is_empty() {
                    format!("{}: {}", t, i)
                } else {
                    format!("{}: {} \\ {{{}}}", t, i, holes.join(", "))
                }
            })
            .collect::<Vec<_>>();
        write!(f, "[{}]", entries.join(", "))
    }
}

/// Either kind of view; prefix views of dependency-tracking models have holes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorClock {
    Plain(View),
    Dep(DepView),
}

impl Default for VectorClock {
    fn default() -> Self {
        VectorClock::Plain(View::new())
    }
}

impl VectorClock {
    pub fn new(dep_tracking: bool) -> Self {
        if dep_tracking {
            VectorClock::Dep(DepView::new())
        } else {
            VectorClock::Plain(View::new())
        }
    }

    pub fn contains(&self, e: Event) -> bool {
        match self {
            VectorClock::Plain(v) => v.contains(e),
            VectorClock::Dep(v) => v.contains(e),
        }
    }

    pub fn get(&self, t: ThreadId) -> Option<u32> {
        match self {
            VectorClock::Plain(v) => v.get(t),
            VectorClock::Dep(v) => v.get(t),
        }
    }

    /// Adds `e`; plain views also gain its po-prefix.
    pub fn update_idx(&mut self, e: Event) {
        match self {
            VectorClock::Plain(v) => v.update_or_set(e),
            VectorClock::Dep(v) => v.update_idx(e),
        }
    }

    pub fn update(&mut self, other: &VectorClock) {
        match (self, other) {
            (VectorClock::Plain(v), VectorClock::Plain(o)) => v.update(o),
            (VectorClock::Dep(v), VectorClock::Dep(o)) => v.update(o),
            (VectorClock::Dep(v), VectorClock::Plain(o)) => v.update_view(o),
            (VectorClock::Plain(_), VectorClock::Dep(_)) => {
                panic!("cannot merge a dependency view into a plain view")
            }
        }
    }

    pub fn as_view(&self) -> Option<&View> {
        match self {
            VectorClock::Plain(v) => Some(v),
            VectorClock::Dep(_) => None,
        }
    }
}

impl std::fmt::Display for VectorClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorClock::Plain(v) => write!(f, "{}", v),
            VectorClock::Dep(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::ev;

    /// This helper function accepts -1 as a value to show that a thread isn't present in the view
    fn clock(value: &[i32]) -> View {
        let mut c = View::new();
        for (tid, &idx) in value.iter().enumerate() {
            if idx >= 0 {
                c.update_or_set(ev(tid as u32, idx as u32));
            }
        }
        c
    }

    #[test]
    fn view() {
        let mut v1 = clock(&[1, 0, 2, 0]);
        v1.update_or_set(ev(1, 3));
        v1.update_or_set(ev(5, 5));
        assert_eq!(v1, clock(&[1, 3, 2, 0, -1, 5]));

        let mut v1 = clock(&[1]);
        v1.update_or_set(ev(3, 1));
        assert!(v1.contains(ev(3, 1)));
        assert!(!v1.contains(ev(2, 1)));

        let mut v1 = clock(&[1, -1, 2]);
        let v2 = clock(&[2, -1, 1, 5]);
        v1.update(&v2);
        assert_eq!(v1, clock(&[2, -1, 2, 5]));
        assert!(v2.is_subset_of(&v1));
        assert!(!v1.is_subset_of(&v2));
    }

    #[test]
    fn view_is_sparse() {
        let mut c = clock(&[100]);
        c.update_or_set(ev(2, 1));
        assert_eq!(None, c.get(construct_thread_id(1)));
        assert_eq!(c, clock(&[100, -1, 1]));
        assert_eq!(c.to_string(), "[t0: 100, t2: 1]");
    }

    #[test]
    fn view_is_serializable() {
        let c = clock(&[1, 2, 3]);
        let str = serde_json::to_string_pretty(&c).unwrap();
        let c2: View = serde_json::from_str(&str).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn dep_view_skips_holes() {
        let mut d = DepView::new();
        d.update_idx(ev(1, 1));
        d.update_idx(ev(1, 4));
        assert!(d.contains(ev(1, 1)));
        assert!(!d.contains(ev(1, 0)));
        assert!(!d.contains(ev(1, 2)));
        assert!(d.contains(ev(1, 4)));
        assert!(!d.contains(ev(1, 5)));

        d.update_idx(ev(1, 2));
        assert!(d.contains(ev(1, 2)));
        assert_eq!(d.holes(construct_thread_id(1)).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn dep_view_union() {
        let mut a = DepView::new();
        a.update_idx(ev(1, 1));
        a.update_idx(ev(1, 3));
        let mut b = DepView::new();
        b.update_idx(ev(1, 0));
        b.update_idx(ev(1, 5));
        b.update_idx(ev(2, 2));

        a.update(&b);
        let contained = (0..7).filter(|&i| a.contains(ev(1, i))).collect::<Vec<_>>();
        assert_eq!(contained, vec![0, 1, 3, 5]);
        assert!(a.contains(ev(2, 2)));
        assert!(!a.contains(ev(2, 1)));

        a.update_view(&clock(&[-1, 4]));
        let contained = (0..7).filter(|&i| a.contains(ev(1, i))).collect::<Vec<_>>();
        assert_eq!(contained, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn only_plain_clocks_are_views() {
        let mut v = VectorClock::new(false);
        v.update_idx(ev(1, 2));
        assert_eq!(v.as_view().and_then(|v| v.get(ev(1, 0).thread)), Some(2));
        assert!(VectorClock::new(true).as_view().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot merge a dependency view into a plain view")]
    fn mixing_views_is_a_bug() {
        let mut v = VectorClock::new(false);
        v.update(&VectorClock::new(true));
    }
}
