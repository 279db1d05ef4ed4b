use std::collections::{BTreeMap, HashSet};

use log::trace;
use paste::paste;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::event::Event;
use crate::event_label::*;
use crate::thread::{construct_thread_id, main_thread_id, ThreadId};
use crate::value::{SAddr, SVal};
use crate::vector_clock::{DepView, VectorClock, View};

/// Encapsulates the execution information about a single thread
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct ThreadInfo {
    tid: ThreadId,
    pub(crate) labels: Vec<LabelEnum>,
}

/// The arena owning every label of an execution.
///
/// Labels refer to each other by `Event`; every back-reference (readers, accesses,
/// deallocations, joins, linearization edges) is kept symmetric by the methods below.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionGraph {
    threads: Vec<ThreadInfo>,
    stamp: Stamp,
    /// Coherence order per location, Init excluded (it is implicitly first).
    co: BTreeMap<SAddr, Vec<Event>>,
    /// Reads per location, in insertion order.
    reads: BTreeMap<SAddr, Vec<Event>>,
    init_vals: BTreeMap<SAddr, SVal>,
    /// Allocations by base address.
    mallocs: BTreeMap<SAddr, Event>,
}

macro_rules! typed_accessors {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        paste! {
            $(
                pub fn [<$variant:snake _label>](&self, e: Event) -> Option<&$ty> {
                    match self.label_opt(e)? {
                        LabelEnum::$variant(l) => Some(l),
                        _ => None,
                    }
                }
            )*
        }
    };
}

macro_rules! typed_accessors_mut {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        paste! {
            $(
                pub(crate) fn [<$variant:snake _label_mut>](&mut self, e: Event) -> Option<&mut $ty> {
                    match self.label_opt_mut(e)? {
                        LabelEnum::$variant(l) => Some(l),
                        _ => None,
                    }
                }
            )*
        }
    };
}

impl ExecutionGraph {
    pub fn new() -> ExecutionGraph {
        ExecutionGraph {
            threads: vec![ThreadInfo {
                tid: main_thread_id(),
                labels: vec![LabelEnum::Init(InitLabel::new())],
            }],
            stamp: 1,
            co: BTreeMap::new(),
            reads: BTreeMap::new(),
            init_vals: BTreeMap::new(),
            mallocs: BTreeMap::new(),
        }
    }

    typed_accessors! {
        Read => ReadLabel,
        Write => WriteLabel,
        Malloc => MallocLabel,
        Free => FreeLabel,
        ThreadStart => ThreadStartLabel,
        ThreadFinish => ThreadFinishLabel,
        MethodBegin => MethodBeginLabel,
        MethodEnd => MethodEndLabel,
    }

    // thread starts are never edited after insertion
    typed_accessors_mut! {
        Read => ReadLabel,
        Write => WriteLabel,
        Malloc => MallocLabel,
        Free => FreeLabel,
        ThreadFinish => ThreadFinishLabel,
        MethodBegin => MethodBeginLabel,
        MethodEnd => MethodEndLabel,
    }

    pub fn init_label(&self) -> &InitLabel {
        match &self.threads[0].labels[0] {
            LabelEnum::Init(i) => i,
            other => panic!("{} found at the initializer position", other),
        }
    }

    fn init_label_mut(&mut self) -> &mut InitLabel {
        match &mut self.threads[0].labels[0] {
            LabelEnum::Init(i) => i,
            other => panic!("{} found at the initializer position", other),
        }
    }

    /// The largest stamp handed out so far.
    pub fn max_stamp(&self) -> Stamp {
        self.stamp - 1
    }

    fn next_stamp(&mut self) -> Stamp {
        let s = self.stamp;
        self.stamp += 1;
        s
    }

    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    pub fn thread_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.threads.iter().map(|t| t.tid)
    }

    pub fn thread_size(&self, t: ThreadId) -> usize {
        self.threads
            .get(usize::from(t))
            .map_or(0, |thr| thr.labels.len())
    }

    pub fn thread_labels(&self, t: ThreadId) -> &[LabelEnum] {
        self.threads
            .get(usize::from(t))
            .map_or(&[], |thr| thr.labels.as_slice())
    }

    pub fn thread_last(&self, t: ThreadId) -> Option<&LabelEnum> {
        self.thread_labels(t).last()
    }

    pub fn contains(&self, e: Event) -> bool {
        (e.index as usize) < self.thread_size(e.thread)
    }

    pub fn label(&self, e: Event) -> &LabelEnum {
        self.label_opt(e)
            .unwrap_or_else(|| panic!("no label at {} in the graph", e))
    }

    pub fn label_opt(&self, e: Event) -> Option<&LabelEnum> {
        self.threads
            .get(usize::from(e.thread))?
            .labels
            .get(e.index as usize)
    }

    pub(crate) fn label_mut(&mut self, e: Event) -> &mut LabelEnum {
        self.label_opt_mut(e)
            .unwrap_or_else(|| panic!("no label at {} in the graph", e))
    }

    fn label_opt_mut(&mut self, e: Event) -> Option<&mut LabelEnum> {
        self.threads
            .get_mut(usize::from(e.thread))?
            .labels
            .get_mut(e.index as usize)
    }

    pub fn init_val(&self, addr: SAddr) -> SVal {
        self.init_vals.get(&addr).copied().unwrap_or_default()
    }

    pub fn set_init_val(&mut self, addr: SAddr, val: SVal) {
        self.init_vals.insert(addr, val);
    }

    /// The allocation whose block covers `addr`, if any.
    pub fn find_allocating_label(&self, addr: SAddr) -> Option<&MallocLabel> {
        let (_, &m) = self.mallocs.range(..=addr).next_back()?;
        self.malloc_label(m).filter(|mlab| mlab.contains(addr))
    }

    /// Add a label at the end of its thread, giving it a new stamp if it does not have one.
    ///
    /// Reads are linked to their rf source, writes are placed last in coherence order and
    /// memory events are linked to their allocation.
    pub fn add_label(&mut self, mut lab: LabelEnum) -> Event {
        let pos = lab.pos();
        let tid = usize::from(pos.thread);
        assert!(!pos.is_init(), "the initializer is created with the graph");
        if tid >= self.threads.len() {
            assert!(
                pos.index == 0 && matches!(lab, LabelEnum::ThreadStart(_)),
                "thread {} must begin with a ThreadStart label, found {}",
                pos.thread,
                lab
            );
            for t in self.threads.len()..=tid {
                self.threads.push(ThreadInfo {
                    tid: construct_thread_id(t as u32),
                    labels: vec![],
                });
            }
        }
        assert_eq!(
            pos.index as usize,
            self.thread_size(pos.thread),
            "labels are appended at the end of their thread"
        );

        match lab.stamp_opt() {
            Some(s) => self.stamp = self.stamp.max(s + 1),
            None => lab.set_stamp(self.next_stamp()),
        }
        lab.clear_back_references();
        self.threads[tid].labels.push(lab);
        self.link(pos);
        trace!("added {}", self.label(pos));
        pos
    }

    fn link(&mut self, pos: Event) {
        let lab = self.label(pos);
        if let Some(addr) = lab.addr() {
            if let Some(m) = self.find_allocating_label(addr).map(|m| m.pos()) {
                if let Some(m) = self.malloc_label_mut(m) {
                    m.add_access(pos);
                }
            }
        }
        match self.label(pos) {
            LabelEnum::Read(r) => {
                let (addr, rf) = (r.addr(), r.rf());
                self.reads.entry(addr).or_default().push(pos);
                if let Some(rf) = rf {
                    self.add_to_readers(pos, addr, rf);
                }
            }
            LabelEnum::Write(w) => {
                let addr = w.addr();
                self.co.entry(addr).or_default().push(pos);
            }
            LabelEnum::Malloc(m) => {
                let addr = m.addr();
                self.mallocs.insert(addr, pos);
            }
            LabelEnum::Free(f) => {
                let addr = f.addr();
                let alloc = self.find_allocating_label(addr).map(|m| m.pos());
                if let Some(f) = self.free_label_mut(pos) {
                    f.set_alloc(alloc);
                }
                if let Some(m) = alloc.and_then(|m| self.malloc_label_mut(m)) {
                    if m.dealloc().is_none() {
                        m.set_dealloc(Some(pos));
                    }
                }
            }
            LabelEnum::ThreadJoin(j) => {
                let child = j.child();
                if let Some(LabelEnum::ThreadFinish(fin)) = self.thread_last(child) {
                    let fpos = fin.pos();
                    if let Some(fin) = self.thread_finish_label_mut(fpos) {
                        fin.set_parent_join(Some(pos));
                    }
                }
            }
            _ => {}
        }
    }

    fn add_to_readers(&mut self, read: Event, addr: SAddr, rf: Event) {
        if rf.is_init() {
            self.init_label_mut().add_reader(addr, read);
            return;
        }
        match self.write_label_mut(rf) {
            Some(w) => w.add_reader(read),
            None => panic!("read {} reads from {} which is not a write", read, rf),
        }
    }

    // Removes read from the readers of its source; the source may already be gone
    fn remove_from_readers(&mut self, read: Event) {
        let Some(r) = self.read_label(read) else {
            panic!("{} is not a read", read)
        };
        let (addr, rf) = (r.addr(), r.rf());
        match rf {
            Some(rf) if rf.is_init() => self.init_label_mut().remove_reader(addr, |e| e == read),
            Some(rf) if self.contains(rf) => {
                if let Some(w) = self.write_label_mut(rf) {
                    w.remove_reader(|e| e == read);
                }
            }
            _ => {}
        }
    }

    /// Change rf in-place, updating the writes' readers
    pub fn change_rf(&mut self, read: Event, rf: Option<Event>) {
        self.remove_from_readers(read);
        let addr = match self.read_label_mut(read) {
            Some(r) => {
                r.set_rf(rf);
                r.addr()
            }
            None => panic!("{} is not a read", read),
        };
        if let Some(rf) = rf {
            self.add_to_readers(read, addr, rf);
        }
        self.label_mut(read).invalidate_prefix_view();
    }

    /// Places `store` immediately after `pred` in the coherence order of its location.
    ///
    /// `pred` may be Init, which puts `store` first.
    pub fn add_store_to_co(&mut self, store: Event, pred: Event) {
        let addr = match self.write_label(store) {
            Some(w) => w.addr(),
            None => panic!("{} is not a write", store),
        };
        let co = self.co.entry(addr).or_default();
        co.retain(|&w| w != store);
        let at = if pred.is_init() {
            0
        } else {
            match co.iter().position(|&w| w == pred) {
                Some(i) => i + 1,
                None => panic!("{} is not in the coherence order of {}", pred, addr),
            }
        };
        co.insert(at, store);
    }

    /// Locations written or read in the graph.
    pub fn locations(&self) -> impl Iterator<Item = SAddr> + '_ {
        let mut locs = self.co.keys().chain(self.reads.keys()).copied().collect::<Vec<_>>();
        locs.sort();
        locs.dedup();
        locs.into_iter()
    }

    /// The writes to `addr` in coherence order, Init excluded.
    pub fn co(&self, addr: SAddr) -> &[Event] {
        self.co.get(&addr).map_or(&[], |v| v.as_slice())
    }

    /// The reads of `addr` in insertion order.
    pub fn reads(&self, addr: SAddr) -> &[Event] {
        self.reads.get(&addr).map_or(&[], |v| v.as_slice())
    }

    /// The readers of `w` at `addr`; `addr` only matters when `w` is Init.
    pub fn readers(&self, w: Event, addr: SAddr) -> &[Event] {
        if w.is_init() {
            self.init_label().readers(addr)
        } else {
            self.write_label(w).map_or(&[], |w| w.readers())
        }
    }

    /// Position of `w` in the coherence order of `addr`, counting Init as 0.
    pub fn co_position(&self, w: Event, addr: SAddr) -> usize {
        if w.is_init() {
            return 0;
        }
        match self.co(addr).iter().position(|&c| c == w) {
            Some(i) => i + 1,
            None => panic!("{} is not in the coherence order of {}", w, addr),
        }
    }

    pub fn co_max(&self, addr: SAddr) -> Event {
        self.co(addr).last().copied().unwrap_or_else(Event::init)
    }

    pub fn is_co_maximal(&self, w: Event, addr: SAddr) -> bool {
        self.co_max(addr) == w
    }

    pub fn co_imm_pred(&self, w: Event, addr: SAddr) -> Event {
        match self.co_position(w, addr) {
            0 => panic!("Init has no coherence predecessor"),
            1 => Event::init(),
            i => self.co(addr)[i - 2],
        }
    }

    pub fn co_imm_succ(&self, w: Event, addr: SAddr) -> Option<Event> {
        self.co(addr).get(self.co_position(w, addr)).copied()
    }

    /// The writes coherence-after `w`.
    pub fn co_after(&self, w: Event, addr: SAddr) -> &[Event] {
        &self.co(addr)[self.co_position(w, addr)..]
    }

    /// The writes coherence-before `w`, Init excluded.
    pub fn co_before(&self, w: Event, addr: SAddr) -> &[Event] {
        let i = self.co_position(w, addr);
        &self.co(addr)[..i.saturating_sub(1)]
    }

    pub fn is_co_before(&self, a: Event, b: Event, addr: SAddr) -> bool {
        self.co_position(a, addr) < self.co_position(b, addr)
    }

    pub fn po_imm_pred(&self, e: Event) -> Option<Event> {
        (e.index > 0).then(|| e.prev())
    }

    pub fn po_imm_succ(&self, e: Event) -> Option<Event> {
        Some(e.next()).filter(|&n| self.contains(n))
    }

    /// The ThreadCreate (or Init) that spawned the thread starting at `e`.
    pub fn tc_pred(&self, e: Event) -> Option<Event> {
        self.thread_start_label(e).map(|s| s.create())
    }

    /// The ThreadFinish a join at `e` waited for.
    pub fn tj_pred(&self, e: Event) -> Option<Event> {
        match self.label_opt(e)? {
            LabelEnum::ThreadJoin(j) => match self.thread_last(j.child()) {
                Some(LabelEnum::ThreadFinish(fin)) => Some(fin.pos()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The immediate po, rf, thread-create and thread-join predecessors of `e`.
    pub fn porf_imm_preds(&self, e: Event) -> SmallVec<[Event; 4]> {
        let mut preds = SmallVec::new();
        preds.extend(self.po_imm_pred(e));
        match self.label(e) {
            LabelEnum::Read(r) => preds.extend(r.rf()),
            LabelEnum::ThreadStart(s) => preds.push(s.create()),
            LabelEnum::ThreadJoin(_) => preds.extend(self.tj_pred(e)),
            _ => {}
        }
        preds
    }

    /// Every label, thread by thread.
    pub fn labels(&self) -> impl Iterator<Item = &LabelEnum> {
        self.threads.iter().flat_map(|t| t.labels.iter())
    }

    /// Every label, by increasing stamp.
    pub fn labels_by_stamp(&self) -> impl Iterator<Item = &LabelEnum> {
        self.threads
            .iter()
            .map(|t| {
                let sorted = t.labels.windows(2).all(|w| w[0].stamp() < w[1].stamp());
                if sorted {
                    Box::new(t.labels.iter()) as Box<dyn Iterator<Item = &LabelEnum>>
                } else {
                    let mut labs = t.labels.iter().collect::<Vec<_>>();
                    labs.sort_by_key(|l| l.stamp());
                    Box::new(labs.into_iter()) as Box<dyn Iterator<Item = &LabelEnum>>
                }
            })
            .fold(
                Box::new(std::iter::empty()) as Box<dyn Iterator<Item = &LabelEnum>>,
                |acc, it| {
                    Box::new(merging_iterator::MergeIter::with_custom_ordering(
                        acc,
                        it,
                        |a, b| a.stamp() < b.stamp(),
                    ))
                },
            )
    }

    /// An order of all events in which every event follows its porf predecessors.
    pub fn porf_linearization(&self) -> Vec<Event> {
        let mut done = HashSet::new();
        let mut order = vec![];
        for lab in self.labels_by_stamp() {
            self.linearize_util(lab.pos(), &mut done, &mut order);
        }
        order
    }

    fn linearize_util(&self, e: Event, done: &mut HashSet<Event>, order: &mut Vec<Event>) {
        if !done.insert(e) {
            return;
        }
        for p in self.porf_imm_preds(e) {
            self.linearize_util(p, done, order);
        }
        order.push(e);
    }

    /// The RMW write of `read`, if `read` is the read half of a completed RMW.
    pub fn rmw_succ(&self, read: Event) -> Option<Event> {
        self.read_label(read)
            .filter(|r| r.is_rmw(self))
            .map(|_| read.next())
    }

    /// The RMW read of `write`, if `write` is the write half of an RMW.
    pub fn rmw_pred(&self, write: Event) -> Option<Event> {
        self.write_label(write)
            .filter(|w| w.is_rmw())
            .map(|_| write.prev())
    }

    /// Another RMW that reads from the same write as the RMW `write`, if there is one.
    pub fn pending_rmw(&self, write: Event) -> Option<Event> {
        let read = self.rmw_pred(write)?;
        let rlab = self.read_label(read)?;
        let rf = rlab.rf()?;
        self.readers(rf, rlab.addr())
            .iter()
            .copied()
            .filter(|&r| r != read)
            .find(|&r| self.read_label(r).is_some_and(|o| o.is_rmw(self)))
    }

    /// The reads of `write`'s location that may be revisited to read from it.
    ///
    /// Excludes reads in `prefix`, stable reads, reads that already read from `write`, and
    /// reads added after another pending RMW on the same source.
    pub fn revisitable(&self, write: Event, prefix: &VectorClock) -> Vec<Event> {
        let addr = match self.write_label(write) {
            Some(w) => w.addr(),
            None => panic!("{} is not a write", write),
        };
        let pending = self.pending_rmw(write).map(|p| self.label(p).stamp());
        self.reads(addr)
            .iter()
            .copied()
            .filter(|&r| {
                let lab = self.label(r);
                !prefix.contains(r)
                    && lab.is_revisitable()
                    && lab.was_added_max()
                    && self.read_label(r).and_then(|rl| rl.rf()) != Some(write)
                    && pending.map_or(true, |p| lab.stamp() <= p)
            })
            .collect()
    }

    /// Orders the method call ending at `end` before the one beginning at `begin`.
    pub fn add_lin_edge(&mut self, end: Event, begin: Event) {
        match self.method_end_label_mut(end) {
            Some(e) => e.lin_succs_mut().insert(begin),
            None => panic!("{} is not a method end", end),
        };
        match self.method_begin_label_mut(begin) {
            Some(b) => b.lin_preds_mut().insert(end),
            None => panic!("{} is not a method begin", begin),
        };
    }

    pub fn remove_lin_edge(&mut self, end: Event, begin: Event) {
        if let Some(e) = self.method_end_label_mut(end) {
            e.lin_succs_mut().erase(&begin);
        }
        if let Some(b) = self.method_begin_label_mut(begin) {
            b.lin_preds_mut().erase(&end);
        }
    }

    // Drops every reference other labels hold to the label at pos
    fn unlink(&mut self, pos: Event) {
        if let Some(addr) = self.label(pos).addr() {
            if let Some(m) = self.find_allocating_label(addr).map(|m| m.pos()) {
                if let Some(m) = self.malloc_label_mut(m) {
                    m.remove_access(pos);
                }
            }
        }
        match self.label(pos) {
            LabelEnum::Read(r) => {
                let addr = r.addr();
                self.remove_from_readers(pos);
                if let Some(reads) = self.reads.get_mut(&addr) {
                    reads.retain(|&r| r != pos);
                }
            }
            LabelEnum::Write(w) => {
                let (addr, readers) = (w.addr(), w.readers().to_vec());
                for r in readers {
                    if let Some(r) = self.read_label_mut(r) {
                        r.set_rf(None);
                    }
                }
                if let Some(co) = self.co.get_mut(&addr) {
                    co.retain(|&w| w != pos);
                }
            }
            LabelEnum::Malloc(m) => {
                let addr = m.addr();
                self.mallocs.remove(&addr);
                let frees = self
                    .labels()
                    .filter_map(|l| match l {
                        LabelEnum::Free(f) if f.alloc() == Some(pos) => Some(f.pos()),
                        _ => None,
                    })
                    .collect::<Vec<_>>();
                for f in frees {
                    if let Some(f) = self.free_label_mut(f) {
                        f.set_alloc(None);
                    }
                }
            }
            LabelEnum::Free(f) => {
                if let Some(m) = f.alloc() {
                    if self.malloc_label(m).and_then(|m| m.dealloc()) == Some(pos) {
                        let next = self
                            .labels_by_stamp()
                            .find(|l| match l {
                                LabelEnum::Free(o) => o.alloc() == Some(m) && o.pos() != pos,
                                _ => false,
                            })
                            .map(|l| l.pos());
                        if let Some(m) = self.malloc_label_mut(m) {
                            m.set_dealloc(next);
                        }
                    }
                }
            }
            LabelEnum::ThreadJoin(j) => {
                if let Some(LabelEnum::ThreadFinish(fin)) = self.thread_last(j.child()) {
                    if fin.parent_join() == Some(pos) {
                        let fpos = fin.pos();
                        if let Some(fin) = self.thread_finish_label_mut(fpos) {
                            fin.set_parent_join(None);
                        }
                    }
                }
            }
            LabelEnum::MethodBegin(b) => {
                for end in b.lin_preds().iter().copied().collect::<Vec<_>>() {
                    self.remove_lin_edge(end, pos);
                }
            }
            LabelEnum::MethodEnd(e) => {
                for begin in e.lin_succs().iter().copied().collect::<Vec<_>>() {
                    self.remove_lin_edge(pos, begin);
                }
            }
            _ => {}
        }
    }

    /// Removes the last label of `t`, returning it with all its caches reset.
    pub fn remove_last(&mut self, t: ThreadId) -> LabelEnum {
        let Some(pos) = self.thread_last(t).map(|l| l.pos()) else {
            panic!("thread {} has no labels", t)
        };
        assert!(!pos.is_init(), "the initializer cannot be removed");
        self.unlink(pos);
        let mut lab = self.threads[usize::from(t)]
            .labels
            .pop()
            .unwrap_or_else(|| unreachable!());
        lab.reset();
        lab
    }

    /// Return a view with all the events up to the stamp (inclusive)
    ///
    /// The view has holes when events were added out of program order.
    pub fn view_from_stamp(&self, s: Stamp) -> VectorClock {
        let in_order = self
            .threads
            .iter()
            .all(|t| t.labels.windows(2).all(|w| w[0].stamp() < w[1].stamp()));
        if in_order {
            let mut v = View::new();
            for thread in self.threads.iter() {
                // Label are sorted by stamp. Find the last, if any, s.t. stamp <= s.
                let i = thread.labels.partition_point(|lab| lab.stamp() <= s);
                if i != 0 {
                    v.update_or_set(thread.labels[i - 1].pos());
                }
            }
            VectorClock::Plain(v)
        } else {
            let mut v = DepView::new();
            for lab in self.labels().filter(|l| l.stamp() <= s) {
                v.update_idx(lab.pos());
            }
            VectorClock::Dep(v)
        }
    }

    /// Restricts the graph to the events in `v`; holes become Empty labels.
    pub fn cut_to_view(&mut self, v: &VectorClock) {
        let removed = self
            .labels()
            .map(|l| l.pos())
            .filter(|&e| !e.is_init() && !v.contains(e))
            .collect::<Vec<_>>();
        for &e in removed.iter() {
            self.unlink(e);
        }

        for thread in self.threads.iter_mut() {
            let keep = match v.get(thread.tid) {
                Some(max) => max as usize + 1,
                None if thread.tid == main_thread_id() => 1,
                None => 0,
            };
            thread.labels.truncate(keep);
            for i in 0..thread.labels.len() {
                let pos = thread.labels[i].pos();
                if !pos.is_init() && !v.contains(pos) {
                    let view = match i {
                        0 => View::new(),
                        _ if thread.labels[i - 1].views_len() > 0 => {
                            thread.labels[i - 1].view(0).clone()
                        }
                        _ => View::new(),
                    };
                    thread.labels[i] = empty_label(pos, thread.labels[i].stamp(), view);
                }
            }
        }
        while self.threads.len() > 1 && self.threads.last().is_some_and(|t| t.labels.is_empty()) {
            self.threads.pop();
        }
        self.co.retain(|_, ws| !ws.is_empty());
        self.reads.retain(|_, rs| !rs.is_empty());
        for thread in self.threads.iter_mut() {
            for lab in thread.labels.iter_mut() {
                lab.invalidate_prefix_view();
            }
        }
        trace!("cut to {} ({} events removed)", v, removed.len());
    }

    pub fn cut_to_stamp(&mut self, s: Stamp) {
        let v = self.view_from_stamp(s);
        self.cut_to_view(&v);
    }

    pub fn copy_to_view(&self, v: &VectorClock) -> ExecutionGraph {
        let mut other = self.clone();
        other.cut_to_view(v);
        other
    }
}

fn empty_label(pos: Event, stamp: Stamp, mut view: View) -> LabelEnum {
    let mut lab = LabelEnum::Empty(EmptyLabel::new(pos));
    lab.set_stamp(stamp);
    view.update_or_set(pos);
    lab.set_views(vec![view]);
    lab.set_calculated(vec![Default::default()]);
    lab
}

impl Default for ExecutionGraph {
    fn default() -> Self {
        ExecutionGraph::new()
    }
}

impl std::fmt::Display for ExecutionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for thread_info in self.threads.iter() {
            writeln!(f, "thread {}:", thread_info.tid)?;
            for lab in thread_info.labels.iter() {
                writeln!(f, "\t{}", lab)?;
            }
        }
        for (addr, co) in self.co.iter() {
            let co = co.iter().map(|e| e.to_string()).collect::<Vec<_>>();
            writeln!(f, "co({}): INIT, {}", addr, co.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::EventDeps;
    use crate::event::ev;
    use crate::ordering::MemOrdering::*;

    fn x() -> SAddr {
        SAddr::new_static(0)
    }

    fn start(g: &mut ExecutionGraph, t: u32) {
        g.add_label(LabelEnum::ThreadStart(ThreadStartLabel::new(
            ev(t, 0),
            Event::init(),
            SVal(0),
        )));
    }

    fn write(g: &mut ExecutionGraph, e: Event, addr: SAddr, v: u64) -> Event {
        g.add_label(LabelEnum::Write(WriteLabel::new(
            e,
            Relaxed,
            addr,
            4,
            SVal(v),
            EventDeps::new(),
        )))
    }

    fn read(g: &mut ExecutionGraph, e: Event, addr: SAddr, rf: Event) -> Event {
        g.add_label(LabelEnum::Read(
            ReadLabel::new(e, Relaxed, addr, 4, EventDeps::new()).with_rf(rf),
        ))
    }

    fn readers_symmetric(g: &ExecutionGraph) -> bool {
        g.labels().all(|l| match l {
            LabelEnum::Read(r) => match r.rf() {
                Some(rf) => g.readers(rf, r.addr()).contains(&r.pos()),
                None => true,
            },
            LabelEnum::Write(w) => w
                .readers()
                .iter()
                .all(|&r| g.read_label(r).and_then(|r| r.rf()) == Some(w.pos())),
            _ => true,
        })
    }

    #[test]
    fn stamps_grow_with_insertion() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        write(&mut g, ev(2, 1), x(), 1);
        write(&mut g, ev(1, 1), x(), 2);
        let stamps = g.labels_by_stamp().map(|l| l.stamp()).collect::<Vec<_>>();
        assert_eq!(stamps, vec![0, 1, 2, 3, 4]);
        assert_eq!(g.label(ev(1, 1)).stamp(), 4);
        assert_eq!(g.max_stamp(), 4);
    }

    #[test]
    #[should_panic(expected = "must begin with a ThreadStart")]
    fn threads_begin_with_start() {
        let mut g = ExecutionGraph::new();
        write(&mut g, ev(1, 0), x(), 1);
    }

    #[test]
    fn change_rf_keeps_readers_symmetric() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        let w = write(&mut g, ev(1, 1), x(), 1);
        let r = read(&mut g, ev(2, 1), x(), Event::init());
        assert_eq!(g.readers(Event::init(), x()), &[r]);
        assert!(readers_symmetric(&g));

        g.change_rf(r, Some(w));
        assert!(g.readers(Event::init(), x()).is_empty());
        assert_eq!(g.readers(w, x()), &[r]);
        assert!(readers_symmetric(&g));

        g.change_rf(r, None);
        assert!(g.readers(w, x()).is_empty());
        assert!(readers_symmetric(&g));
    }

    #[test]
    fn removing_a_write_leaves_its_readers_at_bottom() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        let w = write(&mut g, ev(1, 1), x(), 1);
        let r = read(&mut g, ev(2, 1), x(), w);
        let removed = g.remove_last(w.thread);
        assert!(!removed.stamped());
        assert_eq!(g.read_label(r).and_then(|r| r.rf()), None);
        assert!(g.co(x()).is_empty());
        // the stale source is gone; re-pointing the read must not touch it
        g.change_rf(r, Some(Event::init()));
        assert!(readers_symmetric(&g));
    }

    #[test]
    fn coherence_placement() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        let a = write(&mut g, ev(1, 1), x(), 1);
        let b = write(&mut g, ev(1, 2), x(), 2);
        let c = write(&mut g, ev(1, 3), x(), 3);
        assert_eq!(g.co(x()), &[a, b, c]);
        g.add_store_to_co(c, Event::init());
        assert_eq!(g.co(x()), &[c, a, b]);
        g.add_store_to_co(c, a);
        assert_eq!(g.co(x()), &[a, c, b]);
        assert_eq!(g.co_imm_pred(a, x()), Event::init());
        assert_eq!(g.co_imm_succ(c, x()), Some(b));
        assert_eq!(g.co_imm_succ(b, x()), None);
        assert!(g.is_co_maximal(b, x()));
        assert!(g.is_co_before(Event::init(), a, x()));
        assert_eq!(g.co_after(a, x()), &[c, b]);
        assert_eq!(g.co_before(b, x()), &[a, c]);
    }

    #[test]
    fn first_free_is_the_deallocation() {
        let h = SAddr::new_heap(0);
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        let m = g.add_label(LabelEnum::Malloc(MallocLabel::new(ev(1, 1), h, 16, EventDeps::new())));
        let w = write(&mut g, ev(1, 2), h.add(8), 1);
        let f1 = g.add_label(LabelEnum::Free(FreeLabel::new(ev(1, 3), h, EventDeps::new())));
        let f2 = g.add_label(LabelEnum::Free(FreeLabel::new(ev(2, 1), h, EventDeps::new())));

        let mlab = g.malloc_label(m).unwrap();
        assert_eq!(mlab.dealloc(), Some(f1));
        assert_eq!(mlab.accesses(), &[w]);
        assert_eq!(g.free_label(f2).unwrap().alloc(), Some(m));
        assert_eq!(g.find_allocating_label(h.add(15)).map(|m| m.pos()), Some(m));
        assert!(g.find_allocating_label(h.add(16)).is_none());

        g.remove_last(f2.thread);
        g.remove_last(f1.thread);
        assert_eq!(g.malloc_label(m).unwrap().dealloc(), None);
    }

    #[test]
    fn linearization_edges_cascade() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        let b1 = g.add_label(LabelEnum::MethodBegin(MethodBeginLabel::new(ev(1, 1), "push", SVal(1))));
        let e1 = g.add_label(LabelEnum::MethodEnd(MethodEndLabel::new(ev(1, 2), "push", SVal(0))));
        let b2 = g.add_label(LabelEnum::MethodBegin(MethodBeginLabel::new(ev(2, 1), "pop", SVal(0))));
        g.add_lin_edge(e1, b2);
        assert!(g.method_begin_label(b2).unwrap().lin_preds().contains(&e1));
        assert!(g.method_end_label(e1).unwrap().lin_succs().contains(&b2));

        g.remove_last(b2.thread);
        assert!(g.method_end_label(e1).unwrap().lin_succs().is_empty());
        assert!(g.method_begin_label(b1).unwrap().lin_preds().is_empty());
    }

    #[test]
    fn cut_to_stamp_drops_later_events() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        let w = write(&mut g, ev(1, 1), x(), 1);
        let r = read(&mut g, ev(2, 1), x(), w);
        let w2 = write(&mut g, ev(1, 2), x(), 2);
        g.cut_to_stamp(g.label(r).stamp());
        assert!(!g.contains(w2));
        assert!(g.contains(r));
        assert_eq!(g.co(x()), &[w]);
        assert!(readers_symmetric(&g));

        let small = g.copy_to_view(&g.view_from_stamp(1));
        assert_eq!(small.num_threads(), 2);
        assert_eq!(small.thread_size(construct_thread_id(1)), 1);
        assert!(!small.contains(w));
        assert!(small.co(x()).is_empty());
        assert_eq!(g.co(x()), &[w]);
    }

    #[test]
    fn cut_with_holes_leaves_empty_labels() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        let a = write(&mut g, ev(1, 1), x(), 1);
        let b = write(&mut g, ev(1, 2), x(), 2);
        let mut v = DepView::new();
        v.update_idx(Event::init());
        v.update_idx(ev(1, 0));
        v.update_idx(b);
        v.add_hole(a);
        g.cut_to_view(&VectorClock::Dep(v));
        assert!(matches!(g.label(a), LabelEnum::Empty(_)));
        assert_eq!(g.co(x()), &[b]);
        assert_eq!(g.label(a).view(1), g.label(a).view(0));
    }

    #[test]
    fn porf_linearization_respects_rf() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        start(&mut g, 2);
        let r = read(&mut g, ev(1, 1), x(), Event::init());
        let w = write(&mut g, ev(2, 1), x(), 1);
        g.change_rf(r, Some(w));
        let order = g.porf_linearization();
        let at = |e| order.iter().position(|&o| o == e).unwrap();
        assert!(at(w) < at(r));
        assert!(at(ev(2, 0)) < at(w));
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn graph_is_serializable() {
        let mut g = ExecutionGraph::new();
        start(&mut g, 1);
        let w = write(&mut g, ev(1, 1), x(), 1);
        read(&mut g, ev(1, 2), x(), w);
        let json = serde_json::to_string(&g).unwrap();
        let g2: ExecutionGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(g2.co(x()), g.co(x()));
        assert_eq!(g2.readers(w, x()), &[ev(1, 2)]);
        assert_eq!(g2.to_string(), g.to_string());
    }
}
