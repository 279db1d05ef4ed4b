//! The per-model consistency oracle.
//!
//! A [`Driver`] owns the data of one memory model and the working storage of its searches,
//! so its queries take `&mut self` and must not be interleaved.

use std::collections::HashSet;

use log::{debug, info, trace, warn};

use crate::automaton::{self, Automaton, Scratch};
use crate::errors::VerificationError;
use crate::event::Event;
use crate::event_label::{AsEventLabel, LabelEnum};
use crate::exec_graph::ExecutionGraph;
use crate::models::Model;
use crate::relation::{LabelPred, Relation};
use crate::value::SAddr;
use crate::vector_clock::{VectorClock, View};
use crate::{Config, Stats};

pub struct Driver {
    config: Config,
    model: Model,
    scratch: Scratch,
    stats: Stats,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        let model = Model::new(config.model);
        debug!("driver for {}", config.model);
        Self {
            config,
            model,
            scratch: Scratch::new(),
            stats: Stats::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_dep_tracking(&self) -> bool {
        self.model.dep_tracking
    }

    /// The index of the happens-before view of every label.
    pub fn hb_view(&self) -> usize {
        self.model.hb
    }

    fn hb<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        g.label(e).view(self.model.hb)
    }

    // The hb view `e` gets from program order alone
    fn view_before(&self, g: &ExecutionGraph, e: Event) -> View {
        g.po_imm_pred(e)
            .and_then(|p| g.label_opt(p))
            .map_or_else(View::new, |l| l.view(self.model.hb).clone())
    }

    /// Adds `lab` to the graph and computes its views.
    pub fn add_to_graph(&mut self, g: &mut ExecutionGraph, lab: LabelEnum) -> Event {
        let e = g.add_label(lab);
        self.update_mm_views(g, e);
        e
    }

    /// Computes the saved relations and views of `e` from those of its predecessors, and
    /// refreshes its prefix view.
    pub fn update_mm_views(&mut self, g: &mut ExecutionGraph, e: Event) {
        if e.is_init() {
            return;
        }
        let mut rels = Vec::with_capacity(self.model.saved.len());
        for aut in self.model.saved.iter() {
            rels.push(automaton::collect(aut, g, &mut self.scratch, g.label(e)));
        }
        g.label_mut(e).set_calculated(rels);

        // each view folds the same view of the predecessors
        let mut views = Vec::with_capacity(self.model.views.len());
        for (i, aut) in self.model.views.iter().enumerate() {
            let mut v = automaton::calculate_view(aut, g, &mut self.scratch, g.label(e), i);
            v.update_or_set(e);
            views.push(v);
        }
        trace!("views of {}: {:?}", e, views);
        let lab = g.label_mut(e);
        lab.set_views(views);
        lab.invalidate_prefix_view();
        self.prefix_view(g, e);
    }

    /// Recomputes every label's views in an order respecting porf, e.g. after a revisit
    /// changed some rf edges.
    pub fn refresh_views(&mut self, g: &mut ExecutionGraph) {
        for e in g.labels().map(|l| l.pos()).collect::<Vec<_>>() {
            g.label_mut(e).invalidate_prefix_view();
        }
        for e in g.porf_linearization() {
            self.update_mm_views(g, e);
        }
    }

    /// The prefix view of `e`, computed on first use and cached in its label.
    pub fn prefix_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g VectorClock {
        g.label(e)
            .prefix_view_or_init(|| self.calculate_prefix_view(g, e))
    }

    /// The events that must stay in the graph when `e` is kept: its porf-prefix, or for
    /// dependency-tracking models its pporf-prefix.
    pub fn calculate_prefix_view(&self, g: &ExecutionGraph, e: Event) -> VectorClock {
        let preds = if self.model.dep_tracking {
            pporf_preds(g, e)
        } else {
            g.porf_imm_preds(e).into_vec()
        };
        let mut v = VectorClock::new(self.model.dep_tracking);
        for p in preds.into_iter().filter(|&p| g.contains(p)) {
            v.update(self.prefix_view(g, p));
        }
        v.update_idx(e);
        v
    }

    /// Whether the graph is consistent, assuming it was consistent before `e` was added.
    pub fn is_consistent(&mut self, g: &ExecutionGraph, e: Event) -> bool {
        self.stats.consistency_checks += 1;
        let coherent = g
            .label(e)
            .addr()
            .map_or(true, |addr| self.is_coherent_at(g, addr));
        let res = coherent && self.is_acyclic(g);
        debug!("{} consistent after {}: {}", self.model.kind, e, res);
        self.record_verdict(g, res)
    }

    /// Whether the whole graph is consistent.
    pub fn is_consistent_graph(&mut self, g: &ExecutionGraph) -> bool {
        self.stats.consistency_checks += 1;
        let res = g.locations().all(|addr| self.is_coherent_at(g, addr)) && self.is_acyclic(g);
        debug!("{} consistent: {}", self.model.kind, res);
        self.record_verdict(g, res)
    }

    fn record_verdict(&mut self, g: &ExecutionGraph, res: bool) -> bool {
        if !res {
            self.stats.inconsistent += 1;
            if self.config.verbose > 0 {
                info!("inconsistent graph:\n{}", g);
            }
        }
        res
    }

    fn is_acyclic(&mut self, g: &ExecutionGraph) -> bool {
        for check in self.model.acyclic.iter() {
            if let Some(pre) = &check.precheck {
                if !automaton::any_accepting(pre, g, &mut self.scratch) {
                    trace!("{} skipped: no {}", check.body.name(), pre.name());
                    self.stats.prechecks_short_circuited += 1;
                    continue;
                }
            }
            if !automaton::is_acyclic(&check.body, g, &mut self.scratch) {
                debug!("{} has a cycle", check.body.name());
                return false;
            }
        }
        true
    }

    /// `irreflexive(hb; eco?)` and RMW atomicity at `addr`.
    fn is_coherent_at(&self, g: &ExecutionGraph, addr: SAddr) -> bool {
        match self.coherence_violation(g, addr) {
            Some((a, b)) => {
                debug!("coherence violated at {} between {} and {}", addr, a, b);
                false
            }
            None => true,
        }
    }

    fn coherence_violation(&self, g: &ExecutionGraph, addr: SAddr) -> Option<(Event, Event)> {
        let co = std::iter::once(Event::init())
            .chain(g.co(addr).iter().copied())
            .collect::<Vec<_>>();

        // hb agrees with co
        for (i, &w) in co.iter().enumerate().skip(1) {
            let v = self.hb(g, w);
            if let Some(&later) = co[i + 1..].iter().find(|&&o| v.contains(o)) {
                return Some((later, w));
            }
        }

        for &r in g.reads(addr) {
            let Some(w) = g.read_label(r).and_then(|rl| rl.rf()) else {
                continue;
            };
            let Some(wi) = co.iter().position(|&c| c == w) else {
                continue;
            };
            let v = self.hb(g, r);
            // rf; hb
            if self.hb(g, w).contains(r) {
                return Some((r, w));
            }
            // writes hb-before r are not co-after its source
            if let Some(&o) = co[wi + 1..].iter().find(|&&o| v.contains(o)) {
                return Some((o, r));
            }
            // writes hb-after r are co-after its source
            if let Some(&o) = co[1..=wi].iter().find(|&&o| self.hb(g, o).contains(r)) {
                return Some((r, o));
            }
            // reads hb-before r read from co-earlier writes
            for &r2 in g.reads(addr).iter().filter(|&&r2| r2 != r && v.contains(r2)) {
                let src = g.read_label(r2).and_then(|rl| rl.rf());
                if let Some(j) = src.and_then(|s| co.iter().position(|&c| c == s)) {
                    if j > wi {
                        return Some((r2, r));
                    }
                }
            }
            // nothing between an RMW's read and write
            if let Some(rmw) = g.rmw_succ(r) {
                if co.get(wi + 1) != Some(&rmw) {
                    return Some((r, rmw));
                }
            }
        }
        None
    }

    /// The first error `e` exhibits, with a witness event when there is one.
    pub fn check_errors(
        &mut self,
        g: &ExecutionGraph,
        e: Event,
    ) -> Option<(VerificationError, Option<Event>)> {
        let res = self.memory_error(g, e).or_else(|| self.race_error(g, e));
        if let Some((err, witness)) = res {
            self.stats.errors += 1;
            match witness {
                Some(w) => debug!("{} at {} (witness {})", err.tag(), e, w),
                None => debug!("{} at {}", err.tag(), e),
            }
        }
        res
    }

    fn memory_error(&self, g: &ExecutionGraph, e: Event) -> Option<(VerificationError, Option<Event>)> {
        use VerificationError::*;

        if !self.config.memory_checks {
            return None;
        }
        let lab = g.label(e);
        let hb = self.hb(g, e);
        match lab {
            LabelEnum::Free(f) => {
                let Some(m) = f.alloc() else {
                    return Some((FreeNonMalloc, None));
                };
                let mlab = g.malloc_label(m)?;
                if mlab.addr() != f.addr() {
                    return Some((FreeNonMalloc, Some(m)));
                }
                if let Some(d) = mlab.dealloc().filter(|&d| d != e) {
                    return Some((DoubleFree, Some(d)));
                }
                if !hb.contains(m) {
                    return Some((FreeNonMalloc, Some(m)));
                }
                mlab.accesses()
                    .iter()
                    .filter(|&&a| a != e && !hb.contains(a))
                    .min_by_key(|&&a| g.label(a).stamp())
                    .map(|&a| (AccessFreed, Some(a)))
            }
            LabelEnum::Read(_) | LabelEnum::Write(_) => {
                let addr = lab.addr()?;
                if !addr.is_dynamic() {
                    return None;
                }
                let Some(mlab) = g.find_allocating_label(addr) else {
                    return Some((AccessNonMalloc, None));
                };
                if !hb.contains(mlab.pos()) {
                    return Some((AccessNonMalloc, Some(mlab.pos())));
                }
                mlab.dealloc()
                    .filter(|&d| !self.hb(g, d).contains(e))
                    .map(|d| (AccessFreed, Some(d)))
            }
            _ => None,
        }
    }

    fn race_error(&mut self, g: &ExecutionGraph, e: Event) -> Option<(VerificationError, Option<Event>)> {
        if !self.config.race_detection {
            return None;
        }
        let lab = g.label(e);
        lab.addr()?;
        let aut = race_automaton(lab.is_write(), !lab.is_not_atomic());
        let hb = self.model.hb;
        let v = lab.view(hb);
        automaton::check_inclusion(&aut, g, &mut self.scratch, lab, |o| {
            v.contains(o.pos()) || o.view(hb).contains(e)
        })
        .map(|w| (VerificationError::RaceNotAtomic, Some(w)))
    }

    /// Write-write races between `e` and atomic writes it is not hb-ordered with, unless
    /// such races were already reported.
    pub fn check_warnings(
        &mut self,
        g: &ExecutionGraph,
        e: Event,
        seen: &HashSet<VerificationError>,
    ) -> Vec<(VerificationError, Event)> {
        let lab = g.label(e);
        if !self.config.ww_race_warnings
            || seen.contains(&VerificationError::WWRace)
            || !lab.is_write()
            || lab.is_not_atomic()
        {
            return vec![];
        }
        let Some(addr) = lab.addr() else {
            return vec![];
        };
        let v = self.hb(g, e);
        let mut res = g
            .co(addr)
            .iter()
            .copied()
            .filter(|&o| o != e && !v.contains(o) && !self.hb(g, o).contains(e))
            .filter(|&o| !g.label(o).is_not_atomic())
            .collect::<Vec<_>>();
        res.sort_by_key(|&o| g.label(o).stamp());
        for &o in res.iter() {
            warn!("{}: {} and {} are unordered", VerificationError::WWRace, e, o);
        }
        self.stats.warnings += res.len();
        res.into_iter()
            .map(|o| (VerificationError::WWRace, o))
            .collect()
    }

    /// Heap allocations that were never freed.
    pub fn check_unfreed_memory(&mut self, g: &ExecutionGraph) -> Vec<(VerificationError, Event)> {
        let res = g
            .labels()
            .filter_map(|l| match l {
                LabelEnum::Malloc(m) if m.addr().is_heap() && m.dealloc().is_none() => Some(m.pos()),
                _ => None,
            })
            .map(|m| (VerificationError::UnfreedMemory, m))
            .collect::<Vec<_>>();
        for (err, m) in res.iter() {
            warn!("{}: allocation at {}", err, m);
        }
        self.stats.warnings += res.len();
        res
    }

    /// The writes to `addr` that the read at `read` may read from without violating
    /// coherence, in coherence order.
    pub fn coherent_stores(&self, g: &ExecutionGraph, addr: SAddr, read: Event) -> Vec<Event> {
        let co_max = g.co_max(addr);
        if co_max.is_init() || co_max.is_po_before(read) {
            return vec![co_max];
        }
        let v = self.view_before(g, read);
        let co = std::iter::once(Event::init())
            .chain(g.co(addr).iter().copied())
            .collect::<Vec<_>>();
        // the latest write read- or hb-before the read, and everything concurrent after it
        let split = co
            .iter()
            .rposition(|&w| is_write_rf_before(g, &v, w, addr))
            .unwrap_or(0);
        let res = co[split..]
            .iter()
            .copied()
            .filter(|&w| w == co[split] || !self.hb(g, w).contains(read))
            .collect::<Vec<_>>();
        trace!("coherent stores of {} at {}: {:?}", read, addr, res);
        res
    }

    /// The writes after which `store` may be placed in the coherence order of `addr`.
    ///
    /// The write of an RMW goes right after the write its read reads from.
    pub fn coherent_placings(
        &self,
        g: &ExecutionGraph,
        addr: SAddr,
        store: Event,
        is_rmw: bool,
    ) -> Vec<Event> {
        if is_rmw {
            return match g.read_label(store.prev()).and_then(|r| r.rf()) {
                Some(rf) => vec![rf],
                None => panic!("{} does not follow a read with an rf", store),
            };
        }
        let v = self.view_before(g, store);
        let co = std::iter::once(Event::init())
            .chain(g.co(addr).iter().copied().filter(|&w| w != store))
            .collect::<Vec<_>>();
        let begin = co
            .iter()
            .rposition(|&w| is_write_rf_before(g, &v, w, addr))
            .unwrap_or(0);
        let end = co[begin + 1..]
            .iter()
            .position(|&w| self.is_hb_opt_rf_after(g, store, w, addr))
            .map_or(co.len(), |i| begin + 1 + i);
        let res = (begin..end)
            .filter(|&i| {
                // placing between an RMW and the write it reads from breaks atomicity
                co.get(i + 1)
                    .and_then(|&next| g.rmw_pred(next))
                    .and_then(|r| g.read_label(r))
                    .and_then(|r| r.rf())
                    != Some(co[i])
            })
            .map(|i| co[i])
            .collect::<Vec<_>>();
        trace!("coherent placings of {} at {}: {:?}", store, addr, res);
        res
    }

    // w is hb-after `store`, or read by something hb-after it
    fn is_hb_opt_rf_after(&self, g: &ExecutionGraph, store: Event, w: Event, addr: SAddr) -> bool {
        self.hb(g, w).contains(store)
            || g.readers(w, addr)
                .iter()
                .any(|&r| self.hb(g, r).contains(store))
    }

    /// The reads that `write` may revisit, given the prefix `pporf` that a revisit keeps.
    pub fn coherent_revisits(
        &mut self,
        g: &ExecutionGraph,
        write: Event,
        pporf: &VectorClock,
    ) -> Vec<Event> {
        let Some(addr) = g.write_label(write).map(|w| w.addr()) else {
            panic!("{} is not a write", write)
        };
        let mut ls = g.revisitable(write, pporf);

        // the latest other write is in the prefix: only its readers may move
        let prev_max = g
            .co(addr)
            .iter()
            .rev()
            .copied()
            .find(|&o| o != write)
            .unwrap_or_else(Event::init);
        if pporf.contains(prev_max) {
            let preds = g.readers(prev_max, addr);
            ls.retain(|r| preds.contains(r));
        }

        let opt_rfs = with_readers(g, g.co_after(write, addr).iter().copied(), addr);
        ls.retain(|&r| {
            let v = self.view_before(g, r);
            !opt_rfs.iter().any(|&o| v.contains(o))
        });
        trace!("revisit candidates of {} after co-later writes: {:?}", write, ls);

        if !self.model.dep_tracking && g.is_co_maximal(write, addr) {
            return ls;
        }

        let whb = self.hb(g, write);
        ls.retain(|&r| !whb.contains(r));

        let co_before = std::iter::once(Event::init()).chain(g.co_before(write, addr).iter().copied());
        let inv_opt_rfs = with_readers(g, co_before, addr);
        ls.retain(|&r| {
            let stamp = g.label(r).stamp();
            !inv_opt_rfs.iter().any(|&o| {
                o != r
                    && (pporf.contains(o) || g.label(o).stamp() <= stamp)
                    && self.hb(g, o).contains(r)
            })
        });
        trace!("revisit candidates of {}: {:?}", write, ls);
        ls
    }
}

fn with_readers(g: &ExecutionGraph, ws: impl Iterator<Item = Event>, addr: SAddr) -> Vec<Event> {
    ws.flat_map(|w| std::iter::once(w).chain(g.readers(w, addr).iter().copied()))
        .collect()
}

fn is_write_rf_before(g: &ExecutionGraph, v: &View, w: Event, addr: SAddr) -> bool {
    w.is_init() || v.contains(w) || g.readers(w, addr).iter().any(|&r| v.contains(r))
}

// Accesses racing with an access of the given kind: any access for writes, writes for
// reads; at least one side is non-atomic.
fn race_automaton(write: bool, atomic: bool) -> Automaton {
    let mut guard = if write {
        LabelPred::Access
    } else {
        LabelPred::Write
    };
    if atomic {
        guard = guard.and(LabelPred::Atomic.negate());
    }
    Automaton::new("race", 2)
        .accepting(1)
        .guarded_edge(0, Relation::SameLoc, guard, 1)
}

// Preserved program order and rf: dependencies, rf, thread create/join, the read of an
// RMW, and the po-prefix up to the last barrier.
fn pporf_preds(g: &ExecutionGraph, e: Event) -> Vec<Event> {
    let lab = g.label(e);
    let mut preds = lab.deps().all().iter().copied().collect::<Vec<_>>();
    preds.extend(g.tc_pred(e));
    preds.extend(g.tj_pred(e));
    preds.extend(g.rmw_pred(e));
    if let LabelEnum::Read(r) = lab {
        preds.extend(r.rf());
    }
    let before = &g.thread_labels(e.thread)[..e.index as usize];
    if lab.is_fence() || lab.is_at_least_release() {
        preds.extend(before.iter().map(|l| l.pos()));
    } else if let Some(b) = before
        .iter()
        .rev()
        .find(|l| l.is_fence() || l.is_at_least_acquire())
    {
        preds.push(b.pos());
    }
    preds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::EventDeps;
    use crate::event::ev;
    use crate::event_label::*;
    use crate::ordering::MemOrdering::{self, *};
    use crate::value::{RmwBinOp, SVal};
    use crate::MemoryModel;

    fn x() -> SAddr {
        SAddr::new_static(0)
    }

    fn driver(model: MemoryModel) -> Driver {
        Driver::new(Config::builder().with_model(model).build())
    }

    fn start(d: &mut Driver, g: &mut ExecutionGraph, t: u32) {
        d.add_to_graph(
            g,
            LabelEnum::ThreadStart(ThreadStartLabel::new(ev(t, 0), Event::init(), SVal(0))),
        );
    }

    fn write(d: &mut Driver, g: &mut ExecutionGraph, e: Event, ord: MemOrdering, v: u64) -> Event {
        d.add_to_graph(
            g,
            LabelEnum::Write(WriteLabel::new(e, ord, x(), 4, SVal(v), EventDeps::new())),
        )
    }

    fn read(d: &mut Driver, g: &mut ExecutionGraph, e: Event, ord: MemOrdering, rf: Event) -> Event {
        d.add_to_graph(
            g,
            LabelEnum::Read(ReadLabel::new(e, ord, x(), 4, EventDeps::new()).with_rf(rf)),
        )
    }

    #[test]
    fn views_include_the_event() {
        let mut d = driver(MemoryModel::RC11);
        let mut g = ExecutionGraph::new();
        start(&mut d, &mut g, 1);
        let w = write(&mut d, &mut g, ev(1, 1), Relaxed, 1);
        let v = g.label(w).view(d.hb_view());
        assert!(v.contains(w) && v.contains(ev(1, 0)) && v.contains(Event::init()));
        assert!(d.prefix_view(&g, w).contains(ev(1, 0)));
    }

    #[test]
    fn release_acquire_synchronizes() {
        for (wo, ro, sync) in [(Release, Acquire, true), (Relaxed, Acquire, false), (Release, Relaxed, false)] {
            let mut d = driver(MemoryModel::RC11);
            let mut g = ExecutionGraph::new();
            start(&mut d, &mut g, 1);
            start(&mut d, &mut g, 2);
            let w = write(&mut d, &mut g, ev(1, 1), wo, 1);
            let r = read(&mut d, &mut g, ev(2, 1), ro, w);
            assert_eq!(g.label(r).view(d.hb_view()).contains(w), sync);
            assert_eq!(g.label(r).calculated(0).contains(&w), sync);
        }
    }

    #[test]
    fn stores_after_a_po_earlier_write() {
        let mut d = driver(MemoryModel::RC11);
        let mut g = ExecutionGraph::new();
        start(&mut d, &mut g, 1);
        start(&mut d, &mut g, 2);
        assert_eq!(d.coherent_stores(&g, x(), ev(1, 1)), vec![Event::init()]);
        let w1 = write(&mut d, &mut g, ev(1, 1), Relaxed, 1);
        assert_eq!(d.coherent_stores(&g, x(), ev(1, 2)), vec![w1]);
        assert_eq!(d.coherent_stores(&g, x(), ev(2, 1)), vec![Event::init(), w1]);
    }

    #[test]
    fn placings_respect_rmw_atomicity() {
        let mut d = driver(MemoryModel::RC11);
        let mut g = ExecutionGraph::new();
        start(&mut d, &mut g, 1);
        start(&mut d, &mut g, 2);
        let r = d.add_to_graph(
            &mut g,
            LabelEnum::Read(
                ReadLabel::new_fai(ev(1, 1), Relaxed, x(), 4, RmwBinOp::Add, SVal(1), EventDeps::new())
                    .with_rf(Event::init()),
            ),
        );
        let rmw = d.add_to_graph(
            &mut g,
            LabelEnum::Write(WriteLabel::new_fai(ev(1, 2), Relaxed, x(), 4, SVal(1), EventDeps::new())),
        );
        assert_eq!(g.rmw_pred(rmw), Some(r));
        assert_eq!(d.coherent_placings(&g, x(), rmw, true), vec![Event::init()]);
        let w = write(&mut d, &mut g, ev(2, 1), Relaxed, 2);
        // not between Init and the RMW
        assert_eq!(d.coherent_placings(&g, x(), w, false), vec![rmw]);
    }

    #[test]
    fn unfreed_heap_memory_is_reported() {
        let mut d = driver(MemoryModel::RC11);
        let mut g = ExecutionGraph::new();
        start(&mut d, &mut g, 1);
        let m = d.add_to_graph(
            &mut g,
            LabelEnum::Malloc(MallocLabel::new(ev(1, 1), SAddr::new_heap(0), 8, EventDeps::new())),
        );
        d.add_to_graph(
            &mut g,
            LabelEnum::Malloc(MallocLabel::new(ev(1, 2), SAddr::new_automatic(0), 8, EventDeps::new())),
        );
        assert_eq!(
            d.check_unfreed_memory(&g),
            vec![(VerificationError::UnfreedMemory, m)]
        );
        assert_eq!(d.stats().warnings, 1);
    }

    #[test]
    fn pporf_skips_independent_events() {
        let mut d = driver(MemoryModel::IMM);
        let mut g = ExecutionGraph::new();
        start(&mut d, &mut g, 1);
        let r = read(&mut d, &mut g, ev(1, 1), Relaxed, Event::init());
        let w = write(&mut d, &mut g, ev(1, 2), Relaxed, 1);
        let pv = d.prefix_view(&g, w);
        assert!(matches!(pv, VectorClock::Dep(_)));
        assert!(pv.contains(ev(1, 0)) && !pv.contains(r));

        let dep = d.add_to_graph(
            &mut g,
            LabelEnum::Write(WriteLabel::new(
                ev(1, 3),
                Relaxed,
                SAddr::new_static(8),
                4,
                SVal(1),
                EventDeps::new().with_data(r),
            )),
        );
        let pv = d.prefix_view(&g, dep);
        assert!(pv.contains(r) && !pv.contains(w));
    }

    #[test]
    fn ww_races_are_warnings() {
        let mut d = driver(MemoryModel::RC11);
        let mut g = ExecutionGraph::new();
        start(&mut d, &mut g, 1);
        start(&mut d, &mut g, 2);
        let w1 = write(&mut d, &mut g, ev(1, 1), Relaxed, 1);
        let w2 = write(&mut d, &mut g, ev(2, 1), Relaxed, 2);
        assert_eq!(d.check_errors(&g, w2), None);
        let mut seen = HashSet::new();
        assert_eq!(
            d.check_warnings(&g, w2, &seen),
            vec![(VerificationError::WWRace, w1)]
        );
        seen.insert(VerificationError::WWRace);
        assert!(d.check_warnings(&g, w2, &seen).is_empty());
    }
}
