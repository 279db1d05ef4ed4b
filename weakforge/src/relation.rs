//! Relations between events, and tests on single events.
//!
//! Relations are traversed backwards: `neighbours` yields the events related *to* the given
//! one (its predecessors), except for the few `*Succ*` relations.

use smallvec::SmallVec;

use crate::event::Event;
use crate::event_label::{AsEventLabel, LabelEnum};
use crate::exec_graph::ExecutionGraph;
use crate::value::SAddr;
use crate::vector_clock::View;

pub type Neighbours = SmallVec<[Event; 4]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    PoImmPred,
    PoImmSucc,
    /// Every po-earlier access to the same location.
    PoLocPreds,
    RfPred,
    /// rf from another thread.
    RfePred,
    /// rf from the same thread.
    RfiPred,
    RfSuccs,
    CoImmPred,
    CoImmSucc,
    /// Reads of the immediate co-predecessor.
    FrImmPred,
    /// The co-successor of the write a read reads from.
    FrImmSucc,
    RmwPred,
    RmwSucc,
    TcPred,
    TjPred,
    /// Union of all dependency kinds.
    DepPreds,
    AddrPreds,
    DataPreds,
    CtrlPreds,
    /// A saved per-label relation.
    Calculated(usize),
    /// Everything in the given view but the event itself.
    HbPreds(usize),
    /// Predecessors in `(rf ∪ co ∪ fr)+`, i.e. rf, co;rf?, fr;rf?.
    EcoPreds,
    /// `po ∪ po≠loc;hb;po≠loc ∪ hb|loc ∪ co ∪ fr`, with hb read from the given view.
    ScbPreds(usize),
    /// Every other read or write of the same location, Init excluded.
    SameLoc,
    /// `(coe; rfe) ∩ po`: po-earlier writes of the thread that are co-before the external
    /// write a read reads from.
    DetourPreds,
}

impl Relation {
    pub fn neighbours(&self, g: &ExecutionGraph, e: Event) -> Neighbours {
        let lab = g.label(e);
        let mut res = Neighbours::new();
        match self {
            Relation::PoImmPred => res.extend(g.po_imm_pred(e)),
            Relation::PoImmSucc => res.extend(g.po_imm_succ(e)),
            Relation::PoLocPreds => {
                if let Some(addr) = lab.addr() {
                    res.extend(
                        g.thread_labels(e.thread)[..e.index as usize]
                            .iter()
                            .filter(|l| l.addr() == Some(addr))
                            .map(|l| l.pos()),
                    )
                }
            }
            Relation::RfPred => res.extend(rf(lab)),
            Relation::RfePred => res.extend(rf(lab).filter(|w| w.thread != e.thread)),
            Relation::RfiPred => res.extend(rf(lab).filter(|w| w.thread == e.thread)),
            Relation::RfSuccs => match lab {
                LabelEnum::Init(i) => {
                    for addr in i.addrs_read() {
                        res.extend_from_slice(i.readers(addr))
                    }
                }
                LabelEnum::Write(w) => res.extend_from_slice(w.readers()),
                _ => {}
            },
            Relation::CoImmPred => {
                if let LabelEnum::Write(w) = lab {
                    res.push(g.co_imm_pred(e, w.addr()))
                }
            }
            Relation::CoImmSucc => {
                if let LabelEnum::Write(w) = lab {
                    res.extend(g.co_imm_succ(e, w.addr()))
                }
            }
            Relation::FrImmPred => {
                if let LabelEnum::Write(w) = lab {
                    let pred = g.co_imm_pred(e, w.addr());
                    res.extend_from_slice(g.readers(pred, w.addr()))
                }
            }
            Relation::FrImmSucc => {
                if let LabelEnum::Read(r) = lab {
                    if let Some(rf) = r.rf().filter(|&rf| in_co(g, rf, r.addr())) {
                        res.extend(g.co_imm_succ(rf, r.addr()))
                    }
                }
            }
            Relation::RmwPred => res.extend(g.rmw_pred(e)),
            Relation::RmwSucc => res.extend(g.rmw_succ(e)),
            Relation::TcPred => res.extend(g.tc_pred(e)),
            Relation::TjPred => res.extend(g.tj_pred(e)),
            Relation::DepPreds => res.extend(lab.deps().all().iter().copied()),
            Relation::AddrPreds => res.extend(lab.deps().addr.iter().copied()),
            Relation::DataPreds => res.extend(lab.deps().data.iter().copied()),
            Relation::CtrlPreds => res.extend(lab.deps().ctrl.iter().copied()),
            Relation::Calculated(i) => res.extend(lab.calculated(*i).iter().copied()),
            Relation::HbPreds(i) => view_preds(g, lab.view(*i), e, &mut res),
            Relation::EcoPreds => eco_preds(g, lab, &mut res),
            Relation::ScbPreds(i) => scb_preds(g, lab, *i, &mut res),
            Relation::SameLoc => {
                if let Some(addr) = lab.addr() {
                    res.extend(g.co(addr).iter().chain(g.reads(addr)).copied().filter(|&o| o != e))
                }
            }
            Relation::DetourPreds => {
                if let LabelEnum::Read(r) = lab {
                    if let Some(rf) = r.rf().filter(|&rf| !rf.is_init() && rf.thread != e.thread) {
                        if in_co(g, rf, r.addr()) {
                            res.extend(
                                g.co_before(rf, r.addr())
                                    .iter()
                                    .copied()
                                    .filter(|&w| w.is_po_before(e)),
                            )
                        }
                    }
                }
            }
        }
        res
    }
}

fn rf(lab: &LabelEnum) -> Option<Event> {
    match lab {
        LabelEnum::Read(r) => r.rf(),
        _ => None,
    }
}

// A read may read from nothing or from a write no longer in the graph
fn in_co(g: &ExecutionGraph, w: Event, addr: SAddr) -> bool {
    w.is_init() || g.co(addr).contains(&w)
}

fn view_preds(g: &ExecutionGraph, v: &View, e: Event, res: &mut Neighbours) {
    for (t, max) in v.entries() {
        let max = (max as usize).min(g.thread_size(t).saturating_sub(1));
        for lab in g.thread_labels(t).iter().take(max + 1) {
            if lab.pos() != e {
                res.push(lab.pos());
            }
        }
    }
}

// Writes co-before w at addr (Init included) and their readers
fn co_fr_preds(g: &ExecutionGraph, w: Event, addr: SAddr, res: &mut Neighbours) {
    if w.is_init() {
        return;
    }
    for &c in std::iter::once(&Event::init()).chain(g.co_before(w, addr)) {
        res.push(c);
        res.extend(g.readers(c, addr).iter().copied().filter(|&r| r != w));
    }
}

fn eco_preds(g: &ExecutionGraph, lab: &LabelEnum, res: &mut Neighbours) {
    match lab {
        LabelEnum::Read(r) => {
            if let Some(rf) = r.rf().filter(|&rf| in_co(g, rf, r.addr())) {
                res.push(rf);
                co_fr_preds(g, rf, r.addr(), res);
            }
        }
        LabelEnum::Write(w) => co_fr_preds(g, w.pos(), w.addr(), res),
        _ => {}
    }
    res.sort();
    res.dedup();
}

fn loc_differs(a: &LabelEnum, b: &LabelEnum) -> bool {
    match (a.addr(), b.addr()) {
        (Some(x), Some(y)) => x != y,
        _ => true,
    }
}

fn scb_preds(g: &ExecutionGraph, lab: &LabelEnum, hb: usize, res: &mut Neighbours) {
    let e = lab.pos();
    let thread = g.thread_labels(e.thread);

    // po
    res.extend(thread[..e.index as usize].iter().map(|l| l.pos()));

    // hb|loc, co and fr
    if let Some(addr) = lab.addr() {
        let v = lab.view(hb);
        let same_loc = g.co(addr).iter().chain(g.reads(addr)).copied();
        res.extend(same_loc.filter(|&o| o != e && v.contains(o)));
        if let LabelEnum::Write(_) = lab {
            co_fr_preds(g, e, addr, res);
        }
    }

    // po≠loc;hb;po≠loc: the largest view is that of the closest qualifying po-predecessor
    if let Some(d) = thread[..e.index as usize]
        .iter()
        .rev()
        .find(|d| loc_differs(d, lab))
    {
        let v = d.view(hb);
        for (t, max) in v.entries() {
            let labs = g.thread_labels(t);
            let max = (max as usize).min(labs.len().saturating_sub(1));
            for j in 0..max {
                let a = &labs[j];
                let qualifies = labs[j + 1..=max]
                    .iter()
                    .any(|c| c.pos() != d.pos() && loc_differs(a, c));
                if qualifies {
                    res.push(a.pos());
                }
            }
        }
    }
    res.sort();
    res.dedup();
}

/// A test on a single label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelPred {
    True,
    Read,
    Write,
    Fence,
    Access,
    /// Read half of a completed RMW.
    RmwRead,
    RmwWrite,
    /// A read that is not part of an RMW.
    PlainRead,
    /// A write that is not part of an RMW.
    PlainWrite,
    Atomic,
    AtLeastAcquire,
    AtLeastRelease,
    Sc,
    Not(Box<LabelPred>),
    And(Box<LabelPred>, Box<LabelPred>),
    Or(Box<LabelPred>, Box<LabelPred>),
}

impl LabelPred {
    pub fn and(self, other: LabelPred) -> LabelPred {
        LabelPred::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: LabelPred) -> LabelPred {
        LabelPred::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> LabelPred {
        LabelPred::Not(Box::new(self))
    }

    pub fn holds(&self, g: &ExecutionGraph, lab: &LabelEnum) -> bool {
        match self {
            LabelPred::True => true,
            LabelPred::Read => lab.is_read(),
            LabelPred::Write => lab.is_write(),
            LabelPred::Fence => lab.is_fence(),
            LabelPred::Access => lab.has_location(),
            LabelPred::RmwRead => matches!(lab, LabelEnum::Read(r) if r.is_rmw(g)),
            LabelPred::RmwWrite => matches!(lab, LabelEnum::Write(w) if w.is_rmw()),
            LabelPred::PlainRead => matches!(lab, LabelEnum::Read(r) if !r.is_rmw(g)),
            LabelPred::PlainWrite => matches!(lab, LabelEnum::Write(w) if !w.is_rmw()),
            LabelPred::Atomic => !lab.is_not_atomic(),
            LabelPred::AtLeastAcquire => lab.is_at_least_acquire(),
            LabelPred::AtLeastRelease => lab.is_at_least_release(),
            LabelPred::Sc => lab.is_sc(),
            LabelPred::Not(p) => !p.holds(g, lab),
            LabelPred::And(a, b) => a.holds(g, lab) && b.holds(g, lab),
            LabelPred::Or(a, b) => a.holds(g, lab) || b.holds(g, lab),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::deps::EventDeps;
    use crate::event::ev;
    use crate::event_label::*;
    use crate::ordering::MemOrdering::*;
    use crate::value::SVal;

    fn graph() -> (ExecutionGraph, [Event; 4]) {
        let x = SAddr::new_static(0);
        let mut g = ExecutionGraph::new();
        for t in 1..=2 {
            g.add_label(LabelEnum::ThreadStart(ThreadStartLabel::new(
                ev(t, 0),
                Event::init(),
                SVal(0),
            )));
        }
        let w1 = g.add_label(LabelEnum::Write(WriteLabel::new(
            ev(1, 1),
            Relaxed,
            x,
            4,
            SVal(1),
            EventDeps::new(),
        )));
        let w2 = g.add_label(LabelEnum::Write(WriteLabel::new(
            ev(1, 2),
            Release,
            x,
            4,
            SVal(2),
            EventDeps::new(),
        )));
        let r1 = g.add_label(LabelEnum::Read(
            ReadLabel::new(ev(2, 1), Acquire, x, 4, EventDeps::new()).with_rf(w1),
        ));
        let r2 = g.add_label(LabelEnum::Read(
            ReadLabel::new(ev(2, 2), Relaxed, x, 4, EventDeps::new().with_data(r1))
                .with_rf(Event::init()),
        ));
        (g, [w1, w2, r1, r2])
    }

    #[test]
    fn basic_relations() {
        let (g, [w1, w2, r1, r2]) = graph();
        let n = |rel: Relation, e| rel.neighbours(&g, e).into_vec();
        assert_eq!(n(Relation::PoImmPred, w2), vec![w1]);
        assert_eq!(n(Relation::PoImmSucc, w2), vec![]);
        assert_eq!(n(Relation::RfePred, r1), vec![w1]);
        assert_eq!(n(Relation::RfiPred, r1), vec![]);
        assert_eq!(n(Relation::RfSuccs, w1), vec![r1]);
        assert_eq!(n(Relation::RfSuccs, Event::init()), vec![r2]);
        assert_eq!(n(Relation::CoImmPred, w1), vec![Event::init()]);
        assert_eq!(n(Relation::CoImmSucc, w1), vec![w2]);
        assert_eq!(n(Relation::FrImmPred, w1), vec![r2]);
        assert_eq!(n(Relation::FrImmSucc, r1), vec![w2]);
        assert_eq!(n(Relation::PoLocPreds, r2), vec![r1]);
        assert_eq!(n(Relation::DataPreds, r2), vec![r1]);
        assert_eq!(n(Relation::TcPred, ev(1, 0)), vec![Event::init()]);
        assert_eq!(n(Relation::EcoPreds, w2), vec![Event::init(), w1, r1, r2]);
        assert_eq!(n(Relation::SameLoc, r1), vec![w1, w2, r2]);
    }

    #[test]
    fn detour_needs_an_external_co_later_source() {
        let (mut g, [w1, _, r1, _]) = graph();
        let x = SAddr::new_static(0);
        let w3 = g.add_label(LabelEnum::Write(WriteLabel::new(
            ev(2, 3),
            Relaxed,
            x,
            4,
            SVal(3),
            EventDeps::new(),
        )));
        let r3 = g.add_label(LabelEnum::Read(
            ReadLabel::new(ev(2, 4), Relaxed, x, 4, EventDeps::new()).with_rf(w1),
        ));
        // w3 is co-after w1: no detour
        assert!(Relation::DetourPreds.neighbours(&g, r3).is_empty());
        g.add_store_to_co(w3, Event::init());
        assert_eq!(Relation::DetourPreds.neighbours(&g, r3).into_vec(), vec![w3]);
        // the source of r1 is external but nothing po-earlier writes x
        assert!(Relation::DetourPreds.neighbours(&g, r1).is_empty());
    }

    #[test]
    fn predicates() {
        let (g, [w1, w2, r1, _]) = graph();
        let rel_write = LabelPred::Write.and(LabelPred::AtLeastRelease);
        assert!(rel_write.holds(&g, g.label(w2)));
        assert!(!rel_write.holds(&g, g.label(w1)));
        assert!(LabelPred::PlainRead.holds(&g, g.label(r1)));
        assert!(!LabelPred::RmwRead.holds(&g, g.label(r1)));
        assert!(LabelPred::Write.negate().holds(&g, g.label(r1)));
        assert!(!LabelPred::Write.holds(&g, g.label(Event::init())));
    }
}
