//! Memory models as data: the relations, views and acyclicity constraints each one needs.

use crate::automaton::Automaton;
use crate::relation::{LabelPred, Relation};
use crate::MemoryModel;

mod imm;
mod ra;
mod rc11;
mod sc;
mod tso;

/// A forbidden-cycle constraint.
///
/// When the precheck automaton accepts nowhere in the graph, no cycle of `body` can exist
/// and the search is skipped.
#[derive(Clone, Debug)]
pub struct AcyclicCheck {
    pub precheck: Option<Automaton>,
    pub body: Automaton,
}

#[derive(Clone, Debug)]
pub struct Model {
    pub kind: MemoryModel,
    /// Events may be added out of program order; prefix views have holes.
    pub dep_tracking: bool,
    /// Saved relations: `calculated(i)` of every label.
    pub saved: Vec<Automaton>,
    /// View relations: `view(i)` of every label. Views are folded from the accepted events'
    /// own views, so each automaton only describes the immediate predecessors.
    pub views: Vec<Automaton>,
    pub acyclic: Vec<AcyclicCheck>,
    /// The index of the happens-before view.
    pub hb: usize,
}

impl Model {
    pub fn new(kind: MemoryModel) -> Model {
        match kind {
            MemoryModel::SC => sc::model(),
            MemoryModel::TSO => tso::model(),
            MemoryModel::RA => ra::model(),
            MemoryModel::RC11 => rc11::model(),
            MemoryModel::IMM => imm::model(),
        }
    }
}

fn sc_fence() -> LabelPred {
    LabelPred::Fence.and(LabelPred::Sc)
}

/// Immediate (po ∪ rf ∪ tc ∪ tj) predecessors.
fn porf_view() -> Automaton {
    Automaton::new("porf", 2)
        .accepting(1)
        .edge(0, Relation::PoImmPred, 1)
        .edge(0, Relation::RfPred, 1)
        .edge(0, Relation::TcPred, 1)
        .edge(0, Relation::TjPred, 1)
}

/// Immediate (po ∪ sw ∪ tc ∪ tj) predecessors, with sw saved as relation 0.
fn hb_view() -> Automaton {
    Automaton::new("hb", 2)
        .accepting(1)
        .edge(0, Relation::PoImmPred, 1)
        .edge(0, Relation::Calculated(0), 1)
        .edge(0, Relation::TcPred, 1)
        .edge(0, Relation::TjPred, 1)
}

/// sw-predecessors:
/// `[E ⊒ rel]; ([F]; po)?; rs; rf; [R ⊒ rlx]; (po; [F])?; [E ⊒ acq]`
/// with `rs = [W]; (po|loc)?; (rf; rmw)*`.
fn sw_preds() -> Automaton {
    let acq_read = LabelPred::Read.and(LabelPred::AtLeastAcquire);
    let acq_fence = LabelPred::Fence.and(LabelPred::AtLeastAcquire);
    let rel_fence = LabelPred::Fence.and(LabelPred::AtLeastRelease);
    let atomic_read = LabelPred::Read.and(LabelPred::Atomic);
    Automaton::new("sw", 9)
        .accepting(6)
        // the acquiring read
        .test(0, acq_read, 1)
        .test(0, acq_fence, 2)
        .edge(2, Relation::PoImmPred, 3)
        .edge(3, Relation::PoImmPred, 3)
        .test(3, atomic_read, 1)
        // back through the release sequence; Init is no write
        .guarded_edge(1, Relation::RfPred, LabelPred::Write, 4)
        .edge(4, Relation::RmwPred, 7)
        .guarded_edge(7, Relation::RfPred, LabelPred::Write, 4)
        // its head, or a po|loc-earlier write
        .test(4, LabelPred::True, 5)
        .guarded_edge(4, Relation::PoLocPreds, LabelPred::Write, 5)
        .test(5, LabelPred::AtLeastRelease, 6)
        // or a release fence before the head
        .edge(5, Relation::PoImmPred, 8)
        .edge(8, Relation::PoImmPred, 8)
        .test(8, rel_fence, 6)
}

/// Some read has a co-later write, or some location has two writes.
fn has_fr_or_co() -> Automaton {
    Automaton::new("has-fr-or-co", 2)
        .accepting(1)
        .edge(0, Relation::FrImmSucc, 1)
        .guarded_edge(0, Relation::CoImmPred, LabelPred::Write, 1)
}
