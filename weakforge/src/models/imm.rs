//! IMM: `acyclic(ar)` with `ar = rfe ∪ bob ∪ ppo ∪ detour ∪ psc_F`.
//!
//! Events may be added out of program order: prefix views follow the preserved program
//! order and rf only.

use super::{hb_view, sc_fence, sw_preds, AcyclicCheck, Model};
use crate::automaton::Automaton;
use crate::relation::{LabelPred, Relation};
use crate::MemoryModel;

const HB: usize = 0;

fn ar() -> Automaton {
    Automaton::new("ar", 9)
        .accepting(0)
        .edge(0, Relation::RfePred, 0)
        .edge(0, Relation::DetourPreds, 0)
        .edge(0, Relation::TcPred, 0)
        .edge(0, Relation::TjPred, 0)
        // ppo: [R]; (deps ∪ rfi ∪ rmw)+; [W], walked from the write
        .test(0, LabelPred::Write, 1)
        .edge(1, Relation::DepPreds, 2)
        .edge(1, Relation::RfiPred, 2)
        .edge(1, Relation::RmwPred, 2)
        .edge(2, Relation::DepPreds, 2)
        .edge(2, Relation::RfiPred, 2)
        .edge(2, Relation::RmwPred, 2)
        .test(2, LabelPred::Read, 0)
        // bob: fences and release writes are after everything po-earlier
        .test(0, LabelPred::Fence.or(LabelPred::Write.and(LabelPred::AtLeastRelease)), 3)
        .edge(3, Relation::PoImmPred, 4)
        .edge(4, Relation::PoImmPred, 4)
        .test(4, LabelPred::True, 0)
        // and everything is after po-earlier fences and acquire reads
        .edge(0, Relation::PoImmPred, 5)
        .edge(5, Relation::PoImmPred, 5)
        .test(
            5,
            LabelPred::Fence.or(LabelPred::Read.and(LabelPred::AtLeastAcquire)),
            0,
        )
        // psc_F = [F_sc]; (hb ∪ hb; eco; hb); [F_sc]
        .test(0, sc_fence(), 6)
        .guarded_edge(6, Relation::HbPreds(HB), sc_fence(), 0)
        .edge(6, Relation::HbPreds(HB), 7)
        .edge(7, Relation::EcoPreds, 8)
        .guarded_edge(8, Relation::HbPreds(HB), sc_fence(), 0)
}

// Without rfe edges or SC fences, ar is contained in po
fn has_rfe_or_sc_fence() -> Automaton {
    Automaton::new("has-rfe-or-sc-fence", 2)
        .accepting(1)
        .edge(0, Relation::RfePred, 1)
        .test(0, sc_fence(), 1)
}

pub(super) fn model() -> Model {
    Model {
        kind: MemoryModel::IMM,
        dep_tracking: true,
        saved: vec![sw_preds()],
        views: vec![hb_view()],
        acyclic: vec![AcyclicCheck {
            precheck: Some(has_rfe_or_sc_fence()),
            body: ar(),
        }],
        hb: HB,
    }
}
