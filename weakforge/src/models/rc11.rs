//! RC11: coherence per location plus `acyclic(psc_base ∪ psc_F)`.

use super::{hb_view, sc_fence, sw_preds, AcyclicCheck, Model};
use crate::automaton::Automaton;
use crate::relation::{LabelPred, Relation};
use crate::MemoryModel;

const HB: usize = 0;

// psc_base = ([E_sc] ∪ [F_sc]; hb?); scb; ([E_sc] ∪ hb?; [F_sc]), with psc_F added on top
fn psc() -> Automaton {
    Automaton::new("psc", 7)
        .accepting(0)
        .test(0, sc_fence(), 1)
        .edge(1, Relation::HbPreds(HB), 2)
        .test(0, LabelPred::True, 2)
        .edge(2, Relation::ScbPreds(HB), 3)
        .test(3, LabelPred::Sc, 0)
        .guarded_edge(3, Relation::HbPreds(HB), sc_fence(), 0)
        // psc_F
        .test(0, sc_fence(), 4)
        .guarded_edge(4, Relation::HbPreds(HB), sc_fence(), 0)
        .edge(4, Relation::HbPreds(HB), 5)
        .edge(5, Relation::EcoPreds, 6)
        .guarded_edge(6, Relation::HbPreds(HB), sc_fence(), 0)
}

fn has_sc_event() -> Automaton {
    Automaton::new("has-sc", 2)
        .accepting(1)
        .test(0, LabelPred::Sc.and(LabelPred::Access.or(LabelPred::Fence)), 1)
}

pub(super) fn model() -> Model {
    Model {
        kind: MemoryModel::RC11,
        dep_tracking: false,
        saved: vec![sw_preds()],
        views: vec![hb_view()],
        acyclic: vec![AcyclicCheck {
            precheck: Some(has_sc_event()),
            body: psc(),
        }],
        hb: HB,
    }
}
