//! Sequential consistency: `acyclic(po ∪ rf ∪ co ∪ fr)`.

use super::{has_fr_or_co, porf_view, AcyclicCheck, Model};
use crate::automaton::Automaton;
use crate::relation::Relation;
use crate::MemoryModel;

pub(super) fn model() -> Model {
    let sc = Automaton::new("sc", 1)
        .accepting(0)
        .edge(0, Relation::PoImmPred, 0)
        .edge(0, Relation::RfPred, 0)
        .edge(0, Relation::CoImmPred, 0)
        .edge(0, Relation::FrImmPred, 0)
        .edge(0, Relation::TcPred, 0)
        .edge(0, Relation::TjPred, 0);
    Model {
        kind: MemoryModel::SC,
        dep_tracking: false,
        saved: vec![],
        views: vec![porf_view()],
        acyclic: vec![AcyclicCheck {
            precheck: Some(has_fr_or_co()),
            body: sc,
        }],
        hb: 0,
    }
}
