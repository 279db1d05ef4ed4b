//! Total store order: `acyclic(ppo ∪ rfe ∪ co ∪ fr)` where ppo is po without write-to-read
//! pairs that have no fence or RMW between them.

use super::{has_fr_or_co, porf_view, AcyclicCheck, Model};
use crate::automaton::Automaton;
use crate::relation::{LabelPred, Relation};
use crate::MemoryModel;

pub(super) fn model() -> Model {
    let ghb = Automaton::new("tso", 4)
        .accepting(0)
        // from a plain read, skip plain writes until something else
        .test(0, LabelPred::PlainRead, 1)
        .edge(1, Relation::PoImmPred, 2)
        .edge(2, Relation::PoImmPred, 2)
        .test(2, LabelPred::PlainWrite.negate(), 0)
        // everything else is ordered with its po-predecessor
        .test(0, LabelPred::PlainRead.negate(), 3)
        .edge(3, Relation::PoImmPred, 0)
        .edge(0, Relation::RfePred, 0)
        .edge(0, Relation::CoImmPred, 0)
        .edge(0, Relation::FrImmPred, 0)
        .edge(0, Relation::TcPred, 0)
        .edge(0, Relation::TjPred, 0);
    Model {
        kind: MemoryModel::TSO,
        dep_tracking: false,
        saved: vec![],
        views: vec![porf_view()],
        acyclic: vec![AcyclicCheck {
            precheck: Some(has_fr_or_co()),
            body: ghb,
        }],
        hb: 0,
    }
}
