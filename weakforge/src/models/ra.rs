//! Release/acquire: every access is treated as release/acquire, so hb is porf and
//! coherence is the whole model.

use super::{porf_view, Model};
use crate::MemoryModel;

pub(super) fn model() -> Model {
    Model {
        kind: MemoryModel::RA,
        dep_tracking: false,
        saved: vec![],
        views: vec![porf_view()],
        acyclic: vec![],
        hb: 0,
    }
}
