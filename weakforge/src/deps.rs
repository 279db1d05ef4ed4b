//! Dependency information attached to events.
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::vset::VSet;

/// The events whose values an event depends on, grouped by dependency kind.
///
/// Only dependency-tracking models read these; the others carry them along.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDeps {
    pub addr: VSet<Event>,
    pub data: VSet<Event>,
    pub ctrl: VSet<Event>,
    pub addr_po: VSet<Event>,
    pub cas: VSet<Event>,
}

impl EventDeps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addr(mut self, e: Event) -> Self {
        self.addr.insert(e);
        self
    }

    pub fn with_data(mut self, e: Event) -> Self {
        self.data.insert(e);
        self
    }

    pub fn with_ctrl(mut self, e: Event) -> Self {
        self.ctrl.insert(e);
        self
    }

    pub fn with_addr_po(mut self, e: Event) -> Self {
        self.addr_po.insert(e);
        self
    }

    pub fn with_cas(mut self, e: Event) -> Self {
        self.cas.insert(e);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.addr.is_empty()
            && self.data.is_empty()
            && self.ctrl.is_empty()
            && self.addr_po.is_empty()
            && self.cas.is_empty()
    }

    /// All dependency sources, each reported once.
    pub fn all(&self) -> VSet<Event> {
        let mut all = self.addr.clone();
        all.extend_from(&self.data);
        all.extend_from(&self.ctrl);
        all.extend_from(&self.addr_po);
        all.extend_from(&self.cas);
        all
    }
}

impl std::fmt::Display for EventDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |set: &VSet<Event>| {
            set.iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "addr: [{}], data: [{}], ctrl: [{}], addr;po: [{}], cas: [{}]",
            show(&self.addr),
            show(&self.data),
            show(&self.ctrl),
            show(&self.addr_po),
            show(&self.cas)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::ev;

    #[test]
    fn all_merges_every_kind() {
        let deps = EventDeps::new()
            .with_addr(ev(1, 1))
            .with_data(ev(1, 2))
            .with_ctrl(ev(1, 1))
            .with_addr_po(ev(1, 3))
            .with_cas(ev(2, 1));
        assert!(!deps.is_empty());
        let all = deps.all();
        assert_eq!(
            all.iter().copied().collect::<Vec<_>>(),
            vec![ev(1, 1), ev(1, 2), ev(1, 3), ev(2, 1)]
        );
    }
}
