//! An interpreter for automata over graph relations.
//!
//! A word accepted by an automaton is a path in the execution graph: every transition either
//! follows a relation to the neighbours satisfying a guard, or tests the current event and
//! stays on it. The interpreter runs depth-first searches over (state, event) pairs,
//! memoizing visited pairs by stamp in a [`Scratch`].

use log::trace;

use crate::event::Event;
use crate::event_label::{LabelEnum, Stamp};
use crate::exec_graph::ExecutionGraph;
use crate::relation::{LabelPred, Relation};
use crate::vector_clock::View;
use crate::vset::VSet;

pub type StateId = usize;

#[derive(Clone, Debug)]
pub struct Transition {
    /// `None` stays on the current event.
    rel: Option<Relation>,
    /// Tested on the target event.
    guard: LabelPred,
    to: StateId,
}

#[derive(Clone, Debug, Default)]
pub struct State {
    accepting: bool,
    transitions: Vec<Transition>,
}

/// States are numbered from 0, the start state.
#[derive(Clone, Debug)]
pub struct Automaton {
    name: &'static str,
    states: Vec<State>,
}

impl Automaton {
    pub fn new(name: &'static str, num_states: usize) -> Self {
        Self {
            name,
            states: vec![State::default(); num_states],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn is_accepting(&self, s: StateId) -> bool {
        self.states[s].accepting
    }

    pub fn accepting(mut self, s: StateId) -> Self {
        self.states[s].accepting = true;
        self
    }

    pub fn edge(self, from: StateId, rel: Relation, to: StateId) -> Self {
        self.guarded_edge(from, rel, LabelPred::True, to)
    }

    pub fn guarded_edge(mut self, from: StateId, rel: Relation, guard: LabelPred, to: StateId) -> Self {
        self.states[from].transitions.push(Transition {
            rel: Some(rel),
            guard,
            to,
        });
        self
    }

    /// Moves from `from` to `to` without leaving the event, if it satisfies `guard`.
    pub fn test(mut self, from: StateId, guard: LabelPred, to: StateId) -> Self {
        self.states[from].transitions.push(Transition {
            rel: None,
            guard,
            to,
        });
        self
    }

    fn successors<'g>(
        &self,
        g: &'g ExecutionGraph,
        s: StateId,
        e: Event,
    ) -> Vec<(StateId, &'g LabelEnum)> {
        let mut res = vec![];
        for t in self.states[s].transitions.iter() {
            let targets = match t.rel {
                Some(rel) => rel.neighbours(g, e),
                None => std::iter::once(e).collect(),
            };
            for n in targets {
                if let Some(lab) = g.label_opt(n).filter(|lab| t.guard.holds(g, lab)) {
                    res.push((t.to, lab));
                }
            }
        }
        res
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeStatus {
    Unseen,
    Entered,
    Left,
}

#[derive(Clone, Copy, Debug)]
struct NodeCountStatus {
    count: u32,
    status: NodeStatus,
}

const UNSEEN: NodeCountStatus = NodeCountStatus {
    count: 0,
    status: NodeStatus::Unseen,
};

/// Working storage of the searches, reused across queries.
///
/// Every query starts by resetting it, so a single `Scratch` must not serve two queries at
/// once.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    visited: Vec<Vec<NodeCountStatus>>,
    accepting: u32,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, states: usize, max_stamp: Stamp) {
        self.visited.resize(states, vec![]);
        for v in self.visited.iter_mut() {
            v.clear();
            v.resize(max_stamp + 1, UNSEEN);
        }
        self.accepting = 0;
    }

    fn get(&self, s: StateId, lab: &LabelEnum) -> NodeCountStatus {
        self.visited[s][lab.stamp()]
    }

    fn set(&mut self, s: StateId, lab: &LabelEnum, status: NodeStatus) {
        self.visited[s][lab.stamp()] = NodeCountStatus {
            count: self.accepting,
            status,
        };
    }
}

// Depth-first search from (state, lab), calling f on every pair in an accepting state except
// the start pair. Stops early when f returns false. Pairs already seen are skipped.
fn search<'g>(
    aut: &Automaton,
    g: &'g ExecutionGraph,
    scratch: &mut Scratch,
    lab: &'g LabelEnum,
    f: &mut impl FnMut(&'g LabelEnum) -> bool,
) -> bool {
    let mut stack = vec![(0, lab)];
    scratch.set(0, lab, NodeStatus::Entered);
    while let Some((s, cur)) = stack.pop() {
        let is_start = s == 0 && cur.pos() == lab.pos();
        if aut.is_accepting(s) && !is_start && !f(cur) {
            return false;
        }
        for (to, next) in aut.successors(g, s, cur.pos()) {
            if scratch.get(to, next).status == NodeStatus::Unseen {
                scratch.set(to, next, NodeStatus::Entered);
                stack.push((to, next));
            }
        }
    }
    true
}

fn visit_accepting<'g>(
    aut: &Automaton,
    g: &'g ExecutionGraph,
    scratch: &mut Scratch,
    lab: &'g LabelEnum,
    f: &mut impl FnMut(&'g LabelEnum),
) {
    scratch.reset(aut.num_states(), g.max_stamp());
    search(aut, g, scratch, lab, &mut |l| {
        f(l);
        true
    });
}

/// The events reachable from `lab` in an accepting state.
pub fn collect(aut: &Automaton, g: &ExecutionGraph, scratch: &mut Scratch, lab: &LabelEnum) -> VSet<Event> {
    let mut res = VSet::new();
    visit_accepting(aut, g, scratch, lab, &mut |l| {
        res.insert(l.pos());
    });
    trace!("{}({}) = {:?}", aut.name(), lab.pos(), res.iter().collect::<Vec<_>>());
    res
}

/// The union of the `view`-th views of the events reachable from `lab` in an accepting state,
/// plus those events themselves.
pub fn calculate_view(
    aut: &Automaton,
    g: &ExecutionGraph,
    scratch: &mut Scratch,
    lab: &LabelEnum,
    view: usize,
) -> View {
    let mut res = View::new();
    visit_accepting(aut, g, scratch, lab, &mut |l| {
        res.update(l.view(view));
        res.update_or_set(l.pos());
    });
    res
}

/// The earliest-stamped event reachable from `lab` in an accepting state that is not
/// `included`.
pub fn check_inclusion(
    aut: &Automaton,
    g: &ExecutionGraph,
    scratch: &mut Scratch,
    lab: &LabelEnum,
    included: impl Fn(&LabelEnum) -> bool,
) -> Option<Event> {
    let mut res: Option<&LabelEnum> = None;
    visit_accepting(aut, g, scratch, lab, &mut |l| {
        if !included(l) && res.map_or(true, |r| l.stamp() < r.stamp()) {
            res = Some(l);
        }
    });
    res.map(|l| l.pos())
}

/// Whether some event of the graph reaches an accepting state.
pub fn any_accepting(aut: &Automaton, g: &ExecutionGraph, scratch: &mut Scratch) -> bool {
    scratch.reset(aut.num_states(), g.max_stamp());
    g.labels().any(|lab| {
        scratch.get(0, lab).status == NodeStatus::Unseen && !search(aut, g, scratch, lab, &mut |_| false)
    })
}

/// Whether the product of the graph and the automaton has no cycle through an accepting
/// state.
///
/// Searches start from every event in the start state. The number of accepting states on
/// the current search path is recorded when a pair is entered; a back edge to an entered
/// pair closes a cycle, which counts only if an accepting state was passed since.
pub fn is_acyclic(aut: &Automaton, g: &ExecutionGraph, scratch: &mut Scratch) -> bool {
    scratch.reset(aut.num_states(), g.max_stamp());
    for lab in g.labels_by_stamp() {
        if scratch.get(0, lab).status == NodeStatus::Unseen && !visit_acyclic(aut, g, scratch, 0, lab) {
            trace!("{}: cycle through {}", aut.name(), lab.pos());
            return false;
        }
    }
    true
}

fn visit_acyclic(
    aut: &Automaton,
    g: &ExecutionGraph,
    scratch: &mut Scratch,
    s: StateId,
    lab: &LabelEnum,
) -> bool {
    scratch.set(s, lab, NodeStatus::Entered);
    let accepting = aut.is_accepting(s);
    if accepting {
        scratch.accepting += 1;
    }
    for (to, next) in aut.successors(g, s, lab.pos()) {
        let node = scratch.get(to, next);
        match node.status {
            NodeStatus::Unseen => {
                if !visit_acyclic(aut, g, scratch, to, next) {
                    return false;
                }
            }
            NodeStatus::Entered if scratch.accepting > node.count => return false,
            _ => {}
        }
    }
    if accepting {
        scratch.accepting -= 1;
    }
    scratch.set(s, lab, NodeStatus::Left);
    true
}
