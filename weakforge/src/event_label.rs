//! Label of an execution graph event

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use crate::deps::EventDeps;
use crate::errors::print_bugreport_info_once;
use crate::event::Event;
use crate::exec_graph::ExecutionGraph;
use crate::ordering::MemOrdering;
use crate::thread::ThreadId;
use crate::value::{ASize, RmwBinOp, SAddr, SVal};
use crate::vector_clock::{VectorClock, View};
use crate::vset::VSet;

/// Insertion-order number of a label.
pub type Stamp = usize;

/// The closed set of label kinds.
///
/// The declaration order is significant: every category (terminators, blocks, memory
/// accesses, reads, writes, ...) is a contiguous range of kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventLabelKind {
    Empty,
    Init,
    // terminators
    ThreadFinish,
    ThreadKill,
    // blocks
    Block,
    SpinloopBlock,
    FaiZNEBlock,
    LockZNEBlock,
    HelpedCasBlock,
    ConfirmationBlock,
    LockNotAcqBlock,
    LockNotRelBlock,
    BarrierBlock,
    ErrorBlock,
    UserBlock,
    JoinBlock,
    ReadOptBlock,
    // end of blocks and terminators
    Optional,
    LoopBegin,
    SpinStart,
    FaiZNESpinEnd,
    LockZNESpinEnd,
    ThreadCreate,
    ThreadJoin,
    ThreadStart,
    // memory accesses: reads
    Read,
    BWaitRead,
    SpeculativeRead,
    ConfirmingRead,
    FaiRead,
    NoRetFaiRead,
    BIncFaiRead,
    CasRead,
    LockCasRead,
    TrylockCasRead,
    HelpedCasRead,
    ConfirmingCasRead,
    // memory accesses: writes
    Write,
    UnlockWrite,
    BInitWrite,
    BDestroyWrite,
    FaiWrite,
    NoRetFaiWrite,
    BIncFaiWrite,
    CasWrite,
    LockCasWrite,
    TrylockCasWrite,
    HelpedCasWrite,
    ConfirmingCasWrite,
    // end of memory accesses
    Fence,
    Malloc,
    Free,
    HpRetire,
    HpProtect,
    MethodBegin,
    MethodEnd,
    /// A kind this version does not know, e.g. from a graph serialized by a newer one.
    #[serde(other)]
    Unknown,
}

use EventLabelKind as K;

impl EventLabelKind {
    fn within(self, first: Self, last: Self) -> bool {
        first <= self && self <= last
    }

    pub fn is_terminator(self) -> bool {
        self.within(K::ThreadFinish, K::ReadOptBlock)
    }

    pub fn is_block(self) -> bool {
        self.within(K::Block, K::ReadOptBlock)
    }

    pub fn is_spin_end(self) -> bool {
        self.within(K::FaiZNESpinEnd, K::LockZNESpinEnd)
    }

    pub fn is_mem_access(self) -> bool {
        self.within(K::Read, K::ConfirmingCasWrite)
    }

    pub fn is_read(self) -> bool {
        self.within(K::Read, K::ConfirmingCasRead)
    }

    pub fn is_fai_read(self) -> bool {
        self.within(K::FaiRead, K::BIncFaiRead)
    }

    pub fn is_cas_read(self) -> bool {
        self.within(K::CasRead, K::ConfirmingCasRead)
    }

    pub fn is_lock_cas_read(self) -> bool {
        self.within(K::LockCasRead, K::TrylockCasRead)
    }

    pub fn is_write(self) -> bool {
        self.within(K::Write, K::ConfirmingCasWrite)
    }

    pub fn is_unlock_write(self) -> bool {
        self.within(K::UnlockWrite, K::UnlockWrite)
    }

    pub fn is_fai_write(self) -> bool {
        self.within(K::FaiWrite, K::BIncFaiWrite)
    }

    pub fn is_cas_write(self) -> bool {
        self.within(K::CasWrite, K::ConfirmingCasWrite)
    }

    pub fn is_lock_cas_write(self) -> bool {
        self.within(K::LockCasWrite, K::TrylockCasWrite)
    }

    pub fn is_fence(self) -> bool {
        self.within(K::Fence, K::Fence)
    }

    pub fn is_alloc(self) -> bool {
        self.within(K::Malloc, K::Malloc)
    }

    pub fn is_free(self) -> bool {
        self.within(K::Free, K::HpRetire)
    }

    /// The printed mnemonic of the kind.
    pub fn name(self) -> &'static str {
        match self {
            K::Empty => "EMPTY",
            K::Init => "INIT",
            K::ThreadFinish => "E",
            K::ThreadKill => "KILL",
            K::Block => "BLOCK",
            K::SpinloopBlock => "BLOCK[spinloop]",
            K::FaiZNEBlock => "BLOCK[fai-zne]",
            K::LockZNEBlock => "BLOCK[lock-zne]",
            K::HelpedCasBlock => "BLOCK[helped-cas]",
            K::ConfirmationBlock => "BLOCK[conf]",
            K::LockNotAcqBlock => "BLOCK[lock-unacq]",
            K::LockNotRelBlock => "BLOCK[lock-unrel]",
            K::BarrierBlock => "BLOCK[barrier]",
            K::ErrorBlock => "BLOCK[error]",
            K::UserBlock => "BLOCK[user]",
            K::JoinBlock => "BLOCK[join]",
            K::ReadOptBlock => "BLOCK[read-opt]",
            K::Optional => "OPTIONAL",
            K::LoopBegin => "LOOP_BEGIN",
            K::SpinStart => "SPIN_START",
            K::FaiZNESpinEnd => "FAI_ZNE_SPIN_END",
            K::LockZNESpinEnd => "LOCK_ZNE_SPIN_END",
            K::ThreadCreate => "TC",
            K::ThreadJoin => "TJ",
            K::ThreadStart => "B",
            K::Read => "R",
            K::BWaitRead => "BWaitR",
            K::SpeculativeRead => "SpecR",
            K::ConfirmingRead => "ConfR",
            K::FaiRead => "UR",
            K::NoRetFaiRead => "NoRetUR",
            K::BIncFaiRead => "BIncUR",
            K::CasRead => "CR",
            K::LockCasRead => "LockCR",
            K::TrylockCasRead => "TrylockCR",
            K::HelpedCasRead => "HelpedCR",
            K::ConfirmingCasRead => "ConfCR",
            K::Write => "W",
            K::UnlockWrite => "UnlockW",
            K::BInitWrite => "BInitW",
            K::BDestroyWrite => "BDestroyW",
            K::FaiWrite => "UW",
            K::NoRetFaiWrite => "NoRetUW",
            K::BIncFaiWrite => "BIncUW",
            K::CasWrite => "CW",
            K::LockCasWrite => "LockCW",
            K::TrylockCasWrite => "TrylockCW",
            K::HelpedCasWrite => "HelpedCW",
            K::ConfirmingCasWrite => "ConfCW",
            K::Fence => "F",
            K::Malloc => "MALLOC",
            K::Free => "FREE",
            K::HpRetire => "HP_RETIRE",
            K::HpProtect => "HP_PROTECT",
            K::MethodBegin => "METHOD_BEGIN",
            K::MethodEnd => "METHOD_END",
            K::Unknown => {
                print_bugreport_info_once(
                    "print-unknown-label-kind",
                    "Printing a label of unknown kind",
                );
                "UNKNOWN"
            }
        }
    }
}

impl fmt::Display for EventLabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared by every label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLabel {
    pos: Event,
    ordering: MemOrdering,
    deps: EventDeps,
    stamp: Option<Stamp>,
    revisitable: bool,
    added_max: bool,

    /// Per-model views, filled by the driver right after insertion.
    #[serde(skip)]
    views: Vec<View>,

    /// Per-model saved relations, filled alongside the views.
    #[serde(skip)]
    calculated: Vec<VSet<Event>>,

    /// Everything this event causally depends on, computed on first use.
    #[serde(skip)]
    prefix_view: OnceCell<VectorClock>,
}

impl EventLabel {
    fn new(pos: Event, ordering: MemOrdering, deps: EventDeps) -> Self {
        Self {
            pos,
            ordering,
            deps,
            stamp: None,
            revisitable: true,
            added_max: true,
            views: vec![],
            calculated: vec![],
            prefix_view: OnceCell::new(),
        }
    }

    pub fn pos(&self) -> Event {
        self.pos
    }

    pub fn index(&self) -> u32 {
        self.pos.index
    }

    pub fn thread(&self) -> ThreadId {
        self.pos.thread
    }

    pub fn ordering(&self) -> MemOrdering {
        self.ordering
    }

    pub fn deps(&self) -> &EventDeps {
        &self.deps
    }

    pub fn stamped(&self) -> bool {
        self.stamp.is_some()
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
            .unwrap_or_else(|| panic!("label at {} has not been inserted in a graph", self.pos))
    }

    pub(crate) fn set_stamp(&mut self, s: Stamp) {
        assert!(self.stamp.is_none(), "label at {} is already stamped", self.pos);
        self.stamp = Some(s)
    }

    fn reset(&mut self) {
        self.stamp = None;
        self.views.clear();
        self.calculated.clear();
        self.prefix_view.take();
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if cfg!(feature = "print_stamps") {
            match self.stamp {
                Some(s) => write!(f, "{} @ {}", s, self.pos),
                None => write!(f, "- @ {}", self.pos),
            }
        } else {
            write!(f, "{}", self.pos)
        }
    }
}

pub trait AsEventLabel {
    fn as_event_label(&self) -> &EventLabel;
    fn as_event_label_mut(&mut self) -> &mut EventLabel;
    fn pos(&self) -> Event {
        self.as_event_label().pos()
    }
    fn stamp(&self) -> Stamp {
        self.as_event_label().stamp()
    }
    fn ordering(&self) -> MemOrdering {
        self.as_event_label().ordering()
    }
}

macro_rules! as_label {
    ($t:ty) => {
        impl AsEventLabel for $t {
            fn as_event_label(&self) -> &EventLabel {
                &self.label
            }
            fn as_event_label_mut(&mut self) -> &mut EventLabel {
                &mut self.label
            }
        }
    };
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LabelEnum {
    Empty(EmptyLabel),
    Init(InitLabel),
    ThreadFinish(ThreadFinishLabel),
    ThreadKill(ThreadKillLabel),
    Block(BlockLabel),
    Optional(OptionalLabel),
    Marker(MarkerLabel),
    ThreadCreate(ThreadCreateLabel),
    ThreadJoin(ThreadJoinLabel),
    ThreadStart(ThreadStartLabel),
    Read(ReadLabel),
    Write(WriteLabel),
    Fence(FenceLabel),
    Malloc(MallocLabel),
    Free(FreeLabel),
    HpProtect(HpProtectLabel),
    MethodBegin(MethodBeginLabel),
    MethodEnd(MethodEndLabel),
}

macro_rules! match_and_run {
    ( $lab:expr, $name:ident $( , $arg:expr )* ) => {
        match $lab {
            LabelEnum::Empty(l) => l.$name($($arg),*),
            LabelEnum::Init(l) => l.$name($($arg),*),
            LabelEnum::ThreadFinish(l) => l.$name($($arg),*),
            LabelEnum::ThreadKill(l) => l.$name($($arg),*),
            LabelEnum::Block(l) => l.$name($($arg),*),
            LabelEnum::Optional(l) => l.$name($($arg),*),
            LabelEnum::Marker(l) => l.$name($($arg),*),
            LabelEnum::ThreadCreate(l) => l.$name($($arg),*),
            LabelEnum::ThreadJoin(l) => l.$name($($arg),*),
            LabelEnum::ThreadStart(l) => l.$name($($arg),*),
            LabelEnum::Read(l) => l.$name($($arg),*),
            LabelEnum::Write(l) => l.$name($($arg),*),
            LabelEnum::Fence(l) => l.$name($($arg),*),
            LabelEnum::Malloc(l) => l.$name($($arg),*),
            LabelEnum::Free(l) => l.$name($($arg),*),
            LabelEnum::HpProtect(l) => l.$name($($arg),*),
            LabelEnum::MethodBegin(l) => l.$name($($arg),*),
            LabelEnum::MethodEnd(l) => l.$name($($arg),*),
        }
    };
}

impl LabelEnum {
    pub fn base(&self) -> &EventLabel {
        match_and_run!(self, as_event_label)
    }

    fn base_mut(&mut self) -> &mut EventLabel {
        match_and_run!(self, as_event_label_mut)
    }

    pub fn pos(&self) -> Event {
        self.base().pos()
    }

    pub fn index(&self) -> u32 {
        self.base().index()
    }

    pub fn thread(&self) -> ThreadId {
        self.base().thread()
    }

    pub fn kind(&self) -> EventLabelKind {
        match self {
            LabelEnum::Empty(_) => K::Empty,
            LabelEnum::Init(_) => K::Init,
            LabelEnum::ThreadFinish(_) => K::ThreadFinish,
            LabelEnum::ThreadKill(_) => K::ThreadKill,
            LabelEnum::Block(l) => l.kind,
            LabelEnum::Optional(_) => K::Optional,
            LabelEnum::Marker(l) => l.kind,
            LabelEnum::ThreadCreate(_) => K::ThreadCreate,
            LabelEnum::ThreadJoin(_) => K::ThreadJoin,
            LabelEnum::ThreadStart(_) => K::ThreadStart,
            LabelEnum::Read(l) => l.kind,
            LabelEnum::Write(l) => l.kind,
            LabelEnum::Fence(_) => K::Fence,
            LabelEnum::Malloc(_) => K::Malloc,
            LabelEnum::Free(l) => l.kind,
            LabelEnum::HpProtect(_) => K::HpProtect,
            LabelEnum::MethodBegin(_) => K::MethodBegin,
            LabelEnum::MethodEnd(_) => K::MethodEnd,
        }
    }

    pub fn ordering(&self) -> MemOrdering {
        self.base().ordering()
    }

    pub fn is_at_least_acquire(&self) -> bool {
        self.ordering().is_at_least_acquire()
    }

    pub fn is_at_least_release(&self) -> bool {
        self.ordering().is_at_least_release()
    }

    pub fn is_sc(&self) -> bool {
        self.ordering().is_sc()
    }

    pub fn is_not_atomic(&self) -> bool {
        !self.ordering().is_atomic()
    }

    pub fn deps(&self) -> &EventDeps {
        self.base().deps()
    }

    pub fn stamped(&self) -> bool {
        self.base().stamped()
    }

    pub fn stamp(&self) -> Stamp {
        self.base().stamp()
    }

    pub(crate) fn set_stamp(&mut self, s: Stamp) {
        self.base_mut().set_stamp(s)
    }

    pub fn stamp_opt(&self) -> Option<Stamp> {
        self.base().stamp
    }

    /// Reads from Init or an allocation, or chooses a branch: later events may depend on it.
    pub fn is_dependable(&self) -> bool {
        matches!(
            self,
            LabelEnum::Read(_) | LabelEnum::Malloc(_) | LabelEnum::Optional(_)
        )
    }

    pub fn returns_value(&self) -> bool {
        matches!(
            self,
            LabelEnum::ThreadStart(_)
                | LabelEnum::Read(_)
                | LabelEnum::ThreadJoin(_)
                | LabelEnum::Optional(_)
        )
    }

    pub fn accesses_value(&self) -> bool {
        matches!(self, LabelEnum::Init(_)) || self.kind().is_mem_access()
    }

    pub fn has_location(&self) -> bool {
        self.kind().is_mem_access()
    }

    pub fn is_read(&self) -> bool {
        self.kind().is_read()
    }

    pub fn is_write(&self) -> bool {
        self.kind().is_write()
    }

    pub fn is_fence(&self) -> bool {
        self.kind().is_fence()
    }

    /// The location of a memory access.
    pub fn addr(&self) -> Option<SAddr> {
        match self {
            LabelEnum::Read(r) => Some(r.addr),
            LabelEnum::Write(w) => Some(w.addr),
            _ => None,
        }
    }

    pub fn is_revisitable(&self) -> bool {
        self.base().revisitable
    }

    pub fn set_revisitable(&mut self, r: bool) {
        self.base_mut().revisitable = r;
    }

    /// Whether the access read from (or was placed as) the co-maximal write when it was added.
    pub fn was_added_max(&self) -> bool {
        self.base().added_max
    }

    pub fn set_added_max(&mut self, m: bool) {
        self.base_mut().added_max = m;
    }

    /// Stable labels can no longer be deleted or have their rf changed.
    pub fn is_stable(&self) -> bool {
        !self.is_revisitable() || (self.has_location() && !self.was_added_max())
    }

    fn aliases_slot_zero(&self) -> bool {
        matches!(self, LabelEnum::Init(_) | LabelEnum::Empty(_))
    }

    /// The driver-computed view `i`; Init and Empty labels only have slot 0.
    pub fn view(&self, i: usize) -> &View {
        let i = if self.aliases_slot_zero() { 0 } else { i };
        self.base().views.get(i).unwrap_or_else(|| {
            panic!("view {} of {} requested before it was calculated", i, self.pos())
        })
    }

    pub fn views_len(&self) -> usize {
        self.base().views.len()
    }

    pub(crate) fn set_views(&mut self, views: Vec<View>) {
        self.base_mut().views = views;
    }

    /// The driver-saved relation `i`; Init and Empty labels only have slot 0.
    pub fn calculated(&self, i: usize) -> &VSet<Event> {
        let i = if self.aliases_slot_zero() { 0 } else { i };
        self.base().calculated.get(i).unwrap_or_else(|| {
            panic!(
                "relation {} of {} requested before it was calculated",
                i,
                self.pos()
            )
        })
    }

    pub(crate) fn set_calculated(&mut self, rels: Vec<VSet<Event>>) {
        self.base_mut().calculated = rels;
    }

    /// The cached prefix view, if already computed.
    pub fn prefix_view(&self) -> Option<&VectorClock> {
        self.base().prefix_view.get()
    }

    /// The cached prefix view, computing it with `calc` on first use.
    pub fn prefix_view_or_init(&self, calc: impl FnOnce() -> VectorClock) -> &VectorClock {
        self.base().prefix_view.get_or_init(calc)
    }

    pub(crate) fn invalidate_prefix_view(&mut self) {
        self.base_mut().prefix_view.take();
    }

    /// Drops every cache, the stamp and every back-reference, so the position can be reused.
    pub fn reset(&mut self) {
        self.base_mut().reset();
        self.clear_back_references();
        match self {
            LabelEnum::Init(l) => l.init_rfs.clear(),
            LabelEnum::Read(l) => l.rf = None,
            _ => {}
        }
    }

    // References owned by other labels' insertion; the graph recreates them.
    pub(crate) fn clear_back_references(&mut self) {
        match self {
            LabelEnum::ThreadFinish(l) => l.parent_join = None,
            LabelEnum::Write(l) => l.readers.clear(),
            LabelEnum::Malloc(l) => {
                l.accesses.clear();
                l.dealloc = None;
            }
            LabelEnum::Free(l) => l.alloc = None,
            LabelEnum::MethodBegin(l) => l.lin_preds.clear(),
            LabelEnum::MethodEnd(l) => l.lin_succs.clear(),
            _ => {}
        }
    }

    /// The value this label reads or writes at `access`.
    pub fn access_value(&self, g: &ExecutionGraph, access: SAddr) -> SVal {
        match self {
            LabelEnum::Init(_) => g.init_val(access),
            LabelEnum::Read(r) => r.access_value(g),
            LabelEnum::Write(w) => w.val,
            _ => panic!("{} does not access memory", self),
        }
    }

    /// The value the program observes as the result of this label.
    pub fn return_value(&self, g: &ExecutionGraph) -> SVal {
        match self {
            LabelEnum::Read(r) => r.return_value(g),
            LabelEnum::ThreadStart(s) => s.thread_arg,
            LabelEnum::ThreadJoin(j) => match g.thread_last(j.child) {
                Some(LabelEnum::ThreadFinish(fin)) => fin.ret_val,
                _ => panic!("{} joins thread {} which has not finished", self, j.child),
            },
            LabelEnum::Optional(o) => SVal::from_bool(o.expanded),
            _ => panic!("{} does not return a value", self),
        }
    }
}

impl fmt::Display for LabelEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match_and_run!(self, display_into, f)
    }
}

trait DisplayInto {
    fn display_into(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: fmt::Display> DisplayInto for T {
    fn display_into(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Placeholder occupying a position that carries no event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmptyLabel {
    label: EventLabel,
}
as_label!(EmptyLabel);

impl EmptyLabel {
    pub fn new(pos: Event) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, EventDeps::new()),
        }
    }
}

impl fmt::Display for EmptyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: EMPTY", self.label)
    }
}

/// The initializer: the implicit write of every location's initial value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitLabel {
    label: EventLabel,
    init_rfs: BTreeMap<SAddr, Vec<Event>>,
}
as_label!(InitLabel);

impl InitLabel {
    pub(crate) fn new() -> Self {
        let mut label = EventLabel::new(
            Event::init(),
            MemOrdering::SequentiallyConsistent,
            EventDeps::new(),
        );
        label.stamp = Some(0);
        label.revisitable = false;
        let mut v = View::new();
        v.update_or_set(Event::init());
        label.views = vec![v];
        label.calculated = vec![VSet::new()];
        Self {
            label,
            init_rfs: BTreeMap::new(),
        }
    }

    pub fn readers(&self, addr: SAddr) -> &[Event] {
        self.init_rfs.get(&addr).map_or(&[], |v| v.as_slice())
    }

    pub fn addrs_read(&self) -> impl Iterator<Item = SAddr> + '_ {
        self.init_rfs.keys().copied()
    }

    pub(crate) fn add_reader(&mut self, addr: SAddr, r: Event) {
        self.init_rfs.entry(addr).or_default().push(r);
    }

    pub(crate) fn remove_reader(&mut self, addr: SAddr, pred: impl Fn(Event) -> bool) {
        if let Some(readers) = self.init_rfs.get_mut(&addr) {
            readers.retain(|&r| !pred(r));
            if readers.is_empty() {
                self.init_rfs.remove(&addr);
            }
        }
    }
}

impl fmt::Display for InitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: INIT", self.label)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadFinishLabel {
    label: EventLabel,
    ret_val: SVal,
    parent_join: Option<Event>,
}
as_label!(ThreadFinishLabel);

impl ThreadFinishLabel {
    pub fn new(pos: Event, ret_val: SVal) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::Release, EventDeps::new()),
            ret_val,
            parent_join: None,
        }
    }

    pub fn ret_val(&self) -> SVal {
        self.ret_val
    }

    pub fn parent_join(&self) -> Option<Event> {
        self.parent_join
    }

    pub(crate) fn set_parent_join(&mut self, j: Option<Event>) {
        self.parent_join = j;
    }
}

impl fmt::Display for ThreadFinishLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: E({})", self.label, self.ret_val)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadKillLabel {
    label: EventLabel,
}
as_label!(ThreadKillLabel);

impl ThreadKillLabel {
    pub fn new(pos: Event) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, EventDeps::new()),
        }
    }
}

impl fmt::Display for ThreadKillLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: KILL", self.label)
    }
}

/// A thread that cannot make progress; the kind records why.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockLabel {
    label: EventLabel,
    kind: EventLabelKind,
}
as_label!(BlockLabel);

impl BlockLabel {
    pub fn new(pos: Event, kind: EventLabelKind) -> Self {
        assert!(kind.is_block(), "{:?} is not a block kind", kind);
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, EventDeps::new()),
            kind,
        }
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.kind)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptionalLabel {
    label: EventLabel,
    expandable: bool,
    expanded: bool,
}
as_label!(OptionalLabel);

impl OptionalLabel {
    pub fn new(pos: Event, deps: EventDeps) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, deps),
            expandable: true,
            expanded: false,
        }
    }

    pub fn is_expandable(&self) -> bool {
        self.expandable
    }

    pub fn set_expandable(&mut self, e: bool) {
        self.expandable = e;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_expanded(&mut self, e: bool) {
        self.expanded = e;
    }
}

impl fmt::Display for OptionalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: OPTIONAL{}",
            self.label,
            if self.expanded { " [expanded]" } else { "" }
        )
    }
}

/// Loop and spinloop annotations; they carry nothing but their kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerLabel {
    label: EventLabel,
    kind: EventLabelKind,
}
as_label!(MarkerLabel);

impl MarkerLabel {
    pub fn new(pos: Event, kind: EventLabelKind) -> Self {
        assert!(
            matches!(kind, K::LoopBegin | K::SpinStart) || kind.is_spin_end(),
            "{:?} is not a marker kind",
            kind
        );
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, EventDeps::new()),
            kind,
        }
    }
}

impl fmt::Display for MarkerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.kind)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadCreateLabel {
    label: EventLabel,
    child: ThreadId,
    arg: SVal,
}
as_label!(ThreadCreateLabel);

impl ThreadCreateLabel {
    pub fn new(pos: Event, child: ThreadId, arg: SVal) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::Release, EventDeps::new()),
            child,
            arg,
        }
    }

    pub fn child(&self) -> ThreadId {
        self.child
    }

    pub fn arg(&self) -> SVal {
        self.arg
    }
}

impl fmt::Display for ThreadCreateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: TC [{}]", self.label, self.child)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadJoinLabel {
    label: EventLabel,
    child: ThreadId,
}
as_label!(ThreadJoinLabel);

impl ThreadJoinLabel {
    pub fn new(pos: Event, child: ThreadId) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::Acquire, EventDeps::new()),
            child,
        }
    }

    pub fn child(&self) -> ThreadId {
        self.child
    }
}

impl fmt::Display for ThreadJoinLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: TJ [{}]", self.label, self.child)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadStartLabel {
    label: EventLabel,
    create: Event,
    thread_arg: SVal,
    symm: Option<ThreadId>,
}
as_label!(ThreadStartLabel);

impl ThreadStartLabel {
    /// `create` is the spawning ThreadCreate label, or Init for threads present from the start.
    pub fn new(pos: Event, create: Event, thread_arg: SVal) -> Self {
        assert_eq!(pos.index, 0, "threads start at index 0");
        Self {
            label: EventLabel::new(pos, MemOrdering::Acquire, EventDeps::new()),
            create,
            thread_arg,
            symm: None,
        }
    }

    pub fn with_symmetric(mut self, t: ThreadId) -> Self {
        self.symm = Some(t);
        self
    }

    pub fn create(&self) -> Event {
        self.create
    }

    pub fn thread_arg(&self) -> SVal {
        self.thread_arg
    }

    pub fn symmetric(&self) -> Option<ThreadId> {
        self.symm
    }
}

impl fmt::Display for ThreadStartLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: B [{}]", self.label, self.create)
    }
}

/// The read-modify-write payload of a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadRmw {
    Plain,
    Fai { op: RmwBinOp, operand: SVal },
    Cas { expected: SVal, swap: SVal },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadLabel {
    label: EventLabel,
    kind: EventLabelKind,
    addr: SAddr,
    size: ASize,
    rf: Option<Event>,
    rmw: ReadRmw,
}
as_label!(ReadLabel);

impl ReadLabel {
    pub fn new(pos: Event, ordering: MemOrdering, addr: SAddr, size: ASize, deps: EventDeps) -> Self {
        Self {
            label: EventLabel::new(pos, ordering, deps),
            kind: K::Read,
            addr,
            size,
            rf: None,
            rmw: ReadRmw::Plain,
        }
    }

    pub fn new_fai(
        pos: Event,
        ordering: MemOrdering,
        addr: SAddr,
        size: ASize,
        op: RmwBinOp,
        operand: SVal,
        deps: EventDeps,
    ) -> Self {
        Self {
            kind: K::FaiRead,
            rmw: ReadRmw::Fai { op, operand },
            ..Self::new(pos, ordering, addr, size, deps)
        }
    }

    pub fn new_cas(
        pos: Event,
        ordering: MemOrdering,
        addr: SAddr,
        size: ASize,
        expected: SVal,
        swap: SVal,
        deps: EventDeps,
    ) -> Self {
        Self {
            kind: K::CasRead,
            rmw: ReadRmw::Cas { expected, swap },
            ..Self::new(pos, ordering, addr, size, deps)
        }
    }

    /// Refines the kind within the read's family (plain, FAI or CAS reads).
    pub fn with_kind(mut self, kind: EventLabelKind) -> Self {
        let same_family = match self.rmw {
            ReadRmw::Plain => kind.is_read() && !kind.is_fai_read() && !kind.is_cas_read(),
            ReadRmw::Fai { .. } => kind.is_fai_read(),
            ReadRmw::Cas { .. } => kind.is_cas_read(),
        };
        assert!(same_family, "{:?} does not fit a {:?} read", kind, self.rmw);
        self.kind = kind;
        self
    }

    /// The write the read initially reads from; linked when the label is added to a graph.
    pub fn with_rf(mut self, rf: Event) -> Self {
        self.rf = Some(rf);
        self
    }

    pub fn kind(&self) -> EventLabelKind {
        self.kind
    }

    pub fn addr(&self) -> SAddr {
        self.addr
    }

    pub fn size(&self) -> ASize {
        self.size
    }

    pub fn rf(&self) -> Option<Event> {
        self.rf
    }

    // Only the graph may change rf: readers lists must follow.
    pub(crate) fn set_rf(&mut self, rf: Option<Event>) {
        self.rf = rf;
    }

    pub fn rmw(&self) -> ReadRmw {
        self.rmw
    }

    pub fn is_fai(&self) -> bool {
        self.kind.is_fai_read()
    }

    pub fn is_cas(&self) -> bool {
        self.kind.is_cas_read()
    }

    /// An RMW read whose write half has been added right after it.
    pub fn is_rmw(&self, g: &ExecutionGraph) -> bool {
        if !self.is_fai() && !self.is_cas() {
            return false;
        }
        matches!(
            g.label_opt(self.pos().next()),
            Some(LabelEnum::Write(w)) if w.is_rmw() && w.addr == self.addr
        )
    }

    pub fn value_makes_rmw_succeed(&self, val: SVal) -> bool {
        match self.rmw {
            ReadRmw::Plain => false,
            ReadRmw::Fai { .. } => true,
            ReadRmw::Cas { expected, .. } => val == expected,
        }
    }

    /// The value read, looked up at the rf source.
    pub fn access_value(&self, g: &ExecutionGraph) -> SVal {
        let rf = self
            .rf
            .unwrap_or_else(|| panic!("value of read {} without rf", self.pos()));
        match g.label(rf) {
            LabelEnum::Init(_) => g.init_val(self.addr),
            LabelEnum::Write(w) => w.val,
            other => panic!("read {} reads from {} which is not a write", self.pos(), other),
        }
    }

    pub fn return_value(&self, g: &ExecutionGraph) -> SVal {
        assert!(
            self.rf.is_some(),
            "return value of read {} without rf",
            self.pos()
        );
        self.access_value(g)
    }
}

impl fmt::Display for ReadLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{} {} [{}]",
            self.label,
            self.kind,
            self.label.ordering,
            self.addr,
            match self.rf {
                Some(rf) => rf.to_string(),
                None => "BOTTOM".to_string(),
            }
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriteLabel {
    label: EventLabel,
    kind: EventLabelKind,
    addr: SAddr,
    size: ASize,
    val: SVal,
    readers: Vec<Event>,
}
as_label!(WriteLabel);

impl WriteLabel {
    pub fn new(
        pos: Event,
        ordering: MemOrdering,
        addr: SAddr,
        size: ASize,
        val: SVal,
        deps: EventDeps,
    ) -> Self {
        Self {
            label: EventLabel::new(pos, ordering, deps),
            kind: K::Write,
            addr,
            size,
            val,
            readers: vec![],
        }
    }

    /// The write half of a fetch-and-op.
    pub fn new_fai(
        pos: Event,
        ordering: MemOrdering,
        addr: SAddr,
        size: ASize,
        val: SVal,
        deps: EventDeps,
    ) -> Self {
        Self {
            kind: K::FaiWrite,
            ..Self::new(pos, ordering, addr, size, val, deps)
        }
    }

    /// The write half of a successful compare-and-swap.
    pub fn new_cas(
        pos: Event,
        ordering: MemOrdering,
        addr: SAddr,
        size: ASize,
        val: SVal,
        deps: EventDeps,
    ) -> Self {
        Self {
            kind: K::CasWrite,
            ..Self::new(pos, ordering, addr, size, val, deps)
        }
    }

    /// Refines the kind within the write's family (plain, FAI or CAS writes).
    pub fn with_kind(mut self, kind: EventLabelKind) -> Self {
        let same_family = if self.kind.is_fai_write() {
            kind.is_fai_write()
        } else if self.kind.is_cas_write() {
            kind.is_cas_write()
        } else {
            kind.is_write() && !kind.is_fai_write() && !kind.is_cas_write()
        };
        assert!(same_family, "{:?} does not refine {:?}", kind, self.kind);
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> EventLabelKind {
        self.kind
    }

    pub fn addr(&self) -> SAddr {
        self.addr
    }

    pub fn size(&self) -> ASize {
        self.size
    }

    pub fn val(&self) -> SVal {
        self.val
    }

    pub fn set_val(&mut self, v: SVal) {
        self.val = v;
    }

    pub fn readers(&self) -> &[Event] {
        &self.readers
    }

    pub(crate) fn add_reader(&mut self, r: Event) {
        debug_assert!(!self.readers.contains(&r));
        self.readers.push(r);
    }

    pub(crate) fn remove_reader(&mut self, pred: impl Fn(Event) -> bool) {
        self.readers.retain(|&r| !pred(r));
    }

    pub fn is_rmw(&self) -> bool {
        self.kind.is_cas_write() || self.kind.is_fai_write()
    }

    /// An exchange that stores the value it read changes nothing.
    pub fn is_effectful(&self, g: &ExecutionGraph) -> bool {
        if !self.kind.is_fai_write() {
            return true;
        }
        match g.read_label(self.pos().prev()) {
            Some(r) => match r.rmw {
                ReadRmw::Fai {
                    op: RmwBinOp::Xchg, ..
                } => self.val != r.access_value(g),
                _ => true,
            },
            None => panic!("RMW write {} without its read half", self.pos()),
        }
    }

    /// Whether another thread may observe this write.
    ///
    /// Non-release writes to fresh dynamic memory stay private to the allocating thread
    /// until the thread releases or reads the location.
    pub fn is_observable(&self, g: &ExecutionGraph) -> bool {
        if self.label.ordering.is_at_least_release() || !self.addr.is_dynamic() {
            return true;
        }
        let Some(mlab) = g.find_allocating_label(self.addr) else {
            return true;
        };
        let mpos = mlab.pos();
        if mpos.thread != self.pos().thread || mpos.index > self.pos().index {
            return true;
        }
        ((mpos.index + 1)..self.pos().index).any(|i| {
            let lab = g.label(Event::new(mpos.thread, i));
            lab.is_at_least_release() || (lab.is_read() && lab.addr() == Some(self.addr))
        })
    }
}

impl fmt::Display for WriteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{} {} {}",
            self.label, self.kind, self.label.ordering, self.addr, self.val
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FenceLabel {
    label: EventLabel,
}
as_label!(FenceLabel);

impl FenceLabel {
    pub fn new(pos: Event, ordering: MemOrdering) -> Self {
        Self {
            label: EventLabel::new(pos, ordering, EventDeps::new()),
        }
    }
}

impl fmt::Display for FenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: F{}", self.label, self.label.ordering)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MallocLabel {
    label: EventLabel,
    addr: SAddr,
    size: ASize,
    name: Option<String>,
    accesses: Vec<Event>,
    dealloc: Option<Event>,
}
as_label!(MallocLabel);

impl MallocLabel {
    pub fn new(pos: Event, addr: SAddr, size: ASize, deps: EventDeps) -> Self {
        assert!(addr.is_dynamic(), "allocation of static address {}", addr);
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, deps),
            addr,
            size,
            name: None,
            accesses: vec![],
            dealloc: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    pub fn addr(&self) -> SAddr {
        self.addr
    }

    pub fn size(&self) -> ASize {
        self.size
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn contains(&self, addr: SAddr) -> bool {
        addr.is_within(self.addr, self.size)
    }

    /// Memory accesses to the block, in insertion order.
    pub fn accesses(&self) -> &[Event] {
        &self.accesses
    }

    pub(crate) fn add_access(&mut self, e: Event) {
        self.accesses.push(e);
    }

    pub(crate) fn remove_access(&mut self, e: Event) {
        self.accesses.retain(|&a| a != e);
    }

    pub fn dealloc(&self) -> Option<Event> {
        self.dealloc
    }

    pub(crate) fn set_dealloc(&mut self, f: Option<Event>) {
        self.dealloc = f;
    }
}

impl fmt::Display for MallocLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: MALLOC {} [{}]", self.label, self.addr, self.size)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        Ok(())
    }
}

/// A deallocation; hazard-pointer retirements are frees too.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FreeLabel {
    label: EventLabel,
    kind: EventLabelKind,
    addr: SAddr,
    alloc: Option<Event>,
}
as_label!(FreeLabel);

impl FreeLabel {
    pub fn new(pos: Event, addr: SAddr, deps: EventDeps) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, deps),
            kind: K::Free,
            addr,
            alloc: None,
        }
    }

    pub fn new_retire(pos: Event, addr: SAddr, deps: EventDeps) -> Self {
        Self {
            kind: K::HpRetire,
            ..Self::new(pos, addr, deps)
        }
    }

    pub fn kind(&self) -> EventLabelKind {
        self.kind
    }

    pub fn addr(&self) -> SAddr {
        self.addr
    }

    pub fn alloc(&self) -> Option<Event> {
        self.alloc
    }

    pub(crate) fn set_alloc(&mut self, m: Option<Event>) {
        self.alloc = m;
    }
}

impl fmt::Display for FreeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.label, self.kind, self.addr)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HpProtectLabel {
    label: EventLabel,
    hp_addr: SAddr,
    prot_addr: SAddr,
}
as_label!(HpProtectLabel);

impl HpProtectLabel {
    pub fn new(pos: Event, hp_addr: SAddr, prot_addr: SAddr, deps: EventDeps) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::Release, deps),
            hp_addr,
            prot_addr,
        }
    }

    pub fn hp_addr(&self) -> SAddr {
        self.hp_addr
    }

    pub fn prot_addr(&self) -> SAddr {
        self.prot_addr
    }
}

impl fmt::Display for HpProtectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: HP_PROTECT {} {}",
            self.label, self.hp_addr, self.prot_addr
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodBeginLabel {
    label: EventLabel,
    name: String,
    arg: SVal,
    lin_preds: VSet<Event>,
}
as_label!(MethodBeginLabel);

impl MethodBeginLabel {
    pub fn new(pos: Event, name: &str, arg: SVal) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, EventDeps::new()),
            name: name.to_owned(),
            arg,
            lin_preds: VSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg(&self) -> SVal {
        self.arg
    }

    /// Method ends linearized before this call begins.
    pub fn lin_preds(&self) -> &VSet<Event> {
        &self.lin_preds
    }

    pub(crate) fn lin_preds_mut(&mut self) -> &mut VSet<Event> {
        &mut self.lin_preds
    }
}

impl fmt::Display for MethodBeginLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: BEGIN {}({})", self.label, self.name, self.arg)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodEndLabel {
    label: EventLabel,
    name: String,
    ret: SVal,
    lin_succs: VSet<Event>,
}
as_label!(MethodEndLabel);

impl MethodEndLabel {
    pub fn new(pos: Event, name: &str, ret: SVal) -> Self {
        Self {
            label: EventLabel::new(pos, MemOrdering::NotAtomic, EventDeps::new()),
            name: name.to_owned(),
            ret,
            lin_succs: VSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ret(&self) -> SVal {
        self.ret
    }

    /// Method begins linearized after this call ends.
    pub fn lin_succs(&self) -> &VSet<Event> {
        &self.lin_succs
    }

    pub(crate) fn lin_succs_mut(&mut self) -> &mut VSet<Event> {
        &mut self.lin_succs
    }
}

impl fmt::Display for MethodEndLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: END {} -> {}", self.label, self.name, self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ev;

    fn x() -> SAddr {
        SAddr::new_static(0)
    }

    #[test]
    fn category_ranges() {
        assert!(K::ReadOptBlock.is_block() && K::ReadOptBlock.is_terminator());
        assert!(K::ThreadFinish.is_terminator() && !K::ThreadFinish.is_block());
        assert!(!K::Optional.is_terminator());
        assert!(K::ConfirmingCasRead.is_cas_read() && K::ConfirmingCasRead.is_read());
        assert!(K::LockCasRead.is_lock_cas_read() && K::LockCasRead.is_cas_read());
        assert!(!K::HelpedCasRead.is_lock_cas_read());
        assert!(K::BIncFaiWrite.is_fai_write() && K::BIncFaiWrite.is_write());
        assert!(K::UnlockWrite.is_unlock_write() && !K::UnlockWrite.is_fai_write());
        assert!(K::Write.is_mem_access() && K::ConfirmingCasWrite.is_mem_access());
        assert!(!K::Fence.is_mem_access() && !K::ThreadStart.is_mem_access());
        assert!(K::HpRetire.is_free() && !K::HpProtect.is_free());
        assert!(K::Malloc.is_alloc());
        assert!(K::TrylockCasWrite.is_lock_cas_write() && !K::CasWrite.is_lock_cas_write());
        assert!(!K::Unknown.is_mem_access() && !K::Unknown.is_terminator());
    }

    #[test]
    fn unknown_kind_prints_degraded() {
        assert_eq!(K::Unknown.to_string(), "UNKNOWN");
        assert_eq!(K::Unknown.to_string(), "UNKNOWN");
        let k: EventLabelKind = serde_json::from_str("\"SomeFutureKind\"").unwrap();
        assert_eq!(k, K::Unknown);
    }

    #[test]
    fn category_predicates() {
        let r = LabelEnum::Read(ReadLabel::new(
            ev(1, 1),
            MemOrdering::Acquire,
            x(),
            4,
            EventDeps::new(),
        ));
        assert!(r.is_dependable() && r.returns_value() && r.accesses_value() && r.has_location());
        assert!(r.is_at_least_acquire() && !r.is_at_least_release());

        let w = LabelEnum::Write(WriteLabel::new(
            ev(1, 2),
            MemOrdering::Relaxed,
            x(),
            4,
            SVal(1),
            EventDeps::new(),
        ));
        assert!(!w.is_dependable() && !w.returns_value() && w.accesses_value());

        let init = LabelEnum::Init(InitLabel::new());
        assert!(init.accesses_value() && !init.has_location());

        let m = LabelEnum::Malloc(MallocLabel::new(
            ev(1, 3),
            SAddr::new_heap(0),
            8,
            EventDeps::new(),
        ));
        assert!(m.is_dependable() && !m.accesses_value());

        let o = LabelEnum::Optional(OptionalLabel::new(ev(1, 4), EventDeps::new()));
        assert!(o.is_dependable() && o.returns_value());
    }

    #[test]
    fn cas_success_depends_on_expected_value() {
        let cas = ReadLabel::new_cas(
            ev(1, 1),
            MemOrdering::SequentiallyConsistent,
            x(),
            4,
            SVal(0),
            SVal(1),
            EventDeps::new(),
        );
        assert!(cas.value_makes_rmw_succeed(SVal(0)));
        assert!(!cas.value_makes_rmw_succeed(SVal(2)));

        let fai = ReadLabel::new_fai(
            ev(1, 1),
            MemOrdering::Relaxed,
            x(),
            4,
            RmwBinOp::Add,
            SVal(1),
            EventDeps::new(),
        );
        assert!(fai.value_makes_rmw_succeed(SVal(7)));

        let plain = ReadLabel::new(ev(1, 1), MemOrdering::Relaxed, x(), 4, EventDeps::new());
        assert!(!plain.value_makes_rmw_succeed(SVal(0)));
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn read_kinds_stay_in_family() {
        ReadLabel::new(ev(1, 1), MemOrdering::Relaxed, x(), 4, EventDeps::new())
            .with_kind(K::CasRead);
    }

    #[test]
    fn write_rmw_families() {
        let w = |k| {
            WriteLabel::new_cas(ev(1, 2), MemOrdering::Relaxed, x(), 4, SVal(1), EventDeps::new())
                .with_kind(k)
        };
        assert!(w(K::LockCasWrite).is_rmw());
        assert!(w(K::HelpedCasWrite).is_rmw());
        let plain = WriteLabel::new(ev(1, 2), MemOrdering::Relaxed, x(), 4, SVal(1), EventDeps::new())
            .with_kind(K::UnlockWrite);
        assert!(!plain.is_rmw());
    }

    #[test]
    fn private_and_no_op_writes() {
        let deps = EventDeps::new;
        let heap = SAddr::new_heap(0);
        let mut g = ExecutionGraph::new();
        g.add_label(LabelEnum::ThreadStart(
            ThreadStartLabel::new(ev(1, 0), Event::init(), SVal(7))
                .with_symmetric(crate::thread::construct_thread_id(2)),
        ));
        assert_eq!(g.label(ev(1, 0)).return_value(&g), SVal(7));
        assert!(g.thread_start_label(ev(1, 0)).is_some_and(|s| s.symmetric().is_some()));

        g.add_label(LabelEnum::Malloc(
            MallocLabel::new(ev(1, 1), heap, 8, deps()).with_name("buf"),
        ));
        assert_eq!(g.malloc_label(ev(1, 1)).and_then(|m| m.name()), Some("buf"));
        let w = |i, v| WriteLabel::new(ev(1, i), MemOrdering::Relaxed, heap, 4, SVal(v), deps());
        g.add_label(LabelEnum::Write(w(2, 1)));
        assert!(!g.write_label(ev(1, 2)).unwrap().is_observable(&g));
        g.add_label(LabelEnum::Fence(FenceLabel::new(ev(1, 3), MemOrdering::Release)));
        g.add_label(LabelEnum::Write(w(4, 2)));
        assert!(g.write_label(ev(1, 4)).unwrap().is_observable(&g));

        // an exchange writing back the value it read
        g.set_init_val(x(), SVal(5));
        g.add_label(LabelEnum::Read(
            ReadLabel::new_fai(ev(1, 5), MemOrdering::Relaxed, x(), 4, RmwBinOp::Xchg, SVal(5), deps())
                .with_rf(Event::init()),
        ));
        g.add_label(LabelEnum::Write(WriteLabel::new_fai(
            ev(1, 6),
            MemOrdering::Relaxed,
            x(),
            4,
            SVal(5),
            deps(),
        )));
        assert!(!g.write_label(ev(1, 6)).unwrap().is_effectful(&g));
        g.write_label_mut(ev(1, 6)).unwrap().set_val(SVal(6));
        assert!(g.write_label(ev(1, 6)).unwrap().is_effectful(&g));
        assert!(g.write_label(ev(1, 4)).unwrap().is_effectful(&g));
    }

    #[test]
    fn optional_blocks_and_retires() {
        let g = ExecutionGraph::new();
        let mut o = OptionalLabel::new(ev(1, 1), EventDeps::new());
        assert!(o.is_expandable() && !o.is_expanded());
        o.set_expanded(true);
        o.set_expandable(false);
        assert!(o.is_expanded() && !o.is_expandable());
        assert_eq!(LabelEnum::Optional(o).return_value(&g), SVal::from_bool(true));

        let retire = FreeLabel::new_retire(ev(1, 2), SAddr::new_heap(0), EventDeps::new());
        assert_eq!(retire.kind(), K::HpRetire);
        assert!(retire.kind().is_free());
    }

    #[test]
    fn init_and_empty_alias_slot_zero() {
        let init = LabelEnum::Init(InitLabel::new());
        assert_eq!(init.view(0), init.view(3));
        assert_eq!(init.calculated(0), init.calculated(5));

        let mut empty = LabelEnum::Empty(EmptyLabel::new(ev(1, 1)));
        let mut v = View::new();
        v.update_or_set(ev(1, 1));
        empty.set_views(vec![v.clone()]);
        empty.set_calculated(vec![VSet::new()]);
        assert_eq!(empty.view(2), &v);
        assert_eq!(empty.calculated(1), empty.calculated(0));
    }

    #[test]
    #[should_panic(expected = "requested before it was calculated")]
    fn other_labels_do_not_alias() {
        let mut f = LabelEnum::Fence(FenceLabel::new(ev(1, 1), MemOrdering::SequentiallyConsistent));
        f.set_views(vec![View::new()]);
        f.view(1);
    }

    #[test]
    fn reset_clears_caches_and_links() {
        let mut w = LabelEnum::Write(WriteLabel::new(
            ev(1, 1),
            MemOrdering::Relaxed,
            x(),
            4,
            SVal(1),
            EventDeps::new(),
        ));
        w.set_stamp(3);
        w.set_views(vec![View::new()]);
        w.prefix_view_or_init(VectorClock::default);
        if let LabelEnum::Write(wl) = &mut w {
            wl.add_reader(ev(2, 1));
        }
        w.reset();
        assert!(!w.stamped());
        assert_eq!(w.views_len(), 0);
        assert!(w.prefix_view().is_none());
        if let LabelEnum::Write(wl) = &w {
            assert!(wl.readers().is_empty());
        }
    }

    #[test]
    #[should_panic(expected = "already stamped")]
    fn stamps_are_set_once() {
        let mut f = LabelEnum::Fence(FenceLabel::new(ev(1, 1), MemOrdering::Acquire));
        f.set_stamp(1);
        f.set_stamp(2);
    }

    #[test]
    fn stability() {
        let mut r = LabelEnum::Read(ReadLabel::new(
            ev(1, 1),
            MemOrdering::Relaxed,
            x(),
            4,
            EventDeps::new(),
        ));
        assert!(!r.is_stable());
        r.set_added_max(false);
        assert!(r.is_stable());
        r.set_added_max(true);
        r.set_revisitable(false);
        assert!(r.is_stable());
    }
}
