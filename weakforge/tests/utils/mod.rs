use log::LevelFilter;
use simplelog::{CombinedLogger, SimpleLogger};
use std::any::Any;
use std::sync::Once;

use weakforge::deps::EventDeps;
use weakforge::event::ev;
use weakforge::event_label::*;
use weakforge::ordering::MemOrdering;
use weakforge::value::{RmwBinOp, SAddr, SVal};
use weakforge::{Config, Driver, Event, ExecutionGraph, MemoryModel};

static INIT_LOG: Once = Once::new();

#[allow(dead_code)] // Only used in tests
pub fn init_log() {
    INIT_LOG.call_once(|| {
        CombinedLogger::init(vec![SimpleLogger::new(
            LevelFilter::Trace,
            simplelog::Config::default(),
        )])
        .unwrap()
    });
}

#[allow(dead_code)] // Only used in tests
pub fn assert_panic_contains(result: Result<(), Box<dyn Any + Send>>, expected_msg: &str) {
    match result {
        Ok(_) => {
            panic!("The function was expected to panic, but it did not.");
        }
        Err(msg) => {
            if let Some(s) = msg.downcast_ref::<String>() {
                assert!(
                    s.contains(expected_msg),
                    "Expected `{}` in `{}`",
                    expected_msg,
                    s
                );
            } else if let Some(&s) = msg.downcast_ref::<&str>() {
                assert!(
                    s.contains(expected_msg),
                    "Expected `{}` in `{}`",
                    expected_msg,
                    s
                );
            } else {
                panic!("The panic did not return a string; can't display it.");
            }
        }
    }
}

#[allow(dead_code)]
pub fn x() -> SAddr {
    SAddr::new_static(0)
}

#[allow(dead_code)]
pub fn y() -> SAddr {
    SAddr::new_static(8)
}

/// Builds a graph one event at a time, each appended to its thread and given its views.
#[allow(dead_code)]
pub struct Litmus {
    pub g: ExecutionGraph,
    pub d: Driver,
}

#[allow(dead_code)]
impl Litmus {
    pub fn new(model: MemoryModel) -> Self {
        Self::with_config(Config::builder().with_model(model).build())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            g: ExecutionGraph::new(),
            d: Driver::new(config),
        }
    }

    /// The position of the next event of thread `t`.
    pub fn next(&self, t: u32) -> Event {
        let e = ev(t, 0);
        ev(t, self.g.thread_size(e.thread) as u32)
    }

    fn add(&mut self, lab: LabelEnum) -> Event {
        self.d.add_to_graph(&mut self.g, lab)
    }

    /// Starts thread `t`, created by the initializer.
    pub fn spawn(&mut self, t: u32) -> Event {
        let pos = self.next(t);
        self.add(LabelEnum::ThreadStart(ThreadStartLabel::new(
            pos,
            Event::init(),
            SVal(0),
        )))
    }

    pub fn write(&mut self, t: u32, ord: MemOrdering, addr: SAddr, val: u64) -> Event {
        self.write_with(t, ord, addr, val, EventDeps::new())
    }

    pub fn write_with(
        &mut self,
        t: u32,
        ord: MemOrdering,
        addr: SAddr,
        val: u64,
        deps: EventDeps,
    ) -> Event {
        let pos = self.next(t);
        self.add(LabelEnum::Write(WriteLabel::new(
            pos,
            ord,
            addr,
            4,
            SVal(val),
            deps,
        )))
    }

    pub fn read(&mut self, t: u32, ord: MemOrdering, addr: SAddr, rf: Event) -> Event {
        let pos = self.next(t);
        self.add(LabelEnum::Read(
            ReadLabel::new(pos, ord, addr, 4, EventDeps::new()).with_rf(rf),
        ))
    }

    pub fn fence(&mut self, t: u32, ord: MemOrdering) -> Event {
        let pos = self.next(t);
        self.add(LabelEnum::Fence(FenceLabel::new(pos, ord)))
    }

    /// A fetch-and-add: its read and its write.
    pub fn fai(&mut self, t: u32, ord: MemOrdering, addr: SAddr, rf: Event) -> (Event, Event) {
        let pos = self.next(t);
        let r = self.add(LabelEnum::Read(
            ReadLabel::new_fai(pos, ord, addr, 4, RmwBinOp::Add, SVal(1), EventDeps::new())
                .with_rf(rf),
        ));
        let val = self.g.read_label(r).map(|r| r.access_value(&self.g)).unwrap();
        let pos = self.next(t);
        let w = self.add(LabelEnum::Write(WriteLabel::new_fai(
            pos,
            ord,
            addr,
            4,
            RmwBinOp::Add.apply(val, SVal(1)),
            EventDeps::new(),
        )));
        (r, w)
    }

    pub fn malloc(&mut self, t: u32, addr: SAddr, size: u32) -> Event {
        let pos = self.next(t);
        self.add(LabelEnum::Malloc(MallocLabel::new(
            pos,
            addr,
            size,
            EventDeps::new(),
        )))
    }

    pub fn free(&mut self, t: u32, addr: SAddr) -> Event {
        let pos = self.next(t);
        self.add(LabelEnum::Free(FreeLabel::new(pos, addr, EventDeps::new())))
    }

    pub fn consistent(&mut self) -> bool {
        self.d.is_consistent_graph(&self.g)
    }
}
