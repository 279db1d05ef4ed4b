//! Consistency checking for stateless model checking under weak memory models.
//!
//! An [`ExecutionGraph`] records the events of one execution together with the
//! reads-from and coherence relations. A [`Driver`] computes the per-event views a memory
//! model needs, and answers the questions an exploration algorithm asks while growing the
//! graph: is it consistent, which writes may a read read from, where may a write be placed
//! in coherence, which reads may be revisited.
//!
//! ```
//! use weakforge::{Config, Driver, MemoryModel};
//!
//! let driver = Driver::new(Config::builder().with_model(MemoryModel::SC).build());
//! assert!(!driver.is_dep_tracking());
//! ```

pub mod automaton;
pub mod deps;
mod driver;
pub mod errors;
pub mod event;
pub mod event_label;
pub mod exec_graph;
pub mod models;
pub mod ordering;
pub mod relation;
pub mod thread;
pub mod value;
pub mod vector_clock;
pub mod vset;

pub use driver::Driver;
pub use errors::VerificationError;
pub use event::Event;
pub use exec_graph::ExecutionGraph;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters of one [`Driver`].
#[derive(Default, Clone, Debug)]
pub struct Stats {
    /// Calls to `is_consistent` and `is_consistent_graph`
    pub consistency_checks: usize,
    /// Acyclicity checks skipped because their precheck found nothing
    pub prechecks_short_circuited: usize,
    /// Inconsistent verdicts
    pub inconsistent: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// Available memory models
#[derive(PartialEq, Eq, Default, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum MemoryModel {
    /// Sequential consistency
    SC,
    /// x86 total store order
    TSO,
    /// Release/acquire
    RA,
    /// Repaired C11
    #[default]
    RC11,
    /// The intermediate model; tracks dependencies
    IMM,
}

impl fmt::Display for MemoryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Checker configuration options.
///
/// Use the [`ConfigBuilder`] class to construct a `Config` struct.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Config {
    pub(crate) model: MemoryModel,
    pub(crate) race_detection: bool,
    pub(crate) ww_race_warnings: bool,
    pub(crate) memory_checks: bool,
    pub(crate) verbose: usize,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn model(&self) -> MemoryModel {
        self.model
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Builds a [`Config`] struct.
pub struct ConfigBuilder(Config);

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder(Config {
            model: MemoryModel::default(),
            race_detection: true,
            ww_race_warnings: true,
            memory_checks: true,
            verbose: 0,
        })
    }

    /// Checks whether the current config is valid and
    /// returns it if it is. Raises an error otherwise
    fn check_valid(self) -> Self {
        if self.0.ww_race_warnings && !self.0.race_detection {
            eprintln!("Write-write race warnings require race detection!");
            std::process::exit(exitcode::CONFIG);
        } else {
            self
        }
    }

    pub fn with_model(mut self, m: MemoryModel) -> Self {
        self.0.model = m;
        self
    }

    /// Reports accesses racing with a non-atomic access as errors
    pub fn with_race_detection(mut self, b: bool) -> Self {
        self.0.race_detection = b;
        self
    }

    /// Reports unordered writes to the same location as warnings
    pub fn with_ww_race_warnings(mut self, b: bool) -> Self {
        self.0.ww_race_warnings = b;
        self
    }

    /// Checks accesses and frees against the allocations of the graph
    pub fn with_memory_checks(mut self, b: bool) -> Self {
        self.0.memory_checks = b;
        self
    }

    /// Whether to log the graph on inconsistent verdicts
    pub fn with_verbose(mut self, v: usize) -> Self {
        self.0.verbose = v;
        self
    }

    /// Consumes the builder and produces the [`Config`]
    pub fn build(self) -> Config {
        self.check_valid().0
    }
}
