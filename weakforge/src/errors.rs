//! Verification findings and one-shot diagnostics.

use std::cell::RefCell;
use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

/// The kinds of errors and warnings an execution can exhibit.
///
/// `Ok` stands for "no error"; the remaining variants are reported together with a witness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VerificationError {
    Ok,
    Safety,
    Recovery,
    Liveness,
    RaceNotAtomic,
    RaceFreeMalloc,
    FreeNonMalloc,
    DoubleFree,
    Allocation,
    UninitializedMem,
    AccessNonMalloc,
    AccessFreed,
    InvalidAccessBegin,
    InvalidAccessEnd,
    InvalidCreate,
    InvalidJoin,
    InvalidUnlock,
    InvalidBInit,
    InvalidRecoveryCall,
    InvalidTruncate,
    Annotation,
    MixedSize,
    LinearizabilityError,
    SystemError,
    WWRace,
    UnfreedMemory,
}

impl VerificationError {
    /// The stable `VE_*` tag of this kind.
    pub fn tag(self) -> &'static str {
        use VerificationError::*;
        match self {
            Ok => "VE_OK",
            Safety => "VE_Safety",
            Recovery => "VE_Recovery",
            Liveness => "VE_Liveness",
            RaceNotAtomic => "VE_RaceNotAtomic",
            RaceFreeMalloc => "VE_RaceFreeMalloc",
            FreeNonMalloc => "VE_FreeNonMalloc",
            DoubleFree => "VE_DoubleFree",
            Allocation => "VE_Allocation",
            UninitializedMem => "VE_UninitializedMem",
            AccessNonMalloc => "VE_AccessNonMalloc",
            AccessFreed => "VE_AccessFreed",
            InvalidAccessBegin => "VE_InvalidAccessBegin",
            InvalidAccessEnd => "VE_InvalidAccessEnd",
            InvalidCreate => "VE_InvalidCreate",
            InvalidJoin => "VE_InvalidJoin",
            InvalidUnlock => "VE_InvalidUnlock",
            InvalidBInit => "VE_InvalidBInit",
            InvalidRecoveryCall => "VE_InvalidRecoveryCall",
            InvalidTruncate => "VE_InvalidTruncate",
            Annotation => "VE_Annotation",
            MixedSize => "VE_MixedSize",
            LinearizabilityError => "VE_LinearizabilityError",
            SystemError => "VE_SystemError",
            WWRace => "VE_WWRace",
            UnfreedMemory => "VE_UnfreedMemory",
        }
    }

    /// Warnings do not stop exploration by themselves.
    pub fn is_warning(self) -> bool {
        matches!(self, VerificationError::WWRace | VerificationError::UnfreedMemory)
    }
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use VerificationError::*;
        let msg = match self {
            Ok => "No error",
            Safety => "Safety violation",
            Recovery => "Recovery error",
            Liveness => "Liveness violation",
            RaceNotAtomic => "Non-atomic race",
            RaceFreeMalloc => "Malloc-free race",
            FreeNonMalloc => "Attempt to free non-allocated memory",
            DoubleFree => "Double-free error",
            Allocation => "Allocation error",
            UninitializedMem => "Attempt to read from uninitialized memory",
            AccessNonMalloc => "Attempt to access non-allocated memory",
            AccessFreed => "Attempt to access freed memory",
            InvalidAccessBegin => "Invalid access-begin annotation",
            InvalidAccessEnd => "Invalid access-end annotation",
            InvalidCreate => "Invalid thread creation",
            InvalidJoin => "Invalid join() operation",
            InvalidUnlock => "Invalid unlock() operation",
            InvalidBInit => "Invalid barrier initialization",
            InvalidRecoveryCall => "Invalid function call during recovery",
            InvalidTruncate => "Invalid file truncation",
            Annotation => "Annotation error",
            MixedSize => "Mixed-size accesses",
            LinearizabilityError => "Linearizability error",
            SystemError => "System error",
            WWRace => "Unordered writes",
            UnfreedMemory => "Unfreed memory",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for VerificationError {}

thread_local! {
    static REPORTED: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Logs `msg` the first time `key` is reported on this thread and stays silent afterwards.
///
/// Returns whether the message was emitted.
pub fn print_bugreport_info_once(key: &str, msg: &str) -> bool {
    let first = REPORTED.with(|r| r.borrow_mut().insert(key.to_owned()));
    if first {
        warn!(
            "BUG: {}. Please submit a bug report including the graph that triggered it.",
            msg
        );
    }
    first
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(VerificationError::Ok.tag(), "VE_OK");
        assert_eq!(VerificationError::WWRace.tag(), "VE_WWRace");
        assert_eq!(VerificationError::AccessNonMalloc.tag(), "VE_AccessNonMalloc");
        assert_eq!(VerificationError::DoubleFree.tag(), "VE_DoubleFree");
        assert_eq!(VerificationError::AccessFreed.tag(), "VE_AccessFreed");
        assert_eq!(VerificationError::RaceNotAtomic.tag(), "VE_RaceNotAtomic");
        assert!(VerificationError::WWRace.is_warning());
        assert!(!VerificationError::DoubleFree.is_warning());
    }

    #[test]
    fn bug_report_is_printed_once_per_key() {
        assert!(print_bugreport_info_once("test-key-a", "first"));
        assert!(!print_bugreport_info_once("test-key-a", "again"));
        assert!(print_bugreport_info_once("test-key-b", "other key"));
    }
}
