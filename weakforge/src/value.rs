//! Values and addresses manipulated by memory events.
use serde::{Deserialize, Serialize};

/// A value read or written by a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SVal(pub u64);

impl SVal {
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn from_bool(b: bool) -> Self {
        SVal(b as u64)
    }
}

impl From<u64> for SVal {
    fn from(v: u64) -> Self {
        SVal(v)
    }
}

impl std::fmt::Display for SVal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access size in bytes.
pub type ASize = u32;

const STATIC_BIT: u64 = 1 << 63;
const HEAP_BIT: u64 = 1 << 62;
const OFFSET_MASK: u64 = HEAP_BIT - 1;

/// A symbolic address.
///
/// The two top bits classify the storage: static (globals), heap (dynamically
/// allocated by a malloc event) or automatic (stack, also dynamically allocated).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SAddr(u64);

impl SAddr {
    pub fn new_static(offset: u64) -> Self {
        SAddr(STATIC_BIT | (offset & OFFSET_MASK))
    }

    pub fn new_heap(offset: u64) -> Self {
        SAddr(HEAP_BIT | (offset & OFFSET_MASK))
    }

    pub fn new_automatic(offset: u64) -> Self {
        SAddr(offset & OFFSET_MASK)
    }

    pub fn is_static(self) -> bool {
        self.0 & STATIC_BIT != 0
    }

    pub fn is_heap(self) -> bool {
        !self.is_static() && self.0 & HEAP_BIT != 0
    }

    pub fn is_automatic(self) -> bool {
        !self.is_static() && !self.is_heap()
    }

    /// Heap or stack storage, i.e. memory that has to be allocated by an event.
    pub fn is_dynamic(self) -> bool {
        !self.is_static()
    }

    pub fn offset(self) -> u64 {
        self.0 & OFFSET_MASK
    }

    /// The address `bytes` past this one, in the same storage class.
    pub fn add(self, bytes: u64) -> Self {
        SAddr((self.0 & !OFFSET_MASK) | ((self.offset() + bytes) & OFFSET_MASK))
    }

    /// Whether this address lies in `[base, base + size)`.
    pub fn is_within(self, base: SAddr, size: ASize) -> bool {
        self.0 & !OFFSET_MASK == base.0 & !OFFSET_MASK
            && base.offset() <= self.offset()
            && self.offset() < base.offset() + size as u64
    }
}

impl std::fmt::Display for SAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let class = if self.is_static() {
            "g"
        } else if self.is_heap() {
            "h"
        } else {
            "s"
        };
        write!(f, "{}#{:x}", class, self.offset())
    }
}

/// The operation of a fetch-and-op read-modify-write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RmwBinOp {
    Xchg,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Max,
    Min,
}

impl RmwBinOp {
    /// The value stored by the operation when it reads `old`.
    pub fn apply(self, old: SVal, operand: SVal) -> SVal {
        let (a, b) = (old.0, operand.0);
        SVal(match self {
            RmwBinOp::Xchg => b,
            RmwBinOp::Add => a.wrapping_add(b),
            RmwBinOp::Sub => a.wrapping_sub(b),
            RmwBinOp::And => a & b,
            RmwBinOp::Or => a | b,
            RmwBinOp::Xor => a ^ b,
            RmwBinOp::Max => a.max(b),
            RmwBinOp::Min => a.min(b),
        })
    }
}

impl std::fmt::Display for RmwBinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RmwBinOp::Xchg => "xchg",
            RmwBinOp::Add => "add",
            RmwBinOp::Sub => "sub",
            RmwBinOp::And => "and",
            RmwBinOp::Or => "or",
            RmwBinOp::Xor => "xor",
            RmwBinOp::Max => "max",
            RmwBinOp::Min => "min",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn storage_classes_are_disjoint() {
        let g = SAddr::new_static(8);
        let h = SAddr::new_heap(8);
        let s = SAddr::new_automatic(8);
        assert!(g.is_static() && !g.is_dynamic());
        assert!(h.is_heap() && h.is_dynamic() && !h.is_automatic());
        assert!(s.is_automatic() && s.is_dynamic());
        assert_ne!(g, h);
        assert_ne!(h, s);
        assert_eq!(g.offset(), h.offset());
    }

    #[test]
    fn block_membership() {
        let base = SAddr::new_heap(0x100);
        assert!(base.is_within(base, 16));
        assert!(base.add(15).is_within(base, 16));
        assert!(!base.add(16).is_within(base, 16));
        assert!(!SAddr::new_static(0x104).is_within(base, 16));
    }

    #[test]
    fn fetch_ops() {
        assert_eq!(RmwBinOp::Add.apply(SVal(2), SVal(3)), SVal(5));
        assert_eq!(RmwBinOp::Xchg.apply(SVal(2), SVal(3)), SVal(3));
        assert_eq!(RmwBinOp::Sub.apply(SVal(0), SVal(1)), SVal(u64::MAX));
        assert_eq!(RmwBinOp::Max.apply(SVal(7), SVal(3)), SVal(7));
    }
}
