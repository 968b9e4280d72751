//! `CapabilityMask`: the safety model governing what a Task may do to
//! assets and to its owning Spec's queue (spec.md Section 4.2).
//!
//! Hand-rolled rather than built on the `bitflags` crate: the two
//! predicates below (`contains`/`valid`) treat an all-zero mask
//! specially, which doesn't map cleanly onto `bitflags`'s generated API —
//! see DESIGN.md.

/// Present-marker bit distinguishing "explicitly no permissions" from
/// "mask left undefined".
pub const DEFINED: u16 = 1 << 0;
pub const ASSETS_EMIT: u16 = 1 << 1;
/// Subset of EMIT: required to introduce a URL path not yet seen by the
/// owning Spec's AssetFrame.
pub const ASSETS_GENERATE: u16 = 1 << 2;
pub const ASSETS_CONSUME_FROM_SPECS: u16 = 1 << 3;
pub const ASSETS_CONSUME_FROM_TASKS: u16 = 1 << 4;
/// Permission to drop an asset returned as a filtering result by a task in
/// the same Spec as the one that emitted it.
pub const ASSETS_FILTER_TASK: u16 = 1 << 5;
/// Permission to drop an asset a *different* Spec emitted (the filtering
/// task sits on the parent side of an inter-Spec emit).
pub const ASSETS_FILTER_SPEC: u16 = 1 << 6;
pub const ASSETS_MUTATE: u16 = 1 << 7;
pub const TASKS_QUEUE: u16 = 1 << 8;

/// Either form of CONSUME.
pub const ASSETS_CONSUME: u16 = ASSETS_CONSUME_FROM_SPECS | ASSETS_CONSUME_FROM_TASKS;

/// A mask with every bit set, used as the resolver-tree root's accept set.
pub const UNIVERSAL: u16 = DEFINED
    | ASSETS_EMIT
    | ASSETS_GENERATE
    | ASSETS_CONSUME_FROM_SPECS
    | ASSETS_CONSUME_FROM_TASKS
    | ASSETS_FILTER_TASK
    | ASSETS_FILTER_SPEC
    | ASSETS_MUTATE
    | TASKS_QUEUE;

/// A Task or TaskResolver's capability bitmap (spec.md Section 4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct CapabilityMask(u16);

impl CapabilityMask {
    pub const NONE: CapabilityMask = CapabilityMask(0);
    pub const UNIVERSAL: CapabilityMask = CapabilityMask(UNIVERSAL);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn with(self, bit: u16) -> Self {
        Self(self.0 | bit)
    }

    pub const fn has(self, bit: u16) -> bool {
        self.0 & bit == bit
    }

    pub const fn is_defined(self) -> bool {
        self.has(DEFINED)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    fn is_universal(self) -> bool {
        self.0 & UNIVERSAL == UNIVERSAL
    }

    /// `Contains(accept, test)`: the accept set permits the test
    /// operation. A zero `test` is permitted only when `accept` is zero or
    /// fully universal (spec.md Section 4.2).
    pub fn contains(accept: CapabilityMask, test: CapabilityMask) -> bool {
        if test.is_zero() {
            return accept.is_zero() || accept.is_universal();
        }
        accept.0 & test.0 == test.0
    }

    /// `Valid(accept, test)`: test is a subset of accept; a zero test is
    /// treated as "needs everything", which only a universal accept
    /// allows (spec.md Section 4.2).
    pub fn valid(accept: CapabilityMask, test: CapabilityMask) -> bool {
        if test.is_zero() {
            return accept.is_universal();
        }
        accept.0 & test.0 == test.0
    }
}

impl std::ops::BitOr for CapabilityMask {
    type Output = CapabilityMask;
    fn bitor(self, rhs: Self) -> Self::Output {
        CapabilityMask(self.0 | rhs.0)
    }
}
