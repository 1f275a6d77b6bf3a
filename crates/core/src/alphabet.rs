//! The slot alphabet: probe order, sentinels, and platform capability.
//!
//! The alphabet is the ordered set of mutually-exclusive slot types a
//! container supports. The order is part of the wire contract: decode probes
//! slots in exactly this order, and a symbol's base value *is* its slot's
//! position in the table. Changing [`PROBE_ORDER`] is a breaking wire-format
//! change.
//!
//! # Sentinel policy
//!
//! Encoding occupies a slot with a sentinel value whose only job is to read
//! as "present". Scalar slots must never hold their natural zero (a zero
//! scalar is indistinguishable from an unset slot; see
//! [`crate::container`]), so every scalar sentinel is a one-value. Sequence
//! slots signal by presence alone, so their sentinel is the empty sequence.
//!
//! # Platform capability
//!
//! Not every platform version supports every slot type. A capability maps to
//! the number of *leading* slots usable on that version; usable sets are
//! monotonic (newer versions are supersets), so the usable slots always form
//! a prefix of the table. The prefix length is the alphabet size and the
//! modulus for expansion-code arithmetic.

use crate::container::SlotValue;
use crate::error::{CodecError, Result};

/// One of the mutually-exclusive value kinds a container slot can hold.
///
/// Discriminant order matches [`PROBE_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotType {
    Bool,
    BoolVec,
    I8,
    I8Vec,
    Char,
    CharVec,
    Str,
    StrVec,
    StrList,
    F64,
    F64Vec,
    F32,
    F32Vec,
    I32,
    I32Vec,
    I64,
    I64Vec,
    RecordVec,
    I16,
    I16Vec,
    RecordMap,
}

/// The fixed probe order. Index in this table = base symbol value.
pub const PROBE_ORDER: [SlotType; 21] = [
    SlotType::Bool,
    SlotType::BoolVec,
    SlotType::I8,
    SlotType::I8Vec,
    SlotType::Char,
    SlotType::CharVec,
    SlotType::Str,
    SlotType::StrVec,
    SlotType::StrList,
    SlotType::F64,
    SlotType::F64Vec,
    SlotType::F32,
    SlotType::F32Vec,
    SlotType::I32,
    SlotType::I32Vec,
    SlotType::I64,
    SlotType::I64Vec,
    SlotType::RecordVec,
    SlotType::I16,
    SlotType::I16Vec,
    SlotType::RecordMap,
];

/// Total number of slot types the protocol defines.
pub const NUM_SLOT_TYPES: usize = PROBE_ORDER.len();

impl SlotType {
    /// The slot at a given alphabet index.
    ///
    /// # Panics
    /// Panics if `index >= NUM_SLOT_TYPES`; callers derive indices from
    /// symbol arithmetic that is range-checked first.
    pub fn at(index: usize) -> SlotType {
        PROBE_ORDER[index]
    }

    /// This slot's position in the alphabet.
    pub fn index(self) -> usize {
        // Discriminant order matches the table
        self as usize
    }

    /// Whether this slot is a scalar (subject to the zero-ambiguity rule).
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            SlotType::Bool
                | SlotType::I8
                | SlotType::Char
                | SlotType::F64
                | SlotType::F32
                | SlotType::I32
                | SlotType::I64
                | SlotType::I16
        )
    }

    /// The non-zero sentinel value written when this slot encodes a symbol.
    pub fn sentinel(self) -> SlotValue {
        match self {
            SlotType::Bool => SlotValue::Bool(true),
            SlotType::BoolVec => SlotValue::BoolVec(Vec::new()),
            SlotType::I8 => SlotValue::I8(1),
            SlotType::I8Vec => SlotValue::I8Vec(Vec::new()),
            SlotType::Char => SlotValue::Char('\u{1}'),
            SlotType::CharVec => SlotValue::CharVec(Vec::new()),
            SlotType::Str => SlotValue::Str("1".to_string()),
            SlotType::StrVec => SlotValue::StrVec(Vec::new()),
            SlotType::StrList => SlotValue::StrList(Vec::new()),
            SlotType::F64 => SlotValue::F64(1.0),
            SlotType::F64Vec => SlotValue::F64Vec(Vec::new()),
            SlotType::F32 => SlotValue::F32(1.0),
            SlotType::F32Vec => SlotValue::F32Vec(Vec::new()),
            SlotType::I32 => SlotValue::I32(1),
            SlotType::I32Vec => SlotValue::I32Vec(Vec::new()),
            SlotType::I64 => SlotValue::I64(1),
            SlotType::I64Vec => SlotValue::I64Vec(Vec::new()),
            SlotType::RecordVec => SlotValue::RecordVec(Vec::new()),
            SlotType::I16 => SlotValue::I16(1),
            SlotType::I16Vec => SlotValue::I16Vec(Vec::new()),
            SlotType::RecordMap => SlotValue::RecordMap(Default::default()),
        }
    }

    /// Whether this slot is usable on the given platform capability.
    pub fn is_usable(self, capability: PlatformCapability) -> Result<bool> {
        let n = capability.usable_slot_count()?;
        Ok(self.index() < n as usize)
    }
}

/// Lowest platform version the protocol knows about.
pub const MIN_KNOWN_VERSION: u32 = 1;

/// Highest platform version the protocol knows about.
pub const MAX_KNOWN_VERSION: u32 = 34;

/// Version thresholds: `(min_version, usable_leading_slots)`.
///
/// The string-array slots (indices 7 and 8) arrived at version 8; everything
/// after them in the table is gated behind the same threshold so the usable
/// set stays a prefix.
const CAPABILITY_TABLE: [(u32, i32); 2] = [(1, 7), (8, 21)];

/// An opaque platform/version identifier.
///
/// Determines how many leading slots of [`PROBE_ORDER`] the target platform
/// actually supports, and therefore the alphabet size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapability(pub u32);

impl PlatformCapability {
    /// The newest version this implementation knows about.
    pub fn latest() -> Self {
        PlatformCapability(MAX_KNOWN_VERSION)
    }

    /// Number of leading slots usable on this version: the alphabet size.
    ///
    /// # Errors
    /// `InvalidCapability` if the version is outside the known range.
    pub fn usable_slot_count(self) -> Result<i32> {
        if self.0 < MIN_KNOWN_VERSION || self.0 > MAX_KNOWN_VERSION {
            return Err(CodecError::InvalidCapability { version: self.0 }.into());
        }

        let mut count = 0;
        for (min_version, slots) in CAPABILITY_TABLE {
            if self.0 >= min_version {
                count = slots;
            }
        }
        Ok(count)
    }
}
