//! `TypeMask`: the two-bit-field mask describing what an Asset's content
//! looks like (spec.md Section 3).
//!
//! Bit layout:
//! - bit 0: quantity (0 = single, 1 = multi)
//! - bits 1..=4: access bits for a *single* asset (byte-reader, byte-writer,
//!   data-reader, data-writer)
//! - bits 1..=3: access bits for a *multi* asset (array, array-builder,
//!   generator) — these overlap the single bits numerically but are only
//!   ever interpreted relative to the quantity bit, so a mask is always read
//!   through the `is_multi`/`is_single` accessors rather than bit-compared
//!   across quantities.

#![allow(clippy::unusual_byte_groupings)]

/// Quantity bit: set means "multi", clear means "single".
pub const QUANTITY_MULTI: u16 = 1 << 0;

/// Single-asset access bits.
pub const BYTE_READER: u16 = 1 << 1;
pub const BYTE_WRITER: u16 = 1 << 2;
pub const DATA_READER: u16 = 1 << 3;
pub const DATA_WRITER: u16 = 1 << 4;

/// Multi-asset access bits.
pub const ARRAY: u16 = 1 << 1;
pub const ARRAY_BUILDER: u16 = 1 << 2;
pub const GENERATOR: u16 = 1 << 3;

/// What kind of content an [`crate::asset::Asset`] carries and how it may be
/// accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TypeMask(u16);

impl TypeMask {
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_multi(self) -> bool {
        self.0 & QUANTITY_MULTI != 0
    }

    pub const fn is_single(self) -> bool {
        !self.is_multi()
    }

    pub const fn single(access: u16) -> Self {
        Self(access & !QUANTITY_MULTI)
    }

    pub const fn multi(access: u16) -> Self {
        Self((access & !QUANTITY_MULTI) | QUANTITY_MULTI)
    }

    pub const fn has(self, bit: u16) -> bool {
        self.0 & bit == bit
    }

    pub const fn byte_reader(self) -> bool {
        self.is_single() && self.has(BYTE_READER)
    }

    pub const fn byte_writer(self) -> bool {
        self.is_single() && self.has(BYTE_WRITER)
    }

    pub const fn data_reader(self) -> bool {
        self.is_single() && self.has(DATA_READER)
    }

    pub const fn data_writer(self) -> bool {
        self.is_single() && self.has(DATA_WRITER)
    }

    pub const fn array(self) -> bool {
        self.is_multi() && self.has(ARRAY)
    }

    pub const fn array_builder(self) -> bool {
        self.is_multi() && self.has(ARRAY_BUILDER)
    }

    pub const fn generator(self) -> bool {
        self.is_multi() && self.has(GENERATOR)
    }

    /// A single asset with both byte and data read/write access — the
    /// common case for in-memory produced artifacts.
    pub const fn single_read_write() -> Self {
        Self::single(BYTE_READER | BYTE_WRITER | DATA_READER | DATA_WRITER)
    }

    pub const fn single_read_only() -> Self {
        Self::single(BYTE_READER | DATA_READER)
    }

    pub const fn multi_array() -> Self {
        Self::multi(ARRAY)
    }

    pub const fn multi_generator() -> Self {
        Self::multi(GENERATOR)
    }
}
