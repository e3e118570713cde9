//! # Entity Handles
//!
//! Entities are plain 32-bit identifiers consisting of:
//! - A 20-bit index, used to address sparse arrays
//! - A 12-bit generation counter for detecting stale handles after reuse

/// Opaque entity handle.
///
/// The handle is split into two parts:
/// - Lower 20 bits: index into sparse arrays
/// - Upper 12 bits: generation counter
///
/// An entity carries no data and is never owned by a pool. A pool holding a
/// component for an entity says nothing about whether the entity is still
/// alive in the [`Registry`](crate::Registry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Number of bits used for the index.
    pub const INDEX_BITS: u32 = 20;
    /// Mask selecting the index bits.
    pub const INDEX_MASK: u32 = (1 << Self::INDEX_BITS) - 1;
    /// Mask selecting the generation bits once shifted down.
    pub const GENERATION_MASK: u32 = (1 << (32 - Self::INDEX_BITS)) - 1;
    /// Largest index an entity can address.
    pub const MAX_INDEX: u32 = Self::INDEX_MASK - 1;

    /// Reserved handle that refers to nothing.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates an entity from its index and generation.
    ///
    /// Bits outside the respective masks are discarded.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(
            (index & Self::INDEX_MASK)
                | ((generation & Self::GENERATION_MASK) << Self::INDEX_BITS),
        )
    }

    /// Reconstructs an entity from its raw bit pattern.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bit pattern.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 & Self::INDEX_MASK
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> Self::INDEX_BITS) & Self::GENERATION_MASK
    }

    /// Returns the same index with the generation bumped by one.
    ///
    /// Wraps around, skipping the generation used by [`Entity::INVALID`] so a
    /// recycled handle can never compare equal to the sentinel.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        let mut generation = (self.generation() + 1) & Self::GENERATION_MASK;
        if generation == Self::INVALID.generation() {
            generation = 0;
        }
        Self::new(self.index(), generation)
    }

    /// Checks whether this is the [`Entity::INVALID`] sentinel.
    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }

    /// Index as a `usize`, for addressing sparse arrays.
    #[inline]
    #[must_use]
    pub(crate) const fn slot(self) -> usize {
        self.index() as usize
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_invalid() {
            write!(f, "Entity(invalid)")
        } else {
            write!(f, "Entity({}v{})", self.index(), self.generation())
        }
    }
}

impl From<u32> for Entity {
    /// Builds a generation-zero entity from a plain index.
    fn from(index: u32) -> Self {
        Self::new(index, 0)
    }
}
