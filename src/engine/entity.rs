//! # Entity Handles
//!
//! This module defines the versioned entity handle used throughout the ECS.
//!
//! ## Entity Model
//! An [`Entity`] is a compact handle packing two fields into a single
//! integer:
//!
//! - An **id**, indexing into sparse-set storage and the registry.
//! - A **version**, bumped every time an id is recycled so that stale
//!   handles are detectable.
//!
//! ## Invariants
//! - Two live entities never share the same id.
//! - A handle whose version differs from the current version at its id is
//!   *stale* and must not resolve to a component.
//! - No live handle ever equals [`Entity::null`]; the all-ones id is
//!   reserved as the null sentinel and [`Entity::next_version`] skips the
//!   version value equal to that sentinel.
//!
//! ## Notes
//! `Entity` values are cheap to copy and compare and are safe to pass
//! across threads. The handle width (32- or 64-bit) is selected at compile
//! time via the `entity64` feature; see the `types` module for the exact
//! bit layout.

use std::fmt;

use crate::engine::types::{
    EntityRepr, IdType, VersionType, ID_MASK, VERSION_MASK, VERSION_SHIFT,
};

/// Opaque, versioned identifier for an ECS entity.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(EntityRepr);

impl Entity {
    /// Builds a handle from an id and a version.
    ///
    /// Both fields are masked to their configured widths.
    #[inline]
    pub const fn new(id: IdType, version: VersionType) -> Self {
        Self((id & ID_MASK) | ((version & VERSION_MASK) << VERSION_SHIFT))
    }

    /// The null handle: all-ones id, all-ones version.
    ///
    /// Never issued for a live entity.
    #[inline]
    pub const fn null() -> Self {
        Self::new(ID_MASK, VERSION_MASK)
    }

    /// Returns the id field of this handle.
    #[inline]
    pub const fn id(self) -> IdType {
        self.0 & ID_MASK
    }

    /// Returns the version field of this handle.
    #[inline]
    pub const fn version(self) -> VersionType {
        (self.0 >> VERSION_SHIFT) & VERSION_MASK
    }

    /// Splits the handle into `(id, version)`.
    #[inline]
    pub const fn split(self) -> (IdType, VersionType) {
        (self.id(), self.version())
    }

    /// Returns `true` if this handle carries the null id.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.id() == ID_MASK
    }

    /// Returns the same id with the next version.
    ///
    /// The version wraps around at its configured width and skips the value
    /// equal to the all-ones id sentinel, so a recycled handle can never
    /// collide with [`Entity::null`].
    #[inline]
    pub const fn next_version(self) -> Self {
        let next = self.version() + 1;
        let skip = (next == ID_MASK) as EntityRepr;
        Self::new(self.id(), next + skip)
    }

    /// Raw integer representation of the handle.
    #[inline]
    pub const fn to_raw(self) -> EntityRepr {
        self.0
    }

    /// Reconstructs a handle from its raw representation.
    #[inline]
    pub const fn from_raw(raw: EntityRepr) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.id(), self.version())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id(), self.version())
    }
}
