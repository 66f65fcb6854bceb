//! Core Types, Identifiers, and Bit-Level Layouts
//!
//! This module defines the **fundamental types, identifiers, and bit layouts**
//! shared across all subsystems of the ECS: entity handles, component type
//! identity, system and stage identifiers.
//!
//! ## Entity Representation
//!
//! Entities are encoded as a single packed integer with the following layout:
//!
//! ```text
//! | version | id |
//! ```
//!
//! - **Id** identifies the slot inside sparse-set storage and the registry.
//! - **Version** enables stale-handle detection after an id is recycled.
//!
//! The handle width is selected at compile time:
//!
//! - default: 32-bit handles, id = 20 bits, version = 12 bits,
//! - `entity64` feature: 64-bit handles, id = 32 bits, version = 32 bits.
//!
//! The exact widths are validated with compile-time assertions below.
//!
//! ## Component Type Identity
//!
//! Component types are identified by a [`ComponentTypeId`], a deterministic
//! compile-time FNV-1a hash of the compiler-provided type name (see the
//! `component` module). The id is opaque to users.

/// Bit-width type used for compile-time layout calculations.
pub type Bits = u32;

/// Raw integer representation of an entity handle (32-bit layout).
#[cfg(not(feature = "entity64"))]
pub type EntityRepr = u32;

/// Raw integer representation of an entity handle (64-bit layout).
#[cfg(feature = "entity64")]
pub type EntityRepr = u64;

/// Entity id component, stored in the low bits of a handle.
pub type IdType = EntityRepr;

/// Entity version component, stored in the high bits of a handle.
pub type VersionType = EntityRepr;

/// Total number of bits in an entity handle.
pub const ENTITY_BITS: Bits = EntityRepr::BITS;

/// Number of bits reserved for the entity id.
#[cfg(not(feature = "entity64"))]
pub const ID_BITS: Bits = 20;

/// Number of bits reserved for the entity id.
#[cfg(feature = "entity64")]
pub const ID_BITS: Bits = 32;

/// Number of bits reserved for the entity version.
#[cfg(not(feature = "entity64"))]
pub const VERSION_BITS: Bits = 12;

/// Number of bits reserved for the entity version.
#[cfg(feature = "entity64")]
pub const VERSION_BITS: Bits = 32;

const _: [(); 1] = [(); (ID_BITS + VERSION_BITS == ENTITY_BITS) as usize];
const _: [(); 1] = [(); (ID_BITS > 0 && ID_BITS < ENTITY_BITS) as usize];
const _: [(); 1] = [(); (VERSION_BITS > 0 && VERSION_BITS < ENTITY_BITS) as usize];

const fn mask(bits: Bits) -> EntityRepr {
    if bits == 0 {
        0
    } else if bits == ENTITY_BITS {
        EntityRepr::MAX
    } else {
        ((1 as EntityRepr) << bits) - 1
    }
}

/// Mask selecting the id portion of a handle.
pub const ID_MASK: EntityRepr = mask(ID_BITS);
/// Mask selecting the version portion of a handle (after shifting).
pub const VERSION_MASK: EntityRepr = mask(VERSION_BITS);
/// Shift distance of the version field inside a handle.
pub const VERSION_SHIFT: Bits = ID_BITS;

/// Unique identifier for a component type.
///
/// Computed as a deterministic compile-time hash of the type's name;
/// collisions are assumed absent within a single build.
pub type ComponentTypeId = u64;

/// Stable identifier of a system inside a system graph.
pub type SystemId = u32;

/// Stable identifier of a stage inside a pipelined scheduler.
pub type StageId = u32;
