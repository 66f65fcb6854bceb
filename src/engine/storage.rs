//! # Sparse-Set Component Storage
//!
//! Per-component-type container providing O(1) insert, remove, and lookup
//! plus cache-friendly dense iteration.
//!
//! ## Layout
//!
//! - `sparse` — indexed by entity id; value `0` means "absent", otherwise
//!   `value - 1` is the position in the packed arrays. The +1 bias lets `0`
//!   mean "empty" without a separate bitset.
//! - `entities` — packed, dense; carries the full versioned handle.
//! - `payload` — packed, dense; `entities[i]` owns `payload[i]`.
//!
//! ## Invariants
//! - For every `i < entities.len()`:
//!   `sparse[entities[i].id()] == i + 1`.
//! - For every `id` with `sparse[id] != 0`:
//!   `entities[sparse[id] - 1].id() == id`.
//! - `entities.len() == payload.len()`.
//!
//! Removal swaps the target with the last packed entry before popping, so
//! packed order is insertion-minus-swap order and any outstanding packed
//! position is invalidated by a removal.
//!
//! ## Type erasure
//!
//! The registry stores storages behind [`ErasedStorage`], an object-safe
//! trait exposing the id-based operations; typed access downcasts through
//! `as_any`.

use std::any::Any;

use rayon::prelude::*;

use crate::engine::component::Component;
use crate::engine::entity::Entity;
use crate::engine::types::IdType;

/// Object-safe view of a sparse-set storage, keyed by entity id.
///
/// The registry owns storages behind this trait and performs structural
/// operations (detach, destroy) without knowing the payload type.
pub trait ErasedStorage: Any + Send + Sync {
    /// Returns `true` if a payload is stored for `id`.
    fn contains(&self, id: IdType) -> bool;

    /// Returns `true` if a payload is stored for the exact handle
    /// (id and version both match).
    fn contains_entity(&self, entity: Entity) -> bool;

    /// Removes the payload stored for `id`. Absent ids are a silent no-op.
    fn remove(&mut self, id: IdType);

    /// The packed entity array, in iteration order.
    fn entities(&self) -> &[Entity];

    /// Number of stored payloads.
    fn len(&self) -> usize;

    /// Returns `true` if the storage holds no payloads.
    fn is_empty(&self) -> bool;

    /// Capacity hint; no observable state change.
    fn reserve(&mut self, additional: usize);

    /// Capacity hint; no observable state change.
    fn shrink_to_fit(&mut self);

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse-set storage for components of type `T`.
pub struct SparseSet<T: Component> {
    sparse: Vec<IdType>,
    entities: Vec<Entity>,
    payload: Vec<T>,
}

impl<T: Component> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            payload: Vec::new(),
        }
    }
}

impl<T: Component> SparseSet<T> {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a payload is stored for `id`.
    #[inline]
    pub fn contains(&self, id: IdType) -> bool {
        (id as usize) < self.sparse.len() && self.sparse[id as usize] != 0
    }

    /// Returns `true` if a payload is stored for the exact handle.
    ///
    /// Unlike [`SparseSet::contains`], the stored version must match.
    #[inline]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        let id = entity.id();
        self.contains(id) && self.entities[self.index_of(id)] == entity
    }

    /// Packed position of `id`. Caller must have verified `contains`.
    #[inline]
    fn index_of(&self, id: IdType) -> usize {
        self.sparse[id as usize] as usize - 1
    }

    fn assure(&mut self, id: IdType) {
        let needed = id as usize + 1;
        if self.sparse.len() < needed {
            self.sparse.resize(needed, 0);
        }
    }

    /// Inserts a payload for `entity`, or overwrites the existing one.
    ///
    /// On overwrite the stored handle is refreshed as well, so the storage
    /// always carries the latest version seen for an id.
    pub fn upsert(&mut self, entity: Entity, value: T) {
        let id = entity.id();
        if self.contains(id) {
            let index = self.index_of(id);
            self.entities[index] = entity;
            self.payload[index] = value;
        } else {
            self.assure(id);
            self.sparse[id as usize] = (self.entities.len() + 1) as IdType;
            self.entities.push(entity);
            self.payload.push(value);
        }
    }

    /// Removes the payload stored for `id`.
    ///
    /// Swap-to-back with the last packed entry keeps the arrays dense; the
    /// sparse slot of the swapped entity is updated so the invariants hold.
    /// Absent ids are a silent no-op.
    pub fn remove(&mut self, id: IdType) {
        if !self.contains(id) {
            return;
        }

        self.swap_to_back(id);
        self.entities.pop();
        self.payload.pop();
        self.sparse[id as usize] = 0;
    }

    fn swap_to_back(&mut self, id: IdType) {
        let last_id = self
            .entities
            .last()
            .expect("contains(id) implies a non-empty packed array")
            .id();
        self.swap(id, last_id);
    }

    /// Swaps the packed positions of two stored ids. Self-swap is a no-op.
    fn swap(&mut self, id1: IdType, id2: IdType) {
        if id1 == id2 {
            return;
        }

        let index1 = self.index_of(id1);
        let index2 = self.index_of(id2);

        self.entities.swap(index1, index2);
        self.payload.swap(index1, index2);

        self.sparse[id1 as usize] = (index2 + 1) as IdType;
        self.sparse[id2 as usize] = (index1 + 1) as IdType;
    }

    /// Returns the payload stored for `id`, if any.
    #[inline]
    pub fn get(&self, id: IdType) -> Option<&T> {
        if !self.contains(id) {
            return None;
        }
        Some(&self.payload[self.index_of(id)])
    }

    /// Returns the payload stored for `id` mutably, if any.
    #[inline]
    pub fn get_mut(&mut self, id: IdType) -> Option<&mut T> {
        if !self.contains(id) {
            return None;
        }
        let index = self.index_of(id);
        Some(&mut self.payload[index])
    }

    /// Returns the payload stored for `id`.
    ///
    /// Caller must have verified [`SparseSet::contains`]; absent ids abort
    /// in debug builds.
    #[inline]
    pub fn component_of(&self, id: IdType) -> &T {
        debug_assert!(self.contains(id), "component_of on absent id {id}");
        &self.payload[self.index_of(id)]
    }

    /// Mutable variant of [`SparseSet::component_of`].
    #[inline]
    pub fn component_of_mut(&mut self, id: IdType) -> &mut T {
        debug_assert!(self.contains(id), "component_of_mut on absent id {id}");
        let index = self.index_of(id);
        &mut self.payload[index]
    }

    /// Stored handle for `id`. Caller must have verified `contains`.
    #[inline]
    pub fn entity_of(&self, id: IdType) -> Entity {
        debug_assert!(self.contains(id), "entity_of on absent id {id}");
        self.entities[self.index_of(id)]
    }

    /// The packed entity array, in iteration order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of stored payloads.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the storage holds no payloads.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Reserves capacity in the packed arrays.
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
        self.payload.reserve(additional);
    }

    /// Releases unused packed capacity.
    pub fn shrink_to_fit(&mut self) {
        self.entities.shrink_to_fit();
        self.payload.shrink_to_fit();
    }

    /// Iterates `(entity, &payload)` pairs in packed order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.payload.iter())
    }

    /// Iterates `(entity, &mut payload)` pairs in packed order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.payload.iter_mut())
    }

    /// Parallel traversal of the packed arrays.
    pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = (Entity, &T)> {
        self.entities.par_iter().copied().zip(self.payload.par_iter())
    }

    /// Parallel mutable traversal of the packed arrays.
    pub fn par_iter_mut(&mut self) -> impl IndexedParallelIterator<Item = (Entity, &mut T)> {
        self.entities
            .par_iter()
            .copied()
            .zip(self.payload.par_iter_mut())
    }
}

impl<T: Component> ErasedStorage for SparseSet<T> {
    fn contains(&self, id: IdType) -> bool {
        SparseSet::contains(self, id)
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        SparseSet::contains_entity(self, entity)
    }

    fn remove(&mut self, id: IdType) {
        SparseSet::remove(self, id);
    }

    fn entities(&self) -> &[Entity] {
        SparseSet::entities(self)
    }

    fn len(&self) -> usize {
        SparseSet::len(self)
    }

    fn is_empty(&self) -> bool {
        SparseSet::is_empty(self)
    }

    fn reserve(&mut self, additional: usize) {
        SparseSet::reserve(self, additional);
    }

    fn shrink_to_fit(&mut self) {
        SparseSet::shrink_to_fit(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
