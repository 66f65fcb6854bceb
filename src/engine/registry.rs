//! # Registry
//!
//! The registry owns every component storage and drives the entity
//! lifecycle.
//!
//! ## Responsibilities
//!
//! - Mapping component type ids to type-erased sparse-set storages.
//! - Mapping live entities to the set of component type ids attached.
//! - Recycling entity ids through a free list of pre-version-bumped
//!   handles.
//!
//! ## Storage creation
//!
//! Storage creation is lazy and monotonic: a storage is created on the
//! first attach of its type and never destroyed for the lifetime of the
//! world.
//!
//! ## Concurrency
//!
//! The registry is **not** internally synchronized. Within a stage,
//! concurrent systems may read components through the viewer; all mutation
//! is deferred into the command queue and applied single-threaded between
//! stages. This discipline is enforced structurally by the scheduler and
//! the application run loop.

use std::collections::hash_map::Keys;
use std::collections::{HashMap, HashSet};

use log::trace;

use crate::engine::component::{
    component_id_of, has_duplicate_ids, Component, ComponentBundle, ComponentSet,
};
use crate::engine::entity::Entity;
use crate::engine::error::{DuplicateTypeIdsError, EcsResult};
use crate::engine::storage::{ErasedStorage, SparseSet};
use crate::engine::types::{ComponentTypeId, IdType};

/// Owner of component storages and the entity lifecycle.
#[derive(Default)]
pub struct Registry {
    storages: HashMap<ComponentTypeId, Box<dyn ErasedStorage>>,
    entity_components: HashMap<Entity, HashSet<ComponentTypeId>>,
    free_list: Vec<Entity>,
    next_id: IdType,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new live entity.
    ///
    /// Recycled handles are preferred: the free list holds handles whose
    /// version was already bumped at destroy time, so a popped handle is
    /// immediately valid. Fresh ids start at version 0.
    pub fn create_entity(&mut self) -> Entity {
        if self.free_list.is_empty() {
            self.free_list.push(Entity::new(self.next_id, 0));
            self.next_id += 1;
        }

        let entity = self
            .free_list
            .pop()
            .expect("free list populated just above");
        self.entity_components.insert(entity, HashSet::new());
        entity
    }

    /// Destroys a live entity.
    ///
    /// Every attached component is removed from its storage, the entity is
    /// dropped from the live map, and a version-bumped handle is pushed on
    /// the free list. Destroying a stale or unknown handle is a no-op.
    pub fn destroy_entity(&mut self, entity: Entity) {
        let Some(type_ids) = self.entity_components.remove(&entity) else {
            return;
        };

        for type_id in type_ids {
            if let Some(storage) = self.storages.get_mut(&type_id) {
                storage.remove(entity.id());
            }
        }

        self.free_list.push(entity.next_version());
        trace!("destroyed entity {entity}");
    }

    /// Returns `true` if `entity` is live (id and version both current).
    #[inline]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entity_components.contains_key(&entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entity_components.len()
    }

    /// Iterates over all live entities, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entity_components.keys().copied()
    }

    pub(crate) fn entity_keys(&self) -> Keys<'_, Entity, HashSet<ComponentTypeId>> {
        self.entity_components.keys()
    }

    /// Number of component storages created so far.
    #[inline]
    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }

    /// Typed storage for `T`, if one has been created.
    pub fn storage<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.storages
            .get(&component_id_of::<T>())?
            .as_any()
            .downcast_ref()
    }

    /// Mutable typed storage for `T`, if one has been created.
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseSet<T>> {
        self.storages
            .get_mut(&component_id_of::<T>())?
            .as_any_mut()
            .downcast_mut()
    }

    /// Type-erased storage for `type_id`, if one has been created.
    pub fn erased_storage(&self, type_id: ComponentTypeId) -> Option<&dyn ErasedStorage> {
        self.storages.get(&type_id).map(|storage| storage.as_ref())
    }

    /// Returns `true` if a storage exists for `T`.
    pub fn has_storage<T: Component>(&self) -> bool {
        self.has_storage_by_id(component_id_of::<T>())
    }

    /// Returns `true` if a storage exists for `type_id`.
    #[inline]
    pub fn has_storage_by_id(&self, type_id: ComponentTypeId) -> bool {
        self.storages.contains_key(&type_id)
    }

    /// Typed storage for `T`, created on first use.
    pub fn get_or_create_storage<T: Component>(&mut self) -> &mut SparseSet<T> {
        let type_id = component_id_of::<T>();
        self.storages
            .entry(type_id)
            .or_insert_with(|| {
                trace!("created storage for {}", std::any::type_name::<T>());
                Box::new(SparseSet::<T>::new())
            })
            .as_any_mut()
            .downcast_mut()
            .expect("storage registered under the type id of T")
    }

    /// Attaches a component to `entity`, overwriting any existing payload
    /// of the same type.
    pub fn attach_component<T: Component>(&mut self, entity: Entity, value: T) {
        let type_id = component_id_of::<T>();

        self.entity_components
            .entry(entity)
            .or_default()
            .insert(type_id);

        let storage = self.get_or_create_storage::<T>();
        debug_assert!(
            storage.contains_entity(entity) || !storage.contains(entity.id()),
            "storage holds a different handle for id {}",
            entity.id()
        );
        storage.upsert(entity, value);
    }

    /// Attaches a bundle of components to `entity` as one unit.
    ///
    /// Duplicate component types inside the bundle fail to compile.
    pub fn attach_components<B: ComponentBundle>(&mut self, entity: Entity, bundle: B) {
        const {
            assert!(
                !has_duplicate_ids(B::TYPE_IDS),
                "duplicate component types in bundle"
            )
        };
        bundle.attach(self, entity);
    }

    /// Detaches the component with `type_id` from `entity`.
    ///
    /// A missing storage or an absent component is a silent no-op.
    pub fn detach_component_by_id(&mut self, entity: Entity, type_id: ComponentTypeId) {
        let Some(storage) = self.storages.get_mut(&type_id) else {
            return;
        };

        storage.remove(entity.id());
        if let Some(attached) = self.entity_components.get_mut(&entity) {
            attached.remove(&type_id);
        }
    }

    /// Detaches component `T` from `entity`.
    pub fn detach_component<T: Component>(&mut self, entity: Entity) {
        self.detach_component_by_id(entity, component_id_of::<T>());
    }

    /// Detaches a pack of component types from `entity`.
    ///
    /// Duplicate component types inside the pack fail to compile.
    pub fn detach_components<S: ComponentSet>(&mut self, entity: Entity) {
        const {
            assert!(
                !has_duplicate_ids(S::TYPE_IDS),
                "duplicate component types in pack"
            )
        };
        for &type_id in S::TYPE_IDS {
            self.detach_component_by_id(entity, type_id);
        }
    }

    /// Detaches the listed component type ids from `entity`.
    ///
    /// Duplicate ids in the slice fail with an invalid-argument error and
    /// leave the registry unchanged.
    pub fn detach_components_by_ids(
        &mut self,
        entity: Entity,
        type_ids: &[ComponentTypeId],
    ) -> EcsResult<()> {
        for (i, &type_id) in type_ids.iter().enumerate() {
            if type_ids[i + 1..].contains(&type_id) {
                return Err(DuplicateTypeIdsError { type_id }.into());
            }
        }

        for &type_id in type_ids {
            self.detach_component_by_id(entity, type_id);
        }
        Ok(())
    }

    /// Returns `true` if `entity` carries a component with `type_id`.
    pub fn contains_component_by_id(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        match self.storages.get(&type_id) {
            Some(storage) => storage.contains(entity.id()),
            None => false,
        }
    }

    /// Returns `true` if `entity` carries component `T`.
    pub fn contains_component<T: Component>(&self, entity: Entity) -> bool {
        self.contains_component_by_id(entity, component_id_of::<T>())
    }

    /// Returns `true` if `entity` carries every component of the pack.
    pub fn contains_all<S: ComponentSet>(&self, entity: Entity) -> bool {
        S::contains_all(self, entity)
    }

    /// Returns `true` if `entity` carries any component of the pack.
    pub fn contains_any<S: ComponentSet>(&self, entity: Entity) -> bool {
        S::contains_any(self, entity)
    }

    /// Reference to the `T` payload of `entity`, if attached.
    pub fn component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity.id())
    }

    /// Mutable reference to the `T` payload of `entity`, if attached.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity.id())
    }
}
