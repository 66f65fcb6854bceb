//! # World
//!
//! The world bundles the [`Registry`] with a typed [`Resources`] singleton
//! map. Systems observe the world through a [`Viewer`] and mutate it only
//! through deferred commands, so the world itself carries no locks.

use std::any::Any;
use std::collections::HashMap;

use crate::engine::component::component_id_of;
use crate::engine::registry::Registry;
use crate::engine::types::ComponentTypeId;
use crate::engine::viewer::Viewer;

/// Marker contract for resource types stored on the world.
///
/// Unlike components, resources are singletons: at most one value per type.
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}

/// Typed singleton map, keyed by the same deterministic type hash as
/// component storages.
#[derive(Default)]
pub struct Resources {
    values: HashMap<ComponentTypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    /// Creates an empty resource map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the resource of type `R`.
    pub fn upsert<R: Resource>(&mut self, value: R) {
        self.values.insert(component_id_of::<R>(), Box::new(value));
    }

    /// Removes and returns the resource of type `R`, if present.
    pub fn remove<R: Resource>(&mut self) -> Option<R> {
        let boxed = self.values.remove(&component_id_of::<R>())?;
        boxed.downcast::<R>().ok().map(|value| *value)
    }

    /// Reference to the resource of type `R`, if present.
    pub fn get<R: Resource>(&self) -> Option<&R> {
        self.values.get(&component_id_of::<R>())?.downcast_ref()
    }

    /// Mutable reference to the resource of type `R`, if present.
    pub fn get_mut<R: Resource>(&mut self) -> Option<&mut R> {
        self.values.get_mut(&component_id_of::<R>())?.downcast_mut()
    }

    /// Returns `true` if a resource of type `R` is present.
    pub fn contains<R: Resource>(&self) -> bool {
        self.values.contains_key(&component_id_of::<R>())
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no resources are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Registry plus resources; the state systems operate on.
#[derive(Default)]
pub struct World {
    registry: Registry,
    resources: Resources,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// The component registry.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the component registry.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The resource map.
    #[inline]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Mutable access to the resource map.
    #[inline]
    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// A viewer over this world's registry.
    #[inline]
    pub fn viewer(&self) -> Viewer<'_> {
        Viewer::new(&self.registry)
    }
}
