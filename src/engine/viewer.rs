//! # Viewer and Views
//!
//! Typed, lazy iteration over the entities matching a component filter.
//!
//! ## Filter model
//!
//! A view is parametrized by three tuples of component types:
//!
//! - **Required** — every yielded entity carries all of these; surfaced as
//!   references.
//! - **Optional** — surfaced as `Option<&T>`, `None` when absent.
//! - **Exclude** — entities carrying any of these are skipped.
//!
//! The three tuples must be pairwise disjoint and internally
//! duplicate-free; violations fail to compile through a `const` assertion
//! evaluated at monomorphization.
//!
//! ## Candidate selection
//!
//! When Required is non-empty, iteration ranges over the packed entities
//! of the storage of the *first* required type (the driver storage), which
//! bounds the candidate set. Picking the rarest required type as driver
//! would minimise rejected candidates, but the static first-type choice
//! keeps the code simple and leaves that tuning to the caller's type
//! order. When Required is empty, iteration ranges over all live entities
//! with only the Exclude filter applied.
//!
//! ## Laziness
//!
//! A view is a single-pass, non-restartable iterator. Mutating the
//! underlying registry during traversal is prevented structurally: systems
//! hold views only over a shared world and defer mutations into the
//! command queue.

use std::collections::hash_map::Keys;
use std::collections::HashSet;
use std::marker::PhantomData;

use rayon::prelude::*;

use crate::engine::component::{has_duplicate_ids, ids_overlap, ComponentSet};
use crate::engine::entity::Entity;
use crate::engine::registry::Registry;
use crate::engine::types::ComponentTypeId;

/// Entry point for constructing views over a registry.
///
/// Systems receive a viewer rather than the registry itself; the viewer
/// only hands out read access.
#[derive(Clone, Copy)]
pub struct Viewer<'w> {
    registry: &'w Registry,
}

impl<'w> Viewer<'w> {
    /// Creates a viewer over `registry`.
    pub fn new(registry: &'w Registry) -> Self {
        Self { registry }
    }

    /// The underlying registry, read-only.
    #[inline]
    pub fn registry(&self) -> &'w Registry {
        self.registry
    }

    /// A view over the entities carrying every component of `R`.
    pub fn view<R: ComponentSet>(&self) -> View<'w, R, (), ()> {
        View::new(self.registry)
    }

    /// A view with required, optional, and excluded component tuples.
    pub fn view_filtered<R, O, X>(&self) -> View<'w, R, O, X>
    where
        R: ComponentSet,
        O: ComponentSet,
        X: ComponentSet,
    {
        View::new(self.registry)
    }
}

enum Candidates<'w> {
    /// Packed entity array of the driver storage.
    Packed(std::slice::Iter<'w, Entity>),
    /// All live entities (empty Required).
    All(Keys<'w, Entity, HashSet<ComponentTypeId>>),
    /// A required storage does not exist; nothing can match.
    Empty,
}

impl Iterator for Candidates<'_> {
    type Item = Entity;

    #[inline]
    fn next(&mut self) -> Option<Entity> {
        match self {
            Candidates::Packed(iter) => iter.next().copied(),
            Candidates::All(keys) => keys.next().copied(),
            Candidates::Empty => None,
        }
    }
}

/// Lazy iterator over the entities matching a component filter.
///
/// Yields `(entity, required_refs, optional_refs)`; use
/// [`View::components`] to drop the handle from the items.
pub struct View<'w, R, O = (), X = ()>
where
    R: ComponentSet,
    O: ComponentSet,
    X: ComponentSet,
{
    registry: &'w Registry,
    candidates: Candidates<'w>,
    _filter: PhantomData<fn() -> (R, O, X)>,
}

impl<'w, R, O, X> View<'w, R, O, X>
where
    R: ComponentSet,
    O: ComponentSet,
    X: ComponentSet,
{
    pub(crate) fn new(registry: &'w Registry) -> Self {
        const {
            assert!(
                !has_duplicate_ids(R::TYPE_IDS),
                "duplicate component types in Required"
            );
            assert!(
                !has_duplicate_ids(O::TYPE_IDS),
                "duplicate component types in Optional"
            );
            assert!(
                !has_duplicate_ids(X::TYPE_IDS),
                "duplicate component types in Exclude"
            );
            assert!(
                !ids_overlap(R::TYPE_IDS, O::TYPE_IDS),
                "Required and Optional overlap"
            );
            assert!(
                !ids_overlap(R::TYPE_IDS, X::TYPE_IDS),
                "Required and Exclude overlap"
            );
            assert!(
                !ids_overlap(O::TYPE_IDS, X::TYPE_IDS),
                "Optional and Exclude overlap"
            );
        }

        let candidates = if R::LEN > 0 {
            // The driver storage bounds the candidate set; without every
            // required storage nothing can match.
            if R::TYPE_IDS
                .iter()
                .all(|&type_id| registry.has_storage_by_id(type_id))
            {
                let driver = registry
                    .erased_storage(R::TYPE_IDS[0])
                    .expect("presence checked just above");
                Candidates::Packed(driver.entities().iter())
            } else {
                Candidates::Empty
            }
        } else {
            Candidates::All(registry.entity_keys())
        };

        Self {
            registry,
            candidates,
            _filter: PhantomData,
        }
    }

    #[inline]
    fn admit(registry: &Registry, entity: Entity) -> bool {
        // Stale handles left in a driver storage are filtered by the live
        // map; Exclude is checked before the (more expensive) fetch.
        registry.contains_entity(entity) && !(X::LEN > 0 && X::contains_any(registry, entity))
    }

    /// Adapts the view to yield component tuples without the handle.
    pub fn components(self) -> impl Iterator<Item = (R::Refs<'w>, O::Opts<'w>)> {
        self.map(|(_, required, optional)| (required, optional))
    }

    /// Invokes `f` for every matching entity, in parallel over the packed
    /// candidate array.
    pub fn par_for_each<F>(self, f: F)
    where
        F: for<'r> Fn(Entity, R::Refs<'r>, O::Opts<'r>) + Send + Sync,
    {
        let registry = self.registry;
        let visit = |entity: Entity| {
            if !Self::admit(registry, entity) {
                return;
            }
            if let Some(required) = R::fetch(registry, entity) {
                f(entity, required, O::fetch_optional(registry, entity));
            }
        };

        match self.candidates {
            Candidates::Packed(iter) => {
                iter.as_slice().par_iter().for_each(|&entity| visit(entity));
            }
            Candidates::All(keys) => {
                let live: Vec<Entity> = keys.copied().collect();
                live.par_iter().for_each(|&entity| visit(entity));
            }
            Candidates::Empty => {}
        }
    }
}

impl<'w, R, O, X> Iterator for View<'w, R, O, X>
where
    R: ComponentSet,
    O: ComponentSet,
    X: ComponentSet,
{
    type Item = (Entity, R::Refs<'w>, O::Opts<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entity = self.candidates.next()?;

            if !Self::admit(self.registry, entity) {
                continue;
            }

            let Some(required) = R::fetch(self.registry, entity) else {
                continue;
            };

            return Some((entity, required, O::fetch_optional(self.registry, entity)));
        }
    }
}
