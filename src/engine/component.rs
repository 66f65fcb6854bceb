//! # Component Contract and Type Identity
//!
//! This module defines what a component *is*, how component types are
//! identified at runtime, and the tuple traits used wherever the API
//! accepts a pack of component types.
//!
//! ## Component contract
//!
//! A component is plain data: [`Copy`], [`Default`], `Send + Sync` and
//! `'static`. The blanket implementation makes any such type a component
//! without registration; the constraint keeps storage trivially movable
//! during swap-to-back deletion.
//!
//! ## Type identity
//!
//! [`component_id_of`] hashes the compiler-provided type name with FNV-1a
//! in a `const` context, producing a deterministic [`ComponentTypeId`] at
//! compile time. Collisions are assumed absent within a single build; the
//! id is opaque to users.
//!
//! ## Tuple packs
//!
//! [`ComponentSet`] abstracts a tuple of component types for views and
//! membership queries; [`ComponentBundle`] abstracts a tuple of component
//! *values* for spawning and attachment. Duplicate types inside a pack, and
//! overlap between the packs of a view, are rejected at compile time
//! through `const` assertions evaluated during monomorphization.

use std::any::type_name;

use crate::engine::entity::Entity;
use crate::engine::registry::Registry;
use crate::engine::types::ComponentTypeId;

/// Marker contract for component payload types.
///
/// Blanket-implemented for every `Copy + Default + Send + Sync + 'static`
/// type; user code never implements this by hand.
pub trait Component: Copy + Default + Send + Sync + 'static {}

impl<T: Copy + Default + Send + Sync + 'static> Component for T {}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Returns the deterministic type id of a component type.
///
/// The id is the FNV-1a hash of the type's fully qualified name, computed
/// at compile time. Two distinct types in the same build never share an id.
pub const fn component_id_of<T: 'static>() -> ComponentTypeId {
    fnv1a_64(type_name::<T>().as_bytes())
}

/// Returns `true` if the id slice contains a duplicate.
pub(crate) const fn has_duplicate_ids(ids: &[ComponentTypeId]) -> bool {
    let mut i = 0;
    while i < ids.len() {
        let mut j = i + 1;
        while j < ids.len() {
            if ids[i] == ids[j] {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

/// Returns `true` if the two id slices share any element.
pub(crate) const fn ids_overlap(a: &[ComponentTypeId], b: &[ComponentTypeId]) -> bool {
    let mut i = 0;
    while i < a.len() {
        let mut j = 0;
        while j < b.len() {
            if a[i] == b[j] {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

/// A tuple of component *types*, used by views and membership queries.
///
/// Implemented for tuples up to eight components, plus the empty tuple
/// (a view with empty `Required` ranges over all live entities).
pub trait ComponentSet {
    /// Reference tuple yielded for required components: `(&A, &B, ...)`.
    type Refs<'r>;
    /// Optional tuple yielded for optional components:
    /// `(Option<&A>, Option<&B>, ...)`.
    type Opts<'r>;

    /// Type ids of the pack, in declaration order.
    const TYPE_IDS: &'static [ComponentTypeId];
    /// Number of component types in the pack.
    const LEN: usize;

    /// Fetches references to every component of the pack, or `None` if any
    /// is absent on `entity`.
    fn fetch(registry: &Registry, entity: Entity) -> Option<Self::Refs<'_>>;

    /// Fetches each component of the pack as an optional reference.
    fn fetch_optional(registry: &Registry, entity: Entity) -> Self::Opts<'_>;

    /// Returns `true` if `entity` carries every component of the pack.
    fn contains_all(registry: &Registry, entity: Entity) -> bool;

    /// Returns `true` if `entity` carries any component of the pack.
    fn contains_any(registry: &Registry, entity: Entity) -> bool;
}

impl ComponentSet for () {
    type Refs<'r> = ();
    type Opts<'r> = ();

    const TYPE_IDS: &'static [ComponentTypeId] = &[];
    const LEN: usize = 0;

    #[inline]
    fn fetch(_registry: &Registry, _entity: Entity) -> Option<Self::Refs<'_>> {
        Some(())
    }

    #[inline]
    fn fetch_optional(_registry: &Registry, _entity: Entity) -> Self::Opts<'_> {}

    #[inline]
    fn contains_all(_registry: &Registry, _entity: Entity) -> bool {
        true
    }

    #[inline]
    fn contains_any(_registry: &Registry, _entity: Entity) -> bool {
        false
    }
}

macro_rules! impl_component_set {
    ($($component:ident),+) => {
        impl<$($component: Component),+> ComponentSet for ($($component,)+) {
            type Refs<'r> = ($(&'r $component,)+);
            type Opts<'r> = ($(Option<&'r $component>,)+);

            const TYPE_IDS: &'static [ComponentTypeId] =
                &[$(component_id_of::<$component>()),+];
            const LEN: usize = <Self as ComponentSet>::TYPE_IDS.len();

            #[inline]
            fn fetch(registry: &Registry, entity: Entity) -> Option<Self::Refs<'_>> {
                Some(($(registry.storage::<$component>()?.get(entity.id())?,)+))
            }

            #[inline]
            fn fetch_optional(registry: &Registry, entity: Entity) -> Self::Opts<'_> {
                ($(registry
                    .storage::<$component>()
                    .and_then(|storage| storage.get(entity.id())),)+)
            }

            #[inline]
            fn contains_all(registry: &Registry, entity: Entity) -> bool {
                $(registry.contains_component::<$component>(entity))&&+
            }

            #[inline]
            fn contains_any(registry: &Registry, entity: Entity) -> bool {
                $(registry.contains_component::<$component>(entity))||+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

/// A tuple of component *values*, attached to an entity as one unit.
///
/// Used by `Registry::attach_components` and `Commands::spawn`/`attach`.
/// Duplicate component types inside a bundle fail to compile.
pub trait ComponentBundle: Send + 'static {
    /// Type ids of the bundle, in declaration order.
    const TYPE_IDS: &'static [ComponentTypeId];

    /// Attaches every component of the bundle to `entity`.
    fn attach(self, registry: &mut Registry, entity: Entity);
}

impl ComponentBundle for () {
    const TYPE_IDS: &'static [ComponentTypeId] = &[];

    #[inline]
    fn attach(self, _registry: &mut Registry, _entity: Entity) {}
}

macro_rules! impl_component_bundle {
    ($($component:ident : $index:tt),+) => {
        impl<$($component: Component),+> ComponentBundle for ($($component,)+) {
            const TYPE_IDS: &'static [ComponentTypeId] =
                &[$(component_id_of::<$component>()),+];

            #[inline]
            fn attach(self, registry: &mut Registry, entity: Entity) {
                $(registry.attach_component(entity, self.$index);)+
            }
        }
    };
}

impl_component_bundle!(A: 0);
impl_component_bundle!(A: 0, B: 1);
impl_component_bundle!(A: 0, B: 1, C: 2);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
