// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! External references into a store: stable, direct, and the typed accessor.
//!
//! All three hold a non-owning back-reference to their store, so an
//! outstanding reference never keeps a store alive. Reads through a dead
//! entity (or a dropped store) resolve to `None`; writes are silently
//! dropped. This favors silent no-ops over errors for stale references,
//! which suits a store accessed from many decoupled subsystems.

use strata_core::Entity;

use crate::ecs::store::{Component, SharedSlot, Store, WeakStore};

/// A stable reference that survives compaction.
///
/// Every access re-checks entity liveness via the lifecycle manager and
/// re-resolves the current slot through the shared indirection box, so the
/// reference stays correct no matter how many unrelated removals have moved
/// the component since it was taken.
pub struct StableRef<C: Component> {
    store: WeakStore<C>,
    entity: Entity,
    slot: SharedSlot,
}

impl<C: Component> Clone for StableRef<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            entity: self.entity,
            slot: self.slot.clone(),
        }
    }
}

impl<C: Component> StableRef<C> {
    pub(crate) fn new(store: WeakStore<C>, entity: Entity, slot: SharedSlot) -> Self {
        Self {
            store,
            entity,
            slot,
        }
    }

    /// Entity this reference tracks.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Current component value, or `None` when the entity is dead or the
    /// store has been dropped.
    pub fn get(&self) -> Option<C> {
        let store = self.store.upgrade()?;
        if store.manager().is_alive(self.entity) {
            Some(store.get(self.slot.get()))
        } else {
            None
        }
    }

    /// Overwrites the component. Silently dropped when the entity is dead or
    /// the store has been dropped.
    pub fn set(&self, component: C) {
        if let Some(store) = self.store.upgrade() {
            if store.manager().is_alive(self.entity) {
                store.put(self.slot.get(), component);
            }
        }
    }

    /// Removes the component from its store. A no-op when the entity is dead
    /// or the store has been dropped.
    pub fn remove(&self) {
        if let Some(store) = self.store.upgrade() {
            if store.manager().is_alive(self.entity) {
                store.remove_at(self.slot.get());
            }
        }
    }

    /// Snapshot as a direct reference, or `None` when the entity is dead.
    ///
    /// The result is only valid until the next mutation of the store.
    pub fn direct(&self) -> Option<DirectRef<C>> {
        let store = self.store.upgrade()?;
        if store.manager().is_alive(self.entity) {
            Some(DirectRef::new(
                self.store.clone(),
                self.entity,
                self.slot.get(),
            ))
        } else {
            None
        }
    }
}

/// A direct reference into a store, valid only for the instant of its
/// creation.
///
/// It captures a raw slot index and skips the indirection box, trading
/// safety for speed: any mutation of the store invalidates it, and resolving
/// a stale one is caller misuse. Writes still re-check entity liveness (an
/// O(1) table read), so a write through a reference whose entity has died
/// leaves the store unchanged.
pub struct DirectRef<C: Component> {
    store: WeakStore<C>,
    entity: Entity,
    slot: usize,
}

impl<C: Component> Clone for DirectRef<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            entity: self.entity,
            slot: self.slot,
        }
    }
}

impl<C: Component> DirectRef<C> {
    pub(crate) fn new(store: WeakStore<C>, entity: Entity, slot: usize) -> Self {
        Self {
            store,
            entity,
            slot,
        }
    }

    fn store(&self) -> Store<C> {
        self.store
            .upgrade()
            .expect("store dropped while a direct reference was held")
    }

    /// Entity this reference was taken for.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The captured slot index.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Component value at the captured slot, with no revalidation.
    ///
    /// # Panics
    ///
    /// Panics if the store has shrunk below the captured slot.
    pub fn get(&self) -> C {
        self.store().get(self.slot)
    }

    /// Overwrites the component at the captured slot. Silently dropped when
    /// the entity has died since the reference was taken.
    pub fn set(&self, component: C) {
        let store = self.store();
        if store.manager().is_alive(self.entity) {
            store.put(self.slot, component);
        }
    }

    /// Removes the component at the captured slot.
    ///
    /// # Panics
    ///
    /// Panics if the store has shrunk below the captured slot.
    pub fn remove(&self) {
        self.store().remove_at(self.slot);
    }

    /// Stable counterpart of this reference, surviving future compaction.
    pub fn stable(&self) -> StableRef<C> {
        StableRef::new(
            self.store.clone(),
            self.entity,
            self.store().shared_slot_at(self.slot),
        )
    }
}

/// The typed accessor façade: optional-value get/set over a handle, without
/// exposing slot indices.
///
/// Reading returns `None` if the entity is dead; writing is a no-op if the
/// entity is dead, else delegates to the store's in-place overwrite.
pub struct Accessor<C: Component> {
    store: WeakStore<C>,
    entity: Entity,
    slot: SharedSlot,
}

impl<C: Component> Clone for Accessor<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            entity: self.entity,
            slot: self.slot.clone(),
        }
    }
}

impl<C: Component> Accessor<C> {
    pub(crate) fn new(store: WeakStore<C>, entity: Entity, slot: SharedSlot) -> Self {
        Self {
            store,
            entity,
            slot,
        }
    }

    /// Entity this accessor wraps.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Current component value, or `None` when the entity is dead or the
    /// store has been dropped.
    pub fn get(&self) -> Option<C> {
        let store = self.store.upgrade()?;
        if store.manager().is_alive(self.entity) {
            Some(store.get(self.slot.get()))
        } else {
            None
        }
    }

    /// Overwrites the component. Silently dropped when the entity is dead or
    /// the store has been dropped.
    pub fn set(&self, component: C) {
        if let Some(store) = self.store.upgrade() {
            if store.manager().is_alive(self.entity) {
                store.put(self.slot.get(), component);
            }
        }
    }
}
