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

//! The dense per-type component store and its swap-to-end compaction.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use strata_core::{Entity, EventBus};

use crate::ecs::entity_manager::{EntityManager, StoreId};
use crate::ecs::refs::{Accessor, DirectRef, StableRef};

/// A marker trait for types that can be stored as components.
///
/// `Clone` is required because removed-events carry the component's final
/// value to every subscriber; `'static` because stores and outstanding
/// references hold component data with no borrowed lifetimes.
pub trait Component: Clone + 'static {}

/// The indirection box: a shared mutable cell holding a component's current
/// dense slot index.
///
/// The owning store rewrites the cell whenever compaction moves the
/// component; every other holder only reads it. Cloning shares the cell.
#[derive(Debug, Clone)]
pub struct SharedSlot(Rc<Cell<usize>>);

impl SharedSlot {
    fn new(slot: usize) -> Self {
        Self(Rc::new(Cell::new(slot)))
    }

    /// Current dense slot index of the component this box tracks.
    pub fn get(&self) -> usize {
        self.0.get()
    }

    fn set(&self, slot: usize) {
        self.0.set(slot);
    }
}

struct StoreInner<C: Component> {
    id: StoreId,
    manager: EntityManager,
    /// Index-aligned dense sequences: for every live slot `i`,
    /// `map[entities[i]] == i` and `slots[i].get() == i`.
    entities: Vec<Entity>,
    components: Vec<C>,
    slots: Vec<SharedSlot>,
    map: HashMap<Entity, usize>,
    added: EventBus<usize>,
    removed: EventBus<(Entity, C)>,
}

/// Dense store for a single component type.
///
/// Holds `(entity, component)` pairs in contiguous arrays with no holes:
/// insertion appends, removal swaps the last element into the hole and
/// truncates. Lookup by entity goes through a handle map, and external
/// holders stay valid across compaction via the [`SharedSlot`] indirection
/// box each slot carries.
///
/// A store registers a teardown callback with its [`EntityManager`] for every
/// entity it holds data for, so a full
/// [`remove_entity`](EntityManager::remove_entity) cascades into this store
/// without the manager knowing the component type.
///
/// The store is a cheap handle: cloning shares the same dense arrays.
pub struct Store<C: Component> {
    inner: Rc<RefCell<StoreInner<C>>>,
}

impl<C: Component> Clone for Store<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Non-owning counterpart of [`Store`], held by references and teardown
/// callbacks so that neither keeps a store alive on its own.
pub(crate) struct WeakStore<C: Component> {
    inner: Weak<RefCell<StoreInner<C>>>,
}

impl<C: Component> Clone for WeakStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<C: Component> WeakStore<C> {
    pub(crate) fn upgrade(&self) -> Option<Store<C>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<C: Component> Store<C> {
    pub(crate) fn new(id: StoreId, manager: EntityManager) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                id,
                manager,
                entities: Vec::new(),
                components: Vec::new(),
                slots: Vec::new(),
                map: HashMap::new(),
                added: EventBus::new(),
                removed: EventBus::new(),
            })),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakStore<C> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn manager(&self) -> EntityManager {
        self.inner.borrow().manager.clone()
    }

    /// Number of components currently stored.
    pub fn len(&self) -> usize {
        self.inner.borrow().components.len()
    }

    /// Whether the store holds no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attaches `component` to `entity`.
    ///
    /// Appends to the dense arrays, registers this store's teardown callback
    /// for `entity` with the lifecycle manager, and publishes an added-event
    /// carrying the new slot index before returning. The returned
    /// [`SharedSlot`] tracks the component across compaction.
    ///
    /// Adding twice for the same entity is **not** idempotent: it appends a
    /// duplicate, independent slot. Use [`set`](Self::set) for upsert
    /// semantics.
    pub fn add(&self, component: C, entity: Entity) -> (usize, SharedSlot) {
        let mut inner = self.inner.borrow_mut();
        debug_assert!(
            inner.manager.is_alive(entity),
            "component attached to a dead entity"
        );

        let slot = inner.components.len();
        let shared = SharedSlot::new(slot);
        inner.entities.push(entity);
        inner.components.push(component);
        inner.slots.push(shared.clone());
        inner.map.insert(entity, slot);

        // The callback resolves the slot through the shared box at invocation
        // time, so it stays correct after any number of swaps. It captures
        // the store weakly: the manager must never keep a store alive.
        let store = self.downgrade();
        let tracked = shared.clone();
        let id = inner.id;
        inner.manager.set_teardown(
            entity,
            id,
            Some(Box::new(move || {
                if let Some(store) = store.upgrade() {
                    store.remove_at(tracked.get());
                }
            })),
        );

        inner.added.publish(slot);
        (slot, shared)
    }

    /// Upsert sugar: overwrites in place when `entity` already has a
    /// component here (no event), attaches one otherwise. A no-op when the
    /// entity is dead.
    pub fn set(&self, component: C, entity: Entity) {
        if !self.manager().is_alive(entity) {
            return;
        }
        match self.index_of(entity) {
            Some(slot) => self.put(slot, component),
            None => {
                self.add(component, entity);
            }
        }
    }

    /// Current dense slot of `entity`'s component, or `None` when the entity
    /// is dead or has no component here.
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        let inner = self.inner.borrow();
        if inner.manager.is_alive(entity) {
            inner.map.get(&entity).copied()
        } else {
            None
        }
    }

    /// Component value at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range; callers must hold a valid,
    /// freshly-resolved slot.
    pub fn get(&self, slot: usize) -> C {
        self.inner.borrow().components[slot].clone()
    }

    /// Overwrites the component at `slot` in place. No event is published.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn put(&self, slot: usize, component: C) {
        self.inner.borrow_mut().components[slot] = component;
    }

    /// Entity occupying `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn entity_at(&self, slot: usize) -> Entity {
        self.inner.borrow().entities[slot]
    }

    /// Shared indirection box tracking the component currently at `slot`.
    pub fn shared_slot_at(&self, slot: usize) -> SharedSlot {
        self.inner.borrow().slots[slot].clone()
    }

    /// Typed accessor for the component currently at `slot`.
    pub fn accessor_at(&self, slot: usize) -> Accessor<C> {
        let inner = self.inner.borrow();
        Accessor::new(self.downgrade(), inner.entities[slot], inner.slots[slot].clone())
    }

    /// Stable reference to the component currently at `slot`.
    ///
    /// The reference re-resolves the slot and re-checks entity liveness on
    /// every access, so it stays valid across compaction.
    pub fn stable_ref_at(&self, slot: usize) -> StableRef<C> {
        let inner = self.inner.borrow();
        StableRef::new(self.downgrade(), inner.entities[slot], inner.slots[slot].clone())
    }

    /// Direct reference to the component currently at `slot`.
    ///
    /// Valid only until the next mutation of this store; using it afterwards
    /// is caller misuse.
    pub fn direct_ref_at(&self, slot: usize) -> DirectRef<C> {
        let inner = self.inner.borrow();
        DirectRef::new(self.downgrade(), inner.entities[slot], slot)
    }

    /// Removes the component at `slot` by swap-to-end compaction.
    ///
    /// The last occupied slot is swapped into `slot`, its indirection box is
    /// retargeted, and the dense arrays shrink by one: O(1), at the cost of
    /// iteration order. This store's teardown registration for the removed
    /// entity is cleared, and a removed-event carrying the removed entity and
    /// its final component value is published after the removal completed.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn remove_at(&self, slot: usize) {
        let mut inner = self.inner.borrow_mut();

        let entity = inner.entities.swap_remove(slot);
        let component = inner.components.swap_remove(slot);
        inner.slots.swap_remove(slot);

        if slot < inner.entities.len() {
            // The former last element now occupies `slot`: retarget its
            // indirection box and its map entry.
            inner.slots[slot].set(slot);
            let moved = inner.entities[slot];
            inner.map.insert(moved, slot);
        }
        inner.map.remove(&entity);

        let id = inner.id;
        inner.manager.set_teardown(entity, id, None);

        inner.removed.publish((entity, component));
    }

    /// Removes every component matching `predicate`.
    ///
    /// The scan cursor does not advance after a removal, because the swap
    /// just moved the former last element into the current slot.
    pub fn remove_components(&self, mut predicate: impl FnMut(Entity, &C) -> bool) {
        let mut slot = 0;
        loop {
            let matched = {
                let inner = self.inner.borrow();
                match inner.components.get(slot) {
                    Some(component) => predicate(inner.entities[slot], component),
                    None => break,
                }
            };
            if matched {
                self.remove_at(slot);
            } else {
                slot += 1;
            }
        }
    }

    /// Fully removes, via the lifecycle manager, every entity whose component
    /// here matches `predicate`, cascading into every other store holding
    /// data for those entities.
    pub fn remove_entities(&self, mut predicate: impl FnMut(Entity, &C) -> bool) {
        let manager = self.manager();
        let mut slot = 0;
        loop {
            let target = {
                let inner = self.inner.borrow();
                match inner.components.get(slot) {
                    Some(component) if predicate(inner.entities[slot], component) => {
                        Some(inner.entities[slot])
                    }
                    Some(_) => None,
                    None => break,
                }
            };
            match target {
                Some(entity) => manager.remove_entity(entity),
                None => slot += 1,
            }
        }
    }

    /// Dense view of all components, in current (removal-dependent) order.
    ///
    /// The guard shares the store's dynamic borrow: calling any mutating
    /// operation while it is alive panics, which is what enforces the
    /// no-mutation-while-iterating rule.
    pub fn components(&self) -> Ref<'_, [C]> {
        Ref::map(self.inner.borrow(), |inner| inner.components.as_slice())
    }

    /// Dense view of the owning entities, index-aligned with
    /// [`components`](Self::components).
    pub fn entities(&self) -> Ref<'_, [Entity]> {
        Ref::map(self.inner.borrow(), |inner| inner.entities.as_slice())
    }

    /// Subscribes to added-events; each event carries the new slot index.
    ///
    /// Events are enqueued before the triggering `add` returns, exactly once
    /// per call, to every subscriber.
    pub fn on_added(&self) -> flume::Receiver<usize> {
        self.inner.borrow_mut().added.subscribe()
    }

    /// Subscribes to removed-events; each event carries the removed entity
    /// and its final component value, observed after removal completed.
    pub fn on_removed(&self) -> flume::Receiver<(Entity, C)> {
        self.inner.borrow_mut().removed.subscribe()
    }
}
