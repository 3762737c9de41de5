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

//! Entity identity, recycling, and cascading teardown.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use strata_core::Entity;

/// Numeric identity assigned to each store by its [`World`](crate::ecs::World).
///
/// Used only as the key under which a store registers its per-entity teardown
/// callback with the [`EntityManager`].
pub type StoreId = u16;

/// A per-entity, per-store cleanup hook invoked when the owning entity is
/// fully removed.
pub(crate) type TeardownFn = Box<dyn Fn()>;

/// Issues and recycles entity handles and drives cascading removal.
///
/// Every slot index is paired with a generation counter that advances exactly
/// once per removal of that slot's entity, so a stale handle never resolves
/// as alive. Stores register one teardown callback per entity they hold data
/// for; [`remove_entity`](Self::remove_entity) runs all of them before the
/// slot is recycled, which lets each store compact its own dense arrays
/// without the manager knowing any component types.
///
/// The manager is a cheap handle: cloning shares the same identity tables.
#[derive(Clone, Default)]
pub struct EntityManager {
    inner: Rc<RefCell<ManagerInner>>,
}

#[derive(Default)]
struct ManagerInner {
    /// Current generation for every slot that has ever been allocated.
    generations: Vec<u32>,
    /// Slot indices eligible for reuse. Their generation was already advanced
    /// when they were freed.
    free: Vec<u32>,
    /// Per-entity teardown callbacks, keyed by slot index then store identity.
    teardown: HashMap<u32, HashMap<StoreId, TeardownFn>>,
}

impl EntityManager {
    /// Creates a new, empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new or recycled entity handle.
    ///
    /// If a freed slot is available it is popped and reused at its current
    /// generation; otherwise a fresh slot is appended at generation 0. The
    /// returned handle never compares equal to any currently-alive handle.
    pub fn create(&self) -> Entity {
        let mut inner = self.inner.borrow_mut();
        if let Some(index) = inner.free.pop() {
            Entity {
                index,
                generation: inner.generations[index as usize],
            }
        } else {
            let index = inner.generations.len() as u32;
            inner.generations.push(0);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Returns whether `entity` is still alive.
    ///
    /// # Panics
    ///
    /// Panics if `entity.index` was never allocated by this manager. Handles
    /// must only come from [`create`](Self::create).
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.inner.borrow().generations[entity.index as usize] == entity.generation
    }

    /// Fully removes an entity.
    ///
    /// Runs every store's teardown callback registered for `entity` (order
    /// across stores is unspecified), then advances the slot's generation
    /// (wrapping at `u32::MAX`) and returns the slot to the free pool.
    ///
    /// Removing an already-dead handle is a silent no-op.
    pub fn remove_entity(&self, entity: Entity) {
        // The callback map is taken out before any callback runs, so a
        // callback's own `set_teardown(.., None)` finds the manager
        // unborrowed.
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.generations[entity.index as usize] != entity.generation {
                log::trace!("remove_entity on dead handle {entity:?}; ignoring");
                return;
            }
            inner.teardown.remove(&entity.index)
        };

        if let Some(callbacks) = callbacks {
            for callback in callbacks.values() {
                callback();
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.generations[entity.index as usize] = entity.generation.wrapping_add(1);
        inner.free.push(entity.index);
    }

    /// Registers or clears one store's cleanup hook for `entity`.
    ///
    /// Called by stores when they attach or detach a component; never called
    /// by application code.
    pub(crate) fn set_teardown(
        &self,
        entity: Entity,
        store: StoreId,
        callback: Option<TeardownFn>,
    ) {
        let mut inner = self.inner.borrow_mut();
        match callback {
            Some(callback) => {
                inner
                    .teardown
                    .entry(entity.index)
                    .or_default()
                    .insert(store, callback);
            }
            None => {
                if let Some(hooks) = inner.teardown.get_mut(&entity.index) {
                    hooks.remove(&store);
                    if hooks.is_empty() {
                        inner.teardown.remove(&entity.index);
                    }
                }
            }
        }
    }
}
