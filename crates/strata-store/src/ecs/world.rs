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

use std::cell::Cell;

use strata_core::Entity;

use crate::ecs::entity_manager::{EntityManager, StoreId};
use crate::ecs::store::{Component, Store};

/// The top-level registry scoping entity and store identity to one instance.
///
/// A `World` constructs exactly one [`EntityManager`] and hands out one
/// [`Store`] per component type, assigning each store a unique [`StoreId`]
/// used as the key in the manager's teardown-callback map. All identity
/// counters live here rather than in ambient globals, so multiple
/// independent worlds can coexist and be torn down cleanly.
#[derive(Default)]
pub struct World {
    manager: EntityManager,
    next_store_id: Cell<StoreId>,
}

impl World {
    /// Creates a new, empty world with its own lifecycle manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The lifecycle manager owned by this world.
    pub fn entities(&self) -> &EntityManager {
        &self.manager
    }

    /// Creates a fresh entity handle.
    pub fn create_entity(&self) -> Entity {
        self.manager.create()
    }

    /// Fully removes an entity, cascading into every store holding data for
    /// it. Removing an already-dead handle is a silent no-op.
    pub fn remove_entity(&self, entity: Entity) {
        self.manager.remove_entity(entity);
    }

    /// Constructs a store for component type `C` with a unique store id.
    ///
    /// # Panics
    ///
    /// Panics when the store id space (`u16`) is exhausted.
    pub fn create_store<C: Component>(&self) -> Store<C> {
        let id = self.next_store_id.get();
        self.next_store_id
            .set(id.checked_add(1).expect("store id space exhausted"));
        log::debug!("Created store {id} for {}.", std::any::type_name::<C>());
        Store::new(id, self.manager.clone())
    }
}
