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

//! Implements the dense entity/component storage layer.
//!
//! The layer dissociates an entity's identity from the physical storage of
//! its component data. Identity lives in the [`EntityManager`], which issues
//! `(index, generation)` handles and recycles slot indices safely. Data lives
//! in one [`Store`] per component type, as index-aligned dense arrays with
//! swap-to-end removal, so iteration never crosses a hole and removal is
//! O(1) at the cost of reordering.
//!
//! External holders survive compaction through a shared indirection box
//! ([`SharedSlot`]): the store rewrites the box whenever a component moves,
//! and [`StableRef`]/[`Accessor`] re-read it on every access after
//! re-checking entity liveness.
//!
//! The whole layer is single-threaded by design: `Rc`/`RefCell`/`Cell`
//! throughout, no locks, and every operation completes before it returns.
//! The primary entry point is the [`World`] struct.

mod entity_manager;
mod refs;
mod store;
mod world;

pub use strata_core::Entity;

pub use entity_manager::{EntityManager, StoreId};
pub use refs::{Accessor, DirectRef, StableRef};
pub use store::{Component, SharedSlot, Store};
pub use world::World;

#[cfg(test)]
mod tests;
