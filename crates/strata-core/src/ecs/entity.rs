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

use serde::{Deserialize, Serialize};

/// An opaque handle identifying a logical object without owning its data.
///
/// It combines an index with a generation count to solve the "ABA problem".
/// When an entity is removed, its index can be recycled for a new entity,
/// but the generation is advanced. This ensures that old `Entity` handles
/// pointing to a recycled index become stale and cannot accidentally affect
/// the new entity.
///
/// Two handles are equal iff both fields are equal. Handles are only
/// meaningful to the lifecycle manager that issued them; a handle is alive
/// iff the manager's stored generation for `index` equals `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// The index of the entity's slot in the lifecycle manager's tables.
    pub index: u32,
    /// A generation counter that is advanced each time the index is recycled.
    pub generation: u32,
}
