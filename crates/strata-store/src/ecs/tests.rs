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

use strata_core::Entity;

use super::store::Component;
use super::world::World;

// --- DUMMY COMPONENTS FOR TESTING ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position(i32);
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Health(i32);
impl Component for Health {}

// --- ENTITY LIFECYCLE ---

#[test]
fn test_create_and_recycle_handles() {
    let world = World::new();

    let h1 = world.create_entity();
    let h2 = world.create_entity();
    assert_eq!((h1.index, h1.generation), (0, 0));
    assert_eq!((h2.index, h2.generation), (1, 0));

    world.remove_entity(h1);
    assert!(!world.entities().is_alive(h1));

    let h3 = world.create_entity();
    assert_eq!(
        (h3.index, h3.generation),
        (0, 1),
        "a freed slot should be recycled at the next generation"
    );
    assert_ne!(h1, h3);
    assert!(!world.entities().is_alive(h1));
    assert!(world.entities().is_alive(h2));
    assert!(world.entities().is_alive(h3));
}

#[test]
fn test_no_two_live_handles_compare_equal() {
    let world = World::new();
    let mut live = Vec::new();
    let mut dead = Vec::new();

    // Churn: allocate in bursts, remove every other live handle.
    for _ in 0..10 {
        for _ in 0..5 {
            live.push(world.create_entity());
        }
        let mut position = 0;
        live.retain(|&entity| {
            position += 1;
            if position % 2 == 0 {
                world.remove_entity(entity);
                dead.push(entity);
                false
            } else {
                true
            }
        });
    }

    for entity in &dead {
        assert!(!world.entities().is_alive(*entity));
    }
    for entity in &live {
        assert!(world.entities().is_alive(*entity));
    }
    for (i, a) in live.iter().enumerate() {
        for b in &live[i + 1..] {
            assert_ne!(a, b, "no two concurrently-alive handles may be equal");
        }
    }
}

#[test]
fn test_remove_entity_twice_is_a_no_op() {
    let world = World::new();
    let store = world.create_store::<Position>();

    let entity = world.create_entity();
    store.add(Position(1), entity);

    world.remove_entity(entity);
    world.remove_entity(entity);
    assert_eq!(store.len(), 0);

    let recycled = world.create_entity();
    assert_eq!(
        recycled.generation, 1,
        "the generation must advance exactly once per removal"
    );
}

#[test]
#[should_panic]
fn test_is_alive_on_foreign_handle_panics() {
    let world = World::new();
    let bogus = Entity {
        index: 42,
        generation: 0,
    };
    world.entities().is_alive(bogus);
}

// --- DENSE STORE ---

#[test]
fn test_swap_removal_moves_last_into_hole() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let removed_events = store.on_removed();

    let a = world.create_entity();
    let b = world.create_entity();
    let c = world.create_entity();
    let d = world.create_entity();
    store.add(Position(0), a);
    store.add(Position(1), b);
    store.add(Position(2), c);
    store.add(Position(3), d);

    store.remove_at(1);

    assert_eq!(store.len(), 3);
    assert_eq!(&*store.entities(), &[a, d, c]);
    assert_eq!(
        &*store.components(),
        &[Position(0), Position(3), Position(2)]
    );
    assert_eq!(
        store.index_of(d),
        Some(1),
        "the last element must have been swapped into the hole"
    );
    assert_eq!(store.index_of(b), None);
    assert_eq!(
        removed_events.drain().collect::<Vec<_>>(),
        vec![(b, Position(1))]
    );
}

#[test]
fn test_dense_pack_invariant_after_churn() {
    let world = World::new();
    let store = world.create_store::<Position>();

    let mut handles = Vec::new();
    for i in 0..16 {
        let entity = world.create_entity();
        store.add(Position(i), entity);
        handles.push(entity);
    }

    // Mix direct slot removal with full entity removal.
    store.remove_at(3);
    world.remove_entity(handles[7]);
    store.remove_at(0);
    world.remove_entity(handles[12]);

    assert_eq!(store.len(), 12);
    let entities: Vec<Entity> = store.entities().to_vec();
    for (slot, entity) in entities.iter().enumerate() {
        assert_eq!(
            store.index_of(*entity),
            Some(slot),
            "the handle map must match the true array position"
        );
        assert_eq!(
            store.shared_slot_at(slot).get(),
            slot,
            "the indirection box must match the true array position"
        );
    }
}

#[test]
fn test_add_twice_appends_a_duplicate_slot() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let entity = world.create_entity();

    let (first, _) = store.add(Position(1), entity);
    let (second, _) = store.add(Position(2), entity);

    assert_eq!((first, second), (0, 1));
    assert_eq!(store.len(), 2);
    assert_eq!(
        store.index_of(entity),
        Some(1),
        "the map tracks the most recently added slot"
    );
}

#[test]
fn test_set_is_an_upsert() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let added_events = store.on_added();
    let entity = world.create_entity();

    store.set(Position(1), entity);
    assert_eq!(store.len(), 1);
    assert_eq!(added_events.drain().collect::<Vec<_>>(), vec![0]);

    store.set(Position(2), entity);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(0), Position(2));
    assert_eq!(
        added_events.drain().count(),
        0,
        "overwriting in place must not publish an added-event"
    );

    world.remove_entity(entity);
    store.set(Position(3), entity);
    assert_eq!(store.len(), 0, "upsert on a dead entity is a no-op");
}

#[test]
fn test_remove_components_matching_predicate() {
    let world = World::new();
    let store = world.create_store::<Position>();
    for i in 0..10 {
        store.add(Position(i), world.create_entity());
    }

    // Interleaved matches stress the non-advancing cursor: the swap keeps
    // moving unvisited elements into the current slot.
    store.remove_components(|_, component| component.0 % 2 == 0);
    assert_eq!(store.len(), 5);
    assert!(store.components().iter().all(|c| c.0 % 2 != 0));

    store.remove_components(|_, _| false);
    assert_eq!(store.len(), 5, "a matching-nothing pass removes nothing");

    store.remove_components(|_, _| true);
    assert_eq!(store.len(), 0);
}

#[test]
fn test_remove_entities_matching_predicate() {
    let world = World::new();
    let positions = world.create_store::<Position>();
    let healths = world.create_store::<Health>();

    let mut handles = Vec::new();
    for i in 0..6 {
        let entity = world.create_entity();
        positions.add(Position(i), entity);
        healths.add(Health(100 + i), entity);
        handles.push(entity);
    }

    positions.remove_entities(|_, component| component.0 < 3);

    assert_eq!(positions.len(), 3);
    assert_eq!(healths.len(), 3, "removal must cascade into the other store");
    for (i, entity) in handles.iter().enumerate() {
        assert_eq!(world.entities().is_alive(*entity), i >= 3);
    }
}

#[test]
#[should_panic]
fn test_mutating_while_iterating_panics() {
    let world = World::new();
    let store = world.create_store::<Position>();
    store.add(Position(1), world.create_entity());

    let guard = store.components();
    store.remove_at(0);
    drop(guard);
}

// --- EVENTS ---

#[test]
fn test_added_events_reach_every_subscriber_exactly_once() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let first = store.on_added();
    let second = store.on_added();

    store.add(Position(1), world.create_entity());
    store.add(Position(2), world.create_entity());

    assert_eq!(first.drain().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(second.drain().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_cascading_teardown_across_stores() {
    let world = World::new();
    let positions = world.create_store::<Position>();
    let healths = world.create_store::<Health>();
    let removed_positions = positions.on_removed();
    let removed_healths = healths.on_removed();

    let entity = world.create_entity();
    let other = world.create_entity();
    positions.add(Position(1), entity);
    healths.add(Health(10), entity);
    positions.add(Position(2), other);

    world.remove_entity(entity);

    assert_eq!(positions.index_of(entity), None);
    assert_eq!(healths.index_of(entity), None);
    assert_eq!(positions.index_of(other), Some(0));
    assert_eq!(
        removed_positions.drain().collect::<Vec<_>>(),
        vec![(entity, Position(1))],
        "exactly one removed-event per store"
    );
    assert_eq!(
        removed_healths.drain().collect::<Vec<_>>(),
        vec![(entity, Health(10))]
    );
}

#[test]
fn test_stores_of_same_type_are_independent() {
    let world = World::new();
    let first = world.create_store::<Position>();
    let second = world.create_store::<Position>();

    let entity = world.create_entity();
    first.add(Position(1), entity);
    second.add(Position(2), entity);

    world.remove_entity(entity);

    // Distinct store ids key distinct teardown registrations; a collision
    // would leave one store with a leaked slot.
    assert_eq!(first.len(), 0);
    assert_eq!(second.len(), 0);
}

// --- REFERENCES ---

#[test]
fn test_stable_refs_survive_compaction() {
    let world = World::new();
    let store = world.create_store::<Position>();

    let mut entries = Vec::new();
    for i in 0..8 {
        let entity = world.create_entity();
        let (slot, _) = store.add(Position(i), entity);
        entries.push((entity, store.stable_ref_at(slot), Position(i)));
    }

    // Remove a few entities out from under the outstanding references; each
    // removal compacts the dense arrays and moves a survivor.
    world.remove_entity(entries[0].0);
    world.remove_entity(entries[2].0);
    world.remove_entity(entries[3].0);

    assert_eq!(store.len(), 5);
    for (entity, reference, expected) in &entries {
        if world.entities().is_alive(*entity) {
            assert_eq!(
                reference.get(),
                Some(*expected),
                "a surviving reference must resolve to its own component"
            );
        } else {
            assert_eq!(reference.get(), None);
        }
    }
}

#[test]
fn test_accessor_follows_component_across_moves() {
    let world = World::new();
    let store = world.create_store::<Position>();
    for i in 0..3 {
        store.add(Position(i), world.create_entity());
    }
    let accessor = store.accessor_at(2);

    // Removing slot 0 swaps the tracked component down into the hole.
    store.remove_at(0);

    assert_eq!(accessor.get(), Some(Position(2)));
    accessor.set(Position(9));
    assert_eq!(store.get(0), Position(9));
}

#[test]
fn test_stale_writes_are_dropped() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let entity = world.create_entity();
    let keeper = world.create_entity();
    let (slot, _) = store.add(Position(1), entity);
    store.add(Position(9), keeper);

    let accessor = store.accessor_at(slot);
    let direct = store.direct_ref_at(slot);
    let stable = store.stable_ref_at(slot);

    world.remove_entity(entity);

    accessor.set(Position(100));
    direct.set(Position(100));
    stable.set(Position(100));

    assert_eq!(accessor.get(), None);
    assert_eq!(stable.get(), None);
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get(0),
        Position(9),
        "stale writes must leave the store unchanged"
    );
}

#[test]
fn test_stable_ref_remove_detaches_component() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let entity = world.create_entity();
    let (slot, _) = store.add(Position(1), entity);

    let reference = store.stable_ref_at(slot);
    reference.remove();

    assert_eq!(store.index_of(entity), None);
    assert!(
        world.entities().is_alive(entity),
        "detaching a component must not remove the entity"
    );
}

#[test]
fn test_reference_conversions() {
    let world = World::new();
    let store = world.create_store::<Position>();
    for i in 0..3 {
        store.add(Position(i), world.create_entity());
    }

    // Stable reference to the component at the tail, taken via its direct
    // counterpart.
    let stable = store.direct_ref_at(2).stable();

    store.remove_at(0);

    assert_eq!(stable.get(), Some(Position(2)));
    let direct = stable.direct().expect("the entity is still alive");
    assert_eq!(direct.slot(), 0, "the snapshot must capture the moved slot");
    assert_eq!(direct.get(), Position(2));
}

#[test]
fn test_refs_do_not_keep_a_store_alive() {
    let world = World::new();
    let store = world.create_store::<Position>();
    let entity = world.create_entity();
    let (slot, _) = store.add(Position(1), entity);
    let stable = store.stable_ref_at(slot);

    drop(store);

    assert_eq!(stable.get(), None, "a reference never keeps its store alive");
    stable.set(Position(9));
    stable.remove();
}
