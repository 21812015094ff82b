mod common;

use common::{init_logging, Biome, Health, Mass, Position, Velocity};
use stratum::{
    ChunkGroupHash, ComponentTypeInfo, EcsError, Entity, EntityManager, Read,
};

const DEFAULT: ChunkGroupHash = ChunkGroupHash(0);

fn position_health(manager: &mut EntityManager, chunk_capacity: usize) -> stratum::ArchetypeId {
    manager.create_entity_type(
        chunk_capacity,
        &[
            ComponentTypeInfo::of::<Position>(),
            ComponentTypeInfo::of::<Health>(),
        ],
        DEFAULT,
    )
}

#[test]
fn create_read_write_roundtrip() {
    init_logging();
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);

    let entity = manager
        .create_entity(archetype, (Position { x: 1, y: 2 }, Health(3)))
        .unwrap();
    assert!(manager.exists(entity));
    assert_eq!(
        manager.get_component_data::<Position>(entity),
        Ok(Position { x: 1, y: 2 })
    );
    assert_eq!(manager.get_component_data::<Health>(entity), Ok(Health(3)));

    manager.set_component_data(entity, Health(9)).unwrap();
    assert_eq!(manager.get_component_data::<Health>(entity), Ok(Health(9)));
}

#[test]
fn unlisted_values_start_zeroed() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);

    let entity = manager.create_entity(archetype, (Health(5),)).unwrap();
    assert_eq!(
        manager.get_component_data::<Position>(entity),
        Ok(Position { x: 0, y: 0 })
    );

    let bare = manager.create_entity(archetype, ()).unwrap();
    assert_eq!(manager.get_component_data::<Health>(bare), Ok(Health(0)));
}

#[test]
fn component_outside_archetype_is_a_typed_error() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);

    let err = manager
        .create_entity(archetype, (Mass(7),))
        .expect_err("Mass is not in the archetype");
    assert!(matches!(err, EcsError::MissingComponent { .. }));
    // A rejected creation leaves no row and no live entity behind.
    assert_eq!(manager.number_of_entities(), 0);
    assert_eq!(manager.get_component_groups()[archetype as usize].size(), 0);

    let entity = manager.create_entity(archetype, ()).unwrap();
    assert!(matches!(
        manager.get_component_data::<Velocity>(entity),
        Err(EcsError::MissingComponent { .. })
    ));
    assert!(matches!(
        manager.set_component_data(entity, Mass(1)),
        Err(EcsError::MissingComponent { .. })
    ));
}

#[test]
fn stale_entities_are_typed_errors() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);
    let entity = manager.create_entity(archetype, ()).unwrap();

    manager.destroy_entity(entity).unwrap();
    assert!(!manager.exists(entity));
    assert_eq!(
        manager.destroy_entity(entity),
        Err(EcsError::StaleEntity(entity))
    );
    assert_eq!(
        manager.get_component_data::<Health>(entity),
        Err(EcsError::StaleEntity(entity))
    );
    assert!(!manager.has_component::<Health>(entity));
    // Never-created ids are equally stale.
    assert!(!manager.exists(Entity(999)));
}

#[test]
fn destroying_redirects_the_swapped_entity() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);

    let entities: Vec<Entity> = (0..5)
        .map(|id| {
            manager
                .create_entity(archetype, (Health(id as i32 * 10),))
                .unwrap()
        })
        .collect();

    // Removing index 1 back-fills it with the last entity's row.
    manager.destroy_entity(entities[1]).unwrap();
    assert!(!manager.exists(entities[1]));
    for (id, &entity) in entities.iter().enumerate() {
        if id == 1 {
            continue;
        }
        assert_eq!(
            manager.get_component_data::<Health>(entity),
            Ok(Health(id as i32 * 10)),
            "entity {id} must keep its value after the swap"
        );
    }
    assert_eq!(manager.number_of_entities(), 4);
}

#[test]
fn destroyed_ids_are_recycled_as_a_set() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);

    let first: Vec<Entity> = (0..3)
        .map(|_| manager.create_entity(archetype, ()).unwrap())
        .collect();
    for &entity in &first {
        manager.destroy_entity(entity).unwrap();
    }
    let second: Vec<Entity> = (0..3)
        .map(|_| manager.create_entity(archetype, ()).unwrap())
        .collect();

    let mut before: Vec<u32> = first.iter().map(|entity| entity.0).collect();
    let mut after: Vec<u32> = second.iter().map(|entity| entity.0).collect();
    before.sort_unstable();
    after.sort_unstable();
    assert_eq!(before, after);
}

#[test]
fn identical_component_sets_share_an_archetype() {
    let mut manager = EntityManager::new();
    let a = manager.create_entity_type(
        4,
        &[
            ComponentTypeInfo::of::<Position>(),
            ComponentTypeInfo::of::<Health>(),
        ],
        DEFAULT,
    );
    // Same set, different order: same archetype.
    let b = manager.create_entity_type(
        8,
        &[
            ComponentTypeInfo::of::<Health>(),
            ComponentTypeInfo::of::<Position>(),
        ],
        ChunkGroupHash(5),
    );
    assert_eq!(a, b);
    assert_eq!(manager.get_component_groups().len(), 1);

    let c = manager.create_entity_type(4, &[ComponentTypeInfo::of::<Position>()], DEFAULT);
    assert_ne!(a, c);
}

#[test]
fn archetype_scan_visits_matching_entities_once() {
    let mut manager = EntityManager::new();
    let with_both = position_health(&mut manager, 2);
    let position_only =
        manager.create_entity_type(2, &[ComponentTypeInfo::of::<Position>()], DEFAULT);
    let health_only = manager.create_entity_type(2, &[ComponentTypeInfo::of::<Health>()], DEFAULT);

    for x in 0..4 {
        manager
            .create_entity(with_both, (Position { x, y: 0 },))
            .unwrap();
    }
    for x in 0..2 {
        manager
            .create_entity(position_only, (Position { x, y: 1 },))
            .unwrap();
    }
    for _ in 0..3 {
        manager.create_entity(health_only, (Health(1),)).unwrap();
    }

    let mut visited = 0;
    for (mask, group) in manager
        .get_component_types_groups()
        .iter()
        .zip(manager.get_component_groups())
    {
        if !mask.contains::<Position>() {
            continue;
        }
        visited += group.storage().get_view::<Read<Position>>().iter().count();
    }
    assert_eq!(visited, 6);
}

#[test]
fn bulk_creation() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);

    let entities = manager
        .create_entities(archetype, 5, (Health(3),))
        .unwrap();
    assert_eq!(entities.len(), 5);
    assert_eq!(manager.number_of_entities(), 5);

    let mut ids: Vec<u32> = entities.iter().map(|entity| entity.0).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5, "bulk-created ids must be distinct");
    for entity in entities {
        assert_eq!(manager.get_component_data::<Health>(entity), Ok(Health(3)));
    }
}

#[test]
fn shared_components_are_per_partition() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);
    let desert = ChunkGroupHash(10);
    let tundra = ChunkGroupHash(20);
    manager.set_shared_component(archetype, desert, Biome("desert".into()));
    manager.set_shared_component(archetype, tundra, Biome("tundra".into()));

    let a = manager
        .create_entity_in(archetype, desert, (Health(1),))
        .unwrap();
    let b = manager
        .create_entity_in(archetype, tundra, (Health(2),))
        .unwrap();

    assert_eq!(
        manager.get_shared_component::<Biome>(a),
        Ok(&Biome("desert".into()))
    );
    assert_eq!(
        manager.get_shared_component::<Biome>(b),
        Ok(&Biome("tundra".into()))
    );
    assert!(matches!(
        manager.get_shared_component::<String>(a),
        Err(EcsError::MissingComponent { .. })
    ));
}

#[test]
fn changing_partition_keeps_values_and_redirects_neighbours() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);
    let desert = ChunkGroupHash(10);
    let tundra = ChunkGroupHash(20);
    manager.set_shared_component(archetype, desert, Biome("desert".into()));
    manager.set_shared_component(archetype, tundra, Biome("tundra".into()));

    let entities: Vec<Entity> = (0..3)
        .map(|id| {
            manager
                .create_entity_in(archetype, desert, (Health(id as i32 * 10),))
                .unwrap()
        })
        .collect();

    // Moving the first entity swap-fills its old slot with the last one.
    manager
        .change_entity_chunk_group(entities[0], tundra)
        .unwrap();

    assert_eq!(
        manager.get_shared_component::<Biome>(entities[0]),
        Ok(&Biome("tundra".into()))
    );
    for (id, &entity) in entities.iter().enumerate() {
        assert_eq!(
            manager.get_component_data::<Health>(entity),
            Ok(Health(id as i32 * 10))
        );
    }

    // Moving to the current partition is a no-op.
    manager
        .change_entity_chunk_group(entities[1], desert)
        .unwrap();
    assert_eq!(
        manager.get_component_data::<Health>(entities[1]),
        Ok(Health(10))
    );
}

#[test]
fn has_component_follows_the_archetype_mask() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);
    let entity = manager.create_entity(archetype, ()).unwrap();

    assert!(manager.has_component::<Position>(entity));
    assert!(manager.has_component::<Health>(entity));
    assert!(!manager.has_component::<Mass>(entity));
}

#[test]
fn archetype_chunk_accounting() {
    let mut manager = EntityManager::new();
    let archetype = position_health(&mut manager, 2);
    for _ in 0..5 {
        manager.create_entity(archetype, ()).unwrap();
    }

    let group = &manager.get_component_groups()[archetype as usize];
    assert_eq!(group.size(), 5);
    assert_eq!(group.num_chunks(), 3);
    assert_eq!(group.components::<Position>(0).len(), 2);
    assert_eq!(group.components::<Position>(2).len(), 1);
    assert!(group.components::<Position>(3).is_empty());
}
