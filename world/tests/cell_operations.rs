use gridsly_core::{
    Command, Coord, DoorFacing, Entity, EntityKind, EntityPatch, Event, GridRect, HexColor,
    LayerId, PlacementError, PointId, PointKind,
};
use gridsly_world::{apply, query, World};

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

fn place(layer: LayerId, cell: Coord, kind: PointKind) -> Command {
    Command::PlaceCell {
        layer,
        cell,
        kind,
        entity: None,
    }
}

fn layer_lengths(world: &World) -> Vec<usize> {
    LayerId::ALL
        .into_iter()
        .map(|layer| query::layer(world, layer).len())
        .collect()
}

fn placed_id(events: &[Event]) -> PointId {
    events
        .iter()
        .find_map(|event| match event {
            Event::CellPlaced { point, .. } => Some(*point),
            _ => None,
        })
        .expect("placement event")
}

#[test]
fn placing_twice_keeps_a_single_point() {
    let mut world = World::new();
    let cell = Coord::new(-4, 9);

    let first = run(&mut world, place(LayerId::Barriers, cell, PointKind::Wall));
    let second = run(&mut world, place(LayerId::Barriers, cell, PointKind::Obstacle));

    let barriers = query::layer(&world, LayerId::Barriers);
    assert_eq!(barriers.len(), 1, "existing cell must win over a second place");
    assert_eq!(barriers.points()[0].kind, PointKind::Wall);
    assert!(matches!(first.last(), Some(Event::GridChanged { revision: 1 })));
    assert_eq!(
        second,
        vec![Event::PlacementRejected {
            layer: LayerId::Barriers,
            cell,
            reason: PlacementError::Occupied,
        }],
        "rejected placement must not bump the revision",
    );
    assert_eq!(query::revision(&world), 1);
}

#[test]
fn creatures_receive_default_entities() {
    let mut world = World::new();

    let player = placed_id(&run(
        &mut world,
        place(LayerId::Players, Coord::new(0, 0), PointKind::Player),
    ));
    let npc = placed_id(&run(
        &mut world,
        place(LayerId::Players, Coord::new(1, 0), PointKind::Npc),
    ));

    let player = query::creature(&world, player).expect("player exists");
    let npc = query::creature(&world, npc).expect("npc exists");
    assert_eq!(player.entity, Some(Entity::default_for(EntityKind::Player)));
    assert_eq!(npc.entity.as_ref().map(|entity| entity.symbol), Some('>'));
    assert_eq!(
        npc.entity.as_ref().map(|entity| entity.color.as_str()),
        Some("#805ad5")
    );
}

#[test]
fn entity_override_replaces_defaults() {
    let mut world = World::new();
    let mut custom = Entity::default_for(EntityKind::Player);
    custom.name = "Rogue".to_owned();

    let id = placed_id(&run(
        &mut world,
        Command::PlaceCell {
            layer: LayerId::Players,
            cell: Coord::new(3, 3),
            kind: PointKind::Npc,
            entity: Some(custom.clone()),
        },
    ));

    let point = query::creature(&world, id).expect("creature exists");
    assert_eq!(point.kind, PointKind::Npc);
    assert_eq!(point.entity, Some(custom));
}

#[test]
fn wall_then_erase_leaves_spaces_untouched() {
    let mut world = World::new();
    let cell = Coord::new(5, 5);
    let spaces_before = query::layer(&world, LayerId::Spaces);

    let _ = run(&mut world, place(LayerId::Barriers, cell, PointKind::Wall));
    let erased = run(&mut world, Command::EraseCell { cell });

    assert!(query::layer(&world, LayerId::Barriers).is_empty());
    assert!(
        query::layer(&world, LayerId::Spaces).same_revision(&spaces_before),
        "erasing the wall must not touch the space below it",
    );
    assert!(matches!(
        erased.first(),
        Some(Event::CellErased {
            layer: LayerId::Barriers,
            ..
        })
    ));
}

#[test]
fn erase_removes_from_topmost_layer_only() {
    let mut world = World::new();
    let cell = Coord::new(2, 2);
    let _ = run(&mut world, place(LayerId::Barriers, cell, PointKind::Obstacle));
    let _ = run(&mut world, place(LayerId::Players, cell, PointKind::Npc));
    let before = layer_lengths(&world);

    let _ = run(&mut world, Command::EraseCell { cell });
    let after = layer_lengths(&world);

    assert_eq!(after[LayerId::Players.index()], before[LayerId::Players.index()] - 1);
    assert_eq!(after[LayerId::Barriers.index()], before[LayerId::Barriers.index()]);
    assert_eq!(after[LayerId::Spaces.index()], before[LayerId::Spaces.index()]);
}

#[test]
fn erasing_an_empty_cell_is_a_no_op() {
    let mut world = World::new();
    let before = layer_lengths(&world);

    let events = run(&mut world, Command::EraseCell { cell: Coord::new(40, 40) });

    assert!(events.is_empty());
    assert_eq!(layer_lengths(&world), before);
    assert_eq!(query::revision(&world), 0);
}

#[test]
fn door_rotation_is_a_four_cycle() {
    let mut world = World::new();
    let cell = Coord::new(7, 1);
    let facing = |world: &World| {
        query::find_cell(world, LayerId::Barriers, cell).and_then(|point| point.facing)
    };

    let _ = run(&mut world, Command::PlaceOrRotateDoor { cell });
    assert_eq!(facing(&world), Some(DoorFacing::Left));

    let mut observed = Vec::new();
    for _ in 0..4 {
        let _ = run(&mut world, Command::PlaceOrRotateDoor { cell });
        observed.push(facing(&world).expect("door present"));
    }

    assert_eq!(
        observed,
        vec![
            DoorFacing::Bottom,
            DoorFacing::Right,
            DoorFacing::Top,
            DoorFacing::Left
        ]
    );
    assert_eq!(query::layer(&world, LayerId::Barriers).len(), 1);
}

#[test]
fn door_does_not_replace_a_wall() {
    let mut world = World::new();
    let cell = Coord::new(1, 1);
    let _ = run(&mut world, place(LayerId::Barriers, cell, PointKind::Wall));

    let events = run(&mut world, Command::PlaceOrRotateDoor { cell });

    assert_eq!(
        events,
        vec![Event::PlacementRejected {
            layer: LayerId::Barriers,
            cell,
            reason: PlacementError::NotADoor,
        }]
    );
    let point = query::find_cell(&world, LayerId::Barriers, cell).expect("wall kept");
    assert_eq!(point.kind, PointKind::Wall);
}

#[test]
fn rectangle_adds_only_missing_spaces() {
    let mut world = World::new();

    let events = run(
        &mut world,
        Command::PlaceRectangle {
            first: Coord::new(14, 14),
            second: Coord::new(17, 15),
        },
    );

    let spaces = query::layer(&world, LayerId::Spaces);
    assert_eq!(spaces.len(), 256 + 6, "only cells beyond x=15 are new");
    assert_eq!(
        events.first(),
        Some(&Event::RectanglePlaced {
            rect: GridRect::from_corners(Coord::new(14, 14), Coord::new(17, 15)),
            added: 6,
        })
    );

    let repeat = run(
        &mut world,
        Command::PlaceRectangle {
            first: Coord::new(17, 15),
            second: Coord::new(14, 14),
        },
    );
    assert_eq!(query::layer(&world, LayerId::Spaces).len(), 256 + 6);
    assert!(
        !repeat
            .iter()
            .any(|event| matches!(event, Event::GridChanged { .. })),
        "re-running a rectangle must not count as a change",
    );
}

#[test]
fn preview_layer_holds_at_most_one_point() {
    let mut world = World::new();
    let first = GridRect::from_corners(Coord::new(0, 0), Coord::new(2, 2));
    let second = GridRect::from_corners(Coord::new(0, 0), Coord::new(3, 1));

    let _ = run(&mut world, Command::SetPreview { rect: Some(first) });
    let _ = run(&mut world, Command::SetPreview { rect: Some(second) });
    let unchanged = run(&mut world, Command::SetPreview { rect: Some(second) });

    let mouse = query::layer(&world, LayerId::Mouse);
    assert_eq!(mouse.len(), 1);
    let preview = &mouse.points()[0];
    assert_eq!(preview.kind, PointKind::MouseSelect);
    assert_eq!((preview.width, preview.height), (4, 2));
    assert!(unchanged.is_empty());

    let _ = run(&mut world, Command::SetPreview { rect: None });
    assert!(query::layer(&world, LayerId::Mouse).is_empty());
}

#[test]
fn creature_moves_only_into_empty_cells() {
    let mut world = World::new();
    let hero = placed_id(&run(
        &mut world,
        place(LayerId::Players, Coord::new(0, 0), PointKind::Player),
    ));
    let _ = run(
        &mut world,
        place(LayerId::Players, Coord::new(2, 0), PointKind::Npc),
    );

    let blocked = run(
        &mut world,
        Command::MoveCreature {
            creature: hero,
            to: Coord::new(2, 0),
        },
    );
    assert_eq!(
        blocked,
        vec![Event::CreatureRejected {
            creature: hero,
            reason: PlacementError::Occupied,
        }]
    );

    let moved = run(
        &mut world,
        Command::MoveCreature {
            creature: hero,
            to: Coord::new(1, 0),
        },
    );
    assert_eq!(
        moved.first(),
        Some(&Event::CreatureMoved {
            creature: hero,
            from: Coord::new(0, 0),
            to: Coord::new(1, 0),
        })
    );
    let point = query::creature(&world, hero).expect("hero still exists");
    assert_eq!(point.cell, Coord::new(1, 0));
    assert_eq!(point.id, hero, "moving keeps the identifier stable");
}

#[test]
fn creature_edits_apply_in_place() {
    let mut world = World::new();
    let id = placed_id(&run(
        &mut world,
        place(LayerId::Players, Coord::new(4, 4), PointKind::Npc),
    ));

    let _ = run(
        &mut world,
        Command::UpdateCreature {
            creature: id,
            patch: EntityPatch {
                name: Some("Goblin".to_owned()),
                color: Some(HexColor::parse("#22aa44").expect("color")),
                ..EntityPatch::default()
            },
        },
    );
    let _ = run(&mut world, Command::ResizeCreature { creature: id, size: 3 });
    let zero = run(&mut world, Command::ResizeCreature { creature: id, size: 0 });

    let point = query::creature(&world, id).expect("creature exists");
    let entity = point.entity.as_ref().expect("entity");
    assert_eq!(entity.name, "Goblin");
    assert_eq!(entity.symbol, '>');
    assert_eq!(entity.color.as_str(), "#22aa44");
    assert_eq!((point.width, point.height), (1, 1), "size is clamped to one");
    assert_eq!(
        zero.first(),
        Some(&Event::CreatureResized { creature: id, size: 1 })
    );
}

#[test]
fn edits_to_unknown_creatures_are_rejected() {
    let mut world = World::new();
    let ghost = PointId::new(9_999);

    let events = run(
        &mut world,
        Command::MoveCreature {
            creature: ghost,
            to: Coord::new(0, 0),
        },
    );

    assert_eq!(
        events,
        vec![Event::CreatureRejected {
            creature: ghost,
            reason: PlacementError::MissingCreature,
        }]
    );
}

#[test]
fn snapshot_round_trips_through_restore() {
    let mut world = World::new();
    let _ = run(&mut world, Command::PlaceOrRotateDoor { cell: Coord::new(3, 0) });
    let _ = run(&mut world, Command::PlaceOrRotateDoor { cell: Coord::new(3, 0) });
    let _ = run(
        &mut world,
        place(LayerId::Players, Coord::new(-1, -1), PointKind::Player),
    );
    let snapshot = query::snapshot(&world);

    let mut restored = World::new();
    let _ = run(
        &mut restored,
        Command::RestoreSnapshot {
            snapshot: snapshot.clone(),
        },
    );

    assert_eq!(query::snapshot(&restored), snapshot);
}

#[test]
fn preview_changes_are_not_grid_changes() {
    let mut world = World::new();
    let before = query::snapshot(&world);
    let revision = query::revision(&world);
    let rect = GridRect::from_corners(Coord::new(1, 1), Coord::new(4, 3));

    let events = run(&mut world, Command::SetPreview { rect: Some(rect) });

    assert_eq!(events, vec![Event::PreviewChanged { rect: Some(rect) }]);
    assert_eq!(query::revision(&world), revision);
    assert_eq!(query::layer(&world, LayerId::Mouse).len(), 1);
    assert_eq!(query::snapshot(&world), before, "preview is never persisted");
    assert!(query::snapshot(&world).tiles(LayerId::Mouse).is_empty());
}
