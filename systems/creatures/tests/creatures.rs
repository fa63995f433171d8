use gridsly_core::{
    Command, Coord, EntityKind, EntityPatch, Event, HexColor, LayerId, PointKind,
};
use gridsly_system_creatures::{CreatureEditor, CreatureTool};
use gridsly_world::{apply, query, World};

/// Runs a creature click against the world and feeds the resulting events back.
fn click(world: &mut World, editor: &mut CreatureEditor, tool: CreatureTool, cell: Coord) {
    let mut commands = Vec::new();
    let grid: &World = world;
    editor.click(
        tool,
        cell,
        |cell| query::find_cell(grid, LayerId::Players, cell).map(|point| point.id),
        &mut commands,
    );
    flush(world, editor, commands);
}

fn flush(world: &mut World, editor: &mut CreatureEditor, commands: Vec<Command>) {
    for command in commands {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        editor.handle(&events);
    }
}

fn player_cells(world: &World) -> Vec<Coord> {
    query::layer(world, LayerId::Players)
        .points()
        .iter()
        .map(|point| point.cell)
        .collect()
}

const PLACE_PLAYER: CreatureTool = CreatureTool::Place(EntityKind::Player);

#[test]
fn placing_selects_and_opens_the_panel() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();

    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(0, 0));

    let selected = editor.selected().expect("new creature is selected");
    assert!(editor.is_panel_open());
    let point = query::creature(&world, selected).expect("creature exists");
    assert_eq!(point.kind, PointKind::Player);
    assert_eq!(point.cell, Coord::new(0, 0));
}

#[test]
fn click_while_editing_relocates_the_creature() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();

    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(0, 0));
    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(1, 0));

    assert_eq!(player_cells(&world), vec![Coord::new(1, 0)]);
    let selected = editor.selected().expect("selection kept");
    assert_eq!(
        query::creature(&world, selected).map(|point| point.cell),
        Some(Coord::new(1, 0)),
        "selection must follow the moved creature",
    );
}

#[test]
fn closed_panel_places_another_creature() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();

    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(0, 0));
    let first = editor.selected();
    editor.close_panel();
    click(
        &mut world,
        &mut editor,
        CreatureTool::Place(EntityKind::Npc),
        Coord::new(3, 0),
    );

    assert_eq!(player_cells(&world), vec![Coord::new(0, 0), Coord::new(3, 0)]);
    assert_ne!(editor.selected(), first);
    assert!(editor.is_panel_open());
}

#[test]
fn clicking_an_existing_creature_selects_it() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();
    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(0, 0));
    let first = editor.selected();
    editor.close_panel();
    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(5, 5));

    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(0, 0));

    assert_eq!(editor.selected(), first);
    assert!(editor.is_panel_open());
    assert_eq!(player_cells(&world).len(), 2);
}

#[test]
fn movement_tool_toggles_and_moves_selection() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();
    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(2, 2));
    editor.close_panel();
    let hero = editor.selected().expect("placed");

    click(&mut world, &mut editor, CreatureTool::Movement, Coord::new(2, 2));
    assert_eq!(editor.selected(), None, "clicking the selection deselects it");

    click(&mut world, &mut editor, CreatureTool::Movement, Coord::new(2, 2));
    assert_eq!(editor.selected(), Some(hero));
    assert!(!editor.is_panel_open(), "movement leaves the panel alone");

    click(&mut world, &mut editor, CreatureTool::Movement, Coord::new(6, 1));
    assert_eq!(player_cells(&world), vec![Coord::new(6, 1)]);
}

#[test]
fn movement_without_selection_does_nothing() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();

    click(&mut world, &mut editor, CreatureTool::Movement, Coord::new(1, 1));

    assert!(player_cells(&world).is_empty());
    assert_eq!(editor.selected(), None);
}

#[test]
fn duplicate_creates_an_npc_copy_to_the_right() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();
    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(4, 4));
    let original = editor.selected().expect("placed");

    let mut commands = Vec::new();
    editor.duplicate(|id| query::creature(&world, id), &mut commands);
    flush(&mut world, &mut editor, commands);

    let copy = query::find_cell(&world, LayerId::Players, Coord::new(5, 4)).expect("copy placed");
    let source = query::creature(&world, original).expect("source kept");
    assert_eq!(copy.kind, PointKind::Npc);
    assert_eq!(copy.entity, source.entity, "entity is copied verbatim");
    assert_ne!(copy.id, source.id);
    assert_eq!(editor.selected(), Some(original), "duplicate keeps the selection");

    let mut again = Vec::new();
    editor.duplicate(|id| query::creature(&world, id), &mut again);
    flush(&mut world, &mut editor, again);
    assert_eq!(player_cells(&world).len(), 2, "occupied target is skipped");
}

#[test]
fn edits_target_the_selected_creature() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();
    click(
        &mut world,
        &mut editor,
        CreatureTool::Place(EntityKind::Npc),
        Coord::new(1, 1),
    );
    let selected = editor.selected().expect("placed");

    let mut commands = Vec::new();
    editor.edit(
        EntityPatch {
            symbol: Some('g'),
            color: Some(HexColor::parse("#ff0000").expect("color")),
            ..EntityPatch::default()
        },
        &mut commands,
    );
    editor.edit(EntityPatch::default(), &mut commands);
    editor.resize(2, &mut commands);
    assert_eq!(commands.len(), 2, "empty patches are dropped");
    flush(&mut world, &mut editor, commands);

    let point = query::creature(&world, selected).expect("creature exists");
    let entity = point.entity.as_ref().expect("entity");
    assert_eq!(entity.symbol, 'g');
    assert_eq!(entity.color.as_str(), "#ff0000");
    assert_eq!((point.width, point.height), (2, 2));
}

#[test]
fn erasing_the_selection_clears_it() {
    let mut world = World::new();
    let mut editor = CreatureEditor::new();
    click(&mut world, &mut editor, PLACE_PLAYER, Coord::new(0, 3));

    let mut events = Vec::new();
    apply(&mut world, Command::EraseCell { cell: Coord::new(0, 3) }, &mut events);
    editor.handle(&events);

    assert_eq!(editor.selected(), None);
    assert!(!editor.is_panel_open());
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CellErased { layer: LayerId::Players, .. })));
}
