#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for the Gridsly map editor.

mod layer;

use std::collections::HashSet;

use gridsly_core::{
    Command, Coord, DoorFacing, Entity, EntityPatch, Event, GridRect, GridSnapshot, LayerId,
    PlacementError, Point, PointId, PointKind, Tile,
};

pub use layer::Layer;

/// Represents the authoritative layered grid.
#[derive(Debug)]
pub struct World {
    layers: [Layer; 4],
    revision: u64,
    next_point_id: u32,
}

impl World {
    /// Creates a world holding the default 16×16 grid of spaces.
    #[must_use]
    pub fn new() -> Self {
        Self::from_snapshot(&GridSnapshot::default())
    }

    /// Creates a world populated from a persisted snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Self {
        let mut world = Self {
            layers: Default::default(),
            revision: 0,
            next_point_id: 0,
        };
        world.load(snapshot);
        world
    }

    fn load(&mut self, snapshot: &GridSnapshot) {
        for id in LayerId::ALL {
            let mut seen = HashSet::new();
            let mut points = Vec::new();
            if id != LayerId::Mouse {
                for tile in snapshot.tiles(id) {
                    if seen.insert(tile.cell) {
                        points.push(self.point_from_tile(tile));
                    }
                }
            }
            self.layers[id.index()] = Layer::from_points(points);
        }
    }

    fn allocate_id(&mut self) -> PointId {
        let id = PointId::new(self.next_point_id);
        self.next_point_id = self.next_point_id.wrapping_add(1);
        id
    }

    fn point_from_tile(&mut self, tile: &Tile) -> Point {
        Point {
            id: self.allocate_id(),
            cell: tile.cell,
            width: tile.width.max(1),
            height: tile.height.max(1),
            kind: tile.kind,
            facing: tile.facing,
            entity: tile.entity.clone(),
        }
    }

    fn unit_point(&mut self, cell: Coord, kind: PointKind) -> Point {
        let id = self.allocate_id();
        Point {
            id,
            cell,
            width: 1,
            height: 1,
            kind,
            facing: None,
            entity: None,
        }
    }

    fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.index()]
    }

    fn replace_layer(&mut self, id: LayerId, layer: Layer) {
        self.layers[id.index()] = layer;
    }

    fn mark_changed(&mut self, out_events: &mut Vec<Event>) {
        self.revision = self.revision.saturating_add(1);
        out_events.push(Event::GridChanged {
            revision: self.revision,
        });
    }

    fn place_cell(
        &mut self,
        layer: LayerId,
        cell: Coord,
        kind: PointKind,
        entity: Option<Entity>,
        out_events: &mut Vec<Event>,
    ) {
        if self.layer(layer).find(cell).is_some() {
            out_events.push(Event::PlacementRejected {
                layer,
                cell,
                reason: PlacementError::Occupied,
            });
            return;
        }

        let mut point = self.unit_point(cell, kind);
        point.entity = kind
            .creature()
            .map(|creature| entity.unwrap_or_else(|| Entity::default_for(creature)));
        if kind == PointKind::Door {
            point.facing = Some(DoorFacing::default());
        }
        let id = point.id;
        let updated = self.layer(layer).with_appended([point]);
        self.replace_layer(layer, updated);

        out_events.push(Event::CellPlaced {
            layer,
            point: id,
            cell,
            kind,
        });
        self.mark_changed(out_events);
    }

    fn place_or_rotate_door(&mut self, cell: Coord, out_events: &mut Vec<Event>) {
        let barriers = self.layer(LayerId::Barriers);
        let Some(index) = barriers.position(cell) else {
            self.place_cell(LayerId::Barriers, cell, PointKind::Door, None, out_events);
            return;
        };

        let existing = &barriers.points()[index];
        if existing.kind != PointKind::Door {
            out_events.push(Event::PlacementRejected {
                layer: LayerId::Barriers,
                cell,
                reason: PlacementError::NotADoor,
            });
            return;
        }

        let facing = existing.facing.unwrap_or_default().next();
        let mut rotated = existing.clone();
        rotated.facing = Some(facing);
        let point = rotated.id;
        let updated = barriers.with_replaced(index, rotated);
        self.replace_layer(LayerId::Barriers, updated);

        out_events.push(Event::DoorRotated { point, cell, facing });
        self.mark_changed(out_events);
    }

    fn place_rectangle(&mut self, first: Coord, second: Coord, out_events: &mut Vec<Event>) {
        let rect = GridRect::from_corners(first, second);
        let occupied: HashSet<Coord> = self
            .layer(LayerId::Spaces)
            .points()
            .iter()
            .map(|point| point.cell)
            .collect();
        let missing: Vec<Coord> = rect.cells().filter(|cell| !occupied.contains(cell)).collect();
        let added = u32::try_from(missing.len()).unwrap_or(u32::MAX);

        let points: Vec<Point> = missing
            .into_iter()
            .map(|cell| self.unit_point(cell, PointKind::Space))
            .collect();
        if !points.is_empty() {
            let updated = self.layer(LayerId::Spaces).with_appended(points);
            self.replace_layer(LayerId::Spaces, updated);
        }

        out_events.push(Event::RectanglePlaced { rect, added });
        if added > 0 {
            self.mark_changed(out_events);
        }
    }

    fn erase_cell(&mut self, cell: Coord, out_events: &mut Vec<Event>) {
        for layer in LayerId::ALL.into_iter().rev() {
            let current = self.layer(layer);
            if let Some(index) = current.position(cell) {
                let point = current.points()[index].id;
                let updated = current.without(index);
                self.replace_layer(layer, updated);
                out_events.push(Event::CellErased { layer, point, cell });
                self.mark_changed(out_events);
                return;
            }
        }
    }

    fn set_preview(&mut self, rect: Option<GridRect>, out_events: &mut Vec<Event>) {
        let current = self
            .layer(LayerId::Mouse)
            .points()
            .first()
            .map(|point| GridRect::from_corners(point.cell, far_corner(point)));
        if current == rect {
            return;
        }

        let points = match rect {
            Some(rect) => {
                let mut preview = self.unit_point(rect.origin(), PointKind::MouseSelect);
                preview.width = rect.width();
                preview.height = rect.height();
                vec![preview]
            }
            None => Vec::new(),
        };
        self.replace_layer(LayerId::Mouse, Layer::from_points(points));

        // The preview is transient and does not advance the revision.
        out_events.push(Event::PreviewChanged { rect });
    }

    fn creature_index(&self, creature: PointId, out_events: &mut Vec<Event>) -> Option<usize> {
        let index = self.layer(LayerId::Players).position_of(creature);
        if index.is_none() {
            out_events.push(Event::CreatureRejected {
                creature,
                reason: PlacementError::MissingCreature,
            });
        }
        index
    }

    fn move_creature(&mut self, creature: PointId, to: Coord, out_events: &mut Vec<Event>) {
        let Some(index) = self.creature_index(creature, out_events) else {
            return;
        };
        let players = self.layer(LayerId::Players);
        let from = players.points()[index].cell;
        if from == to {
            return;
        }
        if players.find(to).is_some() {
            out_events.push(Event::CreatureRejected {
                creature,
                reason: PlacementError::Occupied,
            });
            return;
        }

        let mut moved = players.points()[index].clone();
        moved.cell = to;
        let updated = players.with_replaced(index, moved);
        self.replace_layer(LayerId::Players, updated);

        out_events.push(Event::CreatureMoved { creature, from, to });
        self.mark_changed(out_events);
    }

    fn update_creature(&mut self, creature: PointId, patch: &EntityPatch, out_events: &mut Vec<Event>) {
        let Some(index) = self.creature_index(creature, out_events) else {
            return;
        };
        let players = self.layer(LayerId::Players);
        let mut edited = players.points()[index].clone();
        let Some(entity) = edited.entity.as_mut() else {
            return;
        };
        let before = entity.clone();
        entity.apply(patch);
        if *entity == before {
            return;
        }

        let updated = players.with_replaced(index, edited);
        self.replace_layer(LayerId::Players, updated);

        out_events.push(Event::CreatureUpdated { creature });
        self.mark_changed(out_events);
    }

    fn resize_creature(&mut self, creature: PointId, size: u32, out_events: &mut Vec<Event>) {
        let Some(index) = self.creature_index(creature, out_events) else {
            return;
        };
        let size = size.max(1);
        let players = self.layer(LayerId::Players);
        let current = &players.points()[index];
        if current.width == size && current.height == size {
            return;
        }

        let mut resized = current.clone();
        resized.width = size;
        resized.height = size;
        let updated = players.with_replaced(index, resized);
        self.replace_layer(LayerId::Players, updated);

        out_events.push(Event::CreatureResized { creature, size });
        self.mark_changed(out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn far_corner(point: &Point) -> Coord {
    let dx = i32::try_from(point.width.saturating_sub(1)).unwrap_or(i32::MAX);
    let dy = i32::try_from(point.height.saturating_sub(1)).unwrap_or(i32::MAX);
    point.cell.offset(dx, dy)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceCell {
            layer,
            cell,
            kind,
            entity,
        } => world.place_cell(layer, cell, kind, entity, out_events),
        Command::PlaceOrRotateDoor { cell } => world.place_or_rotate_door(cell, out_events),
        Command::PlaceRectangle { first, second } => {
            world.place_rectangle(first, second, out_events);
        }
        Command::EraseCell { cell } => world.erase_cell(cell, out_events),
        Command::SetPreview { rect } => world.set_preview(rect, out_events),
        Command::MoveCreature { creature, to } => world.move_creature(creature, to, out_events),
        Command::UpdateCreature { creature, patch } => {
            world.update_creature(creature, &patch, out_events);
        }
        Command::ResizeCreature { creature, size } => {
            world.resize_creature(creature, size, out_events);
        }
        Command::RestoreSnapshot { snapshot } => {
            world.load(&snapshot);
            out_events.push(Event::GridRestored);
            world.mark_changed(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Layer, World};
    use gridsly_core::{Coord, GridSnapshot, LayerId, LayerSnapshot, Point, PointId};

    /// Reports whether the layer holds a point at the cell.
    #[must_use]
    pub fn cell_exists(world: &World, layer: LayerId, cell: Coord) -> bool {
        world.layer(layer).find(cell).is_some()
    }

    /// Retrieves the first point of the layer located at the cell.
    #[must_use]
    pub fn find_cell(world: &World, layer: LayerId, cell: Coord) -> Option<&Point> {
        world.layer(layer).find(cell)
    }

    /// Provides a handle to the current revision of a layer.
    #[must_use]
    pub fn layer(world: &World, layer: LayerId) -> Layer {
        world.layer(layer).clone()
    }

    /// Iterates every layer handle in render order.
    pub fn layers(world: &World) -> impl Iterator<Item = (LayerId, &Layer)> {
        LayerId::ALL
            .into_iter()
            .map(move |id| (id, world.layer(id)))
    }

    /// Looks up a creature on the players layer by identifier.
    #[must_use]
    pub fn creature(world: &World, creature: PointId) -> Option<&Point> {
        world
            .layer(LayerId::Players)
            .points()
            .iter()
            .find(|point| point.id == creature)
    }

    /// Revision counter increased by every effective mutation.
    #[must_use]
    pub fn revision(world: &World) -> u64 {
        world.revision
    }

    /// Captures the persisted form of the grid; the preview layer stays empty.
    #[must_use]
    pub fn snapshot(world: &World) -> GridSnapshot {
        GridSnapshot::from_layers(
            layers(world)
                .filter(|(id, _)| *id != LayerId::Mouse)
                .map(|(id, layer)| LayerSnapshot {
                    layer: id,
                    tiles: layer.points().iter().map(Point::to_tile).collect(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_starts_from_default_grid() {
        let world = World::new();

        assert_eq!(query::layer(&world, LayerId::Spaces).len(), 256);
        assert!(query::layer(&world, LayerId::Players).is_empty());
        assert_eq!(query::revision(&world), 0);
    }

    #[test]
    fn mutations_leave_previous_layer_handles_untouched() {
        let mut world = World::new();
        let mut events = Vec::new();
        let before = query::layer(&world, LayerId::Barriers);

        apply(
            &mut world,
            Command::PlaceCell {
                layer: LayerId::Barriers,
                cell: Coord::new(1, 1),
                kind: PointKind::Wall,
                entity: None,
            },
            &mut events,
        );

        let after = query::layer(&world, LayerId::Barriers);
        assert!(before.is_empty(), "old handle must keep its revision");
        assert_eq!(after.len(), 1);
        assert!(!before.same_revision(&after));
    }

    #[test]
    fn restore_discards_preview_and_duplicate_cells() {
        let mut world = World::new();
        let mut events = Vec::new();
        let snapshot = GridSnapshot::from_layers(vec![
            gridsly_core::LayerSnapshot {
                layer: LayerId::Barriers,
                tiles: vec![
                    Tile::unit(Coord::new(0, 0), PointKind::Wall),
                    Tile::unit(Coord::new(0, 0), PointKind::Obstacle),
                ],
            },
            gridsly_core::LayerSnapshot {
                layer: LayerId::Mouse,
                tiles: vec![Tile::unit(Coord::new(3, 3), PointKind::MouseSelect)],
            },
        ]);

        apply(&mut world, Command::RestoreSnapshot { snapshot }, &mut events);

        let barriers = query::layer(&world, LayerId::Barriers);
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers.points()[0].kind, PointKind::Wall);
        assert!(query::layer(&world, LayerId::Mouse).is_empty());
        assert!(query::layer(&world, LayerId::Spaces).is_empty());
        assert_eq!(
            events,
            vec![Event::GridRestored, Event::GridChanged { revision: 1 }]
        );
    }
}
