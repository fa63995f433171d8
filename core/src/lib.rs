#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridsly map editor.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative grid, and pure editing systems. Systems translate pointer
//! input into [`Command`] values describing desired mutations, the world
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values that systems and persistence react to. Nothing in here
//! owns state; every type is a plain value that can be cloned, compared and
//! serialised.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cells along each edge of the grid created for an empty map slot.
pub const DEFAULT_GRID_SIZE: i32 = 16;

/// Maximum number of characters retained in a creature name.
pub const ENTITY_NAME_LIMIT: usize = 32;

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Places a single point unless the layer already holds one at the cell.
    PlaceCell {
        /// Layer receiving the point.
        layer: LayerId,
        /// Cell addressed by the placement.
        cell: Coord,
        /// Kind of point to create.
        kind: PointKind,
        /// Entity replacing the kind's default creature attributes.
        entity: Option<Entity>,
    },
    /// Places a left-facing door, or rotates the door already at the cell.
    PlaceOrRotateDoor {
        /// Cell addressed by the placement.
        cell: Coord,
    },
    /// Fills the inclusive rectangle spanned by two corners with spaces.
    PlaceRectangle {
        /// First corner of the rectangle.
        first: Coord,
        /// Opposite corner of the rectangle.
        second: Coord,
    },
    /// Removes the point on the topmost layer that holds the cell.
    EraseCell {
        /// Cell addressed by the erase.
        cell: Coord,
    },
    /// Replaces the mouse preview layer with the provided rectangle, or clears it.
    SetPreview {
        /// Rectangle highlighted by the preview, if any.
        rect: Option<GridRect>,
    },
    /// Moves an existing creature to another cell of the players layer.
    MoveCreature {
        /// Creature being moved.
        creature: PointId,
        /// Destination cell.
        to: Coord,
    },
    /// Merges attribute changes into a creature's entity.
    UpdateCreature {
        /// Creature being edited.
        creature: PointId,
        /// Attributes to overwrite.
        patch: EntityPatch,
    },
    /// Changes the square footprint of a creature.
    ResizeCreature {
        /// Creature being resized.
        creature: PointId,
        /// Edge length of the footprint in cells.
        size: u32,
    },
    /// Replaces every layer with the contents of a persisted snapshot.
    RestoreSnapshot {
        /// Snapshot providing the new contents.
        snapshot: GridSnapshot,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new point was inserted into a layer.
    CellPlaced {
        /// Layer that received the point.
        layer: LayerId,
        /// Identifier allocated to the point.
        point: PointId,
        /// Cell occupied by the point.
        cell: Coord,
        /// Kind of the inserted point.
        kind: PointKind,
    },
    /// Reports that a placement or creature edit was rejected.
    PlacementRejected {
        /// Layer targeted by the request.
        layer: LayerId,
        /// Cell targeted by the request.
        cell: Coord,
        /// Specific reason the request failed.
        reason: PlacementError,
    },
    /// Confirms that an existing door turned to a new facing.
    DoorRotated {
        /// Identifier of the rotated door.
        point: PointId,
        /// Cell occupied by the door.
        cell: Coord,
        /// Facing after the rotation.
        facing: DoorFacing,
    },
    /// Confirms that a rectangle of spaces was committed.
    RectanglePlaced {
        /// Rectangle covered by the request.
        rect: GridRect,
        /// Number of spaces that did not exist before.
        added: u32,
    },
    /// Confirms that a point was removed.
    CellErased {
        /// Layer the point was removed from.
        layer: LayerId,
        /// Identifier of the removed point.
        point: PointId,
        /// Cell the point occupied.
        cell: Coord,
    },
    /// Announces that the mouse preview layer changed.
    PreviewChanged {
        /// Rectangle now highlighted, if any.
        rect: Option<GridRect>,
    },
    /// Confirms that a creature moved between cells.
    CreatureMoved {
        /// Identifier of the moved creature.
        creature: PointId,
        /// Cell the creature occupied before moving.
        from: Coord,
        /// Cell the creature occupies after moving.
        to: Coord,
    },
    /// Reports that a creature edit was rejected.
    CreatureRejected {
        /// Creature addressed by the request.
        creature: PointId,
        /// Specific reason the request failed.
        reason: PlacementError,
    },
    /// Confirms that a creature's entity attributes changed.
    CreatureUpdated {
        /// Identifier of the edited creature.
        creature: PointId,
    },
    /// Confirms that a creature's footprint changed.
    CreatureResized {
        /// Identifier of the resized creature.
        creature: PointId,
        /// Edge length of the new footprint.
        size: u32,
    },
    /// Announces that every layer was replaced from a snapshot.
    GridRestored,
    /// Emitted once after any command that changed grid contents.
    GridChanged {
        /// Revision reached by the grid after the change.
        revision: u64,
    },
}

/// Reasons a placement or creature edit may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The target cell already holds a point in the layer.
    Occupied,
    /// The referenced creature does not exist in the players layer.
    MissingCreature,
    /// The barrier at the cell is not a door and cannot be rotated.
    NotADoor,
}

/// Location of a single grid cell. The canvas is unbounded in every direction.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    x: i32,
    y: i32,
}

impl Coord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    origin: Coord,
    width: u32,
    height: u32,
}

impl GridRect {
    /// Builds the bounding rectangle of two corners, both included.
    #[must_use]
    pub fn from_corners(first: Coord, second: Coord) -> Self {
        let origin = Coord::new(first.x().min(second.x()), first.y().min(second.y()));
        Self {
            origin,
            width: first.x().abs_diff(second.x()) + 1,
            height: first.y().abs_diff(second.y()) + 1,
        }
    }

    /// Upper-left cell of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Coord {
        self.origin
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells covered by the rectangle.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Reports whether the cell lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, cell: Coord) -> bool {
        let dx = i64::from(cell.x()) - i64::from(self.origin.x());
        let dy = i64::from(cell.y()) - i64::from(self.origin.y());
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }

    /// Iterates the covered cells column by column.
    pub fn cells(&self) -> impl Iterator<Item = Coord> {
        let origin = self.origin;
        let height = self.height;
        (0..self.width).flat_map(move |dx| {
            (0..height).map(move |dy| offset_unsigned(origin, dx, dy))
        })
    }
}

fn offset_unsigned(origin: Coord, dx: u32, dy: u32) -> Coord {
    let x = i64::from(origin.x()) + i64::from(dx);
    let y = i64::from(origin.y()) + i64::from(dy);
    Coord::new(
        i32::try_from(x).unwrap_or(i32::MAX),
        i32::try_from(y).unwrap_or(i32::MAX),
    )
}

/// Smallest column and row reached by space-placing gestures, never above zero.
///
/// Cell labels are offset by this origin so they stay non-negative after the
/// map grows towards negative coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelOrigin {
    x: i32,
    y: i32,
}

impl LabelOrigin {
    /// Lowest tracked column.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Lowest tracked row.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Extends the origin to cover the provided cell.
    pub fn include(&mut self, cell: Coord) {
        self.x = self.x.min(cell.x());
        self.y = self.y.min(cell.y());
    }
}

/// Fixed partitions of the grid, listed in render order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerId {
    /// Floor tiles.
    Spaces,
    /// Walls, obstacles and doors.
    Barriers,
    /// Players and NPCs.
    Players,
    /// Transient rectangle preview.
    Mouse,
}

impl LayerId {
    /// Every layer in bottom-to-top order.
    pub const ALL: [LayerId; 4] = [
        LayerId::Spaces,
        LayerId::Barriers,
        LayerId::Players,
        LayerId::Mouse,
    ];

    /// Position of the layer in the grid.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Spaces => 0,
            Self::Barriers => 1,
            Self::Players => 2,
            Self::Mouse => 3,
        }
    }

    /// Display name of the layer.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spaces => "SPACES",
            Self::Barriers => "BARRIERS",
            Self::Players => "PLAYERS",
            Self::Mouse => "MOUSE",
        }
    }
}

/// Kinds of points that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointKind {
    /// Walkable floor tile.
    Space,
    /// Impassable wall.
    Wall,
    /// Obstacle occupying a cell.
    Obstacle,
    /// Door drawn against one edge of its cell.
    Door,
    /// Player-controlled creature.
    Player,
    /// Non-player creature.
    Npc,
    /// Rectangle preview drawn while a rectangle gesture is anchored.
    MouseSelect,
}

impl PointKind {
    /// Returns the creature kind represented by the point, if any.
    #[must_use]
    pub const fn creature(self) -> Option<EntityKind> {
        match self {
            Self::Player => Some(EntityKind::Player),
            Self::Npc => Some(EntityKind::Npc),
            _ => None,
        }
    }
}

/// Edge of the cell a door is drawn against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorFacing {
    /// Left edge; the facing of every new door.
    #[default]
    Left,
    /// Right edge.
    Right,
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
}

impl DoorFacing {
    /// Facing reached after one rotation: left, bottom, right, top, left.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Left => Self::Bottom,
            Self::Bottom => Self::Right,
            Self::Right => Self::Top,
            Self::Top => Self::Left,
        }
    }
}

/// Category of creature attached to a player or NPC point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Player character.
    Player,
    /// Non-player character.
    Npc,
}

/// Errors raised while parsing a hex color.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("`{0}` is not a #rrggbb color")]
pub struct ColorParseError(String);

/// Color stored as a `#rrggbb` hex string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parses a `#rrggbb` string, normalising it to lowercase.
    pub fn parse(value: &str) -> Result<Self, ColorParseError> {
        let digits = value
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorParseError(value.to_owned()))?;
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    /// Hex representation including the leading `#`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte RGB components of the color.
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |start: usize| u8::from_str_radix(&self.0[start..start + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creature attributes carried by player and NPC points.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Display name, at most [`ENTITY_NAME_LIMIT`] characters.
    pub name: String,
    /// Fill color.
    pub color: HexColor,
    /// Single character drawn on the creature.
    pub symbol: char,
    /// Creature category.
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

impl Entity {
    /// Attributes assigned to freshly placed creatures of the provided kind.
    #[must_use]
    pub fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Self {
                name: "PLAYER".to_owned(),
                color: HexColor("#000000".to_owned()),
                symbol: '@',
                kind,
            },
            EntityKind::Npc => Self {
                name: "NPC".to_owned(),
                color: HexColor("#805ad5".to_owned()),
                symbol: '>',
                kind,
            },
        }
    }

    /// Overwrites the attributes present in the patch.
    pub fn apply(&mut self, patch: &EntityPatch) {
        if let Some(name) = &patch.name {
            self.name = name.chars().take(ENTITY_NAME_LIMIT).collect();
        }
        if let Some(symbol) = patch.symbol {
            self.symbol = symbol;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
    }
}

/// Partial update of a creature's attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPatch {
    /// Replacement display name.
    pub name: Option<String>,
    /// Replacement symbol.
    pub symbol: Option<char>,
    /// Replacement fill color.
    pub color: Option<HexColor>,
}

impl EntityPatch {
    /// Reports whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.symbol.is_none() && self.color.is_none()
    }
}

/// Stable identifier assigned to a point when the world creates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u32);

impl PointId {
    /// Creates a new point identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a placed point used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    /// Identifier allocated by the world.
    pub id: PointId,
    /// Upper-left cell of the point.
    pub cell: Coord,
    /// Width of the footprint in cells.
    pub width: u32,
    /// Height of the footprint in cells.
    pub height: u32,
    /// Kind of the point.
    pub kind: PointKind,
    /// Facing, present only for doors.
    pub facing: Option<DoorFacing>,
    /// Creature attributes, present only for players and NPCs.
    pub entity: Option<Entity>,
}

impl Point {
    /// Strips the identifier, yielding the persisted form of the point.
    #[must_use]
    pub fn to_tile(&self) -> Tile {
        Tile {
            cell: self.cell,
            width: self.width,
            height: self.height,
            kind: self.kind,
            facing: self.facing,
            entity: self.entity.clone(),
        }
    }
}

/// Editing modes selectable from the host's tool menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// No tool; pointer input is ignored.
    None,
    /// Places one space per click.
    #[default]
    SingleSpace,
    /// Two-click rectangle of spaces.
    RectangleSpace,
    /// Places one wall per click.
    SingleWall,
    /// Places or rotates doors.
    SingleDoor,
    /// Places one obstacle per click.
    SingleObstacle,
    /// Places, selects and relocates players.
    SinglePlayer,
    /// Places, selects and relocates NPCs.
    SingleNpc,
    /// Removes the topmost point under the cursor.
    Eraser,
    /// Selects and moves creatures.
    Movement,
}

impl ToolKind {
    /// Every selectable tool.
    pub const ALL: [ToolKind; 10] = [
        ToolKind::None,
        ToolKind::SingleSpace,
        ToolKind::RectangleSpace,
        ToolKind::SingleWall,
        ToolKind::SingleDoor,
        ToolKind::SingleObstacle,
        ToolKind::SinglePlayer,
        ToolKind::SingleNpc,
        ToolKind::Eraser,
        ToolKind::Movement,
    ];

    /// Identifier used by menus and scripts.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SingleSpace => "single-space",
            Self::RectangleSpace => "rectangle-space",
            Self::SingleWall => "single-wall",
            Self::SingleDoor => "single-door",
            Self::SingleObstacle => "single-obstacle",
            Self::SinglePlayer => "single-player",
            Self::SingleNpc => "single-npc",
            Self::Eraser => "eraser",
            Self::Movement => "movement",
        }
    }

    /// Reports whether dragging with the button held repeats the tool's operation.
    #[must_use]
    pub const fn paints_on_drag(self) -> bool {
        matches!(self, Self::SingleWall | Self::SingleSpace | Self::Eraser)
    }
}

/// Error returned when a tool identifier is unknown.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown tool `{0}`")]
pub struct UnknownToolError(String);

impl FromStr for ToolKind {
    type Err = UnknownToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.identifier() == s)
            .ok_or_else(|| UnknownToolError(s.to_owned()))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// One of the independent saved maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MapSlot(u8);

/// Error returned when a slot index lies outside the available slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("map slot {0} does not exist (expected 0..{count})", count = MapSlot::COUNT)]
pub struct InvalidSlotError(pub u8);

impl TryFrom<u8> for MapSlot {
    type Error = InvalidSlotError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(InvalidSlotError(index))
    }
}

impl From<MapSlot> for u8 {
    fn from(slot: MapSlot) -> Self {
        slot.0
    }
}

impl MapSlot {
    /// Number of available slots.
    pub const COUNT: u8 = 3;

    /// Creates a slot handle, returning `None` outside `0..COUNT`.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Zero-based slot index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for MapSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Persisted form of a point; identical to [`Point`] minus its identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Upper-left cell of the tile.
    #[serde(rename = "coordinates")]
    pub cell: Coord,
    /// Width of the footprint in cells.
    pub width: u32,
    /// Height of the footprint in cells.
    pub height: u32,
    /// Kind of the tile.
    #[serde(rename = "type")]
    pub kind: PointKind,
    /// Door facing.
    #[serde(default, rename = "position", skip_serializing_if = "Option::is_none")]
    pub facing: Option<DoorFacing>,
    /// Creature attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,
}

impl Tile {
    /// Creates a 1×1 tile without door facing or entity.
    #[must_use]
    pub const fn unit(cell: Coord, kind: PointKind) -> Self {
        Self {
            cell,
            width: 1,
            height: 1,
            kind,
            facing: None,
            entity: None,
        }
    }
}

/// Persisted contents of a single layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Layer the tiles belong to.
    #[serde(rename = "name")]
    pub layer: LayerId,
    /// Tiles placed on the layer.
    #[serde(rename = "points")]
    pub tiles: Vec<Tile>,
}

/// Persisted contents of the entire grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<LayerSnapshot>", into = "Vec<LayerSnapshot>")]
pub struct GridSnapshot {
    layers: Vec<LayerSnapshot>,
}

impl GridSnapshot {
    /// Creates a snapshot from per-layer contents.
    ///
    /// Layers are reordered into render order. Missing layers become empty and
    /// duplicate layers are merged.
    #[must_use]
    pub fn from_layers(layers: Vec<LayerSnapshot>) -> Self {
        let mut merged: Vec<LayerSnapshot> = LayerId::ALL
            .into_iter()
            .map(|layer| LayerSnapshot {
                layer,
                tiles: Vec::new(),
            })
            .collect();
        for snapshot in layers {
            merged[snapshot.layer.index()].tiles.extend(snapshot.tiles);
        }
        Self { layers: merged }
    }

    /// Snapshot of a `size`×`size` grid of spaces anchored at the origin.
    #[must_use]
    pub fn default_grid(size: i32) -> Self {
        let mut spaces = Vec::new();
        for x in 0..size {
            for y in 0..size {
                spaces.push(Tile::unit(Coord::new(x, y), PointKind::Space));
            }
        }
        Self::from_layers(vec![LayerSnapshot {
            layer: LayerId::Spaces,
            tiles: spaces,
        }])
    }

    /// Layer contents in render order.
    #[must_use]
    pub fn layers(&self) -> &[LayerSnapshot] {
        &self.layers
    }

    /// Tiles stored for the provided layer.
    #[must_use]
    pub fn tiles(&self, layer: LayerId) -> &[Tile] {
        self.layers
            .get(layer.index())
            .map_or(&[], |snapshot| snapshot.tiles.as_slice())
    }

    /// Returns a copy whose tiles are sorted by coordinates within every layer.
    ///
    /// Two grids holding the same tiles in different insertion orders share
    /// the same canonical form.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let mut canonical = Self::from_layers(self.layers.clone());
        for layer in &mut canonical.layers {
            layer.tiles.sort_by_key(|tile| (tile.cell.y(), tile.cell.x()));
        }
        canonical
    }
}

impl From<Vec<LayerSnapshot>> for GridSnapshot {
    fn from(layers: Vec<LayerSnapshot>) -> Self {
        Self::from_layers(layers)
    }
}

impl From<GridSnapshot> for Vec<LayerSnapshot> {
    fn from(snapshot: GridSnapshot) -> Self {
        snapshot.layers
    }
}

impl Default for GridSnapshot {
    fn default() -> Self {
        Self::default_grid(DEFAULT_GRID_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_from_corners_is_order_independent() {
        let a = GridRect::from_corners(Coord::new(4, 1), Coord::new(2, 3));
        let b = GridRect::from_corners(Coord::new(2, 3), Coord::new(4, 1));

        assert_eq!(a, b);
        assert_eq!(a.origin(), Coord::new(2, 1));
        assert_eq!((a.width(), a.height()), (3, 3));
        assert_eq!(a.cells().count(), 9);
    }

    #[test]
    fn rectangle_handles_negative_coordinates() {
        let rect = GridRect::from_corners(Coord::new(-2, -1), Coord::new(0, 0));

        assert_eq!(rect.origin(), Coord::new(-2, -1));
        assert!(rect.contains(Coord::new(-1, 0)));
        assert!(!rect.contains(Coord::new(1, 0)));
        assert_eq!(rect.area(), 6);
    }

    #[test]
    fn door_facing_is_a_four_cycle() {
        let mut facing = DoorFacing::Left;
        let mut seen = Vec::new();
        for _ in 0..4 {
            facing = facing.next();
            seen.push(facing);
        }

        assert_eq!(
            seen,
            vec![
                DoorFacing::Bottom,
                DoorFacing::Right,
                DoorFacing::Top,
                DoorFacing::Left
            ]
        );
    }

    #[test]
    fn tool_identifiers_parse_back() {
        for tool in ToolKind::ALL {
            assert_eq!(tool.identifier().parse::<ToolKind>(), Ok(tool));
        }
        assert!("lasso".parse::<ToolKind>().is_err());
    }

    #[test]
    fn hex_color_validates_and_normalises() {
        let color = HexColor::parse("#805AD5").expect("valid color");
        assert_eq!(color.as_str(), "#805ad5");
        assert_eq!(color.rgb(), (0x80, 0x5a, 0xd5));

        assert!(HexColor::parse("805ad5").is_err());
        assert!(HexColor::parse("#80").is_err());
        assert!(HexColor::parse("#zzzzzz").is_err());
    }

    #[test]
    fn entity_patch_truncates_long_names() {
        let mut entity = Entity::default_for(EntityKind::Npc);
        entity.apply(&EntityPatch {
            name: Some("x".repeat(40)),
            symbol: Some('g'),
            ..EntityPatch::default()
        });

        assert_eq!(entity.name.chars().count(), ENTITY_NAME_LIMIT);
        assert_eq!(entity.symbol, 'g');
        assert_eq!(entity.color.as_str(), "#805ad5");
    }

    #[test]
    fn map_slot_rejects_out_of_range_indices() {
        assert_eq!(MapSlot::new(2).map(|slot| slot.get()), Some(2));
        assert!(MapSlot::new(3).is_none());
        assert_eq!(MapSlot::try_from(7), Err(InvalidSlotError(7)));

        let encoded = bincode::serialize(&4u8).expect("serialize");
        assert!(bincode::deserialize::<MapSlot>(&encoded).is_err());
    }

    #[test]
    fn canonical_snapshot_ignores_insertion_order() {
        let forward = GridSnapshot::from_layers(vec![LayerSnapshot {
            layer: LayerId::Barriers,
            tiles: vec![
                Tile::unit(Coord::new(1, 0), PointKind::Wall),
                Tile::unit(Coord::new(0, 0), PointKind::Wall),
            ],
        }]);
        let reverse = GridSnapshot::from_layers(vec![LayerSnapshot {
            layer: LayerId::Barriers,
            tiles: vec![
                Tile::unit(Coord::new(0, 0), PointKind::Wall),
                Tile::unit(Coord::new(1, 0), PointKind::Wall),
            ],
        }]);

        assert_ne!(forward, reverse);
        assert_eq!(forward.canonical(), reverse.canonical());
        assert_eq!(forward.layers().len(), LayerId::ALL.len());
    }

    #[test]
    fn default_grid_covers_sixteen_by_sixteen_spaces() {
        let snapshot = GridSnapshot::default();

        assert_eq!(snapshot.tiles(LayerId::Spaces).len(), 256);
        assert!(snapshot.tiles(LayerId::Barriers).is_empty());
        assert!(snapshot
            .tiles(LayerId::Spaces)
            .iter()
            .all(|tile| tile.kind == PointKind::Space && tile.width == 1 && tile.height == 1));
    }

    #[test]
    fn snapshot_round_trips_through_bincode() {
        let mut npc = Tile::unit(Coord::new(-3, 7), PointKind::Npc);
        npc.entity = Some(Entity::default_for(EntityKind::Npc));
        let mut door = Tile::unit(Coord::new(2, 2), PointKind::Door);
        door.facing = Some(DoorFacing::Top);
        let snapshot = GridSnapshot::from_layers(vec![
            LayerSnapshot {
                layer: LayerId::Players,
                tiles: vec![npc],
            },
            LayerSnapshot {
                layer: LayerId::Barriers,
                tiles: vec![door],
            },
        ]);

        let bytes = bincode::serialize(&snapshot).expect("serialize");
        let restored: GridSnapshot = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, snapshot);
    }
}
