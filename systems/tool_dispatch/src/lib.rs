#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure tool dispatch system mapping pointer input onto grid commands.
//!
//! Single-cell tools are translated into commands directly. Tools that need
//! multi-step gestures are routed to the system owning that gesture via
//! [`PointerRoute`].

use gridsly_core::{Command, Coord, EntityKind, LayerId, PointKind, ToolKind};

/// Destination of a pointer press after tool dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerRoute {
    /// The press was ignored.
    Ignored,
    /// The press was translated into grid commands.
    Applied,
    /// The press advances the rectangle-select gesture.
    RectangleSelect,
    /// The press places or selects a creature of the given kind.
    PlaceCreature(EntityKind),
    /// The press selects or moves a creature.
    Movement,
}

/// Tool dispatch system tracking the active tool and paint-style drags.
#[derive(Clone, Debug, Default)]
pub struct ToolDispatcher {
    active_tool: ToolKind,
    dragging: bool,
    recent_cell: Option<Coord>,
}

impl ToolDispatcher {
    /// Creates a dispatcher with the default single-space tool selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool currently governing pointer input.
    #[must_use]
    pub const fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    /// Reports whether the pointer button is held after a dispatched press.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Most recent cell touched by the current gesture.
    #[must_use]
    pub const fn recent_cell(&self) -> Option<Coord> {
        self.recent_cell
    }

    /// Switches the active tool, abandoning any drag in progress.
    ///
    /// Callers are expected to cancel gestures owned by other systems as well.
    pub fn select_tool(&mut self, tool: ToolKind) {
        self.active_tool = tool;
        self.dragging = false;
        self.recent_cell = None;
    }

    /// Dispatches a pointer press on the provided cell.
    pub fn pointer_down(&mut self, cell: Coord, out: &mut Vec<Command>) -> PointerRoute {
        if self.active_tool == ToolKind::None {
            return PointerRoute::Ignored;
        }

        self.dragging = true;
        self.recent_cell = Some(cell);

        match self.active_tool {
            ToolKind::RectangleSpace => PointerRoute::RectangleSelect,
            ToolKind::SinglePlayer => PointerRoute::PlaceCreature(EntityKind::Player),
            ToolKind::SingleNpc => PointerRoute::PlaceCreature(EntityKind::Npc),
            ToolKind::Movement => PointerRoute::Movement,
            tool => {
                if let Some(command) = cell_command(tool, cell) {
                    out.push(command);
                }
                PointerRoute::Applied
            }
        }
    }

    /// Dispatches pointer motion while the button is held.
    ///
    /// Only paint-style tools react, and each cell is painted once until the
    /// pointer enters a different cell.
    pub fn pointer_drag(&mut self, cell: Coord, out: &mut Vec<Command>) -> bool {
        if !self.dragging || !self.active_tool.paints_on_drag() {
            return false;
        }
        if self.recent_cell == Some(cell) {
            return false;
        }

        self.recent_cell = Some(cell);
        match cell_command(self.active_tool, cell) {
            Some(command) => {
                out.push(command);
                true
            }
            None => false,
        }
    }

    /// Ends the drag started by the last pointer press.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }
}

fn cell_command(tool: ToolKind, cell: Coord) -> Option<Command> {
    let place = |layer, kind| Command::PlaceCell {
        layer,
        cell,
        kind,
        entity: None,
    };
    match tool {
        ToolKind::SingleSpace => Some(place(LayerId::Spaces, PointKind::Space)),
        ToolKind::SingleWall => Some(place(LayerId::Barriers, PointKind::Wall)),
        ToolKind::SingleObstacle => Some(place(LayerId::Barriers, PointKind::Obstacle)),
        ToolKind::SingleDoor => Some(Command::PlaceOrRotateDoor { cell }),
        ToolKind::Eraser => Some(Command::EraseCell { cell }),
        ToolKind::None
        | ToolKind::RectangleSpace
        | ToolKind::SinglePlayer
        | ToolKind::SingleNpc
        | ToolKind::Movement => None,
    }
}
