#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Creature placement, selection, relocation and editing.
//!
//! The system keeps the selected creature by stable identifier and owns the
//! open/closed state of the edit panel. Grid lookups are supplied by the caller
//! through closures mirroring the world's query helpers, keeping the system
//! free of any direct world access.

use gridsly_core::{
    Command, Coord, EntityKind, EntityPatch, Event, LayerId, Point, PointId, PointKind,
};

/// Tool context in which a creature click happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatureTool {
    /// Single-player or single-NPC placement tool.
    Place(EntityKind),
    /// Movement tool.
    Movement,
}

/// Creature editing system.
#[derive(Clone, Debug, Default)]
pub struct CreatureEditor {
    selected: Option<PointId>,
    panel_open: bool,
    awaiting_placement: bool,
}

impl CreatureEditor {
    /// Creates an editor with no selection and the panel closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creature currently selected, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<PointId> {
        self.selected
    }

    /// Reports whether the creature edit panel is open.
    #[must_use]
    pub const fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Closes the edit panel while keeping the selection.
    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    /// Consumes world events to keep the selection consistent with the grid.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CellPlaced {
                    layer: LayerId::Players,
                    point,
                    ..
                } if self.awaiting_placement => {
                    self.awaiting_placement = false;
                    self.selected = Some(*point);
                    self.panel_open = true;
                }
                Event::PlacementRejected {
                    layer: LayerId::Players,
                    ..
                } => {
                    self.awaiting_placement = false;
                }
                Event::CellErased { point, .. } if self.selected == Some(*point) => {
                    self.selected = None;
                    self.panel_open = false;
                }
                Event::GridRestored => {
                    self.selected = None;
                    self.panel_open = false;
                    self.awaiting_placement = false;
                }
                _ => {}
            }
        }
    }

    /// Handles a click on a cell while a creature tool is active.
    ///
    /// The `creature_at` closure should mirror the world's `query::find_cell`
    /// helper restricted to the players layer.
    pub fn click<F>(
        &mut self,
        tool: CreatureTool,
        cell: Coord,
        creature_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnOnce(Coord) -> Option<PointId>,
    {
        let occupant = creature_at(cell);
        match (tool, occupant) {
            (CreatureTool::Place(_), Some(creature)) => {
                self.selected = Some(creature);
                self.panel_open = true;
            }
            (CreatureTool::Place(kind), None) => match self.selected {
                Some(creature) if self.panel_open => {
                    out.push(Command::MoveCreature { creature, to: cell });
                }
                _ => {
                    self.awaiting_placement = true;
                    out.push(Command::PlaceCell {
                        layer: LayerId::Players,
                        cell,
                        kind: match kind {
                            EntityKind::Player => PointKind::Player,
                            EntityKind::Npc => PointKind::Npc,
                        },
                        entity: None,
                    });
                }
            },
            (CreatureTool::Movement, Some(creature)) => {
                if self.selected == Some(creature) {
                    self.selected = None;
                } else {
                    self.selected = Some(creature);
                }
            }
            (CreatureTool::Movement, None) => {
                if let Some(creature) = self.selected {
                    out.push(Command::MoveCreature { creature, to: cell });
                }
            }
        }
    }

    /// Requests a copy of the selected creature one cell to its right.
    ///
    /// The copy is always an NPC carrying the selection's entity.
    pub fn duplicate<'a, F>(&self, lookup: F, out: &mut Vec<Command>)
    where
        F: FnOnce(PointId) -> Option<&'a Point>,
    {
        let Some(point) = self.selected.and_then(lookup) else {
            return;
        };
        out.push(Command::PlaceCell {
            layer: LayerId::Players,
            cell: point.cell.offset(1, 0),
            kind: PointKind::Npc,
            entity: point.entity.clone(),
        });
    }

    /// Requests entity attribute changes for the selected creature.
    pub fn edit(&self, patch: EntityPatch, out: &mut Vec<Command>) {
        if patch.is_empty() {
            return;
        }
        if let Some(creature) = self.selected {
            out.push(Command::UpdateCreature { creature, patch });
        }
    }

    /// Requests a new square footprint for the selected creature.
    pub fn resize(&self, size: u32, out: &mut Vec<Command>) {
        if let Some(creature) = self.selected {
            out.push(Command::ResizeCreature { creature, size });
        }
    }
}
