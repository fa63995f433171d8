use anyhow::{Context, Result};
use glam::Vec2;
use gridsly_core::{Coord, EntityPatch, HexColor, MapSlot, ToolKind};
use gridsly_rendering::{Viewport, PADDING_CELLS};
use gridsly_session::EditorSession;
use gridsly_system_persistence::KeyValueStore;
use serde::Deserialize;
use tracing::{debug, warn};

/// Editing session recorded as a list of input steps.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Script {
    #[serde(default)]
    steps: Vec<Step>,
}

/// Single input forwarded to the session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) enum Step {
    /// Selects a tool.
    Tool { tool: ToolKind },
    /// Presses the pointer on a cell.
    Down { x: i32, y: i32 },
    /// Moves the pointer over a cell.
    Move { x: i32, y: i32 },
    /// Releases the pointer.
    Up,
    /// Presses and releases the pointer on a cell.
    Click { x: i32, y: i32 },
    /// Presses the pointer at a canvas pixel.
    PixelDown { x: f32, y: f32 },
    /// Moves the pointer to a canvas pixel.
    PixelMove { x: f32, y: f32 },
    /// Duplicates the selected creature.
    Duplicate,
    /// Edits the selected creature.
    Edit {
        name: Option<String>,
        symbol: Option<char>,
        color: Option<HexColor>,
    },
    /// Resizes the selected creature.
    Resize { size: u32 },
    /// Closes the creature edit panel.
    ClosePanel,
    /// Adjusts the zoom.
    Zoom { delta: f32 },
    /// Switches to another slot.
    Slot { slot: MapSlot },
}

/// Counts reported after a script finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ScriptSummary {
    pub(crate) steps: usize,
    pub(crate) rejected_zooms: usize,
}

impl Script {
    /// Parses a TOML script.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse script toml")
    }

    /// Replays every step against the session.
    pub(crate) fn run<S: KeyValueStore>(
        &self,
        session: &mut EditorSession<S>,
        cell_size: f32,
    ) -> Result<ScriptSummary> {
        let mut summary = ScriptSummary::default();
        for (index, step) in self.steps.iter().enumerate() {
            debug!(index, ?step, "replaying step");
            match step {
                Step::Tool { tool } => session.select_tool(*tool),
                Step::Down { x, y } => session.pointer_down(Coord::new(*x, *y)),
                Step::Move { x, y } => session.pointer_move(Coord::new(*x, *y)),
                Step::Up => session.pointer_up(),
                Step::Click { x, y } => {
                    session.pointer_down(Coord::new(*x, *y));
                    session.pointer_up();
                }
                Step::PixelDown { x, y } => {
                    let cell = pixel_cell(session, cell_size, Vec2::new(*x, *y))
                        .with_context(|| format!("step {index}"))?;
                    session.pointer_down(cell);
                }
                Step::PixelMove { x, y } => {
                    let cell = pixel_cell(session, cell_size, Vec2::new(*x, *y))
                        .with_context(|| format!("step {index}"))?;
                    session.pointer_move(cell);
                }
                Step::Duplicate => session.duplicate_selected(),
                Step::Edit {
                    name,
                    symbol,
                    color,
                } => session.edit_selected(EntityPatch {
                    name: name.clone(),
                    symbol: *symbol,
                    color: color.clone(),
                }),
                Step::Resize { size } => session.resize_selected(*size),
                Step::ClosePanel => session.close_edit_panel(),
                Step::Zoom { delta } => {
                    if !session.zoom_by(*delta) {
                        warn!(index, delta, "zoom step rejected");
                        summary.rejected_zooms += 1;
                    }
                }
                Step::Slot { slot } => session.switch_slot(*slot),
            }
            summary.steps += 1;
        }
        Ok(summary)
    }
}

fn pixel_cell<S: KeyValueStore>(
    session: &EditorSession<S>,
    cell_size: f32,
    pixel: Vec2,
) -> Result<Coord> {
    let buffer = Vec2::splat(PADDING_CELLS as f32 * cell_size);
    let viewport = Viewport::new(cell_size, session.zoom(), buffer)?;
    Ok(viewport.pixel_to_grid(pixel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsly_core::LayerId;
    use gridsly_system_persistence::MemoryStore;
    use gridsly_world::query;

    const SCRIPT: &str = r##"
        [[steps]]
        action = "tool"
        tool = "single-wall"

        [[steps]]
        action = "pixel-down"
        x = 400.0
        y = 390.0

        [[steps]]
        action = "pixel-move"
        x = 440.0
        y = 390.0

        [[steps]]
        action = "up"

        [[steps]]
        action = "tool"
        tool = "single-npc"

        [[steps]]
        action = "click"
        x = 0
        y = 5

        [[steps]]
        action = "edit"
        name = "Ogre"
        color = "#FFAA00"

        [[steps]]
        action = "zoom"
        delta = -1.0
    "##;

    #[test]
    fn parses_tagged_steps() {
        let script = Script::parse(SCRIPT).expect("parse");

        assert_eq!(script.steps.len(), 8);
        assert_eq!(
            script.steps[0],
            Step::Tool {
                tool: ToolKind::SingleWall
            }
        );
        assert_eq!(script.steps[3], Step::Up);
    }

    #[test]
    fn unknown_actions_and_slots_are_rejected() {
        assert!(Script::parse("[[steps]]\naction = \"jump\"").is_err());
        assert!(Script::parse("[[steps]]\naction = \"slot\"\nslot = 9").is_err());
        assert!(Script::parse("[[steps]]\naction = \"tool\"\ntool = \"lasso\"").is_err());
    }

    #[test]
    fn replays_pixel_and_grid_steps() {
        let script = Script::parse(SCRIPT).expect("parse");
        let mut session = EditorSession::open(MemoryStore::new(), MapSlot::default());

        let summary = script.run(&mut session, 64.0).expect("run");

        assert_eq!(
            summary,
            ScriptSummary {
                steps: 8,
                rejected_zooms: 1
            }
        );
        let walls: Vec<Coord> = query::layer(session.world(), LayerId::Barriers)
            .points()
            .iter()
            .map(|point| point.cell)
            .collect();
        assert_eq!(walls, vec![Coord::new(0, 0), Coord::new(1, 0)]);
        let npc = query::find_cell(session.world(), LayerId::Players, Coord::new(0, 5))
            .and_then(|point| point.entity.as_ref())
            .expect("npc placed");
        assert_eq!(npc.name, "Ogre");
        assert_eq!(npc.color.as_str(), "#ffaa00");
    }
}
