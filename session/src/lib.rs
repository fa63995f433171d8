#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Editor session owning the grid, the editing systems and persistence.
//!
//! Hosts forward pointer and menu input to an [`EditorSession`], which routes
//! it through the tool dispatcher and gesture systems, applies the resulting
//! commands to the world, and persists the grid after every input.

use gridsly_core::{
    Command, Coord, EntityPatch, Event, GridRect, GridSnapshot, LabelOrigin, LayerId, MapSlot,
    PointId, ToolKind,
};
use gridsly_system_creatures::{CreatureEditor, CreatureTool};
use gridsly_system_persistence::{CommitOutcome, KeyValueStore, Persistence, PersistenceError};
use gridsly_system_rectangle_select::RectangleSelect;
use gridsly_system_tool_dispatch::{PointerRoute, ToolDispatcher};
use gridsly_world::{self as world, query, World};
use tracing::{debug, info, warn};

/// Zoom applied to newly opened sessions.
pub const DEFAULT_ZOOM: f32 = 0.5;
/// Increment used by zoom-in and zoom-out controls.
pub const ZOOM_STEP: f32 = 0.25;
/// Exclusive upper bound for the zoom level.
pub const MAX_ZOOM: f32 = 5.5;

/// Editing session bound to one storage backend.
#[derive(Debug)]
pub struct EditorSession<S> {
    world: World,
    dispatcher: ToolDispatcher,
    rectangle: RectangleSelect,
    creatures: CreatureEditor,
    persistence: Persistence,
    store: S,
    zoom: f32,
    label_origin: LabelOrigin,
}

impl<S: KeyValueStore> EditorSession<S> {
    /// Opens a session on the provided slot, loading its stored grid.
    pub fn open(store: S, slot: MapSlot) -> Self {
        let mut session = Self {
            world: World::new(),
            dispatcher: ToolDispatcher::new(),
            rectangle: RectangleSelect::new(),
            creatures: CreatureEditor::new(),
            persistence: Persistence::new(slot),
            store,
            zoom: DEFAULT_ZOOM,
            label_origin: LabelOrigin::default(),
        };
        session.load(slot);
        session
    }

    /// Authoritative grid.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Storage backend receiving the grid.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the session, returning its storage backend.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Tool currently governing pointer input.
    #[must_use]
    pub fn active_tool(&self) -> ToolKind {
        self.dispatcher.active_tool()
    }

    /// Slot currently being edited.
    #[must_use]
    pub fn active_slot(&self) -> MapSlot {
        self.persistence.active_slot()
    }

    /// Hash of the grid last stored in the active slot.
    #[must_use]
    pub fn stored_hash(&self) -> Option<&str> {
        self.persistence.recorded_hash()
    }

    /// Creature currently selected.
    #[must_use]
    pub fn selected_creature(&self) -> Option<PointId> {
        self.creatures.selected()
    }

    /// Reports whether the creature edit panel is open.
    #[must_use]
    pub fn is_edit_panel_open(&self) -> bool {
        self.creatures.is_panel_open()
    }

    /// Rectangle gesture preview, if one is in progress.
    #[must_use]
    pub fn rectangle_preview(&self) -> Option<GridRect> {
        self.rectangle.preview()
    }

    /// Current zoom level.
    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Origin used to label cells.
    #[must_use]
    pub fn label_origin(&self) -> LabelOrigin {
        self.label_origin
    }

    /// Switches the active tool, cancelling any gesture in progress.
    pub fn select_tool(&mut self, tool: ToolKind) {
        let mut commands = Vec::new();
        self.rectangle.cancel(&mut commands);
        self.creatures.close_panel();
        self.dispatcher.select_tool(tool);
        info!(tool = %tool, "tool selected");
        self.execute(commands);
        self.persist();
    }

    /// Handles a pointer press on the provided cell.
    pub fn pointer_down(&mut self, cell: Coord) {
        let mut commands = Vec::new();
        match self.dispatcher.pointer_down(cell, &mut commands) {
            PointerRoute::Ignored => {}
            PointerRoute::Applied => {
                if self.active_tool() == ToolKind::SingleSpace {
                    self.label_origin.include(cell);
                }
                self.execute(commands);
            }
            PointerRoute::RectangleSelect => {
                if let Some(rect) = self.rectangle.click(cell, &mut commands) {
                    self.label_origin.include(rect.origin());
                }
                self.execute(commands);
            }
            PointerRoute::PlaceCreature(kind) => {
                self.creature_click(CreatureTool::Place(kind), cell);
            }
            PointerRoute::Movement => self.creature_click(CreatureTool::Movement, cell),
        }
        self.persist();
    }

    /// Handles pointer motion over the provided cell.
    pub fn pointer_move(&mut self, cell: Coord) {
        let mut commands = Vec::new();
        if self.active_tool() == ToolKind::RectangleSpace {
            let _ = self.rectangle.hover(cell, &mut commands);
        } else if self.dispatcher.pointer_drag(cell, &mut commands)
            && self.active_tool() == ToolKind::SingleSpace
        {
            self.label_origin.include(cell);
        }
        if commands.is_empty() {
            return;
        }
        self.execute(commands);
        self.persist();
    }

    /// Handles the pointer button being released.
    pub fn pointer_up(&mut self) {
        self.dispatcher.pointer_up();
    }

    /// Places an NPC copy of the selected creature one cell to its right.
    pub fn duplicate_selected(&mut self) {
        let mut commands = Vec::new();
        let grid = &self.world;
        self.creatures
            .duplicate(|id| query::creature(grid, id), &mut commands);
        self.execute(commands);
        self.persist();
    }

    /// Applies attribute changes to the selected creature.
    pub fn edit_selected(&mut self, patch: EntityPatch) {
        let mut commands = Vec::new();
        self.creatures.edit(patch, &mut commands);
        self.execute(commands);
        self.persist();
    }

    /// Changes the footprint of the selected creature.
    pub fn resize_selected(&mut self, size: u32) {
        let mut commands = Vec::new();
        self.creatures.resize(size, &mut commands);
        self.execute(commands);
        self.persist();
    }

    /// Closes the creature edit panel.
    pub fn close_edit_panel(&mut self) {
        self.creatures.close_panel();
    }

    /// Adjusts the zoom by `delta` when the result stays within `(0, MAX_ZOOM)`.
    pub fn zoom_by(&mut self, delta: f32) -> bool {
        self.set_zoom(self.zoom + delta)
    }

    /// Sets the zoom when it lies within `(0, MAX_ZOOM)`.
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        if zoom > 0.0 && zoom < MAX_ZOOM {
            self.zoom = zoom;
            true
        } else {
            debug!(zoom, "zoom request out of range");
            false
        }
    }

    /// Persists the current slot, then loads the requested one. Selecting the
    /// active slot does nothing.
    pub fn switch_slot(&mut self, slot: MapSlot) {
        if slot == self.active_slot() {
            return;
        }
        self.persist();
        info!(slot = slot.get(), "switching map slot");
        self.load(slot);
    }

    /// Replaces the grid of the active slot.
    pub fn replace_grid(&mut self, snapshot: GridSnapshot) {
        self.reset_gestures();
        self.execute(vec![Command::RestoreSnapshot { snapshot }]);
        self.recompute_label_origin();
        self.persist();
    }

    /// Hashes pending changes and writes them to storage when they differ from
    /// the stored grid.
    pub fn flush(&mut self) -> Result<Option<CommitOutcome>, PersistenceError> {
        let grid = &self.world;
        let Some(job) = self.persistence.prepare(|| query::snapshot(grid)) else {
            return Ok(None);
        };
        let hashed = job.run()?;
        self.persistence.commit(hashed, &mut self.store).map(Some)
    }

    fn load(&mut self, slot: MapSlot) {
        let loaded = self.persistence.load_slot(slot, &self.store);
        self.replace_grid(loaded.snapshot);
    }

    fn reset_gestures(&mut self) {
        let mut discarded = Vec::new();
        self.rectangle.cancel(&mut discarded);
        self.dispatcher.pointer_up();
        self.creatures.close_panel();
    }

    fn recompute_label_origin(&mut self) {
        let mut origin = LabelOrigin::default();
        for point in query::layer(&self.world, LayerId::Spaces).points() {
            origin.include(point.cell);
        }
        self.label_origin = origin;
    }

    fn creature_click(&mut self, tool: CreatureTool, cell: Coord) {
        let mut commands = Vec::new();
        let grid = &self.world;
        self.creatures.click(
            tool,
            cell,
            |cell| query::find_cell(grid, LayerId::Players, cell).map(|point| point.id),
            &mut commands,
        );
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        let mut events: Vec<Event> = Vec::new();
        for command in commands {
            events.clear();
            world::apply(&mut self.world, command, &mut events);
            self.creatures.handle(&events);
            self.persistence.handle(&events);
        }
    }

    fn persist(&mut self) {
        if let Err(error) = self.flush() {
            warn!(error = %error, "failed to persist grid");
        }
    }
}
