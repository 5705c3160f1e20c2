#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Board designer controller: picks cells and surfaces and edits their stacks.

mod bindings;

use tactics_core::{BoardSnapshot, CellCoord, Command, Event, InputEvent, PickTarget, SurfaceId};
use tactics_system_control::{ControlContext, Controller, Selector};
use tactics_world::query;

pub use self::bindings::{BindingError, DesignerAction, KeyBindings};

/// Persistence backend used by the save and load actions.
pub trait BoardStore {
    /// Persists the snapshot, replacing whatever was stored before.
    fn save(&mut self, snapshot: &BoardSnapshot) -> anyhow::Result<()>;

    /// Reads the most recently stored snapshot.
    fn load(&mut self) -> anyhow::Result<BoardSnapshot>;
}

/// Controller that edits the board layout.
pub struct BoardDesigner {
    bindings: KeyBindings,
    store: Option<Box<dyn BoardStore>>,
    cells: Selector<CellCoord>,
    surfaces: Selector<SurfaceId>,
    pending_surface: Option<CellCoord>,
}

impl Default for BoardDesigner {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl BoardDesigner {
    /// Creates a designer using the provided key bindings and no store.
    #[must_use]
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            store: None,
            cells: Selector::new(),
            surfaces: Selector::new(),
            pending_surface: None,
        }
    }

    /// Attaches the store used by the save and load actions.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn BoardStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Cell currently selected for editing.
    #[must_use]
    pub fn selected_cell(&self) -> Option<CellCoord> {
        self.cells.value()
    }

    /// Surface currently selected for editing.
    #[must_use]
    pub fn selected_surface(&self) -> Option<SurfaceId> {
        self.surfaces.value()
    }

    fn select_at(&mut self, x: f32, y: f32, context: &mut ControlContext<'_>) {
        let candidates = query::designer_assets(context.world());
        let picked = context.pick(x, y, &candidates);
        match picked {
            Some(PickTarget::Surface(surface)) => {
                let parent = query::surface(context.world(), surface).and_then(|s| s.parent());
                self.surfaces.select(Some(surface), context.commands());
                self.cells.select(parent, context.commands());
            }
            Some(PickTarget::Cell(cell)) => {
                self.surfaces.select(None, context.commands());
                self.cells.select(Some(cell), context.commands());
            }
            Some(PickTarget::Soldier(_)) | None => {}
        }
    }

    fn perform(&mut self, action: DesignerAction, context: &mut ControlContext<'_>) {
        tracing::debug!(?action, "designer action");
        match action {
            DesignerAction::AddSurface => {
                if let Some(cell) = self.cells.value() {
                    self.pending_surface = Some(cell);
                    context.submit(Command::NewSurface { cell });
                }
            }
            DesignerAction::RemoveSurface => {
                if let Some(surface) = self.surfaces.value() {
                    if let Some(cell) =
                        query::surface(context.world(), surface).and_then(|s| s.parent())
                    {
                        context.submit(Command::RemoveSurface { cell, surface });
                    }
                }
            }
            DesignerAction::IncrementHeight => self.edit_surface(context, |surface| {
                Command::AddSurfaceHeight { surface, delta: 1 }
            }),
            DesignerAction::DecrementHeight => self.edit_surface(context, |surface| {
                Command::AddSurfaceHeight { surface, delta: -1 }
            }),
            DesignerAction::MoveSurfaceUp => self.edit_surface(context, |surface| {
                Command::MoveSurface { surface, delta: 1 }
            }),
            DesignerAction::MoveSurfaceDown => self.edit_surface(context, |surface| {
                Command::MoveSurface { surface, delta: -1 }
            }),
            DesignerAction::ClearCell => {
                if let Some(cell) = self.cells.value() {
                    context.submit(Command::ClearCell { cell });
                }
            }
            DesignerAction::Save => self.save(context),
            DesignerAction::Load => self.load(context),
        }
    }

    fn edit_surface<F>(&self, context: &mut ControlContext<'_>, command: F)
    where
        F: FnOnce(SurfaceId) -> Command,
    {
        if let Some(surface) = self.surfaces.value() {
            context.submit(command(surface));
        }
    }

    fn save(&mut self, context: &ControlContext<'_>) {
        let Some(store) = self.store.as_mut() else {
            tracing::warn!("save requested without a board store");
            return;
        };
        match store.save(&query::board_snapshot(context.world())) {
            Ok(()) => tracing::info!("board saved"),
            Err(error) => {
                let reason = format!("{error:#}");
                tracing::warn!(%reason, "failed to save board");
            }
        }
    }

    fn load(&mut self, context: &mut ControlContext<'_>) {
        let Some(store) = self.store.as_mut() else {
            tracing::warn!("load requested without a board store");
            return;
        };
        match store.load() {
            Ok(snapshot) => context.submit(Command::LoadBoard { snapshot }),
            Err(error) => {
                let reason = format!("{error:#}");
                tracing::warn!(%reason, "failed to load board");
            }
        }
    }
}

impl Controller for BoardDesigner {
    fn name(&self) -> &'static str {
        "board-designer"
    }

    fn set_up(&mut self) {
        for action in DesignerAction::ALL {
            let chords = self.bindings.chords_for(action);
            if chords.is_empty() {
                tracing::warn!(?action, "designer action has no key binding");
                continue;
            }
            let chords: Vec<String> = chords.iter().map(ToString::to_string).collect();
            tracing::debug!(?action, chords = %chords.join(", "), "designer binding");
        }
    }

    fn clean_up(&mut self, out: &mut Vec<Command>) {
        self.surfaces.select(None, out);
        self.cells.select(None, out);
        self.pending_surface = None;
    }

    fn handle_input(&mut self, input: &InputEvent, context: &mut ControlContext<'_>) {
        match *input {
            InputEvent::PointerDown { x, y } => self.select_at(x, y, context),
            InputEvent::KeyDown { .. } => {
                if let Some(action) = input.chord().and_then(|chord| self.bindings.action(chord)) {
                    self.perform(action, context);
                }
            }
            InputEvent::Wheel { .. } => {}
        }
    }

    fn observe(&mut self, events: &[Event], context: &mut ControlContext<'_>) {
        for event in events {
            match event {
                Event::SurfaceAdded { cell, surface, .. } if self.pending_surface == Some(*cell) => {
                    self.pending_surface = None;
                    self.surfaces.select(Some(*surface), context.commands());
                }
                Event::SurfaceRemoved { surface, .. } => {
                    let _ = self.surfaces.release(*surface);
                }
                Event::CellCleared { surfaces, .. } => {
                    for surface in surfaces {
                        let _ = self.surfaces.release(*surface);
                    }
                }
                Event::BoardLoaded { .. } => {
                    self.surfaces.clear();
                    self.cells.clear();
                }
                _ => {}
            }
        }
        self.pending_surface = None;
    }
}
