#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Battle controller: selects soldiers and surfaces and steps soldiers across the grid.

use tactics_core::{
    Command, Direction, Event, InputEvent, Key, PickTarget, SoldierId, SurfaceId,
};
use tactics_system_control::{ControlContext, Controller, Selector};
use tactics_world::{query, World};

/// Maps arrow keys onto grid directions.
#[must_use]
pub const fn direction_for(key: Key) -> Option<Direction> {
    match key {
        Key::ArrowUp => Some(Direction::Up),
        Key::ArrowDown => Some(Direction::Down),
        Key::ArrowLeft => Some(Direction::Left),
        Key::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}

/// Surface a soldier would move onto when stepping in `direction`.
///
/// The destination is the first surface of the neighbouring cell; there is
/// none when the soldier is unplaced, the step leaves the board, or the
/// neighbouring cell is empty.
#[must_use]
pub fn step_target(world: &World, soldier: SoldierId, direction: Direction) -> Option<SurfaceId> {
    let cell = query::soldier_cell(world, soldier)?.step(direction);
    query::cell(world, cell)?.first_surface()
}

/// Controller driving soldiers during a battle.
#[derive(Debug, Default)]
pub struct BattleController {
    soldiers: Selector<SoldierId>,
    surfaces: Selector<SurfaceId>,
}

impl BattleController {
    /// Creates a controller with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Soldier currently receiving directional input.
    #[must_use]
    pub fn selected_soldier(&self) -> Option<SoldierId> {
        self.soldiers.value()
    }

    /// Surface currently selected.
    #[must_use]
    pub fn selected_surface(&self) -> Option<SurfaceId> {
        self.surfaces.value()
    }

    fn select_at(&mut self, x: f32, y: f32, context: &mut ControlContext<'_>) {
        let candidates = query::selectable_assets(context.world());
        match context.pick(x, y, &candidates) {
            Some(PickTarget::Surface(surface)) => {
                self.surfaces.select(Some(surface), context.commands());
            }
            Some(PickTarget::Soldier(soldier)) => {
                self.soldiers.select(Some(soldier), context.commands());
            }
            Some(PickTarget::Cell(_)) | None => {}
        }
    }

    fn press_arrow(&mut self, direction: Direction, context: &mut ControlContext<'_>) {
        let Some(soldier) = self.soldiers.value() else {
            return;
        };
        match step_target(context.world(), soldier, direction) {
            Some(surface) => context.submit(Command::MoveSoldier { soldier, surface }),
            None => tracing::debug!(?soldier, ?direction, "no surface to step onto"),
        }
    }
}

impl Controller for BattleController {
    fn name(&self) -> &'static str {
        "battle"
    }

    fn clean_up(&mut self, out: &mut Vec<Command>) {
        self.soldiers.select(None, out);
        self.surfaces.select(None, out);
    }

    fn handle_input(&mut self, input: &InputEvent, context: &mut ControlContext<'_>) {
        match *input {
            InputEvent::PointerDown { x, y } => self.select_at(x, y, context),
            InputEvent::KeyDown { key, .. } => {
                if let Some(direction) = direction_for(key) {
                    self.press_arrow(direction, context);
                }
            }
            InputEvent::Wheel { .. } => {}
        }
    }

    fn observe(&mut self, events: &[Event], _context: &mut ControlContext<'_>) {
        for event in events {
            match event {
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
                    self.soldiers.clear();
                }
                _ => {}
            }
        }
    }
}
