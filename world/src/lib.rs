#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board and battle state for the tactics toolkit.

mod battle;
mod board;

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tactics_core::{Appearance, BoardError, BoardSize, Command, Event, PickTarget, SurfaceId};

pub use self::{
    battle::{Battle, Soldier, SoldierPlacement, SOLDIER_CLEARANCE},
    board::{Board, Cell, Surface, DEFAULT_SLAB_HEIGHT},
};

const DEFAULT_BOARD_SIZE: BoardSize = BoardSize::new(3, 3);
const DEFAULT_PLACEMENT_SEED: u64 = 0x5eed_7ac7_1c50_0001;

/// Represents the authoritative tactics world state.
#[derive(Debug)]
pub struct World {
    battle: Battle,
    selected: BTreeSet<PickTarget>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world holding a blank 3x3 board.
    #[must_use]
    pub fn new() -> Self {
        Self::with_board(Board::blank(DEFAULT_BOARD_SIZE), DEFAULT_PLACEMENT_SEED)
    }

    /// Creates a world around an existing board, seeding random placement.
    #[must_use]
    pub fn with_board(board: Board, seed: u64) -> Self {
        Self {
            battle: Battle::new(board),
            selected: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn contains(&self, target: PickTarget) -> bool {
        match target {
            PickTarget::Cell(cell) => self.battle.board().cell_at(cell).is_some(),
            PickTarget::Surface(surface) => self
                .battle
                .board()
                .surface(surface)
                .map_or(false, |record| record.parent().is_some()),
            PickTarget::Soldier(soldier) => self.battle.soldier(soldier).is_some(),
        }
    }

    fn appearance_of(&self, target: PickTarget) -> Appearance {
        if let PickTarget::Cell(cell) = target {
            let stacked = self
                .battle
                .board()
                .cell_at(cell)
                .map_or(false, Cell::has_surfaces);
            if stacked {
                return Appearance::Empty;
            }
        }
        if self.selected.contains(&target) {
            Appearance::Selected
        } else {
            Appearance::Default
        }
    }

    fn execute(&mut self, command: Command, out_events: &mut Vec<Event>) -> Result<(), BoardError> {
        match command {
            Command::LoadBoard { snapshot } => {
                let board = Board::from_snapshot(&snapshot)?;
                let size = board.size();
                self.battle.replace_board(board);
                self.selected.clear();
                tracing::info!(x = size.x(), y = size.y(), "board loaded");
                out_events.push(Event::BoardLoaded { size });
            }
            Command::NewSurface { cell } => {
                let surface = self.battle.board_mut().new_surface(cell)?;
                let (top, bottom) = self.bounds(surface);
                out_events.push(Event::SurfaceAdded {
                    cell,
                    surface,
                    top,
                    bottom,
                });
                let first = self
                    .battle
                    .board()
                    .cell_at(cell)
                    .map_or(false, |stack| stack.surfaces().len() == 1);
                if first {
                    self.push_appearance(PickTarget::Cell(cell), out_events);
                }
            }
            Command::RemoveSurface { cell, surface } => {
                let _ = self.battle.remove_surface(cell, surface)?;
                let _ = self.selected.remove(&PickTarget::Surface(surface));
                out_events.push(Event::SurfaceRemoved { cell, surface });
                let emptied = self
                    .battle
                    .board()
                    .cell_at(cell)
                    .map_or(false, |stack| !stack.has_surfaces());
                if emptied {
                    self.push_appearance(PickTarget::Cell(cell), out_events);
                }
            }
            Command::ClearCell { cell } => {
                let surfaces = self.battle.clear_cell(cell)?;
                for surface in &surfaces {
                    let _ = self.selected.remove(&PickTarget::Surface(*surface));
                }
                let dropped_any = !surfaces.is_empty();
                out_events.push(Event::CellCleared { cell, surfaces });
                if dropped_any {
                    self.push_appearance(PickTarget::Cell(cell), out_events);
                }
            }
            Command::SetSurfaceTop { surface, top } => {
                let _ = self.battle.board_mut().set_top(surface, top)?;
                self.push_reshape(surface, out_events);
            }
            Command::AddSurfaceHeight { surface, delta } => {
                let _ = self.battle.board_mut().add_height(surface, delta)?;
                self.push_reshape(surface, out_events);
            }
            Command::SetSurfacePosition { surface, bottom } => {
                let _ = self.battle.board_mut().set_position(surface, bottom)?;
                self.push_reshape(surface, out_events);
            }
            Command::MoveSurface { surface, delta } => {
                let _ = self.battle.board_mut().move_surface(surface, delta)?;
                self.push_reshape(surface, out_events);
            }
            Command::RecruitSoldier { character } => {
                let soldier = self.battle.recruit(Soldier::new(character));
                out_events.push(Event::SoldierRecruited { soldier });
            }
            Command::PlaceSoldier { soldier, surface } => {
                let placement = self.battle.place_soldier(soldier, surface)?;
                out_events.push(placed_event(placement));
            }
            Command::PlaceSoldierAtRandom { soldier } => {
                match self.battle.place_soldier_at_random(soldier, &mut self.rng)? {
                    Some(placement) => out_events.push(placed_event(placement)),
                    None => {
                        tracing::warn!(?soldier, "no empty surface left for random placement");
                    }
                }
            }
            Command::MoveSoldier { soldier, surface } => {
                let (from, placement) = self.battle.move_soldier(soldier, surface)?;
                out_events.push(Event::SoldierMoved {
                    soldier,
                    from,
                    to: placement.surface,
                    cell: placement.cell,
                    elevation: placement.elevation,
                });
            }
            Command::SetSelected { target, selected } => {
                if !self.contains(target) {
                    return Err(BoardError::NotFound { target });
                }
                let _ = if selected {
                    self.selected.insert(target)
                } else {
                    self.selected.remove(&target)
                };
                self.push_appearance(target, out_events);
            }
        }
        Ok(())
    }

    fn bounds(&self, surface: SurfaceId) -> (i32, i32) {
        self.battle
            .board()
            .surface(surface)
            .map_or((0, 0), |record| (record.top(), record.bottom()))
    }

    fn push_appearance(&self, target: PickTarget, out_events: &mut Vec<Event>) {
        out_events.push(Event::AppearanceChanged {
            target,
            appearance: self.appearance_of(target),
        });
    }

    fn push_reshape(&self, surface: SurfaceId, out_events: &mut Vec<Event>) {
        let (top, bottom) = self.bounds(surface);
        out_events.push(Event::SurfaceReshaped {
            surface,
            top,
            bottom,
        });
        if let Some(placement) = self
            .battle
            .occupant(surface)
            .and_then(|soldier| self.battle.placement_of(soldier))
        {
            out_events.push(Event::SoldierRepositioned {
                soldier: placement.soldier,
                elevation: placement.elevation,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn placed_event(placement: SoldierPlacement) -> Event {
    Event::SoldierPlaced {
        soldier: placement.soldier,
        surface: placement.surface,
        cell: placement.cell,
        elevation: placement.elevation,
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that violate a precondition leave the world untouched and are
/// reported as [`Event::CommandRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let mut emitted = Vec::new();
    match world.execute(command, &mut emitted) {
        Ok(()) => out_events.append(&mut emitted),
        Err(reason) => {
            tracing::debug!(%reason, "command rejected");
            out_events.push(Event::CommandRejected { reason });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Battle, Board, Cell, SoldierPlacement, Surface, World};
    use tactics_core::{Appearance, BoardSnapshot, CellCoord, PickTarget, SoldierId, SurfaceId};

    /// Provides read-only access to the battle and its roster.
    #[must_use]
    pub fn battle(world: &World) -> &Battle {
        &world.battle
    }

    /// Provides read-only access to the board.
    #[must_use]
    pub fn board(world: &World) -> &Board {
        world.battle.board()
    }

    /// Cell at the coordinate, or `None` outside the board.
    #[must_use]
    pub fn cell(world: &World, coord: CellCoord) -> Option<&Cell> {
        world.battle.board().cell_at(coord)
    }

    /// Surface with the identifier, if it is still stored.
    #[must_use]
    pub fn surface(world: &World, id: SurfaceId) -> Option<&Surface> {
        world.battle.board().surface(id)
    }

    /// Candidates the board designer picks among: every cell, then every surface.
    #[must_use]
    pub fn designer_assets(world: &World) -> Vec<PickTarget> {
        let board = world.battle.board();
        board
            .cells()
            .map(|cell| PickTarget::Cell(cell.coord()))
            .chain(board.surfaces().map(|surface| PickTarget::Surface(surface.id())))
            .collect()
    }

    /// Candidates the battle controller picks among.
    #[must_use]
    pub fn selectable_assets(world: &World) -> Vec<PickTarget> {
        world.battle.selectable_assets().collect()
    }

    /// Placement record of a soldier, if placed.
    #[must_use]
    pub fn soldier_placement(world: &World, soldier: SoldierId) -> Option<SoldierPlacement> {
        world.battle.placement_of(soldier)
    }

    /// Cell the soldier currently stands in, if placed.
    #[must_use]
    pub fn soldier_cell(world: &World, soldier: SoldierId) -> Option<CellCoord> {
        world.battle.cell_of(soldier)
    }

    /// Reports whether the entity is currently marked as selected.
    #[must_use]
    pub fn is_selected(world: &World, target: PickTarget) -> bool {
        world.selected.contains(&target)
    }

    /// Appearance the presentation should give the entity.
    #[must_use]
    pub fn appearance(world: &World, target: PickTarget) -> Appearance {
        world.appearance_of(target)
    }

    /// Captures the current layout in its persisted shape.
    #[must_use]
    pub fn board_snapshot(world: &World) -> BoardSnapshot {
        world.battle.board().to_snapshot()
    }
}
