//! Roster of soldiers and their placement on the board.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use tactics_core::{BoardError, CellCoord, Character, PickTarget, SoldierId, SurfaceId};

use crate::board::{Board, Surface};

/// Vertical gap between a surface's top and the soldier standing on it.
pub const SOLDIER_CLEARANCE: i32 = 1;

/// Combat unit embodying a character.
#[derive(Clone, Debug, PartialEq)]
pub struct Soldier {
    character: Character,
    hp: f64,
    mp: u32,
    stamina: u32,
}

impl Soldier {
    /// Creates a soldier at full health.
    #[must_use]
    pub fn new(character: Character) -> Self {
        let hp = character.max_hp();
        Self {
            character,
            hp,
            mp: 0,
            stamina: 0,
        }
    }

    /// Character the soldier embodies.
    #[must_use]
    pub const fn character(&self) -> &Character {
        &self.character
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> f64 {
        self.hp
    }

    /// Current mana points.
    #[must_use]
    pub const fn mp(&self) -> u32 {
        self.mp
    }

    /// Current stamina.
    #[must_use]
    pub const fn stamina(&self) -> u32 {
        self.stamina
    }
}

/// Where a placed soldier stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoldierPlacement {
    /// Soldier being described.
    pub soldier: SoldierId,
    /// Surface the soldier occupies.
    pub surface: SurfaceId,
    /// Cell owning that surface.
    pub cell: CellCoord,
    /// Surface top plus [`SOLDIER_CLEARANCE`].
    pub elevation: i32,
}

/// Board plus the soldiers recruited for it.
///
/// Occupancy is kept as two maps that always mirror each other: a surface
/// holds at most one soldier and a soldier stands on at most one surface.
#[derive(Clone, Debug)]
pub struct Battle {
    board: Board,
    roster: BTreeMap<SoldierId, Soldier>,
    occupants: HashMap<SurfaceId, SoldierId>,
    positions: BTreeMap<SoldierId, SurfaceId>,
    next_soldier: u32,
}

impl Battle {
    /// Wraps a board with an empty roster.
    #[must_use]
    pub fn new(board: Board) -> Self {
        Self {
            board,
            roster: BTreeMap::new(),
            occupants: HashMap::new(),
            positions: BTreeMap::new(),
            next_soldier: 0,
        }
    }

    /// Board the battle is fought on.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access for edits that keep every surface in place.
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Swaps the board; every soldier becomes unplaced but stays recruited.
    pub(crate) fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.occupants.clear();
        self.positions.clear();
    }

    /// Adds a soldier to the roster and returns its identifier.
    pub fn recruit(&mut self, soldier: Soldier) -> SoldierId {
        let id = SoldierId::new(self.next_soldier);
        self.next_soldier = self.next_soldier.saturating_add(1);
        let _ = self.roster.insert(id, soldier);
        id
    }

    /// Looks up a recruited soldier.
    #[must_use]
    pub fn soldier(&self, id: SoldierId) -> Option<&Soldier> {
        self.roster.get(&id)
    }

    /// Every recruited soldier in identifier order.
    pub fn roster(&self) -> impl Iterator<Item = (SoldierId, &Soldier)> {
        self.roster.iter().map(|(id, soldier)| (*id, soldier))
    }

    /// Soldiers currently placed on the board, in identifier order.
    pub fn soldiers(&self) -> impl Iterator<Item = SoldierId> + '_ {
        self.positions.keys().copied()
    }

    /// Soldier standing on the surface, if any.
    #[must_use]
    pub fn occupant(&self, surface: SurfaceId) -> Option<SoldierId> {
        self.occupants.get(&surface).copied()
    }

    /// Surface the soldier stands on, if placed.
    #[must_use]
    pub fn surface_of(&self, soldier: SoldierId) -> Option<SurfaceId> {
        self.positions.get(&soldier).copied()
    }

    /// Full placement record of a placed soldier.
    #[must_use]
    pub fn placement_of(&self, soldier: SoldierId) -> Option<SoldierPlacement> {
        let surface = self.surface_of(soldier)?;
        let record = self.board.surface(surface)?;
        placement(soldier, record)
    }

    /// Cell owning the surface the soldier stands on.
    #[must_use]
    pub fn cell_of(&self, soldier: SoldierId) -> Option<CellCoord> {
        self.placement_of(soldier).map(|placement| placement.cell)
    }

    /// Entities a pointer may select: every surface, then every placed soldier.
    pub fn selectable_assets(&self) -> impl Iterator<Item = PickTarget> + '_ {
        self.board
            .surfaces()
            .map(|surface| PickTarget::Surface(surface.id()))
            .chain(self.soldiers().map(PickTarget::Soldier))
    }

    /// Uniformly chosen surface that no soldier occupies.
    pub fn random_empty_surface<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SurfaceId> {
        self.board
            .random_empty_surface(rng, |surface| self.occupants.contains_key(&surface))
    }

    /// Places a recruited soldier onto an unoccupied surface of the board.
    ///
    /// Placing a soldier on the surface it already occupies succeeds without
    /// changes.
    pub fn place_soldier(
        &mut self,
        soldier: SoldierId,
        surface: SurfaceId,
    ) -> Result<SoldierPlacement, BoardError> {
        self.require_recruited(soldier)?;
        let target = self.board_surface(surface)?;
        let placed = placement(soldier, target).ok_or(BoardError::NotFound {
            target: PickTarget::Surface(surface),
        })?;

        if let Some(current) = self.surface_of(soldier) {
            if current == surface {
                return Ok(placed);
            }
            return Err(BoardError::AlreadyPlaced {
                soldier,
                surface: current,
            });
        }
        if let Some(occupant) = self.occupant(surface) {
            return Err(BoardError::OccupiedSurface { surface, occupant });
        }

        let _ = self.occupants.insert(surface, soldier);
        let _ = self.positions.insert(soldier, surface);
        Ok(placed)
    }

    /// Places a recruited, unplaced soldier onto a uniformly chosen empty surface.
    ///
    /// The soldier is validated before `rng` is drawn from, so rejected
    /// placements leave the generator untouched. Returns `None` when every
    /// surface is taken.
    pub fn place_soldier_at_random<R: Rng + ?Sized>(
        &mut self,
        soldier: SoldierId,
        rng: &mut R,
    ) -> Result<Option<SoldierPlacement>, BoardError> {
        self.require_recruited(soldier)?;
        if let Some(surface) = self.surface_of(soldier) {
            return Err(BoardError::AlreadyPlaced { soldier, surface });
        }
        match self.random_empty_surface(rng) {
            Some(surface) => self.place_soldier(soldier, surface).map(Some),
            None => Ok(None),
        }
    }

    /// Moves a placed soldier onto another unoccupied surface.
    ///
    /// Returns the surface the soldier left together with its new placement.
    pub fn move_soldier(
        &mut self,
        soldier: SoldierId,
        surface: SurfaceId,
    ) -> Result<(SurfaceId, SoldierPlacement), BoardError> {
        self.require_recruited(soldier)?;
        let from = self
            .surface_of(soldier)
            .ok_or(BoardError::NotPlaced { soldier })?;
        let target = self.board_surface(surface)?;
        let placed = placement(soldier, target).ok_or(BoardError::NotFound {
            target: PickTarget::Surface(surface),
        })?;
        if let Some(occupant) = self.occupant(surface) {
            return Err(BoardError::OccupiedSurface { surface, occupant });
        }

        let _ = self.occupants.remove(&from);
        let _ = self.occupants.insert(surface, soldier);
        let _ = self.positions.insert(soldier, surface);
        Ok((from, placed))
    }

    /// Removes a surface from its cell unless a soldier stands on it.
    pub(crate) fn remove_surface(
        &mut self,
        cell: CellCoord,
        surface: SurfaceId,
    ) -> Result<Surface, BoardError> {
        if let Some(occupant) = self.occupant(surface) {
            return Err(BoardError::OccupiedSurface { surface, occupant });
        }
        self.board.remove_surface(cell, surface)
    }

    /// Clears a cell unless one of its surfaces is occupied.
    pub(crate) fn clear_cell(&mut self, cell: CellCoord) -> Result<Vec<SurfaceId>, BoardError> {
        let stack = self
            .board
            .cell_at(cell)
            .ok_or(BoardError::OutOfBounds { cell })?;
        if let Some((surface, occupant)) = stack
            .surfaces()
            .iter()
            .find_map(|surface| self.occupant(*surface).map(|occupant| (*surface, occupant)))
        {
            return Err(BoardError::OccupiedSurface { surface, occupant });
        }
        self.board.clear_cell(cell)
    }

    fn require_recruited(&self, soldier: SoldierId) -> Result<(), BoardError> {
        if self.roster.contains_key(&soldier) {
            Ok(())
        } else {
            Err(BoardError::NotFound {
                target: PickTarget::Soldier(soldier),
            })
        }
    }

    fn board_surface(&self, surface: SurfaceId) -> Result<&Surface, BoardError> {
        self.board
            .surface(surface)
            .filter(|record| record.parent().is_some())
            .ok_or(BoardError::NotFound {
                target: PickTarget::Surface(surface),
            })
    }
}

fn placement(soldier: SoldierId, surface: &Surface) -> Option<SoldierPlacement> {
    Some(SoldierPlacement {
        soldier,
        surface: surface.id(),
        cell: surface.parent()?,
        elevation: surface.top().saturating_add(SOLDIER_CLEARANCE),
    })
}
