#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tactics board designer and battle layer.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and controller systems. Controllers submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that
//! controllers and the presentation adapter consume to stay in sync.

mod input;
mod snapshot;
mod view;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::{
    input::{InputEvent, Key, KeyChord, KeyChordParseError, Modifiers},
    snapshot::{BoardSnapshot, CellSnapshot, SurfaceSnapshot},
    view::{CameraKind, ViewState, CAMERAS},
};

/// Location of a single grid cell expressed as `x` and `y` grid coordinates.
///
/// Coordinates are signed so that unit steps may leave the board; lookups
/// reject anything outside the board extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based index along the board's first axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based index along the board's second axis.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate translated by the provided offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Returns the neighbouring coordinate one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.unit_offset();
        self.offset(dx, dy)
    }
}

/// Fixed extent of a board measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    x: u32,
    y: u32,
}

impl BoardSize {
    /// Creates a new board extent.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Number of cells along the first axis.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Number of cells along the second axis.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Total number of cells contained in a board of this size.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.x) * u64::from(self.y);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether the coordinate lies within `[0, x) x [0, y)`.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let inside_x = u32::try_from(cell.x()).map_or(false, |x| x < self.x);
        let inside_y = u32::try_from(cell.y()).map_or(false, |y| y < self.y);
        inside_x && inside_y
    }

    /// Flat index of the cell, `x * size.y + y`, or `None` when out of bounds.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let x = usize::try_from(cell.x()).ok()?;
        let y = usize::try_from(cell.y()).ok()?;
        let height = usize::try_from(self.y).ok()?;
        Some(x * height + y)
    }

    /// Coordinate of the cell stored at the provided flat index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cell_count() || self.y == 0 {
            return None;
        }
        let height = usize::try_from(self.y).ok()?;
        let x = i32::try_from(index / height).ok()?;
        let y = i32::try_from(index % height).ok()?;
        Some(CellCoord::new(x, y))
    }
}

/// Unique identifier assigned to a surface by its board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(u32);

impl SurfaceId {
    /// Creates a new surface identifier with the provided numeric value.
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

/// Unique identifier assigned to a soldier by the battle roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoldierId(u32);

impl SoldierId {
    /// Creates a new soldier identifier with the provided numeric value.
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

/// Entity resolved by the picking collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PickTarget {
    /// A board cell.
    Cell(CellCoord),
    /// A surface stacked within a cell.
    Surface(SurfaceId),
    /// A soldier placed on the board.
    Soldier(SoldierId),
}

/// Visual state the presentation layer maps onto concrete materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Appearance {
    /// Regular, unselected look.
    #[default]
    Default,
    /// Highlighted because the entity is selected.
    Selected,
    /// Placeholder look of a cell whose surfaces carry the visuals.
    Empty,
}

/// Grid directions available to directional steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing `y`.
    Up,
    /// Movement toward decreasing `y`.
    Down,
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
}

impl Direction {
    /// Unit offset `(dx, dy)` applied in grid space.
    #[must_use]
    pub const fn unit_offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Identity and stat bag of a unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Accumulated experience points.
    pub experience: u32,
    /// Strength stat.
    pub strength: u32,
    /// Speed stat.
    pub speed: u32,
    /// Wisdom stat.
    pub wisdom: u32,
}

impl Character {
    /// Level derived from experience: one level per hundred points.
    #[must_use]
    pub const fn level(&self) -> u32 {
        1 + self.experience / 100
    }

    /// Maximum hit points derived from the current stats.
    #[must_use]
    pub fn max_hp(&self) -> f64 {
        f64::from(self.strength) * 50.0 + f64::from(self.experience) / 10.0
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the board with one reconstructed from a snapshot.
    LoadBoard {
        /// Persisted layout to reconstruct.
        snapshot: BoardSnapshot,
    },
    /// Appends a default surface to the top of a cell's stack.
    NewSurface {
        /// Cell receiving the surface.
        cell: CellCoord,
    },
    /// Removes a surface from the cell that owns it.
    RemoveSurface {
        /// Cell claimed to own the surface.
        cell: CellCoord,
        /// Surface to remove.
        surface: SurfaceId,
    },
    /// Drops every surface of a cell at once.
    ClearCell {
        /// Cell to reset.
        cell: CellCoord,
    },
    /// Sets the upper boundary of a surface.
    SetSurfaceTop {
        /// Surface to edit.
        surface: SurfaceId,
        /// New upper boundary.
        top: i32,
    },
    /// Grows or shrinks a surface by moving its upper boundary.
    AddSurfaceHeight {
        /// Surface to edit.
        surface: SurfaceId,
        /// Signed change applied to the upper boundary.
        delta: i32,
    },
    /// Moves a surface so that its lower boundary sits at `bottom`.
    SetSurfacePosition {
        /// Surface to edit.
        surface: SurfaceId,
        /// New lower boundary.
        bottom: i32,
    },
    /// Moves a surface vertically without changing its height.
    MoveSurface {
        /// Surface to edit.
        surface: SurfaceId,
        /// Signed vertical displacement.
        delta: i32,
    },
    /// Registers a new soldier built from the provided character.
    RecruitSoldier {
        /// Character the soldier embodies.
        character: Character,
    },
    /// Places a recruited soldier onto a surface.
    PlaceSoldier {
        /// Soldier to place.
        soldier: SoldierId,
        /// Surface receiving the soldier.
        surface: SurfaceId,
    },
    /// Places a recruited soldier onto a randomly chosen empty surface.
    PlaceSoldierAtRandom {
        /// Soldier to place.
        soldier: SoldierId,
    },
    /// Moves a placed soldier onto another surface.
    MoveSoldier {
        /// Soldier to move.
        soldier: SoldierId,
        /// Destination surface.
        surface: SurfaceId,
    },
    /// Marks an entity as selected or deselected.
    SetSelected {
        /// Entity whose selection state changes.
        target: PickTarget,
        /// Whether the entity is now selected.
        selected: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the board was replaced wholesale.
    BoardLoaded {
        /// Extent of the new board.
        size: BoardSize,
    },
    /// Confirms that a surface was appended to a cell.
    SurfaceAdded {
        /// Cell that owns the surface.
        cell: CellCoord,
        /// Identifier of the new surface.
        surface: SurfaceId,
        /// Upper boundary of the surface.
        top: i32,
        /// Lower boundary of the surface.
        bottom: i32,
    },
    /// Confirms that a surface was removed from its cell.
    SurfaceRemoved {
        /// Cell that owned the surface.
        cell: CellCoord,
        /// Identifier of the removed surface.
        surface: SurfaceId,
    },
    /// Reports new boundaries after a height or position edit.
    SurfaceReshaped {
        /// Identifier of the edited surface.
        surface: SurfaceId,
        /// Upper boundary after the edit.
        top: i32,
        /// Lower boundary after the edit.
        bottom: i32,
    },
    /// Confirms that every surface of a cell was dropped.
    CellCleared {
        /// Cell that was reset.
        cell: CellCoord,
        /// Surfaces that were dropped, in stack order.
        surfaces: Vec<SurfaceId>,
    },
    /// Confirms that a soldier joined the roster.
    SoldierRecruited {
        /// Identifier allocated to the soldier.
        soldier: SoldierId,
    },
    /// Confirms that a soldier was placed for the first time.
    SoldierPlaced {
        /// Soldier that was placed.
        soldier: SoldierId,
        /// Surface the soldier stands on.
        surface: SurfaceId,
        /// Cell owning that surface.
        cell: CellCoord,
        /// Vertical position of the soldier above the board.
        elevation: i32,
    },
    /// Confirms that a soldier moved between surfaces.
    SoldierMoved {
        /// Soldier that moved.
        soldier: SoldierId,
        /// Surface the soldier left.
        from: SurfaceId,
        /// Surface the soldier occupies now.
        to: SurfaceId,
        /// Cell owning the destination surface.
        cell: CellCoord,
        /// Vertical position of the soldier above the board.
        elevation: i32,
    },
    /// Reports that a soldier followed an edit of the surface beneath it.
    SoldierRepositioned {
        /// Soldier that was repositioned.
        soldier: SoldierId,
        /// Vertical position of the soldier above the board.
        elevation: i32,
    },
    /// Reports that an entity's visual state changed.
    AppearanceChanged {
        /// Entity whose appearance changed.
        target: PickTarget,
        /// Appearance the presentation layer should apply.
        appearance: Appearance,
    },
    /// Reports that a command violated a precondition and was ignored.
    CommandRejected {
        /// Precondition that failed.
        reason: BoardError,
    },
}

/// Precondition violations raised by board and battle operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BoardError {
    /// The surface already belongs to a cell.
    #[error("surface {surface:?} already belongs to a cell")]
    AlreadyParented {
        /// Surface that was re-parented.
        surface: SurfaceId,
    },
    /// The entity is not present in the container it was claimed to be in.
    #[error("{target:?} was not found")]
    NotFound {
        /// Entity that could not be located.
        target: PickTarget,
    },
    /// The surface is held by another soldier.
    #[error("surface {surface:?} is occupied by soldier {occupant:?}")]
    OccupiedSurface {
        /// Surface that is taken.
        surface: SurfaceId,
        /// Soldier standing on the surface.
        occupant: SoldierId,
    },
    /// The soldier must be placed before it can move.
    #[error("soldier {soldier:?} has not been placed")]
    NotPlaced {
        /// Soldier lacking a surface.
        soldier: SoldierId,
    },
    /// The soldier already stands on a different surface.
    #[error("soldier {soldier:?} is already placed on surface {surface:?}")]
    AlreadyPlaced {
        /// Soldier that is already placed.
        soldier: SoldierId,
        /// Surface the soldier currently occupies.
        surface: SurfaceId,
    },
    /// The grid coordinate lies outside the board extent.
    #[error("cell {cell:?} lies outside the board")]
    OutOfBounds {
        /// Offending coordinate.
        cell: CellCoord,
    },
    /// Deserialisation input was missing data or not rectangular.
    #[error("malformed board snapshot: {reason}")]
    MalformedSnapshot {
        /// Description of the defect.
        reason: String,
    },
    /// The edit would place the upper boundary below the lower one.
    #[error("surface {surface:?} would be inverted (top {top} below bottom {bottom})")]
    InvertedSurface {
        /// Surface being edited.
        surface: SurfaceId,
        /// Requested upper boundary.
        top: i32,
        /// Current lower boundary.
        bottom: i32,
    },
}

/// Resolves a normalized screen coordinate to one of the candidate entities.
///
/// Coordinates are normalized device coordinates in `[-1, 1]`, `y` pointing up.
/// Implementations return the nearest intersected candidate, if any.
pub trait Picker {
    /// Picks the entity under `(x, y)` among `candidates`.
    fn pick(&self, x: f32, y: f32, candidates: &[PickTarget]) -> Option<PickTarget>;
}
