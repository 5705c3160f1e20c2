//! Grid of cells holding stacked surfaces.

use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};
use tactics_core::{
    BoardError, BoardSize, BoardSnapshot, CellCoord, CellSnapshot, PickTarget, SurfaceId,
    SurfaceSnapshot,
};

/// Height of a freshly created surface.
pub const DEFAULT_SLAB_HEIGHT: i32 = 1;

/// Occupiable slab stacked within a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    id: SurfaceId,
    parent: Option<CellCoord>,
    top: i32,
    bottom: i32,
}

impl Surface {
    /// Identifier allocated by the owning board.
    #[must_use]
    pub const fn id(&self) -> SurfaceId {
        self.id
    }

    /// Cell that owns the surface, `None` while detached.
    #[must_use]
    pub const fn parent(&self) -> Option<CellCoord> {
        self.parent
    }

    /// Upper boundary of the occupiable slab.
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.top
    }

    /// Lower boundary of the slab, its vertical offset.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Vertical extent, `top - bottom`.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.top - self.bottom
    }

    fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            top: self.top,
            bottom: self.bottom,
        }
    }
}

/// Stack of surfaces at one grid position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    coord: CellCoord,
    surfaces: Vec<SurfaceId>,
}

impl Cell {
    fn blank(coord: CellCoord) -> Self {
        Self {
            coord,
            surfaces: Vec::new(),
        }
    }

    /// Grid coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Surfaces in insertion order.
    #[must_use]
    pub fn surfaces(&self) -> &[SurfaceId] {
        &self.surfaces
    }

    /// Whether at least one surface is stacked here.
    #[must_use]
    pub fn has_surfaces(&self) -> bool {
        !self.surfaces.is_empty()
    }

    /// Surface inserted first, if any.
    #[must_use]
    pub fn first_surface(&self) -> Option<SurfaceId> {
        self.surfaces.first().copied()
    }
}

/// Authoritative grid of cells and the surfaces stacked on them.
#[derive(Clone, Debug)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Cell>,
    surfaces: HashMap<SurfaceId, Surface>,
    next_surface: u32,
}

impl Board {
    /// Creates a board of the given size with every cell empty.
    ///
    /// A size with no rows collapses to `0 x 0`, the only rowless extent the
    /// persisted layout can express.
    #[must_use]
    pub fn blank(size: BoardSize) -> Self {
        let size = if size.x() == 0 {
            BoardSize::new(0, 0)
        } else {
            size
        };
        let cells = (0..size.cell_count())
            .filter_map(|index| size.coord_of(index))
            .map(Cell::blank)
            .collect();
        Self {
            size,
            cells,
            surfaces: HashMap::new(),
            next_surface: 0,
        }
    }

    /// Reconstructs a board from a persisted snapshot.
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Result<Self, BoardError> {
        let size = snapshot.size()?;
        let mut board = Self::blank(size);

        for (x, column) in snapshot.cells.iter().enumerate() {
            for (y, cell) in column.iter().enumerate() {
                let coord = snapshot_coord(x, y)?;
                for surface in &cell.surfaces {
                    if surface.top < surface.bottom {
                        return Err(BoardError::MalformedSnapshot {
                            reason: format!(
                                "surface at ({x}, {y}) has top {} below bottom {}",
                                surface.top, surface.bottom
                            ),
                        });
                    }
                    let id = board.allocate(surface.top, surface.bottom);
                    board.attach(coord, id)?;
                }
            }
        }

        Ok(board)
    }

    /// Captures the layout as a persisted snapshot, `cells[x][y]`.
    #[must_use]
    pub fn to_snapshot(&self) -> BoardSnapshot {
        let height = usize::try_from(self.size.y()).unwrap_or(0);
        let cells = if height == 0 {
            vec![Vec::new(); usize::try_from(self.size.x()).unwrap_or(0)]
        } else {
            self.cells
                .chunks(height)
                .map(|column| {
                    column
                        .iter()
                        .map(|cell| CellSnapshot {
                            surfaces: cell
                                .surfaces
                                .iter()
                                .filter_map(|id| self.surfaces.get(id))
                                .map(Surface::snapshot)
                                .collect(),
                        })
                        .collect()
                })
                .collect()
        };
        BoardSnapshot { cells }
    }

    /// Extent of the board, fixed at creation.
    #[must_use]
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    /// Every cell ordered by `x`, then `y`.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Returns the cell at `coord`, or `None` outside the board.
    #[must_use]
    pub fn cell_at(&self, coord: CellCoord) -> Option<&Cell> {
        self.size
            .index_of(coord)
            .and_then(|index| self.cells.get(index))
    }

    /// Flat index of the cell, `x * size.y + y`.
    #[must_use]
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        self.size.index_of(coord)
    }

    /// Looks up a surface by identifier, including detached ones.
    #[must_use]
    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// Every surface on the board, in cell order then insertion order.
    ///
    /// The iterator is lazy and may be requested any number of times.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> + '_ {
        self.cells.iter().flat_map(move |cell| {
            cell.surfaces
                .iter()
                .filter_map(move |id| self.surfaces.get(id))
        })
    }

    /// Appends a default surface to the cell and returns its identifier.
    pub fn new_surface(&mut self, coord: CellCoord) -> Result<SurfaceId, BoardError> {
        let index = self.cell_index(coord)?;
        let id = self.allocate(0, -DEFAULT_SLAB_HEIGHT);
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.parent = Some(coord);
        }
        self.cells[index].surfaces.push(id);
        Ok(id)
    }

    /// Creates a surface that belongs to no cell yet.
    pub fn create_detached_surface(&mut self, top: i32, bottom: i32) -> Result<SurfaceId, BoardError> {
        let id = SurfaceId::new(self.next_surface);
        if top < bottom {
            return Err(BoardError::InvertedSurface {
                surface: id,
                top,
                bottom,
            });
        }
        Ok(self.allocate(top, bottom))
    }

    /// Inserts a detached surface on top of the cell's stack.
    pub fn add_surface(&mut self, coord: CellCoord, id: SurfaceId) -> Result<(), BoardError> {
        let _ = self.cell_index(coord)?;
        self.attach(coord, id)
    }

    /// Removes the surface from the cell, returning it.
    pub fn remove_surface(&mut self, coord: CellCoord, id: SurfaceId) -> Result<Surface, BoardError> {
        let index = self.cell_index(coord)?;
        let cell = &mut self.cells[index];
        let position = cell
            .surfaces
            .iter()
            .position(|candidate| *candidate == id)
            .ok_or(BoardError::NotFound {
                target: PickTarget::Surface(id),
            })?;
        let _ = cell.surfaces.remove(position);
        self.surfaces.remove(&id).ok_or(BoardError::NotFound {
            target: PickTarget::Surface(id),
        })
    }

    /// Drops every surface of the cell, returning their identifiers in stack order.
    pub fn clear_cell(&mut self, coord: CellCoord) -> Result<Vec<SurfaceId>, BoardError> {
        let index = self.cell_index(coord)?;
        let dropped = std::mem::take(&mut self.cells[index].surfaces);
        for id in &dropped {
            let _ = self.surfaces.remove(id);
        }
        Ok(dropped)
    }

    /// Sets the upper boundary; rejects a top below the bottom.
    pub fn set_top(&mut self, id: SurfaceId, top: i32) -> Result<&Surface, BoardError> {
        let surface = self.surface_mut(id)?;
        if top < surface.bottom {
            return Err(BoardError::InvertedSurface {
                surface: id,
                top,
                bottom: surface.bottom,
            });
        }
        surface.top = top;
        Ok(surface)
    }

    /// Grows (or shrinks, for negative deltas) the surface from its top.
    pub fn add_height(&mut self, id: SurfaceId, delta: i32) -> Result<&Surface, BoardError> {
        let top = self.surface_mut(id)?.top.saturating_add(delta);
        self.set_top(id, top)
    }

    /// Moves the slab so its bottom sits at `bottom`, keeping its height.
    pub fn set_position(&mut self, id: SurfaceId, bottom: i32) -> Result<&Surface, BoardError> {
        let surface = self.surface_mut(id)?;
        let height = surface.height();
        surface.bottom = bottom;
        surface.top = bottom.saturating_add(height);
        Ok(surface)
    }

    /// Moves the slab vertically by `delta`.
    pub fn move_surface(&mut self, id: SurfaceId, delta: i32) -> Result<&Surface, BoardError> {
        let bottom = self.surface_mut(id)?.bottom.saturating_add(delta);
        self.set_position(id, bottom)
    }

    /// Picks a uniformly shuffled surface for which `is_occupied` is false.
    ///
    /// Cells are visited in shuffled order and each cell's stack is shuffled
    /// in turn; the first unoccupied surface wins.
    pub fn random_empty_surface<R, F>(&self, rng: &mut R, is_occupied: F) -> Option<SurfaceId>
    where
        R: Rng + ?Sized,
        F: Fn(SurfaceId) -> bool,
    {
        let mut order: Vec<usize> = (0..self.cells.len()).collect();
        order.shuffle(rng);

        for index in order {
            let mut stack = self.cells[index].surfaces.clone();
            stack.shuffle(rng);
            if let Some(found) = stack.into_iter().find(|id| !is_occupied(*id)) {
                return Some(found);
            }
        }
        None
    }

    fn cell_index(&self, coord: CellCoord) -> Result<usize, BoardError> {
        self.size
            .index_of(coord)
            .ok_or(BoardError::OutOfBounds { cell: coord })
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut Surface, BoardError> {
        self.surfaces.get_mut(&id).ok_or(BoardError::NotFound {
            target: PickTarget::Surface(id),
        })
    }

    fn allocate(&mut self, top: i32, bottom: i32) -> SurfaceId {
        let id = SurfaceId::new(self.next_surface);
        self.next_surface = self.next_surface.saturating_add(1);
        let _ = self.surfaces.insert(
            id,
            Surface {
                id,
                parent: None,
                top,
                bottom,
            },
        );
        id
    }

    fn attach(&mut self, coord: CellCoord, id: SurfaceId) -> Result<(), BoardError> {
        let index = self.cell_index(coord)?;
        let surface = self.surface_mut(id)?;
        if surface.parent.is_some() {
            return Err(BoardError::AlreadyParented { surface: id });
        }
        surface.parent = Some(coord);
        self.cells[index].surfaces.push(id);
        Ok(())
    }
}

fn snapshot_coord(x: usize, y: usize) -> Result<CellCoord, BoardError> {
    let x = i32::try_from(x).map_err(|_| BoardError::MalformedSnapshot {
        reason: format!("row index {x} exceeds the grid range"),
    })?;
    let y = i32::try_from(y).map_err(|_| BoardError::MalformedSnapshot {
        reason: format!("column index {y} exceeds the grid range"),
    })?;
    Ok(CellCoord::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn three_by_three() -> Board {
        Board::blank(BoardSize::new(3, 3))
    }

    #[test]
    fn blank_board_holds_one_empty_cell_per_coordinate() {
        let board = Board::blank(BoardSize::new(2, 3));
        let coords: Vec<CellCoord> = board.cells().map(Cell::coord).collect();
        assert_eq!(
            coords,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(0, 2),
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
                CellCoord::new(1, 2),
            ]
        );
        assert!(board.cells().all(|cell| !cell.has_surfaces()));
    }

    #[test]
    fn rowless_boards_survive_a_snapshot_round_trip() {
        for size in [BoardSize::new(0, 3), BoardSize::new(0, 0), BoardSize::new(2, 0)] {
            let board = Board::blank(size);
            let restored = Board::from_snapshot(&board.to_snapshot()).expect("valid snapshot");
            assert_eq!(restored.size(), board.size(), "{size:?} changed on reload");
        }
        assert_eq!(Board::blank(BoardSize::new(0, 3)).size(), BoardSize::new(0, 0));
        assert_eq!(Board::blank(BoardSize::new(2, 0)).size(), BoardSize::new(2, 0));
    }

    #[test]
    fn new_surface_uses_default_slab_and_parent() {
        let mut board = three_by_three();
        let center = CellCoord::new(1, 1);
        let id = board.new_surface(center).expect("cell in bounds");

        let surface = board.surface(id).expect("surface stored");
        assert_eq!(surface.parent(), Some(center));
        assert_eq!(surface.top(), 0);
        assert_eq!(surface.bottom(), -DEFAULT_SLAB_HEIGHT);
        assert_eq!(surface.height(), DEFAULT_SLAB_HEIGHT);
        assert_eq!(board.cell_at(center).map(Cell::surfaces), Some(&[id][..]));
    }

    #[test]
    fn add_surface_rejects_already_parented_surfaces() {
        let mut board = three_by_three();
        let id = board.create_detached_surface(2, 0).expect("valid slab");
        assert_eq!(board.surface(id).and_then(Surface::parent), None);

        board
            .add_surface(CellCoord::new(0, 0), id)
            .expect("first insertion succeeds");
        assert_eq!(
            board.surface(id).and_then(Surface::parent),
            Some(CellCoord::new(0, 0))
        );

        for coord in [CellCoord::new(0, 0), CellCoord::new(2, 2)] {
            assert_eq!(
                board.add_surface(coord, id),
                Err(BoardError::AlreadyParented { surface: id })
            );
        }
        let occurrences = board.surfaces().filter(|surface| surface.id() == id).count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn remove_surface_twice_reports_not_found() {
        let mut board = three_by_three();
        let cell = CellCoord::new(2, 0);
        let id = board.new_surface(cell).expect("cell in bounds");

        let removed = board.remove_surface(cell, id).expect("surface present");
        assert_eq!(removed.id(), id);
        assert!(!board.cell_at(cell).expect("cell").has_surfaces());
        assert_eq!(
            board.remove_surface(cell, id),
            Err(BoardError::NotFound {
                target: PickTarget::Surface(id)
            })
        );
    }

    #[test]
    fn remove_surface_from_wrong_cell_is_rejected_without_side_effects() {
        let mut board = three_by_three();
        let id = board.new_surface(CellCoord::new(0, 0)).expect("cell in bounds");

        assert!(board.remove_surface(CellCoord::new(1, 0), id).is_err());
        assert!(board.surface(id).is_some());
        assert!(board
            .cell_at(CellCoord::new(0, 0))
            .expect("cell")
            .has_surfaces());
    }

    #[test]
    fn out_of_bounds_cells_are_rejected() {
        let mut board = three_by_three();
        assert!(board.cell_at(CellCoord::new(3, 0)).is_none());
        assert!(board.cell_at(CellCoord::new(0, -1)).is_none());
        assert_eq!(
            board.new_surface(CellCoord::new(-1, 1)),
            Err(BoardError::OutOfBounds {
                cell: CellCoord::new(-1, 1)
            })
        );
    }

    #[test]
    fn height_edits_move_top_only() {
        let mut board = three_by_three();
        let id = board.new_surface(CellCoord::new(0, 0)).expect("cell in bounds");

        let surface = board.add_height(id, 3).expect("grows");
        assert_eq!((surface.top(), surface.bottom()), (3, -1));

        let surface = board.set_top(id, -1).expect("zero height allowed");
        assert_eq!(surface.height(), 0);

        assert_eq!(
            board.add_height(id, -1),
            Err(BoardError::InvertedSurface {
                surface: id,
                top: -2,
                bottom: -1
            })
        );
        assert_eq!(board.surface(id).map(Surface::top), Some(-1));
    }

    #[test]
    fn position_edits_translate_the_whole_slab() {
        let mut board = three_by_three();
        let id = board.new_surface(CellCoord::new(0, 0)).expect("cell in bounds");
        let _ = board.add_height(id, 1).expect("grows");

        let surface = board.move_surface(id, 2).expect("moves");
        assert_eq!((surface.top(), surface.bottom()), (3, 1));

        let surface = board.set_position(id, -4).expect("moves");
        assert_eq!((surface.top(), surface.bottom()), (-2, -4));
        assert_eq!(surface.height(), 2);
    }

    #[test]
    fn surfaces_iterate_in_cell_then_insertion_order() {
        let mut board = three_by_three();
        let late = board.new_surface(CellCoord::new(2, 2)).expect("in bounds");
        let first = board.new_surface(CellCoord::new(0, 1)).expect("in bounds");
        let second = board.new_surface(CellCoord::new(0, 1)).expect("in bounds");

        let order: Vec<SurfaceId> = board.surfaces().map(Surface::id).collect();
        assert_eq!(order, vec![first, second, late]);
        let again: Vec<SurfaceId> = board.surfaces().map(Surface::id).collect();
        assert_eq!(order, again, "iteration must be restartable");
    }

    #[test]
    fn clear_cell_drops_the_whole_stack() {
        let mut board = three_by_three();
        let cell = CellCoord::new(1, 2);
        let a = board.new_surface(cell).expect("in bounds");
        let b = board.new_surface(cell).expect("in bounds");

        assert_eq!(board.clear_cell(cell), Ok(vec![a, b]));
        assert!(!board.cell_at(cell).expect("cell").has_surfaces());
        assert!(board.surface(a).is_none());
        assert_eq!(board.surfaces().count(), 0);
    }

    #[test]
    fn snapshot_round_trip_preserves_layout() {
        let mut board = Board::blank(BoardSize::new(2, 3));
        let a = board.new_surface(CellCoord::new(0, 2)).expect("in bounds");
        let _ = board.add_height(a, 4).expect("grows");
        let b = board.new_surface(CellCoord::new(0, 2)).expect("in bounds");
        let _ = board.move_surface(b, 6).expect("moves");
        let _ = board.new_surface(CellCoord::new(1, 0)).expect("in bounds");

        let snapshot = board.to_snapshot();
        assert_eq!(snapshot.cells.len(), 2);
        assert!(snapshot.cells.iter().all(|column| column.len() == 3));
        assert_eq!(
            snapshot.cells[0][2].surfaces,
            vec![
                SurfaceSnapshot { top: 4, bottom: -1 },
                SurfaceSnapshot { top: 6, bottom: 5 }
            ]
        );

        let restored = Board::from_snapshot(&snapshot).expect("well formed");
        assert_eq!(restored.size(), board.size());
        assert_eq!(restored.to_snapshot(), snapshot);
    }

    #[test]
    fn snapshot_with_inverted_surface_is_malformed() {
        let snapshot = BoardSnapshot {
            cells: vec![vec![CellSnapshot {
                surfaces: vec![SurfaceSnapshot { top: -3, bottom: 0 }],
            }]],
        };
        assert!(matches!(
            Board::from_snapshot(&snapshot),
            Err(BoardError::MalformedSnapshot { .. })
        ));
    }

    #[test]
    fn random_empty_surface_finds_the_only_candidate() {
        let mut board = three_by_three();
        let mut ids = Vec::new();
        for cell in [CellCoord::new(0, 0), CellCoord::new(1, 1), CellCoord::new(2, 1)] {
            ids.push(board.new_surface(cell).expect("in bounds"));
            ids.push(board.new_surface(cell).expect("in bounds"));
        }
        let free = ids[3];
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            assert_eq!(
                board.random_empty_surface(&mut rng, |id| id != free),
                Some(free)
            );
        }
        assert_eq!(board.random_empty_surface(&mut rng, |_| true), None);
    }

    #[test]
    fn random_empty_surface_reaches_every_cell() {
        let mut board = three_by_three();
        let ids: Vec<SurfaceId> = board
            .cells()
            .map(Cell::coord)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|coord| board.new_surface(coord).expect("in bounds"))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut hits: HashMap<SurfaceId, u32> = HashMap::new();

        for _ in 0..900 {
            let id = board
                .random_empty_surface(&mut rng, |_| false)
                .expect("all surfaces empty");
            *hits.entry(id).or_default() += 1;
        }

        for id in ids {
            let count = hits.get(&id).copied().unwrap_or(0);
            assert!(
                (40..=180).contains(&count),
                "surface {id:?} drawn {count} times out of 900"
            );
        }
    }
}
