//! Scene graph mirroring the board containment hierarchy.
//!
//! Every pickable entity owns one [`VisualHandle`]. Cells have no parent,
//! surfaces point at their cell and placed soldiers at their surface. The
//! graph is built once from the world and afterwards kept in sync purely from
//! the event stream, so backends never reach into world internals.

use std::collections::BTreeMap;

use glam::Vec3;
use tactics_core::{Appearance, BoardSize, CellCoord, Event, PickTarget, SoldierId, SurfaceId};
use tactics_world::{query, World, DEFAULT_SLAB_HEIGHT, SOLDIER_CLEARANCE};

/// Distance between neighbouring cell centers in presentation units.
pub const CELL_SIZE: f32 = 10.0;

/// Side length of a drawn cell or surface, leaving a one unit gutter.
pub const CELL_FOOTPRINT: f32 = CELL_SIZE - 1.0;

/// Presentation units per unit of surface height.
pub const LEVEL_HEIGHT: f32 = 2.0;

/// Thickness used for zero-height surfaces so they stay visible and pickable.
pub const MIN_SLAB_THICKNESS: f32 = 0.2;

/// Edge length of the box drawn for a soldier.
pub const SOLDIER_SIZE: f32 = 4.0;

/// Center of a cell on the board plane, with the board centered on the origin.
#[must_use]
pub fn cell_anchor(size: BoardSize, cell: CellCoord) -> Vec3 {
    let offset_x = cell.x() as f32 + 0.5 - size.x() as f32 / 2.0;
    let offset_y = cell.y() as f32 + 0.5 - size.y() as f32 / 2.0;
    Vec3::new(offset_x * CELL_SIZE, offset_y * CELL_SIZE, 0.0)
}

/// Vertical center and thickness of a slab spanning `bottom..=top`.
#[must_use]
pub fn slab_extent(top: i32, bottom: i32) -> (f32, f32) {
    let center = (top as f32 + bottom as f32) * 0.5 * LEVEL_HEIGHT;
    let thickness = ((top as f32 - bottom as f32) * LEVEL_HEIGHT).max(MIN_SLAB_THICKNESS);
    (center, thickness)
}

/// Presentation record of a single entity: an axis-aligned box plus its look.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualHandle {
    /// Box center in presentation space.
    pub center: Vec3,
    /// Box extent along each axis.
    pub size: Vec3,
    /// Material slot the backend maps onto a colour.
    pub appearance: Appearance,
    /// Containing entity, if any.
    pub parent: Option<PickTarget>,
}

impl VisualHandle {
    /// Lower corner of the box.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    /// Upper corner of the box.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    /// Whether backends draw the handle. Placeholder cells stay hidden.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.appearance != Appearance::Empty
    }
}

/// Visual handles of every cell, surface and placed soldier.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGraph {
    size: BoardSize,
    handles: BTreeMap<PickTarget, VisualHandle>,
}

impl SceneGraph {
    /// Builds handles for the current board and every placed soldier.
    #[must_use]
    pub fn from_world(world: &World) -> Self {
        let mut graph = Self {
            size: query::board(world).size(),
            handles: BTreeMap::new(),
        };
        graph.rebuild(world);
        graph
    }

    /// Extent of the mirrored board.
    #[must_use]
    pub const fn board_size(&self) -> BoardSize {
        self.size
    }

    /// Handle registered for `target`.
    #[must_use]
    pub fn handle(&self, target: PickTarget) -> Option<&VisualHandle> {
        self.handles.get(&target)
    }

    /// All handles ordered cells first, then surfaces, then soldiers.
    pub fn handles(&self) -> impl Iterator<Item = (PickTarget, &VisualHandle)> + '_ {
        self.handles.iter().map(|(target, handle)| (*target, handle))
    }

    /// Entities whose handle names `parent` as their container.
    pub fn children(&self, parent: PickTarget) -> impl Iterator<Item = PickTarget> + '_ {
        self.handles
            .iter()
            .filter(move |(_, handle)| handle.parent == Some(parent))
            .map(|(target, _)| *target)
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the graph holds no handles at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Applies a batch of world events.
    ///
    /// `world` must already reflect the batch; it is consulted when a load
    /// replaces the board and for the initial look of freshly created handles.
    pub fn apply_events(&mut self, events: &[Event], world: &World) {
        for event in events {
            self.apply_event(event, world);
        }
    }

    fn apply_event(&mut self, event: &Event, world: &World) {
        match event {
            Event::BoardLoaded { .. } => self.rebuild(world),
            Event::SurfaceAdded {
                cell,
                surface,
                top,
                bottom,
            } => {
                let appearance = query::appearance(world, PickTarget::Surface(*surface));
                self.insert_surface(*cell, *surface, *top, *bottom, appearance);
            }
            Event::SurfaceRemoved { surface, .. } => {
                let _ = self.handles.remove(&PickTarget::Surface(*surface));
            }
            Event::CellCleared { surfaces, .. } => {
                for surface in surfaces {
                    let _ = self.handles.remove(&PickTarget::Surface(*surface));
                }
            }
            Event::SurfaceReshaped {
                surface,
                top,
                bottom,
            } => {
                if let Some(handle) = self.handles.get_mut(&PickTarget::Surface(*surface)) {
                    let (center, thickness) = slab_extent(*top, *bottom);
                    handle.center.z = center;
                    handle.size.z = thickness;
                }
            }
            Event::SoldierPlaced {
                soldier,
                surface,
                cell,
                elevation,
            }
            | Event::SoldierMoved {
                soldier,
                to: surface,
                cell,
                elevation,
                ..
            } => {
                let appearance = self
                    .handles
                    .get(&PickTarget::Soldier(*soldier))
                    .map_or_else(
                        || query::appearance(world, PickTarget::Soldier(*soldier)),
                        |handle| handle.appearance,
                    );
                self.place_soldier(*soldier, *surface, *cell, *elevation, appearance);
            }
            Event::SoldierRepositioned { soldier, elevation } => {
                if let Some(handle) = self.handles.get_mut(&PickTarget::Soldier(*soldier)) {
                    handle.center.z = soldier_center_z(*elevation);
                }
            }
            Event::AppearanceChanged { target, appearance } => {
                match self.handles.get_mut(target) {
                    Some(handle) => handle.appearance = *appearance,
                    None => tracing::trace!(?target, "appearance change without a visual"),
                }
            }
            Event::SoldierRecruited { .. } | Event::CommandRejected { .. } => {}
        }
    }

    fn rebuild(&mut self, world: &World) {
        let board = query::board(world);
        self.size = board.size();
        self.handles.clear();

        let (cell_z, cell_thickness) = slab_extent(0, -DEFAULT_SLAB_HEIGHT);
        for cell in board.cells() {
            let coord = cell.coord();
            let target = PickTarget::Cell(coord);
            let mut center = cell_anchor(self.size, coord);
            center.z = cell_z;
            let _ = self.handles.insert(
                target,
                VisualHandle {
                    center,
                    size: Vec3::new(CELL_FOOTPRINT, CELL_FOOTPRINT, cell_thickness),
                    appearance: query::appearance(world, target),
                    parent: None,
                },
            );
            for surface in cell.surfaces() {
                if let Some(record) = board.surface(*surface) {
                    let appearance = query::appearance(world, PickTarget::Surface(*surface));
                    self.insert_surface(coord, *surface, record.top(), record.bottom(), appearance);
                }
            }
        }

        let battle = query::battle(world);
        for soldier in battle.soldiers() {
            if let Some(placement) = battle.placement_of(soldier) {
                let appearance = query::appearance(world, PickTarget::Soldier(soldier));
                self.place_soldier(
                    soldier,
                    placement.surface,
                    placement.cell,
                    placement.elevation,
                    appearance,
                );
            }
        }
        tracing::debug!(handles = self.handles.len(), "scene graph rebuilt");
    }

    fn insert_surface(
        &mut self,
        cell: CellCoord,
        surface: SurfaceId,
        top: i32,
        bottom: i32,
        appearance: Appearance,
    ) {
        let (center_z, thickness) = slab_extent(top, bottom);
        let mut center = cell_anchor(self.size, cell);
        center.z = center_z;
        let _ = self.handles.insert(
            PickTarget::Surface(surface),
            VisualHandle {
                center,
                size: Vec3::new(CELL_FOOTPRINT, CELL_FOOTPRINT, thickness),
                appearance,
                parent: Some(PickTarget::Cell(cell)),
            },
        );
    }

    fn place_soldier(
        &mut self,
        soldier: SoldierId,
        surface: SurfaceId,
        cell: CellCoord,
        elevation: i32,
        appearance: Appearance,
    ) {
        let mut center = cell_anchor(self.size, cell);
        center.z = soldier_center_z(elevation);
        let _ = self.handles.insert(
            PickTarget::Soldier(soldier),
            VisualHandle {
                center,
                size: Vec3::splat(SOLDIER_SIZE),
                appearance,
                parent: Some(PickTarget::Surface(surface)),
            },
        );
    }
}

// Soldiers stand on the surface top, inside the clearance band.
fn soldier_center_z(elevation: i32) -> f32 {
    elevation.saturating_sub(SOLDIER_CLEARANCE) as f32 * LEVEL_HEIGHT + SOLDIER_SIZE * 0.5
}
