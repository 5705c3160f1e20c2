use tactics_core::{
    BoardError, BoardSize, CellCoord, Character, Command, Direction, Event, InputEvent, Key,
    Modifiers, PickTarget, Picker, SoldierId, SurfaceId, ViewState,
};
use tactics_system_battle::{step_target, BattleController};
use tactics_system_control::ControllerManager;
use tactics_world::{self as world, query, Board, World};

struct FixedPicker(Option<PickTarget>);

impl Picker for FixedPicker {
    fn pick(&self, _x: f32, _y: f32, candidates: &[PickTarget]) -> Option<PickTarget> {
        self.0.filter(|target| candidates.contains(target))
    }
}

struct Harness {
    manager: ControllerManager,
    world: World,
    view: ViewState,
}

impl Harness {
    fn with_surfaces(cells: &[CellCoord]) -> (Self, Vec<SurfaceId>) {
        let mut board = Board::blank(BoardSize::new(3, 3));
        let surfaces = cells
            .iter()
            .map(|cell| board.new_surface(*cell).expect("cell inside board"))
            .collect();
        let mut manager = ControllerManager::new();
        let _ = manager.add(Box::new(BattleController::new()));
        let harness = Self {
            manager,
            world: World::with_board(board, 7),
            view: ViewState::default(),
        };
        (harness, surfaces)
    }

    fn recruit_onto(&mut self, surface: SurfaceId) -> SoldierId {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::RecruitSoldier {
                character: Character {
                    name: "Kyle".to_owned(),
                    experience: 0,
                    strength: 1,
                    speed: 1,
                    wisdom: 1,
                },
            },
            &mut events,
        );
        let soldier = events
            .iter()
            .find_map(|event| match event {
                Event::SoldierRecruited { soldier } => Some(*soldier),
                _ => None,
            })
            .expect("recruitment succeeds");
        world::apply(
            &mut self.world,
            Command::PlaceSoldier { soldier, surface },
            &mut events,
        );
        soldier
    }

    fn click(&mut self, target: PickTarget) -> Vec<Event> {
        self.manager.dispatch(
            &InputEvent::PointerDown { x: 0.1, y: -0.2 },
            &mut self.world,
            &FixedPicker(Some(target)),
            &mut self.view,
        )
    }

    fn arrow(&mut self, key: Key) -> Vec<Event> {
        self.manager.dispatch(
            &InputEvent::KeyDown {
                key,
                modifiers: Modifiers::NONE,
            },
            &mut self.world,
            &FixedPicker(None),
            &mut self.view,
        )
    }
}

#[test]
fn arrows_step_the_selected_soldier_onto_neighbouring_surfaces() {
    let (mut harness, surfaces) = Harness::with_surfaces(&[
        CellCoord::new(1, 1),
        CellCoord::new(1, 2),
        CellCoord::new(0, 2),
    ]);
    let soldier = harness.recruit_onto(surfaces[0]);
    let _ = harness.click(PickTarget::Soldier(soldier));

    let events = harness.arrow(Key::ArrowUp);
    assert!(
        events.iter().any(|event| matches!(
            event,
            Event::SoldierMoved { to, cell, .. } if *to == surfaces[1] && *cell == CellCoord::new(1, 2)
        )),
        "up increases y, got {events:?}"
    );

    let _ = harness.arrow(Key::ArrowLeft);
    assert_eq!(
        query::soldier_cell(&harness.world, soldier),
        Some(CellCoord::new(0, 2)),
        "left decreases x"
    );
}

#[test]
fn stepping_toward_an_empty_cell_leaves_the_soldier_in_place() {
    let mut board = Board::blank(BoardSize::new(3, 3));
    let center = board.cell_at(CellCoord::new(1, 1)).map(|cell| cell.coord());
    assert_eq!(center, Some(CellCoord::new(1, 1)));
    let surface = board
        .new_surface(CellCoord::new(1, 1))
        .expect("center inside board");
    let mut manager = ControllerManager::new();
    let _ = manager.add(Box::new(BattleController::new()));
    let mut harness = Harness {
        manager,
        world: World::with_board(board, 3),
        view: ViewState::default(),
    };

    assert_eq!(
        query::battle(&harness.world).random_empty_surface(&mut seeded_rng()),
        Some(surface),
        "the only surface is the only empty one"
    );
    let soldier = harness.recruit_onto(surface);
    assert_eq!(query::battle(&harness.world).occupant(surface), Some(soldier));
    let _ = harness.click(PickTarget::Soldier(soldier));

    let events = harness.arrow(Key::ArrowRight);

    assert!(
        events.is_empty(),
        "no surface at (2, 1), so nothing is issued, got {events:?}"
    );
    assert_eq!(
        query::soldier_cell(&harness.world, soldier),
        Some(CellCoord::new(1, 1))
    );
}

#[test]
fn stepping_off_the_board_is_ignored() {
    let (mut harness, surfaces) = Harness::with_surfaces(&[CellCoord::new(0, 0)]);
    let soldier = harness.recruit_onto(surfaces[0]);
    let _ = harness.click(PickTarget::Soldier(soldier));

    assert_eq!(step_target(&harness.world, soldier, Direction::Left), None);
    assert_eq!(step_target(&harness.world, soldier, Direction::Down), None);
    assert!(harness.arrow(Key::ArrowLeft).is_empty());
    assert!(harness.arrow(Key::ArrowDown).is_empty());
    assert_eq!(
        query::soldier_cell(&harness.world, soldier),
        Some(CellCoord::new(0, 0))
    );
}

#[test]
fn stepping_onto_an_occupied_surface_is_rejected() {
    let (mut harness, surfaces) =
        Harness::with_surfaces(&[CellCoord::new(1, 1), CellCoord::new(2, 1)]);
    let mover = harness.recruit_onto(surfaces[0]);
    let blocker = harness.recruit_onto(surfaces[1]);
    let _ = harness.click(PickTarget::Soldier(mover));

    let events = harness.arrow(Key::ArrowRight);

    assert_eq!(
        events,
        vec![Event::CommandRejected {
            reason: BoardError::OccupiedSurface {
                surface: surfaces[1],
                occupant: blocker
            }
        }]
    );
    assert_eq!(
        query::battle(&harness.world).surface_of(mover),
        Some(surfaces[0])
    );
}

#[test]
fn arrows_without_a_selected_soldier_do_nothing() {
    let (mut harness, surfaces) =
        Harness::with_surfaces(&[CellCoord::new(1, 1), CellCoord::new(1, 2)]);
    let soldier = harness.recruit_onto(surfaces[0]);
    let _ = harness.click(PickTarget::Surface(surfaces[1]));

    assert!(harness.arrow(Key::ArrowUp).is_empty());
    assert_eq!(
        query::soldier_cell(&harness.world, soldier),
        Some(CellCoord::new(1, 1))
    );
    assert!(query::is_selected(
        &harness.world,
        PickTarget::Surface(surfaces[1])
    ));
}

#[test]
fn cells_are_not_pickable_in_battle() {
    let (mut harness, _) = Harness::with_surfaces(&[CellCoord::new(1, 1)]);

    let events = harness.click(PickTarget::Cell(CellCoord::new(1, 1)));

    assert!(events.is_empty(), "cells are not battle candidates");
}

fn seeded_rng() -> rand_chacha::ChaCha8Rng {
    use rand::SeedableRng;
    rand_chacha::ChaCha8Rng::seed_from_u64(99)
}
