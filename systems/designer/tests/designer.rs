use std::{cell::RefCell, rc::Rc};

use anyhow::anyhow;
use tactics_core::{
    Appearance, BoardSnapshot, CellCoord, Event, InputEvent, Key, Modifiers, PickTarget, Picker,
    SurfaceId, ViewState,
};
use tactics_system_control::ControllerManager;
use tactics_system_designer::{BoardDesigner, BoardStore, KeyBindings};
use tactics_world::{query, World};

/// Resolves every pointer press to a fixed entity when it is a candidate.
struct FixedPicker(Option<PickTarget>);

impl Picker for FixedPicker {
    fn pick(&self, _x: f32, _y: f32, candidates: &[PickTarget]) -> Option<PickTarget> {
        self.0.filter(|target| candidates.contains(target))
    }
}

#[derive(Clone, Default)]
struct MemoryStore(Rc<RefCell<Option<BoardSnapshot>>>);

impl BoardStore for MemoryStore {
    fn save(&mut self, snapshot: &BoardSnapshot) -> anyhow::Result<()> {
        *self.0.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&mut self) -> anyhow::Result<BoardSnapshot> {
        self.0
            .borrow()
            .clone()
            .ok_or_else(|| anyhow!("nothing saved yet"))
    }
}

struct Harness {
    manager: ControllerManager,
    world: World,
    view: ViewState,
    store: MemoryStore,
}

impl Harness {
    fn new() -> Self {
        let store = MemoryStore::default();
        let mut manager = ControllerManager::new();
        let designer = BoardDesigner::new(KeyBindings::default()).with_store(Box::new(store.clone()));
        let _ = manager.add(Box::new(designer));
        Self {
            manager,
            world: World::new(),
            view: ViewState::default(),
            store,
        }
    }

    fn click(&mut self, target: PickTarget) -> Vec<Event> {
        self.manager.dispatch(
            &InputEvent::PointerDown { x: 0.0, y: 0.0 },
            &mut self.world,
            &FixedPicker(Some(target)),
            &mut self.view,
        )
    }

    fn press(&mut self, key: Key, modifiers: Modifiers) -> Vec<Event> {
        self.manager.dispatch(
            &InputEvent::KeyDown { key, modifiers },
            &mut self.world,
            &FixedPicker(None),
            &mut self.view,
        )
    }

    fn surfaces_in(&self, cell: CellCoord) -> Vec<SurfaceId> {
        query::cell(&self.world, cell)
            .map(|stack| stack.surfaces().to_vec())
            .unwrap_or_default()
    }
}

#[test]
fn adding_a_surface_selects_it() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(1, 1);

    let _ = harness.click(PickTarget::Cell(cell));
    assert!(query::is_selected(&harness.world, PickTarget::Cell(cell)));

    let events = harness.press(Key::Character('n'), Modifiers::NONE);

    let surfaces = harness.surfaces_in(cell);
    assert_eq!(surfaces.len(), 1, "one surface added to the selected cell");
    assert!(
        events.contains(&Event::AppearanceChanged {
            target: PickTarget::Surface(surfaces[0]),
            appearance: Appearance::Selected,
        }),
        "new surface must be highlighted, got {events:?}"
    );
}

#[test]
fn keys_without_a_selection_do_nothing() {
    let mut harness = Harness::new();

    for key in [Key::Character('n'), Key::Backspace, Key::ArrowUp, Key::Character('x')] {
        let events = harness.press(key, Modifiers::NONE);
        assert!(events.is_empty(), "{key} without selection emitted {events:?}");
    }
    assert_eq!(query::board(&harness.world).surfaces().count(), 0);
}

#[test]
fn height_and_position_keys_edit_the_selected_surface() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(0, 2);
    let _ = harness.click(PickTarget::Cell(cell));
    let _ = harness.press(Key::Character('n'), Modifiers::NONE);
    let surface = harness.surfaces_in(cell)[0];

    let _ = harness.press(Key::ArrowUp, Modifiers::SHIFT);
    let _ = harness.press(Key::ArrowUp, Modifiers::SHIFT);
    let _ = harness.press(Key::ArrowDown, Modifiers::SHIFT);
    let record = query::surface(&harness.world, surface).expect("surface exists");
    assert_eq!((record.top(), record.bottom()), (1, -1), "shift+arrows change height");

    let _ = harness.press(Key::ArrowUp, Modifiers::NONE);
    let record = query::surface(&harness.world, surface).expect("surface exists");
    assert_eq!((record.top(), record.bottom()), (2, 0), "bare arrows move the slab");

    let _ = harness.press(Key::ArrowDown, Modifiers::NONE);
    let _ = harness.press(Key::ArrowDown, Modifiers::NONE);
    let record = query::surface(&harness.world, surface).expect("surface exists");
    assert_eq!((record.top(), record.bottom()), (0, -2));
}

#[test]
fn shrinking_below_zero_height_is_rejected() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(2, 2);
    let _ = harness.click(PickTarget::Cell(cell));
    let _ = harness.press(Key::Character('n'), Modifiers::NONE);

    let _ = harness.press(Key::ArrowDown, Modifiers::SHIFT);
    let events = harness.press(Key::ArrowDown, Modifiers::SHIFT);

    assert!(
        matches!(events.as_slice(), [Event::CommandRejected { .. }]),
        "inverting the slab must be refused, got {events:?}"
    );
    let surface = harness.surfaces_in(cell)[0];
    let record = query::surface(&harness.world, surface).expect("surface exists");
    assert_eq!(record.height(), 0);
}

#[test]
fn removing_the_selected_surface_releases_it() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(1, 0);
    let _ = harness.click(PickTarget::Cell(cell));
    let _ = harness.press(Key::Character('n'), Modifiers::NONE);
    let _ = harness.press(Key::Character('n'), Modifiers::NONE);
    let surfaces = harness.surfaces_in(cell);
    assert_eq!(surfaces.len(), 2);

    let _ = harness.click(PickTarget::Surface(surfaces[0]));
    let events = harness.press(Key::Backspace, Modifiers::NONE);
    assert!(events.contains(&Event::SurfaceRemoved {
        cell,
        surface: surfaces[0]
    }));
    assert_eq!(harness.surfaces_in(cell), vec![surfaces[1]]);

    let events = harness.press(Key::Backspace, Modifiers::NONE);
    assert!(
        events.is_empty(),
        "removed surface is no longer selected, got {events:?}"
    );
}

#[test]
fn picking_a_surface_also_selects_its_cell() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(2, 1);
    let _ = harness.click(PickTarget::Cell(cell));
    let _ = harness.press(Key::Character('n'), Modifiers::NONE);
    let surface = harness.surfaces_in(cell)[0];
    let _ = harness.click(PickTarget::Cell(CellCoord::new(0, 0)));
    assert!(!query::is_selected(&harness.world, PickTarget::Surface(surface)));

    let _ = harness.click(PickTarget::Surface(surface));

    assert!(query::is_selected(&harness.world, PickTarget::Surface(surface)));
    assert!(query::is_selected(&harness.world, PickTarget::Cell(cell)));
    assert!(!query::is_selected(
        &harness.world,
        PickTarget::Cell(CellCoord::new(0, 0))
    ));
}

#[test]
fn clear_key_drops_the_whole_stack() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(1, 2);
    let _ = harness.click(PickTarget::Cell(cell));
    for _ in 0..3 {
        let _ = harness.press(Key::Character('n'), Modifiers::NONE);
    }

    let _ = harness.press(Key::Character('x'), Modifiers::NONE);

    assert!(harness.surfaces_in(cell).is_empty());
    assert_eq!(
        query::appearance(&harness.world, PickTarget::Cell(cell)),
        Appearance::Selected,
        "an emptied cell shows its own selection again"
    );
}

#[test]
fn save_then_load_restores_the_layout() {
    let mut harness = Harness::new();
    let cell = CellCoord::new(0, 1);
    let _ = harness.click(PickTarget::Cell(cell));
    let _ = harness.press(Key::Character('n'), Modifiers::NONE);
    let _ = harness.press(Key::ArrowUp, Modifiers::SHIFT);

    let events = harness.press(Key::Character('s'), Modifiers::NONE);
    assert!(events.is_empty(), "saving does not touch the world");
    let saved = harness
        .store
        .0
        .borrow()
        .clone()
        .expect("snapshot stored");
    assert_eq!(saved, query::board_snapshot(&harness.world));

    let _ = harness.press(Key::Character('x'), Modifiers::NONE);
    assert!(harness.surfaces_in(cell).is_empty());

    let events = harness.press(Key::Character('l'), Modifiers::NONE);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::BoardLoaded { .. })));
    assert_eq!(query::board_snapshot(&harness.world), saved);

    let follow_up = harness.press(Key::Character('n'), Modifiers::NONE);
    assert!(
        follow_up.is_empty(),
        "loading forgets the selected cell, got {follow_up:?}"
    );
}
