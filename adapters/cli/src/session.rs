use clap::ValueEnum;
use tactics_core::{Character, Command, Event, InputEvent, Key, Modifiers, Picker, ViewState};
use tactics_rendering::{CameraRig, FrameInput, RayPicker, Scene};
use tactics_system_battle::BattleController;
use tactics_system_camera::CameraController;
use tactics_system_control::{Controller, ControllerId, ControllerManager};
use tactics_system_designer::{BoardDesigner, BoardStore, KeyBindings};
use tactics_world::{self as world, World};

/// Controllers active for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Mode {
    /// Edit the board layout.
    Designer,
    /// Drive soldiers across the board.
    Battle,
    /// Edit the board or drive soldiers, swapping between the two with `m`.
    All,
}

/// Swaps the designer and battle controllers in [`Mode::All`].
const SWITCH_KEY: Key = Key::Character('m');

impl Mode {
    pub(crate) const fn fights(self) -> bool {
        matches!(self, Self::Battle | Self::All)
    }
}

/// Authoritative world plus the controllers fed by the backend every frame.
///
/// Besides the camera, exactly one of the designer and battle controllers is
/// attached at a time so a key never edits the board and a soldier at once.
pub(crate) struct Session {
    world: World,
    controllers: ControllerManager,
    active: ControllerId,
    parked: Option<Box<dyn Controller>>,
}

impl Session {
    pub(crate) fn new(
        world: World,
        mode: Mode,
        bindings: KeyBindings,
        store: Box<dyn BoardStore>,
    ) -> Self {
        let mut controllers = ControllerManager::new();
        let _ = controllers.add(Box::new(CameraController::new()));
        let designer: Box<dyn Controller> =
            Box::new(BoardDesigner::new(bindings).with_store(store));
        let battle: Box<dyn Controller> = Box::new(BattleController::new());
        let (first, parked) = match mode {
            Mode::Designer => (designer, None),
            Mode::Battle => (battle, None),
            Mode::All => (designer, Some(battle)),
        };
        let active = controllers.add(first);
        tracing::debug!(?mode, controllers = controllers.len(), "session ready");
        Self {
            world,
            controllers,
            active,
            parked,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Recruits every character and drops each onto a random empty surface.
    pub(crate) fn deploy(&mut self, roster: &[Character]) -> Vec<Event> {
        let mut events = Vec::new();
        for character in roster {
            let first_new = events.len();
            world::apply(
                &mut self.world,
                Command::RecruitSoldier {
                    character: character.clone(),
                },
                &mut events,
            );
            let recruited = events[first_new..].iter().find_map(|event| match event {
                Event::SoldierRecruited { soldier } => Some(*soldier),
                _ => None,
            });
            if let Some(soldier) = recruited {
                world::apply(
                    &mut self.world,
                    Command::PlaceSoldierAtRandom { soldier },
                    &mut events,
                );
                tracing::info!(name = %character.name, ?soldier, "soldier deployed");
            }
        }
        events
    }

    /// Routes one frame of input through the controllers and mirrors the
    /// resulting events into the scene graph.
    pub(crate) fn handle_frame(&mut self, input: FrameInput, scene: &mut Scene) {
        let Scene { graph, view } = scene;
        for event in &input.events {
            let rig = match CameraRig::new(view, input.aspect_ratio) {
                Ok(rig) => rig,
                Err(error) => {
                    tracing::warn!(%error, "dropping frame input");
                    return;
                }
            };
            let events = {
                let picker = RayPicker::new(graph, rig);
                if is_switch(event) && self.parked.is_some() {
                    self.switch_controllers(&picker, view)
                } else {
                    self.controllers
                        .dispatch(event, &mut self.world, &picker, view)
                }
            };
            graph.apply_events(&events, &self.world);
        }
    }

    /// Detaches the active editing controller and attaches the parked one.
    fn switch_controllers(&mut self, picker: &dyn Picker, view: &mut ViewState) -> Vec<Event> {
        let Some(next) = self.parked.take() else {
            return Vec::new();
        };
        let Some((previous, events)) =
            self.controllers
                .detach(self.active, &mut self.world, picker, view)
        else {
            self.parked = Some(next);
            return Vec::new();
        };
        tracing::info!(from = previous.name(), to = next.name(), "controllers switched");
        self.active = self.controllers.add(next);
        self.parked = Some(previous);
        events
    }
}

fn is_switch(input: &InputEvent) -> bool {
    matches!(
        input,
        InputEvent::KeyDown { key, modifiers }
            if *key == SWITCH_KEY && *modifiers == Modifiers::NONE
    )
}
