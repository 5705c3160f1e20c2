#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Controller plumbing shared by the designer, battle and camera systems.
//!
//! Controllers translate discrete input into [`Command`] values. The
//! [`ControllerManager`] applies those commands to the world and feeds the
//! resulting events back to every controller until no new commands appear.

mod selector;

use tactics_core::{Command, Event, InputEvent, PickTarget, Picker, ViewState};
use tactics_world::{self as world, World};

pub use self::selector::{Selectable, Selector};

/// Upper bound on command/event rounds performed for a single input.
const MAX_SETTLE_ROUNDS: usize = 64;

/// Read-mostly view handed to controllers while they react.
pub struct ControlContext<'a> {
    world: &'a World,
    picker: &'a dyn Picker,
    view: &'a mut ViewState,
    commands: Vec<Command>,
}

impl<'a> ControlContext<'a> {
    /// Creates a context with an empty command queue.
    pub fn new(world: &'a World, picker: &'a dyn Picker, view: &'a mut ViewState) -> Self {
        Self {
            world,
            picker,
            view,
            commands: Vec::new(),
        }
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        self.world
    }

    /// Resolves normalized pointer coordinates to one of the candidates.
    #[must_use]
    pub fn pick(&self, x: f32, y: f32, candidates: &[PickTarget]) -> Option<PickTarget> {
        self.picker.pick(x, y, candidates)
    }

    /// Current view state.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &*self.view
    }

    /// Mutable view state for camera controls.
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut *self.view
    }

    /// Outgoing command queue.
    pub fn commands(&mut self) -> &mut Vec<Command> {
        &mut self.commands
    }

    /// Queues a command for the world.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

/// Input handler attached to the [`ControllerManager`].
pub trait Controller {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs once when the controller is attached.
    fn set_up(&mut self) {}

    /// Runs once when the controller is detached; may queue final commands.
    fn clean_up(&mut self, _out: &mut Vec<Command>) {}

    /// Reacts to a discrete input event.
    fn handle_input(&mut self, input: &InputEvent, context: &mut ControlContext<'_>);

    /// Reacts to events emitted by the world.
    fn observe(&mut self, _events: &[Event], _context: &mut ControlContext<'_>) {}
}

/// Handle identifying an attached controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControllerId(u32);

impl ControllerId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Owns the attached controllers and routes input through them.
#[derive(Default)]
pub struct ControllerManager {
    controllers: Vec<(ControllerId, Box<dyn Controller>)>,
    next_id: u32,
}

impl ControllerManager {
    /// Creates a manager without controllers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a controller and runs its set-up hook.
    pub fn add(&mut self, mut controller: Box<dyn Controller>) -> ControllerId {
        let id = ControllerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        controller.set_up();
        tracing::debug!(controller = controller.name(), id = id.get(), "controller attached");
        self.controllers.push((id, controller));
        id
    }

    /// Number of attached controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Reports whether no controller is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Detaches a controller, running its clean-up hook and applying what it queued.
    ///
    /// Unknown identifiers are ignored.
    pub fn remove(
        &mut self,
        id: ControllerId,
        world: &mut World,
        picker: &dyn Picker,
        view: &mut ViewState,
    ) -> Vec<Event> {
        self.detach(id, world, picker, view)
            .map(|(_, events)| events)
            .unwrap_or_default()
    }

    /// Detaches a controller like [`ControllerManager::remove`] and hands it
    /// back so it can be attached again later.
    ///
    /// Returns `None` for unknown identifiers.
    pub fn detach(
        &mut self,
        id: ControllerId,
        world: &mut World,
        picker: &dyn Picker,
        view: &mut ViewState,
    ) -> Option<(Box<dyn Controller>, Vec<Event>)> {
        let Some(position) = self
            .controllers
            .iter()
            .position(|(candidate, _)| *candidate == id)
        else {
            tracing::warn!(id = id.get(), "attempted to remove an unknown controller");
            return None;
        };
        let (_, mut controller) = self.controllers.remove(position);
        let mut commands = Vec::new();
        controller.clean_up(&mut commands);
        tracing::debug!(controller = controller.name(), id = id.get(), "controller detached");
        let events = self.apply(commands, world, picker, view);
        Some((controller, events))
    }

    /// Detaches every controller in attachment order.
    pub fn remove_all(
        &mut self,
        world: &mut World,
        picker: &dyn Picker,
        view: &mut ViewState,
    ) -> Vec<Event> {
        let mut commands = Vec::new();
        for (id, mut controller) in self.controllers.drain(..) {
            controller.clean_up(&mut commands);
            tracing::debug!(controller = controller.name(), id = id.get(), "controller detached");
        }
        self.apply(commands, world, picker, view)
    }

    /// Routes input to every controller and settles the resulting commands.
    ///
    /// Returns every event the world emitted, in order, for presentation.
    pub fn dispatch(
        &mut self,
        input: &InputEvent,
        world: &mut World,
        picker: &dyn Picker,
        view: &mut ViewState,
    ) -> Vec<Event> {
        let commands = {
            let mut context = ControlContext::new(world, picker, view);
            for (_, controller) in &mut self.controllers {
                controller.handle_input(input, &mut context);
            }
            context.into_commands()
        };
        self.apply(commands, world, picker, view)
    }

    /// Applies commands and lets controllers react until nothing new is queued.
    pub fn apply(
        &mut self,
        commands: Vec<Command>,
        world: &mut World,
        picker: &dyn Picker,
        view: &mut ViewState,
    ) -> Vec<Event> {
        let mut emitted = Vec::new();
        let mut pending = commands;

        for _ in 0..MAX_SETTLE_ROUNDS {
            if pending.is_empty() {
                return emitted;
            }

            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(world, command, &mut events);
            }
            if events.is_empty() {
                return emitted;
            }

            let mut context = ControlContext::new(world, picker, view);
            for (_, controller) in &mut self.controllers {
                controller.observe(&events, &mut context);
            }
            pending = context.into_commands();
            emitted.append(&mut events);
        }

        tracing::warn!(
            dropped = pending.len(),
            "controllers kept issuing commands; settling stopped"
        );
        emitted
    }
}
