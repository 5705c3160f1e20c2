use tactics_core::{CellCoord, Command, PickTarget, SoldierId, SurfaceId};

/// Entity whose selection state is mirrored in the world.
pub trait Selectable: Copy + PartialEq {
    /// Tagged reference used when talking to the world.
    fn target(&self) -> PickTarget;

    /// Requests that the entity be marked as selected.
    fn select(&self, out: &mut Vec<Command>) {
        out.push(Command::SetSelected {
            target: self.target(),
            selected: true,
        });
    }

    /// Requests that the entity be marked as deselected.
    fn deselect(&self, out: &mut Vec<Command>) {
        out.push(Command::SetSelected {
            target: self.target(),
            selected: false,
        });
    }
}

impl Selectable for CellCoord {
    fn target(&self) -> PickTarget {
        PickTarget::Cell(*self)
    }
}

impl Selectable for SurfaceId {
    fn target(&self) -> PickTarget {
        PickTarget::Surface(*self)
    }
}

impl Selectable for SoldierId {
    fn target(&self) -> PickTarget {
        PickTarget::Soldier(*self)
    }
}

impl Selectable for PickTarget {
    fn target(&self) -> PickTarget {
        *self
    }
}

/// Holds at most one selected value and fires its hooks on change.
#[derive(Clone, Debug)]
pub struct Selector<V> {
    value: Option<V>,
}

impl<V> Default for Selector<V> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<V: Selectable> Selector<V> {
    /// Creates an empty selector.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Currently selected value.
    #[must_use]
    pub fn value(&self) -> Option<V> {
        self.value
    }

    /// Replaces the selection.
    ///
    /// A previously held, different value is deselected first. A present new
    /// value is always selected, so re-selecting the current value re-asserts
    /// its state.
    pub fn select(&mut self, value: Option<V>, out: &mut Vec<Command>) {
        if let Some(old) = self.value {
            if Some(old) != value {
                old.deselect(out);
            }
        }
        if let Some(new) = value {
            new.select(out);
        }
        self.value = value;
    }

    /// Forgets `value` without firing hooks if it is the current selection.
    ///
    /// Returns whether the selection was dropped.
    pub fn release(&mut self, value: V) -> bool {
        if self.value == Some(value) {
            self.value = None;
            true
        } else {
            false
        }
    }

    /// Forgets the selection without firing hooks.
    pub fn clear(&mut self) {
        self.value = None;
    }
}
