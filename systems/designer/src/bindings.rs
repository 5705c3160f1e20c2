use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tactics_core::{Key, KeyChord, KeyChordParseError, Modifiers};
use thiserror::Error;

/// Editing operations the designer can bind to keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignerAction {
    /// Appends a surface to the selected cell.
    AddSurface,
    /// Removes the selected surface.
    RemoveSurface,
    /// Raises the top of the selected surface by one.
    IncrementHeight,
    /// Lowers the top of the selected surface by one.
    DecrementHeight,
    /// Moves the selected surface up by one.
    MoveSurfaceUp,
    /// Moves the selected surface down by one.
    MoveSurfaceDown,
    /// Drops every surface of the selected cell.
    ClearCell,
    /// Persists the board through the configured store.
    Save,
    /// Replaces the board with the one held by the configured store.
    Load,
}

impl DesignerAction {
    /// Every action, in key-help order.
    pub const ALL: [Self; 9] = [
        Self::AddSurface,
        Self::RemoveSurface,
        Self::IncrementHeight,
        Self::DecrementHeight,
        Self::MoveSurfaceUp,
        Self::MoveSurfaceDown,
        Self::ClearCell,
        Self::Save,
        Self::Load,
    ];
}

/// Errors raised while applying configured bindings.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A configured chord could not be parsed.
    #[error("invalid key chord '{chord}'")]
    InvalidChord {
        /// Chord text as written in the configuration.
        chord: String,
        /// Parse failure.
        #[source]
        source: KeyChordParseError,
    },
}

/// Maps key chords to designer actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    map: HashMap<KeyChord, DesignerAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let character = |c| KeyChord::bare(Key::Character(c));
        let map = [
            (character('n'), DesignerAction::AddSurface),
            (KeyChord::bare(Key::Backspace), DesignerAction::RemoveSurface),
            (
                KeyChord::new(Key::ArrowUp, Modifiers::SHIFT),
                DesignerAction::IncrementHeight,
            ),
            (
                KeyChord::new(Key::ArrowDown, Modifiers::SHIFT),
                DesignerAction::DecrementHeight,
            ),
            (KeyChord::bare(Key::ArrowUp), DesignerAction::MoveSurfaceUp),
            (KeyChord::bare(Key::ArrowDown), DesignerAction::MoveSurfaceDown),
            (character('x'), DesignerAction::ClearCell),
            (character('s'), DesignerAction::Save),
            (character('l'), DesignerAction::Load),
        ]
        .into_iter()
        .collect();
        Self { map }
    }
}

impl KeyBindings {
    /// Action bound to the chord, if any.
    #[must_use]
    pub fn action(&self, chord: KeyChord) -> Option<DesignerAction> {
        self.map.get(&chord).copied()
    }

    /// Binds a chord, returning the action it previously triggered.
    pub fn bind(&mut self, chord: KeyChord, action: DesignerAction) -> Option<DesignerAction> {
        self.map.insert(chord, action)
    }

    /// Applies `chord = action` overrides on top of the current table.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Result<Self, BindingError>
    where
        I: IntoIterator<Item = (&'a str, DesignerAction)>,
    {
        for (text, action) in overrides {
            let chord = text
                .parse::<KeyChord>()
                .map_err(|source| BindingError::InvalidChord {
                    chord: text.to_owned(),
                    source,
                })?;
            if let Some(previous) = self.bind(chord, action) {
                tracing::debug!(%chord, ?previous, ?action, "key binding overridden");
            }
        }
        Ok(self)
    }

    /// Chords that trigger the action, in display order.
    #[must_use]
    pub fn chords_for(&self, action: DesignerAction) -> Vec<KeyChord> {
        let mut chords: Vec<KeyChord> = self
            .map
            .iter()
            .filter(|(_, bound)| **bound == action)
            .map(|(chord, _)| *chord)
            .collect();
        chords.sort();
        chords
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn defaults_distinguish_shifted_arrows() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.action(KeyChord::new(Key::ArrowUp, Modifiers::SHIFT)),
            Some(DesignerAction::IncrementHeight)
        );
        assert_eq!(
            bindings.action(KeyChord::bare(Key::ArrowUp)),
            Some(DesignerAction::MoveSurfaceUp)
        );
        assert_eq!(
            bindings.action(KeyChord::new(Key::ArrowUp, Modifiers { ctrl: true, ..Modifiers::NONE })),
            None
        );
    }

    #[test]
    fn overrides_from_toml_extend_the_defaults() {
        let table: BTreeMap<String, DesignerAction> = toml::from_str(
            r#"
                "a" = "add_surface"
                "Delete" = "remove_surface"
                "n" = "clear_cell"
            "#,
        )
        .expect("valid bindings table");

        let bindings = KeyBindings::default()
            .with_overrides(table.iter().map(|(chord, action)| (chord.as_str(), *action)))
            .expect("all chords parse");

        assert_eq!(
            bindings.action(KeyChord::bare(Key::Character('a'))),
            Some(DesignerAction::AddSurface)
        );
        assert_eq!(
            bindings.action(KeyChord::bare(Key::Character('n'))),
            Some(DesignerAction::ClearCell)
        );
        assert_eq!(
            bindings.chords_for(DesignerAction::RemoveSurface),
            vec![KeyChord::bare(Key::Backspace), KeyChord::bare(Key::Delete)]
        );
    }

    #[test]
    fn every_action_has_a_default_chord() {
        let bindings = KeyBindings::default();
        for action in DesignerAction::ALL {
            assert!(
                !bindings.chords_for(action).is_empty(),
                "{action:?} is unreachable from the keyboard"
            );
        }
    }

    #[test]
    fn invalid_chords_are_reported() {
        let result = KeyBindings::default().with_overrides([("Hyper+q", DesignerAction::Save)]);
        assert!(matches!(
            result,
            Err(BindingError::InvalidChord { ref chord, .. }) if chord == "Hyper+q"
        ));
    }
}
