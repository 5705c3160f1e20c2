//! Discrete input events delivered to controllers.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Keys the controllers recognise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A printable character key, stored lowercase.
    Character(char),
    /// The backspace key.
    Backspace,
    /// The delete key.
    Delete,
    /// The enter key.
    Enter,
    /// The escape key.
    Escape,
    /// The up arrow.
    ArrowUp,
    /// The down arrow.
    ArrowDown,
    /// The left arrow.
    ArrowLeft,
    /// The right arrow.
    ArrowRight,
}

impl Key {
    fn name(self) -> Option<&'static str> {
        match self {
            Self::Character(_) => None,
            Self::Backspace => Some("Backspace"),
            Self::Delete => Some("Delete"),
            Self::Enter => Some("Enter"),
            Self::Escape => Some("Escape"),
            Self::ArrowUp => Some("ArrowUp"),
            Self::ArrowDown => Some("ArrowDown"),
            Self::ArrowLeft => Some("ArrowLeft"),
            Self::ArrowRight => Some("ArrowRight"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.name()) {
            (_, Some(name)) => f.write_str(name),
            (Self::Character(character), None) => write!(f, "{character}"),
            (_, None) => Ok(()),
        }
    }
}

/// Modifier keys held while another key was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Modifiers {
    /// Either shift key.
    pub shift: bool,
    /// Either control key.
    pub ctrl: bool,
    /// Either alt key.
    pub alt: bool,
    /// Either meta/super key.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only shift held.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// A key together with the modifiers that must accompany it.
///
/// Chords are written as the key name followed by `+`-separated modifier
/// names, for example `n`, `Backspace` or `ArrowUp+shift`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyChord {
    key: Key,
    modifiers: Modifiers,
}

impl KeyChord {
    /// Creates a chord from a key and its modifiers.
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Creates a chord for a key pressed without modifiers.
    #[must_use]
    pub const fn bare(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// Key of the chord.
    #[must_use]
    pub const fn key(&self) -> Key {
        self.key
    }

    /// Modifiers of the chord.
    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        let flags = [
            (self.modifiers.shift, "shift"),
            (self.modifiers.ctrl, "ctrl"),
            (self.modifiers.alt, "alt"),
            (self.modifiers.meta, "meta"),
        ];
        for (held, name) in flags {
            if held {
                write!(f, "+{name}")?;
            }
        }
        Ok(())
    }
}

/// Errors raised while parsing a [`KeyChord`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyChordParseError {
    /// The chord string was empty.
    #[error("key chord was empty")]
    Empty,
    /// The key segment named no known key.
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    /// A modifier segment named no known modifier.
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
}

impl FromStr for KeyChord {
    type Err = KeyChordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(KeyChordParseError::Empty);
        }

        let mut segments = trimmed.split('+');
        let key_name = segments.next().ok_or(KeyChordParseError::Empty)?;
        let key = parse_key(key_name)?;

        let mut modifiers = Modifiers::NONE;
        for segment in segments {
            match segment.trim() {
                "shift" | "shiftKey" => modifiers.shift = true,
                "ctrl" | "ctrlKey" => modifiers.ctrl = true,
                "alt" | "altKey" => modifiers.alt = true,
                "meta" | "metaKey" => modifiers.meta = true,
                other => return Err(KeyChordParseError::UnknownModifier(other.to_owned())),
            }
        }

        Ok(Self::new(key, modifiers))
    }
}

fn parse_key(name: &str) -> Result<Key, KeyChordParseError> {
    let name = name.trim();
    let key = match name {
        "Backspace" => Key::Backspace,
        "Delete" => Key::Delete,
        "Enter" => Key::Enter,
        "Escape" => Key::Escape,
        "ArrowUp" => Key::ArrowUp,
        "ArrowDown" => Key::ArrowDown,
        "ArrowLeft" => Key::ArrowLeft,
        "ArrowRight" => Key::ArrowRight,
        _ => {
            let mut characters = name.chars();
            match (characters.next(), characters.next()) {
                (Some(character), None) => Key::Character(character.to_ascii_lowercase()),
                _ => return Err(KeyChordParseError::UnknownKey(name.to_owned())),
            }
        }
    };
    Ok(key)
}

/// Discrete input delivered by the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Primary pointer pressed at normalized device coordinates.
    PointerDown {
        /// Horizontal coordinate in `[-1, 1]`.
        x: f32,
        /// Vertical coordinate in `[-1, 1]`, pointing up.
        y: f32,
    },
    /// A key was pressed.
    KeyDown {
        /// Key that was pressed.
        key: Key,
        /// Modifiers held during the press.
        modifiers: Modifiers,
    },
    /// The wheel or trackpad scrolled.
    Wheel {
        /// Horizontal scroll delta.
        delta_x: f32,
        /// Vertical scroll delta.
        delta_y: f32,
    },
}

impl InputEvent {
    /// Key chord carried by a key press, if this event is one.
    #[must_use]
    pub fn chord(&self) -> Option<KeyChord> {
        match *self {
            Self::KeyDown { key, modifiers } => Some(KeyChord::new(key, modifiers)),
            _ => None,
        }
    }
}
