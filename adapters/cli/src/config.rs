use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tactics_core::Character;
use tactics_system_designer::{BindingError, DesignerAction, KeyBindings};

/// Seed used when neither the command line nor the configuration names one.
pub(crate) const DEFAULT_SEED: u64 = 0x5eed_7ac7_1c50_0001;

/// Optional TOML configuration.
///
/// ```toml
/// seed = 42
/// window_title = "Skirmish"
///
/// [bindings]
/// "a" = "add_surface"
///
/// [[roster]]
/// name = "Kyle"
/// experience = 0
/// strength = 1
/// speed = 1
/// wisdom = 1
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TacticsConfig {
    pub(crate) seed: Option<u64>,
    pub(crate) window_title: String,
    pub(crate) bindings: BTreeMap<String, DesignerAction>,
    pub(crate) roster: Vec<Character>,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            seed: None,
            window_title: "Tactics".to_owned(),
            bindings: BTreeMap::new(),
            roster: vec![Character {
                name: "Kyle".to_owned(),
                experience: 0,
                strength: 1,
                speed: 1,
                wisdom: 1,
            }],
        }
    }
}

impl TacticsConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Default designer bindings with the configured overrides applied.
    pub(crate) fn key_bindings(&self) -> Result<KeyBindings, BindingError> {
        KeyBindings::default().with_overrides(
            self.bindings
                .iter()
                .map(|(chord, action)| (chord.as_str(), *action)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::{Key, KeyChord, Modifiers};

    #[test]
    fn empty_file_keeps_every_default() {
        let config: TacticsConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(config, TacticsConfig::default());
        assert_eq!(config.roster.len(), 1);
        assert_eq!(config.roster[0].name, "Kyle");
    }

    #[test]
    fn roster_and_bindings_come_from_toml() {
        let config: TacticsConfig = toml::from_str(
            r#"
                seed = 7

                [bindings]
                "Delete" = "remove_surface"
                "ArrowUp+shift" = "move_surface_up"

                [[roster]]
                name = "Ada"
                experience = 250
                strength = 3
                speed = 2
                wisdom = 4
            "#,
        )
        .expect("config parses");

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.roster.len(), 1);
        assert_eq!(config.roster[0].level(), 3);

        let bindings = config.key_bindings().expect("chords parse");
        assert_eq!(
            bindings.action(KeyChord::bare(Key::Delete)),
            Some(DesignerAction::RemoveSurface)
        );
        assert_eq!(
            bindings.action(KeyChord::new(Key::ArrowUp, Modifiers::SHIFT)),
            Some(DesignerAction::MoveSurfaceUp)
        );
    }

    #[test]
    fn unknown_keys_and_bad_chords_are_reported() {
        assert!(toml::from_str::<TacticsConfig>("colour = \"red\"").is_err());

        let config: TacticsConfig =
            toml::from_str("[bindings]\n\"Hyper+q\" = \"save\"").expect("table parses");
        assert!(config.key_bindings().is_err());
    }

    #[test]
    fn bundled_sample_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/tactics.toml");
        let config = TacticsConfig::load(&path).expect("sample config loads");

        assert_eq!(config.roster.len(), 2);
        assert!(config.key_bindings().is_ok());
    }
}
