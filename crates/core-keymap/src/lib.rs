//! core-keymap: keyboard shortcut combos and the per-widget shortcut table.
//!
//! Design principles:
//! - Pure and deterministic: resolution depends only on the combo and the
//!   bindings registered so far.
//! - Registration is idempotent. Binding the same combo to the same command
//!   again is a no-op, so setup code can be re-entered without stacking
//!   duplicate handlers. Rebinding a combo to a different command replaces
//!   the previous binding.
//! - `CTRL_CMD` is a platform-neutral modifier: it matches either Ctrl or
//!   Meta (Cmd on macOS) at resolution time, mirroring how browser editors
//!   bind "save".

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct KeyMods: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
        const META = 0b0000_1000;
        /// Ctrl on Linux/Windows, Cmd on macOS. Only meaningful in bindings.
        const CTRL_CMD = 0b0001_0000;
    }
}

/// A key plus modifiers, e.g. `ctrl+s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: char,
    pub mods: KeyMods,
}

impl KeyCombo {
    pub fn new(key: char, mods: KeyMods) -> Self {
        Self {
            key: key.to_ascii_lowercase(),
            mods,
        }
    }

    /// The default save binding.
    pub fn save() -> Self {
        Self::new('s', KeyMods::CTRL_CMD)
    }

    /// Whether a pressed combo (concrete modifiers) triggers this binding.
    pub fn matches(&self, pressed: &KeyCombo) -> bool {
        if self.key != pressed.key {
            return false;
        }
        if self.mods.contains(KeyMods::CTRL_CMD) {
            let rest = self.mods - KeyMods::CTRL_CMD;
            let pressed_rest = pressed.mods - (KeyMods::CTRL | KeyMods::META | KeyMods::CTRL_CMD);
            let has_primary = pressed
                .mods
                .intersects(KeyMods::CTRL | KeyMods::META | KeyMods::CTRL_CMD);
            has_primary && rest == pressed_rest
        } else {
            self.mods == pressed.mods
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseComboError {
    #[error("empty key combo")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("invalid key `{0}`")]
    InvalidKey(String),
}

impl FromStr for KeyCombo {
    type Err = ParseComboError;

    /// Accepts `+`-separated tokens, modifiers first: `ctrl+s`, `mod+shift+s`,
    /// `cmd+s`. `mod` / `ctrlcmd` select the platform-neutral modifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseComboError::Empty);
        }
        let parts: SmallVec<[&str; 4]> = trimmed.split('+').map(str::trim).collect();
        let (key_part, mod_parts) = parts.split_last().ok_or(ParseComboError::Empty)?;
        let mut mods = KeyMods::empty();
        for m in mod_parts {
            mods |= match m.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyMods::CTRL,
                "alt" | "option" => KeyMods::ALT,
                "shift" => KeyMods::SHIFT,
                "meta" | "cmd" | "super" => KeyMods::META,
                "mod" | "ctrlcmd" => KeyMods::CTRL_CMD,
                other => return Err(ParseComboError::UnknownModifier(other.to_string())),
            };
        }
        let mut chars = key_part.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => Ok(KeyCombo::new(c, mods)),
            _ => Err(ParseComboError::InvalidKey(key_part.to_string())),
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (KeyMods::CTRL_CMD, "mod"),
            (KeyMods::CTRL, "ctrl"),
            (KeyMods::ALT, "alt"),
            (KeyMods::SHIFT, "shift"),
            (KeyMods::META, "cmd"),
        ];
        for (flag, name) in names {
            if self.mods.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

/// Commands a shortcut can trigger inside the editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutCommand {
    Save,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyBound,
    Replaced,
}

/// Small ordered table of shortcut bindings.
#[derive(Debug, Default, Clone)]
pub struct ShortcutMap {
    bindings: SmallVec<[(KeyCombo, ShortcutCommand); 4]>,
}

impl ShortcutMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, combo: KeyCombo, command: ShortcutCommand) -> Registration {
        if let Some(slot) = self.bindings.iter_mut().find(|(c, _)| *c == combo) {
            if slot.1 == command {
                trace!(target: "input.keymap", %combo, ?command, "shortcut_already_bound");
                return Registration::AlreadyBound;
            }
            debug!(target: "input.keymap", %combo, from = ?slot.1, to = ?command, "shortcut_rebound");
            slot.1 = command;
            return Registration::Replaced;
        }
        debug!(target: "input.keymap", %combo, ?command, "shortcut_bound");
        self.bindings.push((combo, command));
        Registration::Added
    }

    /// Resolve a pressed combo against the bindings (first match wins).
    pub fn resolve(&self, pressed: &KeyCombo) -> Option<ShortcutCommand> {
        self.bindings
            .iter()
            .find(|(combo, _)| combo.matches(pressed))
            .map(|(_, cmd)| *cmd)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
