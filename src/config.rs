//! Clicker configuration.
//!
//! Everything here lives in memory only. Every launch starts from
//! [`Settings::default`], optionally overridden by command line [`Options`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{ClickerError, Result};
use crate::hotkey::ComboPolicy;

/// Clicks per second, always within [`Rate::MIN`]..=[`Rate::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(u32);

impl Rate {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    pub fn new(cps: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&cps) {
            Ok(Self(cps))
        } else {
            Err(ClickerError::RateOutOfRange {
                value: cps,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Delay between two clicks: `1 / cps` seconds.
    pub fn interval(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0 as f64)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum MouseButton {
    /// Primary button.
    #[default]
    Left,
    /// Secondary button.
    Right,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
        }
    }
}

impl FromStr for MouseButton {
    type Err = ClickerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" | "primary" => Ok(MouseButton::Left),
            "right" | "secondary" => Ok(MouseButton::Right),
            _ => Err(ClickerError::UnknownButton(s.to_string())),
        }
    }
}

/// Trigger that toggles the clicker from anywhere on the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Hotkey {
    /// Alt (Option on macOS) held together with `-`.
    #[default]
    AltMinus,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl Hotkey {
    pub const ALL: [Hotkey; 8] = [
        Hotkey::AltMinus,
        Hotkey::F6,
        Hotkey::F7,
        Hotkey::F8,
        Hotkey::F9,
        Hotkey::F10,
        Hotkey::F11,
        Hotkey::F12,
    ];

    /// Function key number for single-key triggers, `None` for the combo.
    pub fn function_key(self) -> Option<u8> {
        match self {
            Hotkey::AltMinus => None,
            Hotkey::F6 => Some(6),
            Hotkey::F7 => Some(7),
            Hotkey::F8 => Some(8),
            Hotkey::F9 => Some(9),
            Hotkey::F10 => Some(10),
            Hotkey::F11 => Some(11),
            Hotkey::F12 => Some(12),
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function_key() {
            None if cfg!(target_os = "macos") => write!(f, "Option + -"),
            None => write!(f, "Alt + -"),
            Some(n) => write!(f, "F{n}"),
        }
    }
}

impl FromStr for Hotkey {
    type Err = ClickerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "alt+-" | "option+-" => Ok(Hotkey::AltMinus),
            "f6" => Ok(Hotkey::F6),
            "f7" => Ok(Hotkey::F7),
            "f8" => Ok(Hotkey::F8),
            "f9" => Ok(Hotkey::F9),
            "f10" => Ok(Hotkey::F10),
            "f11" => Ok(Hotkey::F11),
            "f12" => Ok(Hotkey::F12),
            _ => Err(ClickerError::UnknownHotkey(s.to_string())),
        }
    }
}

/// Snapshot of the user-editable configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub rate: Rate,
    pub button: MouseButton,
    pub hold_mode: bool,
    pub hotkey: Hotkey,
}

/// Command line options. They only change the values a session starts with.
#[derive(Parser, Debug)]
#[command(name = "cps-clicker", version, about = "Mouse auto clicker toggled by a global hotkey")]
pub struct Options {
    /// Clicks per second
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub cps: u32,

    /// Mouse button to click
    #[arg(long, value_enum, default_value_t = MouseButton::Left)]
    pub button: MouseButton,

    /// Hold the button down instead of clicking
    #[arg(long)]
    pub hold: bool,

    /// Toggle hotkey: alt+-, f6, f7, f8, f9, f10, f11 or f12
    #[arg(long, default_value = "alt+-")]
    pub hotkey: Hotkey,

    /// Fire the combo hotkey only when `-` itself goes down
    #[arg(long)]
    pub strict_combo: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Options {
    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            rate: Rate::new(self.cps)?,
            button: self.button,
            hold_mode: self.hold,
            hotkey: self.hotkey,
        })
    }

    pub fn combo_policy(&self) -> ComboPolicy {
        if self.strict_combo {
            ComboPolicy::LiteralKeyOnly
        } else {
            ComboPolicy::EveryKeyDown
        }
    }
}
