//! # CPS Clicker
//!
//! Desktop auto clicker: clicks a mouse button at a fixed rate, or holds it
//! down, toggled by a global hotkey or from a small control panel.
//!
//! ## Example
//!
//! ```no_run
//! use cps_clicker::{spawn_listener, AutoClicker, ComboPolicy, RdevEmitter};
//!
//! let clicker = AutoClicker::new(RdevEmitter::new());
//! clicker.set_rate(20).unwrap();
//! spawn_listener(clicker.handle(), ComboPolicy::default()).unwrap();
//! clicker.toggle().unwrap();
//! ```

pub mod clicker;
pub mod config;
pub mod error;
pub mod gui;
pub mod hotkey;
pub mod input;

pub use clicker::{ActivationState, AutoClicker, ClickerHandle, Status};
pub use config::{Hotkey, MouseButton, Options, Rate, Settings};
pub use error::{ClickerError, Result};
pub use gui::AutoClickerApp;
pub use hotkey::{spawn_listener, ComboPolicy, HotkeyMatcher, KeyId};
pub use input::{InputEmitter, RdevEmitter};
