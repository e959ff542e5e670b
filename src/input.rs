//! Synthetic mouse input.

use std::thread;
use std::time::Duration;

use rdev::{simulate, Button, EventType};

use crate::config::MouseButton;
use crate::error::{ClickerError, Result};

/// Issues OS-level mouse button events.
pub trait InputEmitter: Send + Sync {
    fn press(&self, button: MouseButton) -> Result<()>;
    fn release(&self, button: MouseButton) -> Result<()>;
    fn click(&self, button: MouseButton) -> Result<()>;
}

/// Emitter backed by `rdev::simulate`.
#[derive(Debug, Clone)]
pub struct RdevEmitter {
    press_duration: Duration,
}

impl Default for RdevEmitter {
    fn default() -> Self {
        Self {
            press_duration: Duration::from_millis(1),
        }
    }
}

impl RdevEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn send(&self, action: &'static str, event: EventType, button: MouseButton) -> Result<()> {
        simulate(&event).map_err(|e| ClickerError::input(action, button, format!("{e:?}")))
    }
}

fn to_rdev(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
    }
}

impl InputEmitter for RdevEmitter {
    fn press(&self, button: MouseButton) -> Result<()> {
        self.send("press", EventType::ButtonPress(to_rdev(button)), button)
    }

    fn release(&self, button: MouseButton) -> Result<()> {
        self.send("release", EventType::ButtonRelease(to_rdev(button)), button)
    }

    fn click(&self, button: MouseButton) -> Result<()> {
        self.press(button)?;
        thread::sleep(self.press_duration);
        self.release(button)
    }
}
