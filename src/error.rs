//! Error types for the clicker core.

use thiserror::Error;

use crate::config::MouseButton;

/// Main error type for clicker operations.
#[derive(Error, Debug)]
pub enum ClickerError {
    /// Click rate outside the supported range.
    #[error("click rate {value} is out of range ({min}-{max} clicks per second)")]
    RateOutOfRange { value: u32, min: u32, max: u32 },

    /// Hotkey string that does not name a supported trigger.
    #[error("unknown hotkey '{0}'")]
    UnknownHotkey(String),

    /// Mouse button name that is not supported.
    #[error("unknown mouse button '{0}'")]
    UnknownButton(String),

    /// Key reported by the keyboard hook that has no known identity.
    #[error("unrecognized key code {0}")]
    UnrecognizedKey(u32),

    /// The OS rejected a synthetic mouse event.
    #[error("failed to {action} {button} mouse button: {reason}")]
    Input {
        action: &'static str,
        button: MouseButton,
        reason: String,
    },

    /// The global keyboard hook could not be installed.
    #[error("hotkey listener error: {0}")]
    Listener(String),

    /// The control panel window failed.
    #[error("control panel error: {0}")]
    Gui(String),

    /// I/O error, e.g. a worker thread could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for clicker operations.
pub type Result<T> = std::result::Result<T, ClickerError>;

impl ClickerError {
    pub fn input(action: &'static str, button: MouseButton, reason: impl Into<String>) -> Self {
        Self::Input {
            action,
            button,
            reason: reason.into(),
        }
    }

    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener(message.into())
    }

    pub fn gui(message: impl Into<String>) -> Self {
        Self::Gui(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClickerError::RateOutOfRange {
            value: 0,
            min: 1,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "click rate 0 is out of range (1-100 clicks per second)"
        );

        let err = ClickerError::input("press", MouseButton::Right, "denied");
        assert_eq!(err.to_string(), "failed to press right mouse button: denied");

        let err = ClickerError::UnknownHotkey("ctrl+q".into());
        assert_eq!(err.to_string(), "unknown hotkey 'ctrl+q'");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        let err: ClickerError = io_err.into();
        assert!(matches!(err, ClickerError::Io(_)));
    }
}
