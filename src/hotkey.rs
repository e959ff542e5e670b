//! Global hotkey handling.
//!
//! [`HotkeyMatcher`] tracks which keys are held and decides when the
//! configured [`Hotkey`] fires. [`spawn_listener`] feeds it from a
//! system-wide `rdev` keyboard hook, independent of window focus.

use std::collections::HashSet;
use std::thread::{self, JoinHandle};

use rdev::{listen, Event, EventType, Key};
use tracing::{debug, error, info, warn};

use crate::clicker::ClickerHandle;
use crate::config::Hotkey;
use crate::error::{ClickerError, Result};

/// Literal half of the Alt + `-` combo.
const COMBO_LITERAL: KeyId = KeyId::Char('-');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AltSide {
    Left,
    Right,
    Any,
}

/// Identity of a key as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyId {
    Char(char),
    Alt(AltSide),
    Function(u8),
    Named(String),
}

impl KeyId {
    pub fn is_alt(&self) -> bool {
        matches!(self, KeyId::Alt(_))
    }
}

impl TryFrom<Key> for KeyId {
    type Error = ClickerError;

    fn try_from(key: Key) -> Result<Self> {
        let id = match key {
            Key::Alt => KeyId::Alt(AltSide::Left),
            Key::AltGr => KeyId::Alt(AltSide::Right),
            Key::Minus | Key::KpMinus => KeyId::Char('-'),
            Key::F1 => KeyId::Function(1),
            Key::F2 => KeyId::Function(2),
            Key::F3 => KeyId::Function(3),
            Key::F4 => KeyId::Function(4),
            Key::F5 => KeyId::Function(5),
            Key::F6 => KeyId::Function(6),
            Key::F7 => KeyId::Function(7),
            Key::F8 => KeyId::Function(8),
            Key::F9 => KeyId::Function(9),
            Key::F10 => KeyId::Function(10),
            Key::F11 => KeyId::Function(11),
            Key::F12 => KeyId::Function(12),
            Key::Unknown(code) => return Err(ClickerError::UnrecognizedKey(code)),
            other => KeyId::Named(format!("{other:?}")),
        };
        Ok(id)
    }
}

/// When the Alt + `-` combo is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComboPolicy {
    /// Check on every key-down. Any key pressed while both halves are held
    /// fires again, and so does keyboard auto-repeat.
    #[default]
    EveryKeyDown,
    /// Check only when `-` itself goes down.
    LiteralKeyOnly,
}

/// Set of held keys plus the trigger decision.
#[derive(Debug, Default)]
pub struct HotkeyMatcher {
    pressed: HashSet<KeyId>,
    policy: ComboPolicy,
}

impl HotkeyMatcher {
    pub fn new(policy: ComboPolicy) -> Self {
        Self {
            pressed: HashSet::new(),
            policy,
        }
    }

    /// Records a key-down and returns whether `hotkey` fires on it.
    pub fn key_down(&mut self, key: KeyId, hotkey: Hotkey) -> bool {
        let single = hotkey.function_key().map(|n| key == KeyId::Function(n));
        let is_literal = key == COMBO_LITERAL;
        self.pressed.insert(key);

        match single {
            Some(fires) => fires,
            None => {
                (is_literal || self.policy == ComboPolicy::EveryKeyDown) && self.combo_held()
            }
        }
    }

    /// Key-ups only shrink the held set.
    pub fn key_up(&mut self, key: &KeyId) {
        self.pressed.remove(key);
    }

    pub fn is_pressed(&self, key: &KeyId) -> bool {
        self.pressed.contains(key)
    }

    fn combo_held(&self) -> bool {
        self.pressed.iter().any(KeyId::is_alt) && self.pressed.contains(&COMBO_LITERAL)
    }
}

/// Routes one hook event through the matcher, toggling the clicker on a match.
///
/// Keys that cannot be identified are dropped; nothing here can take the
/// listener down.
pub fn handle_event(matcher: &mut HotkeyMatcher, clicker: &ClickerHandle, event_type: EventType) {
    match event_type {
        EventType::KeyPress(key) => {
            let id = match KeyId::try_from(key) {
                Ok(id) => id,
                Err(e) => {
                    debug!(error = %e, "ignoring key press");
                    return;
                }
            };
            let Some(hotkey) = clicker.hotkey() else {
                return;
            };
            if matcher.key_down(id, hotkey) {
                debug!(%hotkey, "hotkey pressed");
                if let Err(e) = clicker.toggle() {
                    warn!(error = %e, "hotkey toggle failed");
                }
            }
        }
        EventType::KeyRelease(key) => {
            if let Ok(id) = KeyId::try_from(key) {
                matcher.key_up(&id);
            }
        }
        _ => {}
    }
}

/// Starts the system-wide keyboard hook on its own thread.
///
/// The hook cannot be removed once installed; after the clicker behind
/// `clicker` is dropped every event becomes a no-op.
pub fn spawn_listener(clicker: ClickerHandle, policy: ComboPolicy) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("hotkey-listener".into())
        .spawn(move || {
            let mut matcher = HotkeyMatcher::new(policy);
            info!(?policy, "global hotkey listener started");
            let callback = move |event: Event| {
                if clicker.is_alive() {
                    handle_event(&mut matcher, &clicker, event.event_type);
                }
            };
            if let Err(e) = listen(callback) {
                error!(error = ?e, "global hotkey listener failed");
            }
        })
        .map_err(|e| ClickerError::listener(format!("failed to spawn listener thread: {e}")))?;

    Ok(handle)
}
