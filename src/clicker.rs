use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{Hotkey, MouseButton, Rate, Settings};
use crate::error::Result;
use crate::input::InputEmitter;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ActivationState {
    Idle,
    /// A click loop thread is running.
    Clicking,
    /// The button is held down; no thread runs.
    Holding(MouseButton),
}

/// What the control panel displays. Sent on every transition.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Status {
    pub active: bool,
    pub hold_mode: bool,
    pub rate: Rate,
    pub button: MouseButton,
    pub hotkey: Hotkey,
}

type StatusObserver = Box<dyn Fn(Status) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    generation: u64,
    cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl Worker {
    /// Wakes the loop out of its sleep and waits for it to exit.
    fn finish(self) {
        drop(self.cancel);
        if self.thread.thread().id() == thread::current().id() {
            return;
        }
        if self.thread.join().is_err() {
            warn!(generation = self.generation, "click loop panicked");
        }
    }
}

struct Runner {
    state: ActivationState,
    worker: Option<Worker>,
    generation: u64,
}

struct Shared {
    emitter: Arc<dyn InputEmitter>,
    settings: Mutex<Settings>,
    is_active: AtomicBool,
    is_shut_down: AtomicBool,
    // Lock order: runner, then settings.
    runner: Mutex<Runner>,
    observers: Mutex<Vec<StatusObserver>>,
}

impl Shared {
    fn status(&self) -> Status {
        let settings = *lock(&self.settings);
        Status {
            active: self.is_active.load(Ordering::SeqCst),
            hold_mode: settings.hold_mode,
            rate: settings.rate,
            button: settings.button,
            hotkey: settings.hotkey,
        }
    }

    fn notify(&self, status: Status) {
        for observer in lock(&self.observers).iter() {
            observer(status);
        }
    }

    /// Runs `transition` and publishes the new status, both under the runner
    /// lock so observers see transitions in order.
    fn transition<T>(self: &Arc<Self>, transition: impl FnOnce(&Arc<Self>, &mut Runner) -> T) -> T {
        let mut runner = lock(&self.runner);
        let result = transition(self, &mut *runner);
        self.notify(self.status());
        result
    }

    fn start_locked(self: &Arc<Self>, runner: &mut Runner) -> Result<()> {
        if runner.state != ActivationState::Idle {
            debug!(state = ?runner.state, "start ignored, already active");
            return Ok(());
        }
        if self.is_shut_down.load(Ordering::SeqCst) {
            debug!("start ignored, clicker is shut down");
            return Ok(());
        }

        let settings = *lock(&self.settings);
        if settings.hold_mode {
            self.emitter.press(settings.button)?;
            runner.state = ActivationState::Holding(settings.button);
            info!(button = %settings.button, "holding mouse button");
        } else {
            runner.generation += 1;
            let worker = self.spawn_worker(runner.generation, settings.button, settings.rate)?;
            runner.worker = Some(worker);
            runner.state = ActivationState::Clicking;
            info!(button = %settings.button, cps = %settings.rate, "clicking started");
        }
        self.is_active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_locked(&self, runner: &mut Runner) -> Result<()> {
        let outcome = match runner.state {
            ActivationState::Idle => return Ok(()),
            ActivationState::Clicking => {
                if let Some(worker) = runner.worker.take() {
                    worker.finish();
                }
                info!("clicking stopped");
                Ok(())
            }
            ActivationState::Holding(button) => {
                info!(%button, "releasing mouse button");
                self.emitter.release(button)
            }
        };
        runner.state = ActivationState::Idle;
        self.is_active.store(false, Ordering::SeqCst);
        outcome
    }

    fn toggle_locked(self: &Arc<Self>, runner: &mut Runner) -> Result<()> {
        if runner.state == ActivationState::Idle {
            self.start_locked(runner)
        } else {
            self.stop_locked(runner)
        }
    }

    fn spawn_worker(self: &Arc<Self>, generation: u64, button: MouseButton, rate: Rate) -> Result<Worker> {
        let (cancel, cancelled) = mpsc::channel();
        let shared = Arc::downgrade(self);
        let emitter = self.emitter.clone();
        let interval = rate.interval();

        let thread = thread::Builder::new()
            .name(format!("click-loop-{generation}"))
            .spawn(move || click_loop(shared, emitter, generation, button, interval, cancelled))?;

        Ok(Worker {
            generation,
            cancel,
            thread,
        })
    }

    /// Called by a loop whose emitter failed: takes the clicker back to idle
    /// unless a concurrent `stop()` is already doing so.
    fn abandon(&self, generation: u64, cancelled: &Receiver<()>) {
        loop {
            if !matches!(cancelled.try_recv(), Err(TryRecvError::Empty)) {
                return;
            }
            let runner = match self.runner.try_lock() {
                Ok(guard) => Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => None,
            };
            if let Some(mut runner) = runner {
                if runner.worker.as_ref().map(|w| w.generation) != Some(generation) {
                    return;
                }
                // Dropping our own handle detaches this thread.
                runner.worker = None;
                runner.state = ActivationState::Idle;
                self.is_active.store(false, Ordering::SeqCst);
                self.notify(self.status());
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

fn click_loop(
    shared: Weak<Shared>,
    emitter: Arc<dyn InputEmitter>,
    generation: u64,
    button: MouseButton,
    interval: Duration,
    cancelled: Receiver<()>,
) {
    debug!(generation, ?interval, "click loop running");
    loop {
        if let Err(e) = emitter.click(button) {
            error!(error = %e, generation, "click failed, stopping click loop");
            if let Some(shared) = shared.upgrade() {
                shared.abandon(generation, &cancelled);
            }
            return;
        }

        match cancelled.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(generation, "click loop exited");
}

/// Owner of the clicker state.
///
/// `start`, `stop` and `toggle` all serialize on one lock, so the control
/// panel and the hotkey listener can call them concurrently. Dropping the
/// clicker stops it.
pub struct AutoClicker {
    shared: Arc<Shared>,
}

impl AutoClicker {
    pub fn new(emitter: impl InputEmitter + 'static) -> Self {
        Self::with_settings(emitter, Settings::default())
    }

    pub fn with_settings(emitter: impl InputEmitter + 'static, settings: Settings) -> Self {
        Self {
            shared: Arc::new(Shared {
                emitter: Arc::new(emitter),
                settings: Mutex::new(settings),
                is_active: AtomicBool::new(false),
                is_shut_down: AtomicBool::new(false),
                runner: Mutex::new(Runner {
                    state: ActivationState::Idle,
                    worker: None,
                    generation: 0,
                }),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Weak handle for other threads, e.g. the hotkey listener.
    pub fn handle(&self) -> ClickerHandle {
        ClickerHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Registers a callback for status changes. Callbacks run on whichever
    /// thread made the change, while the clicker is locked: they must hand the
    /// status off (e.g. over a channel) rather than call back into the clicker.
    pub fn on_status(&self, observer: impl Fn(Status) + Send + Sync + 'static) {
        lock(&self.shared.observers).push(Box::new(observer));
    }

    pub fn start(&self) -> Result<()> {
        self.shared.transition(|shared, runner| shared.start_locked(runner))
    }

    pub fn stop(&self) -> Result<()> {
        self.shared.transition(|shared, runner| shared.stop_locked(runner))
    }

    pub fn toggle(&self) -> Result<()> {
        self.shared.transition(|shared, runner| shared.toggle_locked(runner))
    }

    pub fn set_rate(&self, cps: u32) -> Result<()> {
        let rate = Rate::new(cps)?;
        self.update(|settings| settings.rate = rate, |state| state == ActivationState::Clicking)
    }

    pub fn set_button(&self, button: MouseButton) -> Result<()> {
        self.update(|settings| settings.button = button, |state| state != ActivationState::Idle)
    }

    pub fn set_hold_mode(&self, hold_mode: bool) -> Result<()> {
        self.update(|settings| settings.hold_mode = hold_mode, |state| state != ActivationState::Idle)
    }

    pub fn set_hotkey(&self, hotkey: Hotkey) -> Result<()> {
        self.update(|settings| settings.hotkey = hotkey, |_| false)
    }

    /// Applies a settings edit. A running clicker is stopped and started
    /// again when the edit changed something `restart_when` cares about.
    fn update(
        &self,
        edit: impl FnOnce(&mut Settings),
        restart_when: impl FnOnce(ActivationState) -> bool,
    ) -> Result<()> {
        self.shared.transition(|shared, runner| {
            let changed = {
                let mut settings = lock(&shared.settings);
                let before = *settings;
                edit(&mut *settings);
                *settings != before
            };
            if !changed || !restart_when(runner.state) {
                return Ok(());
            }

            debug!("settings changed while active, restarting");
            let stopped = shared.stop_locked(runner);
            let started = shared.start_locked(runner);
            stopped.and(started)
        })
    }

    pub fn settings(&self) -> Settings {
        *lock(&self.shared.settings)
    }

    pub fn status(&self) -> Status {
        self.shared.status()
    }

    pub fn state(&self) -> ActivationState {
        lock(&self.shared.runner).state
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active.load(Ordering::SeqCst)
    }

    /// Stops for good: later `start` calls, from any handle, do nothing.
    pub fn shutdown(&self) {
        self.shared.is_shut_down.store(true, Ordering::SeqCst);
        if let Err(e) = self.stop() {
            warn!(error = %e, "error while stopping on shutdown");
        }
    }
}

impl Drop for AutoClicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Non-owning handle to an [`AutoClicker`]. Becomes inert once the clicker
/// is dropped.
#[derive(Clone)]
pub struct ClickerHandle {
    shared: Weak<Shared>,
}

impl ClickerHandle {
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub fn toggle(&self) -> Result<()> {
        match self.shared.upgrade() {
            Some(shared) => shared.transition(|shared, runner| shared.toggle_locked(runner)),
            None => Ok(()),
        }
    }

    pub fn hotkey(&self) -> Option<Hotkey> {
        self.shared.upgrade().map(|shared| lock(&shared.settings).hotkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClickerError;

    #[derive(Default)]
    struct CountingEmitter {
        clicks: Mutex<u32>,
        held: Mutex<Option<MouseButton>>,
    }

    impl InputEmitter for CountingEmitter {
        fn press(&self, button: MouseButton) -> Result<()> {
            *lock(&self.held) = Some(button);
            Ok(())
        }

        fn release(&self, _button: MouseButton) -> Result<()> {
            *lock(&self.held) = None;
            Ok(())
        }

        fn click(&self, _button: MouseButton) -> Result<()> {
            *lock(&self.clicks) += 1;
            Ok(())
        }
    }

    struct FailingEmitter;

    impl InputEmitter for FailingEmitter {
        fn press(&self, button: MouseButton) -> Result<()> {
            Err(ClickerError::input("press", button, "denied"))
        }

        fn release(&self, button: MouseButton) -> Result<()> {
            Err(ClickerError::input("release", button, "denied"))
        }

        fn click(&self, button: MouseButton) -> Result<()> {
            Err(ClickerError::input("click", button, "denied"))
        }
    }

    #[test]
    fn test_state_transitions() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        assert_eq!(clicker.state(), ActivationState::Idle);

        clicker.start().unwrap();
        assert_eq!(clicker.state(), ActivationState::Clicking);
        assert!(clicker.is_active());

        // second start is a no-op
        clicker.start().unwrap();
        assert_eq!(lock(&clicker.shared.runner).generation, 1);

        clicker.stop().unwrap();
        assert_eq!(clicker.state(), ActivationState::Idle);
        assert!(!clicker.is_active());

        clicker.set_hold_mode(true).unwrap();
        clicker.toggle().unwrap();
        assert_eq!(clicker.state(), ActivationState::Holding(MouseButton::Left));
        clicker.toggle().unwrap();
        assert_eq!(clicker.state(), ActivationState::Idle);
    }

    #[test]
    fn test_hold_press_failure_stays_idle() {
        let clicker = AutoClicker::new(FailingEmitter);
        clicker.set_hold_mode(true).unwrap();
        assert!(clicker.start().is_err());
        assert_eq!(clicker.state(), ActivationState::Idle);
        assert!(!clicker.is_active());
    }

    #[test]
    fn test_hold_release_failure_still_stops() {
        struct ReleaseFails;
        impl InputEmitter for ReleaseFails {
            fn press(&self, _button: MouseButton) -> Result<()> {
                Ok(())
            }
            fn release(&self, button: MouseButton) -> Result<()> {
                Err(ClickerError::input("release", button, "denied"))
            }
            fn click(&self, _button: MouseButton) -> Result<()> {
                Ok(())
            }
        }

        let clicker = AutoClicker::new(ReleaseFails);
        clicker.set_hold_mode(true).unwrap();
        clicker.start().unwrap();
        assert!(clicker.stop().is_err());
        assert_eq!(clicker.state(), ActivationState::Idle);
    }

    #[test]
    fn test_button_change_while_holding_switches_button() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        clicker.set_hold_mode(true).unwrap();
        clicker.start().unwrap();
        clicker.set_button(MouseButton::Right).unwrap();
        assert_eq!(clicker.state(), ActivationState::Holding(MouseButton::Right));
    }

    #[test]
    fn test_rate_change_in_hold_mode_does_not_restart() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        clicker.set_hold_mode(true).unwrap();
        clicker.start().unwrap();
        clicker.set_rate(50).unwrap();
        assert_eq!(clicker.state(), ActivationState::Holding(MouseButton::Left));
        assert_eq!(clicker.settings().rate.get(), 50);
    }

    #[test]
    fn test_invalid_rate_is_rejected() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        assert!(matches!(
            clicker.set_rate(0),
            Err(ClickerError::RateOutOfRange { value: 0, .. })
        ));
        assert!(clicker.set_rate(101).is_err());
        assert_eq!(clicker.settings().rate.get(), 10);
    }

    #[test]
    fn test_unchanged_setting_keeps_loop() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        clicker.start().unwrap();
        clicker.set_rate(10).unwrap();
        assert_eq!(lock(&clicker.shared.runner).generation, 1);
        clicker.set_rate(20).unwrap();
        assert_eq!(lock(&clicker.shared.runner).generation, 2);
    }

    #[test]
    fn test_handle_is_inert_after_drop() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        clicker.set_hotkey(Hotkey::F9).unwrap();
        let handle = clicker.handle();
        assert!(handle.is_alive());
        assert_eq!(handle.hotkey(), Some(Hotkey::F9));

        handle.toggle().unwrap();
        assert!(clicker.is_active());

        drop(clicker);
        assert!(!handle.is_alive());
        assert_eq!(handle.hotkey(), None);
        assert!(handle.toggle().is_ok());
    }

    #[test]
    fn test_shutdown_blocks_restart() {
        let clicker = AutoClicker::new(CountingEmitter::default());
        clicker.start().unwrap();
        clicker.shutdown();
        assert!(!clicker.is_active());
        clicker.start().unwrap();
        assert_eq!(clicker.state(), ActivationState::Idle);
    }
}
