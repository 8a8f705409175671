//! PIN entry on the matrix keypad.
//!
//! Runs on its own blocking thread, polling the keypad about ten times a
//! second. Key handling:
//!
//! | key            | action                                             |
//! |----------------|----------------------------------------------------|
//! | `0-9`, `C`, `D`| append to the PIN (bounded), echo `*` on line 2    |
//! | `*`            | clear the PIN, back to the prompt                  |
//! | `#`            | submit; `0000#` always closes the lock             |
//! | `A`            | open the lock manually                             |
//! | `B`            | close the lock manually                            |
//!
//! The PIN buffer is cleared on every submit and manual action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use smartlock_core::LockReason;
use smartlock_core::constants::{
    DEFAULT_POLL_INTERVAL_MS, MASTER_OVERRIDE_PIN, MAX_PIN_LENGTH, RESULT_DISPLAY_SECS,
};
use smartlock_hardware::{DisplayDevice, HardwareError, Key, KeypadDevice};
use tracing::{debug, error, info, warn};

use crate::context::AppContext;
use crate::engine::{DenialReason, ValidationResult};
use crate::lockout::LockoutOutcome;
use crate::messages::DisplayMessages;

/// Keypad loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadConfig {
    /// Delay between two keypad polls.
    pub poll_interval: Duration,

    /// Longest PIN buffered; further keys are ignored until `#` or `*`.
    pub max_code_length: usize,

    /// How long result screens stay up.
    pub result_display: Duration,
}

impl KeypadConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_code_length(mut self, max_code_length: usize) -> Self {
        self.max_code_length = max_code_length;
        self
    }

    pub fn with_result_display(mut self, result_display: Duration) -> Self {
        self.result_display = result_display;
        self
    }
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_code_length: MAX_PIN_LENGTH,
            result_display: Duration::from_secs(RESULT_DISPLAY_SECS),
        }
    }
}

/// What a single key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Character appended; `len` characters now buffered.
    Buffered { len: usize },
    /// Buffer full, key dropped.
    Ignored,
    /// `*` pressed.
    Cleared,
    /// `#` pressed with a regular PIN.
    Submitted(ValidationResult),
    /// `0000#` entered.
    MasterClose,
    /// `A` pressed.
    ManualOpen,
    /// `B` pressed.
    ManualClose,
}

/// PIN entry state machine bound to a display.
pub struct KeypadController<D> {
    ctx: AppContext,
    display: D,
    config: KeypadConfig,
    buffer: String,
}

impl<D: DisplayDevice> KeypadController<D> {
    /// Create a controller and draw the idle prompt.
    pub fn new(ctx: AppContext, display: D, config: KeypadConfig) -> Self {
        let mut controller = Self {
            ctx,
            display,
            config,
            buffer: String::new(),
        };
        controller.show_prompt();
        controller
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Number of characters typed so far.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: Key, now: DateTime<Utc>) -> KeyOutcome {
        debug!(key = %key, "Key pressed");

        match key {
            Key::Hash => self.submit(now),
            Key::Star => {
                self.buffer.clear();
                self.show_prompt();
                KeyOutcome::Cleared
            }
            Key::A => {
                self.buffer.clear();
                self.ctx.lock.open(LockReason::ManualOverride, now);
                self.show_result(DisplayMessages::MANUAL_OPEN);
                KeyOutcome::ManualOpen
            }
            Key::B => {
                self.buffer.clear();
                self.ctx.lock.close(LockReason::ManualOverride, now);
                self.show_result(DisplayMessages::MANUAL_CLOSE);
                KeyOutcome::ManualClose
            }
            Key::Digit(_) | Key::C | Key::D => self.append(key),
        }
    }

    /// Let the display expire temporary screens.
    pub fn tick(&mut self) {
        if let Err(e) = self.display.tick() {
            warn!(error = %e, "Display refresh failed");
        }
    }

    fn append(&mut self, key: Key) -> KeyOutcome {
        if self.buffer.len() >= self.config.max_code_length {
            debug!(max = self.config.max_code_length, "PIN buffer full, key ignored");
            return KeyOutcome::Ignored;
        }

        self.buffer.push(key.as_char());
        let masked = DisplayMessages::masked_input(self.buffer.len());

        // First key redraws the prompt over any result screen still showing
        let result = if self.buffer.len() == 1 {
            self.display.show(DisplayMessages::PROMPT, &masked, None)
        } else {
            self.display.write_line(1, &masked)
        };
        if let Err(e) = result {
            warn!(error = %e, "Display update failed");
        }

        KeyOutcome::Buffered {
            len: self.buffer.len(),
        }
    }

    fn submit(&mut self, now: DateTime<Utc>) -> KeyOutcome {
        let pin = std::mem::take(&mut self.buffer);

        if pin == MASTER_OVERRIDE_PIN {
            info!("Master override sequence entered");
            self.ctx.lock.close(LockReason::MasterOverridePin, now);
            self.show_result(DisplayMessages::ACCESS_LOCKED);
            return KeyOutcome::MasterClose;
        }

        let result = self.ctx.engine.validate(&pin, now);

        match result {
            ValidationResult::Granted { .. } => {
                self.ctx.lock.open(LockReason::PinEntered, now);
                self.show_result(DisplayMessages::ACCESS_OPENED);
            }
            ValidationResult::Denied(DenialReason::LockedOut { remaining }) => {
                let (line1, line2) = DisplayMessages::lockout_remaining(remaining.num_seconds());
                self.show_result((line1, line2.as_str()));
            }
            ValidationResult::Denied(DenialReason::InvalidCode {
                lockout: LockoutOutcome::JustLockedOut { duration },
            }) => {
                let (line1, line2) = DisplayMessages::lockout_remaining(duration.num_seconds());
                self.show_result((line1, line2.as_str()));
            }
            ValidationResult::Denied(DenialReason::InvalidCode { .. }) => {
                self.show_result(DisplayMessages::ACCESS_DENIED);
            }
        }

        KeyOutcome::Submitted(result)
    }

    fn show_prompt(&mut self) {
        if let Err(e) = self.display.show(DisplayMessages::PROMPT, "", None) {
            warn!(error = %e, "Display update failed");
        }
    }

    fn show_result(&mut self, (line1, line2): (&str, &str)) {
        if let Err(e) = self
            .display
            .show(line1, line2, Some(self.config.result_display))
        {
            warn!(error = %e, "Display update failed");
        }
    }
}

/// Run the keypad loop until `shutdown` is set or the keypad disconnects.
///
/// Blocks the calling thread; spawn it on a dedicated OS thread.
///
/// # Errors
///
/// Returns `HardwareError::Disconnected` if the keypad goes away. Other read
/// errors are logged and polling continues.
pub fn run_keypad_loop<K, D>(
    ctx: AppContext,
    mut keypad: K,
    display: D,
    config: KeypadConfig,
    shutdown: &AtomicBool,
) -> smartlock_hardware::Result<()>
where
    K: KeypadDevice,
    D: DisplayDevice,
{
    info!(poll_ms = config.poll_interval.as_millis() as u64, "Keypad loop started");
    let mut controller = KeypadController::new(ctx, display, config);

    while !shutdown.load(Ordering::SeqCst) {
        match keypad.poll_key() {
            Ok(Some(key)) => {
                controller.handle_key(key, Utc::now());
            }
            Ok(None) => {}
            Err(e @ HardwareError::Disconnected { .. }) => {
                error!(error = %e, "Keypad disconnected, stopping keypad loop");
                return Err(e);
            }
            Err(e) => warn!(error = %e, "Keypad read failed"),
        }

        controller.tick();
        thread::sleep(config.poll_interval);
    }

    info!("Keypad loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::LockoutPolicy;
    use smartlock_core::{AccessCode, LockState, event_bridge};
    use smartlock_hardware::VirtualLcd;
    use smartlock_hardware::mock::{MockKeypad, MockRelay};
    use smartlock_storage::{CredentialStore, MemoryGateway};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn controller() -> KeypadController<VirtualLcd> {
        let (events, _drain) = event_bridge();
        let (relay, _relay_state) = MockRelay::new();
        let store = Arc::new(CredentialStore::load(MemoryGateway::new()));
        let _ = store.add_permanent(AccessCode::new("4821").unwrap());
        let ctx = AppContext::new(store, relay, LockoutPolicy::default(), events);

        KeypadController::new(ctx, VirtualLcd::default(), KeypadConfig::default())
    }

    fn type_keys(c: &mut KeypadController<VirtualLcd>, keys: &str) -> KeyOutcome {
        let mut last = KeyOutcome::Ignored;
        for ch in keys.chars() {
            last = c.handle_key(Key::from_char(ch).unwrap(), t0());
        }
        last
    }

    fn screen(c: &KeypadController<VirtualLcd>) -> (String, String) {
        let lines = c.display().lines();
        (lines[0].trim_end().to_string(), lines[1].trim_end().to_string())
    }

    #[test]
    fn test_prompt_on_start() {
        let c = controller();
        assert_eq!(screen(&c), ("Enter PIN".to_string(), String::new()));
    }

    #[test]
    fn test_typing_echoes_mask() {
        let mut c = controller();
        assert_eq!(type_keys(&mut c, "12C"), KeyOutcome::Buffered { len: 3 });
        assert_eq!(screen(&c), ("Enter PIN".to_string(), "***".to_string()));
    }

    #[test]
    fn test_star_clears() {
        let mut c = controller();
        type_keys(&mut c, "123");
        assert_eq!(type_keys(&mut c, "*"), KeyOutcome::Cleared);
        assert_eq!(c.pending_len(), 0);
        assert_eq!(screen(&c).1, "");
    }

    #[test]
    fn test_valid_pin_opens() {
        let mut c = controller();
        let outcome = type_keys(&mut c, "4821#");

        assert!(matches!(outcome, KeyOutcome::Submitted(r) if r.is_granted()));
        assert_eq!(c.ctx.lock.state(), LockState::Open);
        assert_eq!(screen(&c), ("Access".to_string(), "OPENED".to_string()));
    }

    #[test]
    fn test_invalid_pin_denied() {
        let mut c = controller();
        type_keys(&mut c, "1111#");

        assert_eq!(c.ctx.lock.state(), LockState::Closed);
        assert_eq!(screen(&c), ("Access".to_string(), "DENIED".to_string()));
    }

    #[test]
    fn test_fifth_failure_shows_lockout() {
        let mut c = controller();
        for _ in 0..5 {
            type_keys(&mut c, "1111#");
        }
        assert_eq!(screen(&c), ("LOCKED".to_string(), "60s".to_string()));

        type_keys(&mut c, "4821#");
        assert_eq!(screen(&c), ("LOCKED".to_string(), "60s".to_string()));
        assert_eq!(c.ctx.lock.state(), LockState::Closed);
    }

    #[test]
    fn test_master_override_closes() {
        let mut c = controller();
        type_keys(&mut c, "A");
        assert_eq!(c.ctx.lock.state(), LockState::Open);

        assert_eq!(type_keys(&mut c, "0000#"), KeyOutcome::MasterClose);
        assert_eq!(c.ctx.lock.state(), LockState::Closed);
        assert_eq!(screen(&c), ("Access".to_string(), "LOCKED".to_string()));
        assert_eq!(c.ctx.engine.consecutive_failures(), 0);
    }

    #[test]
    fn test_manual_keys() {
        let mut c = controller();
        assert_eq!(type_keys(&mut c, "12A"), KeyOutcome::ManualOpen);
        assert_eq!(c.pending_len(), 0);
        assert_eq!(screen(&c), ("Manual".to_string(), "OPEN".to_string()));

        assert_eq!(type_keys(&mut c, "B"), KeyOutcome::ManualClose);
        assert_eq!(c.ctx.lock.state(), LockState::Closed);
        assert_eq!(screen(&c), ("Manual".to_string(), "CLOSE".to_string()));
    }

    #[test]
    fn test_buffer_is_bounded() {
        let mut c = controller();
        type_keys(&mut c, &"1".repeat(MAX_PIN_LENGTH));
        assert_eq!(type_keys(&mut c, "2"), KeyOutcome::Ignored);
        assert_eq!(c.pending_len(), MAX_PIN_LENGTH);
    }

    #[test]
    fn test_loop_stops_on_disconnect() {
        let (events, _drain) = event_bridge();
        let (relay, relay_state) = MockRelay::new();
        let store = Arc::new(CredentialStore::load(MemoryGateway::new()));
        let _ = store.add_permanent(AccessCode::new("4821").unwrap());
        let ctx = AppContext::new(store, relay, LockoutPolicy::default(), events);

        let (keypad, handle) = MockKeypad::new();
        handle.send_pin("4821").unwrap();
        drop(handle);

        let shutdown = AtomicBool::new(false);
        let config = KeypadConfig::default().with_poll_interval(Duration::from_millis(1));
        let result = run_keypad_loop(ctx.clone(), keypad, VirtualLcd::default(), config, &shutdown);

        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
        assert_eq!(ctx.lock.state(), LockState::Open);
        assert!(!relay_state.is_energized());
    }

    #[test]
    fn test_loop_honours_shutdown() {
        let (events, _drain) = event_bridge();
        let (relay, _relay_state) = MockRelay::new();
        let store = Arc::new(CredentialStore::load(MemoryGateway::new()));
        let ctx = AppContext::new(store, relay, LockoutPolicy::default(), events);
        let (keypad, _handle) = MockKeypad::new();

        let shutdown = AtomicBool::new(true);
        let result = run_keypad_loop(ctx, keypad, VirtualLcd::default(), KeypadConfig::default(), &shutdown);
        assert!(result.is_ok());
    }
}
