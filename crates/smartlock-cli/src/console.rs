//! Console transport: stdin stands in for the keypad, the motion sensor and
//! the chat, stdout for outgoing notifications.

use smartlock_core::UserId;
use smartlock_hardware::Key;
use smartlock_remote::{NotificationChannel, Result};

/// One line of console input, routed to the device it simulates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Keys to press on the keypad, e.g. `4821#`.
    Keypad(String),
    /// Trigger the motion sensor.
    Motion,
    /// Chat message from a caller.
    Chat { caller: UserId, text: String },
    Quit,
    Empty,
}

impl ConsoleInput {
    /// Route one input line.
    ///
    /// `@<id> <text>` sends chat text as another caller. A line made only of
    /// keypad legends goes to the keypad; any other text is chat from the
    /// operator.
    pub fn parse(line: &str, operator: UserId) -> Self {
        let line = line.trim();

        match line {
            "" => return ConsoleInput::Empty,
            "quit" | "exit" => return ConsoleInput::Quit,
            "motion" => return ConsoleInput::Motion,
            _ => {}
        }

        if let Some(rest) = line.strip_prefix('@') {
            let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if let Ok(caller) = id.parse::<UserId>() {
                return ConsoleInput::Chat {
                    caller,
                    text: text.trim().to_string(),
                };
            }
        }

        let is_keypad = line
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| Key::from_char(c).is_ok());
        if is_keypad {
            return ConsoleInput::Keypad(line.to_string());
        }

        ConsoleInput::Chat {
            caller: operator,
            text: line.to_string(),
        }
    }
}

/// Prints every notification on stdout.
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl NotificationChannel for ConsoleChannel {
    async fn deliver(&mut self, text: &str) -> Result<()> {
        println!("[notify] {text}");
        Ok(())
    }
}
