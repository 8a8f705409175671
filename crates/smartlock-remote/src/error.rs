use thiserror::Error;

/// Errors on the remote (chat) side.
///
/// None of these reach the lock: a bad command gets a usage reply, a failed
/// delivery is logged and the notifier moves on to the next event.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Known command with missing or malformed arguments
    #[error("Usage: {usage}")]
    Usage { usage: &'static str },

    /// Text that is neither a command nor a menu button
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The notification channel could not deliver a message
    #[error("Delivery failed: {message}")]
    Delivery { message: String },

    /// An event hook failed
    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },
}

impl RemoteError {
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;
