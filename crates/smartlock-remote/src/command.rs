//! Remote command parsing.
//!
//! Accepts slash commands (`/setcode 5555 30`, optionally addressed as
//! `/setcode@lockbot`) and the menu button labels shown by `/start`.

use std::str::FromStr;

use smartlock_core::AccessCode;

use crate::error::{RemoteError, Result};

/// Usage line for `/addmaster`.
pub const ADD_MASTER_USAGE: &str = "/addmaster <code>";

/// Usage line for `/delcode`.
pub const DELETE_CODE_USAGE: &str = "/delcode <code>";

/// Usage line for `/setcode`.
pub const SET_CODE_USAGE: &str = "/setcode <code> <minutes>";

/// Menu button labels, in display order.
pub const MENU_BUTTONS: [&str; 6] = [
    "🔒 Close lock",
    "🔓 Open lock",
    "🔐 Lock status",
    "🔑 Temporary code",
    "🎲 One-time code",
    "📋 Codes",
];

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    Start,
    Help,
    Status,
    /// Close the lock.
    Lock,
    /// Open the lock.
    Unlock,
    /// List active codes.
    Codes,
    AddMaster { code: AccessCode },
    DeleteCode { code: AccessCode },
    SetCode { code: AccessCode, minutes: u32 },
    /// Generate a random one-time code.
    OneTime,
    /// "Temporary code" button: reply with the `/setcode` syntax.
    SetCodeHint,
}

impl RemoteCommand {
    /// Command name for logs. Never includes a code.
    pub fn name(&self) -> &'static str {
        match self {
            RemoteCommand::Start => "start",
            RemoteCommand::Help => "help",
            RemoteCommand::Status => "status",
            RemoteCommand::Lock => "lock",
            RemoteCommand::Unlock => "unlock",
            RemoteCommand::Codes => "codes",
            RemoteCommand::AddMaster { .. } => "addmaster",
            RemoteCommand::DeleteCode { .. } => "delcode",
            RemoteCommand::SetCode { .. } => "setcode",
            RemoteCommand::OneTime => "onetime",
            RemoteCommand::SetCodeHint => "setcode_hint",
        }
    }

    /// Parse one chat message.
    ///
    /// # Errors
    ///
    /// - `RemoteError::Usage` for a known command with bad arguments
    /// - `RemoteError::UnknownCommand` for anything else
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        match text.strip_prefix('/') {
            Some(rest) => Self::parse_slash(rest),
            None => Self::parse_button(text),
        }
    }

    fn parse_slash(rest: &str) -> Result<Self> {
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        // `/status@lockbot` addresses one bot in a group chat
        let name = name.split('@').next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match name.as_str() {
            "start" => RemoteCommand::Start,
            "help" => RemoteCommand::Help,
            "status" => RemoteCommand::Status,
            "lock" => RemoteCommand::Lock,
            "unlock" => RemoteCommand::Unlock,
            "codes" => RemoteCommand::Codes,
            "onetime" => RemoteCommand::OneTime,
            "addmaster" => RemoteCommand::AddMaster {
                code: single_code(&args, ADD_MASTER_USAGE)?,
            },
            "delcode" => RemoteCommand::DeleteCode {
                code: single_code(&args, DELETE_CODE_USAGE)?,
            },
            "setcode" => {
                let [code, minutes] = args.as_slice() else {
                    return Err(usage(SET_CODE_USAGE));
                };
                let code = AccessCode::new(code).map_err(|_| usage(SET_CODE_USAGE))?;
                let minutes = minutes
                    .parse::<u32>()
                    .ok()
                    .filter(|m| *m > 0)
                    .ok_or_else(|| usage(SET_CODE_USAGE))?;
                RemoteCommand::SetCode { code, minutes }
            }
            _ => return Err(RemoteError::UnknownCommand(format!("/{rest}"))),
        };

        Ok(command)
    }

    /// Labels match with or without their leading emoji, case-insensitively.
    fn parse_button(text: &str) -> Result<Self> {
        let label = text
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim()
            .to_lowercase();

        match label.as_str() {
            "close lock" => Ok(RemoteCommand::Lock),
            "open lock" => Ok(RemoteCommand::Unlock),
            "lock status" => Ok(RemoteCommand::Status),
            "temporary code" => Ok(RemoteCommand::SetCodeHint),
            "one-time code" => Ok(RemoteCommand::OneTime),
            "codes" => Ok(RemoteCommand::Codes),
            _ => Err(RemoteError::UnknownCommand(text.to_string())),
        }
    }
}

impl FromStr for RemoteCommand {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self> {
        RemoteCommand::parse(s)
    }
}

fn usage(usage: &'static str) -> RemoteError {
    RemoteError::Usage { usage }
}

fn single_code(args: &[&str], usage_line: &'static str) -> Result<AccessCode> {
    match args {
        [code] => AccessCode::new(code).map_err(|_| usage(usage_line)),
        _ => Err(usage(usage_line)),
    }
}
