//! Remote command execution.
//!
//! Only one caller identity is allowed. Anything from another caller is
//! dropped without a reply, without an event and without touching any
//! state.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use smartlock_access::AppContext;
use smartlock_core::constants::{DEFAULT_ONE_TIME_USES, ONE_TIME_CODE_MAX, ONE_TIME_CODE_MIN};
use smartlock_core::{AccessCode, LockReason, UserId};
use smartlock_storage::{AddOutcome, Committed, CredentialListing, RemoveOutcome};
use tracing::{debug, info, warn};

use crate::command::{
    ADD_MASTER_USAGE, DELETE_CODE_USAGE, MENU_BUTTONS, RemoteCommand, SET_CODE_USAGE,
};
use crate::error::RemoteError;

/// Executes operator commands against the application context.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    ctx: AppContext,
    authorized: UserId,
}

impl CommandDispatcher {
    pub fn new(ctx: AppContext, authorized: UserId) -> Self {
        Self { ctx, authorized }
    }

    pub fn is_authorized(&self, caller: UserId) -> bool {
        caller == self.authorized
    }

    /// Handle one chat message from `caller`.
    ///
    /// Returns the reply text, or `None` for an unauthorized caller.
    pub fn handle(&self, caller: UserId, text: &str) -> Option<String> {
        self.handle_at(caller, text, Utc::now())
    }

    /// [`CommandDispatcher::handle`] with an explicit clock.
    pub fn handle_at(&self, caller: UserId, text: &str, now: DateTime<Utc>) -> Option<String> {
        if !self.is_authorized(caller) {
            debug!(%caller, "Ignoring message from unauthorized caller");
            return None;
        }

        let reply = match RemoteCommand::parse(text) {
            Ok(command) => self.execute(command, now),
            Err(RemoteError::Usage { usage }) => format!("Usage: {usage}"),
            Err(e) => {
                debug!(error = %e, "Unrecognised remote input");
                "Unknown command. See /help".to_string()
            }
        };
        Some(reply)
    }

    /// Run an already parsed command and build the reply.
    pub fn execute(&self, command: RemoteCommand, now: DateTime<Utc>) -> String {
        info!(command = command.name(), "Remote command");

        match command {
            RemoteCommand::Start => start_text(),
            RemoteCommand::Help => help_text(),
            RemoteCommand::Status => self.status_text(),
            RemoteCommand::Lock => {
                self.ctx.lock.close(LockReason::RemoteCommand, now);
                "Lock closed.".to_string()
            }
            RemoteCommand::Unlock => {
                self.ctx.lock.open(LockReason::RemoteCommand, now);
                "Lock opened.".to_string()
            }
            RemoteCommand::Codes => codes_text(&self.ctx.store.list(now)),
            RemoteCommand::AddMaster { code } => {
                let label = code.to_string();
                with_warning(self.ctx.store.add_permanent(code).map(|outcome| match outcome {
                    AddOutcome::Added => format!("Master code {label} added."),
                    AddOutcome::AlreadyExists => format!("Master code {label} already exists."),
                }))
            }
            RemoteCommand::DeleteCode { code } => {
                with_warning(self.ctx.store.remove(code.as_str()).map(|outcome| match outcome {
                    RemoveOutcome::Removed => format!("Code {code} deleted."),
                    RemoveOutcome::NotFound => "Code not found.".to_string(),
                }))
            }
            RemoteCommand::SetCode { code, minutes } => {
                let label = code.to_string();
                let ttl = Duration::minutes(i64::from(minutes));
                with_warning(
                    self.ctx
                        .store
                        .add_temporary(code, ttl, now)
                        .map(|_| format!("Code {label} active for {minutes} minutes.")),
                )
            }
            RemoteCommand::OneTime => self.generate_one_time(),
            RemoteCommand::SetCodeHint => SET_CODE_USAGE.to_string(),
        }
    }

    fn generate_one_time(&self) -> String {
        let number = rand::thread_rng().gen_range(ONE_TIME_CODE_MIN..=ONE_TIME_CODE_MAX);

        match AccessCode::new(&number.to_string()) {
            Ok(code) => {
                let label = code.to_string();
                with_warning(
                    self.ctx
                        .store
                        .add_one_time(code, DEFAULT_ONE_TIME_USES)
                        .map(|()| format!("One-time code: {label}\nValid for {DEFAULT_ONE_TIME_USES} use.")),
                )
            }
            Err(e) => {
                warn!(error = %e, "Generated one-time code rejected");
                "Could not generate a one-time code.".to_string()
            }
        }
    }

    fn status_text(&self) -> String {
        let snapshot = self.ctx.lock.snapshot();
        match snapshot.last_transition_at {
            Some(at) => format!(
                "Status: {} (since {})",
                snapshot.state,
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => format!("Status: {} (no transitions yet)", snapshot.state),
        }
    }
}

/// Append a persistence warning line when the change was not saved.
fn with_warning(result: Committed<String>) -> String {
    match result.warning {
        Some(e) => format!("{}\nWarning: change not saved ({e}).", result.value),
        None => result.value,
    }
}

fn start_text() -> String {
    format!(
        "Smart lock bot active. Command help: /help\nMenu: {}",
        MENU_BUTTONS.join(" | ")
    )
}

fn help_text() -> String {
    [
        "Commands:",
        "/start - start the bot and show the menu",
        "/status - lock status",
        "/lock - close the lock",
        "/unlock - open the lock",
        "/codes - list all active codes",
        "/onetime - generate a one-time code",
    ]
    .into_iter()
    .map(str::to_string)
    .chain([
        format!("{SET_CODE_USAGE} - set a temporary code"),
        format!("{ADD_MASTER_USAGE} - add a master code"),
        format!("{DELETE_CODE_USAGE} - delete any code"),
    ])
    .collect::<Vec<_>>()
    .join("\n")
}

fn codes_text(listing: &CredentialListing) -> String {
    let mut text = String::from("Active codes:");

    if !listing.permanent.is_empty() {
        text.push_str("\n\nMaster codes:");
        for code in &listing.permanent {
            text.push_str(&format!("\n{code}"));
        }
    }
    if !listing.temporary.is_empty() {
        text.push_str("\n\nTemporary codes:");
        for (code, seconds) in &listing.temporary {
            text.push_str(&format!("\n{code} - expires in {seconds} s"));
        }
    }
    if !listing.one_time.is_empty() {
        text.push_str("\n\nOne-time codes:");
        for (code, uses) in &listing.one_time {
            text.push_str(&format!("\n{code} - {uses} use(s) left"));
        }
    }
    if listing.is_empty() {
        text.push_str("\nNo active codes.");
    }

    text.push_str(&format!(
        "\n\nAdd a master code: {ADD_MASTER_USAGE}\nDelete a code: {DELETE_CODE_USAGE}"
    ));
    text
}
